use crate::Amount;
use crate::model::Transaction;

/// Number of recent transactions kept per account.
pub const RING_CAPACITY: usize = 10;

/// Fixed-capacity buffer of the most recent transactions.
///
/// Slots are written at `next_slot`, which wraps around so the oldest entry is
/// the one overwritten. Empty slots are never-populated positions.
#[derive(Debug, Clone)]
pub struct TransactionRing {
    slots: [Option<Transaction>; RING_CAPACITY],
    next_slot: usize,
}

impl TransactionRing {
    pub fn new() -> Self {
        Self {
            slots: std::array::from_fn(|_| None),
            next_slot: 0,
        }
    }

    /// Overwrite the slot at the cursor and advance it.
    pub fn push(&mut self, transaction: Transaction) {
        self.slots[self.next_slot] = Some(transaction);
        self.next_slot = (self.next_slot + 1) % RING_CAPACITY;
    }

    pub fn next_slot(&self) -> usize {
        self.next_slot
    }

    pub fn len(&self) -> usize {
        self.slots.iter().filter(|slot| slot.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Populated slots, newest first.
    pub fn recent(&self) -> impl Iterator<Item = &Transaction> + '_ {
        (1..=RING_CAPACITY)
            .map(move |back| (self.next_slot + RING_CAPACITY - back) % RING_CAPACITY)
            .filter_map(move |idx| self.slots[idx].as_ref())
    }
}

impl Default for TransactionRing {
    fn default() -> Self {
        Self::new()
    }
}

/// A customer account: balance, immutable limit and recent transactions.
#[derive(Debug, Clone)]
pub struct Account {
    balance: Amount,
    limit: Amount,
    transactions: TransactionRing,
}

impl Account {
    pub fn new(limit: Amount) -> Self {
        Self {
            balance: Amount::ZERO,
            limit,
            transactions: TransactionRing::new(),
        }
    }

    pub fn balance(&self) -> Amount {
        self.balance
    }

    pub fn limit(&self) -> Amount {
        self.limit
    }

    pub fn transactions(&self) -> &TransactionRing {
        &self.transactions
    }

    /// The lowest balance this account may reach.
    pub fn floor(&self) -> Amount {
        -self.limit
    }

    /// Commit an already validated balance and record its transaction.
    pub(super) fn commit(&mut self, balance: Amount, transaction: Transaction) {
        self.balance = balance;
        self.transactions.push(transaction);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::TransactionKind;
    use chrono::Utc;

    fn tx(description: &str) -> Transaction {
        Transaction {
            amount: Amount::new(1),
            kind: TransactionKind::Debit,
            description: description.to_string(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn new_account_is_empty() {
        let account = Account::new(Amount::new(100_000));
        assert_eq!(account.balance(), Amount::ZERO);
        assert_eq!(account.limit(), Amount::new(100_000));
        assert_eq!(account.floor(), Amount::new(-100_000));
        assert!(account.transactions().is_empty());
    }

    #[test]
    fn ring_starts_with_no_populated_slots() {
        let ring = TransactionRing::new();
        assert_eq!(ring.recent().count(), 0);
        assert_eq!(ring.next_slot(), 0);
    }

    #[test]
    fn ring_returns_newest_first() {
        let mut ring = TransactionRing::new();
        ring.push(tx("a"));
        ring.push(tx("b"));
        ring.push(tx("c"));

        let descriptions: Vec<_> = ring.recent().map(|t| t.description.as_str()).collect();
        assert_eq!(descriptions, ["c", "b", "a"]);
        assert_eq!(ring.len(), 3);
    }

    #[test]
    fn ring_overwrites_oldest_when_full() {
        let mut ring = TransactionRing::new();
        for i in 0..15 {
            ring.push(tx(&i.to_string()));
        }

        let descriptions: Vec<_> = ring.recent().map(|t| t.description.clone()).collect();
        let expected: Vec<_> = (5..15).rev().map(|i| i.to_string()).collect();
        assert_eq!(descriptions, expected);
        assert_eq!(ring.len(), RING_CAPACITY);
        assert_eq!(ring.next_slot(), 5);
    }

    #[test]
    fn ring_cursor_wraps_exactly_at_capacity() {
        let mut ring = TransactionRing::new();
        for i in 0..RING_CAPACITY {
            ring.push(tx(&i.to_string()));
        }
        assert_eq!(ring.next_slot(), 0);
        assert_eq!(ring.recent().next().unwrap().description, "9");
    }
}
