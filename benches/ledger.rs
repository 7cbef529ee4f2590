use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use rinha_ledger::{Amount, CustomerId, Ledger, PostRequest};

const CUSTOMER: CustomerId = 1;

/// Generates an alternating credit/debit sequence that never crosses the limit.
pub struct PostGenerator {
    remaining: u32,
    step: u32,
}

impl PostGenerator {
    pub fn new(count: u32) -> Self {
        Self {
            remaining: count,
            step: 0,
        }
    }
}

impl Iterator for PostGenerator {
    type Item = PostRequest;

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        self.remaining -= 1;
        self.step += 1;

        let request = if self.step % 2 == 0 {
            PostRequest::credit(100, "bench credit")
        } else {
            PostRequest::debit(100, "bench debit")
        };
        Some(request)
    }
}

fn ledger() -> Ledger {
    let mut ledger = Ledger::new();
    ledger.open_account(CUSTOMER, Amount::new(1_000));
    ledger
}

fn bench_post(c: &mut Criterion) {
    let mut group = c.benchmark_group("post");

    for count in [1_000u32, 10_000, 100_000] {
        group.bench_with_input(BenchmarkId::from_parameter(count), &count, |b, &count| {
            b.iter(|| {
                let mut ledger = ledger();
                for request in PostGenerator::new(count) {
                    let _ = black_box(ledger.post(CUSTOMER, request));
                }
                ledger
            });
        });
    }

    group.finish();
}

fn bench_rejections(c: &mut Criterion) {
    let mut group = c.benchmark_group("rejections");

    group.bench_function("10k_over_limit", |b| {
        b.iter(|| {
            let mut ledger = ledger();
            for _ in 0..10_000 {
                let _ = black_box(ledger.post(CUSTOMER, PostRequest::debit(5_000, "too much")));
            }
            ledger
        });
    });

    group.finish();
}

fn bench_statement(c: &mut Criterion) {
    let mut ledger = ledger();
    for request in PostGenerator::new(100) {
        let _ = ledger.post(CUSTOMER, request);
    }

    c.bench_function("statement", |b| {
        b.iter(|| black_box(ledger.statement(CUSTOMER)));
    });
}

criterion_group!(benches, bench_post, bench_rejections, bench_statement);
criterion_main!(benches);
