//! JSON bodies of the two routes, with their Portuguese field names.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::Amount;
use crate::model::{Balance, PostRequest, Statement, Transaction, TransactionKind};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostBody {
    pub valor: i64,
    pub tipo: TransactionKind,
    pub descricao: String,
}

impl From<PostBody> for PostRequest {
    fn from(body: PostBody) -> Self {
        PostRequest {
            amount: Amount::new(body.valor),
            kind: body.tipo,
            description: body.descricao,
        }
    }
}

impl From<&PostRequest> for PostBody {
    fn from(request: &PostRequest) -> Self {
        PostBody {
            valor: request.amount.value(),
            tipo: request.kind,
            descricao: request.description.clone(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostResponse {
    pub limite: Amount,
    pub saldo: Amount,
}

impl From<Balance> for PostResponse {
    fn from(balance: Balance) -> Self {
        PostResponse {
            limite: balance.limit,
            saldo: balance.balance,
        }
    }
}

impl From<PostResponse> for Balance {
    fn from(response: PostResponse) -> Self {
        Balance {
            balance: response.saldo,
            limit: response.limite,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatementBalance {
    pub total: Amount,
    pub data_extrato: DateTime<Utc>,
    pub limite: Amount,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatementTransaction {
    pub valor: Amount,
    pub tipo: TransactionKind,
    pub descricao: String,
    pub realizada_em: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatementResponse {
    pub saldo: StatementBalance,
    pub ultimas_transacoes: Vec<StatementTransaction>,
}

impl From<Statement> for StatementResponse {
    fn from(statement: Statement) -> Self {
        StatementResponse {
            saldo: StatementBalance {
                total: statement.balance,
                data_extrato: statement.as_of,
                limite: statement.limit,
            },
            ultimas_transacoes: statement
                .recent_transactions
                .into_iter()
                .map(|t| StatementTransaction {
                    valor: t.amount,
                    tipo: t.kind,
                    descricao: t.description,
                    realizada_em: t.created_at,
                })
                .collect(),
        }
    }
}

impl From<StatementResponse> for Statement {
    fn from(response: StatementResponse) -> Self {
        Statement {
            balance: response.saldo.total,
            limit: response.saldo.limite,
            as_of: response.saldo.data_extrato,
            recent_transactions: response
                .ultimas_transacoes
                .into_iter()
                .map(|t| Transaction {
                    amount: t.valor,
                    kind: t.tipo,
                    description: t.descricao,
                    created_at: t.realizada_em,
                })
                .collect(),
        }
    }
}

/// Body of every non-success response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub message: String,
}
