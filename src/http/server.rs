use axum::Json;
use axum::Router;
use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use tokio::net::TcpListener;
use tracing::{error, info};

use super::wire::{ErrorBody, PostBody, PostResponse, StatementResponse};
use crate::ledger::LedgerError;
use crate::model::CustomerId;
use crate::service::LedgerService;

pub const POST_TRANSACTION: &str = "/clientes/{id}/transacoes";
pub const GET_STATEMENT: &str = "/clientes/{id}/extrato";

/// Everything a handler can answer besides success.
#[derive(Debug)]
enum ApiError {
    BadRequest(String),
    NotFound(String),
    Ledger(LedgerError),
}

impl From<LedgerError> for ApiError {
    fn from(err: LedgerError) -> Self {
        ApiError::Ledger(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::BadRequest(message) => (StatusCode::BAD_REQUEST, message),
            ApiError::NotFound(message) => (StatusCode::NOT_FOUND, message),
            ApiError::Ledger(err) => {
                let status = match err {
                    LedgerError::CustomerNotFound(_) => StatusCode::NOT_FOUND,
                    LedgerError::InsufficientFunds { .. }
                    | LedgerError::InvalidAmount(_)
                    | LedgerError::AmountOverflow { .. } => StatusCode::UNPROCESSABLE_ENTITY,
                    LedgerError::Unavailable => {
                        error!("ledger task is gone");
                        StatusCode::INTERNAL_SERVER_ERROR
                    }
                };
                (status, err.to_string())
            }
        };
        (status, Json(ErrorBody { message })).into_response()
    }
}

/// Routes of one listener, backed by `service`.
pub fn router(service: LedgerService) -> Router {
    Router::new()
        .route(POST_TRANSACTION, post(post_transaction))
        .route(GET_STATEMENT, get(get_statement))
        .with_state(service)
}

/// Serve `service` on `listener` until the listener fails.
pub async fn serve(listener: TcpListener, service: LedgerService) -> std::io::Result<()> {
    if let Ok(addr) = listener.local_addr() {
        info!(%addr, "listening");
    }
    axum::serve(listener, router(service)).await
}

fn parse_customer(raw: &str) -> Result<CustomerId, ApiError> {
    raw.parse()
        .map_err(|_| ApiError::NotFound(format!("customer {raw} not found")))
}

async fn post_transaction(
    State(service): State<LedgerService>,
    Path(id): Path<String>,
    body: Bytes,
) -> Result<Json<PostResponse>, ApiError> {
    let customer = parse_customer(&id)?;
    let body: PostBody =
        serde_json::from_slice(&body).map_err(|e| ApiError::BadRequest(e.to_string()))?;

    let committed = service.post(customer, body.into()).await?;
    Ok(Json(committed.into()))
}

async fn get_statement(
    State(service): State<LedgerService>,
    Path(id): Path<String>,
) -> Result<Json<StatementResponse>, ApiError> {
    let customer = parse_customer(&id)?;
    let statement = service.statement(customer).await?;
    Ok(Json(statement.into()))
}
