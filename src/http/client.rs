use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use http_body_util::{BodyExt, Full};
use hyper::header::{CONTENT_TYPE, HeaderValue};
use hyper::{Method, Request, StatusCode};
use hyper_util::client::legacy::Client;
use hyper_util::client::legacy::connect::HttpConnector;
use hyper_util::rt::TokioExecutor;
use serde::de::DeserializeOwned;

use super::wire::{ErrorBody, PostBody, PostResponse, StatementResponse};
use crate::model::{Balance, CustomerId, PostRequest, Statement};
use crate::verifier::{Endpoint, EndpointError, TransportError};

/// A ledger reached over HTTP at `base_url` (e.g. `http://127.0.0.1:3000`).
#[derive(Debug, Clone)]
pub struct HttpEndpoint {
    base_url: String,
    client: Client<HttpConnector, Full<Bytes>>,
    timeout: Duration,
}

impl HttpEndpoint {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            base_url,
            client: Client::builder(TokioExecutor::new()).build_http(),
            timeout,
        }
    }

    /// Send a request and decode a 200 body as `T`.
    ///
    /// 404 and 422 are the ledger refusing the request; any other status is a
    /// transport failure.
    async fn send<T: DeserializeOwned>(
        &self,
        method: Method,
        path: String,
        body: Option<Vec<u8>>,
    ) -> Result<T, EndpointError> {
        let mut request = Request::builder()
            .method(method)
            .uri(format!("{}{path}", self.base_url));
        if body.is_some() {
            request = request.header(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        }
        let request = request
            .body(Full::new(Bytes::from(body.unwrap_or_default())))
            .map_err(|e| TransportError::Connection(e.to_string()))?;

        let response = tokio::time::timeout(self.timeout, self.client.request(request))
            .await
            .map_err(|_| TransportError::Timeout(self.timeout))?
            .map_err(|e| TransportError::Connection(e.to_string()))?;

        let status = response.status();
        let bytes = response
            .into_body()
            .collect()
            .await
            .map_err(|e| TransportError::Connection(e.to_string()))?
            .to_bytes();

        match status {
            StatusCode::OK => serde_json::from_slice(&bytes)
                .map_err(|e| TransportError::Malformed(e.to_string()).into()),
            StatusCode::NOT_FOUND | StatusCode::UNPROCESSABLE_ENTITY => {
                let message = serde_json::from_slice::<ErrorBody>(&bytes)
                    .map(|body| body.message)
                    .unwrap_or_else(|_| status.to_string());
                Err(EndpointError::Rejected(message))
            }
            other => Err(TransportError::UnexpectedStatus(other.as_u16()).into()),
        }
    }
}

#[async_trait]
impl Endpoint for HttpEndpoint {
    fn name(&self) -> String {
        self.base_url.clone()
    }

    async fn post(
        &self,
        customer: CustomerId,
        request: PostRequest,
    ) -> Result<Balance, EndpointError> {
        let body = serde_json::to_vec(&PostBody::from(&request))
            .map_err(|e| TransportError::Malformed(e.to_string()))?;
        let response: PostResponse = self
            .send(
                Method::POST,
                format!("/clientes/{customer}/transacoes"),
                Some(body),
            )
            .await?;
        Ok(response.into())
    }

    async fn statement(&self, customer: CustomerId) -> Result<Statement, EndpointError> {
        let response: StatementResponse = self
            .send(Method::GET, format!("/clientes/{customer}/extrato"), None)
            .await?;
        Ok(response.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Amount;
    use crate::config::LedgerConfig;
    use crate::http::router;
    use crate::service::LedgerService;
    use axum::Router;
    use axum::routing::get;
    use tokio::net::TcpListener;

    async fn spawn_app(app: Router) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{addr}/")
    }

    fn endpoint(base_url: String) -> HttpEndpoint {
        HttpEndpoint::new(base_url, Duration::from_secs(5))
    }

    #[test]
    fn trailing_slash_is_trimmed() {
        let endpoint = HttpEndpoint::new("http://127.0.0.1:3000/", Duration::from_secs(1));
        assert_eq!(endpoint.name(), "http://127.0.0.1:3000");
    }

    #[tokio::test]
    async fn post_and_statement_over_http() {
        let url = spawn_app(router(LedgerService::from_config(&LedgerConfig::default()))).await;
        let endpoint = endpoint(url);

        let committed = endpoint
            .post(1, PostRequest::debit(10, "teste"))
            .await
            .unwrap();
        assert_eq!(committed.balance, Amount::new(-10));
        assert_eq!(committed.limit, Amount::new(100_000));

        let statement = endpoint.statement(1).await.unwrap();
        assert_eq!(statement.balance, Amount::new(-10));
        assert_eq!(statement.recent_transactions[0].description, "teste");
    }

    #[tokio::test]
    async fn ledger_refusals_are_rejections() {
        let url = spawn_app(router(LedgerService::from_config(&LedgerConfig::default()))).await;
        let endpoint = endpoint(url);

        let err = endpoint
            .post(1, PostRequest::debit(150_000, "big"))
            .await
            .unwrap_err();
        assert!(err.is_rejection());

        let err = endpoint.statement(42).await.unwrap_err();
        assert!(err.is_rejection());
    }

    #[tokio::test]
    async fn unexpected_status_is_transport_failure() {
        let app = Router::new().route(
            "/clientes/{id}/extrato",
            get(|| async { (StatusCode::SERVICE_UNAVAILABLE, "busy") }),
        );
        let endpoint = endpoint(spawn_app(app).await);

        assert_eq!(
            endpoint.statement(1).await.unwrap_err(),
            EndpointError::Transport(TransportError::UnexpectedStatus(503))
        );
    }

    #[tokio::test]
    async fn garbage_body_is_malformed() {
        let app = Router::new().route("/clientes/{id}/extrato", get(|| async { "not json" }));
        let endpoint = endpoint(spawn_app(app).await);

        assert!(matches!(
            endpoint.statement(1).await,
            Err(EndpointError::Transport(TransportError::Malformed(_)))
        ));
    }

    #[tokio::test]
    async fn slow_server_times_out() {
        let app = Router::new().route(
            "/clientes/{id}/extrato",
            get(|| async {
                tokio::time::sleep(Duration::from_secs(5)).await;
                "late"
            }),
        );
        let endpoint = HttpEndpoint::new(spawn_app(app).await, Duration::from_millis(50));

        assert_eq!(
            endpoint.statement(1).await.unwrap_err(),
            EndpointError::Transport(TransportError::Timeout(Duration::from_millis(50)))
        );
    }

    #[tokio::test]
    async fn refused_connection_is_transport_failure() {
        // bind then drop, so nothing listens on the port
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let endpoint = endpoint(format!("http://{addr}"));
        assert!(matches!(
            endpoint.post(1, PostRequest::debit(1, "x")).await,
            Err(EndpointError::Transport(TransportError::Connection(_)))
        ));
    }
}
