//! HTTP/JSON gateway onto the RPC service.
//!
//! Routes:
//! - GET /api/index            -> Index
//! - GET /api/kifu/:kifu_id    -> Kifu
//! - GET /api/board/:board_id  -> Board
//!
//! Any other path answers 404 with the same JSON error body as an RPC
//! `NotFound`.
//!
//! Each request becomes a native RPC call against the configured endpoint.
//! JSON bodies use the original snake_case field names of the messages.
//! Every field is present, zero values included. Enums are written as their
//! numeric values and 64-bit integers as JSON numbers, not strings.
//! Mount the router behind [`crate::bridge::PathBridgeLayer`] so every call
//! carries the path the client requested.

use crate::bridge;
use crate::proto::api::{self, api_client::ApiClient};
use crate::proto::kifu::Kifu;
use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use tonic::transport::{Channel, Endpoint};
use tonic::{Code, Status};

/// Gateway state: a client for the RPC endpoint.
///
/// The channel connects lazily and reconnects on demand, so the gateway can
/// be built before the RPC server accepts connections.
#[derive(Clone)]
pub struct Gateway {
    client: ApiClient<Channel>,
}

impl Gateway {
    /// Create a gateway for the RPC server at `endpoint` (e.g. `http://127.0.0.1:9001`).
    pub fn connect_lazy(endpoint: impl Into<String>) -> Result<Self, GatewayError> {
        let endpoint = endpoint.into();
        let channel = Endpoint::from_shared(endpoint.clone())
            .map_err(|source| GatewayError::InvalidEndpoint { endpoint, source })?
            .connect_lazy();
        Ok(Self::with_channel(channel))
    }

    /// Create a gateway over an existing channel.
    pub fn with_channel(channel: Channel) -> Self {
        Self {
            client: ApiClient::new(channel),
        }
    }

    /// Build the `/api` router.
    pub fn router(self) -> Router {
        Router::new()
            .route("/api/index", get(index_handler))
            .route("/api/kifu/:kifu_id", get(kifu_handler))
            .route("/api/board/:board_id", get(board_handler))
            .fallback(not_found_handler)
            .with_state(self)
    }
}

/// Unmatched paths, including an empty id such as `/api/kifu/`.
async fn not_found_handler() -> RpcError {
    RpcError(Status::not_found("not found"))
}

/// GET /api/index
async fn index_handler(
    State(gateway): State<Gateway>,
    headers: HeaderMap,
) -> Result<Json<api::IndexResponse>, RpcError> {
    let request = bridge::outgoing_request(api::IndexRequest {}, &headers);
    let response = gateway.client.clone().index(request).await?;
    Ok(Json(response.into_inner()))
}

/// GET /api/kifu/:kifu_id
async fn kifu_handler(
    State(gateway): State<Gateway>,
    Path(kifu_id): Path<String>,
    headers: HeaderMap,
) -> Result<Json<Kifu>, RpcError> {
    let request = bridge::outgoing_request(api::KifuRequest { kifu_id }, &headers);
    let response = gateway.client.clone().kifu(request).await?;
    Ok(Json(response.into_inner()))
}

/// GET /api/board/:board_id
async fn board_handler(
    State(gateway): State<Gateway>,
    Path(board_id): Path<String>,
    headers: HeaderMap,
) -> Result<Json<api::BoardResponse>, RpcError> {
    let request = bridge::outgoing_request(api::BoardRequest { board_id }, &headers);
    let response = gateway.client.clone().board(request).await?;
    Ok(Json(response.into_inner()))
}

/// Map an RPC status code to the HTTP status returned to gateway callers.
pub fn http_status(code: Code) -> StatusCode {
    match code {
        Code::Ok => StatusCode::OK,
        Code::InvalidArgument => StatusCode::BAD_REQUEST,
        Code::NotFound => StatusCode::NOT_FOUND,
        Code::Unimplemented => StatusCode::NOT_IMPLEMENTED,
        Code::Unavailable => StatusCode::SERVICE_UNAVAILABLE,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// RPC failure rendered as a JSON error body.
#[derive(Debug)]
pub struct RpcError(pub Status);

impl From<Status> for RpcError {
    fn from(status: Status) -> Self {
        RpcError(status)
    }
}

impl IntoResponse for RpcError {
    fn into_response(self) -> Response {
        let code = self.0.code();
        let body = serde_json::json!({
            "error": self.0.message(),
            "code": code as i32,
            "message": self.0.message(),
        });

        (http_status(code), Json(body)).into_response()
    }
}

/// Gateway construction errors.
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    #[error("invalid RPC endpoint {endpoint}: {source}")]
    InvalidEndpoint {
        endpoint: String,
        #[source]
        source: tonic::transport::Error,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use tower::ServiceExt;

    #[test]
    fn test_error_kinds_map_to_http_statuses() {
        assert_eq!(http_status(Code::NotFound), StatusCode::NOT_FOUND);
        assert_eq!(http_status(Code::Internal), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(http_status(Code::Unimplemented), StatusCode::NOT_IMPLEMENTED);
        assert_eq!(http_status(Code::InvalidArgument), StatusCode::BAD_REQUEST);
        assert_eq!(http_status(Code::Unavailable), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(http_status(Code::DataLoss), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(http_status(Code::PermissionDenied), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn test_rpc_error_renders_json_body() {
        let response = RpcError(Status::not_found("kifu not found")).into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["error"], "kifu not found");
        assert_eq!(json["message"], "kifu not found");
        assert_eq!(json["code"], Code::NotFound as i32);
    }

    #[tokio::test]
    async fn test_unmatched_paths_render_json_not_found() {
        let router = Gateway::connect_lazy("http://127.0.0.1:1").unwrap().router();

        for uri in ["/api/kifu/", "/api/nope", "/api/board/"] {
            let response = router
                .clone()
                .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::NOT_FOUND, "{uri}");

            let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
            let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
            assert_eq!(json["code"], Code::NotFound as i32, "{uri}");
            assert_eq!(json["message"], "not found", "{uri}");
        }
    }

    #[test]
    fn test_invalid_endpoint_is_rejected() {
        assert!(Gateway::connect_lazy("not a uri").is_err());
    }

    #[tokio::test]
    async fn test_connect_lazy_does_not_dial() {
        // Nothing listens here; building the gateway must still succeed.
        assert!(Gateway::connect_lazy("http://127.0.0.1:1").is_ok());
    }
}
