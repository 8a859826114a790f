//! Request logging for unary RPC calls.

use crate::bridge;
use crate::proto::api::{self, api_server::Api};
use crate::proto::kifu::Kifu;
use std::future::Future;
use tonic::{Request, Response, Status};

const INDEX_METHOD: &str = "/api.API/Index";
const KIFU_METHOD: &str = "/api.API/Kifu";
const BOARD_METHOD: &str = "/api.API/Board";

/// Wraps an [`Api`] implementation and logs every call by its bridged path.
///
/// Calls without a bridged path are rejected with `INTERNAL` before they
/// reach the inner service. Everything else passes through untouched: the
/// caller sees exactly the response or status the inner service produced.
pub struct LoggingInterceptor<S> {
    inner: S,
}

impl<S> LoggingInterceptor<S> {
    pub fn new(inner: S) -> Self {
        Self { inner }
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }
}

/// Run one unary call through the interceptor.
///
/// Extracts the bridged path, invokes `handler`, and emits one log event
/// for the outcome.
pub async fn intercept<Req, Res, F, Fut>(
    method: &'static str,
    request: Request<Req>,
    handler: F,
) -> Result<Response<Res>, Status>
where
    F: FnOnce(Request<Req>) -> Fut,
    Fut: Future<Output = Result<Response<Res>, Status>>,
{
    let path = bridge::bridged_path(request.metadata()).inspect_err(|status| {
        tracing::error!(method, error = %status.message(), "Rejected call without bridged path");
    })?;

    let result = handler(request).await;
    match &result {
        Ok(_) => tracing::info!(path = %path, method, "Request"),
        Err(status) => tracing::warn!(
            path = %path,
            method,
            code = ?status.code(),
            error = %status.message(),
            "Request error"
        ),
    }
    result
}

#[tonic::async_trait]
impl<S: Api> Api for LoggingInterceptor<S> {
    async fn index(
        &self,
        request: Request<api::IndexRequest>,
    ) -> Result<Response<api::IndexResponse>, Status> {
        intercept(INDEX_METHOD, request, |req| self.inner.index(req)).await
    }

    async fn kifu(&self, request: Request<api::KifuRequest>) -> Result<Response<Kifu>, Status> {
        intercept(KIFU_METHOD, request, |req| self.inner.kifu(req)).await
    }

    async fn board(
        &self,
        request: Request<api::BoardRequest>,
    ) -> Result<Response<api::BoardResponse>, Status> {
        intercept(BOARD_METHOD, request, |req| self.inner.board(req)).await
    }
}
