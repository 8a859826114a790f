//! Carries the original HTTP path from the front door to the RPC handlers.
//!
//! The gateway translates HTTP requests into RPC calls, and RPC calls have
//! no field for the HTTP path the client asked for. The path is sent as
//! call metadata under [`PATH_METADATA_KEY`] instead:
//!
//! 1. [`PathBridgeLayer`] stamps the request path into that header on the
//!    HTTP side, replacing any value the client sent.
//! 2. The gateway copies the header into the outgoing call's metadata with
//!    [`outgoing_request`].
//! 3. On the RPC side, [`bridged_path`] reads it back. A call without it did
//!    not come through the front door correctly, so it fails with
//!    `INTERNAL` rather than blaming the caller.

use http::header::{HeaderMap, HeaderValue};
use http::Request;
use std::task::{Context, Poll};
use tonic::metadata::{Ascii, MetadataMap, MetadataValue};
use tonic::Status;
use tower::{Layer, Service};

/// Header and metadata key holding the original HTTP request path.
///
/// Both sides of the bridge use this key; it is part of the internal
/// transport contract between the front door and the RPC server.
pub const PATH_METADATA_KEY: &str = "x-kifulog-path";

/// Layer that stamps the request path into [`PATH_METADATA_KEY`].
#[derive(Clone, Debug, Default)]
pub struct PathBridgeLayer;

impl PathBridgeLayer {
    pub fn new() -> Self {
        Self
    }
}

impl<S> Layer<S> for PathBridgeLayer {
    type Service = PathBridge<S>;

    fn layer(&self, inner: S) -> Self::Service {
        PathBridge { inner }
    }
}

/// Service that stamps the request path, then calls the inner service.
#[derive(Clone, Debug)]
pub struct PathBridge<S> {
    inner: S,
}

impl<S, B> Service<Request<B>> for PathBridge<S>
where
    S: Service<Request<B>>,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = S::Future;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut request: Request<B>) -> Self::Future {
        stamp_path(&mut request);
        self.inner.call(request)
    }
}

/// Set [`PATH_METADATA_KEY`] to the request's path, without the query.
///
/// Leaves every other header alone.
pub fn stamp_path<B>(request: &mut Request<B>) {
    match HeaderValue::from_str(request.uri().path()) {
        Ok(value) => {
            request.headers_mut().insert(PATH_METADATA_KEY, value);
        }
        Err(e) => {
            // Paths from a parsed URI are visible ASCII, so this is not expected.
            tracing::warn!(uri = %request.uri(), error = %e, "Cannot bridge request path");
            request.headers_mut().remove(PATH_METADATA_KEY);
        }
    }
}

/// Build an outgoing RPC request carrying the bridged path from `headers`.
///
/// If the header is absent the call is sent without it, and the RPC side
/// rejects it.
pub fn outgoing_request<T>(message: T, headers: &HeaderMap) -> tonic::Request<T> {
    let mut request = tonic::Request::new(message);
    let value = headers
        .get(PATH_METADATA_KEY)
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.parse::<MetadataValue<Ascii>>().ok());

    match value {
        Some(value) => {
            request.metadata_mut().insert(PATH_METADATA_KEY, value);
        }
        None => tracing::warn!("Forwarding RPC call without bridged path"),
    }
    request
}

/// Read the bridged path from incoming call metadata.
pub fn bridged_path(metadata: &MetadataMap) -> Result<String, Status> {
    let value = metadata
        .get(PATH_METADATA_KEY)
        .ok_or_else(|| Status::internal("no path in metadata"))?;
    let path = value
        .to_str()
        .map_err(|_| Status::internal("malformed path in metadata"))?;

    if path.is_empty() {
        return Err(Status::internal("no path in metadata"));
    }
    Ok(path.to_string())
}
