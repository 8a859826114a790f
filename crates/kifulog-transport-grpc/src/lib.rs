//! gRPC transport + HTTP/JSON gateway for kifulog.
//!
//! Implements the `api.API` service defined in proto/api.proto:
//! - Index: summary listing
//! - Kifu: single game record by id
//! - Board: not implemented, always fails with `Unimplemented`
//!
//! HTTP callers reach the same operations through [`gateway`], which turns
//! `/api/...` requests into RPC calls. The original HTTP path travels with
//! each call as metadata (see [`bridge`]) so that [`interceptor`] can log
//! calls by the path the client actually requested.

pub mod proto {
    //! Generated protobuf types and service traits.

    pub mod kifu {
        tonic::include_proto!("kifu");
    }

    pub mod account {
        tonic::include_proto!("account");
    }

    pub mod api {
        tonic::include_proto!("api");
    }
}

pub mod bridge;
pub mod gateway;
pub mod interceptor;
pub mod record;
pub mod record_backend;
pub mod server;

pub use gateway::Gateway;
pub use record_backend::{RecordBackend, StoreBackend};
pub use server::GrpcServer;
