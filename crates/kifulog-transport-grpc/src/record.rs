//! Record service implementation.
//!
//! Handles Index, Kifu and Board by reading from a RecordBackend.

use crate::proto::api::{self, api_server::Api, index_response};
use crate::proto::kifu::Kifu;
use crate::record_backend::RecordBackend;
use std::sync::Arc;
use tonic::{Request, Response, Status};

/// Record service implementation.
///
/// Store failures are classified here: a missing id becomes `NOT_FOUND`,
/// anything else becomes an opaque `INTERNAL`. The underlying cause is
/// logged and never returned to the caller.
pub struct RecordService {
    backend: Arc<dyn RecordBackend>,
}

impl RecordService {
    /// Create a new record service.
    pub fn new(backend: Arc<dyn RecordBackend>) -> Self {
        Self { backend }
    }
}

/// Summary listing served by Index.
///
/// Static: it does not reflect the store contents.
fn index_listing() -> api::IndexResponse {
    api::IndexResponse {
        entries: vec![index_response::Entry {
            id: "kifu_id".to_string(),
            kifu: Some(Kifu::default()),
        }],
        recent_comments: vec![],
    }
}

#[tonic::async_trait]
impl Api for RecordService {
    async fn index(
        &self,
        _request: Request<api::IndexRequest>,
    ) -> Result<Response<api::IndexResponse>, Status> {
        Ok(Response::new(index_listing()))
    }

    async fn kifu(&self, request: Request<api::KifuRequest>) -> Result<Response<Kifu>, Status> {
        let req = request.into_inner();

        tracing::debug!(kifu_id = %req.kifu_id, "KIFU request");

        if req.kifu_id.is_empty() {
            return Err(Status::not_found("kifu not found"));
        }

        match self.backend.kifu(&req.kifu_id) {
            Ok(kifu) => Ok(Response::new(kifu)),
            Err(e) if e.is_not_found() => Err(Status::not_found("kifu not found")),
            Err(e) => {
                tracing::error!(kifu_id = %req.kifu_id, error = %e, "Failed to read kifu");
                Err(Status::internal("internal error"))
            }
        }
    }

    async fn board(
        &self,
        request: Request<api::BoardRequest>,
    ) -> Result<Response<api::BoardResponse>, Status> {
        tracing::warn!(
            board_id = %request.get_ref().board_id,
            "Board called but not implemented"
        );
        Err(Status::unimplemented("Board is not implemented"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record_backend::StoreBackend;
    use kifulog_store::{Collection, Store};
    use tonic::Code;

    fn kifu(id: &str) -> Kifu {
        Kifu {
            id: id.to_string(),
            start_ts: 1_500_000_000,
            game_name: "ranked".to_string(),
            ..Default::default()
        }
    }

    fn service(store: Store) -> RecordService {
        RecordService::new(Arc::new(StoreBackend::new(Arc::new(store))))
    }

    fn kifu_request(id: &str) -> Request<api::KifuRequest> {
        Request::new(api::KifuRequest {
            kifu_id: id.to_string(),
        })
    }

    #[tokio::test]
    async fn test_kifu_found() {
        let svc = service(
            Store::builder()
                .insert_message(Collection::Kifu, "abc", &kifu("abc"))
                .build(),
        );

        let resp = svc.kifu(kifu_request("abc")).await.unwrap().into_inner();
        assert_eq!(resp, kifu("abc"));
    }

    #[tokio::test]
    async fn test_empty_id_is_not_found() {
        // A record stored under "" must not be served.
        let svc = service(
            Store::builder()
                .insert_message(Collection::Kifu, "", &kifu(""))
                .build(),
        );

        let status = svc.kifu(kifu_request("")).await.unwrap_err();
        assert_eq!(status.code(), Code::NotFound);
    }

    #[tokio::test]
    async fn test_absent_id_is_not_found() {
        let svc = service(Store::builder().build());

        let status = svc.kifu(kifu_request("missing")).await.unwrap_err();
        assert_eq!(status.code(), Code::NotFound);
        assert_eq!(status.message(), "kifu not found");
    }

    #[tokio::test]
    async fn test_id_from_other_collection_is_not_found() {
        let svc = service(
            Store::builder()
                .insert_message(Collection::KifuMeta, "abc", &kifu("abc"))
                .build(),
        );

        let status = svc.kifu(kifu_request("abc")).await.unwrap_err();
        assert_eq!(status.code(), Code::NotFound);
    }

    #[tokio::test]
    async fn test_corrupt_record_is_opaque_internal() {
        let svc = service(
            Store::builder()
                .insert(Collection::Kifu, "text", "%%% not base64")
                .insert(Collection::Kifu, "message", "CgVh")
                .build(),
        );

        for id in ["text", "message"] {
            let status = svc.kifu(kifu_request(id)).await.unwrap_err();
            assert_eq!(status.code(), Code::Internal);
            assert_eq!(status.message(), "internal error");
        }
    }

    #[tokio::test]
    async fn test_board_is_unimplemented() {
        let svc = service(Store::builder().build());

        let status = svc
            .board(Request::new(api::BoardRequest {
                board_id: "b1".to_string(),
            }))
            .await
            .unwrap_err();
        assert_eq!(status.code(), Code::Unimplemented);

        // The service keeps answering other calls.
        assert!(svc.index(Request::new(api::IndexRequest {})).await.is_ok());
    }

    #[tokio::test]
    async fn test_index_is_static_listing() {
        let svc = service(
            Store::builder()
                .insert_message(Collection::Kifu, "abc", &kifu("abc"))
                .build(),
        );

        let resp = svc
            .index(Request::new(api::IndexRequest {}))
            .await
            .unwrap()
            .into_inner();
        assert_eq!(resp.entries.len(), 1);
        assert_eq!(resp.entries[0].id, "kifu_id");
        assert_eq!(resp.entries[0].kifu, Some(Kifu::default()));
        assert!(resp.recent_comments.is_empty());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_concurrent_reads_are_identical() {
        let svc = Arc::new(service(
            Store::builder()
                .insert_message(Collection::Kifu, "abc", &kifu("abc"))
                .build(),
        ));

        let mut handles = Vec::new();
        for _ in 0..64 {
            let svc = svc.clone();
            handles.push(tokio::spawn(async move {
                svc.kifu(kifu_request("abc")).await.unwrap().into_inner()
            }));
        }

        for handle in handles {
            assert_eq!(handle.await.unwrap(), kifu("abc"));
        }
    }
}
