//! Record backend trait for abstracting over where records come from.

use crate::proto::kifu::Kifu;
use kifulog_store::{Collection, Store, StoreError};
use std::sync::Arc;

/// Backend interface for record lookups.
///
/// Lookups are in-memory and never block, so the trait is synchronous.
pub trait RecordBackend: Send + Sync {
    /// Get a game record by id.
    fn kifu(&self, id: &str) -> Result<Kifu, StoreError>;
}

/// Adapter to make a loaded [`Store`] implement [`RecordBackend`].
pub struct StoreBackend {
    store: Arc<Store>,
}

impl StoreBackend {
    /// Create a new store-backed backend.
    pub fn new(store: Arc<Store>) -> Self {
        Self { store }
    }
}

impl RecordBackend for StoreBackend {
    fn kifu(&self, id: &str) -> Result<Kifu, StoreError> {
        self.store.get_decoded(Collection::Kifu, id)
    }
}
