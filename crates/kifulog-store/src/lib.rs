//! kifulog-store: flat-file collection store.
//!
//! Every collection lives in its own file under a root directory and maps
//! string ids to base64-encoded protobuf messages. Collections are loaded in
//! full at startup and are immutable afterwards, so reads need no locking.
//!
//! The store is schema-agnostic: it hands out encoded text, and callers pick
//! the message type when decoding.

pub mod codec;
pub mod collection;
pub mod error;
pub mod store;

pub use codec::{decode, encode};
pub use collection::Collection;
pub use error::{DecodeError, Result, StoreError};
pub use store::{Store, StoreBuilder};
