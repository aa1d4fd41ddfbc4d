//! In-process implementations of the storage traits.
//!
//! Used when the app runs with `backend: memory` and throughout the tests.

pub mod auth_provider;
pub mod document_store;

pub use auth_provider::MemoryAuthProvider;
pub use document_store::{Clock, MemoryDocumentStore};
