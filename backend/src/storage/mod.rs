//! # Storage Module
//!
//! Handles all communication with the hosted backend services.
//!
//! This module abstracts away the specific backend behind two traits, so the
//! domain layer works the same against the in-memory implementations (demo
//! mode, tests) and the Firebase REST clients (production).
//!
//! ## Key Responsibilities
//!
//! - **Document model**: typed field values, server-timestamp writes, equality filters
//! - **Document store**: query, insert, update and delete by id
//! - **Authentication**: sign-in, sign-up, sign-out, account updates, session changes
//! - **Mapping**: converting entities to and from stored documents
//!
//! ## Design Principles
//!
//! - **Dependency Inversion**: domain depends on `DocumentStore` / `AuthProvider`, not implementations
//! - **Wire compatibility**: collection and field names match the documents already stored
//! - **Testability**: memory implementations plus recording/failing stores for unit tests

pub mod document;
pub mod firebase;
pub mod mappers;
pub mod memory;
pub mod traits;

#[cfg(test)]
pub mod test_utils;

pub use document::{Document, EqualityFilter, FieldValue, FieldWrite, FieldWrites, Fields};
pub use firebase::{FirebaseAuth, FirestoreStore};
pub use memory::{MemoryAuthProvider, MemoryDocumentStore};
pub use traits::{AuthError, AuthProvider, DocumentStore, TokenSource};
