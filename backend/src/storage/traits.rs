//! # Storage Traits
//!
//! This module defines the abstraction traits for the two hosted services the
//! app talks to: the document store and the authentication provider. The
//! domain layer only ever sees these traits, so the in-memory implementations
//! and the Firebase REST clients are interchangeable.

use anyhow::Result;
use async_trait::async_trait;
use shared::Identity;
use tokio::sync::watch;

use super::document::{Document, EqualityFilter, FieldWrites};

/// Trait defining the interface for document store operations
///
/// Mirrors the hosted document database: equality queries over one
/// collection plus insert, partial update and delete by id.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// All documents of `collection` matching `filter`, in store order
    async fn query(&self, collection: &str, filter: &EqualityFilter) -> Result<Vec<Document>>;

    /// Insert a new document and return the id the store assigned to it
    async fn insert(&self, collection: &str, fields: FieldWrites) -> Result<String>;

    /// Overwrite the given fields of an existing document.
    /// Fails if the document does not exist.
    async fn update(&self, collection: &str, id: &str, fields: FieldWrites) -> Result<()>;

    /// Delete a document. Deleting a missing document is not an error.
    async fn delete(&self, collection: &str, id: &str) -> Result<()>;
}

/// Failures reported by an auth provider
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthError {
    #[error("Invalid email or password")]
    InvalidCredential,
    #[error("This email address is already in use")]
    EmailInUse,
    #[error("Invalid email address")]
    InvalidEmail,
    #[error("Password is too weak: {0}")]
    WeakPassword(String),
    #[error("No user is signed in")]
    NotSignedIn,
    #[error("Session expired, please sign in again")]
    SessionExpired,
    #[error("Too many attempts, try again later")]
    TooManyAttempts,
    #[error("Network error: {0}")]
    Network(String),
    #[error("Authentication failed: {0}")]
    Rejected(String),
}

/// Trait defining the interface for authentication providers
#[async_trait]
pub trait AuthProvider: Send + Sync {
    async fn sign_in(&self, email: &str, password: &str) -> Result<Identity, AuthError>;

    async fn sign_up(&self, email: &str, password: &str) -> Result<Identity, AuthError>;

    async fn sign_out(&self) -> Result<(), AuthError>;

    /// Change the signed-in user's email and password
    async fn update_account(&self, email: &str, password: &str) -> Result<Identity, AuthError>;

    /// Last known identity, `None` when signed out
    fn current_identity(&self) -> Option<Identity>;

    /// Observe every session change. Dropping the receiver unsubscribes.
    fn subscribe(&self) -> watch::Receiver<Option<Identity>>;
}

/// Source of the bearer token attached to document store requests
#[async_trait]
pub trait TokenSource: Send + Sync {
    /// A currently valid ID token, or `None` when nobody is signed in
    async fn id_token(&self) -> Result<Option<String>, AuthError>;
}
