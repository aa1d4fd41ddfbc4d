//! Firebase implementations of the storage traits.
//!
//! - **auth**: Identity Toolkit (`accounts:*`) and Secure Token refresh
//! - **firestore**: Cloud Firestore `runQuery` / `commit`
//! - **codec**: Firestore's typed JSON value encoding

pub mod auth;
pub mod codec;
pub mod firestore;

pub use auth::FirebaseAuth;
pub use firestore::FirestoreStore;
