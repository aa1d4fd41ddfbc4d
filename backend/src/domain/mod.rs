//! # Domain Layer
//!
//! Screen-independent state and behaviour of the app.
//!
//! ## Key Responsibilities
//! - **Session**: observe who is signed in and forward credential changes to
//!   the auth provider
//! - **Entity lists**: one generic list manager (fetch, search, create/edit
//!   modal, confirmed delete) instantiated for cows, scales and weighings
//! - **Milk weighing screen**: the cow list plus a per-cow weighing drill-down
//! - **Validation**: required fields and weight parsing, before any store call
//!
//! The domain layer only talks to the outside world through the storage
//! traits; the io layer turns its state into screens.

pub mod entity;
pub mod errors;
pub mod list_manager;
pub mod milk_weighing;
pub mod session;

pub use entity::{EntityKind, WeighingDraft};
pub use errors::{FormError, ManagerError};
pub use list_manager::{Confirmation, DeleteOutcome, EntityListManager, Modal, Phase, SubmitOutcome};
pub use milk_weighing::MilkWeighingManager;
pub use session::{SessionProvider, SessionSubscription};
