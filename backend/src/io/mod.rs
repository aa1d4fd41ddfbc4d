//! # IO Layer
//!
//! Screen-level state between the UI and the domain layer.
//!
//! ## Key Responsibilities
//! - **Routing**: pick the signed-out or signed-in screen tree from the session
//! - **Navigation**: a stack of named routes with push and pop
//! - **Forms**: the sign-in/sign-up form and the edit account form
//!
//! Rendering is left to the UI; everything here is plain state that a UI
//! reads and drives.

pub mod account_form;
pub mod auth_form;
pub mod navigation;
pub mod router;

pub use account_form::EditAccountForm;
pub use auth_form::{AuthAction, AuthForm, AuthFormError, AuthMode};
pub use navigation::{NavigationError, Navigator, Route};
pub use router::{route, ScreenRouter, ScreenTree};
