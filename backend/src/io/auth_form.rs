use log::{error, info};
use shared::{Alert, Identity};
use thiserror::Error;

use crate::domain::{FormError, SessionProvider};
use crate::storage::AuthError;

/// Whether the form signs in to an existing account or creates one
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AuthMode {
    #[default]
    Login,
    SignUp,
}

/// What a successful submit did
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthAction {
    SignedIn(Identity),
    SignedUp(Identity),
    SignedOut,
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum AuthFormError {
    #[error(transparent)]
    Validation(#[from] FormError),
    #[error(transparent)]
    Auth(#[from] AuthError),
}

/// The sign-in / sign-up form
///
/// Submitting while a user is signed in signs them out instead.
#[derive(Debug, Clone, Default)]
pub struct AuthForm {
    pub email: String,
    pub password: String,
    mode: AuthMode,
    alert: Option<Alert>,
}

impl AuthForm {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mode(&self) -> AuthMode {
        self.mode
    }

    pub fn toggle_mode(&mut self) {
        self.mode = match self.mode {
            AuthMode::Login => AuthMode::SignUp,
            AuthMode::SignUp => AuthMode::Login,
        };
    }

    pub fn title(&self) -> &'static str {
        match self.mode {
            AuthMode::Login => "Sign In",
            AuthMode::SignUp => "Sign Up",
        }
    }

    /// Label of the link that switches modes
    pub fn toggle_label(&self) -> &'static str {
        match self.mode {
            AuthMode::Login => "Need an account? Sign Up",
            AuthMode::SignUp => "Already have an account? Sign In",
        }
    }

    pub fn take_alert(&mut self) -> Option<Alert> {
        self.alert.take()
    }

    pub async fn submit(&mut self, session: &SessionProvider) -> Result<AuthAction, AuthFormError> {
        if session.is_signed_in() {
            session.sign_out().await.map_err(|e| self.fail(e))?;
            info!("User signed out");
            return Ok(AuthAction::SignedOut);
        }

        FormError::check_required(&[("email", self.email.as_str()), ("password", self.password.as_str())])
            .map_err(|e| {
                self.alert = Some(Alert::error(e.to_string()));
                e
            })?;

        let email = self.email.trim().to_string();
        match self.mode {
            AuthMode::Login => {
                let identity = session.sign_in(&email, &self.password).await.map_err(|e| self.fail(e))?;
                Ok(AuthAction::SignedIn(identity))
            }
            AuthMode::SignUp => {
                let identity = session.sign_up(&email, &self.password).await.map_err(|e| self.fail(e))?;
                Ok(AuthAction::SignedUp(identity))
            }
        }
    }

    fn fail(&mut self, e: AuthError) -> AuthFormError {
        error!("Authentication error: {}", e);
        self.alert = Some(Alert::error(e.to_string()));
        AuthFormError::Auth(e)
    }
}
