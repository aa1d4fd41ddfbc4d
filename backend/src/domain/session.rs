use log::{debug, info, warn};
use shared::Identity;
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::storage::traits::{AuthError, AuthProvider};

/// Who is signed in, as an observable value
///
/// Thin wrapper over the auth provider. It keeps no state of its own: the
/// provider publishes every sign-in, sign-up, account update and sign-out,
/// and consumers either read the current value or subscribe to changes.
#[derive(Clone)]
pub struct SessionProvider {
    auth: Arc<dyn AuthProvider>,
}

impl SessionProvider {
    pub fn new(auth: Arc<dyn AuthProvider>) -> Self {
        Self { auth }
    }

    pub fn current(&self) -> Option<Identity> {
        self.auth.current_identity()
    }

    pub fn is_signed_in(&self) -> bool {
        self.current().is_some()
    }

    /// A receiver that sees every later session change
    pub fn watch(&self) -> watch::Receiver<Option<Identity>> {
        self.auth.subscribe()
    }

    /// Call `callback` with the current session now and again on every
    /// change, until the returned subscription is dropped.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn on_change<F>(&self, mut callback: F) -> SessionSubscription
    where
        F: FnMut(Option<Identity>) + Send + 'static,
    {
        let mut receiver = self.watch();
        callback(receiver.borrow_and_update().clone());

        let handle = tokio::spawn(async move {
            while receiver.changed().await.is_ok() {
                let identity = receiver.borrow_and_update().clone();
                callback(identity);
            }
            debug!("Session channel closed, ending subscription");
        });

        SessionSubscription { handle }
    }

    pub async fn sign_in(&self, email: &str, password: &str) -> Result<Identity, AuthError> {
        info!("Signing in {}", email);
        self.auth.sign_in(email, password).await.map_err(|e| {
            warn!("Sign-in failed for {}: {}", email, e);
            e
        })
    }

    pub async fn sign_up(&self, email: &str, password: &str) -> Result<Identity, AuthError> {
        info!("Creating account {}", email);
        self.auth.sign_up(email, password).await.map_err(|e| {
            warn!("Sign-up failed for {}: {}", email, e);
            e
        })
    }

    pub async fn sign_out(&self) -> Result<(), AuthError> {
        self.auth.sign_out().await
    }

    /// Change the signed-in user's email and password
    pub async fn update_account(&self, email: &str, password: &str) -> Result<Identity, AuthError> {
        self.auth.update_account(email, password).await.map_err(|e| {
            warn!("Account update failed: {}", e);
            e
        })
    }
}

/// Handle for an [`SessionProvider::on_change`] callback; delivery stops
/// when it is dropped
#[derive(Debug)]
pub struct SessionSubscription {
    handle: JoinHandle<()>,
}

impl SessionSubscription {
    pub fn unsubscribe(self) {}
}

impl Drop for SessionSubscription {
    fn drop(&mut self) {
        self.handle.abort();
    }
}
