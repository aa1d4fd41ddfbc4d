//! # Herdbook Backend
//!
//! Client core of a dairy herd app: sign-in, cows, scales and milk
//! weighings, stored in a hosted document database.
//!
//! ## Layers
//! - **storage**: `DocumentStore` / `AuthProvider` traits with in-memory and
//!   Firebase implementations, plus the document mappers
//! - **domain**: session provider, the generic entity list manager and the
//!   milk weighing screen
//! - **io**: screen routing, navigation and the account forms
//!
//! Everything is wired together by [`initialize_backend`], which builds an
//! [`AppState`] from the configuration. Components receive their store and
//! session from it rather than from globals.

use anyhow::{Context, Result};
use log::info;
use shared::{Cow, Scale};
use std::sync::Arc;

pub mod config;
pub mod domain;
pub mod io;
pub mod logging;
pub mod storage;

use config::{AppConfig, BackendKind};
use domain::{EntityListManager, MilkWeighingManager, SessionProvider};
use io::ScreenRouter;
use storage::{
    AuthProvider, DocumentStore, FirebaseAuth, FirestoreStore, MemoryAuthProvider, MemoryDocumentStore,
};

/// Handles shared by every screen
#[derive(Clone)]
pub struct AppState {
    pub config: AppConfig,
    pub session: SessionProvider,
    pub store: Arc<dyn DocumentStore>,
}

impl AppState {
    pub fn new(config: AppConfig, auth: Arc<dyn AuthProvider>, store: Arc<dyn DocumentStore>) -> Self {
        Self {
            config,
            session: SessionProvider::new(auth),
            store,
        }
    }

    /// Manager for the cow list screen
    pub fn cow_manager(&self) -> EntityListManager<Cow> {
        EntityListManager::new(self.store.clone())
    }

    /// Manager for the scale list screen
    pub fn scale_manager(&self) -> EntityListManager<Scale> {
        EntityListManager::new(self.store.clone())
    }

    pub fn milk_weighing_manager(&self) -> MilkWeighingManager {
        MilkWeighingManager::new(self.store.clone())
    }

    pub fn router(&self) -> ScreenRouter {
        ScreenRouter::new(self.session.clone())
    }

    /// Release the session, signing out if configured to
    pub async fn shutdown(self) -> Result<()> {
        if self.config.session.sign_out_on_shutdown && self.session.is_signed_in() {
            self.session
                .sign_out()
                .await
                .context("Failed to sign out during shutdown")?;
        }
        info!("Backend shut down");
        Ok(())
    }
}

/// Build the application state for the configured backend
pub fn initialize_backend(config: AppConfig) -> Result<AppState> {
    config.validate()?;

    let state = match config.backend {
        BackendKind::Memory => {
            info!("Using the in-memory backend");
            let auth = Arc::new(MemoryAuthProvider::new());
            let store = Arc::new(MemoryDocumentStore::new());
            AppState::new(config, auth, store)
        }
        BackendKind::Firebase => {
            info!("Using Firebase project {}", config.firebase.project_id);
            let auth = Arc::new(FirebaseAuth::new(config.firebase.clone())?);
            let store = Arc::new(FirestoreStore::new(config.firebase.clone(), auth.clone())?);
            AppState::new(config, auth, store)
        }
    };
    Ok(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConfigError;
    use crate::domain::SubmitOutcome;
    use shared::CowForm;

    #[tokio::test]
    async fn test_memory_backend_end_to_end() {
        let state = initialize_backend(AppConfig::default()).expect("backend");
        let mut router = state.router();

        let form = router.auth_form_mut();
        form.toggle_mode();
        form.email = "farmer@example.com".to_string();
        form.password = "secret1".to_string();
        router.submit_auth().await.expect("sign up");
        let user = router.tree().identity().cloned().expect("signed in");

        let mut cows = state.cow_manager();
        cows.attach(&user).await.expect("attach");
        cows.open_create_with(CowForm {
            name: "Mimosa".to_string(),
            last_calving_date: "2024-02-10".to_string(),
            lot: "Lot A".to_string(),
        });
        let outcome = cows.submit().await.expect("create");
        assert!(matches!(outcome, SubmitOutcome::Created { .. }));

        let mut weighing = state.milk_weighing_manager();
        weighing.attach(&user).await.expect("attach");
        assert_eq!(weighing.cows().items().len(), 1);

        let mut scales = state.scale_manager();
        scales.attach(&user).await.expect("attach");
        assert!(scales.items().is_empty());
    }

    #[tokio::test]
    async fn test_shutdown_signs_out_when_configured() {
        let mut config = AppConfig::default();
        config.session.sign_out_on_shutdown = true;
        let state = initialize_backend(config).expect("backend");
        let session = state.session.clone();
        session.sign_up("farmer@example.com", "secret1").await.expect("sign up");

        state.shutdown().await.expect("shutdown");
        assert!(!session.is_signed_in());
    }

    #[test]
    fn test_firebase_backend_needs_credentials() {
        let config = AppConfig {
            backend: BackendKind::Firebase,
            ..AppConfig::default()
        };
        let err = initialize_backend(config).err().expect("config error");
        assert!(matches!(
            err.downcast_ref::<ConfigError>(),
            Some(ConfigError::MissingFirebaseSetting(_))
        ));
    }
}
