use async_trait::async_trait;
use log::info;
use shared::Identity;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio::sync::watch;
use uuid::Uuid;

use crate::storage::traits::{AuthError, AuthProvider, TokenSource};

const MIN_PASSWORD_LEN: usize = 6;

#[derive(Debug, Clone)]
struct Account {
    uid: String,
    email: String,
    password: String,
}

/// In-process auth provider with the hosted provider's validation rules
#[derive(Clone)]
pub struct MemoryAuthProvider {
    accounts: Arc<Mutex<HashMap<String, Account>>>,
    session: Arc<watch::Sender<Option<Identity>>>,
}

impl Default for MemoryAuthProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryAuthProvider {
    pub fn new() -> Self {
        let (session, _) = watch::channel(None);
        Self {
            accounts: Arc::new(Mutex::new(HashMap::new())),
            session: Arc::new(session),
        }
    }

    fn normalize_email(email: &str) -> String {
        email.trim().to_lowercase()
    }

    fn check_email(email: &str) -> Result<(), AuthError> {
        let valid = email
            .split_once('@')
            .map(|(local, domain)| !local.is_empty() && domain.contains('.'))
            .unwrap_or(false);
        if valid {
            Ok(())
        } else {
            Err(AuthError::InvalidEmail)
        }
    }

    fn check_password(password: &str) -> Result<(), AuthError> {
        if password.chars().count() < MIN_PASSWORD_LEN {
            return Err(AuthError::WeakPassword(format!(
                "Password should be at least {} characters",
                MIN_PASSWORD_LEN
            )));
        }
        Ok(())
    }

    fn accounts(&self) -> Result<std::sync::MutexGuard<'_, HashMap<String, Account>>, AuthError> {
        self.accounts
            .lock()
            .map_err(|_| AuthError::Rejected("account table lock poisoned".to_string()))
    }

    fn publish(&self, identity: Option<Identity>) {
        self.session.send_replace(identity);
    }
}

#[async_trait]
impl AuthProvider for MemoryAuthProvider {
    async fn sign_in(&self, email: &str, password: &str) -> Result<Identity, AuthError> {
        let key = Self::normalize_email(email);
        let identity = {
            let accounts = self.accounts()?;
            let account = accounts
                .get(&key)
                .filter(|account| account.password == password)
                .ok_or(AuthError::InvalidCredential)?;
            Identity {
                uid: account.uid.clone(),
                email: account.email.clone(),
            }
        };

        info!("Signed in {}", identity.email);
        self.publish(Some(identity.clone()));
        Ok(identity)
    }

    async fn sign_up(&self, email: &str, password: &str) -> Result<Identity, AuthError> {
        let key = Self::normalize_email(email);
        Self::check_email(&key)?;
        Self::check_password(password)?;

        let identity = {
            let mut accounts = self.accounts()?;
            if accounts.contains_key(&key) {
                return Err(AuthError::EmailInUse);
            }
            let account = Account {
                uid: Uuid::new_v4().simple().to_string(),
                email: key.clone(),
                password: password.to_string(),
            };
            let identity = Identity {
                uid: account.uid.clone(),
                email: account.email.clone(),
            };
            accounts.insert(key, account);
            identity
        };

        info!("Created account {}", identity.email);
        self.publish(Some(identity.clone()));
        Ok(identity)
    }

    async fn sign_out(&self) -> Result<(), AuthError> {
        if let Some(identity) = self.current_identity() {
            info!("Signed out {}", identity.email);
        }
        self.publish(None);
        Ok(())
    }

    async fn update_account(&self, email: &str, password: &str) -> Result<Identity, AuthError> {
        let current = self.current_identity().ok_or(AuthError::NotSignedIn)?;
        let new_key = Self::normalize_email(email);
        Self::check_email(&new_key)?;
        Self::check_password(password)?;

        let identity = {
            let mut accounts = self.accounts()?;
            if new_key != current.email && accounts.contains_key(&new_key) {
                return Err(AuthError::EmailInUse);
            }
            let mut account = accounts
                .remove(&current.email)
                .ok_or(AuthError::SessionExpired)?;
            account.email = new_key.clone();
            account.password = password.to_string();
            let identity = Identity {
                uid: account.uid.clone(),
                email: account.email.clone(),
            };
            accounts.insert(new_key, account);
            identity
        };

        info!("Updated account {}", identity.uid);
        self.publish(Some(identity.clone()));
        Ok(identity)
    }

    fn current_identity(&self) -> Option<Identity> {
        self.session.borrow().clone()
    }

    fn subscribe(&self) -> watch::Receiver<Option<Identity>> {
        self.session.subscribe()
    }
}

#[async_trait]
impl TokenSource for MemoryAuthProvider {
    async fn id_token(&self) -> Result<Option<String>, AuthError> {
        Ok(None)
    }
}
