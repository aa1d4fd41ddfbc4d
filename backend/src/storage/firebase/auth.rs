use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use log::{debug, info, warn};
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use shared::Identity;
use tokio::sync::{watch, Mutex};

use crate::config::FirebaseConfig;
use crate::storage::traits::{AuthError, AuthProvider, TokenSource};

/// Refresh the ID token this long before it actually expires
const EXPIRY_MARGIN_SECS: i64 = 60;

#[derive(Debug, Clone)]
struct Tokens {
    id_token: String,
    refresh_token: String,
    expires_at: DateTime<Utc>,
}

impl Tokens {
    fn is_fresh(&self, now: DateTime<Utc>) -> bool {
        now + Duration::seconds(EXPIRY_MARGIN_SECS) < self.expires_at
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct PasswordRequest<'a> {
    email: &'a str,
    password: &'a str,
    return_secure_token: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct UpdateRequest<'a> {
    id_token: &'a str,
    email: &'a str,
    password: &'a str,
    return_secure_token: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AccountResponse {
    local_id: String,
    email: Option<String>,
    id_token: Option<String>,
    refresh_token: Option<String>,
    expires_in: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RefreshResponse {
    id_token: String,
    refresh_token: String,
    expires_in: String,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}

/// Map an Identity Toolkit error message such as
/// `"WEAK_PASSWORD : Password should be at least 6 characters"`
pub(crate) fn map_error_message(message: &str) -> AuthError {
    let (code, detail) = match message.split_once(" : ") {
        Some((code, detail)) => (code.trim(), detail.trim()),
        None => (message.trim(), ""),
    };

    match code {
        "EMAIL_NOT_FOUND" | "INVALID_PASSWORD" | "INVALID_LOGIN_CREDENTIALS" | "USER_DISABLED" => {
            AuthError::InvalidCredential
        }
        "EMAIL_EXISTS" => AuthError::EmailInUse,
        "INVALID_EMAIL" | "MISSING_EMAIL" => AuthError::InvalidEmail,
        "WEAK_PASSWORD" | "MISSING_PASSWORD" => AuthError::WeakPassword(if detail.is_empty() {
            code.to_string()
        } else {
            detail.to_string()
        }),
        "TOO_MANY_ATTEMPTS_TRY_LATER" => AuthError::TooManyAttempts,
        "TOKEN_EXPIRED" | "INVALID_ID_TOKEN" | "INVALID_REFRESH_TOKEN" | "USER_NOT_FOUND"
        | "CREDENTIAL_TOO_OLD_LOGIN_AGAIN" => AuthError::SessionExpired,
        _ => AuthError::Rejected(message.to_string()),
    }
}

fn expiry_from(expires_in: Option<&str>, now: DateTime<Utc>) -> DateTime<Utc> {
    let secs = expires_in
        .and_then(|s| s.trim().parse::<i64>().ok())
        .unwrap_or(3600);
    now + Duration::seconds(secs)
}

/// Firebase Authentication over the Identity Toolkit REST API
///
/// Keeps the session's tokens in memory only; signing out simply forgets
/// them, as the hosted client SDK does.
pub struct FirebaseAuth {
    http: Client,
    config: FirebaseConfig,
    tokens: Mutex<Option<Tokens>>,
    session: watch::Sender<Option<Identity>>,
}

impl FirebaseAuth {
    pub fn new(config: FirebaseConfig) -> Result<Self> {
        let http = Client::builder()
            .timeout(std::time::Duration::from_secs(config.request_timeout_secs))
            .build()
            .context("Failed to create HTTP client for Firebase Auth")?;
        let (session, _) = watch::channel(None);

        Ok(Self {
            http,
            config,
            tokens: Mutex::new(None),
            session,
        })
    }

    fn accounts_url(&self, endpoint: &str) -> String {
        format!(
            "{}/v1/accounts:{}",
            self.config.auth_base_url.trim_end_matches('/'),
            endpoint
        )
    }

    fn token_url(&self) -> String {
        format!("{}/v1/token", self.config.token_base_url.trim_end_matches('/'))
    }

    async fn parse<T: DeserializeOwned>(response: Response, endpoint: &str) -> Result<T, AuthError> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ErrorEnvelope>(&body)
                .map(|envelope| envelope.error.message)
                .unwrap_or_else(|_| format!("HTTP {}: {}", status, body));
            warn!("Firebase Auth {} failed ({}): {}", endpoint, status, message);
            return Err(map_error_message(&message));
        }

        response
            .json::<T>()
            .await
            .map_err(|e| AuthError::Rejected(format!("unexpected {} response: {}", endpoint, e)))
    }

    async fn post_account<B: Serialize + Sync>(
        &self,
        endpoint: &str,
        body: &B,
    ) -> Result<AccountResponse, AuthError> {
        debug!("POST accounts:{}", endpoint);
        let response = self
            .http
            .post(self.accounts_url(endpoint))
            .query(&[("key", self.config.api_key.as_str())])
            .json(body)
            .send()
            .await
            .map_err(|e| AuthError::Network(e.to_string()))?;
        Self::parse(response, endpoint).await
    }

    /// Store the tokens from an account response and publish the identity
    async fn establish(&self, account: AccountResponse, fallback_email: &str) -> Result<Identity, AuthError> {
        let identity = Identity {
            uid: account.local_id,
            email: account.email.unwrap_or_else(|| fallback_email.to_string()),
        };

        {
            let mut tokens = self.tokens.lock().await;
            match (account.id_token, account.refresh_token) {
                (Some(id_token), Some(refresh_token)) => {
                    *tokens = Some(Tokens {
                        id_token,
                        refresh_token,
                        expires_at: expiry_from(account.expires_in.as_deref(), Utc::now()),
                    });
                }
                _ if tokens.is_none() => {
                    return Err(AuthError::Rejected("response carried no session tokens".to_string()));
                }
                // accounts:update without a password change keeps the old tokens
                _ => {}
            }
        }

        self.session.send_replace(Some(identity.clone()));
        Ok(identity)
    }

    async fn refresh(&self, refresh_token: &str) -> Result<Tokens, AuthError> {
        debug!("Refreshing Firebase ID token");
        let response = self
            .http
            .post(self.token_url())
            .query(&[("key", self.config.api_key.as_str())])
            .form(&[("grant_type", "refresh_token"), ("refresh_token", refresh_token)])
            .send()
            .await
            .map_err(|e| AuthError::Network(e.to_string()))?;
        let refreshed: RefreshResponse = Self::parse(response, "token").await?;

        Ok(Tokens {
            id_token: refreshed.id_token,
            refresh_token: refreshed.refresh_token,
            expires_at: expiry_from(Some(&refreshed.expires_in), Utc::now()),
        })
    }
}

#[async_trait]
impl AuthProvider for FirebaseAuth {
    async fn sign_in(&self, email: &str, password: &str) -> Result<Identity, AuthError> {
        let request = PasswordRequest {
            email,
            password,
            return_secure_token: true,
        };
        let account = self.post_account("signInWithPassword", &request).await?;
        let identity = self.establish(account, email).await?;
        info!("Signed in {}", identity.email);
        Ok(identity)
    }

    async fn sign_up(&self, email: &str, password: &str) -> Result<Identity, AuthError> {
        let request = PasswordRequest {
            email,
            password,
            return_secure_token: true,
        };
        let account = self.post_account("signUp", &request).await?;
        let identity = self.establish(account, email).await?;
        info!("Created account {}", identity.email);
        Ok(identity)
    }

    async fn sign_out(&self) -> Result<(), AuthError> {
        self.tokens.lock().await.take();
        if let Some(identity) = self.session.send_replace(None) {
            info!("Signed out {}", identity.email);
        }
        Ok(())
    }

    async fn update_account(&self, email: &str, password: &str) -> Result<Identity, AuthError> {
        let id_token = self.id_token().await?.ok_or(AuthError::NotSignedIn)?;
        let request = UpdateRequest {
            id_token: &id_token,
            email,
            password,
            return_secure_token: true,
        };
        let account = self.post_account("update", &request).await?;
        let identity = self.establish(account, email).await?;
        info!("Updated account {}", identity.uid);
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
impl TokenSource for FirebaseAuth {
    async fn id_token(&self) -> Result<Option<String>, AuthError> {
        let mut tokens = self.tokens.lock().await;
        let Some(current) = tokens.as_ref() else {
            return Ok(None);
        };
        if current.is_fresh(Utc::now()) {
            return Ok(Some(current.id_token.clone()));
        }

        let refresh_token = current.refresh_token.clone();
        match self.refresh(&refresh_token).await {
            Ok(refreshed) => {
                let id_token = refreshed.id_token.clone();
                *tokens = Some(refreshed);
                Ok(Some(id_token))
            }
            Err(AuthError::SessionExpired) => {
                warn!("Refresh token rejected, ending session");
                tokens.take();
                drop(tokens);
                self.session.send_replace(None);
                Err(AuthError::SessionExpired)
            }
            Err(e) => Err(e),
        }
    }
}
