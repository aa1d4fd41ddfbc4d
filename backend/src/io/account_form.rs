use log::info;
use shared::{Alert, Identity};

use super::auth_form::AuthFormError;
use crate::domain::{FormError, SessionProvider};

/// Form for changing the signed-in user's email and password
#[derive(Debug, Clone)]
pub struct EditAccountForm {
    pub email: String,
    pub password: String,
    alert: Option<Alert>,
}

impl EditAccountForm {
    /// Pre-filled with the user's email; the password starts empty
    pub fn new(user: &Identity) -> Self {
        Self {
            email: user.email.clone(),
            password: String::new(),
            alert: None,
        }
    }

    pub fn take_alert(&mut self) -> Option<Alert> {
        self.alert.take()
    }

    pub async fn submit(&mut self, session: &SessionProvider) -> Result<Identity, AuthFormError> {
        if let Err(e) = FormError::check_required(&[
            ("email", self.email.as_str()),
            ("password", self.password.as_str()),
        ]) {
            self.alert = Some(Alert::error(e.to_string()));
            return Err(e.into());
        }

        match session.update_account(self.email.trim(), &self.password).await {
            Ok(identity) => {
                info!("Account {} updated", identity.uid);
                self.password.clear();
                self.alert = Some(Alert::success("Account updated successfully"));
                Ok(identity)
            }
            Err(e) => {
                self.alert = Some(Alert::error(e.to_string()));
                Err(e.into())
            }
        }
    }
}
