use thiserror::Error;

/// Form input rejected before anything is sent to the store
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FormError {
    #[error("All fields must be filled in (missing: {})", .0.join(", "))]
    MissingFields(Vec<&'static str>),
    #[error("Select a cow and enter the milk weight")]
    NoCowSelected,
    #[error("Milk weight must be a number, got '{0}'")]
    InvalidWeight(String),
}

impl FormError {
    /// Collect the names of the required fields that are blank
    pub fn check_required(fields: &[(&'static str, &str)]) -> Result<(), FormError> {
        let missing: Vec<&'static str> = fields
            .iter()
            .filter(|(_, value)| value.trim().is_empty())
            .map(|(name, _)| *name)
            .collect();

        if missing.is_empty() {
            Ok(())
        } else {
            Err(FormError::MissingFields(missing))
        }
    }
}

/// Errors returned by the list managers and screens
#[derive(Debug, Error)]
pub enum ManagerError {
    #[error(transparent)]
    Validation(#[from] FormError),
    #[error("No user is signed in")]
    NotSignedIn,
    #[error("{kind} {id} is not in the list")]
    NotFound { kind: &'static str, id: String },
    #[error("The editor is not open")]
    EditorClosed,
    #[error("No deletion is waiting for confirmation")]
    NoPendingDeletion,
    #[error("{0:#}")]
    Store(anyhow::Error),
}
