use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// The authenticated user as reported by the auth provider
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    /// Provider-assigned user id, used as the owner id on every document
    pub uid: String,
    pub email: String,
}

/// A cow owned by one user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cow {
    /// Document id assigned by the store
    pub id: String,
    pub name: String,
    /// Free-form date of the last calving, exactly as the user typed it
    pub last_calving_date: String,
    /// Lot or group the cow is kept in
    pub lot: String,
    pub owner_id: String,
}

/// A weighing scale registered by one user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scale {
    pub id: String,
    pub name: String,
    /// Weight capacity as entered (kept as text, e.g. "500" or "500kg")
    pub capacity: String,
    /// Server time of the last save; never supplied by the user
    pub calibrated_at: DateTime<Utc>,
    /// Network address the scale is reachable at
    pub ip_address: String,
    pub owner_id: String,
}

/// One milk weighing of one cow
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MilkWeighing {
    pub id: String,
    /// Id of the weighed cow
    pub cow_id: String,
    pub weight_kg: f64,
    /// Server time of creation; immutable afterwards
    pub recorded_at: DateTime<Utc>,
    pub owner_id: String,
}

/// Editable fields of a cow as typed into the editor
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CowForm {
    pub name: String,
    pub last_calving_date: String,
    pub lot: String,
}

/// Editable fields of a scale as typed into the editor
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScaleForm {
    pub name: String,
    pub capacity: String,
    pub ip_address: String,
}

/// Weighing editor input. `cow_id` is preset when recording from a cow and
/// filled from the weighing when editing; it is required either way, but
/// an edit only ever writes the weight.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MilkWeighingForm {
    pub cow_id: Option<String>,
    /// Weight in kilograms as typed; parsed on submit
    pub weight: String,
}

/// Severity of a user-facing alert
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AlertKind {
    Success,
    Error,
}

/// Blocking dialog the UI shows to the user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Alert {
    pub kind: AlertKind,
    pub title: String,
    pub message: String,
}

impl Alert {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            kind: AlertKind::Success,
            title: "Success".to_string(),
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            kind: AlertKind::Error,
            title: "Error".to_string(),
            message: message.into(),
        }
    }

    pub fn is_error(&self) -> bool {
        self.kind == AlertKind::Error
    }
}

impl fmt::Display for Alert {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.title, self.message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_alert_constructors() {
        let ok = Alert::success("Cow registered successfully");
        assert_eq!(ok.kind, AlertKind::Success);
        assert!(!ok.is_error());

        let err = Alert::error("All fields must be filled in");
        assert!(err.is_error());
        assert_eq!(err.to_string(), "Error: All fields must be filled in");
    }

    #[test]
    fn test_forms_default_to_empty() {
        assert_eq!(CowForm::default().name, "");
        assert_eq!(ScaleForm::default().ip_address, "");
        assert_eq!(MilkWeighingForm::default().cow_id, None);
    }
}
