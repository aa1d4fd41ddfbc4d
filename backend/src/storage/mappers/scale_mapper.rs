use anyhow::Result;
use shared::{Scale, ScaleForm};

use super::OWNER_FIELD;
use crate::storage::document::{Document, FieldWrite, FieldWrites};

pub const COLLECTION: &str = "Balancas";
pub const NAME: &str = "nome";
pub const CAPACITY: &str = "peso";
pub const CALIBRATED_AT: &str = "data_calibracao";
pub const IP_ADDRESS: &str = "endereco_ip";

/// Mapper to convert between `Scale` entities and `Balancas` documents.
pub struct ScaleMapper;

impl ScaleMapper {
    pub fn from_document(doc: &Document) -> Result<Scale> {
        Ok(Scale {
            id: doc.id.clone(),
            name: doc.text(NAME)?,
            capacity: doc.text(CAPACITY)?,
            calibrated_at: doc.timestamp(CALIBRATED_AT)?,
            ip_address: doc.text(IP_ADDRESS)?,
            owner_id: doc.text(OWNER_FIELD)?,
        })
    }

    /// Every save stamps the calibration time with server time
    pub fn update_fields(form: &ScaleForm) -> FieldWrites {
        let mut fields = FieldWrites::new();
        fields.insert(NAME.to_string(), form.name.as_str().into());
        fields.insert(CAPACITY.to_string(), form.capacity.as_str().into());
        fields.insert(IP_ADDRESS.to_string(), form.ip_address.as_str().into());
        fields.insert(CALIBRATED_AT.to_string(), FieldWrite::ServerTimestamp);
        fields
    }

    pub fn create_fields(form: &ScaleForm, owner_id: &str) -> FieldWrites {
        let mut fields = Self::update_fields(form);
        fields.insert(OWNER_FIELD.to_string(), owner_id.into());
        fields
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_calibration_is_server_time_on_every_save() {
        let form = ScaleForm {
            name: "Ordenha 1".to_string(),
            capacity: "50".to_string(),
            ip_address: "192.168.0.20".to_string(),
        };
        assert_eq!(
            ScaleMapper::create_fields(&form, "u1").get(CALIBRATED_AT),
            Some(&FieldWrite::ServerTimestamp)
        );
        assert_eq!(
            ScaleMapper::update_fields(&form).get(CALIBRATED_AT),
            Some(&FieldWrite::ServerTimestamp)
        );
        assert!(!ScaleMapper::update_fields(&form).contains_key(OWNER_FIELD));
    }
}
