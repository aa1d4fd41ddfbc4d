use anyhow::Result;
use shared::{Cow, CowForm};

use super::OWNER_FIELD;
use crate::storage::document::{Document, FieldWrites};

pub const COLLECTION: &str = "Vacas";
pub const NAME: &str = "nome";
pub const LAST_CALVING_DATE: &str = "data_ultima_cria";
pub const LOT: &str = "lote";

/// Mapper to convert between `Cow` entities and `Vacas` documents.
pub struct CowMapper;

impl CowMapper {
    pub fn from_document(doc: &Document) -> Result<Cow> {
        Ok(Cow {
            id: doc.id.clone(),
            name: doc.text(NAME)?,
            last_calving_date: doc.text(LAST_CALVING_DATE)?,
            lot: doc.text(LOT)?,
            owner_id: doc.text(OWNER_FIELD)?,
        })
    }

    /// Editable fields only; the owner is never rewritten
    pub fn update_fields(form: &CowForm) -> FieldWrites {
        let mut fields = FieldWrites::new();
        fields.insert(NAME.to_string(), form.name.as_str().into());
        fields.insert(LAST_CALVING_DATE.to_string(), form.last_calving_date.as_str().into());
        fields.insert(LOT.to_string(), form.lot.as_str().into());
        fields
    }

    pub fn create_fields(form: &CowForm, owner_id: &str) -> FieldWrites {
        let mut fields = Self::update_fields(form);
        fields.insert(OWNER_FIELD.to_string(), owner_id.into());
        fields
    }
}
