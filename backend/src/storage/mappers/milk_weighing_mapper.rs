use anyhow::Result;
use shared::MilkWeighing;

use super::OWNER_FIELD;
use crate::storage::document::{Document, FieldWrite, FieldWrites};

pub const COLLECTION: &str = "Pesagens";
pub const COW_ID: &str = "vacaId";
pub const WEIGHT_KG: &str = "pesoLeite";
pub const RECORDED_AT: &str = "data";

/// Mapper to convert between `MilkWeighing` entities and `Pesagens` documents.
pub struct MilkWeighingMapper;

impl MilkWeighingMapper {
    pub fn from_document(doc: &Document) -> Result<MilkWeighing> {
        Ok(MilkWeighing {
            id: doc.id.clone(),
            cow_id: doc.text(COW_ID)?,
            weight_kg: doc.number(WEIGHT_KG)?,
            recorded_at: doc.timestamp(RECORDED_AT)?,
            owner_id: doc.text(OWNER_FIELD)?,
        })
    }

    /// The timestamp is set here once and never written again
    pub fn create_fields(cow_id: &str, weight_kg: f64, owner_id: &str) -> FieldWrites {
        let mut fields = FieldWrites::new();
        fields.insert(COW_ID.to_string(), cow_id.into());
        fields.insert(WEIGHT_KG.to_string(), weight_kg.into());
        fields.insert(RECORDED_AT.to_string(), FieldWrite::ServerTimestamp);
        fields.insert(OWNER_FIELD.to_string(), owner_id.into());
        fields
    }

    /// Edits touch the weight only
    pub fn update_fields(weight_kg: f64) -> FieldWrites {
        let mut fields = FieldWrites::new();
        fields.insert(WEIGHT_KG.to_string(), weight_kg.into());
        fields
    }
}
