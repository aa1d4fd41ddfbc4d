//! Per-kind behaviour plugged into the generic list manager.

use anyhow::Result;
use shared::{Cow, CowForm, MilkWeighing, MilkWeighingForm, Scale, ScaleForm};
use std::cmp::Ordering;

use super::errors::FormError;
use crate::storage::document::{Document, FieldWrites};
use crate::storage::mappers::{cow_mapper, milk_weighing_mapper, scale_mapper};
use crate::storage::mappers::{CowMapper, MilkWeighingMapper, ScaleMapper};

/// An entity kind shown in an [`EntityListManager`](super::EntityListManager)
pub trait EntityKind: Clone + Send + Sync + Sized + 'static {
    /// Editor input as typed by the user
    type Form: Clone + Default + Send + Sync;
    /// Validated, normalized form ready to be written
    type Draft: Send + Sync;

    const COLLECTION: &'static str;
    /// Human-readable name used in alerts and logs
    const LABEL: &'static str;
    /// Whether `search_text` is used to filter the displayed list
    const SEARCHABLE: bool = false;

    fn id(&self) -> &str;
    fn from_document(doc: &Document) -> Result<Self>;
    /// Editor contents when editing this entity
    fn to_form(&self) -> Self::Form;
    fn validate(form: &Self::Form) -> Result<Self::Draft, FormError>;
    fn create_fields(draft: &Self::Draft, owner_id: &str) -> FieldWrites;
    fn update_fields(draft: &Self::Draft) -> FieldWrites;

    /// Texts matched against the search query
    fn search_text(&self) -> Vec<&str> {
        Vec::new()
    }

    fn display_order(_a: &Self, _b: &Self) -> Ordering {
        Ordering::Equal
    }

    fn created_message() -> String {
        format!("{} registered successfully", Self::LABEL)
    }

    fn updated_message() -> String {
        format!("{} updated successfully", Self::LABEL)
    }

    fn deleted_message() -> String {
        format!("{} deleted successfully", Self::LABEL)
    }
}

impl EntityKind for Cow {
    type Form = CowForm;
    type Draft = CowForm;

    const COLLECTION: &'static str = cow_mapper::COLLECTION;
    const LABEL: &'static str = "Cow";
    const SEARCHABLE: bool = true;

    fn id(&self) -> &str {
        &self.id
    }

    fn from_document(doc: &Document) -> Result<Self> {
        CowMapper::from_document(doc)
    }

    fn to_form(&self) -> CowForm {
        CowForm {
            name: self.name.clone(),
            last_calving_date: self.last_calving_date.clone(),
            lot: self.lot.clone(),
        }
    }

    fn validate(form: &CowForm) -> Result<CowForm, FormError> {
        FormError::check_required(&[
            ("name", form.name.as_str()),
            ("last_calving_date", form.last_calving_date.as_str()),
            ("lot", form.lot.as_str()),
        ])?;
        Ok(CowForm {
            name: form.name.trim().to_string(),
            last_calving_date: form.last_calving_date.trim().to_string(),
            lot: form.lot.trim().to_string(),
        })
    }

    fn create_fields(draft: &CowForm, owner_id: &str) -> FieldWrites {
        CowMapper::create_fields(draft, owner_id)
    }

    fn update_fields(draft: &CowForm) -> FieldWrites {
        CowMapper::update_fields(draft)
    }

    fn search_text(&self) -> Vec<&str> {
        vec![self.name.as_str(), self.lot.as_str()]
    }
}

impl EntityKind for Scale {
    type Form = ScaleForm;
    type Draft = ScaleForm;

    const COLLECTION: &'static str = scale_mapper::COLLECTION;
    const LABEL: &'static str = "Scale";

    fn id(&self) -> &str {
        &self.id
    }

    fn from_document(doc: &Document) -> Result<Self> {
        ScaleMapper::from_document(doc)
    }

    fn to_form(&self) -> ScaleForm {
        ScaleForm {
            name: self.name.clone(),
            capacity: self.capacity.clone(),
            ip_address: self.ip_address.clone(),
        }
    }

    fn validate(form: &ScaleForm) -> Result<ScaleForm, FormError> {
        FormError::check_required(&[
            ("name", form.name.as_str()),
            ("capacity", form.capacity.as_str()),
            ("ip_address", form.ip_address.as_str()),
        ])?;
        Ok(ScaleForm {
            name: form.name.trim().to_string(),
            capacity: form.capacity.trim().to_string(),
            ip_address: form.ip_address.trim().to_string(),
        })
    }

    fn create_fields(draft: &ScaleForm, owner_id: &str) -> FieldWrites {
        ScaleMapper::create_fields(draft, owner_id)
    }

    fn update_fields(draft: &ScaleForm) -> FieldWrites {
        ScaleMapper::update_fields(draft)
    }
}

/// A weighing form that passed validation
#[derive(Debug, Clone, PartialEq)]
pub struct WeighingDraft {
    pub cow_id: String,
    pub weight_kg: f64,
}

/// Parse a typed milk weight. A decimal comma is accepted.
pub fn parse_weight(raw: &str) -> Result<f64, FormError> {
    let trimmed = raw.trim();
    let weight: f64 = trimmed
        .replace(',', ".")
        .parse()
        .map_err(|_| FormError::InvalidWeight(trimmed.to_string()))?;

    if !weight.is_finite() || weight < 0.0 {
        return Err(FormError::InvalidWeight(trimmed.to_string()));
    }
    Ok(weight)
}

impl EntityKind for MilkWeighing {
    type Form = MilkWeighingForm;
    type Draft = WeighingDraft;

    const COLLECTION: &'static str = milk_weighing_mapper::COLLECTION;
    const LABEL: &'static str = "Milk weighing";

    fn id(&self) -> &str {
        &self.id
    }

    fn from_document(doc: &Document) -> Result<Self> {
        MilkWeighingMapper::from_document(doc)
    }

    fn to_form(&self) -> MilkWeighingForm {
        MilkWeighingForm {
            cow_id: Some(self.cow_id.clone()),
            weight: self.weight_kg.to_string(),
        }
    }

    fn validate(form: &MilkWeighingForm) -> Result<WeighingDraft, FormError> {
        let cow_id = form
            .cow_id
            .as_deref()
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .ok_or(FormError::NoCowSelected)?;
        FormError::check_required(&[("weight", form.weight.as_str())])?;

        Ok(WeighingDraft {
            cow_id: cow_id.to_string(),
            weight_kg: parse_weight(&form.weight)?,
        })
    }

    fn create_fields(draft: &WeighingDraft, owner_id: &str) -> FieldWrites {
        MilkWeighingMapper::create_fields(&draft.cow_id, draft.weight_kg, owner_id)
    }

    fn update_fields(draft: &WeighingDraft) -> FieldWrites {
        MilkWeighingMapper::update_fields(draft.weight_kg)
    }

    /// Newest first
    fn display_order(a: &Self, b: &Self) -> Ordering {
        b.recorded_at.cmp(&a.recorded_at)
    }

    fn created_message() -> String {
        "Milk weighing recorded successfully".to_string()
    }
}
