//! Mappers between shared entities and stored documents.
//!
//! Collection and field names are those of the documents already in the
//! hosted database, so existing data stays readable.

pub mod cow_mapper;
pub mod milk_weighing_mapper;
pub mod scale_mapper;

/// Field holding the owning user's id on every document
pub const OWNER_FIELD: &str = "userId";

pub use cow_mapper::CowMapper;
pub use milk_weighing_mapper::MilkWeighingMapper;
pub use scale_mapper::ScaleMapper;
