use std::collections::BTreeMap;
use thiserror::Error; // For domain-specific errors

pub mod entity;
pub mod search;
pub mod user;

pub use entity::{Entity, EntityId, Record};
pub use search::{
    DEFAULT_PER_PAGE, SearchParams, SearchParamsInput, SearchResult, SearchResultProps,
    SortDirection,
};
pub use user::{UserEntity, UserProps, validate_user_props};


// --- Domain Errors ---

/// Failure messages per field name, in a stable field order.
pub type FieldErrors = BTreeMap<String, Vec<String>>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum DomainError {
    #[error("Entity validation failed: {}", describe_fields(.0))]
    InvalidFields(FieldErrors),
}

impl DomainError {
    /// Messages recorded for `field`, if it failed.
    pub fn messages(&self, field: &str) -> Option<&[String]> {
        match self {
            DomainError::InvalidFields(fields) => fields.get(field).map(Vec::as_slice),
        }
    }
}

fn describe_fields(fields: &FieldErrors) -> String {
    fields
        .iter()
        .map(|(field, messages)| format!("{field}: {}", messages.join(", ")))
        .collect::<Vec<_>>()
        .join("; ")
}
