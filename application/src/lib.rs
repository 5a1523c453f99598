use domain::DomainError;
use thiserror::Error;

pub mod pagination;
pub mod repository;
pub mod search;
pub mod users;

pub use pagination::PaginationOutput;
pub use repository::{Repository, SearchableRepository};
pub use search::{SearchPolicy, apply_filter, apply_paginate, apply_sort, run_search};
pub use users::{
    SignInInput, SignUpInput, UpdatePasswordInput, UpdateUserInput, UserOutput, UserRepository,
    UserSearchPolicy, UserService,
};

// --- Application Errors ---
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ApplicationError {
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Conflict(String),
    /// A searchable repository was wired with an unusable policy. Not retryable.
    #[error("Search configuration error: {0}")]
    Configuration(String),
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("{0}")]
    InvalidPassword(String),
    #[error("{0}")]
    InvalidCredentials(String),
    #[error("Domain validation error: {0}")]
    DomainError(#[from] DomainError), // Propagate domain errors cleanly
}

impl ApplicationError {
    /// The single "no record with that id" failure shared by every repository.
    pub fn entity_not_found() -> Self {
        ApplicationError::NotFound("Entity not found".to_string())
    }
}
