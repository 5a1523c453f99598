use crate::search::SearchPolicy;
use crate::{ApplicationError, PaginationOutput, SearchableRepository};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use domain::{
    Entity, EntityId, SearchParams, SearchParamsInput, SortDirection, UserEntity, UserProps,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

// --- User repository contract ---

/// Searchable user storage with the lookups sign-up and sign-in need.
#[async_trait]
pub trait UserRepository: SearchableRepository<UserEntity> {
    /// Fails with NotFound when no user has this email.
    async fn find_by_email(&self, email: &str) -> Result<UserEntity, ApplicationError>;
    /// Fails with Conflict when the email is already taken.
    async fn email_exists(&self, email: &str) -> Result<(), ApplicationError>;
}

/// Users filter on `name`, sort by `name` or `createdAt`, newest first by default.
#[derive(Debug, Clone, Copy, Default)]
pub struct UserSearchPolicy;

impl SearchPolicy<UserEntity> for UserSearchPolicy {
    fn sortable_fields(&self) -> &[&str] {
        &["name", "createdAt"]
    }

    fn filterable_fields(&self) -> &[&str] {
        &["name"]
    }

    fn timestamp_fields(&self) -> &[&str] {
        &["createdAt"]
    }

    fn default_sort(&self) -> Option<(&str, SortDirection)> {
        Some(("createdAt", SortDirection::Desc))
    }
}

// --- Request/Response Models (DTOs) ---

#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UserOutput {
    pub id: String,
    pub name: String,
    pub email: String,
    pub password: String,
    pub created_at: DateTime<Utc>,
}

impl From<&UserEntity> for UserOutput {
    fn from(user: &UserEntity) -> Self {
        Self {
            id: user.id().to_string(),
            name: user.name().to_string(),
            email: user.email().to_string(),
            password: user.password().to_string(),
            created_at: user.created_at(),
        }
    }
}

#[derive(Deserialize, Debug, Clone)]
pub struct SignUpInput {
    pub name: String,
    pub email: String,
    pub password: String,
}

#[derive(Deserialize, Debug, Clone)]
pub struct SignInInput {
    pub email: String,
    pub password: String,
}

#[derive(Deserialize, Debug, Clone)]
pub struct UpdateUserInput {
    pub id: String,
    pub name: String,
}

#[derive(Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePasswordInput {
    pub id: String,
    pub password: String,
    pub old_password: String,
}

// --- Application Services (Use Cases) ---

/// User use cases over any [`UserRepository`] backing.
///
/// Passwords are compared and stored as given; hashing belongs to the caller.
pub struct UserService {
    user_repo: Arc<dyn UserRepository>,
    default_per_page: usize,
}

impl UserService {
    pub fn new(user_repo: Arc<dyn UserRepository>) -> Self {
        Self {
            user_repo,
            default_per_page: domain::DEFAULT_PER_PAGE,
        }
    }

    /// Overrides the page size used when a list request has no usable `perPage`.
    pub fn with_default_per_page(mut self, default_per_page: usize) -> Self {
        self.default_per_page = default_per_page;
        self
    }

    #[instrument(skip(self, input), fields(email = %input.email))]
    pub async fn sign_up(&self, input: SignUpInput) -> Result<UserOutput, ApplicationError> {
        info!("Attempting to sign up user");
        if input.name.is_empty() || input.email.is_empty() || input.password.is_empty() {
            return Err(ApplicationError::InvalidInput(
                "Input data not provided!".to_string(),
            ));
        }

        self.user_repo.email_exists(&input.email).await?;

        let user = UserEntity::create(UserProps::new(input.name, input.email, input.password))?;
        self.user_repo.insert(user.clone()).await?;
        info!(user_id = %user.id(), "User signed up");
        Ok(UserOutput::from(&user))
    }

    #[instrument(skip(self, input), fields(email = %input.email))]
    pub async fn sign_in(&self, input: SignInInput) -> Result<UserOutput, ApplicationError> {
        if input.email.is_empty() || input.password.is_empty() {
            return Err(ApplicationError::InvalidInput(
                "Input data not provided!".to_string(),
            ));
        }

        let user = self.user_repo.find_by_email(&input.email).await?;
        if user.password() != input.password {
            warn!(user_id = %user.id(), "Sign in rejected: wrong password");
            return Err(ApplicationError::InvalidCredentials(
                "Invalid credentials".to_string(),
            ));
        }
        Ok(UserOutput::from(&user))
    }

    #[instrument(skip(self))]
    pub async fn get_user(&self, id: &str) -> Result<UserOutput, ApplicationError> {
        let user = self.user_repo.find_by_id(&EntityId::new(id)).await?;
        Ok(UserOutput::from(&user))
    }

    #[instrument(skip(self, input), fields(user_id = %input.id))]
    pub async fn update_user(&self, input: UpdateUserInput) -> Result<UserOutput, ApplicationError> {
        if input.name.is_empty() {
            return Err(ApplicationError::InvalidInput("Name is required!".to_string()));
        }

        let mut user = self.user_repo.find_by_id(&EntityId::new(input.id)).await?;
        user.update(input.name)?;
        self.user_repo.update(user.clone()).await?;
        info!("User updated");
        Ok(UserOutput::from(&user))
    }

    #[instrument(skip(self, input), fields(user_id = %input.id))]
    pub async fn update_password(
        &self,
        input: UpdatePasswordInput,
    ) -> Result<UserOutput, ApplicationError> {
        let mut user = self.user_repo.find_by_id(&EntityId::new(input.id)).await?;

        if input.password.is_empty() || input.old_password.is_empty() {
            return Err(ApplicationError::InvalidPassword(
                "Both password fields are required!".to_string(),
            ));
        }
        if user.password() != input.old_password {
            warn!("Password update rejected: old password mismatch");
            return Err(ApplicationError::InvalidPassword(
                "Old password is invalid!".to_string(),
            ));
        }

        user.update_password(input.password)?;
        self.user_repo.update(user.clone()).await?;
        info!("Password updated");
        Ok(UserOutput::from(&user))
    }

    #[instrument(skip(self))]
    pub async fn delete_user(&self, id: &str) -> Result<(), ApplicationError> {
        self.user_repo.delete(&EntityId::new(id)).await?;
        info!(user_id = %id, "User deleted");
        Ok(())
    }

    /// Lists users from a raw page request; malformed parameters are normalized.
    #[instrument(skip(self, input))]
    pub async fn list_users(
        &self,
        input: SearchParamsInput,
    ) -> Result<PaginationOutput<UserOutput>, ApplicationError> {
        let params = SearchParams::with_default_per_page(input, self.default_per_page);
        debug!(?params, "Listing users");

        let result = self.user_repo.search(&params).await?;
        let items = result.items().iter().map(UserOutput::from).collect();
        Ok(PaginationOutput::from_result(items, &result))
    }
}
