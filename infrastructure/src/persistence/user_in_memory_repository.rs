use super::in_memory_repository::InMemoryRepository;
use application::{ApplicationError, UserRepository, UserSearchPolicy};
use async_trait::async_trait;
use domain::UserEntity;
use tracing::{debug, instrument, warn};

/// In-memory user store: newest first by default, filterable by name.
pub type UserInMemoryRepository = InMemoryRepository<UserEntity, UserSearchPolicy>;

#[async_trait]
impl UserRepository for InMemoryRepository<UserEntity, UserSearchPolicy> {
    #[instrument(skip(self))]
    async fn find_by_email(&self, email: &str) -> Result<UserEntity, ApplicationError> {
        debug!("Looking up user by email");
        self.read_with(|users| users.iter().find(|user| user.email() == email).cloned())
            .await
            .ok_or_else(|| {
                ApplicationError::NotFound(format!("Entity not found using email {email}"))
            })
    }

    #[instrument(skip(self))]
    async fn email_exists(&self, email: &str) -> Result<(), ApplicationError> {
        let taken = self
            .read_with(|users| users.iter().any(|user| user.email() == email))
            .await;
        if taken {
            warn!("Email address already used");
            return Err(ApplicationError::Conflict(
                "Email address already used".to_string(),
            ));
        }
        Ok(())
    }
}
