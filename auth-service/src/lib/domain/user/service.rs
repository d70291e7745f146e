use std::sync::Arc;

use async_trait::async_trait;
use auth::Clock;

use crate::domain::user::models::Pagination;
use crate::domain::user::models::UpdateProfileCommand;
use crate::domain::user::models::User;
use crate::domain::user::models::UserId;
use crate::user::errors::UserError;
use crate::user::ports::UserRepository;
use crate::user::ports::UserServicePort;

/// Domain service implementation for user profile operations.
pub struct UserService<UR>
where
    UR: UserRepository,
{
    repository: Arc<UR>,
    clock: Arc<dyn Clock>,
}

impl<UR> UserService<UR>
where
    UR: UserRepository,
{
    /// Create a new user service with injected dependencies.
    ///
    /// # Arguments
    /// * `repository` - User persistence implementation
    /// * `clock` - Time source for update and deletion timestamps
    pub fn new(repository: Arc<UR>, clock: Arc<dyn Clock>) -> Self {
        Self { repository, clock }
    }
}

#[async_trait]
impl<UR> UserServicePort for UserService<UR>
where
    UR: UserRepository,
{
    async fn list_users(&self, page: Pagination) -> Result<Vec<User>, UserError> {
        self.repository.list(page.limit, page.offset()).await
    }

    async fn get_user(&self, id: &UserId) -> Result<User, UserError> {
        self.repository
            .find_by_id(id)
            .await?
            .ok_or(UserError::NotFound(id.to_string()))
    }

    async fn update_profile(
        &self,
        id: &UserId,
        command: UpdateProfileCommand,
    ) -> Result<User, UserError> {
        let mut user = self.get_user(id).await?;

        if let Some(first_name) = command.first_name {
            user.profile.first_name = Some(first_name);
        }

        if let Some(last_name) = command.last_name {
            user.profile.last_name = Some(last_name);
        }

        if let Some(avatar_url) = command.avatar_url {
            user.profile.avatar_url = Some(avatar_url);
        }

        user.updated_at = self.clock.now();

        let updated_user = self.repository.save(user).await?;
        tracing::info!(user_id = %updated_user.id, "User profile updated");

        Ok(updated_user)
    }

    async fn remove_user(&self, id: &UserId) -> Result<(), UserError> {
        self.repository.soft_delete(id, self.clock.now()).await?;
        tracing::info!(user_id = %id, "User removed");

        Ok(())
    }
}
