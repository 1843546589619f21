use std::sync::Arc;

use domains::{AppError, Creation, Result, User, UserProfile, UserRepository, UserUpdate};
use tracing::{debug, info};

#[derive(Clone)]
pub struct UserService {
    users: Arc<dyn UserRepository>,
}

impl UserService {
    pub fn new(users: Arc<dyn UserRepository>) -> Self {
        Self { users }
    }

    /// Registers `nickname`. If the nickname or the email is taken, every
    /// colliding user is returned instead.
    pub async fn create(&self, nickname: &str, profile: UserProfile) -> Result<Creation<User, Vec<User>>> {
        let conflicting = self.users.find_conflicting(nickname, &profile.email).await?;
        if !conflicting.is_empty() {
            debug!(nickname, count = conflicting.len(), "user registration collides");
            return Ok(Creation::Existing(conflicting));
        }

        let user = self.users.create(nickname, &profile).await?;
        info!(nickname = %user.nickname, "user registered");
        Ok(Creation::Created(user))
    }

    pub async fn profile(&self, nickname: &str) -> Result<User> {
        self.users
            .find_by_nickname(nickname)
            .await?
            .ok_or_else(|| AppError::not_found("user", nickname))
    }

    pub async fn update(&self, nickname: &str, update: UserUpdate) -> Result<User> {
        let user = self.profile(nickname).await?;
        if update.is_empty() {
            return Ok(user);
        }

        if let Some(email) = update.email.as_deref() {
            if let Some(owner) = self.users.find_by_email(email).await? {
                if owner.id != user.id {
                    return Err(AppError::Conflict(format!(
                        "This email is already registered by user {}",
                        owner.nickname
                    )));
                }
            }
        }

        self.users.update(&update.apply(&user)).await
    }
}
