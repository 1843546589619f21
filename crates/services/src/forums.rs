use std::sync::Arc;

use domains::{
    AppError, Creation, Forum, ForumRepository, NewForum, Result, Thread, ThreadListing, User,
    UserListing, UserRepository,
};
use tracing::info;

#[derive(Clone)]
pub struct ForumService {
    forums: Arc<dyn ForumRepository>,
    users: Arc<dyn UserRepository>,
}

impl ForumService {
    pub fn new(forums: Arc<dyn ForumRepository>, users: Arc<dyn UserRepository>) -> Self {
        Self { forums, users }
    }

    /// Creates a forum owned by an existing user. A taken slug yields the
    /// forum already holding it.
    pub async fn create(&self, mut request: NewForum) -> Result<Creation<Forum>> {
        if let Some(existing) = self.forums.find_by_slug(&request.slug).await? {
            return Ok(Creation::Existing(existing));
        }

        let owner = self
            .users
            .find_by_nickname(&request.user)
            .await?
            .ok_or_else(|| AppError::not_found("user", &request.user))?;
        request.user = owner.nickname;

        let forum = self.forums.create(&request).await?;
        info!(slug = %forum.slug, owner = %forum.user, "forum created");
        Ok(Creation::Created(forum))
    }

    pub async fn details(&self, slug: &str) -> Result<Forum> {
        self.forums
            .find_by_slug(slug)
            .await?
            .ok_or_else(|| AppError::not_found("forum", slug))
    }

    pub async fn threads(&self, slug: &str, listing: ThreadListing) -> Result<Vec<Thread>> {
        let forum = self.details(slug).await?;
        self.forums.list_threads(&forum, &listing).await
    }

    pub async fn users(&self, slug: &str, listing: UserListing) -> Result<Vec<User>> {
        let forum = self.details(slug).await?;
        self.forums.list_users(&forum, &listing).await
    }
}
