//! # Core Traits (Ports)
//!
//! Any storage adapter must implement these traits to be used by the services.
//! Adapters are responsible for the atomicity of batch creation and voting;
//! services only validate and orchestrate.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::Result;
use crate::listing::{PostListing, ThreadListing, UserListing};
use crate::models::{
    Forum, NewForum, NewPost, NewThread, Post, Status, Thread, User, UserProfile,
};
use crate::vote::{Voice, VoteTransition};

/// User directory.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn create(&self, nickname: &str, profile: &UserProfile) -> Result<User>;
    async fn find_by_nickname(&self, nickname: &str) -> Result<Option<User>>;
    async fn find_by_email(&self, email: &str) -> Result<Option<User>>;
    /// Users whose nickname or email collides with the given pair.
    async fn find_conflicting(&self, nickname: &str, email: &str) -> Result<Vec<User>>;
    /// Persists every profile field of `user`, keyed by its id.
    async fn update(&self, user: &User) -> Result<User>;
}

/// Forum directory.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait ForumRepository: Send + Sync {
    async fn create(&self, forum: &NewForum) -> Result<Forum>;
    async fn find_by_slug(&self, slug: &str) -> Result<Option<Forum>>;
    async fn list_threads(&self, forum: &Forum, listing: &ThreadListing) -> Result<Vec<Thread>>;
    async fn list_users(&self, forum: &Forum, listing: &UserListing) -> Result<Vec<User>>;
}

/// Threads together with the posts and votes they own.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait ThreadRepository: Send + Sync {
    /// Inserts the thread, bumps the forum's thread counter and records the
    /// author as a forum participant. `thread.forum` must be canonical.
    async fn create(&self, thread: &NewThread, created: DateTime<Utc>) -> Result<Thread>;

    /// Looks a thread up by slug or, when the token is numeric, by id.
    /// A slug match wins over an id match.
    async fn resolve(&self, token: &str) -> Result<Option<Thread>>;

    async fn find_by_id(&self, id: i64) -> Result<Option<Thread>>;

    async fn update(&self, thread: &Thread) -> Result<Thread>;

    /// Inserts a batch of posts atomically. Every non-root parent must be a
    /// post of `thread`, otherwise the whole batch fails with `Conflict`.
    /// Returns the posts in submission order.
    async fn create_posts(
        &self,
        thread: &Thread,
        entries: &[NewPost],
        created: DateTime<Utc>,
    ) -> Result<Vec<Post>>;

    /// Records `voice` for `user_id` on `thread` and returns the thread with
    /// its updated aggregate, plus the transition that was applied.
    async fn vote(
        &self,
        thread: &Thread,
        user_id: i64,
        voice: Voice,
    ) -> Result<(Thread, VoteTransition)>;

    async fn list_posts(&self, thread: &Thread, listing: &PostListing) -> Result<Vec<Post>>;
}

#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait PostRepository: Send + Sync {
    async fn find(&self, id: i64) -> Result<Option<Post>>;
    /// Replaces the message and marks the post as edited.
    async fn update_message(&self, id: i64, message: &str) -> Result<Post>;
}

/// Service-wide maintenance operations.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait StatusRepository: Send + Sync {
    async fn status(&self) -> Result<Status>;
    async fn clear(&self) -> Result<()>;
}
