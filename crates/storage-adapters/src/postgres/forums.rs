use async_trait::async_trait;
use domains::{Forum, ForumRepository, NewForum, Result, Thread, ThreadListing, User, UserListing};

use super::listing::{forum_users_query, threads_query};
use super::{db_error, ForumRow, PgStore, ThreadRow, UserRow};

#[async_trait]
impl ForumRepository for PgStore {
    async fn create(&self, forum: &NewForum) -> Result<Forum> {
        let row = sqlx::query_as::<_, ForumRow>(
            "INSERT INTO forums (title, owner, slug) VALUES ($1, $2, $3) \
             RETURNING id, title, owner, slug, posts, threads",
        )
        .bind(&forum.title)
        .bind(&forum.user)
        .bind(&forum.slug)
        .fetch_one(&self.pool)
        .await
        .map_err(db_error)?;
        Ok(row.into())
    }

    async fn find_by_slug(&self, slug: &str) -> Result<Option<Forum>> {
        let row = sqlx::query_as::<_, ForumRow>(
            "SELECT id, title, owner, slug, posts, threads FROM forums WHERE lower(slug) = lower($1)",
        )
        .bind(slug)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error)?;
        Ok(row.map(Forum::from))
    }

    async fn list_threads(&self, forum: &Forum, listing: &ThreadListing) -> Result<Vec<Thread>> {
        let rows = threads_query(forum.id, listing)
            .build_query_as::<ThreadRow>()
            .fetch_all(&self.pool)
            .await
            .map_err(db_error)?;
        Ok(rows.into_iter().map(Thread::from).collect())
    }

    async fn list_users(&self, forum: &Forum, listing: &UserListing) -> Result<Vec<User>> {
        let rows = forum_users_query(forum.id, listing)
            .build_query_as::<UserRow>()
            .fetch_all(&self.pool)
            .await
            .map_err(db_error)?;
        Ok(rows.into_iter().map(User::from).collect())
    }
}
