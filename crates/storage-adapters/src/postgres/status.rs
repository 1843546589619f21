use async_trait::async_trait;
use domains::{Result, Status, StatusRepository};
use tracing::debug;

use super::{db_error, PgStore};

#[async_trait]
impl StatusRepository for PgStore {
    async fn status(&self) -> Result<Status> {
        let (user, forum, thread, post): (i64, i64, i64, i64) = sqlx::query_as(
            "SELECT (SELECT count(*) FROM users), (SELECT count(*) FROM forums), \
             (SELECT count(*) FROM threads), (SELECT count(*) FROM posts)",
        )
        .fetch_one(&self.pool)
        .await
        .map_err(db_error)?;
        Ok(Status { user, forum, thread, post })
    }

    async fn clear(&self) -> Result<()> {
        sqlx::query("TRUNCATE votes, forum_users, posts, threads, forums, users RESTART IDENTITY CASCADE")
            .execute(&self.pool)
            .await
            .map_err(db_error)?;
        debug!("all tables truncated");
        Ok(())
    }
}
