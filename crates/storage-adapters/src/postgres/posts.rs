use async_trait::async_trait;
use domains::{AppError, Post, PostRepository, Result};

use super::{db_error, PgStore, PostRow};

#[async_trait]
impl PostRepository for PgStore {
    async fn find(&self, id: i64) -> Result<Option<Post>> {
        let row = sqlx::query_as::<_, PostRow>(
            "SELECT id, parent, author, message, is_edited, forum, thread, created, path \
             FROM posts WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error)?;
        Ok(row.map(Post::from))
    }

    async fn update_message(&self, id: i64, message: &str) -> Result<Post> {
        let row = sqlx::query_as::<_, PostRow>(
            "UPDATE posts SET message = $1, is_edited = TRUE WHERE id = $2 \
             RETURNING id, parent, author, message, is_edited, forum, thread, created, path",
        )
        .bind(message)
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error)?;
        row.map(Post::from).ok_or_else(|| AppError::not_found("post", id))
    }
}
