use async_trait::async_trait;
use domains::{AppError, Result, User, UserProfile, UserRepository};

use super::{db_error, PgStore, UserRow};

#[async_trait]
impl UserRepository for PgStore {
    async fn create(&self, nickname: &str, profile: &UserProfile) -> Result<User> {
        let row = sqlx::query_as::<_, UserRow>(
            "INSERT INTO users (nickname, fullname, about, email) VALUES ($1, $2, $3, $4) \
             RETURNING id, nickname, fullname, about, email",
        )
        .bind(nickname)
        .bind(&profile.fullname)
        .bind(&profile.about)
        .bind(&profile.email)
        .fetch_one(&self.pool)
        .await
        .map_err(db_error)?;
        Ok(row.into())
    }

    async fn find_by_nickname(&self, nickname: &str) -> Result<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>(
            "SELECT id, nickname, fullname, about, email FROM users WHERE lower(nickname) = lower($1)",
        )
        .bind(nickname)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error)?;
        Ok(row.map(User::from))
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>(
            "SELECT id, nickname, fullname, about, email FROM users WHERE lower(email) = lower($1)",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error)?;
        Ok(row.map(User::from))
    }

    async fn find_conflicting(&self, nickname: &str, email: &str) -> Result<Vec<User>> {
        let rows = sqlx::query_as::<_, UserRow>(
            "SELECT id, nickname, fullname, about, email FROM users \
             WHERE lower(nickname) = lower($1) OR lower(email) = lower($2) ORDER BY id",
        )
        .bind(nickname)
        .bind(email)
        .fetch_all(&self.pool)
        .await
        .map_err(db_error)?;
        Ok(rows.into_iter().map(User::from).collect())
    }

    async fn update(&self, user: &User) -> Result<User> {
        let row = sqlx::query_as::<_, UserRow>(
            "UPDATE users SET fullname = $1, about = $2, email = $3 WHERE id = $4 \
             RETURNING id, nickname, fullname, about, email",
        )
        .bind(&user.fullname)
        .bind(&user.about)
        .bind(&user.email)
        .bind(user.id)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error)?;
        row.map(User::from).ok_or_else(|| AppError::not_found("user", &user.nickname))
    }
}
