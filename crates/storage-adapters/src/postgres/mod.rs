//! # PostgreSQL Implementation
//!
//! This module implements the data mapping between the relational schema in
//! `migrations/` and the `domains` models.
//!
//! Multi-statement operations (post batches, votes, thread creation) run in a
//! single transaction each. The vote path locks the `(user_id, thread_id)`
//! row before deciding its transition; the UNIQUE constraint settles races
//! between first votes.

use std::time::Duration;

use chrono::{DateTime, Utc};
use domains::{AppError, Forum, Post, PostPath, Result, Thread, User};
use sqlx::postgres::{PgPool, PgPoolOptions};
use sqlx::FromRow;
use tracing::{error, info};

mod forums;
mod listing;
mod posts;
mod status;
mod threads;
mod users;


pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    /// Opens a bounded connection pool.
    pub async fn connect(url: &str, max_connections: u32, acquire_timeout: Duration) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .acquire_timeout(acquire_timeout)
            .connect(url)
            .await
            .map_err(db_error)?;
        info!(max_connections, "postgres pool ready");
        Ok(Self { pool })
    }

    /// Applies the embedded schema migrations.
    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| AppError::Internal(format!("migration failed: {e}")))?;
        info!("database migrations applied");
        Ok(())
    }
}

/// Maps a driver error onto the domain taxonomy.
/// Unique violations are conflicts; everything else is internal.
pub(crate) fn db_error(err: sqlx::Error) -> AppError {
    match &err {
        sqlx::Error::Database(db) if db.is_unique_violation() => {
            AppError::Conflict(db.message().to_string())
        }
        _ => {
            error!(error = %err, "database error");
            AppError::Internal(err.to_string())
        }
    }
}

// ── Row mapping ───────────────────────────────────────────────────────────────

#[derive(FromRow)]
pub(crate) struct UserRow {
    id: i64,
    nickname: String,
    fullname: String,
    about: String,
    email: String,
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        User {
            id: row.id,
            nickname: row.nickname,
            fullname: row.fullname,
            about: row.about,
            email: row.email,
        }
    }
}

#[derive(FromRow)]
pub(crate) struct ForumRow {
    id: i64,
    title: String,
    owner: String,
    slug: String,
    posts: i64,
    threads: i64,
}

impl From<ForumRow> for Forum {
    fn from(row: ForumRow) -> Self {
        Forum {
            id: row.id,
            title: row.title,
            user: row.owner,
            slug: row.slug,
            posts: row.posts,
            threads: row.threads,
        }
    }
}

#[derive(FromRow)]
pub(crate) struct ThreadRow {
    id: i64,
    title: String,
    author: String,
    forum: String,
    message: String,
    votes: i32,
    slug: Option<String>,
    created: DateTime<Utc>,
}

impl From<ThreadRow> for Thread {
    fn from(row: ThreadRow) -> Self {
        Thread {
            id: row.id,
            title: row.title,
            author: row.author,
            forum: row.forum,
            message: row.message,
            votes: row.votes,
            slug: row.slug,
            created: row.created,
        }
    }
}

#[derive(FromRow)]
pub(crate) struct PostRow {
    id: i64,
    parent: i64,
    author: String,
    message: String,
    is_edited: bool,
    forum: String,
    thread: i64,
    created: DateTime<Utc>,
    path: Vec<i64>,
}

impl From<PostRow> for Post {
    fn from(row: PostRow) -> Self {
        Post {
            id: row.id,
            parent: row.parent,
            author: row.author,
            message: row.message,
            is_edited: row.is_edited,
            forum: row.forum,
            thread: row.thread,
            created: row.created,
            path: PostPath::from(row.path),
        }
    }
}
