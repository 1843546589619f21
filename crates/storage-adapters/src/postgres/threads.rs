use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use domains::{
    AppError, NewPost, NewThread, Post, PostListing, PostPath, Result, Thread, ThreadRepository,
    Voice, VoteTransition,
};
use sqlx::{PgConnection, Postgres, QueryBuilder};
use tracing::debug;

use super::listing::posts_query;
use super::{db_error, PgStore, PostRow, ThreadRow};

/// Rows per INSERT statement; keeps a batch under the bind parameter limit.
const INSERT_CHUNK: usize = 1000;

/// Reads the caller's vote row and locks it for the rest of the transaction.
async fn held_voice(conn: &mut PgConnection, user_id: i64, thread_id: i64) -> Result<Option<Voice>> {
    let held: Option<i32> = sqlx::query_scalar(
        "SELECT voice FROM votes WHERE user_id = $1 AND thread_id = $2 FOR UPDATE",
    )
    .bind(user_id)
    .bind(thread_id)
    .fetch_optional(&mut *conn)
    .await
    .map_err(db_error)?;
    held.map(Voice::try_from).transpose()
}

/// Moves an existing vote row to `voice`, returning what that did.
async fn revote(
    conn: &mut PgConnection,
    user_id: i64,
    thread_id: i64,
    prior: Voice,
    voice: Voice,
) -> Result<VoteTransition> {
    let transition = VoteTransition::decide(Some(prior), voice);
    if transition != VoteTransition::Unchanged {
        sqlx::query("UPDATE votes SET voice = $1 WHERE user_id = $2 AND thread_id = $3")
            .bind(voice.value())
            .bind(user_id)
            .bind(thread_id)
            .execute(&mut *conn)
            .await
            .map_err(db_error)?;
    }
    Ok(transition)
}

#[async_trait]
impl ThreadRepository for PgStore {
    async fn create(&self, thread: &NewThread, created: DateTime<Utc>) -> Result<Thread> {
        let mut tx = self.pool.begin().await.map_err(db_error)?;

        // 1. Bump the forum counter, which also proves the forum exists
        let forum_id: i64 = sqlx::query_scalar(
            "UPDATE forums SET threads = threads + 1 WHERE lower(slug) = lower($1) RETURNING id",
        )
        .bind(&thread.forum)
        .fetch_optional(&mut *tx)
        .await
        .map_err(db_error)?
        .ok_or_else(|| AppError::not_found("forum", &thread.forum))?;

        // 2. Insert the thread
        let row = sqlx::query_as::<_, ThreadRow>(
            "INSERT INTO threads (forum_id, forum, title, author, message, slug, created) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) \
             RETURNING id, title, author, forum, message, votes, slug, created",
        )
        .bind(forum_id)
        .bind(&thread.forum)
        .bind(&thread.title)
        .bind(&thread.author)
        .bind(&thread.message)
        .bind(thread.normalized_slug())
        .bind(created)
        .fetch_one(&mut *tx)
        .await
        .map_err(db_error)?;

        // 3. Record the author as a participant
        sqlx::query(
            "INSERT INTO forum_users (forum_id, user_id) \
             SELECT $1, id FROM users WHERE lower(nickname) = lower($2) ON CONFLICT DO NOTHING",
        )
        .bind(forum_id)
        .bind(&thread.author)
        .execute(&mut *tx)
        .await
        .map_err(db_error)?;

        tx.commit().await.map_err(db_error)?;
        Ok(row.into())
    }

    async fn resolve(&self, token: &str) -> Result<Option<Thread>> {
        let row = sqlx::query_as::<_, ThreadRow>(
            "SELECT id, title, author, forum, message, votes, slug, created FROM threads \
             WHERE lower(slug) = lower($1) OR id = $2 \
             ORDER BY (slug IS NOT NULL AND lower(slug) = lower($1)) DESC LIMIT 1",
        )
        .bind(token)
        .bind(token.parse::<i64>().ok())
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error)?;
        Ok(row.map(Thread::from))
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<Thread>> {
        let row = sqlx::query_as::<_, ThreadRow>(
            "SELECT id, title, author, forum, message, votes, slug, created FROM threads WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error)?;
        Ok(row.map(Thread::from))
    }

    async fn update(&self, thread: &Thread) -> Result<Thread> {
        let row = sqlx::query_as::<_, ThreadRow>(
            "UPDATE threads SET title = $1, message = $2 WHERE id = $3 \
             RETURNING id, title, author, forum, message, votes, slug, created",
        )
        .bind(&thread.title)
        .bind(&thread.message)
        .bind(thread.id)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error)?;
        row.map(Thread::from).ok_or_else(|| AppError::not_found("thread", thread.id))
    }

    async fn create_posts(
        &self,
        thread: &Thread,
        entries: &[NewPost],
        created: DateTime<Utc>,
    ) -> Result<Vec<Post>> {
        if entries.is_empty() {
            return Ok(Vec::new());
        }
        let mut tx = self.pool.begin().await.map_err(db_error)?;

        // 1. Every referenced parent must live in this thread
        let mut parent_ids: Vec<i64> =
            entries.iter().map(|entry| entry.parent).filter(|parent| *parent != 0).collect();
        parent_ids.sort_unstable();
        parent_ids.dedup();

        let mut parents: HashMap<i64, PostPath> = HashMap::new();
        if !parent_ids.is_empty() {
            let rows: Vec<(i64, Vec<i64>)> =
                sqlx::query_as("SELECT id, path FROM posts WHERE thread = $1 AND id = ANY($2)")
                    .bind(thread.id)
                    .bind(&parent_ids)
                    .fetch_all(&mut *tx)
                    .await
                    .map_err(db_error)?;
            parents.extend(rows.into_iter().map(|(id, path)| (id, PostPath::from(path))));
        }
        if let Some(missing) = parent_ids.iter().find(|id| !parents.contains_key(id)) {
            return Err(AppError::Conflict(format!(
                "Parent post {missing} was created in another thread"
            )));
        }

        // 2. Reserve ids up front so paths are known before insertion
        let mut ids: Vec<i64> =
            sqlx::query_scalar("SELECT nextval('posts_id_seq') FROM generate_series(1, $1)")
                .bind(entries.len() as i64)
                .fetch_all(&mut *tx)
                .await
                .map_err(db_error)?;
        ids.sort_unstable();

        // 3. Insert in chunks
        let rows: Vec<(i64, &NewPost, PostPath)> = ids
            .into_iter()
            .zip(entries)
            .map(|(id, entry)| (id, entry, PostPath::for_new_post(parents.get(&entry.parent), id)))
            .collect();
        let mut posts = Vec::with_capacity(rows.len());
        for chunk in rows.chunks(INSERT_CHUNK) {
            let mut builder: QueryBuilder<'_, Postgres> = QueryBuilder::new(
                "INSERT INTO posts (id, parent, author, message, forum, thread, created, path) ",
            );
            builder.push_values(chunk, |mut row, (id, entry, path)| {
                row.push_bind(*id)
                    .push_bind(entry.parent)
                    .push_bind(entry.author.as_str())
                    .push_bind(entry.message.as_str())
                    .push_bind(thread.forum.as_str())
                    .push_bind(thread.id)
                    .push_bind(created)
                    .push_bind(path.as_slice());
            });
            builder.push(
                " RETURNING id, parent, author, message, is_edited, forum, thread, created, path",
            );
            let inserted = builder
                .build_query_as::<PostRow>()
                .fetch_all(&mut *tx)
                .await
                .map_err(db_error)?;
            posts.extend(inserted.into_iter().map(Post::from));
        }
        // ids were handed out in submission order
        posts.sort_by_key(|post| post.id);

        // 4. Forum counter
        let forum_id: i64 = sqlx::query_scalar(
            "UPDATE forums SET posts = posts + $1 WHERE lower(slug) = lower($2) RETURNING id",
        )
        .bind(posts.len() as i64)
        .bind(&thread.forum)
        .fetch_optional(&mut *tx)
        .await
        .map_err(db_error)?
        .ok_or_else(|| AppError::not_found("forum", &thread.forum))?;

        // 5. Participants
        let mut authors: Vec<String> = entries.iter().map(|entry| entry.author.to_lowercase()).collect();
        authors.sort_unstable();
        authors.dedup();
        sqlx::query(
            "INSERT INTO forum_users (forum_id, user_id) \
             SELECT $1, id FROM users WHERE lower(nickname) = ANY($2) ON CONFLICT DO NOTHING",
        )
        .bind(forum_id)
        .bind(&authors)
        .execute(&mut *tx)
        .await
        .map_err(db_error)?;

        tx.commit().await.map_err(db_error)?;
        debug!(thread = thread.id, count = posts.len(), "post batch stored");
        Ok(posts)
    }

    async fn vote(
        &self,
        thread: &Thread,
        user_id: i64,
        voice: Voice,
    ) -> Result<(Thread, VoteTransition)> {
        let mut tx = self.pool.begin().await.map_err(db_error)?;

        // 1. Decide against the row we hold, inserting it if there is none
        let transition = match held_voice(&mut *tx, user_id, thread.id).await? {
            Some(prior) => revote(&mut *tx, user_id, thread.id, prior, voice).await?,
            None => {
                let inserted: Option<i64> = sqlx::query_scalar(
                    "INSERT INTO votes (user_id, thread_id, voice) VALUES ($1, $2, $3) \
                     ON CONFLICT (user_id, thread_id) DO NOTHING RETURNING id",
                )
                .bind(user_id)
                .bind(thread.id)
                .bind(voice.value())
                .fetch_optional(&mut *tx)
                .await
                .map_err(db_error)?;

                if inserted.is_some() {
                    VoteTransition::Cast(voice)
                } else {
                    // a concurrent first vote won the insert; decide against its row
                    let prior = held_voice(&mut *tx, user_id, thread.id)
                        .await?
                        .ok_or_else(|| AppError::Internal("vote row vanished".into()))?;
                    revote(&mut *tx, user_id, thread.id, prior, voice).await?
                }
            }
        };

        // 2. Move the aggregate by the transition's delta
        let delta = transition.delta();
        let row = if delta != 0 {
            sqlx::query_as::<_, ThreadRow>(
                "UPDATE threads SET votes = votes + $1 WHERE id = $2 \
                 RETURNING id, title, author, forum, message, votes, slug, created",
            )
            .bind(delta)
            .bind(thread.id)
            .fetch_optional(&mut *tx)
            .await
        } else {
            sqlx::query_as::<_, ThreadRow>(
                "SELECT id, title, author, forum, message, votes, slug, created FROM threads WHERE id = $1",
            )
            .bind(thread.id)
            .fetch_optional(&mut *tx)
            .await
        };
        let row = row
            .map_err(db_error)?
            .ok_or_else(|| AppError::not_found("thread", thread.id))?;

        tx.commit().await.map_err(db_error)?;
        debug!(thread = thread.id, user_id, transition = transition.label(), "vote stored");
        Ok((row.into(), transition))
    }

    async fn list_posts(&self, thread: &Thread, listing: &PostListing) -> Result<Vec<Post>> {
        let rows = posts_query(thread.id, listing)
            .build_query_as::<PostRow>()
            .fetch_all(&self.pool)
            .await
            .map_err(db_error)?;
        Ok(rows.into_iter().map(Post::from).collect())
    }
}
