//! # In-memory store
//!
//! Every table lives behind one `std::sync::RwLock`. Each port method takes
//! the lock once, so a post batch or a vote is applied all-or-nothing and
//! never observed half done. The lock is never held across an `.await`.
//!
//! All writers are serialized through that single lock, across threads and
//! rows alike. This store backs tests and local runs; the PostgreSQL adapter
//! serializes per vote row and per transaction instead.
//!
//! Votes are keyed by `(user_id, thread_id)`; only a first vote takes an id
//! from the shared sequence.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use domains::listing::{self, PostListing, ThreadListing, UserListing};
use domains::{
    AppError, Forum, ForumRepository, NewForum, NewPost, NewThread, Post, PostPath,
    PostRepository, Result, Status, StatusRepository, Thread, ThreadRepository, User,
    UserProfile, UserRepository, Voice, Vote, VoteTransition,
};
use tracing::debug;

#[derive(Default)]
struct Tables {
    users: BTreeMap<i64, User>,
    forums: BTreeMap<i64, Forum>,
    threads: BTreeMap<i64, Thread>,
    posts: BTreeMap<i64, Post>,
    votes: HashMap<(i64, i64), Vote>,
    /// (forum id, user id) pairs of everyone who wrote in a forum
    participants: BTreeSet<(i64, i64)>,
    last_id: i64,
}

impl Tables {
    /// One sequence shared by every table; ids stay unique and increasing.
    fn next_id(&mut self) -> i64 {
        self.last_id += 1;
        self.last_id
    }

    fn user_by_nickname(&self, nickname: &str) -> Option<&User> {
        self.users.values().find(|user| user.nickname.eq_ignore_ascii_case(nickname))
    }

    fn forum_by_slug(&self, slug: &str) -> Option<&Forum> {
        self.forums.values().find(|forum| forum.slug.eq_ignore_ascii_case(slug))
    }

    fn forum_by_slug_mut(&mut self, slug: &str) -> Option<&mut Forum> {
        self.forums.values_mut().find(|forum| forum.slug.eq_ignore_ascii_case(slug))
    }

    fn thread_by_slug(&self, slug: &str) -> Option<&Thread> {
        self.threads
            .values()
            .find(|thread| thread.slug.as_deref().is_some_and(|own| own.eq_ignore_ascii_case(slug)))
    }

    fn record_participant(&mut self, forum_id: i64, nickname: &str) {
        if let Some(user_id) = self.user_by_nickname(nickname).map(|user| user.id) {
            self.participants.insert((forum_id, user_id));
        }
    }
}

/// Lock-guarded in-process implementation of every repository port.
/// One global lock, not per-thread locking: meant for tests and local runs.
#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, Tables>> {
        self.tables
            .read()
            .map_err(|_| AppError::Internal("memory store lock poisoned".into()))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, Tables>> {
        self.tables
            .write()
            .map_err(|_| AppError::Internal("memory store lock poisoned".into()))
    }
}

fn directed<T: Ord>(a: &T, b: &T, desc: bool) -> std::cmp::Ordering {
    if desc {
        b.cmp(a)
    } else {
        a.cmp(b)
    }
}

fn bounded<T>(items: Vec<T>, limit: u32) -> Vec<T> {
    if limit == 0 {
        items
    } else {
        items.into_iter().take(limit as usize).collect()
    }
}

#[async_trait]
impl UserRepository for MemoryStore {
    async fn create(&self, nickname: &str, profile: &UserProfile) -> Result<User> {
        let mut tables = self.write()?;
        let taken = tables.users.values().any(|user| {
            user.nickname.eq_ignore_ascii_case(nickname) || user.email.eq_ignore_ascii_case(&profile.email)
        });
        if taken {
            return Err(AppError::Conflict(format!("user {nickname} already exists")));
        }

        let user = User {
            id: tables.next_id(),
            nickname: nickname.to_string(),
            fullname: profile.fullname.clone(),
            about: profile.about.clone(),
            email: profile.email.clone(),
        };
        tables.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn find_by_nickname(&self, nickname: &str) -> Result<Option<User>> {
        Ok(self.read()?.user_by_nickname(nickname).cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>> {
        Ok(self.read()?.users.values().find(|user| user.email.eq_ignore_ascii_case(email)).cloned())
    }

    async fn find_conflicting(&self, nickname: &str, email: &str) -> Result<Vec<User>> {
        Ok(self
            .read()?
            .users
            .values()
            .filter(|user| user.nickname.eq_ignore_ascii_case(nickname) || user.email.eq_ignore_ascii_case(email))
            .cloned()
            .collect())
    }

    async fn update(&self, user: &User) -> Result<User> {
        let mut tables = self.write()?;
        let email_taken = tables
            .users
            .values()
            .any(|other| other.id != user.id && other.email.eq_ignore_ascii_case(&user.email));
        if email_taken {
            return Err(AppError::Conflict(format!("email {} already registered", user.email)));
        }

        let stored = tables
            .users
            .get_mut(&user.id)
            .ok_or_else(|| AppError::not_found("user", &user.nickname))?;
        stored.fullname = user.fullname.clone();
        stored.about = user.about.clone();
        stored.email = user.email.clone();
        Ok(stored.clone())
    }
}

#[async_trait]
impl ForumRepository for MemoryStore {
    async fn create(&self, forum: &NewForum) -> Result<Forum> {
        let mut tables = self.write()?;
        if tables.forum_by_slug(&forum.slug).is_some() {
            return Err(AppError::Conflict(format!("forum {} already exists", forum.slug)));
        }

        let created = Forum {
            id: tables.next_id(),
            title: forum.title.clone(),
            user: forum.user.clone(),
            slug: forum.slug.clone(),
            posts: 0,
            threads: 0,
        };
        tables.forums.insert(created.id, created.clone());
        Ok(created)
    }

    async fn find_by_slug(&self, slug: &str) -> Result<Option<Forum>> {
        Ok(self.read()?.forum_by_slug(slug).cloned())
    }

    async fn list_threads(&self, forum: &Forum, listing: &ThreadListing) -> Result<Vec<Thread>> {
        let tables = self.read()?;
        let mut threads: Vec<Thread> = tables
            .threads
            .values()
            .filter(|thread| thread.forum.eq_ignore_ascii_case(&forum.slug))
            .filter(|thread| match listing.since {
                Some(since) if listing.desc => thread.created <= since,
                Some(since) => thread.created >= since,
                None => true,
            })
            .cloned()
            .collect();
        threads.sort_by(|a, b| directed(&(a.created, a.id), &(b.created, b.id), listing.desc));
        Ok(bounded(threads, listing.limit))
    }

    async fn list_users(&self, forum: &Forum, listing: &UserListing) -> Result<Vec<User>> {
        let tables = self.read()?;
        let since = listing.since.as_deref().map(str::to_lowercase);
        let mut users: Vec<(String, User)> = tables
            .participants
            .range((forum.id, i64::MIN)..=(forum.id, i64::MAX))
            .filter_map(|(_, user_id)| tables.users.get(user_id))
            .map(|user| (user.nickname.to_lowercase(), user.clone()))
            .filter(|(key, _)| match &since {
                Some(since) if listing.desc => key < since,
                Some(since) => key > since,
                None => true,
            })
            .collect();
        users.sort_by(|(a, _), (b, _)| directed(a, b, listing.desc));
        Ok(bounded(users.into_iter().map(|(_, user)| user).collect(), listing.limit))
    }
}

#[async_trait]
impl ThreadRepository for MemoryStore {
    async fn create(&self, thread: &NewThread, created: DateTime<Utc>) -> Result<Thread> {
        let mut tables = self.write()?;
        if let Some(slug) = thread.normalized_slug() {
            if tables.thread_by_slug(slug).is_some() {
                return Err(AppError::Conflict(format!("thread {slug} already exists")));
            }
        }

        let id = tables.next_id();
        let forum = tables
            .forum_by_slug_mut(&thread.forum)
            .ok_or_else(|| AppError::not_found("forum", &thread.forum))?;
        forum.threads += 1;
        let (forum_id, forum_slug) = (forum.id, forum.slug.clone());

        let stored = Thread {
            id,
            title: thread.title.clone(),
            author: thread.author.clone(),
            forum: forum_slug,
            message: thread.message.clone(),
            votes: 0,
            slug: thread.normalized_slug().map(str::to_string),
            created,
        };
        tables.threads.insert(id, stored.clone());
        tables.record_participant(forum_id, &thread.author);
        Ok(stored)
    }

    async fn resolve(&self, token: &str) -> Result<Option<Thread>> {
        let tables = self.read()?;
        if let Some(thread) = tables.thread_by_slug(token) {
            return Ok(Some(thread.clone()));
        }
        Ok(token.parse::<i64>().ok().and_then(|id| tables.threads.get(&id)).cloned())
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<Thread>> {
        Ok(self.read()?.threads.get(&id).cloned())
    }

    async fn update(&self, thread: &Thread) -> Result<Thread> {
        let mut tables = self.write()?;
        let stored = tables
            .threads
            .get_mut(&thread.id)
            .ok_or_else(|| AppError::not_found("thread", thread.id))?;
        stored.title = thread.title.clone();
        stored.message = thread.message.clone();
        Ok(stored.clone())
    }

    async fn create_posts(
        &self,
        thread: &Thread,
        entries: &[NewPost],
        created: DateTime<Utc>,
    ) -> Result<Vec<Post>> {
        let mut tables = self.write()?;

        // 1. Validate every parent before touching anything
        let mut parent_paths: HashMap<i64, PostPath> = HashMap::new();
        for entry in entries.iter().filter(|entry| entry.parent != 0) {
            match tables.posts.get(&entry.parent) {
                Some(parent) if parent.thread == thread.id => {
                    parent_paths.insert(parent.id, parent.path.clone());
                }
                _ => {
                    return Err(AppError::Conflict(format!(
                        "Parent post {} was created in another thread",
                        entry.parent
                    )))
                }
            }
        }
        let forum_id = tables
            .forum_by_slug(&thread.forum)
            .map(|forum| forum.id)
            .ok_or_else(|| AppError::not_found("forum", &thread.forum))?;

        // 2. Insert with final paths
        let mut posts = Vec::with_capacity(entries.len());
        for entry in entries {
            let id = tables.next_id();
            let post = Post {
                id,
                parent: entry.parent,
                author: entry.author.clone(),
                message: entry.message.clone(),
                is_edited: false,
                forum: thread.forum.clone(),
                thread: thread.id,
                created,
                path: PostPath::for_new_post(parent_paths.get(&entry.parent), id),
            };
            tables.posts.insert(id, post.clone());
            tables.record_participant(forum_id, &entry.author);
            posts.push(post);
        }

        // 3. Forum counter
        if let Some(forum) = tables.forums.get_mut(&forum_id) {
            forum.posts += posts.len() as i64;
        }
        Ok(posts)
    }

    async fn vote(
        &self,
        thread: &Thread,
        user_id: i64,
        voice: Voice,
    ) -> Result<(Thread, VoteTransition)> {
        let mut tables = self.write()?;
        if !tables.threads.contains_key(&thread.id) {
            return Err(AppError::not_found("thread", thread.id));
        }

        let key = (user_id, thread.id);
        let transition = VoteTransition::decide(tables.votes.get(&key).map(|held| held.voice), voice);
        match transition {
            VoteTransition::Cast(_) => {
                let id = tables.next_id();
                tables.votes.insert(key, Vote { id, user_id, thread_id: thread.id, voice });
            }
            VoteTransition::Flipped(_) => {
                if let Some(held) = tables.votes.get_mut(&key) {
                    held.voice = voice;
                }
            }
            VoteTransition::Unchanged => {}
        }

        let stored = tables
            .threads
            .get_mut(&thread.id)
            .ok_or_else(|| AppError::not_found("thread", thread.id))?;
        stored.votes += transition.delta();
        debug!(thread = stored.id, user_id, transition = transition.label(), "vote applied in memory");
        Ok((stored.clone(), transition))
    }

    async fn list_posts(&self, thread: &Thread, listing: &PostListing) -> Result<Vec<Post>> {
        let posts: Vec<Post> = self
            .read()?
            .posts
            .values()
            .filter(|post| post.thread == thread.id)
            .cloned()
            .collect();
        Ok(listing::arrange(posts, listing))
    }
}

#[async_trait]
impl PostRepository for MemoryStore {
    async fn find(&self, id: i64) -> Result<Option<Post>> {
        Ok(self.read()?.posts.get(&id).cloned())
    }

    async fn update_message(&self, id: i64, message: &str) -> Result<Post> {
        let mut tables = self.write()?;
        let post = tables.posts.get_mut(&id).ok_or_else(|| AppError::not_found("post", id))?;
        post.message = message.to_string();
        post.is_edited = true;
        Ok(post.clone())
    }
}

#[async_trait]
impl StatusRepository for MemoryStore {
    async fn status(&self) -> Result<Status> {
        let tables = self.read()?;
        Ok(Status {
            user: tables.users.len() as i64,
            forum: tables.forums.len() as i64,
            thread: tables.threads.len() as i64,
            post: tables.posts.len() as i64,
        })
    }

    async fn clear(&self) -> Result<()> {
        *self.write()? = Tables::default();
        Ok(())
    }
}
