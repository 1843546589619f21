//! # Thread Service
//!
//! Resolves threads by slug or id and drives the three operations that
//! mutate or read a thread's contents: post batches, votes and post listing.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use domains::{
    AppError, Creation, ForumRepository, NewPost, NewThread, Post, PostListing, Result, Thread,
    ThreadRepository, ThreadUpdate, UserRepository, Voice, VoteRequest, VoteTransition,
};
use tracing::{debug, info};

#[derive(Clone)]
pub struct ThreadService {
    threads: Arc<dyn ThreadRepository>,
    forums: Arc<dyn ForumRepository>,
    users: Arc<dyn UserRepository>,
}

impl ThreadService {
    pub fn new(
        threads: Arc<dyn ThreadRepository>,
        forums: Arc<dyn ForumRepository>,
        users: Arc<dyn UserRepository>,
    ) -> Self {
        Self { threads, forums, users }
    }

    /// Thread resolver: slug first, numeric id second.
    pub async fn resolve(&self, token: &str) -> Result<Thread> {
        self.threads
            .resolve(token)
            .await?
            .ok_or_else(|| AppError::not_found("thread", token))
    }

    /// Opens a thread in `forum_slug`. A taken thread slug yields the thread
    /// already holding it.
    pub async fn create(&self, forum_slug: &str, mut request: NewThread) -> Result<Creation<Thread>> {
        let forum = self
            .forums
            .find_by_slug(forum_slug)
            .await?
            .ok_or_else(|| AppError::not_found("forum", forum_slug))?;

        request.slug = request.normalized_slug().map(str::to_string);
        if let Some(slug) = request.slug.as_deref() {
            // resolve() also matches numeric ids, only a slug hit is a collision
            let taken = self.threads.resolve(slug).await?.filter(|thread| {
                thread.slug.as_deref().is_some_and(|own| own.eq_ignore_ascii_case(slug))
            });
            if let Some(existing) = taken {
                return Ok(Creation::Existing(existing));
            }
        }

        let author = self
            .users
            .find_by_nickname(&request.author)
            .await?
            .ok_or_else(|| AppError::not_found("user", &request.author))?;
        request.author = author.nickname;
        request.forum = forum.slug;

        let created = request.created.unwrap_or_else(Utc::now);
        let thread = self.threads.create(&request, created).await?;
        info!(thread = thread.id, forum = %thread.forum, "thread created");
        Ok(Creation::Created(thread))
    }

    pub async fn update(&self, token: &str, update: ThreadUpdate) -> Result<Thread> {
        let thread = self.resolve(token).await?;
        if update.is_empty() {
            return Ok(thread);
        }
        self.threads.update(&update.apply(&thread)).await
    }

    /// Post creation batch on an already resolved thread. Authors are
    /// checked (and canonicalized) here; parent membership and atomicity are
    /// the repository's job.
    pub async fn create_posts(&self, thread: &Thread, mut entries: Vec<NewPost>) -> Result<Vec<Post>> {
        if entries.is_empty() {
            return Ok(Vec::new());
        }

        let mut authors: HashMap<String, String> = HashMap::new();
        for entry in &mut entries {
            if let Some(canonical) = authors.get(&entry.author) {
                entry.author = canonical.clone();
                continue;
            }
            let user = self
                .users
                .find_by_nickname(&entry.author)
                .await?
                .ok_or_else(|| AppError::not_found("user", &entry.author))?;
            authors.insert(entry.author.clone(), user.nickname.clone());
            entry.author = user.nickname;
        }

        let posts = self.threads.create_posts(thread, &entries, Utc::now()).await?;
        debug!(thread = thread.id, count = posts.len(), "posts created");
        Ok(posts)
    }

    /// Vote tally: records the voice and returns the thread with its new
    /// aggregate along with the transition applied.
    pub async fn vote(&self, thread: &Thread, request: VoteRequest) -> Result<(Thread, VoteTransition)> {
        let voice = Voice::try_from(request.voice)?;
        let voter = self
            .users
            .find_by_nickname(&request.nickname)
            .await?
            .ok_or_else(|| AppError::not_found("user", &request.nickname))?;

        let (thread, transition) = self.threads.vote(thread, voter.id, voice).await?;
        debug!(
            thread = thread.id,
            voter = %voter.nickname,
            transition = transition.label(),
            votes = thread.votes,
            "vote recorded"
        );
        Ok((thread, transition))
    }

    pub async fn posts(&self, thread: &Thread, listing: PostListing) -> Result<Vec<Post>> {
        debug!(thread = thread.id, sort = %listing.sort, desc = listing.desc, "listing posts");
        self.threads.list_posts(thread, &listing).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use domains::{Forum, MockForumRepository, MockThreadRepository, MockUserRepository, PostPath, User};
    use mockall::predicate::eq;

    fn thread(votes: i32) -> Thread {
        Thread {
            id: 42,
            title: "Borrowck".into(),
            author: "alice".into(),
            forum: "rust".into(),
            message: "help".into(),
            votes,
            slug: Some("borrowck".into()),
            created: Utc::now(),
        }
    }

    fn user(id: i64, nickname: &str) -> User {
        User { id, nickname: nickname.into(), fullname: String::new(), about: String::new(), email: format!("{nickname}@x.org") }
    }

    fn service(threads: MockThreadRepository, forums: MockForumRepository, users: MockUserRepository) -> ThreadService {
        ThreadService::new(Arc::new(threads), Arc::new(forums), Arc::new(users))
    }

    #[tokio::test]
    async fn unknown_token_is_not_found() {
        let mut threads = MockThreadRepository::new();
        threads.expect_resolve().with(eq("missing")).returning(|_| Ok(None));

        let service = service(threads, MockForumRepository::new(), MockUserRepository::new());
        let err = service.resolve("missing").await.unwrap_err();
        assert_eq!(err, AppError::not_found("thread", "missing"));
    }

    #[tokio::test]
    async fn empty_batch_succeeds_without_touching_the_store() {
        let mut threads = MockThreadRepository::new();
        threads.expect_create_posts().never();

        let service = service(threads, MockForumRepository::new(), MockUserRepository::new());
        let posts = service.create_posts(&thread(0), Vec::new()).await.unwrap();
        assert!(posts.is_empty());
    }

    #[tokio::test]
    async fn batch_with_unknown_author_is_rejected_before_insert() {
        let mut threads = MockThreadRepository::new();
        threads.expect_create_posts().never();
        let mut users = MockUserRepository::new();
        users.expect_find_by_nickname().with(eq("alice")).returning(|n| Ok(Some(user(1, n))));
        users.expect_find_by_nickname().with(eq("ghost")).returning(|_| Ok(None));

        let service = service(threads, MockForumRepository::new(), users);
        let entries = vec![
            NewPost { parent: 0, author: "alice".into(), message: "hi".into() },
            NewPost { parent: 0, author: "ghost".into(), message: "boo".into() },
        ];
        let err = service.create_posts(&thread(0), entries).await.unwrap_err();
        assert_eq!(err, AppError::not_found("user", "ghost"));
    }

    #[tokio::test]
    async fn batch_authors_are_canonicalized_once() {
        let mut threads = MockThreadRepository::new();
        threads
            .expect_create_posts()
            .withf(|_, entries: &[NewPost], _| entries.iter().all(|e| e.author == "Alice"))
            .returning(|thread, entries, created| {
                Ok(entries
                    .iter()
                    .enumerate()
                    .map(|(i, e)| Post {
                        id: i as i64 + 1,
                        parent: e.parent,
                        author: e.author.clone(),
                        message: e.message.clone(),
                        is_edited: false,
                        forum: thread.forum.clone(),
                        thread: thread.id,
                        created,
                        path: PostPath::root(i as i64 + 1),
                    })
                    .collect())
            });
        let mut users = MockUserRepository::new();
        users.expect_find_by_nickname().times(1).returning(|_| Ok(Some(user(1, "Alice"))));

        let service = service(threads, MockForumRepository::new(), users);
        let entries = vec![
            NewPost { parent: 0, author: "alice".into(), message: "one".into() },
            NewPost { parent: 0, author: "alice".into(), message: "two".into() },
        ];
        let posts = service.create_posts(&thread(0), entries).await.unwrap();
        assert_eq!(posts.len(), 2);
        assert_eq!(posts[0].created, posts[1].created);
    }

    #[tokio::test]
    async fn invalid_voice_is_rejected_before_voter_lookup() {
        let mut threads = MockThreadRepository::new();
        threads.expect_vote().never();
        let mut users = MockUserRepository::new();
        users.expect_find_by_nickname().never();

        let service = service(threads, MockForumRepository::new(), users);
        let request = VoteRequest { nickname: "alice".into(), voice: 3 };
        assert!(matches!(service.vote(&thread(5), request).await, Err(AppError::ValidationError(_))));
    }

    #[tokio::test]
    async fn vote_passes_voter_id_and_voice() {
        let mut threads = MockThreadRepository::new();
        threads
            .expect_vote()
            .withf(|thread, user_id, voice| thread.id == 42 && *user_id == 7 && *voice == Voice::Up)
            .returning(|thread, _, voice| {
                let transition = VoteTransition::decide(None, voice);
                Ok((Thread { votes: thread.votes + transition.delta(), ..thread.clone() }, transition))
            });
        let mut users = MockUserRepository::new();
        users.expect_find_by_nickname().returning(|n| Ok(Some(user(7, n))));

        let service = service(threads, MockForumRepository::new(), users);
        let request = VoteRequest { nickname: "bob".into(), voice: 1 };
        let (updated, transition) = service.vote(&thread(5), request).await.unwrap();
        assert_eq!(updated.votes, 6);
        assert_eq!(transition, VoteTransition::Cast(Voice::Up));
    }

    #[tokio::test]
    async fn taken_thread_slug_returns_existing_thread() {
        let mut forums = MockForumRepository::new();
        forums.expect_find_by_slug().returning(|slug| {
            Ok(Some(Forum { id: 1, title: "Rust".into(), user: "alice".into(), slug: slug.to_string(), posts: 0, threads: 1 }))
        });
        let mut threads = MockThreadRepository::new();
        threads.expect_resolve().returning(|_| Ok(Some(thread(0))));
        threads.expect_create().never();

        let service = service(threads, forums, MockUserRepository::new());
        let request = NewThread {
            title: "Again".into(),
            author: "alice".into(),
            message: "dup".into(),
            slug: Some("BORROWCK".into()),
            created: None,
            forum: String::new(),
        };
        let outcome = service.create("rust", request).await.unwrap();
        assert!(matches!(outcome, Creation::Existing(t) if t.id == 42));
    }

    #[tokio::test]
    async fn numeric_slug_does_not_collide_with_thread_id() {
        let mut forums = MockForumRepository::new();
        forums.expect_find_by_slug().returning(|slug| {
            Ok(Some(Forum { id: 1, title: "Rust".into(), user: "alice".into(), slug: slug.to_string(), posts: 0, threads: 1 }))
        });
        let mut threads = MockThreadRepository::new();
        // "42" resolves to thread id 42 whose slug is "borrowck"
        threads.expect_resolve().returning(|_| Ok(Some(thread(0))));
        threads
            .expect_create()
            .returning(|request, created| {
                Ok(Thread {
                    id: 43,
                    title: request.title.clone(),
                    author: request.author.clone(),
                    forum: request.forum.clone(),
                    message: request.message.clone(),
                    votes: 0,
                    slug: request.slug.clone(),
                    created,
                })
            });
        let mut users = MockUserRepository::new();
        users.expect_find_by_nickname().returning(|n| Ok(Some(user(1, n))));

        let service = service(threads, forums, users);
        let request = NewThread {
            title: "Numbers".into(),
            author: "alice".into(),
            message: "m".into(),
            slug: Some("42".into()),
            created: None,
            forum: String::new(),
        };
        let outcome = service.create("rust", request).await.unwrap();
        assert!(matches!(outcome, Creation::Created(t) if t.id == 43 && t.slug.as_deref() == Some("42")));
    }
}
