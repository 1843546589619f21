use std::sync::Arc;

use domains::{ForumRepository, PostRepository, StatusRepository, ThreadRepository, UserRepository};
use services::{ForumService, PostService, StatusService, ThreadService, UserService};

use crate::metrics::Metrics;

/// State shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    pub users: UserService,
    pub forums: ForumService,
    pub threads: ThreadService,
    pub posts: PostService,
    pub status: StatusService,
    pub metrics: Arc<Metrics>,
    /// Page size applied when a listing request has no `limit`
    pub default_limit: u32,
}

impl AppState {
    /// Wires every service to one store implementing all repository ports.
    pub fn from_store<S>(store: Arc<S>, metrics: Arc<Metrics>, default_limit: u32) -> Self
    where
        S: UserRepository
            + ForumRepository
            + ThreadRepository
            + PostRepository
            + StatusRepository
            + 'static,
    {
        let users: Arc<dyn UserRepository> = store.clone();
        let forums: Arc<dyn ForumRepository> = store.clone();
        let threads: Arc<dyn ThreadRepository> = store.clone();
        let posts: Arc<dyn PostRepository> = store.clone();
        let status: Arc<dyn StatusRepository> = store;

        Self {
            users: UserService::new(users.clone()),
            forums: ForumService::new(forums.clone(), users.clone()),
            threads: ThreadService::new(threads.clone(), forums.clone(), users.clone()),
            posts: PostService::new(posts, threads, forums, users),
            status: StatusService::new(status),
            metrics,
            default_limit,
        }
    }
}
