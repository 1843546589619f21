use std::sync::Arc;

use domains::{Result, Status, StatusRepository};
use tracing::warn;

#[derive(Clone)]
pub struct StatusService {
    store: Arc<dyn StatusRepository>,
}

impl StatusService {
    pub fn new(store: Arc<dyn StatusRepository>) -> Self {
        Self { store }
    }

    pub async fn status(&self) -> Result<Status> {
        self.store.status().await
    }

    /// Removes every user, forum, thread, post and vote.
    pub async fn clear(&self) -> Result<()> {
        warn!("clearing all forum data");
        self.store.clear().await
    }
}
