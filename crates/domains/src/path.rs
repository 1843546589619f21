//! # Materialized Path
//!
//! Every post carries the ids of its ancestors followed by its own id.
//! Sorting posts by this sequence yields depth-first order without walking
//! parent pointers at read time.
//!
//! Comparison is element-wise with a proper prefix sorting first, which is
//! exactly how PostgreSQL compares `BIGINT[]` values. Listing in memory and
//! listing in SQL therefore agree.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PostPath(Vec<i64>);

impl PostPath {
    /// Path of a top-level post.
    pub fn root(id: i64) -> Self {
        Self(vec![id])
    }

    /// Path of a reply: the parent's path with `id` appended.
    pub fn child(parent: &PostPath, id: i64) -> Self {
        let mut ids = Vec::with_capacity(parent.0.len() + 1);
        ids.extend_from_slice(&parent.0);
        ids.push(id);
        Self(ids)
    }

    /// Builds the path for a new post given its (optional) parent path.
    pub fn for_new_post(parent: Option<&PostPath>, id: i64) -> Self {
        match parent {
            Some(parent) => Self::child(parent, id),
            None => Self::root(id),
        }
    }

    /// Id of the top-level post this path descends from.
    pub fn root_id(&self) -> Option<i64> {
        self.0.first().copied()
    }

    /// Number of ancestors, 0 for a root post.
    pub fn depth(&self) -> usize {
        self.0.len().saturating_sub(1)
    }

    /// The root-only prefix of this path, used as the parent_tree cursor anchor.
    pub fn root_prefix(&self) -> PostPath {
        Self(self.0.iter().take(1).copied().collect())
    }

    pub fn as_slice(&self) -> &[i64] {
        &self.0
    }
}

impl From<Vec<i64>> for PostPath {
    fn from(ids: Vec<i64>) -> Self {
        Self(ids)
    }
}
