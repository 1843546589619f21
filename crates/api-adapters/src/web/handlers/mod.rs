//! Request handlers, one module per resource.

use domains::{PostListing, Result, ThreadListing, UserListing};
use serde::Deserialize;

pub mod forums;
pub mod posts;
pub mod service;
pub mod threads;
pub mod users;

/// Paging parameters shared by the listing endpoints. Values stay raw
/// strings so malformed input surfaces as a validation error.
#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
    pub limit: Option<String>,
    pub since: Option<String>,
    pub desc: Option<String>,
    pub sort: Option<String>,
}

impl PageQuery {
    fn limit_missing(&self) -> bool {
        self.limit.as_deref().map_or(true, str::is_empty)
    }

    pub fn posts(&self, default_limit: u32) -> Result<PostListing> {
        let mut listing = PostListing::from_query(
            self.sort.as_deref(),
            self.since.as_deref(),
            self.limit.as_deref(),
            self.desc.as_deref(),
        )?;
        if self.limit_missing() {
            listing.limit = default_limit;
        }
        Ok(listing)
    }

    pub fn threads(&self, default_limit: u32) -> Result<ThreadListing> {
        let mut listing = ThreadListing::from_query(
            self.since.as_deref(),
            self.limit.as_deref(),
            self.desc.as_deref(),
        )?;
        if self.limit_missing() {
            listing.limit = default_limit;
        }
        Ok(listing)
    }

    pub fn users(&self, default_limit: u32) -> Result<UserListing> {
        let mut listing = UserListing::from_query(
            self.since.as_deref(),
            self.limit.as_deref(),
            self.desc.as_deref(),
        )?;
        if self.limit_missing() {
            listing.limit = default_limit;
        }
        Ok(listing)
    }
}
