//! # Post Listing
//!
//! A thread's posts can be paged three ways, all scoped to one thread:
//!
//! - `flat`: chronological by `(created, id)`, cursor is an id bound.
//! - `tree`: depth-first by materialized path, cursor excludes everything up
//!   to and including the cursor post in path order.
//! - `parent_tree`: a window of root posts (bounded by `limit`) plus every
//!   reply below them. The page can hold more than `limit` rows.
//!
//! [`arrange`] is the in-memory rendition used by the memory store; the
//! PostgreSQL adapter builds equivalent SQL.

use std::cmp::Ordering;
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};

use crate::error::{AppError, Result};
use crate::models::Post;
use crate::path::PostPath;

/// Page size used when the client does not send `limit`.
pub const DEFAULT_LIMIT: u32 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortMode {
    #[default]
    Flat,
    Tree,
    ParentTree,
}

impl SortMode {
    fn as_str(self) -> &'static str {
        match self {
            SortMode::Flat => "flat",
            SortMode::Tree => "tree",
            SortMode::ParentTree => "parent_tree",
        }
    }
}

impl FromStr for SortMode {
    type Err = AppError;

    fn from_str(raw: &str) -> Result<Self> {
        match raw {
            "flat" => Ok(SortMode::Flat),
            "tree" => Ok(SortMode::Tree),
            "parent_tree" => Ok(SortMode::ParentTree),
            other => Err(AppError::ValidationError(format!("unknown sort mode: {other}"))),
        }
    }
}

impl fmt::Display for SortMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Parses a `limit` query value. 0 means "no bound".
pub fn parse_limit(raw: Option<&str>) -> Result<u32> {
    match raw {
        None | Some("") => Ok(DEFAULT_LIMIT),
        Some(raw) => raw
            .parse::<u32>()
            .map_err(|_| AppError::ValidationError(format!("wrong limit format: {raw}"))),
    }
}

/// Parses the `desc` flag the way clients send it: only `true` means true.
pub fn parse_desc(raw: Option<&str>) -> bool {
    raw == Some("true")
}

/// A page request over one thread's posts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PostListing {
    pub sort: SortMode,
    /// Id of the last post seen on the previous page
    pub since: Option<i64>,
    /// 0 = unbounded
    pub limit: u32,
    pub desc: bool,
}

impl Default for PostListing {
    fn default() -> Self {
        Self { sort: SortMode::Flat, since: None, limit: DEFAULT_LIMIT, desc: false }
    }
}

impl PostListing {
    /// Builds a listing from raw query values.
    pub fn from_query(
        sort: Option<&str>,
        since: Option<&str>,
        limit: Option<&str>,
        desc: Option<&str>,
    ) -> Result<Self> {
        let sort = match sort {
            None | Some("") => SortMode::default(),
            Some(raw) => raw.parse()?,
        };
        let since = match since {
            None | Some("") => None,
            Some(raw) => Some(
                raw.parse::<i64>()
                    .map_err(|_| AppError::ValidationError(format!("wrong since format: {raw}")))?,
            ),
        };
        Ok(Self { sort, since, limit: parse_limit(limit)?, desc: parse_desc(desc) })
    }

    pub fn bound(&self) -> Option<usize> {
        (self.limit > 0).then_some(self.limit as usize)
    }

    /// Orders two keys in the requested direction.
    fn directed<T: Ord>(&self, a: &T, b: &T) -> Ordering {
        if self.desc {
            b.cmp(a)
        } else {
            a.cmp(b)
        }
    }

    /// True when `key` lies strictly past `cursor` in the requested direction.
    fn past<T: Ord>(&self, key: &T, cursor: &T) -> bool {
        self.directed(key, cursor) == Ordering::Greater
    }
}

/// Orders and bounds `posts` (all from one thread) according to `listing`.
pub fn arrange(posts: Vec<Post>, listing: &PostListing) -> Vec<Post> {
    match listing.sort {
        SortMode::Flat => arrange_flat(posts, listing),
        SortMode::Tree => arrange_tree(posts, listing),
        SortMode::ParentTree => arrange_parent_tree(posts, listing),
    }
}

fn take_bounded(posts: impl Iterator<Item = Post>, listing: &PostListing) -> Vec<Post> {
    match listing.bound() {
        Some(limit) => posts.take(limit).collect(),
        None => posts.collect(),
    }
}

fn cursor_path(posts: &[Post], since: i64) -> Option<PostPath> {
    posts.iter().find(|post| post.id == since).map(|post| post.path.clone())
}

fn arrange_flat(mut posts: Vec<Post>, listing: &PostListing) -> Vec<Post> {
    if let Some(since) = listing.since {
        posts.retain(|post| listing.past(&post.id, &since));
    }
    posts.sort_by(|a, b| listing.directed(&(a.created, a.id), &(b.created, b.id)));
    take_bounded(posts.into_iter(), listing)
}

fn arrange_tree(mut posts: Vec<Post>, listing: &PostListing) -> Vec<Post> {
    if let Some(since) = listing.since {
        let Some(anchor) = cursor_path(&posts, since) else {
            return Vec::new();
        };
        posts.retain(|post| listing.past(&post.path, &anchor));
    }
    posts.sort_by(|a, b| listing.directed(&a.path, &b.path));
    take_bounded(posts.into_iter(), listing)
}

fn arrange_parent_tree(posts: Vec<Post>, listing: &PostListing) -> Vec<Post> {
    // 1. Pick the window of roots
    let anchor = match listing.since {
        Some(since) => match cursor_path(&posts, since) {
            Some(path) => Some(path.root_prefix()),
            None => return Vec::new(),
        },
        None => None,
    };

    let mut roots: Vec<&Post> = posts
        .iter()
        .filter(|post| post.is_root())
        .filter(|post| anchor.as_ref().map_or(true, |anchor| listing.past(&post.path, anchor)))
        .collect();
    roots.sort_by(|a, b| listing.directed(&a.id, &b.id));
    if let Some(limit) = listing.bound() {
        roots.truncate(limit);
    }

    let rank: HashMap<i64, usize> =
        roots.iter().enumerate().map(|(rank, root)| (root.id, rank)).collect();

    // 2. Everything below the chosen roots, root order first, then path ascending
    let mut page: Vec<(usize, Post)> = posts
        .into_iter()
        .filter_map(|post| {
            let rank = post.path.root_id().and_then(|root| rank.get(&root).copied())?;
            Some((rank, post))
        })
        .collect();
    page.sort_by(|(rank_a, a), (rank_b, b)| rank_a.cmp(rank_b).then_with(|| a.path.cmp(&b.path)));
    page.into_iter().map(|(_, post)| post).collect()
}

/// A page request over a forum's threads, keyed by creation time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ThreadListing {
    /// Inclusive lower (asc) or upper (desc) creation bound
    pub since: Option<DateTime<Utc>>,
    pub limit: u32,
    pub desc: bool,
}

impl ThreadListing {
    pub fn from_query(since: Option<&str>, limit: Option<&str>, desc: Option<&str>) -> Result<Self> {
        let since = match since {
            None | Some("") => None,
            Some(raw) => Some(
                DateTime::parse_from_rfc3339(raw)
                    .map_err(|_| AppError::ValidationError(format!("wrong since format: {raw}")))?
                    .with_timezone(&Utc),
            ),
        };
        Ok(Self { since, limit: parse_limit(limit)?, desc: parse_desc(desc) })
    }
}

/// A page request over a forum's participants, keyed by nickname.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserListing {
    /// Exclusive nickname bound, compared case-insensitively
    pub since: Option<String>,
    pub limit: u32,
    pub desc: bool,
}

impl UserListing {
    pub fn from_query(since: Option<&str>, limit: Option<&str>, desc: Option<&str>) -> Result<Self> {
        Ok(Self {
            since: since.filter(|raw| !raw.is_empty()).map(str::to_string),
            limit: parse_limit(limit)?,
            desc: parse_desc(desc),
        })
    }
}
