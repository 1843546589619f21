//! # Domain Models
//!
//! These structs represent the core entities of the forum.
//! Ids are store-assigned integers; internal ids of users and forums never
//! leave the process.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::path::PostPath;
use crate::vote::Voice;

/// A registered forum member.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    #[serde(skip)]
    pub id: i64,
    /// Unique, compared case-insensitively
    pub nickname: String,
    pub fullname: String,
    pub about: String,
    /// Unique, compared case-insensitively
    pub email: String,
}

/// Profile fields supplied when registering a user.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    #[serde(default)]
    pub fullname: String,
    #[serde(default)]
    pub about: String,
    #[serde(default)]
    pub email: String,
}

/// Partial profile update; absent fields keep their stored value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserUpdate {
    pub fullname: Option<String>,
    pub about: Option<String>,
    pub email: Option<String>,
}

impl UserUpdate {
    pub fn is_empty(&self) -> bool {
        self.fullname.is_none() && self.about.is_none() && self.email.is_none()
    }

    /// Applies the update on top of `user`, returning the merged record.
    pub fn apply(&self, user: &User) -> User {
        User {
            id: user.id,
            nickname: user.nickname.clone(),
            fullname: self.fullname.clone().unwrap_or_else(|| user.fullname.clone()),
            about: self.about.clone().unwrap_or_else(|| user.about.clone()),
            email: self.email.clone().unwrap_or_else(|| user.email.clone()),
        }
    }
}

/// A forum (e.g., "pirates") owning a set of threads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Forum {
    #[serde(skip)]
    pub id: i64,
    pub title: String,
    /// Nickname of the owner
    pub user: String,
    /// The URL slug, unique and case-insensitive
    pub slug: String,
    pub posts: i64,
    pub threads: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewForum {
    pub title: String,
    pub user: String,
    pub slug: String,
}

/// A discussion inside a forum.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Thread {
    pub id: i64,
    pub title: String,
    pub author: String,
    pub forum: String,
    pub message: String,
    /// Denormalized vote aggregate, maintained by deltas
    pub votes: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slug: Option<String>,
    pub created: DateTime<Utc>,
}

/// Thread creation request as received from a client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewThread {
    pub title: String,
    pub author: String,
    pub message: String,
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(default)]
    pub created: Option<DateTime<Utc>>,
    /// Filled from the route by the service, never trusted from the body
    #[serde(default)]
    pub forum: String,
}

impl NewThread {
    /// Empty slugs count as "no slug".
    pub fn normalized_slug(&self) -> Option<&str> {
        self.slug.as_deref().filter(|slug| !slug.is_empty())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThreadUpdate {
    pub title: Option<String>,
    pub message: Option<String>,
}

impl ThreadUpdate {
    /// Empty strings are treated like absent fields.
    pub fn is_empty(&self) -> bool {
        self.title.as_deref().unwrap_or_default().is_empty()
            && self.message.as_deref().unwrap_or_default().is_empty()
    }

    pub fn apply(&self, thread: &Thread) -> Thread {
        let pick = |new: &Option<String>, old: &str| match new.as_deref() {
            Some(value) if !value.is_empty() => value.to_string(),
            _ => old.to_string(),
        };
        Thread {
            title: pick(&self.title, &thread.title),
            message: pick(&self.message, &thread.message),
            ..thread.clone()
        }
    }
}

/// The fundamental unit of conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Post {
    pub id: i64,
    /// 0 for a top-level post
    pub parent: i64,
    pub author: String,
    pub message: String,
    #[serde(rename = "isEdited")]
    pub is_edited: bool,
    pub forum: String,
    pub thread: i64,
    pub created: DateTime<Utc>,
    /// Ancestor ids ending in `id`; internal only
    #[serde(skip)]
    pub path: PostPath,
}

impl Post {
    pub fn is_root(&self) -> bool {
        self.parent == 0
    }
}

/// One entry of a post creation batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewPost {
    #[serde(default)]
    pub parent: i64,
    pub author: String,
    pub message: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostUpdate {
    #[serde(default)]
    pub message: Option<String>,
}

/// Related entities a post detail request may ask for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PostRelation {
    User,
    Forum,
    Thread,
}

impl PostRelation {
    /// Parses a comma-separated `related` list, ignoring unknown entries.
    pub fn parse_list(raw: &str) -> Vec<PostRelation> {
        raw.split(',')
            .filter_map(|item| match item.trim() {
                "user" => Some(PostRelation::User),
                "forum" => Some(PostRelation::Forum),
                "thread" => Some(PostRelation::Thread),
                _ => None,
            })
            .collect()
    }
}

/// A post together with the related entities that were requested.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PostDetails {
    pub post: Post,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author: Option<User>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thread: Option<Thread>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub forum: Option<Forum>,
}

/// A single (voter, thread) vote row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Vote {
    pub id: i64,
    pub user_id: i64,
    pub thread_id: i64,
    pub voice: Voice,
}

/// Vote request as received from a client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoteRequest {
    pub nickname: String,
    pub voice: i32,
}

/// Row counts reported by the service status endpoint.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Status {
    pub user: i64,
    pub forum: i64,
    pub thread: i64,
    pub post: i64,
}

/// Outcome of a create call that may collide with existing records.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Creation<T, E = T> {
    Created(T),
    Existing(E),
}
