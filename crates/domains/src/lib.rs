//! forum/crates/domains/src/lib.rs
//!
//! The central domain logic and interface definitions for the forum backend.

pub mod error;
pub mod listing;
pub mod models;
pub mod path;
pub mod ports;
pub mod vote;

// Re-exporting for easier access in other crates
pub use error::*;
pub use listing::{PostListing, SortMode, ThreadListing, UserListing};
pub use models::*;
pub use path::PostPath;
pub use ports::*;
pub use vote::{Voice, VoteTransition};
