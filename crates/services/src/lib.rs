//! # services
//!
//! Use cases of the forum backend, written against the ports in `domains`.
//! Services validate actors and inputs, then delegate the storage work
//! (including every atomic step) to a repository.

pub mod forums;
pub mod posts;
pub mod status;
pub mod threads;
pub mod users;

pub use forums::ForumService;
pub use posts::PostService;
pub use status::StatusService;
pub use threads::ThreadService;
pub use users::UserService;
