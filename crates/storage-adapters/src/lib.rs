//! # storage-adapters
//!
//! Implementations of the `domains` repository ports.
//!
//! - [`memory::MemoryStore`]: always compiled; a single lock-guarded set of
//!   tables used by tests and local runs.
//! - `postgres::PgStore` (feature `db-postgres`): the production adapter over a
//!   bounded `sqlx` connection pool.

pub mod memory;

#[cfg(feature = "db-postgres")]
pub mod postgres;

pub use memory::MemoryStore;

#[cfg(feature = "db-postgres")]
pub use postgres::PgStore;
