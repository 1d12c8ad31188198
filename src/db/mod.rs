//! Relational store for users and tasks.
//!
//! - [`traits`]: the `DatabaseClient` trait the domain layer talks to, and
//!   `DatabaseProvider` for picking a backend from configuration
//! - [`turso`]: the libsql implementation (in-memory, SQLite file, remote Turso)

pub mod traits;
pub mod turso;

// Re-exports
pub use traits::{DatabaseClient, DatabaseProvider, NewUser, UserRecord};
pub use turso::TursoClient;
