//! # keystock-database
//!
//! SQLite connection management, migrations, and the concrete repositories
//! behind the key store and the grant table.

pub mod connection;
pub mod migration;
pub mod repositories;

pub use connection::DatabasePool;
pub use repositories::{GrantRepository, KeyRepository};
