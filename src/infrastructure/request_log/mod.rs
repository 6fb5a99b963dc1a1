//! Request log infrastructure - SQLite and in-memory stores

mod in_memory;
mod migrations;
mod sqlite;

pub use in_memory::InMemoryRequestStore;
pub use migrations::{request_log_migrations, Migration, Migrator, SqliteMigrator};
pub use sqlite::SqliteRequestStore;
