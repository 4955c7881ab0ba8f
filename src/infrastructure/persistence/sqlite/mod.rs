//! SQLite Persistence

mod book_repo;
mod database;

pub use book_repo::SqliteBookRepository;
pub use database::{create_pool, run_migrations, DatabaseConfig, DbPool};
