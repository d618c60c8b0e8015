//! Relational storage for decks, cards and placements

mod sqlite;

use thiserror::Error;

pub use sqlite::SqliteStore;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid stored data: {0}")]
    InvalidData(String),

    #[error("Row not found: {0}")]
    RowNotFound(String),
}

pub type StoreResult<T> = std::result::Result<T, StoreError>;
