use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    /// No logged-in user; checked before any write
    #[error("Authentication required: please log in to save queries")]
    AuthenticationRequired,

    #[error("Database error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

pub type Result<T> = std::result::Result<T, StoreError>;
