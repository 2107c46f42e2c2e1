//! SQLite layer for saved trade queries.
//!
//! A saved query is a named snapshot of a [`QuerySpec`] owned by the user
//! who saved it. Rows are only ever inserted and listed; nothing here
//! updates or deletes them.
//!
//! # Usage
//!
//! ```rust
//! use tde_comtrade::period::PeriodSelection;
//! use tde_comtrade::query::{FlowDirection, QuerySpec};
//! use tde_db::{session::Session, Database};
//!
//! let db = Database::open_in_memory().unwrap();
//! let spec = QuerySpec::new(
//!     "36",
//!     "156",
//!     "030631",
//!     FlowDirection::Export,
//!     &PeriodSelection::Annual { start: 2020, end: 2022 },
//! )
//! .unwrap();
//!
//! let session = Session::logged_in("user-1");
//! let saved = db.save_query(&session, &spec, None).unwrap();
//! assert_eq!(saved.period_start, "2020");
//! assert_eq!(db.list_queries(&session).unwrap().len(), 1);
//!
//! // Saving requires a logged-in user.
//! assert!(db.save_query(&Session::anonymous(), &spec, None).is_err());
//! ```
//!
//! [`QuerySpec`]: tde_comtrade::query::QuerySpec

pub mod error;
pub mod models;
mod queries;
pub mod schema;
pub mod session;

use error::Result;
use rusqlite::Connection;
use std::cell::RefCell;
use std::path::Path;
use std::rc::Rc;

/// SQLite database holding saved queries.
///
/// This struct is cheaply cloneable (via `Rc`); clones share the same
/// connection.
#[derive(Clone)]
pub struct Database {
    conn: Rc<RefCell<Connection>>,
}

impl Database {
    /// Open (or create) a database file and apply the schema.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let conn = Connection::open(path.as_ref())?;
        log::info!("Opened saved-query database {}", path.as_ref().display());
        Self::with_connection(conn)
    }

    /// Create a new in-memory database with the full schema applied.
    pub fn open_in_memory() -> Result<Self> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> Result<Self> {
        conn.execute_batch(schema::create_schema())?;
        Ok(Self {
            conn: Rc::new(RefCell::new(conn)),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::Session;
    use tde_comtrade::period::PeriodSelection;
    use tde_comtrade::query::{FlowDirection, QuerySpec};

    #[test]
    fn database_creates_successfully() {
        let db = Database::open_in_memory();
        assert!(db.is_ok(), "Database should create without errors");
    }

    #[test]
    fn database_is_cloneable() {
        let db = Database::open_in_memory().unwrap();
        let db2 = db.clone();
        let session = Session::logged_in("user-1");
        let spec = QuerySpec::new(
            "36",
            "156",
            "030631",
            FlowDirection::Export,
            &PeriodSelection::Annual {
                start: 2021,
                end: 2021,
            },
        )
        .unwrap();
        db.save_query(&session, &spec, Some("Lobster")).unwrap();
        let saved = db2.list_queries(&session).unwrap();
        assert_eq!(saved.len(), 1, "Clone should see same data via shared Rc");
    }

    #[test]
    fn database_starts_empty() {
        let db = Database::open_in_memory().unwrap();
        let saved = db.list_queries(&Session::logged_in("user-1")).unwrap();
        assert!(saved.is_empty(), "New database should have no saved queries");
    }
}
