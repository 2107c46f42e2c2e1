//! Insert and list methods for saved queries.

use crate::error::Result;
use crate::models::{QuerySnapshot, SavedQuery};
use crate::session::Session;
use crate::Database;
use chrono::{Local, SecondsFormat, Utc};
use rusqlite::params;
use tde_comtrade::query::QuerySpec;

/// Name used when the user does not give one: `Query <YYYY-MM-DD>`.
pub fn default_query_name() -> String {
    format!("Query {}", Local::now().date_naive().format("%Y-%m-%d"))
}

impl Database {
    /// Save a query for the logged-in user.
    ///
    /// Fails with [`StoreError::AuthenticationRequired`] before touching the
    /// database when nobody is logged in.
    ///
    /// [`StoreError::AuthenticationRequired`]: crate::error::StoreError::AuthenticationRequired
    pub fn save_query(
        &self,
        session: &Session,
        spec: &QuerySpec,
        name: Option<&str>,
    ) -> Result<SavedQuery> {
        let user_id = session.current_user()?;
        let name = name
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .map_or_else(default_query_name, str::to_string);
        let snapshot = QuerySnapshot::from(spec);
        let created_at = Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true);

        let conn = self.conn.borrow();
        conn.execute(
            "INSERT INTO saved_queries (user_id, name, reporter_code, partner_code, hs_code,
                 flow_code, frequency, period_start, period_end, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
            params![
                user_id,
                name,
                snapshot.reporter_code,
                snapshot.partner_code,
                snapshot.hs_code,
                snapshot.flow_code,
                snapshot.frequency,
                snapshot.period_start,
                snapshot.period_end,
                created_at,
            ],
        )?;
        let id = conn.last_insert_rowid();
        log::info!("Saved query {} ({}) for user {}", id, name, user_id);
        Ok(SavedQuery {
            id,
            user_id: user_id.to_string(),
            name,
            reporter_code: snapshot.reporter_code,
            partner_code: snapshot.partner_code,
            hs_code: snapshot.hs_code,
            flow_code: snapshot.flow_code,
            frequency: snapshot.frequency,
            period_start: snapshot.period_start,
            period_end: snapshot.period_end,
            created_at,
        })
    }

    /// The logged-in user's saved queries, oldest first.
    pub fn list_queries(&self, session: &Session) -> Result<Vec<SavedQuery>> {
        let user_id = session.current_user()?;
        let conn = self.conn.borrow();
        let mut stmt = conn.prepare(
            "SELECT id, user_id, name, reporter_code, partner_code, hs_code, flow_code,
                    frequency, period_start, period_end, created_at
             FROM saved_queries
             WHERE user_id = ?1
             ORDER BY id",
        )?;
        let rows = stmt
            .query_map(params![user_id], |row| {
                Ok(SavedQuery {
                    id: row.get(0)?,
                    user_id: row.get(1)?,
                    name: row.get(2)?,
                    reporter_code: row.get(3)?,
                    partner_code: row.get(4)?,
                    hs_code: row.get(5)?,
                    flow_code: row.get(6)?,
                    frequency: row.get(7)?,
                    period_start: row.get(8)?,
                    period_end: row.get(9)?,
                    created_at: row.get(10)?,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        log::info!("list_queries returned {} saved queries", rows.len());
        Ok(rows)
    }
}
