//! Saved-query commands.

use crate::{config::Config, write_output, QueryArgs};
use anyhow::Context;
use tde_db::{models::SavedQuery, session::Session, Database};

/// A `--user` flag wins over `TDE_USER_ID`.
fn session(config: &Config, user: Option<String>) -> Session {
    Session::from_user_id(user.or_else(|| config.user_id.clone()))
}

fn open(config: &Config) -> anyhow::Result<Database> {
    Database::open(&config.db_path)
        .with_context(|| format!("Failed to open saved-query database {}", config.db_path))
}

pub fn run_save(
    config: &Config,
    query: &QueryArgs,
    name: Option<&str>,
    user: Option<String>,
) -> anyhow::Result<()> {
    let session = session(config, user);
    // Checked before the database file is created.
    session.current_user()?;
    let spec = query.to_spec()?;
    let saved = open(config)?.save_query(&session, &spec, name)?;
    write_output(None, &format!("Saved query {} \"{}\"\n", saved.id, saved.name))
}

fn listing(queries: &[SavedQuery]) -> String {
    queries
        .iter()
        .map(|q| {
            format!(
                "{}\t{}\treporter={} partner={} hs={} flow={} freq={} {}..{}\t{}\n",
                q.id,
                q.name,
                q.reporter_code,
                q.partner_code,
                q.hs_code,
                q.flow_code,
                q.frequency,
                q.period_start,
                q.period_end,
                q.created_at
            )
        })
        .collect()
}

pub fn run_list(config: &Config, user: Option<String>) -> anyhow::Result<()> {
    let session = session(config, user);
    session.current_user()?;
    let queries = open(config)?.list_queries(&session)?;
    write_output(None, &listing(&queries))
}
