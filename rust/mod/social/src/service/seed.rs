use microblog_core::now_rfc3339;
use microblog_sql::{SQLError, SQLExecutor, Value};
use tracing::info;

use crate::service::{storage, SocialError, SocialService};

/// Default accounts as (name, api key).
const DEFAULT_USERS: [(&str, &str); 2] = [("admin", "admin"), ("sf", "test")];

impl SocialService {
    /// Populate an empty database with the default accounts and a first
    /// tweet by `admin`, liked by `sf`. Returns whether anything was written.
    pub fn seed_defaults(&self) -> Result<bool, SocialError> {
        let mut seeded = false;
        self.sql
            .transaction(&mut |tx: &dyn SQLExecutor| {
                seeded = seed_in(tx)?;
                Ok(())
            })
            .map_err(storage)?;

        if seeded {
            info!("seeded default users");
        }
        Ok(seeded)
    }
}

fn insert_returning_id(tx: &dyn SQLExecutor, sql: &str, params: &[Value]) -> Result<i64, SQLError> {
    tx.query(sql, params)?
        .first()
        .and_then(|r| r.get_i64("id"))
        .ok_or_else(|| SQLError::Execution("insert returned no id".into()))
}

fn seed_in(tx: &dyn SQLExecutor) -> Result<bool, SQLError> {
    let rows = tx.query("SELECT COUNT(*) AS cnt FROM users", &[])?;
    if rows.first().and_then(|r| r.get_i64("cnt")).unwrap_or(0) > 0 {
        return Ok(false);
    }

    let now = now_rfc3339();
    let mut ids = Vec::with_capacity(DEFAULT_USERS.len());
    for (name, api_key) in DEFAULT_USERS {
        ids.push(insert_returning_id(
            tx,
            "INSERT INTO users (name, api_key, created_at) VALUES (?1, ?2, ?3) RETURNING id",
            &[name.into(), api_key.into(), Value::Text(now.clone())],
        )?);
    }
    let (admin, sf) = (ids[0], ids[1]);

    let tweet = insert_returning_id(
        tx,
        "INSERT INTO tweets (author_id, content, created_at) VALUES (?1, ?2, ?3) RETURNING id",
        &[admin.into(), "first tweet".into(), Value::Text(now.clone())],
    )?;
    tx.exec(
        "INSERT INTO likes (tweet_id, user_id, created_at) VALUES (?1, ?2, ?3)",
        &[tweet.into(), sf.into(), Value::Text(now)],
    )?;

    Ok(true)
}
