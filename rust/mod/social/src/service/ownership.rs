//! Ownership-gated deletion.

use microblog_sql::{SQLError, SQLExecutor, Value};
use tracing::debug;

use crate::service::{storage, SocialError, SocialService};

/// A resource that belongs to exactly one user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Owned {
    Tweet(i64),
}

impl Owned {
    fn owner_query(self) -> (&'static str, i64) {
        match self {
            Owned::Tweet(id) => ("SELECT author_id AS owner_id FROM tweets WHERE id = ?1", id),
        }
    }

    fn delete_query(self) -> (&'static str, i64) {
        match self {
            Owned::Tweet(id) => ("DELETE FROM tweets WHERE id = ?1", id),
        }
    }
}

/// Outcome of an ownership-gated delete.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ownership {
    Missing,
    /// Someone else owns the resource; nothing was deleted.
    Forbidden { owner_id: i64 },
    /// Deleted along with everything that cascades from it.
    Deleted { owner_id: i64 },
}

impl SocialService {
    /// Delete `resource` if `acting_user_id` owns it.
    pub fn authorize_delete(
        &self,
        resource: Owned,
        acting_user_id: i64,
    ) -> Result<Ownership, SocialError> {
        let mut outcome = Ownership::Missing;
        self.sql
            .transaction(&mut |tx: &dyn SQLExecutor| {
                outcome = delete_in(tx, resource, acting_user_id)?;
                Ok(())
            })
            .map_err(storage)?;

        debug!(?resource, acting_user_id, ?outcome, "authorize delete");
        Ok(outcome)
    }
}

fn delete_in(
    tx: &dyn SQLExecutor,
    resource: Owned,
    acting_user_id: i64,
) -> Result<Ownership, SQLError> {
    let (sql, id) = resource.owner_query();
    let rows = tx.query(sql, &[Value::Integer(id)])?;
    let Some(owner_id) = rows.first().and_then(|r| r.get_i64("owner_id")) else {
        return Ok(Ownership::Missing);
    };

    if owner_id != acting_user_id {
        return Ok(Ownership::Forbidden { owner_id });
    }

    let (sql, id) = resource.delete_query();
    tx.exec(sql, &[Value::Integer(id)])?;
    Ok(Ownership::Deleted { owner_id })
}
