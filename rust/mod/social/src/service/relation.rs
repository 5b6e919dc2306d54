//! Edge mutation for the many-to-many relations (follows, likes).
//!
//! Every toggle runs lookup, membership check and mutation inside one
//! transaction. The pair primary key on each edge table is the last line:
//! an insert that hits it is reported as [`Toggle::Unchanged`].

use microblog_core::now_rfc3339;
use microblog_sql::{SQLError, SQLExecutor, Value};
use tracing::debug;

use crate::service::{storage, SocialError, SocialService};

/// A many-to-many relation between a user (subject) and an object.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Relation {
    /// subject follows object user.
    Follow,
    /// subject likes object tweet.
    Like,
}

impl Relation {
    fn edge_table(self) -> &'static str {
        match self {
            Relation::Follow => "follows",
            Relation::Like => "likes",
        }
    }

    fn subject_column(self) -> &'static str {
        match self {
            Relation::Follow => "follower_id",
            Relation::Like => "user_id",
        }
    }

    fn object_column(self) -> &'static str {
        match self {
            Relation::Follow => "following_id",
            Relation::Like => "tweet_id",
        }
    }

    /// Selects `owner_id` of the object: the user itself, or the tweet author.
    fn owner_query(self) -> &'static str {
        match self {
            Relation::Follow => "SELECT id AS owner_id FROM users WHERE id = ?1",
            Relation::Like => "SELECT author_id AS owner_id FROM tweets WHERE id = ?1",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Add,
    Remove,
}

/// Outcome of a toggle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Toggle {
    /// The object does not exist.
    Missing,
    /// Subject owns the object. Self-edges are never stored.
    SelfTarget,
    /// The edge was already in the requested state.
    Unchanged,
    /// The edge was inserted or removed.
    Applied { owner_id: i64 },
}

impl SocialService {
    /// Add or remove the `(subject_id, object_id)` edge of `relation`.
    pub fn toggle(
        &self,
        subject_id: i64,
        object_id: i64,
        relation: Relation,
        direction: Direction,
    ) -> Result<Toggle, SocialError> {
        let mut outcome = Toggle::Missing;
        self.sql
            .transaction(&mut |tx: &dyn SQLExecutor| {
                outcome = toggle_in(tx, subject_id, object_id, relation, direction)?;
                Ok(())
            })
            .map_err(storage)?;

        debug!(
            ?relation,
            ?direction,
            subject_id,
            object_id,
            ?outcome,
            "edge toggle"
        );
        Ok(outcome)
    }
}

fn toggle_in(
    tx: &dyn SQLExecutor,
    subject_id: i64,
    object_id: i64,
    relation: Relation,
    direction: Direction,
) -> Result<Toggle, SQLError> {
    let rows = tx.query(relation.owner_query(), &[Value::Integer(object_id)])?;
    let Some(owner_id) = rows.first().and_then(|r| r.get_i64("owner_id")) else {
        return Ok(Toggle::Missing);
    };

    let present = edge_exists(tx, subject_id, object_id, relation)?;

    match direction {
        Direction::Add => {
            if owner_id == subject_id {
                return Ok(Toggle::SelfTarget);
            }
            if present {
                return Ok(Toggle::Unchanged);
            }
            let sql = format!(
                "INSERT INTO {} ({}, {}, created_at) VALUES (?1, ?2, ?3)",
                relation.edge_table(),
                relation.subject_column(),
                relation.object_column(),
            );
            let params = [
                Value::Integer(subject_id),
                Value::Integer(object_id),
                Value::Text(now_rfc3339()),
            ];
            match tx.exec(&sql, &params) {
                Ok(_) => Ok(Toggle::Applied { owner_id }),
                // A concurrent writer inserted the same pair first.
                Err(SQLError::Duplicate(_)) => Ok(Toggle::Unchanged),
                Err(e) => Err(e),
            }
        }
        Direction::Remove => {
            if !present {
                return Ok(Toggle::Unchanged);
            }
            let sql = format!(
                "DELETE FROM {} WHERE {} = ?1 AND {} = ?2",
                relation.edge_table(),
                relation.subject_column(),
                relation.object_column(),
            );
            let affected = tx.exec(&sql, &[Value::Integer(subject_id), Value::Integer(object_id)])?;
            if affected == 0 {
                Ok(Toggle::Unchanged)
            } else {
                Ok(Toggle::Applied { owner_id })
            }
        }
    }
}

/// Whether the `(subject_id, object_id)` edge of `relation` exists.
pub(crate) fn edge_exists<E: SQLExecutor + ?Sized>(
    exec: &E,
    subject_id: i64,
    object_id: i64,
    relation: Relation,
) -> Result<bool, SQLError> {
    let sql = format!(
        "SELECT 1 AS present FROM {} WHERE {} = ?1 AND {} = ?2",
        relation.edge_table(),
        relation.subject_column(),
        relation.object_column(),
    );
    let rows = exec.query(&sql, &[Value::Integer(subject_id), Value::Integer(object_id)])?;
    Ok(!rows.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::CreateTweet;
    use crate::service::testing::{has_edge, test_service, user};
    use crate::service::SocialConfig;

    use std::sync::Arc;

    use microblog_blob::{BlobStore, FileStore};
    use microblog_sql::{Row, SQLStore, SqliteStore};

    #[test]
    fn test_follow_add_remove() {
        let (svc, _dir) = test_service();
        let a = user(&svc, "a");
        let b = user(&svc, "b");

        let added = svc.toggle(a.id, b.id, Relation::Follow, Direction::Add).unwrap();
        assert_eq!(added, Toggle::Applied { owner_id: b.id });
        assert!(has_edge(&svc, a.id, b.id, Relation::Follow));
        // The relation is asymmetric.
        assert!(!has_edge(&svc, b.id, a.id, Relation::Follow));

        let again = svc.toggle(a.id, b.id, Relation::Follow, Direction::Add).unwrap();
        assert_eq!(again, Toggle::Unchanged);

        let removed = svc.toggle(a.id, b.id, Relation::Follow, Direction::Remove).unwrap();
        assert_eq!(removed, Toggle::Applied { owner_id: b.id });
        assert!(!has_edge(&svc, a.id, b.id, Relation::Follow));

        let again = svc.toggle(a.id, b.id, Relation::Follow, Direction::Remove).unwrap();
        assert_eq!(again, Toggle::Unchanged);
    }

    #[test]
    fn test_missing_object() {
        let (svc, _dir) = test_service();
        let a = user(&svc, "a");

        for relation in [Relation::Follow, Relation::Like] {
            for direction in [Direction::Add, Direction::Remove] {
                assert_eq!(
                    svc.toggle(a.id, 404, relation, direction).unwrap(),
                    Toggle::Missing
                );
            }
        }
    }

    #[test]
    fn test_like_reports_author() {
        let (svc, _dir) = test_service();
        let author = user(&svc, "author");
        let fan = user(&svc, "fan");
        let tweet_id = svc
            .create_tweet(&author, CreateTweet {
                tweet_data: "hello".to_string(),
                tweet_media_ids: vec![],
            })
            .unwrap();

        let liked = svc.toggle(fan.id, tweet_id, Relation::Like, Direction::Add).unwrap();
        assert_eq!(liked, Toggle::Applied { owner_id: author.id });
    }

    #[test]
    fn test_self_edges_never_stored() {
        let (svc, _dir) = test_service();
        let a = user(&svc, "a");
        let tweet_id = svc
            .create_tweet(&a, CreateTweet {
                tweet_data: "mine".to_string(),
                tweet_media_ids: vec![],
            })
            .unwrap();

        assert_eq!(
            svc.toggle(a.id, tweet_id, Relation::Like, Direction::Add).unwrap(),
            Toggle::SelfTarget
        );
        assert_eq!(
            svc.toggle(a.id, a.id, Relation::Follow, Direction::Add).unwrap(),
            Toggle::SelfTarget
        );
        assert!(!has_edge(&svc, a.id, tweet_id, Relation::Like));
        assert!(!has_edge(&svc, a.id, a.id, Relation::Follow));

        // Nothing to remove either.
        assert_eq!(
            svc.toggle(a.id, tweet_id, Relation::Like, Direction::Remove).unwrap(),
            Toggle::Unchanged
        );
    }

    #[test]
    fn test_concurrent_adds_store_one_edge() {
        let (svc, _dir) = test_service();
        let a = user(&svc, "a");
        let b = user(&svc, "b");

        let outcomes: Vec<Toggle> = std::thread::scope(|s| {
            let mut handles = Vec::new();
            for _ in 0..8 {
                handles.push(s.spawn(|| {
                    svc.toggle(a.id, b.id, Relation::Follow, Direction::Add).unwrap()
                }));
            }
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });

        let applied = outcomes
            .iter()
            .filter(|o| matches!(o, Toggle::Applied { .. }))
            .count();
        assert_eq!(applied, 1);
        assert_eq!(
            outcomes.iter().filter(|o| **o == Toggle::Unchanged).count(),
            7
        );

        let rows = svc
            .sql
            .query("SELECT COUNT(*) AS cnt FROM follows", &[])
            .unwrap();
        assert_eq!(rows[0].get_i64("cnt"), Some(1));
    }

    /// Store whose membership check never sees an edge, as if another
    /// writer committed between the check and the insert.
    struct StaleMembership {
        inner: SqliteStore,
    }

    struct StaleTx<'a> {
        inner: &'a dyn SQLExecutor,
    }

    fn hides(sql: &str) -> bool {
        sql.starts_with("SELECT 1 AS present")
    }

    impl SQLExecutor for StaleMembership {
        fn query(&self, sql: &str, params: &[Value]) -> Result<Vec<Row>, SQLError> {
            if hides(sql) {
                return Ok(Vec::new());
            }
            self.inner.query(sql, params)
        }

        fn exec(&self, sql: &str, params: &[Value]) -> Result<u64, SQLError> {
            self.inner.exec(sql, params)
        }
    }

    impl SQLExecutor for StaleTx<'_> {
        fn query(&self, sql: &str, params: &[Value]) -> Result<Vec<Row>, SQLError> {
            if hides(sql) {
                return Ok(Vec::new());
            }
            self.inner.query(sql, params)
        }

        fn exec(&self, sql: &str, params: &[Value]) -> Result<u64, SQLError> {
            self.inner.exec(sql, params)
        }
    }

    impl SQLStore for StaleMembership {
        fn transaction(
            &self,
            body: &mut dyn FnMut(&dyn SQLExecutor) -> Result<(), SQLError>,
        ) -> Result<(), SQLError> {
            self.inner
                .transaction(&mut |tx: &dyn SQLExecutor| body(&StaleTx { inner: tx }))
        }
    }

    #[test]
    fn test_pair_key_absorbs_lost_race() {
        let dir = tempfile::tempdir().unwrap();
        let sql: Arc<dyn SQLStore> = Arc::new(StaleMembership {
            inner: SqliteStore::open_in_memory().unwrap(),
        });
        let blob: Arc<dyn BlobStore> = Arc::new(FileStore::open(dir.path()).unwrap());
        let svc = SocialService::new(sql, blob, SocialConfig::default()).unwrap();

        let a = user(&svc, "a");
        let b = user(&svc, "b");
        let tweet_id = svc
            .create_tweet(&b, CreateTweet {
                tweet_data: "race".to_string(),
                tweet_media_ids: vec![],
            })
            .unwrap();

        for (relation, object_id, table) in [
            (Relation::Follow, b.id, "follows"),
            (Relation::Like, tweet_id, "likes"),
        ] {
            let first = svc.toggle(a.id, object_id, relation, Direction::Add).unwrap();
            assert_eq!(first, Toggle::Applied { owner_id: b.id });

            // The check reports no edge, so the insert runs and hits the key.
            let second = svc.toggle(a.id, object_id, relation, Direction::Add).unwrap();
            assert_eq!(second, Toggle::Unchanged, "{relation:?}");

            let rows = svc
                .sql
                .query(&format!("SELECT COUNT(*) AS cnt FROM {table}"), &[])
                .unwrap();
            assert_eq!(rows[0].get_i64("cnt"), Some(1), "{relation:?}");
        }
    }

    #[test]
    fn test_missing_subject_is_an_error() {
        let (svc, _dir) = test_service();
        let b = user(&svc, "b");

        // The foreign key rejects the insert; that is not "already following".
        let err = svc
            .toggle(404, b.id, Relation::Follow, Direction::Add)
            .unwrap_err();
        assert!(matches!(err, SocialError::Storage(_)), "{err:?}");
        assert!(!has_edge(&svc, 404, b.id, Relation::Follow));
    }
}
