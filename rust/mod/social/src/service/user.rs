use microblog_core::now_rfc3339;
use microblog_sql::{Row, SQLError, SQLExecutor, Value};

use crate::model::{CreateUser, User, UserProfile};
use crate::service::{storage, SocialError, SocialService};

impl SocialService {
    /// Create a new user. The api key must be unused.
    pub fn create_user(&self, input: CreateUser) -> Result<User, SocialError> {
        if input.name.trim().is_empty() || input.api_key.is_empty() {
            return Err(SocialError::Validation(
                "Имя и api-key пользователя обязательны".to_string(),
            ));
        }

        let rows = self
            .sql
            .query(
                "INSERT INTO users (name, api_key, created_at) VALUES (?1, ?2, ?3) RETURNING id",
                &[
                    Value::Text(input.name.clone()),
                    Value::Text(input.api_key),
                    Value::Text(now_rfc3339()),
                ],
            )
            .map_err(|e| match e {
                SQLError::Duplicate(_) => SocialError::InvalidOperation(
                    "Пользователь с таким api-key уже существует".to_string(),
                ),
                other => storage(other),
            })?;

        let id = rows
            .first()
            .and_then(|r| r.get_i64("id"))
            .ok_or_else(|| SocialError::Internal("insert returned no id".into()))?;

        Ok(User {
            id,
            name: input.name,
        })
    }

    /// Get a user by id. Absent users are `None`, not an error.
    pub fn get_user(&self, id: i64) -> Result<Option<User>, SocialError> {
        let rows = self
            .sql
            .query("SELECT id, name FROM users WHERE id = ?1", &[Value::Integer(id)])
            .map_err(storage)?;
        Ok(rows.first().and_then(user_from_row))
    }

    /// Resolve an api key to its user.
    pub fn find_user_by_api_key(&self, api_key: &str) -> Result<Option<User>, SocialError> {
        let rows = self
            .sql
            .query(
                "SELECT id, name FROM users WHERE api_key = ?1",
                &[Value::Text(api_key.to_string())],
            )
            .map_err(storage)?;
        Ok(rows.first().and_then(user_from_row))
    }

    /// Get a user with followers and following, read in one transaction.
    pub fn get_user_profile(&self, id: i64) -> Result<Option<UserProfile>, SocialError> {
        let mut profile = None;
        self.sql
            .transaction(&mut |tx: &dyn SQLExecutor| {
                profile = load_profile(tx, id)?;
                Ok(())
            })
            .map_err(storage)?;
        Ok(profile)
    }
}

fn load_profile(tx: &dyn SQLExecutor, id: i64) -> Result<Option<UserProfile>, SQLError> {
    let rows = tx.query("SELECT id, name FROM users WHERE id = ?1", &[Value::Integer(id)])?;
    let Some(user) = rows.first().and_then(user_from_row) else {
        return Ok(None);
    };

    // Both directions of the follow relation in a single statement.
    let edges = tx.query(
        "SELECT 'follower' AS side, u.id, u.name
           FROM follows f JOIN users u ON u.id = f.follower_id
          WHERE f.following_id = ?1
         UNION ALL
         SELECT 'following' AS side, u.id, u.name
           FROM follows f JOIN users u ON u.id = f.following_id
          WHERE f.follower_id = ?1
         ORDER BY side, id",
        &[Value::Integer(id)],
    )?;

    let mut followers = Vec::new();
    let mut following = Vec::new();
    for row in &edges {
        let Some(other) = user_from_row(row) else {
            continue;
        };
        match row.get_str("side") {
            Some("follower") => followers.push(other),
            _ => following.push(other),
        }
    }

    Ok(Some(UserProfile {
        id: user.id,
        name: user.name,
        followers,
        following,
    }))
}

pub(crate) fn user_from_row(row: &Row) -> Option<User> {
    Some(User {
        id: row.get_i64("id")?,
        name: row.get_str("name")?.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::testing::{test_service, user};

    #[test]
    fn test_create_and_get_user() {
        let (svc, _dir) = test_service();

        let alice = user(&svc, "alice");
        assert_eq!(alice.name, "alice");

        let fetched = svc.get_user(alice.id).unwrap().unwrap();
        assert_eq!(fetched, alice);

        let by_key = svc.find_user_by_api_key("alice-key").unwrap().unwrap();
        assert_eq!(by_key.id, alice.id);

        assert!(svc.find_user_by_api_key("nope").unwrap().is_none());
        assert!(svc.get_user(999).unwrap().is_none());
    }

    #[test]
    fn test_duplicate_api_key() {
        let (svc, _dir) = test_service();
        user(&svc, "alice");

        let err = svc
            .create_user(CreateUser {
                name: "mallory".to_string(),
                api_key: "alice-key".to_string(),
            })
            .unwrap_err();
        assert!(matches!(err, SocialError::InvalidOperation(_)));
    }

    #[test]
    fn test_empty_user_rejected() {
        let (svc, _dir) = test_service();
        let err = svc
            .create_user(CreateUser {
                name: " ".to_string(),
                api_key: "k".to_string(),
            })
            .unwrap_err();
        assert!(matches!(err, SocialError::Validation(_)));
    }

    #[test]
    fn test_profile_without_edges() {
        let (svc, _dir) = test_service();
        let alice = user(&svc, "alice");

        let profile = svc.get_user_profile(alice.id).unwrap().unwrap();
        assert_eq!(profile.name, "alice");
        assert!(profile.followers.is_empty());
        assert!(profile.following.is_empty());

        assert!(svc.get_user_profile(alice.id + 100).unwrap().is_none());
    }
}
