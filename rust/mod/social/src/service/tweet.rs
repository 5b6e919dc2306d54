use std::collections::{HashMap, HashSet};

use microblog_core::now_rfc3339;
use microblog_sql::{SQLError, SQLExecutor, Value};
use tracing::info;

use crate::model::{CreateTweet, Liker, Tweet, User};
use crate::service::like::tweet_not_found;
use crate::service::{storage, Owned, Ownership, SocialError, SocialService};

impl SocialService {
    /// Publish a tweet on behalf of `author`. Returns the new tweet id.
    ///
    /// Media ids are attached in request order; unknown or repeated ids
    /// are dropped.
    pub fn create_tweet(&self, author: &User, input: CreateTweet) -> Result<i64, SocialError> {
        if input.tweet_data.trim().is_empty() {
            return Err(SocialError::Validation(
                "Текст твита не может быть пустым".to_string(),
            ));
        }

        let mut tweet_id = None;
        let mut attached = 0usize;
        self.sql
            .transaction(&mut |tx: &dyn SQLExecutor| {
                let rows = tx.query(
                    "INSERT INTO tweets (author_id, content, created_at)
                     VALUES (?1, ?2, ?3) RETURNING id",
                    &[
                        Value::Integer(author.id),
                        Value::Text(input.tweet_data.clone()),
                        Value::Text(now_rfc3339()),
                    ],
                )?;
                let id = rows
                    .first()
                    .and_then(|r| r.get_i64("id"))
                    .ok_or_else(|| SQLError::Execution("insert returned no id".into()))?;

                let media_ids = existing_media(tx, &input.tweet_media_ids)?;
                for (position, media_id) in media_ids.iter().enumerate() {
                    tx.exec(
                        "INSERT INTO tweet_attachments (tweet_id, media_id, position)
                         VALUES (?1, ?2, ?3)",
                        &[
                            Value::Integer(id),
                            Value::Integer(*media_id),
                            Value::Integer(position as i64),
                        ],
                    )?;
                }

                attached = media_ids.len();
                tweet_id = Some(id);
                Ok(())
            })
            .map_err(storage)?;

        let id = tweet_id.ok_or_else(|| SocialError::Internal("tweet not created".into()))?;
        info!(tweet = id, author = author.id, attached, "tweet created");
        Ok(id)
    }

    /// All tweets, newest first, with authors, attachments and likers.
    pub fn list_tweets(&self) -> Result<Vec<Tweet>, SocialError> {
        self.load_tweets(None)
    }

    pub fn get_tweet(&self, id: i64) -> Result<Option<Tweet>, SocialError> {
        Ok(self.load_tweets(Some(id))?.into_iter().next())
    }

    /// Delete a tweet owned by `acting`. Likes and attachments go with it.
    pub fn delete_tweet(&self, acting: &User, id: i64) -> Result<(), SocialError> {
        match self.authorize_delete(Owned::Tweet(id), acting.id)? {
            Ownership::Deleted { .. } => {
                info!(tweet = id, author = acting.id, "tweet deleted");
                Ok(())
            }
            Ownership::Missing => Err(tweet_not_found(id)),
            Ownership::Forbidden { .. } => Err(SocialError::InvalidOperation(
                "Нельзя удалить чужой твит!".to_string(),
            )),
        }
    }

    /// Eager load: tweets, likers and attachments in three queries, one
    /// transaction.
    fn load_tweets(&self, only: Option<i64>) -> Result<Vec<Tweet>, SocialError> {
        let prefix = self.config.media_public_prefix.trim_end_matches('/');
        let mut tweets = Vec::new();
        self.sql
            .transaction(&mut |tx: &dyn SQLExecutor| {
                tweets = load_in(tx, only, prefix)?;
                Ok(())
            })
            .map_err(storage)?;
        Ok(tweets)
    }
}

/// Keep the ids that name a stored media, first occurrence wins.
fn existing_media(tx: &dyn SQLExecutor, requested: &[i64]) -> Result<Vec<i64>, SQLError> {
    let mut seen = HashSet::new();
    let mut found = Vec::new();
    for &media_id in requested {
        if !seen.insert(media_id) {
            continue;
        }
        let rows = tx.query("SELECT id FROM medias WHERE id = ?1", &[Value::Integer(media_id)])?;
        if !rows.is_empty() {
            found.push(media_id);
        }
    }
    Ok(found)
}

fn load_in(
    tx: &dyn SQLExecutor,
    only: Option<i64>,
    media_prefix: &str,
) -> Result<Vec<Tweet>, SQLError> {
    // ?1 IS NULL selects every tweet.
    let filter = [only.map(Value::Integer).unwrap_or(Value::Null)];

    let rows = tx.query(
        "SELECT t.id, t.content, u.id AS author_id, u.name AS author_name
           FROM tweets t JOIN users u ON u.id = t.author_id
          WHERE ?1 IS NULL OR t.id = ?1
          ORDER BY t.id DESC",
        &filter,
    )?;

    let mut tweets = Vec::with_capacity(rows.len());
    let mut index = HashMap::new();
    for row in &rows {
        let (Some(id), Some(content), Some(author_id), Some(author_name)) = (
            row.get_i64("id"),
            row.get_str("content"),
            row.get_i64("author_id"),
            row.get_str("author_name"),
        ) else {
            continue;
        };
        index.insert(id, tweets.len());
        tweets.push(Tweet {
            id,
            content: content.to_string(),
            attachments: Vec::new(),
            author: User {
                id: author_id,
                name: author_name.to_string(),
            },
            likes: Vec::new(),
        });
    }
    if tweets.is_empty() {
        return Ok(tweets);
    }

    let likes = tx.query(
        "SELECT l.tweet_id, u.id AS user_id, u.name
           FROM likes l JOIN users u ON u.id = l.user_id
          WHERE ?1 IS NULL OR l.tweet_id = ?1
          ORDER BY l.tweet_id, l.created_at, u.id",
        &filter,
    )?;
    for row in &likes {
        let (Some(tweet_id), Some(user_id), Some(name)) =
            (row.get_i64("tweet_id"), row.get_i64("user_id"), row.get_str("name"))
        else {
            continue;
        };
        if let Some(&i) = index.get(&tweet_id) {
            tweets[i].likes.push(Liker {
                user_id,
                name: name.to_string(),
            });
        }
    }

    let attachments = tx.query(
        "SELECT tweet_id, media_id FROM tweet_attachments
          WHERE ?1 IS NULL OR tweet_id = ?1
          ORDER BY tweet_id, position",
        &filter,
    )?;
    for row in &attachments {
        let (Some(tweet_id), Some(media_id)) = (row.get_i64("tweet_id"), row.get_i64("media_id"))
        else {
            continue;
        };
        if let Some(&i) = index.get(&tweet_id) {
            tweets[i]
                .attachments
                .push(format!("{}/{}", media_prefix, media_id));
        }
    }

    Ok(tweets)
}
