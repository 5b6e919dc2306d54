use microblog_sql::SQLStore;

use crate::service::{storage, SocialError};

/// Initialize the SQLite schema for all social resources.
pub fn init_schema(sql: &dyn SQLStore) -> Result<(), SocialError> {
    let statements = [
        // Users: identity + credential
        "CREATE TABLE IF NOT EXISTS users (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            api_key TEXT NOT NULL UNIQUE,
            created_at TEXT NOT NULL
        )",

        // Follow edges: follower -> following, one row per pair
        "CREATE TABLE IF NOT EXISTS follows (
            follower_id INTEGER NOT NULL,
            following_id INTEGER NOT NULL,
            created_at TEXT NOT NULL,
            PRIMARY KEY (follower_id, following_id),
            CHECK (follower_id <> following_id),
            FOREIGN KEY (follower_id) REFERENCES users(id) ON DELETE CASCADE,
            FOREIGN KEY (following_id) REFERENCES users(id) ON DELETE CASCADE
        )",
        "CREATE INDEX IF NOT EXISTS idx_follows_following ON follows(following_id)",

        // Tweets
        "CREATE TABLE IF NOT EXISTS tweets (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            author_id INTEGER NOT NULL,
            content TEXT NOT NULL,
            created_at TEXT NOT NULL,
            FOREIGN KEY (author_id) REFERENCES users(id) ON DELETE CASCADE
        )",
        "CREATE INDEX IF NOT EXISTS idx_tweets_author ON tweets(author_id)",
        "CREATE TRIGGER IF NOT EXISTS tweets_author_immutable
            BEFORE UPDATE OF author_id ON tweets
            WHEN NEW.author_id <> OLD.author_id
            BEGIN
                SELECT RAISE(ABORT, 'tweet author is immutable');
            END",

        // Like edges: user liked tweet, one row per pair
        "CREATE TABLE IF NOT EXISTS likes (
            tweet_id INTEGER NOT NULL,
            user_id INTEGER NOT NULL,
            created_at TEXT NOT NULL,
            PRIMARY KEY (tweet_id, user_id),
            FOREIGN KEY (tweet_id) REFERENCES tweets(id) ON DELETE CASCADE,
            FOREIGN KEY (user_id) REFERENCES users(id) ON DELETE CASCADE
        )",
        "CREATE INDEX IF NOT EXISTS idx_likes_user ON likes(user_id)",

        // Uploaded files
        "CREATE TABLE IF NOT EXISTS medias (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            blob_key TEXT NOT NULL UNIQUE,
            file_name TEXT NOT NULL,
            content_type TEXT NOT NULL,
            created_at TEXT NOT NULL
        )",

        // Ordered tweet -> media references
        "CREATE TABLE IF NOT EXISTS tweet_attachments (
            tweet_id INTEGER NOT NULL,
            media_id INTEGER NOT NULL,
            position INTEGER NOT NULL,
            PRIMARY KEY (tweet_id, media_id),
            FOREIGN KEY (tweet_id) REFERENCES tweets(id) ON DELETE CASCADE,
            FOREIGN KEY (media_id) REFERENCES medias(id)
        )",
    ];

    for stmt in &statements {
        sql.exec(stmt, &[]).map_err(storage)?;
    }

    Ok(())
}
