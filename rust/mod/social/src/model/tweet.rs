use serde::{Deserialize, Serialize};

use crate::model::User;

/// A tweet with its author, attachment paths and likers.
#[derive(Debug, Clone, Serialize)]
pub struct Tweet {
    pub id: i64,
    pub content: String,

    /// Public paths of attached media, in the order they were given.
    pub attachments: Vec<String>,

    pub author: User,

    pub likes: Vec<Liker>,
}

/// A user who liked a tweet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Liker {
    pub user_id: i64,
    pub name: String,
}

/// Input for publishing a tweet.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateTweet {
    pub tweet_data: String,

    /// Ids of previously uploaded media. Unknown ids are skipped.
    #[serde(default)]
    pub tweet_media_ids: Vec<i64>,
}
