use serde::{Deserialize, Serialize};

/// A user identity as other users see it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// Database id.
    pub id: i64,

    /// Display name.
    pub name: String,
}

/// A user together with both sides of the follow relation.
#[derive(Debug, Clone, Serialize)]
pub struct UserProfile {
    pub id: i64,
    pub name: String,

    /// Users who follow this user.
    pub followers: Vec<User>,

    /// Users this user follows.
    pub following: Vec<User>,
}

/// Input for creating a new user.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateUser {
    pub name: String,

    /// Opaque credential sent in the `api-key` header. Unique.
    pub api_key: String,
}
