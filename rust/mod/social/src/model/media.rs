use serde::Serialize;

/// An uploaded file.
#[derive(Debug, Clone, Serialize)]
pub struct Media {
    #[serde(rename = "media_id")]
    pub id: i64,

    /// Public path the file is served from.
    pub path: String,

    /// Key of the bytes in the blob store.
    #[serde(skip)]
    pub blob_key: String,

    #[serde(skip)]
    pub content_type: String,
}
