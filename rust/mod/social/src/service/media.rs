use std::path::Path;

use microblog_blob::BlobError;
use microblog_core::{new_id, now_rfc3339};
use microblog_sql::{Row, Value};
use tracing::{info, warn};

use crate::model::Media;
use crate::service::{storage, SocialError, SocialService};

const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

fn blob_error(e: BlobError) -> SocialError {
    SocialError::Storage(e.to_string())
}

/// Lowercased extension of `file_name`, if it is a short alphanumeric one.
fn extension(file_name: &str) -> Option<String> {
    let ext = Path::new(file_name).extension()?.to_str()?;
    if ext.is_empty() || ext.len() > 8 || !ext.chars().all(|c| c.is_ascii_alphanumeric()) {
        return None;
    }
    Some(ext.to_ascii_lowercase())
}

impl SocialService {
    /// Store an uploaded file and register it.
    ///
    /// The stored key never derives from `file_name` beyond its extension.
    pub fn create_media(
        &self,
        file_name: &str,
        content_type: Option<&str>,
        data: &[u8],
    ) -> Result<Media, SocialError> {
        let blob_key = match extension(file_name) {
            Some(ext) => format!("{}.{}", new_id(), ext),
            None => new_id(),
        };
        let content_type = content_type
            .filter(|ct| !ct.trim().is_empty())
            .unwrap_or(DEFAULT_CONTENT_TYPE)
            .to_string();

        self.blob.put(&blob_key, data).map_err(blob_error)?;

        let inserted = self.sql.query(
            "INSERT INTO medias (blob_key, file_name, content_type, created_at)
             VALUES (?1, ?2, ?3, ?4) RETURNING id",
            &[
                Value::Text(blob_key.clone()),
                Value::Text(file_name.to_string()),
                Value::Text(content_type.clone()),
                Value::Text(now_rfc3339()),
            ],
        );
        let id = match inserted.map(|rows| rows.first().and_then(|r| r.get_i64("id"))) {
            Ok(Some(id)) => id,
            Ok(None) => {
                self.discard_blob(&blob_key);
                return Err(SocialError::Internal("insert returned no id".into()));
            }
            Err(e) => {
                self.discard_blob(&blob_key);
                return Err(storage(e));
            }
        };

        info!(media = id, bytes = data.len(), %content_type, "media stored");
        Ok(Media {
            id,
            path: self.media_path(id),
            blob_key,
            content_type,
        })
    }

    /// All registered media, by id.
    pub fn list_medias(&self) -> Result<Vec<Media>, SocialError> {
        let rows = self
            .sql
            .query("SELECT id, blob_key, content_type FROM medias ORDER BY id", &[])
            .map_err(storage)?;
        Ok(rows.iter().filter_map(|r| self.media_from_row(r)).collect())
    }

    pub fn get_media(&self, id: i64) -> Result<Option<Media>, SocialError> {
        let rows = self
            .sql
            .query(
                "SELECT id, blob_key, content_type FROM medias WHERE id = ?1",
                &[Value::Integer(id)],
            )
            .map_err(storage)?;
        Ok(rows.first().and_then(|r| self.media_from_row(r)))
    }

    /// A media record together with its bytes. `None` if either is gone.
    pub fn read_media(&self, id: i64) -> Result<Option<(Media, Vec<u8>)>, SocialError> {
        let Some(media) = self.get_media(id)? else {
            return Ok(None);
        };
        match self.blob.get(&media.blob_key).map_err(blob_error)? {
            Some(data) => Ok(Some((media, data))),
            None => {
                warn!(media = id, key = %media.blob_key, "media bytes missing");
                Ok(None)
            }
        }
    }

    fn media_path(&self, id: i64) -> String {
        format!(
            "{}/{}",
            self.config.media_public_prefix.trim_end_matches('/'),
            id
        )
    }

    fn media_from_row(&self, row: &Row) -> Option<Media> {
        let id = row.get_i64("id")?;
        Some(Media {
            id,
            path: self.media_path(id),
            blob_key: row.get_str("blob_key")?.to_string(),
            content_type: row.get_str("content_type")?.to_string(),
        })
    }

    fn discard_blob(&self, key: &str) {
        if let Err(e) = self.blob.delete(key) {
            warn!(key, error = %e, "failed to remove orphaned blob");
        }
    }
}
