use chrono::{DateTime, Datelike, SecondsFormat, Utc};
use serde::Serialize;
use std::path::{Component, Path, PathBuf};
use tracing::{info, warn};
use uuid::Uuid;

/// Public URL prefix under which the uploads directory is served.
pub const URL_PREFIX: &str = "/uploads";

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("invalid order id '{0}'")]
    InvalidOrderId(String),
    #[error("uploaded file is empty")]
    EmptyFile,
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Document record handed back to the client after an upload.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredFile {
    pub id: String,
    pub name: String,
    pub url: String,
    pub uploaded_at: String,
    #[serde(rename = "type")]
    pub content_type: String,
    pub size: u64,
}

/// Files live at `{root}/{YYYY}/{MM}/{orderId}/{uuid}{.ext}`.
#[derive(Debug, Clone)]
pub struct UploadStore {
    root: PathBuf,
}

impl UploadStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub async fn save(
        &self,
        order_id: &str,
        original_name: &str,
        content_type: Option<&str>,
        bytes: &[u8],
    ) -> Result<StoredFile, StorageError> {
        self.save_at(Utc::now(), order_id, original_name, content_type, bytes).await
    }

    async fn save_at(
        &self,
        now: DateTime<Utc>,
        order_id: &str,
        original_name: &str,
        content_type: Option<&str>,
        bytes: &[u8],
    ) -> Result<StoredFile, StorageError> {
        if !is_safe_segment(order_id) {
            return Err(StorageError::InvalidOrderId(order_id.to_string()));
        }
        if bytes.is_empty() {
            return Err(StorageError::EmptyFile);
        }

        let id = Uuid::new_v4().to_string();
        let file_name = format!("{}{}", id, extension_of(original_name));
        let relative = format!("{:04}/{:02}/{}/{}", now.year(), now.month(), order_id, file_name);

        let path = self.root.join(&relative);
        if let Some(dir) = path.parent() {
            tokio::fs::create_dir_all(dir).await?;
        }
        tokio::fs::write(&path, bytes).await?;
        info!("Stored upload {} ({} bytes)", relative, bytes.len());

        Ok(StoredFile {
            id,
            name: original_name.to_string(),
            url: format!("{}/{}", URL_PREFIX, relative),
            uploaded_at: now.to_rfc3339_opts(SecondsFormat::Millis, true),
            content_type: content_type.unwrap_or("application/octet-stream").to_string(),
            size: bytes.len() as u64,
        })
    }

    /// Best-effort removal of a previously stored file, addressed by its public URL.
    pub async fn remove(&self, url: &str) {
        let Some(path) = self.resolve(url) else {
            warn!("Refusing to remove upload outside store: {}", url);
            return;
        };
        if let Err(e) = tokio::fs::remove_file(&path).await {
            warn!("Could not remove upload {}: {}", path.display(), e);
        }
    }

    fn resolve(&self, url: &str) -> Option<PathBuf> {
        let relative = Path::new(url.strip_prefix(URL_PREFIX)?.trim_start_matches('/'));
        if relative.as_os_str().is_empty() || !relative.components().all(|c| matches!(c, Component::Normal(_))) {
            return None;
        }
        Some(self.root.join(relative))
    }
}

fn is_safe_segment(value: &str) -> bool {
    !value.is_empty() && value.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

/// Keeps a short alphanumeric extension from the client's file name, lowercased.
fn extension_of(name: &str) -> String {
    Path::new(name)
        .extension()
        .and_then(|ext| ext.to_str())
        .filter(|ext| !ext.is_empty() && ext.len() <= 10 && ext.chars().all(|c| c.is_ascii_alphanumeric()))
        .map(|ext| format!(".{}", ext.to_ascii_lowercase()))
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn temp_store() -> UploadStore {
        UploadStore::new(std::env::temp_dir().join(format!("blu-uploads-{}", Uuid::new_v4())))
    }

    #[tokio::test]
    async fn stores_under_dated_order_directory() {
        let store = temp_store();
        let now = Utc.with_ymd_and_hms(2024, 3, 9, 12, 0, 0).unwrap();

        let file = store
            .save_at(now, "order-1", "Nota Fiscal.PDF", Some("application/pdf"), b"%PDF-1.4")
            .await
            .unwrap();

        assert!(file.url.starts_with("/uploads/2024/03/order-1/"));
        assert!(file.url.ends_with(".pdf"));
        assert_eq!(file.name, "Nota Fiscal.PDF");
        assert_eq!(file.size, 8);
        assert_eq!(file.uploaded_at, "2024-03-09T12:00:00.000Z");

        let on_disk = store.resolve(&file.url).unwrap();
        assert_eq!(tokio::fs::read(&on_disk).await.unwrap(), b"%PDF-1.4");

        store.remove(&file.url).await;
        assert!(!on_disk.exists());
        let _ = tokio::fs::remove_dir_all(store.root()).await;
    }

    #[tokio::test]
    async fn rejects_path_like_order_ids_and_empty_files() {
        let store = temp_store();
        assert!(matches!(
            store.save("../etc", "x.txt", None, b"data").await,
            Err(StorageError::InvalidOrderId(_))
        ));
        assert!(matches!(store.save("order-1", "x.txt", None, b"").await, Err(StorageError::EmptyFile)));
    }

    #[test]
    fn resolve_stays_inside_root() {
        let store = UploadStore::new("/srv/uploads");
        assert_eq!(
            store.resolve("/uploads/2024/03/o1/a.png"),
            Some(PathBuf::from("/srv/uploads/2024/03/o1/a.png"))
        );
        assert_eq!(store.resolve("/uploads/../secret"), None);
        assert_eq!(store.resolve("/elsewhere/a.png"), None);
    }

    #[test]
    fn extension_is_sanitized() {
        assert_eq!(extension_of("photo.JPG"), ".jpg");
        assert_eq!(extension_of("archive"), "");
        assert_eq!(extension_of("weird.p$p"), "");
    }
}
