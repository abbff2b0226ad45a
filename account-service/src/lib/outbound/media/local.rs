use std::path::Path;
use std::path::PathBuf;

use async_trait::async_trait;
use uuid::Uuid;

use crate::account::errors::MediaError;
use crate::account::models::MediaFile;
use crate::account::ports::MediaStore;

const FALLBACK_FILE_NAME: &str = "upload";

/// Media store writing uploads to a directory served under `public_base_url`.
pub struct LocalMediaStore {
    directory: PathBuf,
    public_base_url: String,
}

impl LocalMediaStore {
    pub fn new(directory: impl Into<PathBuf>, public_base_url: impl Into<String>) -> Self {
        Self {
            directory: directory.into(),
            public_base_url: public_base_url.into(),
        }
    }

    /// Reduce a client-supplied name to its final component, restricted to a
    /// safe character set. Names with nothing left fall back to
    /// [`FALLBACK_FILE_NAME`].
    fn safe_file_name(file_name: &str) -> String {
        let safe: String = Path::new(file_name)
            .file_name()
            .and_then(|name| name.to_str())
            .unwrap_or_default()
            .chars()
            .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_'))
            .collect();

        if safe.trim_matches('.').is_empty() {
            return FALLBACK_FILE_NAME.to_string();
        }

        safe
    }
}

#[async_trait]
impl MediaStore for LocalMediaStore {
    async fn upload(&self, file: MediaFile) -> Result<String, MediaError> {
        let safe_name = Self::safe_file_name(&file.file_name);
        let stored_name = format!("{}-{}", Uuid::new_v4(), safe_name);

        tokio::fs::create_dir_all(&self.directory)
            .await
            .map_err(|e| MediaError::StorageFailed(e.to_string()))?;

        let path = self.directory.join(&stored_name);
        tokio::fs::write(&path, &file.bytes)
            .await
            .map_err(|e| MediaError::StorageFailed(e.to_string()))?;

        tracing::debug!(
            path = %path.display(),
            bytes = file.bytes.len(),
            content_type = file.content_type.as_deref().unwrap_or("unknown"),
            "Media file stored"
        );

        Ok(format!(
            "{}/{}",
            self.public_base_url.trim_end_matches('/'),
            stored_name
        ))
    }
}
