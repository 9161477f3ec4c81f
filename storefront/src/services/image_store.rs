// storefront/src/services/image_store.rs

use std::path::{Path, PathBuf};

use tracing::instrument;
use uuid::Uuid;

use crate::errors::{AppError, Result};

/// Public URL prefix under which stored images are served.
pub const PUBLIC_PREFIX: &str = "/img/product-uploads";

/// Writes uploaded product images under a single directory with
/// collision-free names.
#[derive(Debug, Clone)]
pub struct ImageStore {
  dir: PathBuf,
}

impl ImageStore {
  pub fn new(dir: impl Into<PathBuf>) -> Self {
    Self { dir: dir.into() }
  }

  pub fn dir(&self) -> &Path {
    &self.dir
  }

  pub async fn ensure_dir(&self) -> Result<()> {
    tokio::fs::create_dir_all(&self.dir).await?;
    Ok(())
  }

  /// Copies the staged upload at `staged` into the store and returns the
  /// stored file name, `<uuid>-<sanitized original name>`.
  #[instrument(name = "image_store::save", skip(self, staged))]
  pub async fn save(&self, original_name: Option<&str>, staged: &Path) -> Result<String> {
    let file_name = format!("{}-{}", Uuid::new_v4(), sanitize_file_name(original_name.unwrap_or("")));
    self.ensure_dir().await?;
    let target = self.dir.join(&file_name);
    tokio::fs::copy(staged, &target)
      .await
      .map_err(|e| AppError::Upload(format!("Could not store image {}: {}", file_name, e)))?;
    tracing::info!(file = %file_name, "Stored product image");
    Ok(file_name)
  }
}

/// Keeps only the final path component of a client-supplied name and replaces
/// anything outside `[A-Za-z0-9._-]`.
pub fn sanitize_file_name(original: &str) -> String {
  let last = original.rsplit(['/', '\\']).next().unwrap_or("");
  let cleaned: String = last
    .chars()
    .map(|c| if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') { c } else { '_' })
    .collect();
  let cleaned = cleaned.trim_start_matches('.');
  if cleaned.is_empty() {
    "upload".to_string()
  } else {
    cleaned.to_string()
  }
}
