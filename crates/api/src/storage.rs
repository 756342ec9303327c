//! Local blob store for uploaded donation photos and rendered
//! certificate PDFs.
//!
//! Files live under the configured upload root (`{root}/images`,
//! `{root}/pdf`) and are addressed externally by `/uploads/...` URLs,
//! served statically by the router. Image writes are gated on an
//! `image/*` content type; nothing else about the payload is validated.
//!
//! Writes here are not transactional with the database. The calling
//! handlers write blobs first, commit rows second, and delete freshly
//! written blobs when the commit fails; blob removal itself is
//! best-effort and only logged.

use std::path::{Path, PathBuf};

use rebond_core::error::CoreError;

/// URL prefix under which stored blobs are served.
const URL_PREFIX: &str = "/uploads";

/// Filesystem-backed blob store rooted at the configured upload dir.
#[derive(Debug)]
pub struct UploadStore {
    root: PathBuf,
}

impl UploadStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// The filesystem root served under `/uploads`.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Store an uploaded donation photo.
    ///
    /// Rejects payloads whose declared content type does not begin with
    /// `image/`. Returns the public URL of the stored blob.
    pub async fn save_image(
        &self,
        filename: &str,
        content_type: &str,
        bytes: &[u8],
    ) -> Result<String, CoreError> {
        if !content_type.starts_with("image/") {
            return Err(CoreError::Validation(format!(
                "File '{filename}' is not a valid image"
            )));
        }

        let name = sanitize_filename(filename);
        let dir = self.root.join("images");
        tokio::fs::create_dir_all(&dir)
            .await
            .map_err(|e| CoreError::Internal(format!("Failed to create upload dir: {e}")))?;
        tokio::fs::write(dir.join(&name), bytes)
            .await
            .map_err(|e| CoreError::Internal(format!("Failed to write upload: {e}")))?;

        Ok(format!("{URL_PREFIX}/images/{name}"))
    }

    /// The public URL an image upload with this filename would get,
    /// without writing anything. Used to diff a new upload set against
    /// stored photo URLs before touching the filesystem.
    pub fn image_url(&self, filename: &str) -> String {
        format!("{URL_PREFIX}/images/{}", sanitize_filename(filename))
    }

    /// Best-effort removal of a stored blob by its public URL. Failures
    /// are logged, never surfaced: rows are the source of truth and an
    /// orphaned file is only wasted disk.
    pub async fn remove_by_url(&self, url: &str) {
        let Some(relative) = url.strip_prefix(&format!("{URL_PREFIX}/")) else {
            tracing::warn!(url, "Refusing to remove blob outside the upload root");
            return;
        };
        let path = self.root.join(relative);
        if let Err(e) = tokio::fs::remove_file(&path).await {
            tracing::warn!(url, error = %e, "Failed to remove blob");
        }
    }

    /// Persist a rendered certificate PDF for the given donation
    /// reference. Returns the public URL under `/uploads`.
    pub async fn save_certificate(
        &self,
        reference: &str,
        bytes: &[u8],
    ) -> Result<String, CoreError> {
        let dir = self.root.join("pdf");
        tokio::fs::create_dir_all(&dir)
            .await
            .map_err(|e| CoreError::Internal(format!("Failed to create pdf dir: {e}")))?;
        let filename = format!("{}.pdf", sanitize_filename(reference));
        tokio::fs::write(dir.join(&filename), bytes)
            .await
            .map_err(|e| CoreError::Internal(format!("Failed to write certificate: {e}")))?;
        Ok(format!("{URL_PREFIX}/pdf/{filename}"))
    }

    /// Read back a previously rendered certificate, if one exists.
    pub async fn read_certificate(&self, reference: &str) -> Option<Vec<u8>> {
        let path = self
            .root
            .join("pdf")
            .join(format!("{}.pdf", sanitize_filename(reference)));
        tokio::fs::read(&path).await.ok()
    }
}

/// Strip any path components from a client-supplied filename.
fn sanitize_filename(filename: &str) -> String {
    filename
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or(filename)
        .to_string()
}
