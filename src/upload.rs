//! Multipart upload ingestion.

use axum::extract::Multipart;
use axum::extract::multipart::Field;
use std::path::Path;
use tokio::fs::{self, File};
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, warn};

use crate::error::ApiError;

/// Persists each file part of `multipart` into `dir`, one part at a time.
///
/// Parts without a filename are skipped. When `overwrite` is false (POST),
/// a part whose destination already exists aborts the whole request with a
/// conflict; parts persisted before that point are kept. When `overwrite`
/// is true (PUT), existing files are truncated and replaced.
pub async fn ingest(dir: &Path, overwrite: bool, mut multipart: Multipart) -> Result<(), ApiError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|err| ApiError::Internal(err.to_string()))?
    {
        let Some(name) = field.file_name().and_then(sanitize_filename) else {
            debug!(
                field = field.name().unwrap_or_default(),
                "skipping part without a filename"
            );
            continue;
        };

        let destination = dir.join(&name);
        if !overwrite && fs::metadata(&destination).await.is_ok() {
            warn!(name, "upload target already exists");
            return Err(ApiError::Conflict);
        }

        info!(name, dir = %dir.display(), "uploading");
        write_part(field, &destination).await?;
    }

    Ok(())
}

/// Reduces a client-supplied filename to its final path component so the
/// destination stays inside the target directory.
fn sanitize_filename(raw: &str) -> Option<String> {
    let name = raw.rsplit(['/', '\\']).next().unwrap_or_default();
    match name {
        "" | "." | ".." => None,
        name => Some(name.to_string()),
    }
}

async fn write_part(mut field: Field<'_>, destination: &Path) -> Result<(), ApiError> {
    let mut file = File::create(destination).await?;
    while let Some(chunk) = field
        .chunk()
        .await
        .map_err(|err| ApiError::Internal(err.to_string()))?
    {
        file.write_all(&chunk).await?;
    }
    file.flush().await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::sanitize_filename;

    #[test]
    fn sanitize_strips_directory_components() {
        assert_eq!(sanitize_filename("report.txt"), Some("report.txt".into()));
        assert_eq!(sanitize_filename("a/b/report.txt"), Some("report.txt".into()));
        assert_eq!(
            sanitize_filename("..\\..\\report.txt"),
            Some("report.txt".into())
        );
        assert_eq!(sanitize_filename(""), None);
        assert_eq!(sanitize_filename("."), None);
        assert_eq!(sanitize_filename("a/.."), None);
    }
}
