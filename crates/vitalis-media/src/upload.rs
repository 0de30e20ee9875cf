//! Storage of uploaded artifacts before they are handed to a handler.

use std::path::{Path, PathBuf};

use uuid::Uuid;

use crate::error::MediaError;

/// Final path component of a client-supplied file name.
///
/// Directory parts (either separator) are dropped; names that reduce to
/// nothing usable fall back to `upload`.
pub fn sanitize_file_name(name: &str) -> String {
    let last = name
        .rsplit(|c: char| c == '/' || c == '\\')
        .next()
        .unwrap_or_default()
        .trim();
    match last {
        "" | "." | ".." => "upload".to_string(),
        other => other.to_string(),
    }
}

/// Write `bytes` to a fresh file in `dir`.
///
/// The name is `<uuid>-<sanitized file_name>`, so concurrent uploads of the
/// same client name never share a path. The extension is preserved.
pub async fn save_upload(dir: &Path, file_name: &str, bytes: &[u8]) -> Result<PathBuf, MediaError> {
    tokio::fs::create_dir_all(dir).await?;
    let path = dir.join(format!(
        "{}-{}",
        Uuid::new_v4(),
        sanitize_file_name(file_name)
    ));
    tokio::fs::write(&path, bytes).await?;
    tracing::debug!(path = %path.display(), size_bytes = bytes.len(), "Saved upload");
    Ok(path)
}
