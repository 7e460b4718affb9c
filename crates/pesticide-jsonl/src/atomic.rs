//! Atomic write operations for JSONL files.
//!
//! Data is written to a sibling temporary file which is then renamed over the
//! target. Renames within one filesystem are atomic on POSIX systems, so a
//! crash mid-write leaves the previous file intact.

use crate::{JsonlWriter, Result};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tokio::fs::File;

/// Atomically replaces the file at `path` with `values`, one JSON value per line.
///
/// # Errors
///
/// Returns an error if the temporary file cannot be created or written, if a
/// value fails to serialize, or if the final rename fails. On failure the
/// original file is left unchanged and the temporary file is removed on a
/// best-effort basis.
///
/// # Examples
///
/// ```no_run
/// use pesticide_jsonl::write_jsonl_atomic;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// write_jsonl_atomic("names.jsonl", &["alpha", "beta"]).await?;
/// # Ok(())
/// # }
/// ```
pub async fn write_jsonl_atomic<T, P>(path: P, values: &[T]) -> Result<()>
where
    T: Serialize,
    P: AsRef<Path>,
{
    let path = path.as_ref();
    let temp_path = make_temp_path(path);

    if let Err(e) = write_to_temp_file(&temp_path, values).await {
        remove_temp_file(&temp_path).await;
        return Err(e);
    }

    if let Err(e) = tokio::fs::rename(&temp_path, path).await {
        remove_temp_file(&temp_path).await;
        return Err(e.into());
    }
    Ok(())
}

async fn remove_temp_file(temp_path: &Path) {
    if let Err(cleanup) = tokio::fs::remove_file(temp_path).await {
        tracing::debug!(path = %temp_path.display(), error = %cleanup, "Temp file cleanup failed");
    }
}

/// `issues.jsonl` -> `issues.jsonl.tmp`; `data` -> `data.tmp`.
fn make_temp_path(path: &Path) -> PathBuf {
    let mut temp_path = path.to_path_buf();
    let new_extension = match path.extension() {
        Some(ext) => {
            let mut new_ext = ext.to_os_string();
            new_ext.push(".tmp");
            new_ext
        }
        None => std::ffi::OsString::from("tmp"),
    };
    temp_path.set_extension(new_extension);
    temp_path
}

async fn write_to_temp_file<T: Serialize>(temp_path: &Path, values: &[T]) -> Result<()> {
    let file = File::create(temp_path).await?;
    let mut writer = JsonlWriter::new(file);
    writer.write_all(values).await?;
    writer.flush().await?;
    writer.into_inner().sync_all().await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn temp_path_keeps_original_extension() {
        assert_eq!(
            make_temp_path(Path::new("/data/issues.jsonl")),
            PathBuf::from("/data/issues.jsonl.tmp")
        );
        assert_eq!(
            make_temp_path(Path::new("/data/issues")),
            PathBuf::from("/data/issues.tmp")
        );
    }

    #[tokio::test]
    async fn replaces_existing_file_and_leaves_no_temp() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("names.jsonl");
        tokio::fs::write(&path, "\"stale\"\n").await.unwrap();

        write_jsonl_atomic(&path, &["alpha", "beta"]).await.unwrap();

        let content = tokio::fs::read_to_string(&path).await.unwrap();
        assert_eq!(content, "\"alpha\"\n\"beta\"\n");
        assert!(!make_temp_path(&path).exists());
    }

    #[tokio::test]
    async fn missing_parent_directory_is_an_error() {
        let dir = tempdir().unwrap();
        let missing_dir = dir.path().join("missing").join("names.jsonl");

        let result = write_jsonl_atomic(&missing_dir, &["alpha"]).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn failed_rename_removes_temp_and_keeps_target() {
        let dir = tempdir().unwrap();
        let target = dir.path().join("names.jsonl");
        tokio::fs::create_dir(&target).await.unwrap();
        tokio::fs::write(target.join("keep"), "x").await.unwrap();

        let result = write_jsonl_atomic(&target, &["alpha"]).await;

        assert!(matches!(result, Err(crate::Error::Io(_))));
        assert!(!make_temp_path(&target).exists());
        assert!(target.join("keep").exists());
    }
}
