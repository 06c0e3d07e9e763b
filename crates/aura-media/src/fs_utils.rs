//! Placing finished artifacts into their output directories.
//!
//! Run artifacts are produced inside a per-run temp directory which may sit on
//! a different filesystem than the output directory, so a plain rename can
//! fail with EXDEV.

use std::path::Path;
use tokio::fs;

use crate::error::{MediaError, MediaResult};

/// Move `src` to `dst`, creating the destination directory and replacing any
/// existing file. Falls back to copy + rename when crossing filesystems.
pub async fn move_file(src: impl AsRef<Path>, dst: impl AsRef<Path>) -> MediaResult<()> {
    let src = src.as_ref();
    let dst = dst.as_ref();

    if !fs::try_exists(src).await.unwrap_or(false) {
        return Err(MediaError::FileNotFound(src.to_path_buf()));
    }
    ensure_parent_dir(dst).await?;

    match fs::rename(src, dst).await {
        Ok(()) => Ok(()),
        Err(e) if is_cross_device_error(&e) => {
            tracing::debug!(src = %src.display(), dst = %dst.display(), "cross-device move");
            copy_across(src, dst).await
        }
        Err(e) => Err(e.into()),
    }
}

/// Create the parent directory of `path` if it is missing.
pub async fn ensure_parent_dir(path: &Path) -> MediaResult<()> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => {
            fs::create_dir_all(parent).await?;
            Ok(())
        }
        _ => Ok(()),
    }
}

fn is_cross_device_error(e: &std::io::Error) -> bool {
    // EXDEV
    e.raw_os_error() == Some(18)
}

/// Copy into a sibling staging file, rename it over `dst`, then drop `src`.
async fn copy_across(src: &Path, dst: &Path) -> MediaResult<()> {
    let file_name = dst
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| "artifact".to_string());
    let staging = dst.with_file_name(format!(".{}.partial", file_name));

    if let Err(e) = fs::copy(src, &staging).await {
        let _ = fs::remove_file(&staging).await;
        return Err(e.into());
    }
    if let Err(e) = fs::rename(&staging, dst).await {
        let _ = fs::remove_file(&staging).await;
        return Err(e.into());
    }

    if let Err(e) = fs::remove_file(src).await {
        tracing::warn!(src = %src.display(), "failed to remove moved source: {}", e);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_move_creates_nested_destination() {
        let dir = TempDir::new().unwrap();
        let src = dir.path().join("run").join("briefing.wav");
        fs::create_dir_all(src.parent().unwrap()).await.unwrap();
        fs::write(&src, b"RIFF").await.unwrap();

        let dst = dir.path().join("cache").join("7").join("personal.wav");
        move_file(&src, &dst).await.unwrap();

        assert!(!src.exists());
        assert_eq!(fs::read(&dst).await.unwrap(), b"RIFF");
    }

    #[tokio::test]
    async fn test_move_replaces_previous_artifact() {
        let dir = TempDir::new().unwrap();
        let src = dir.path().join("new.wav");
        let dst = dir.path().join("personal.wav");
        fs::write(&src, b"new").await.unwrap();
        fs::write(&dst, b"old").await.unwrap();

        move_file(&src, &dst).await.unwrap();
        assert_eq!(fs::read(&dst).await.unwrap(), b"new");
    }

    #[tokio::test]
    async fn test_move_missing_source() {
        let dir = TempDir::new().unwrap();
        let err = move_file(dir.path().join("nope"), dir.path().join("out"))
            .await
            .unwrap_err();
        assert!(matches!(err, MediaError::FileNotFound(_)));
    }

    #[tokio::test]
    async fn test_copy_across_leaves_no_staging_file() {
        let dir = TempDir::new().unwrap();
        let src = dir.path().join("a.mp4");
        let dst = dir.path().join("out").join("b.mp4");
        fs::write(&src, b"video").await.unwrap();
        ensure_parent_dir(&dst).await.unwrap();

        copy_across(&src, &dst).await.unwrap();
        assert!(!src.exists());
        assert!(!dst.with_file_name(".b.mp4.partial").exists());
        assert_eq!(fs::read(&dst).await.unwrap(), b"video");
    }

    #[test]
    fn test_exdev_detection() {
        assert!(is_cross_device_error(&std::io::Error::from_raw_os_error(18)));
        assert!(!is_cross_device_error(&std::io::Error::from_raw_os_error(2)));
    }
}
