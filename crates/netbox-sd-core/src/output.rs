//! Target file output

use std::io::{self, Write};
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tempfile::NamedTempFile;
use tracing::debug;

/// Mode of written target files
pub const FILE_MODE: u32 = 0o664;

/// Destination for rendered target files
#[async_trait]
pub trait TargetSink: Send + Sync {
    /// Replace the contents of `path` with `data` in full
    async fn write(&self, path: &Path, data: Vec<u8>) -> io::Result<()>;
}

/// Writes target files to the local filesystem
///
/// Data goes to a temporary file next to the target which is then renamed over
/// it, so readers only ever see the previous or the new content.
#[derive(Debug, Clone, Copy, Default)]
pub struct FileSink;

impl FileSink {
    fn write_atomic(path: &Path, data: &[u8]) -> io::Result<()> {
        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };

        let mut tmp = NamedTempFile::new_in(dir)?;
        tmp.write_all(data)?;
        tmp.as_file().sync_all()?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            tmp.as_file()
                .set_permissions(std::fs::Permissions::from_mode(FILE_MODE))?;
        }

        tmp.persist(path).map_err(|e| e.error)?;
        Ok(())
    }
}

#[async_trait]
impl TargetSink for FileSink {
    async fn write(&self, path: &Path, data: Vec<u8>) -> io::Result<()> {
        let path: PathBuf = path.to_path_buf();
        debug!(file = %path.display(), bytes = data.len(), "writing target file");

        tokio::task::spawn_blocking(move || Self::write_atomic(&path, &data))
            .await
            .map_err(io::Error::other)?
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_write_replaces_content() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("targets.yml");

        FileSink.write(&path, b"first".to_vec()).await.unwrap();
        FileSink.write(&path, b"second".to_vec()).await.unwrap();

        assert_eq!(std::fs::read_to_string(&path).unwrap(), "second");
        // no temporary files left behind
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_write_sets_mode() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("targets.yml");
        FileSink.write(&path, Vec::new()).await.unwrap();

        let mode = std::fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, FILE_MODE);
    }

    #[tokio::test]
    async fn test_write_missing_dir_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("targets.yml");
        assert!(FileSink.write(&path, b"x".to_vec()).await.is_err());
    }
}
