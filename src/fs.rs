use anyhow::{Context, Result};
use std::path::Path;
use std::time::SystemTime;

/// Abstraction over file system operations for testing
pub trait FileSystem: Send + Sync {
    /// Read raw file contents
    fn read(&self, path: &Path) -> Result<Vec<u8>>;

    /// Replace a file's contents; readers never observe a partial write
    fn write_atomic(&self, path: &Path, contents: &str) -> Result<()>;

    /// Check if a path exists
    fn exists(&self, path: &Path) -> bool;

    /// Last modification time, if the file exists and the platform reports it
    fn modified(&self, path: &Path) -> Option<SystemTime>;

    /// Create a directory and all parent directories
    fn create_dir_all(&self, path: &Path) -> Result<()>;
}

/// Real file system implementation using std::fs
#[derive(Debug, Default, Clone)]
pub struct RealFileSystem;

impl FileSystem for RealFileSystem {
    fn read(&self, path: &Path) -> Result<Vec<u8>> {
        Ok(std::fs::read(path)?)
    }

    fn write_atomic(&self, path: &Path, contents: &str) -> Result<()> {
        use std::io::Write;

        // The temp file must live next to the target so the final rename
        // stays on one mount.
        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        let mut tmp = tempfile::NamedTempFile::new_in(dir)
            .with_context(|| format!("Failed to create temp file in: {}", dir.display()))?;
        tmp.write_all(contents.as_bytes())?;
        tmp.flush()?;
        tmp.persist(path)
            .map_err(|e| e.error)
            .with_context(|| format!("Failed to replace file: {}", path.display()))?;
        Ok(())
    }

    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }

    fn modified(&self, path: &Path) -> Option<SystemTime> {
        std::fs::metadata(path).and_then(|m| m.modified()).ok()
    }

    fn create_dir_all(&self, path: &Path) -> Result<()> {
        Ok(std::fs::create_dir_all(path)?)
    }
}
