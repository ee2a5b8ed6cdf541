//! Filesystem utilities for crash-safe writes.

use std::fs::{self, File};
use std::io::Write;
use std::path::Path;

use crate::error::TwigResult;

/// Write data to a file atomically using temp-file-then-rename.
///
/// The temp file sits next to the target so the rename never crosses a
/// filesystem boundary. Parent directories are created as needed.
pub fn atomic_write(path: &Path, data: &[u8]) -> TwigResult<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let mut tmp_name = path.file_name().unwrap_or_default().to_os_string();
    tmp_name.push(".tmp");
    let tmp = path.with_file_name(tmp_name);
    let mut file = File::create(&tmp)?;
    file.write_all(data)?;
    file.sync_data()?;
    fs::rename(&tmp, path)?;
    Ok(())
}

/// Read a small text file (a ref, HEAD) and trim it.
///
/// Missing and blank files both read as `None`.
pub fn read_trimmed(path: &Path) -> TwigResult<Option<String>> {
    if !path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(path)?;
    let trimmed = content.trim();
    if trimmed.is_empty() {
        Ok(None)
    } else {
        Ok(Some(trimmed.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_atomic_write_creates_parents() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("a/b/c.txt");
        atomic_write(&path, b"data").unwrap();
        assert_eq!(fs::read(&path).unwrap(), b"data");
        assert!(!dir.path().join("a/b/c.txt.tmp").exists());
    }

    #[test]
    fn test_read_trimmed() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("HEAD");
        assert_eq!(read_trimmed(&path).unwrap(), None);
        fs::write(&path, "  \n").unwrap();
        assert_eq!(read_trimmed(&path).unwrap(), None);
        fs::write(&path, "master\n").unwrap();
        assert_eq!(read_trimmed(&path).unwrap().as_deref(), Some("master"));
    }
}
