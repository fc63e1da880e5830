//! 输出文件的原子写入
//!
//! 先写入同目录下的临时文件，再重命名到目标位置。中途失败时目标文件保持原样，
//! 临时文件随 `NamedTempFile` 一起删除。

use std::fs;
use std::io::Write;
use std::path::Path;

use tempfile::NamedTempFile;

use crate::epub::error::{EpubError, Result};

/// 输出文件的权限
#[cfg(unix)]
const FILE_MODE: u32 = 0o644;

/// 原子写入文件，必要时创建父目录
pub fn write_atomic(path: impl AsRef<Path>, content: &[u8]) -> Result<()> {
    let path = path.as_ref();
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    ensure_dir(parent)?;

    let mut tmp = NamedTempFile::new_in(parent).map_err(|e| EpubError::io_write(path, e))?;
    tmp.write_all(content).map_err(|e| EpubError::io_write(path, e))?;
    tmp.as_file().sync_all().map_err(|e| EpubError::io_write(path, e))?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(tmp.path(), fs::Permissions::from_mode(FILE_MODE))
            .map_err(|e| EpubError::io_write(path, e))?;
    }

    tmp.persist(path).map_err(|e| EpubError::io_write(path, e.error))?;
    Ok(())
}

/// 创建目录及其父目录
pub fn ensure_dir(dir: impl AsRef<Path>) -> Result<()> {
    let dir = dir.as_ref();
    fs::create_dir_all(dir).map_err(|e| EpubError::io_write(dir, e))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_creates_parents() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("book/chapters/1.html");
        write_atomic(&target, b"<p>x</p>").unwrap();
        assert_eq!(fs::read(&target).unwrap(), b"<p>x</p>");
    }

    #[test]
    fn test_overwrite_replaces_content() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("index.html");
        write_atomic(&target, b"old").unwrap();
        write_atomic(&target, b"new").unwrap();
        assert_eq!(fs::read_to_string(&target).unwrap(), "new");
        let leftovers = fs::read_dir(dir.path()).unwrap().count();
        assert_eq!(leftovers, 1);
    }

    #[cfg(unix)]
    #[test]
    fn test_permissions() {
        use std::os::unix::fs::PermissionsExt;
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("a.html");
        write_atomic(&target, b"x").unwrap();
        let mode = fs::metadata(&target).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o644);
    }

    #[test]
    fn test_unwritable_target() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("file");
        fs::write(&blocker, b"x").unwrap();
        let err = write_atomic(blocker.join("child.html"), b"x").unwrap_err();
        assert!(matches!(err, EpubError::IoWrite { .. }));
    }
}
