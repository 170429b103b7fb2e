// 本地文件系统访问
//
// 对 std::fs 的薄封装，IO 错误在此处映射为错误码

use std::fs::{self, DirEntry, File, Metadata};
use std::io::Read;
use std::path::Path;
use std::time::SystemTime;

use chrono::{DateTime, Utc};

use super::types::{FsError, FsErrorCode};

/// 条目元数据
#[derive(Debug, Clone)]
pub struct EntryMeta {
    pub is_dir: bool,
    pub size: u64,
    pub modified: DateTime<Utc>,
    /// 权限字符串，如 drwxr-xr-x
    pub permissions: String,
}

impl EntryMeta {
    fn from_metadata(metadata: &Metadata) -> Self {
        let modified = metadata
            .modified()
            .unwrap_or(SystemTime::UNIX_EPOCH)
            .into();

        Self {
            is_dir: metadata.is_dir(),
            size: metadata.len(),
            modified,
            permissions: permission_string(metadata),
        }
    }
}

/// 本地文件系统访问器
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalFs;

impl LocalFs {
    pub fn new() -> Self {
        Self
    }

    /// 读取文件内容，最多读取 `limit + 1` 字节
    ///
    /// 返回长度超过 `limit` 说明文件比限制大
    pub fn read_all(&self, path: &Path, limit: u64) -> Result<Vec<u8>, FsError> {
        let file = File::open(path).map_err(|e| io_error(&e, path))?;
        let mut bytes = Vec::new();
        file.take(limit.saturating_add(1))
            .read_to_end(&mut bytes)
            .map_err(|e| io_error(&e, path))?;
        Ok(bytes)
    }

    /// 枚举目录条目（目录枚举顺序）
    ///
    /// 单个条目读取失败时跳过
    pub fn list_dir(&self, path: &Path) -> Result<Vec<DirEntry>, FsError> {
        let read_dir = fs::read_dir(path).map_err(|e| io_error(&e, path))?;
        Ok(read_dir
            .filter_map(|entry| match entry {
                Ok(entry) => Some(entry),
                Err(e) => {
                    tracing::warn!("读取目录条目失败: {:?}, 错误: {}", path, e);
                    None
                }
            })
            .collect())
    }

    /// 获取条目元数据（跟随符号链接）
    pub fn stat(&self, path: &Path) -> Result<EntryMeta, FsError> {
        fs::metadata(path)
            .map(|m| EntryMeta::from_metadata(&m))
            .map_err(|e| io_error(&e, path))
    }

    pub fn is_directory(&self, path: &Path) -> bool {
        path.is_dir()
    }

    pub fn exists(&self, path: &Path) -> bool {
        path.exists()
    }

    /// 条目本身是否存在（不跟随符号链接）
    pub fn exists_no_follow(&self, path: &Path) -> bool {
        fs::symlink_metadata(path).is_ok()
    }

    /// 删除条目：目录递归删除，文件单独删除
    pub fn remove(&self, path: &Path) -> Result<(), FsError> {
        let metadata = fs::symlink_metadata(path).map_err(|e| io_error(&e, path))?;
        let result = if metadata.is_dir() {
            fs::remove_dir_all(path)
        } else {
            fs::remove_file(path)
        };
        result.map_err(|e| io_error(&e, path))
    }
}

fn io_error(err: &std::io::Error, path: &Path) -> FsError {
    let fs_err = FsError::from_io(err).with_path(path.to_string_lossy().to_string());
    if fs_err.code == FsErrorCode::Internal {
        tracing::error!("文件系统操作失败: {:?}, 错误: {}", path, err);
    }
    fs_err
}

/// 生成 Unix 风格的权限字符串
#[cfg(unix)]
fn permission_string(metadata: &Metadata) -> String {
    use std::os::unix::fs::PermissionsExt;

    let mode = metadata.permissions().mode();
    let kind = if metadata.is_dir() { 'd' } else { '-' };

    let mut out = String::with_capacity(10);
    out.push(kind);
    for shift in [6u32, 3, 0] {
        let bits = (mode >> shift) & 0o7;
        out.push(if bits & 0o4 != 0 { 'r' } else { '-' });
        out.push(if bits & 0o2 != 0 { 'w' } else { '-' });
        out.push(if bits & 0o1 != 0 { 'x' } else { '-' });
    }
    out
}

#[cfg(not(unix))]
fn permission_string(metadata: &Metadata) -> String {
    let kind = if metadata.is_dir() { 'd' } else { '-' };
    let write = if metadata.permissions().readonly() { '-' } else { 'w' };
    format!("{}r{}-r{}-r{}-", kind, write, write, write)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stat_and_read() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("a.txt");
        fs::write(&file, b"hello").unwrap();

        let fs = LocalFs::new();
        let meta = fs.stat(&file).unwrap();
        assert!(!meta.is_dir);
        assert_eq!(meta.size, 5);
        assert_eq!(fs.read_all(&file, 1024).unwrap(), b"hello");

        let dir_meta = fs.stat(dir.path()).unwrap();
        assert!(dir_meta.is_dir);
        assert!(fs.is_directory(dir.path()));
        assert!(!fs.is_directory(&file));
    }

    #[test]
    fn test_missing_path_maps_to_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing");
        let fs = LocalFs::new();

        assert!(!fs.exists(&missing));
        assert_eq!(fs.stat(&missing).unwrap_err().code, FsErrorCode::NotFound);
        assert!(!fs.exists_no_follow(&missing));
        assert_eq!(fs.read_all(&missing, 16).unwrap_err().code, FsErrorCode::NotFound);
        assert_eq!(fs.list_dir(&missing).unwrap_err().code, FsErrorCode::NotFound);
        assert_eq!(fs.remove(&missing).unwrap_err().code, FsErrorCode::NotFound);
    }

    #[test]
    fn test_read_all_is_bounded() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("grown.log");
        fs::write(&file, b"hello world").unwrap();

        let fs = LocalFs::new();
        assert_eq!(fs.read_all(&file, 4).unwrap(), b"hello");
        assert_eq!(fs.read_all(&file, 11).unwrap(), b"hello world");
    }

    #[cfg(unix)]
    #[test]
    fn test_exists_no_follow_sees_dangling_link() {
        let dir = tempfile::tempdir().unwrap();
        let link = dir.path().join("dangling");
        std::os::unix::fs::symlink(dir.path().join("gone"), &link).unwrap();

        let fs = LocalFs::new();
        assert!(!fs.exists(&link));
        assert!(fs.exists_no_follow(&link));
    }

    #[test]
    fn test_list_dir() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("a"), b"").unwrap();
        fs::create_dir(dir.path().join("b")).unwrap();

        let mut names: Vec<String> = LocalFs::new()
            .list_dir(dir.path())
            .unwrap()
            .iter()
            .map(|e| e.file_name().to_string_lossy().to_string())
            .collect();
        names.sort();
        assert_eq!(names, vec!["a", "b"]);
    }

    #[test]
    fn test_remove_file_and_tree() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("f.txt");
        let tree = dir.path().join("tree");
        fs::write(&file, b"x").unwrap();
        fs::create_dir_all(tree.join("nested")).unwrap();
        fs::write(tree.join("nested/inner.txt"), b"y").unwrap();

        let fs = LocalFs::new();
        fs.remove(&file).unwrap();
        fs.remove(&tree).unwrap();
        assert!(!fs.exists(&file));
        assert!(!fs.exists(&tree));
    }

    #[cfg(unix)]
    #[test]
    fn test_permission_string() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("p.sh");
        fs::write(&file, b"#!/bin/sh").unwrap();
        fs::set_permissions(&file, fs::Permissions::from_mode(0o754)).unwrap();

        let meta = LocalFs::new().stat(&file).unwrap();
        assert_eq!(meta.permissions, "-rwxr-xr--");

        let dir_meta = LocalFs::new().stat(dir.path()).unwrap();
        assert!(dir_meta.permissions.starts_with('d'));

        // stat 跟随符号链接，报告的是目标的类型
        let link = dir.path().join("link.sh");
        std::os::unix::fs::symlink(&file, &link).unwrap();
        assert_eq!(LocalFs::new().stat(&link).unwrap().permissions, "-rwxr-xr--");
    }
}
