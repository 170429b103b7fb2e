// 文件操作服务
//
// 组合路径守卫、MIME 识别和本地文件系统访问，实现列表/详情/读取/删除/原始下载

use std::path::Path;
use std::sync::Arc;

use base64::Engine;
use chrono::Utc;
use tracing::{info, warn};

use super::guard::{display_path, join_display, PathGuard};
use super::local::LocalFs;
use super::mime::{self, MimeTable, DIRECTORY_MIME};
use super::types::*;

/// 文件操作服务
#[derive(Debug, Clone)]
pub struct FileService {
    guard: PathGuard,
    fs: LocalFs,
    mime: Arc<MimeTable>,
    max_open_size: u64,
}

impl FileService {
    /// 创建新的文件操作服务
    pub fn new(config: &FilesystemConfig, mime: Arc<MimeTable>) -> Self {
        Self {
            guard: PathGuard::new(config),
            fs: LocalFs::new(),
            mime,
            max_open_size: config.max_open_size,
        }
    }

    pub fn guard(&self) -> &PathGuard {
        &self.guard
    }

    /// 列出目录内容
    pub fn list(&self, path: &str) -> Result<FileListResponse, FsError> {
        let full_path = self.guard.resolve(path)?;
        let shown = display_path(path);

        if !self.fs.is_directory(&full_path) {
            let code = if self.fs.exists(&full_path) {
                FsErrorCode::NotADirectory
            } else {
                FsErrorCode::NotFound
            };
            return Err(FsError::new(code).with_path(shown));
        }

        let entries = self.fs.list_dir(&full_path)?;

        let mut items = Vec::with_capacity(entries.len());
        let mut total_size = 0u64;
        for entry in entries {
            let entry_path = entry.path();
            let meta = match self.fs.stat(&entry_path) {
                Ok(meta) => meta,
                Err(e) => {
                    // 例如指向不存在目标的符号链接
                    warn!("跳过无法读取元数据的条目: {:?}, 错误: {}", entry_path, e);
                    continue;
                }
            };

            let name = entry.file_name().to_string_lossy().to_string();
            total_size += meta.size;
            items.push(FileItem {
                path: join_display(&shown, &name),
                is_dir: meta.is_dir,
                file_type: mime::file_category(&entry_path, meta.is_dir).to_string(),
                size: meta.size,
                mod_time: meta.modified,
                permissions: meta.permissions,
                extension: extension_for(&entry_path, meta.is_dir),
                mime_type: self.mime_for(&entry_path, meta.is_dir).to_string(),
                name,
            });
        }

        info!("列出目录: {} ({} 个条目)", shown, items.len());

        Ok(FileListResponse {
            success: true,
            path: shown,
            total_items: items.len(),
            items,
            total_size,
            request_time: Utc::now(),
        })
    }

    /// 获取单个文件/目录的详细信息
    pub fn details(&self, path: &str) -> Result<FileDetailsResponse, FsError> {
        let full_path = self.guard.resolve(path)?;
        let shown = display_path(path);

        let meta = self.fs.stat(&full_path).map_err(|e| match e.code {
            FsErrorCode::PermissionDenied => e,
            _ => FsError::new(FsErrorCode::NotFound).with_path(shown.clone()),
        })?;

        Ok(FileDetailsResponse {
            success: true,
            name: entry_name(&full_path),
            full_path: full_path.to_string_lossy().to_string(),
            is_dir: meta.is_dir,
            size: meta.size,
            mod_time: meta.modified,
            mime_type: self.mime_for(&full_path, meta.is_dir).to_string(),
            permissions: meta.permissions,
            extension: extension_for(&full_path, meta.is_dir),
            path: shown,
            request_time: Utc::now(),
        })
    }

    /// 读取文件内容
    ///
    /// 二进制文件的内容以 base64 返回，编码标记为 `binary`
    pub fn open(&self, path: &str) -> Result<FileContentResponse, FsError> {
        let full_path = self.guard.resolve(path)?;
        let shown = display_path(path);

        let meta = self.fs.stat(&full_path).map_err(|e| e.with_path(shown.clone()))?;
        if meta.is_dir {
            return Err(FsError::new(FsErrorCode::IsADirectory)
                .with_message("Cannot open a directory")
                .with_path(shown));
        }
        if meta.size > self.max_open_size {
            return Err(self.too_large(meta.size, shown));
        }

        // 文件可能在 stat 之后增长，读取时再限制一次
        let bytes = self.fs.read_all(&full_path, self.max_open_size)?;
        if bytes.len() as u64 > self.max_open_size {
            return Err(self.too_large(bytes.len() as u64, shown));
        }
        let mime_type = self.mime.classify(&full_path);

        let (content, encoding) = if mime::is_binary(mime_type) {
            (
                base64::engine::general_purpose::STANDARD.encode(&bytes),
                ContentEncoding::Binary,
            )
        } else {
            (
                String::from_utf8_lossy(&bytes).into_owned(),
                ContentEncoding::Utf8,
            )
        };

        info!("读取文件: {} ({} 字节, {})", shown, bytes.len(), mime_type);

        Ok(FileContentResponse {
            success: true,
            name: entry_name(&full_path),
            path: shown,
            content,
            size: bytes.len() as u64,
            mime_type: mime_type.to_string(),
            encoding,
            request_time: Utc::now(),
        })
    }

    /// 删除文件或目录（目录递归删除）
    pub fn delete(&self, path: &str) -> Result<DeleteResponse, FsError> {
        let full_path = self.guard.resolve(path)?;
        let shown = display_path(path);

        if self.guard.is_base(&full_path) {
            return Err(FsError::new(FsErrorCode::InvalidPath)
                .with_message("Cannot delete the base directory")
                .with_path(shown));
        }

        // 不跟随符号链接，失效的链接本身也可以删除
        if !self.fs.exists_no_follow(&full_path) {
            return Err(FsError::new(FsErrorCode::NotFound).with_path(shown));
        }

        self.fs.remove(&full_path)?;
        info!("已删除: {}", shown);

        Ok(DeleteResponse {
            success: true,
            message: "File deleted successfully".to_string(),
            path: shown,
        })
    }

    /// 解析原始下载所需的信息
    pub fn raw(&self, path: &str) -> Result<RawFile, FsError> {
        let full_path = self.guard.resolve(path)?;
        let shown = display_path(path);

        let meta = self.fs.stat(&full_path).map_err(|e| e.with_path(shown.clone()))?;
        if meta.is_dir {
            return Err(FsError::new(FsErrorCode::IsADirectory)
                .with_message("Cannot serve a directory")
                .with_path(shown));
        }

        let mime_type = self.mime.classify(&full_path);
        Ok(RawFile {
            name: entry_name(&full_path),
            mime_type: mime_type.to_string(),
            size: meta.size,
            modified: meta.modified,
            inline: mime::is_inline(mime_type),
            full_path,
        })
    }

    fn too_large(&self, size: u64, shown: String) -> FsError {
        FsError::new(FsErrorCode::TooLarge)
            .with_message(format!(
                "File is too large to open ({} bytes, limit {} bytes)",
                size, self.max_open_size
            ))
            .with_path(shown)
    }

    fn mime_for(&self, path: &Path, is_dir: bool) -> &'static str {
        if is_dir {
            DIRECTORY_MIME
        } else {
            self.mime.classify(path)
        }
    }
}

fn entry_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| "/".to_string())
}

fn extension_for(path: &Path, is_dir: bool) -> String {
    if is_dir {
        String::new()
    } else {
        mime::extension_of(path)
    }
}
