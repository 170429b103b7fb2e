// 文件系统模块数据类型定义

use chrono::{DateTime, Utc};
use serde::Serialize;

// 重新导出配置模块中的 FilesystemConfig
pub use crate::config::FilesystemConfig;

/// 文件系统错误码
///
/// 在错误产生处（路径解析、文件系统访问）确定，HTTP 层按错误码映射状态码
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FsErrorCode {
    /// 路径非法或越出基础目录
    InvalidPath,
    /// 缺少必需参数
    MissingParameter,
    /// 文件或目录不存在
    NotFound,
    /// 权限不足
    PermissionDenied,
    /// 不是目录
    NotADirectory,
    /// 是目录（期望文件）
    IsADirectory,
    /// 文件超过读取上限
    TooLarge,
    /// 请求方法不被允许
    MethodNotAllowed,
    /// 其他未分类错误
    Internal,
}

impl FsErrorCode {
    pub fn message(&self) -> &'static str {
        match self {
            Self::InvalidPath => "Invalid path provided",
            Self::MissingParameter => "File path is required",
            Self::NotFound => "File or directory not found",
            Self::PermissionDenied => "Access denied",
            Self::NotADirectory => "Path is not a directory or does not exist",
            Self::IsADirectory => "Path is a directory",
            Self::TooLarge => "File is too large to open",
            Self::MethodNotAllowed => "Method not allowed",
            Self::Internal => "Internal server error",
        }
    }
}

/// 文件系统错误
#[derive(Debug, thiserror::Error)]
#[error("{message}{}", .path.as_deref().map(|p| format!(": {}", p)).unwrap_or_default())]
pub struct FsError {
    pub code: FsErrorCode,
    pub message: String,
    pub path: Option<String>,
}

impl FsError {
    pub fn new(code: FsErrorCode) -> Self {
        Self {
            message: code.message().to_string(),
            code,
            path: None,
        }
    }

    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    /// 将 IO 错误按错误类型映射为错误码
    pub fn from_io(err: &std::io::Error) -> Self {
        use std::io::ErrorKind;

        let code = match err.kind() {
            ErrorKind::NotFound => FsErrorCode::NotFound,
            ErrorKind::PermissionDenied => FsErrorCode::PermissionDenied,
            ErrorKind::IsADirectory => FsErrorCode::IsADirectory,
            ErrorKind::NotADirectory => FsErrorCode::NotADirectory,
            _ => FsErrorCode::Internal,
        };
        Self::new(code)
    }
}

/// 文件条目
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FileItem {
    /// 文件名
    pub name: String,
    /// 相对基础目录的路径
    pub path: String,
    /// 是否为目录
    pub is_dir: bool,
    /// 文件类别（image / text / archive ...）
    pub file_type: String,
    /// 文件大小（字节）
    pub size: u64,
    /// 修改时间
    pub mod_time: DateTime<Utc>,
    /// 权限字符串，如 -rw-r--r--
    pub permissions: String,
    /// 扩展名（含点号）
    #[serde(skip_serializing_if = "String::is_empty")]
    pub extension: String,
    /// MIME 类型
    pub mime_type: String,
}

/// 列目录响应
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FileListResponse {
    pub success: bool,
    /// 当前目录
    pub path: String,
    /// 条目列表（目录枚举顺序）
    pub items: Vec<FileItem>,
    /// 条目总数
    pub total_items: usize,
    /// 所有条目大小之和
    pub total_size: u64,
    pub request_time: DateTime<Utc>,
}

/// 文件详情响应
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FileDetailsResponse {
    pub success: bool,
    pub name: String,
    pub path: String,
    /// 服务器上的绝对路径
    pub full_path: String,
    pub is_dir: bool,
    pub size: u64,
    pub mod_time: DateTime<Utc>,
    pub mime_type: String,
    pub permissions: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub extension: String,
    pub request_time: DateTime<Utc>,
}

/// 文件内容编码
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ContentEncoding {
    /// 文本内容，按 UTF-8 原样返回
    #[serde(rename = "utf-8")]
    Utf8,
    /// 二进制内容，`content` 为 base64 文本
    #[serde(rename = "binary")]
    Binary,
}

/// 文件内容响应
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FileContentResponse {
    pub success: bool,
    pub name: String,
    pub path: String,
    pub content: String,
    pub size: u64,
    pub mime_type: String,
    pub encoding: ContentEncoding,
    pub request_time: DateTime<Utc>,
}

/// 删除响应
#[derive(Debug, Serialize)]
pub struct DeleteResponse {
    pub success: bool,
    pub message: String,
    pub path: String,
}

/// 原始文件下载描述
///
/// 由服务层解析，HTTP 层据此设置响应头并流式输出
#[derive(Debug, Clone)]
pub struct RawFile {
    /// 服务器上的绝对路径
    pub full_path: std::path::PathBuf,
    /// 文件名
    pub name: String,
    pub mime_type: String,
    pub size: u64,
    pub modified: DateTime<Utc>,
    /// 是否可在浏览器内直接展示
    pub inline: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn test_fs_error_display() {
        let err = FsError::new(FsErrorCode::NotFound).with_path("/missing.txt");
        assert_eq!(err.to_string(), "File or directory not found: /missing.txt");

        let err = FsError::new(FsErrorCode::TooLarge).with_message("too big");
        assert_eq!(err.to_string(), "too big");
    }

    #[test]
    fn test_fs_error_from_io() {
        let not_found = io::Error::new(io::ErrorKind::NotFound, "gone");
        assert_eq!(FsError::from_io(&not_found).code, FsErrorCode::NotFound);

        let denied = io::Error::new(io::ErrorKind::PermissionDenied, "nope");
        assert_eq!(
            FsError::from_io(&denied).code,
            FsErrorCode::PermissionDenied
        );

        let other = io::Error::new(io::ErrorKind::Other, "boom");
        assert_eq!(FsError::from_io(&other).code, FsErrorCode::Internal);
    }

    #[test]
    fn test_encoding_serialization() {
        assert_eq!(
            serde_json::to_string(&ContentEncoding::Utf8).unwrap(),
            "\"utf-8\""
        );
        assert_eq!(
            serde_json::to_string(&ContentEncoding::Binary).unwrap(),
            "\"binary\""
        );
    }
}
