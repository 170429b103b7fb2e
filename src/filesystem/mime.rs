// MIME 类型识别
//
// 扩展名 -> MIME 映射表在启动时构建一次，之后只读共享

use std::collections::HashMap;
use std::path::Path;

/// 目录的 MIME 类型
pub const DIRECTORY_MIME: &str = "inode/directory";

/// 未知扩展名的默认 MIME 类型
pub const DEFAULT_MIME: &str = "application/octet-stream";

/// 按文本处理的结构化类型（前缀匹配）
const TEXTUAL_TYPES: [&str; 7] = [
    "text/",
    "application/json",
    "application/xml",
    "application/javascript",
    "application/typescript",
    "application/x-yaml",
    "application/toml",
];

/// 可在浏览器内直接展示的类型（前缀匹配）
const INLINE_TYPES: [&str; 8] = [
    "image/",
    "video/",
    "audio/",
    "application/pdf",
    "text/",
    "application/json",
    "application/xml",
    "application/javascript",
];

const MIME_ENTRIES: &[(&str, &str)] = &[
    // 文本
    ("txt", "text/plain"),
    ("md", "text/markdown"),
    ("csv", "text/csv"),
    ("log", "text/plain"),
    ("conf", "text/plain"),
    ("cfg", "text/plain"),
    ("ini", "text/plain"),
    // 代码
    ("go", "text/x-go"),
    ("rs", "text/x-rust"),
    ("js", "application/javascript"),
    ("ts", "application/typescript"),
    ("py", "text/x-python"),
    ("java", "text/x-java-source"),
    ("c", "text/x-c"),
    ("cpp", "text/x-c++"),
    ("h", "text/x-c"),
    ("php", "application/x-httpd-php"),
    ("rb", "text/x-ruby"),
    ("sh", "application/x-sh"),
    ("bat", "application/x-bat"),
    ("ps1", "application/x-powershell"),
    // 网页
    ("html", "text/html"),
    ("htm", "text/html"),
    ("css", "text/css"),
    ("scss", "text/x-scss"),
    ("sass", "text/x-sass"),
    ("less", "text/x-less"),
    // 数据
    ("json", "application/json"),
    ("xml", "application/xml"),
    ("yaml", "application/x-yaml"),
    ("yml", "application/x-yaml"),
    ("toml", "application/toml"),
    // 图片
    ("png", "image/png"),
    ("jpg", "image/jpeg"),
    ("jpeg", "image/jpeg"),
    ("gif", "image/gif"),
    ("bmp", "image/bmp"),
    ("svg", "image/svg+xml"),
    ("webp", "image/webp"),
    ("ico", "image/x-icon"),
    // 文档
    ("pdf", "application/pdf"),
    ("doc", "application/msword"),
    (
        "docx",
        "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
    ),
    ("xls", "application/vnd.ms-excel"),
    (
        "xlsx",
        "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
    ),
    ("ppt", "application/vnd.ms-powerpoint"),
    (
        "pptx",
        "application/vnd.openxmlformats-officedocument.presentationml.presentation",
    ),
    // 压缩包
    ("zip", "application/zip"),
    ("tar", "application/x-tar"),
    ("gz", "application/gzip"),
    ("rar", "application/x-rar-compressed"),
    ("7z", "application/x-7z-compressed"),
    // 音视频
    ("mp3", "audio/mpeg"),
    ("wav", "audio/wav"),
    ("mp4", "video/mp4"),
    ("avi", "video/x-msvideo"),
    ("mov", "video/quicktime"),
    // 可执行
    ("exe", "application/x-msdownload"),
    ("msi", "application/x-msi"),
    ("deb", "application/x-debian-package"),
    ("rpm", "application/x-rpm"),
    ("dmg", "application/x-apple-diskimage"),
];

/// 扩展名 -> MIME 映射表
#[derive(Debug, Clone)]
pub struct MimeTable {
    types: HashMap<&'static str, &'static str>,
}

impl Default for MimeTable {
    fn default() -> Self {
        Self::new()
    }
}

impl MimeTable {
    pub fn new() -> Self {
        Self {
            types: MIME_ENTRIES.iter().copied().collect(),
        }
    }

    /// 按小写扩展名查找 MIME 类型，未知类型返回 `application/octet-stream`
    pub fn classify(&self, path: &Path) -> &'static str {
        lowercase_extension(path)
            .and_then(|ext| self.types.get(ext.as_str()).copied())
            .unwrap_or(DEFAULT_MIME)
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}

/// 是否为二进制内容
pub fn is_binary(mime: &str) -> bool {
    !TEXTUAL_TYPES.iter().any(|t| mime.starts_with(t))
}

/// 是否适合在浏览器内直接展示（否则以附件形式下载）
pub fn is_inline(mime: &str) -> bool {
    INLINE_TYPES.iter().any(|t| mime.starts_with(t))
}

fn lowercase_extension(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
}

/// 获取条目的文件类别
pub fn file_category(path: &Path, is_dir: bool) -> &'static str {
    if is_dir {
        return "directory";
    }
    let Some(ext) = lowercase_extension(path) else {
        return "file";
    };
    match ext.as_str() {
        "jpg" | "jpeg" | "png" | "gif" | "bmp" | "webp" | "svg" | "ico" => "image",
        "mp4" | "mkv" | "avi" | "mov" | "wmv" | "flv" | "webm" => "video",
        "mp3" | "wav" | "flac" | "aac" | "ogg" | "wma" => "audio",
        "pdf" | "doc" | "docx" | "xls" | "xlsx" | "ppt" | "pptx" => "document",
        "txt" | "md" | "rtf" | "csv" | "log" | "conf" | "cfg" | "ini" => "text",
        "zip" | "rar" | "7z" | "tar" | "gz" | "bz2" => "archive",
        "rs" | "js" | "ts" | "py" | "java" | "c" | "cpp" | "h" | "go" | "rb" | "php" | "html"
        | "htm" | "css" | "scss" | "sass" | "less" | "json" | "xml" | "yaml" | "yml"
        | "toml" => "code",
        "exe" | "msi" | "bat" | "cmd" | "sh" | "ps1" | "deb" | "rpm" | "dmg" => "executable",
        _ => "file",
    }
}

/// 扩展名（含点号，保留原始大小写），无扩展名时为空串
pub fn extension_of(path: &Path) -> String {
    path.extension()
        .map(|e| format!(".{}", e.to_string_lossy()))
        .unwrap_or_default()
}
