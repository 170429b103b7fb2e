// 路径安全守卫
//
// 把用户传入的相对路径解析为基础目录下的绝对路径，防止路径穿越

use std::path::{Component, Path, PathBuf};

use super::types::{FilesystemConfig, FsError, FsErrorCode};

/// 原始输入中禁止出现的片段（含 URL 编码形式）
const FORBIDDEN_PATTERNS: [&str; 6] = ["..", "~", "%2e%2e", "%252e%252e", "%7e", "\0"];

/// 输入路径的分隔符，反斜杠只在 Windows 上是分隔符
#[cfg(windows)]
const SEPARATORS: &[char] = &['/', '\\'];
#[cfg(not(windows))]
const SEPARATORS: &[char] = &['/'];

/// 路径安全守卫
#[derive(Debug, Clone)]
pub struct PathGuard {
    /// 词法规范化后的基础目录
    base: PathBuf,
    /// 是否在词法检查之后再解析符号链接检查一次
    strict: bool,
}

impl PathGuard {
    /// 创建新的路径守卫
    pub fn new(config: &FilesystemConfig) -> Self {
        Self {
            base: lexical_clean(&config.base_path),
            strict: config.strict_containment,
        }
    }

    /// 基础目录
    pub fn base(&self) -> &Path {
        &self.base
    }

    /// 检查原始输入是否包含可疑的穿越序列
    ///
    /// 与 `resolve` 相互独立，HTTP 层在解析之前先调用
    pub fn validate_input(&self, raw: &str) -> Result<(), FsError> {
        let lower = raw.to_lowercase();
        if FORBIDDEN_PATTERNS.iter().any(|p| lower.contains(p)) {
            return Err(FsError::new(FsErrorCode::InvalidPath).with_path(raw));
        }
        Ok(())
    }

    /// 解析相对路径为基础目录下的绝对路径
    ///
    /// 空串、`/`、`.` 均指向基础目录本身。以 `/` 开头的路径视为相对基础目录，
    /// 开头的 `..` 在根处被截断；不以 `/` 开头且向上越过起点的路径直接拒绝。
    pub fn resolve(&self, relative: &str) -> Result<PathBuf, FsError> {
        let parts = split_relative(relative)
            .ok_or_else(|| escape_error(relative))?;

        let mut joined = self.base.clone();
        for part in &parts {
            joined.push(part);
        }
        let joined = lexical_clean(&joined);

        if !joined.starts_with(&self.base) {
            return Err(escape_error(relative));
        }

        if self.strict {
            self.check_canonical(&joined, relative)?;
        }

        Ok(joined)
    }

    /// 判断解析结果是否为基础目录本身
    pub fn is_base(&self, resolved: &Path) -> bool {
        resolved == self.base
    }

    /// 严格模式：解析符号链接后检查是否仍在基础目录内
    ///
    /// 目标不存在时检查最近的已存在祖先
    fn check_canonical(&self, resolved: &Path, raw: &str) -> Result<(), FsError> {
        let base = dunce::canonicalize(&self.base).map_err(|e| {
            FsError::from_io(&e).with_path(self.base.to_string_lossy().to_string())
        })?;

        let existing = resolved.ancestors().find(|p| p.symlink_metadata().is_ok());
        let Some(existing) = existing else {
            return Ok(());
        };

        let canonical = dunce::canonicalize(existing)
            .map_err(|e| FsError::from_io(&e).with_path(raw))?;

        if !canonical.starts_with(&base) {
            tracing::warn!("符号链接指向基础目录之外: {} -> {:?}", raw, canonical);
            return Err(escape_error(raw));
        }
        Ok(())
    }
}

fn escape_error(raw: &str) -> FsError {
    FsError::new(FsErrorCode::InvalidPath)
        .with_message("Invalid path: path escapes base directory")
        .with_path(raw)
}

/// 把输入拆分为普通路径段，折叠 `.` 与 `..`
///
/// 非根路径向上越过起点时返回 None
fn split_relative(input: &str) -> Option<Vec<String>> {
    let rooted = input.starts_with(SEPARATORS);
    let mut parts: Vec<String> = Vec::new();

    for segment in input.split(SEPARATORS) {
        match segment {
            "" | "." => {}
            ".." => {
                if parts.pop().is_none() && !rooted {
                    return None;
                }
            }
            s => parts.push(s.to_string()),
        }
    }
    Some(parts)
}

/// 对路径做纯词法的规范化（不访问文件系统）
pub fn lexical_clean(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for comp in path.components() {
        match comp {
            Component::CurDir => {}
            Component::ParentDir => {
                let popped = matches!(
                    out.components().next_back(),
                    Some(Component::Normal(_))
                ) && out.pop();
                if !popped && !out.has_root() {
                    out.push("..");
                }
            }
            other => out.push(other.as_os_str()),
        }
    }
    if out.as_os_str().is_empty() {
        out.push(".");
    }
    out
}

/// 响应中回显的相对路径形式
///
/// 空串与 `.` 视为根目录 `/`
pub fn display_path(raw: &str) -> String {
    let rooted = raw.starts_with(SEPARATORS);
    let mut parts: Vec<&str> = Vec::new();
    for segment in raw.split(SEPARATORS) {
        match segment {
            "" | "." => {}
            ".." => {
                parts.pop();
            }
            s => parts.push(s),
        }
    }

    if parts.is_empty() {
        return "/".to_string();
    }
    let joined = parts.join("/");
    if rooted {
        format!("/{}", joined)
    } else {
        joined
    }
}

/// 拼接目录显示路径与条目名
pub fn join_display(dir: &str, name: &str) -> String {
    if dir.ends_with('/') {
        format!("{}{}", dir, name)
    } else {
        format!("{}/{}", dir, name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn guard(base: &str) -> PathGuard {
        PathGuard::new(&FilesystemConfig::with_base_path(base))
    }

    #[test]
    fn test_root_inputs_map_to_base() {
        let g = guard("/data");
        for input in ["", "/", ".", "./", "//"] {
            assert_eq!(g.resolve(input).unwrap(), PathBuf::from("/data"), "{:?}", input);
        }
    }

    #[test]
    fn test_resolve_nested_paths() {
        let g = guard("/data");
        assert_eq!(
            g.resolve("docs/readme.md").unwrap(),
            PathBuf::from("/data/docs/readme.md")
        );
        assert_eq!(
            g.resolve("/docs//./notes/").unwrap(),
            PathBuf::from("/data/docs/notes")
        );
        assert_eq!(g.resolve("a/b/../c").unwrap(), PathBuf::from("/data/a/c"));
    }

    #[test]
    fn test_base_is_normalized() {
        let g = guard("/data/./files/");
        assert_eq!(g.base(), Path::new("/data/files"));
        assert_eq!(g.resolve("x").unwrap(), PathBuf::from("/data/files/x"));
    }

    #[test]
    fn test_relative_escape_rejected() {
        for base in ["/", "/data", "/srv/files"] {
            let g = guard(base);
            let err = g.resolve("../x").unwrap_err();
            assert_eq!(err.code, FsErrorCode::InvalidPath, "base {}", base);
            assert!(g.resolve("a/../../x").is_err());
        }
    }

    #[test]
    fn test_rooted_parent_is_clamped() {
        let g = guard("/data");
        assert_eq!(g.resolve("/../x").unwrap(), PathBuf::from("/data/x"));
    }

    #[test]
    fn test_prefix_check_is_component_wise() {
        let g = guard("/data");
        // "/database" 不在 "/data" 之下
        assert!(!PathBuf::from("/database").starts_with(g.base()));
        assert!(g.resolve("base").unwrap().starts_with("/data"));
    }

    #[test]
    fn test_validate_input() {
        let g = guard("/data");
        for bad in ["../etc", "a/..", "~/x", "~", "%2e%2e/etc", "%2E%2E", "%7Eroot", "a\0b"] {
            let err = g.validate_input(bad).unwrap_err();
            assert_eq!(err.code, FsErrorCode::InvalidPath, "{:?}", bad);
        }
        for ok in ["", "/", ".", "/docs/file.txt", "photos/2024"] {
            assert!(g.validate_input(ok).is_ok(), "{:?}", ok);
        }
    }

    #[test]
    fn test_is_base() {
        let g = guard("/data");
        assert!(g.is_base(&g.resolve("/").unwrap()));
        assert!(!g.is_base(&g.resolve("docs").unwrap()));
    }

    #[test]
    fn test_display_path() {
        assert_eq!(display_path(""), "/");
        assert_eq!(display_path("."), "/");
        assert_eq!(display_path("/"), "/");
        assert_eq!(display_path("/docs/"), "/docs");
        assert_eq!(display_path("docs//notes"), "docs/notes");
    }

    #[test]
    fn test_join_display() {
        assert_eq!(join_display("/", "a.txt"), "/a.txt");
        assert_eq!(join_display("/docs", "a.txt"), "/docs/a.txt");
        assert_eq!(join_display("docs", "a.txt"), "docs/a.txt");
    }

    #[cfg(unix)]
    #[test]
    fn test_backslash_is_part_of_the_name() {
        let g = guard("/data");
        assert_eq!(
            g.resolve("dir/a\\b.txt").unwrap(),
            PathBuf::from("/data/dir/a\\b.txt")
        );
        assert_eq!(g.resolve("\\x").unwrap(), PathBuf::from("/data/\\x"));
        assert_eq!(display_path("dir/a\\b.txt"), "dir/a\\b.txt");
    }

    #[cfg(unix)]
    #[test]
    fn test_strict_mode_rejects_symlink_escape() {
        let outside = tempfile::tempdir().unwrap();
        let base = tempfile::tempdir().unwrap();
        std::os::unix::fs::symlink(outside.path(), base.path().join("escape")).unwrap();
        std::fs::create_dir(base.path().join("inside")).unwrap();

        let mut config = FilesystemConfig::with_base_path(base.path());
        let lenient = PathGuard::new(&config);
        assert!(lenient.resolve("escape").is_ok());

        config.strict_containment = true;
        let strict = PathGuard::new(&config);
        let err = strict.resolve("escape/secret.txt").unwrap_err();
        assert_eq!(err.code, FsErrorCode::InvalidPath);
        assert!(strict.resolve("inside").is_ok());
        assert!(strict.resolve("inside/missing.txt").is_ok());
    }

    proptest! {
        #[test]
        fn prop_resolve_stays_under_base(
            segments in proptest::collection::vec("[a-zA-Z0-9_. -]{1,12}", 0..6),
            rooted in any::<bool>(),
        ) {
            let g = guard("/data/files");
            let joined = segments
                .iter()
                .filter(|s| s.as_str() != "..")
                .cloned()
                .collect::<Vec<_>>()
                .join("/");
            let input = if rooted { format!("/{}", joined) } else { joined };

            let resolved = g.resolve(&input).unwrap();
            prop_assert!(resolved.starts_with("/data/files"));
        }

        #[test]
        fn prop_leading_parent_always_rejected(base in "/[a-z]{1,8}(/[a-z]{1,8}){0,3}", tail in "[a-z]{1,8}") {
            let g = guard(&base);
            let up = format!("../{}", tail);
            let home = format!("~/{}", tail);
            prop_assert!(g.resolve(&up).is_err());
            prop_assert!(g.validate_input(&up).is_err());
            prop_assert!(g.validate_input(&home).is_err());
        }
    }
}
