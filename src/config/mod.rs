// 配置管理模块

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tokio::fs;

/// 默认配置文件路径
pub const DEFAULT_CONFIG_PATH: &str = "config/app.toml";

/// 指定配置文件路径的环境变量
pub const ENV_CONFIG_PATH: &str = "FILE_MANAGER_CONFIG";
/// 基础目录环境变量
pub const ENV_BASE_PATH: &str = "FILE_MANAGER_BASE_PATH";
/// 监听地址环境变量
pub const ENV_HOST: &str = "HOST";
/// 监听端口环境变量
pub const ENV_PORT: &str = "PORT";

/// 应用配置
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppConfig {
    /// 服务器配置
    #[serde(default)]
    pub server: ServerConfig,
    /// 文件系统配置
    #[serde(default)]
    pub filesystem: FilesystemConfig,
    /// 日志配置
    #[serde(default)]
    pub log: LogConfig,
}

/// 服务器配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// 监听地址
    #[serde(default = "default_host")]
    pub host: String,
    /// 监听端口
    #[serde(default = "default_port")]
    pub port: u16,
    /// 收到关闭信号后等待请求结束的最长时间（秒）
    #[serde(default = "default_shutdown_timeout_secs")]
    pub shutdown_timeout_secs: u64,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_shutdown_timeout_secs() -> u64 {
    10
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            shutdown_timeout_secs: default_shutdown_timeout_secs(),
        }
    }
}

impl ServerConfig {
    /// 监听地址（host:port）
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// 文件系统配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FilesystemConfig {
    /// 基础目录，所有操作都被限制在该目录内
    #[serde(default = "default_base_path")]
    pub base_path: PathBuf,
    /// 读取文本内容时允许的最大文件大小（字节，默认 10MB）
    #[serde(default = "default_max_open_size")]
    pub max_open_size: u64,
    /// 严格模式：解析符号链接后再做一次包含检查
    #[serde(default)]
    pub strict_containment: bool,
}

fn default_base_path() -> PathBuf {
    PathBuf::from("/data")
}

fn default_max_open_size() -> u64 {
    10 * 1024 * 1024 // 10MB
}

impl Default for FilesystemConfig {
    fn default() -> Self {
        Self {
            base_path: default_base_path(),
            max_open_size: default_max_open_size(),
            strict_containment: false,
        }
    }
}

impl FilesystemConfig {
    /// 以指定基础目录创建配置，其余字段使用默认值
    pub fn with_base_path(base_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: base_path.into(),
            ..Default::default()
        }
    }
}

/// 日志配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogConfig {
    /// 是否启用日志文件持久化
    #[serde(default = "default_log_enabled")]
    pub enabled: bool,
    /// 日志文件保存目录
    #[serde(default = "default_log_dir")]
    pub log_dir: PathBuf,
    /// 日志保留天数（按天滚动，最多保留的文件数）
    #[serde(default = "default_log_retention_days")]
    pub retention_days: u32,
    /// 日志级别（默认 info）
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_log_enabled() -> bool {
    false
}

fn default_log_dir() -> PathBuf {
    PathBuf::from("logs")
}

fn default_log_retention_days() -> u32 {
    7
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            enabled: default_log_enabled(),
            log_dir: default_log_dir(),
            retention_days: default_log_retention_days(),
            level: default_log_level(),
        }
    }
}

impl AppConfig {
    /// 从文件加载配置
    pub async fn load_from_file(path: &str) -> Result<Self> {
        let content = fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read config file: {}", path))?;

        let config: AppConfig = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path))?;

        Ok(config)
    }

    /// 加载配置，仅在文件不存在时使用默认配置
    ///
    /// 文件存在但无法读取或解析时返回错误
    pub async fn load_or_default(path: &str) -> Result<Self> {
        match Self::load_from_file(path).await {
            Ok(config) => Ok(config),
            Err(e) if is_not_found(&e) => Ok(Self::default()),
            Err(e) => Err(e),
        }
    }

    /// 完整加载流程：配置文件 -> 环境变量覆盖 -> 校验
    pub async fn load() -> Result<Self> {
        let path =
            std::env::var(ENV_CONFIG_PATH).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
        let mut config = Self::load_or_default(&path).await?;
        config.apply_env_overrides(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// 用环境变量覆盖配置
    ///
    /// `lookup` 通常是 `std::env::var`，测试中可以替换为固定映射
    pub fn apply_env_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(base) = lookup(ENV_BASE_PATH).filter(|v| !v.trim().is_empty()) {
            self.filesystem.base_path = PathBuf::from(base.trim());
        }

        if let Some(host) = lookup(ENV_HOST).filter(|v| !v.trim().is_empty()) {
            self.server.host = host.trim().to_string();
        }

        if let Some(port) = lookup(ENV_PORT).filter(|v| !v.trim().is_empty()) {
            self.server.port = port
                .trim()
                .parse()
                .with_context(|| format!("Invalid {} value: {}", ENV_PORT, port))?;
        }

        Ok(())
    }

    /// 校验配置
    pub fn validate(&self) -> Result<()> {
        if !self.filesystem.base_path.is_absolute() {
            anyhow::bail!(
                "Base path must be absolute: {:?}",
                self.filesystem.base_path
            );
        }
        if self.filesystem.max_open_size == 0 {
            anyhow::bail!("filesystem.max_open_size must be greater than 0");
        }
        Ok(())
    }
}

fn is_not_found(err: &anyhow::Error) -> bool {
    err.downcast_ref::<std::io::Error>()
        .is_some_and(|e| e.kind() == std::io::ErrorKind::NotFound)
}
