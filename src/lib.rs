// Homelab File Manager Library
// 把本地目录树通过 HTTP 暴露出来：列表、详情、读取、原始下载、删除

// 配置管理模块
pub mod config;

// 日志模块
pub mod logging;

// 本地文件系统模块
pub mod filesystem;

// Web服务器模块
pub mod server;

// 导出常用类型
pub use config::AppConfig;
pub use filesystem::{FileService, FsError, FsErrorCode, MimeTable, PathGuard};
pub use server::{build_router, AppState};
