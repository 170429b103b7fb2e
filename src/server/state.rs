// 应用状态

use crate::config::AppConfig;
use crate::filesystem::{FileService, MimeTable};
use std::sync::Arc;

/// 应用全局状态
///
/// 请求之间只共享不可变数据，无需加锁
#[derive(Clone)]
pub struct AppState {
    /// 文件操作服务（持有启动时构建的 MIME 映射表）
    pub file_service: Arc<FileService>,
}

impl AppState {
    /// 创建新的应用状态
    pub fn new(config: &AppConfig) -> Self {
        let mime_table = Arc::new(MimeTable::new());
        Self {
            file_service: Arc::new(FileService::new(&config.filesystem, mime_table)),
        }
    }
}
