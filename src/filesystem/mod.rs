// 本地文件系统模块
//
// 把配置的基础目录暴露为可浏览、读取、删除的文件树，所有访问都被限制在基础目录内

mod guard;
mod local;
pub mod mime;
mod service;
mod types;

pub use guard::{display_path, join_display, lexical_clean, PathGuard};
pub use local::{EntryMeta, LocalFs};
pub use mime::MimeTable;
pub use service::FileService;
pub use types::*;
