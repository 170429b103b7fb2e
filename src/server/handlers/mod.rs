// API处理器模块

pub mod files;

pub use files::*;
