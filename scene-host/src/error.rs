//! # Error 模块
//!
//! Host 层错误类型。

use std::path::PathBuf;

use scene_runtime::SceneError;
use thiserror::Error;

use crate::config::ConfigError;

/// Host 层错误
#[derive(Debug, Error)]
pub enum HostError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("场景错误: {0}")]
    Scene(#[from] SceneError),

    /// 输入脚本读取或解析失败
    #[error("输入脚本 {path} 无效: {message}")]
    InputScript { path: PathBuf, message: String },

    /// 截图保存失败
    #[error("保存截图失败: {path} - {message}")]
    Snapshot { path: PathBuf, message: String },
}

/// Result 类型别名
pub type HostResult<T> = Result<T, HostError>;
