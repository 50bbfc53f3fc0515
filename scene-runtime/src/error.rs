//! # Error 模块
//!
//! 定义 scene-runtime 中使用的错误类型。
//!
//! 核心层不把任何错误视为致命：
//! - 别名/句柄查找失败通过 `Option`/`bool` 返回，不走这里
//! - 回调内部的错误由调用方捕获并记录日志，当前帧的其他对象继续推进
//! - 配置错误记录日志后返回降级对象

use thiserror::Error;

use crate::ui::NodeId;

/// 场景运行时错误
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SceneError {
    /// 别名未定义
    #[error("未知的{kind}别名 '{alias}'")]
    UnknownAlias { kind: &'static str, alias: String },

    /// 节点不存在（已销毁或从未创建）
    #[error("节点 {0} 不存在")]
    NodeNotFound(NodeId),

    /// 节点类型不符合操作要求
    #[error("节点 {node} 不是{expected}节点")]
    WrongNodeKind { node: NodeId, expected: &'static str },

    /// 性格预设未定义
    #[error("未定义的性格预设 '{0}'")]
    UnknownPersonality(String),

    /// 动画轨道未定义
    #[error("动画轨道 '{0}' 不存在")]
    UnknownTrack(String),

    /// 帧网格无效（行列或帧尺寸为 0）
    #[error("无效的帧网格 {columns}x{rows}（帧尺寸 {frame_width}x{frame_height}）")]
    InvalidGrid {
        columns: u32,
        rows: u32,
        frame_width: u32,
        frame_height: u32,
    },

    /// 资源加载失败
    #[error("加载资源失败: {path} - {message}")]
    AssetLoad { path: String, message: String },

    /// 音频后端错误
    #[error("音频错误: {0}")]
    Audio(String),

    /// 用户回调主动报告的失败
    #[error("回调执行失败: {0}")]
    Callback(String),
}

impl SceneError {
    /// 创建别名未定义错误
    pub fn unknown_alias(kind: &'static str, alias: impl Into<String>) -> Self {
        Self::UnknownAlias {
            kind,
            alias: alias.into(),
        }
    }

    /// 创建回调错误
    pub fn callback(message: impl Into<String>) -> Self {
        Self::Callback(message.into())
    }
}

/// Result 类型别名
pub type SceneResult<T> = Result<T, SceneError>;
