//! # UI 模块
//!
//! 保留模式的界面节点：锚点/比例/像素定位、按 z 序绘制、悬停/离开/点击事件。
//!
//! ## 模块结构
//!
//! - `surface`: 绘制目标抽象与 RGBA 画布
//! - `font`: 字体抽象与内置块字体
//! - `text`: 贪心自动换行与文字渲染
//! - `node`: 单个节点（布局、缩放、事件状态）
//! - `tree`: 节点集合与逐帧更新
//!
//! ## 定位公式
//!
//! ```text
//! x = parent.x + scale.x * parent.width  + pixel.x - anchor.x * width
//! y = parent.y + scale.y * parent.height + pixel.y - anchor.y * height
//! ```
//!
//! 锚点只取决于节点当前尺寸，多次设置或缩放后再设置结果一致。

mod font;
mod node;
mod surface;
mod text;
mod tree;

use std::fmt;

use serde::{Deserialize, Serialize};

pub use font::{BlockFont, Font, FontRef};
pub use node::{Node, NodeKind};
pub use surface::{Canvas, Surface};
pub use text::{Alignment, TextBlock, wrap_text};
pub use tree::{UiHost, UiTree};

/// 节点 ID
///
/// 单调递增，销毁后不会复用。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(u64);

impl NodeId {
    pub(crate) const fn new(raw: u64) -> Self {
        Self(raw)
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "node#{}", self.0)
    }
}

/// 节点事件类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    /// 指针进入
    Hover,
    /// 指针离开
    Leave,
    /// 指针在节点内松开
    Click,
}

/// 事件绑定句柄，用于解绑
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Binding {
    pub node: NodeId,
    pub kind: EventKind,
    pub(crate) slot: u64,
}

/// 缩放时保持不变的轴
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Axis {
    /// 保持宽度，按比例计算高度
    #[default]
    X,
    /// 保持高度，按比例计算宽度
    Y,
}
