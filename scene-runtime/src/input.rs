//! # Input 模块
//!
//! 定义 Host 每帧传给场景的输入快照。
//!
//! ## 设计说明
//!
//! - Host 每帧只读取一次事件队列，整理为 `FrameInput` 后传入
//! - 核心层不读取任何全局状态：经过时间、指针位置、松开事件都在这里
//! - `pointer_releases` 是本帧排队的指针松开次数，点击事件按次数触发

use serde::{Deserialize, Serialize};

use crate::geometry::Point;

/// 单帧输入快照
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct FrameInput {
    /// 距上一帧经过的时间（秒）
    pub dt: f32,
    /// 当前指针位置（渲染分辨率坐标）
    pub pointer: Point,
    /// 本帧排队的指针松开事件数
    pub pointer_releases: u32,
    /// 是否收到退出信号
    pub quit: bool,
}

impl FrameInput {
    /// 只有时间流逝、没有交互的一帧
    pub fn idle(dt: f32) -> Self {
        Self {
            dt,
            ..Default::default()
        }
    }

    /// 设置指针位置
    pub fn with_pointer(mut self, x: i32, y: i32) -> Self {
        self.pointer = Point::new(x, y);
        self
    }

    /// 追加一次指针松开
    pub fn with_release(mut self) -> Self {
        self.pointer_releases += 1;
        self
    }

    /// 标记退出
    pub fn with_quit(mut self) -> Self {
        self.quit = true;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_input_builder() {
        let input = FrameInput::idle(0.016)
            .with_pointer(10, 20)
            .with_release()
            .with_release();
        assert_eq!(input.pointer, Point::new(10, 20));
        assert_eq!(input.pointer_releases, 2);
        assert!(!input.quit);
        assert!(FrameInput::idle(0.0).with_quit().quit);
    }
}
