//! # Timeline 模块
//!
//! 基于时间的数值插值与周期计时器。
//!
//! ## 模块结构
//!
//! - `easing`: 缓动函数库与命名曲线注册表
//! - `tween`: 单个补间（值、时长、缓动）
//! - `repeat`: 周期计时器的时钟
//! - `system`: 补间/计时器的集合与逐帧推进

mod easing;
mod repeat;
mod system;
mod tween;

pub use easing::{Easing, EasingFn, EasingRegistry};
pub use repeat::Loop;
pub use system::{LoopId, LoopTick, TimelineHost, TimerHandle, Timeline, TweenId};
pub use tween::{Lerp, Tween};
