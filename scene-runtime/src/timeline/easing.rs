//! # Easing 模块
//!
//! 缓动函数库，用于补间的时间插值。
//!
//! 内置曲线是枚举，额外曲线按名字注册到 [`EasingRegistry`]。

use std::collections::HashMap;
use std::f32::consts::PI;
use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::warn;

/// 缓动曲线函数
pub type EasingFn = fn(f32) -> f32;

/// 缓动函数类型
///
/// 序列化为名字字符串（`"linear"`、`"ease_out_quad"`、`"bounce"` 等），
/// 无法识别的名字保留为 `Custom`，在注册表中解析。
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Easing {
    /// 线性（匀速）
    #[default]
    Linear,
    /// 二次缓入
    EaseInQuad,
    /// 二次缓出
    EaseOutQuad,
    /// 二次缓入缓出
    EaseInOutQuad,
    /// 弹性缓出（指数衰减 × 余弦）
    EaseOutElastic,
    /// 弹跳缓出
    EaseOutBounce,
    /// 按名字注册的自定义曲线
    Custom(String),
}

impl Easing {
    /// 曲线名
    pub fn name(&self) -> &str {
        match self {
            Easing::Linear => "linear",
            Easing::EaseInQuad => "ease_in_quad",
            Easing::EaseOutQuad => "ease_out_quad",
            Easing::EaseInOutQuad => "ease_in_out_quad",
            Easing::EaseOutElastic => "elastic",
            Easing::EaseOutBounce => "bounce",
            Easing::Custom(name) => name,
        }
    }

    /// 内置曲线的函数，自定义曲线返回 `None`
    pub fn builtin(&self) -> Option<EasingFn> {
        let f: EasingFn = match self {
            Easing::Linear => linear,
            Easing::EaseInQuad => ease_in_quad,
            Easing::EaseOutQuad => ease_out_quad,
            Easing::EaseInOutQuad => ease_in_out_quad,
            Easing::EaseOutElastic => ease_out_elastic,
            Easing::EaseOutBounce => ease_out_bounce,
            Easing::Custom(_) => return None,
        };
        Some(f)
    }

    /// 计算缓动值（仅内置曲线，自定义曲线按线性处理）
    pub fn apply(&self, t: f32) -> f32 {
        pin_endpoints(self.builtin().unwrap_or(linear), t)
    }
}

impl From<&str> for Easing {
    fn from(name: &str) -> Self {
        match name {
            "linear" => Easing::Linear,
            "ease_in_quad" | "ease_in" => Easing::EaseInQuad,
            "ease_out_quad" | "ease_out" => Easing::EaseOutQuad,
            "ease_in_out_quad" | "ease_in_out" => Easing::EaseInOutQuad,
            "elastic" | "ease_out_elastic" => Easing::EaseOutElastic,
            "bounce" | "ease_out_bounce" => Easing::EaseOutBounce,
            other => Easing::Custom(other.to_string()),
        }
    }
}

impl From<String> for Easing {
    fn from(name: String) -> Self {
        Easing::from(name.as_str())
    }
}

impl From<Easing> for String {
    fn from(easing: Easing) -> Self {
        easing.name().to_string()
    }
}

impl fmt::Display for Easing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// 命名曲线注册表
#[derive(Debug, Clone, Default)]
pub struct EasingRegistry {
    custom: HashMap<String, EasingFn>,
}

impl EasingRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// 注册（或覆盖）一条自定义曲线
    pub fn register(&mut self, name: impl Into<String>, curve: EasingFn) {
        self.custom.insert(name.into(), curve);
    }

    /// 是否已注册
    pub fn contains(&self, name: &str) -> bool {
        self.custom.contains_key(name)
    }

    /// 解析为具体函数
    ///
    /// 未注册的自定义名字回退为线性并记录警告。
    pub fn resolve(&self, easing: &Easing) -> EasingFn {
        if let Some(f) = easing.builtin() {
            return f;
        }
        match self.custom.get(easing.name()) {
            Some(f) => *f,
            None => {
                warn!(easing = %easing, "未注册的缓动曲线，按线性处理");
                linear
            }
        }
    }
}

/// 限制输入并固定端点
///
/// 所有曲线在 0 和 1 处都精确取 0 和 1。
pub(crate) fn pin_endpoints(curve: EasingFn, t: f32) -> f32 {
    if t <= 0.0 {
        0.0
    } else if t >= 1.0 {
        1.0
    } else {
        curve(t)
    }
}

fn linear(t: f32) -> f32 {
    t
}

fn ease_in_quad(t: f32) -> f32 {
    t * t
}

fn ease_out_quad(t: f32) -> f32 {
    1.0 - (1.0 - t) * (1.0 - t)
}

fn ease_in_out_quad(t: f32) -> f32 {
    if t < 0.5 {
        2.0 * t * t
    } else {
        1.0 - (-2.0 * t + 2.0).powi(2) / 2.0
    }
}

/// 弹性缓出
fn ease_out_elastic(t: f32) -> f32 {
    let period = (2.0 * PI) / 0.3;
    1.0 - 2.0_f32.powf(-10.0 * t) * (t * period).cos()
}

/// 弹跳缓出
fn ease_out_bounce(t: f32) -> f32 {
    let n1 = 7.5625;
    let d1 = 2.75;

    if t < 1.0 / d1 {
        n1 * t * t
    } else if t < 2.0 / d1 {
        let t = t - 1.5 / d1;
        n1 * t * t + 0.75
    } else if t < 2.5 / d1 {
        let t = t - 2.25 / d1;
        n1 * t * t + 0.9375
    } else {
        let t = t - 2.625 / d1;
        n1 * t * t + 0.984375
    }
}
