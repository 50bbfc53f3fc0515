//! # Tween 模块
//!
//! 补间实例：值 `from` 到 `to` 在 `duration` 内按缓动曲线变化。
//!
//! 核心设计：补间只关注时间轴和插值，不假设被驱动对象的类型，
//! 结果通过回调交给调用方。

use crate::geometry::Vec2;

use super::easing::{Easing, EasingFn, pin_endpoints};

/// 可插值的值
///
/// 使用 `a * (1 - t) + b * t` 的形式，保证 `t = 0` 和 `t = 1` 时精确取到端点。
pub trait Lerp: Clone + 'static {
    fn lerp(&self, to: &Self, t: f32) -> Self;
}

impl Lerp for f32 {
    fn lerp(&self, to: &Self, t: f32) -> Self {
        self * (1.0 - t) + to * t
    }
}

impl Lerp for (f32, f32) {
    fn lerp(&self, to: &Self, t: f32) -> Self {
        (self.0.lerp(&to.0, t), self.1.lerp(&to.1, t))
    }
}

impl<const N: usize> Lerp for [f32; N] {
    fn lerp(&self, to: &Self, t: f32) -> Self {
        std::array::from_fn(|i| self[i].lerp(&to[i], t))
    }
}

impl Lerp for Vec2 {
    fn lerp(&self, to: &Self, t: f32) -> Self {
        Vec2::new(self.x.lerp(&to.x, t), self.y.lerp(&to.y, t))
    }
}

/// 补间实例
#[derive(Debug, Clone)]
pub struct Tween<V> {
    /// 起始值
    pub from: V,
    /// 目标值
    pub to: V,
    /// 时长（秒），非正数视为 0
    pub duration: f32,
    curve: EasingFn,
    elapsed: f32,
}

impl<V: Lerp> Tween<V> {
    /// 使用内置曲线创建补间（自定义曲线按线性处理）
    pub fn new(duration: f32, from: V, to: V, easing: &Easing) -> Self {
        Self::with_curve(duration, from, to, easing.builtin().unwrap_or(|t| t))
    }

    /// 使用已解析的曲线函数创建补间
    pub fn with_curve(duration: f32, from: V, to: V, curve: EasingFn) -> Self {
        Self {
            from,
            to,
            duration: duration.max(0.0),
            curve,
            elapsed: 0.0,
        }
    }

    /// 已经过的时间
    pub fn elapsed(&self) -> f32 {
        self.elapsed
    }

    /// 推进时间
    pub fn advance(&mut self, dt: f32) {
        self.elapsed += dt.max(0.0);
    }

    /// 指定时刻的线性进度
    fn alpha_at(&self, t: f32) -> f32 {
        if self.duration <= 0.0 {
            1.0
        } else {
            (t / self.duration).clamp(0.0, 1.0)
        }
    }

    /// 当前线性进度（0.0 - 1.0）
    pub fn alpha(&self) -> f32 {
        self.alpha_at(self.elapsed)
    }

    /// 是否已到终点
    pub fn is_finished(&self) -> bool {
        self.alpha() >= 1.0
    }

    /// 指定时刻的值
    pub fn value_at(&self, t: f32) -> V {
        let eased = pin_endpoints(self.curve, self.alpha_at(t));
        self.from.lerp(&self.to, eased)
    }

    /// 当前值
    pub fn value(&self) -> V {
        self.value_at(self.elapsed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoints() {
        let tween = Tween::new(2.0, 0.1_f32, 0.3, &Easing::EaseOutBounce);
        assert_eq!(tween.value_at(0.0), 0.1);
        assert_eq!(tween.value_at(2.0), 0.3);
        assert_eq!(tween.value_at(5.0), 0.3);
    }

    #[test]
    fn test_linear_progress() {
        let mut tween = Tween::new(1.0, 0.0_f32, 10.0, &Easing::Linear);
        tween.advance(0.5);
        assert_eq!(tween.value(), 5.0);
        assert!(!tween.is_finished());
        tween.advance(0.5);
        assert_eq!(tween.value(), 10.0);
        assert!(tween.is_finished());
    }

    #[test]
    fn test_zero_and_negative_duration_snap() {
        let tween = Tween::new(0.0, 1.0_f32, 4.0, &Easing::Linear);
        assert_eq!(tween.alpha(), 1.0);
        assert_eq!(tween.value(), 4.0);

        let tween = Tween::new(-3.0, 1.0_f32, 4.0, &Easing::EaseInQuad);
        assert_eq!(tween.duration, 0.0);
        assert!(tween.is_finished());
    }

    #[test]
    fn test_tuple_and_array_componentwise() {
        let tween = Tween::new(1.0, (0.0_f32, 10.0_f32), (10.0, 0.0), &Easing::Linear);
        assert_eq!(tween.value_at(0.25), (2.5, 7.5));

        let tween = Tween::new(1.0, [0.0_f32, 2.0, 4.0], [4.0, 2.0, 0.0], &Easing::Linear);
        assert_eq!(tween.value_at(0.5), [2.0, 2.0, 2.0]);
    }

    #[test]
    fn test_monotonic_in_time() {
        let tween = Tween::new(1.0, 0.0_f32, 100.0, &Easing::EaseInOutQuad);
        let mut last = tween.value_at(0.0);
        for i in 1..=50 {
            let v = tween.value_at(i as f32 / 50.0);
            assert!(v >= last);
            last = v;
        }
    }
}
