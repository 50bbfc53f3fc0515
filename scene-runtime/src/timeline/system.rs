//! # System 模块
//!
//! 补间与周期计时器的管理器。
//!
//! 回调接收 `&mut C`（宿主上下文）和当前值：
//! ```rust,ignore
//! let id = scene.timeline.tween(0.3, 0.0, 1.0, &Easing::EaseOutQuad, |scene: &mut Scene, x: f32| {
//!     // 直接修改场景
//!     Ok(())
//! });
//! Timeline::advance(&mut scene, dt);
//! ```
//!
//! 推进期间回调会被临时取出，回调内部可以自由地创建、终止补间或计时器。

use std::fmt;

use tracing::{debug, warn};

use crate::error::SceneResult;

use super::easing::{Easing, EasingFn, EasingRegistry};
use super::repeat::Loop;
use super::tween::{Lerp, Tween};

/// 补间 ID
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TweenId(u64);

/// 周期计时器 ID
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LoopId(u64);

impl fmt::Display for TweenId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "tween#{}", self.0)
    }
}

impl fmt::Display for LoopId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "loop#{}", self.0)
    }
}

/// 补间或计时器的统一句柄
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimerHandle {
    Tween(TweenId),
    Loop(LoopId),
}

impl From<TweenId> for TimerHandle {
    fn from(id: TweenId) -> Self {
        TimerHandle::Tween(id)
    }
}

impl From<LoopId> for TimerHandle {
    fn from(id: LoopId) -> Self {
        TimerHandle::Loop(id)
    }
}

/// 一次计时器触发
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoopTick {
    /// 触发的计时器，回调内可用它终止自己
    pub id: LoopId,
    /// 累计触发次数（从 1 开始）
    pub count: u32,
}

/// 持有 [`Timeline`] 的宿主上下文
pub trait TimelineHost: Sized + 'static {
    fn timeline(&mut self) -> &mut Timeline<Self>;
}

/// 类型擦除后的补间驱动
trait DriveTween<C> {
    /// 推进并回调，返回 (是否到达终点, 回调结果)
    fn step(&mut self, ctx: &mut C, dt: f32) -> (bool, SceneResult<()>);
}

struct Driven<V, F> {
    tween: Tween<V>,
    callback: F,
}

impl<C, V, F> DriveTween<C> for Driven<V, F>
where
    V: Lerp,
    F: FnMut(&mut C, V) -> SceneResult<()>,
{
    fn step(&mut self, ctx: &mut C, dt: f32) -> (bool, SceneResult<()>) {
        self.tween.advance(dt);
        let result = (self.callback)(ctx, self.tween.value());
        (self.tween.is_finished(), result)
    }
}

type Completion<C> = Box<dyn FnOnce(&mut C) -> SceneResult<()>>;
type LoopCallback<C> = Box<dyn FnMut(&mut C, LoopTick) -> SceneResult<()>>;

struct TweenSlot<C> {
    id: TweenId,
    active: bool,
    /// 推进期间为 `None`
    driver: Option<Box<dyn DriveTween<C>>>,
    on_complete: Option<Completion<C>>,
}

struct LoopSlot<C> {
    id: LoopId,
    active: bool,
    clock: Loop,
    /// 推进期间为 `None`
    callback: Option<LoopCallback<C>>,
}

/// 补间与计时器集合
///
/// - 同一帧内补间按注册顺序推进，之后推进计时器
/// - `kill()` 只翻转标记，对象在下一次 `advance()` 开始时回收
/// - 到达终点的补间同样在下一次 `advance()` 时回收
pub struct Timeline<C> {
    tweens: Vec<TweenSlot<C>>,
    loops: Vec<LoopSlot<C>>,
    easings: EasingRegistry,
    next_id: u64,
}

impl<C> Default for Timeline<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C> fmt::Debug for Timeline<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Timeline")
            .field("tweens", &self.tweens.len())
            .field("loops", &self.loops.len())
            .finish()
    }
}

impl<C> Timeline<C> {
    /// 创建空的时间轴
    pub fn new() -> Self {
        Self {
            tweens: Vec::new(),
            loops: Vec::new(),
            easings: EasingRegistry::new(),
            next_id: 1,
        }
    }

    fn next_raw_id(&mut self) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    /// 注册命名缓动曲线
    pub fn register_easing(&mut self, name: impl Into<String>, curve: EasingFn) {
        self.easings.register(name, curve);
    }

    /// 缓动曲线注册表
    pub fn easings(&self) -> &EasingRegistry {
        &self.easings
    }

    /// 创建补间
    ///
    /// 时长为 0 或负数时在下一次推进中直接取终值。
    pub fn tween<V, F>(&mut self, duration: f32, from: V, to: V, easing: &Easing, callback: F) -> TweenId
    where
        V: Lerp,
        F: FnMut(&mut C, V) -> SceneResult<()> + 'static,
        C: 'static,
    {
        let curve = self.easings.resolve(easing);
        let id = TweenId(self.next_raw_id());
        self.tweens.push(TweenSlot {
            id,
            active: true,
            driver: Some(Box::new(Driven {
                tween: Tween::with_curve(duration, from, to, curve),
                callback,
            })),
            on_complete: None,
        });
        id
    }

    /// 设置补间完成回调
    ///
    /// 在补间到达终点的那一次推进中调用一次，被 `kill()` 的补间不会调用。
    pub fn on_complete<F>(&mut self, id: TweenId, callback: F) -> bool
    where
        F: FnOnce(&mut C) -> SceneResult<()> + 'static,
    {
        match self.tweens.iter_mut().find(|slot| slot.id == id && slot.active) {
            Some(slot) => {
                slot.on_complete = Some(Box::new(callback));
                true
            }
            None => false,
        }
    }

    /// 创建周期计时器
    ///
    /// 每累计经过 `interval` 秒触发一次；`timeout` 到达后自动结束。
    pub fn every<F>(&mut self, interval: f32, callback: F, timeout: Option<f32>) -> LoopId
    where
        F: FnMut(&mut C, LoopTick) -> SceneResult<()> + 'static,
    {
        let id = LoopId(self.next_raw_id());
        self.loops.push(LoopSlot {
            id,
            active: true,
            clock: Loop::new(interval, timeout),
            callback: Some(Box::new(callback)),
        });
        id
    }

    /// 终止补间或计时器
    ///
    /// 返回句柄此前是否处于活跃状态。
    pub fn kill(&mut self, handle: impl Into<TimerHandle>) -> bool {
        let active = match handle.into() {
            TimerHandle::Tween(id) => self
                .tweens
                .iter_mut()
                .find(|slot| slot.id == id)
                .map(|slot| &mut slot.active),
            TimerHandle::Loop(id) => self
                .loops
                .iter_mut()
                .find(|slot| slot.id == id)
                .map(|slot| &mut slot.active),
        };
        match active {
            Some(flag) => std::mem::replace(flag, false),
            None => false,
        }
    }

    /// 终止全部对象
    pub fn clear(&mut self) {
        self.tweens.iter_mut().for_each(|slot| slot.active = false);
        self.loops.iter_mut().for_each(|slot| slot.active = false);
    }

    /// 句柄是否仍在集合中（包括等待回收的对象）
    pub fn is_live(&self, handle: impl Into<TimerHandle>) -> bool {
        match handle.into() {
            TimerHandle::Tween(id) => self.tweens.iter().any(|slot| slot.id == id),
            TimerHandle::Loop(id) => self.loops.iter().any(|slot| slot.id == id),
        }
    }

    /// 句柄是否仍会被推进
    pub fn is_active(&self, handle: impl Into<TimerHandle>) -> bool {
        match handle.into() {
            TimerHandle::Tween(id) => self.tweens.iter().any(|slot| slot.id == id && slot.active),
            TimerHandle::Loop(id) => self.loops.iter().any(|slot| slot.id == id && slot.active),
        }
    }

    /// 活跃补间数量
    pub fn tween_count(&self) -> usize {
        self.tweens.iter().filter(|slot| slot.active).count()
    }

    /// 活跃计时器数量
    pub fn loop_count(&self) -> usize {
        self.loops.iter().filter(|slot| slot.active).count()
    }

    /// 计时器累计触发次数
    pub fn loop_triggers(&self, id: LoopId) -> Option<u32> {
        self.loops
            .iter()
            .find(|slot| slot.id == id)
            .map(|slot| slot.clock.count())
    }

    /// 回收上一轮结束或被终止的对象
    fn purge(&mut self) {
        let before = self.tweens.len() + self.loops.len();
        self.tweens.retain(|slot| slot.active);
        self.loops.retain(|slot| slot.active);
        let removed = before - self.tweens.len() - self.loops.len();
        if removed > 0 {
            debug!(removed, "回收已结束的补间/计时器");
        }
    }

    fn take_driver(&mut self, id: TweenId) -> Option<Box<dyn DriveTween<C>>> {
        self.tweens
            .iter_mut()
            .find(|slot| slot.id == id && slot.active)
            .and_then(|slot| slot.driver.take())
    }

    /// 放回驱动；若本次到达终点且未被终止，返回完成回调
    fn restore_driver(
        &mut self,
        id: TweenId,
        driver: Box<dyn DriveTween<C>>,
        finished: bool,
    ) -> Option<Completion<C>> {
        let slot = self.tweens.iter_mut().find(|slot| slot.id == id)?;
        slot.driver = Some(driver);
        if finished && slot.active {
            slot.active = false;
            return slot.on_complete.take();
        }
        None
    }

    /// 推进时钟并取出回调；超时的计时器在这里结束
    fn take_loop_callback(&mut self, id: LoopId, dt: f32) -> Option<(LoopCallback<C>, f32)> {
        let slot = self
            .loops
            .iter_mut()
            .find(|slot| slot.id == id && slot.active)?;
        slot.clock.advance(dt);
        if slot.clock.timed_out() {
            slot.active = false;
            return None;
        }
        let interval = slot.clock.interval();
        slot.callback.take().map(|callback| (callback, interval))
    }

    fn next_tick(&mut self, id: LoopId) -> Option<LoopTick> {
        let slot = self
            .loops
            .iter_mut()
            .find(|slot| slot.id == id && slot.active)?;
        if !slot.clock.is_due() {
            return None;
        }
        Some(LoopTick {
            id,
            count: slot.clock.trigger(),
        })
    }

    fn restore_loop_callback(&mut self, id: LoopId, callback: LoopCallback<C>) {
        if let Some(slot) = self.loops.iter_mut().find(|slot| slot.id == id) {
            slot.callback = Some(callback);
        }
    }
}

impl<C: TimelineHost> Timeline<C> {
    /// 每帧推进
    ///
    /// 顺序：回收 → 补间（注册顺序）→ 计时器（注册顺序）。
    /// 回调返回的错误只记录日志，不影响其他对象。
    pub fn advance(ctx: &mut C, dt: f32) {
        let dt = dt.max(0.0);
        ctx.timeline().purge();

        let tween_ids: Vec<TweenId> = ctx.timeline().tweens.iter().map(|slot| slot.id).collect();
        for id in tween_ids {
            let Some(mut driver) = ctx.timeline().take_driver(id) else {
                continue;
            };
            let (finished, result) = driver.step(ctx, dt);
            if let Err(e) = result {
                warn!(tween = %id, error = %e, "补间回调执行失败");
            }
            if let Some(done) = ctx.timeline().restore_driver(id, driver, finished) {
                if let Err(e) = done(ctx) {
                    warn!(tween = %id, error = %e, "补间完成回调执行失败");
                }
            }
        }

        let loop_ids: Vec<LoopId> = ctx.timeline().loops.iter().map(|slot| slot.id).collect();
        for id in loop_ids {
            Self::advance_loop(ctx, id, dt);
        }
    }

    fn advance_loop(ctx: &mut C, id: LoopId, dt: f32) {
        let Some((mut callback, interval)) = ctx.timeline().take_loop_callback(id, dt) else {
            return;
        };
        // 一帧内跨过多个间隔时逐次补发
        while let Some(tick) = ctx.timeline().next_tick(id) {
            if let Err(e) = callback(ctx, tick) {
                warn!(timer = %id, count = tick.count, error = %e, "计时器回调执行失败");
            }
            if interval <= 0.0 {
                break;
            }
        }
        ctx.timeline().restore_loop_callback(id, callback);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SceneError;

    #[derive(Default)]
    struct Recorder {
        timeline: Timeline<Recorder>,
        values: Vec<f32>,
        ticks: Vec<u32>,
        completions: u32,
    }

    impl TimelineHost for Recorder {
        fn timeline(&mut self) -> &mut Timeline<Self> {
            &mut self.timeline
        }
    }

    fn record(rec: &mut Recorder, v: f32) -> SceneResult<()> {
        rec.values.push(v);
        Ok(())
    }

    #[test]
    fn test_linear_scenario() {
        let mut rec = Recorder::default();
        let id = rec.timeline.tween(1.0, 0.0, 10.0, &Easing::Linear, record);

        Timeline::advance(&mut rec, 0.5);
        assert_eq!(rec.values, vec![5.0]);

        Timeline::advance(&mut rec, 0.5);
        assert_eq!(rec.values, vec![5.0, 10.0]);
        // 到达终点后仍在集合中，等待下一次推进回收
        assert!(rec.timeline.is_live(id));
        assert!(!rec.timeline.is_active(id));

        Timeline::advance(&mut rec, 0.5);
        assert!(!rec.timeline.is_live(id));
        assert_eq!(rec.values.len(), 2);
    }

    #[test]
    fn test_zero_duration_snaps_on_next_advance() {
        let mut rec = Recorder::default();
        rec.timeline.tween(0.0, 3.0, 7.0, &Easing::EaseOutBounce, record);
        assert!(rec.values.is_empty());
        Timeline::advance(&mut rec, 0.0);
        assert_eq!(rec.values, vec![7.0]);
    }

    #[test]
    fn test_kill_defers_removal() {
        let mut rec = Recorder::default();
        let id = rec.timeline.tween(1.0, 0.0, 1.0, &Easing::Linear, record);
        assert!(rec.timeline.kill(id));
        assert!(rec.timeline.is_live(id));
        assert!(!rec.timeline.kill(id));

        Timeline::advance(&mut rec, 0.1);
        assert!(!rec.timeline.is_live(id));
        assert!(rec.values.is_empty());
    }

    #[test]
    fn test_kill_mid_callback_stops_later_tween() {
        let mut rec = Recorder::default();
        let victim = TweenId(2);
        rec.timeline.tween(1.0, 0.0, 1.0, &Easing::Linear, move |p: &mut Recorder, _v: f32| {
            p.timeline.kill(victim);
            Ok(())
        });
        let second = rec.timeline.tween(1.0, 0.0, 1.0, &Easing::Linear, record);
        assert_eq!(second, victim);

        Timeline::advance(&mut rec, 0.1);
        Timeline::advance(&mut rec, 0.1);
        assert!(rec.values.is_empty());
    }

    #[test]
    fn test_callback_error_does_not_stop_others() {
        let mut rec = Recorder::default();
        rec.timeline.tween(1.0, 0.0, 1.0, &Easing::Linear, |_: &mut Recorder, _v: f32| {
            Err(SceneError::callback("boom"))
        });
        rec.timeline.tween(1.0, 0.0, 2.0, &Easing::Linear, record);

        Timeline::advance(&mut rec, 0.5);
        assert_eq!(rec.values, vec![1.0]);
    }

    #[test]
    fn test_registration_order() {
        let mut rec = Recorder::default();
        rec.timeline.tween(1.0, 1.0, 1.0, &Easing::Linear, record);
        rec.timeline.tween(1.0, 2.0, 2.0, &Easing::Linear, record);
        rec.timeline.tween(1.0, 3.0, 3.0, &Easing::Linear, record);
        Timeline::advance(&mut rec, 0.1);
        assert_eq!(rec.values, vec![1.0, 2.0, 3.0]);
    }

    #[test]
    fn test_on_complete_fires_once() {
        let mut rec = Recorder::default();
        let id = rec.timeline.tween(0.5, 0.0, 1.0, &Easing::Linear, record);
        assert!(rec.timeline.on_complete(id, |p: &mut Recorder| {
            p.completions += 1;
            Ok(())
        }));

        for _ in 0..4 {
            Timeline::advance(&mut rec, 0.25);
        }
        assert_eq!(rec.completions, 1);
    }

    #[test]
    fn test_killed_tween_never_completes() {
        let mut rec = Recorder::default();
        let id = rec.timeline.tween(0.5, 0.0, 1.0, &Easing::Linear, record);
        rec.timeline.on_complete(id, |p: &mut Recorder| {
            p.completions += 1;
            Ok(())
        });
        rec.timeline.kill(id);
        Timeline::advance(&mut rec, 1.0);
        assert_eq!(rec.completions, 0);
    }

    #[test]
    fn test_loop_chunking_matches_whole_step() {
        let push = |p: &mut Recorder, tick: LoopTick| -> SceneResult<()> {
            p.ticks.push(tick.count);
            Ok(())
        };

        let mut whole = Recorder::default();
        whole.timeline.every(0.25, push, None);
        Timeline::advance(&mut whole, 0.75);

        let mut chunked = Recorder::default();
        chunked.timeline.every(0.25, push, None);
        for _ in 0..3 {
            Timeline::advance(&mut chunked, 0.25);
        }

        assert_eq!(whole.ticks, vec![1, 2, 3]);
        assert_eq!(chunked.ticks, whole.ticks);
    }

    #[test]
    fn test_loop_frame_rate_chunking() {
        let push = |p: &mut Recorder, tick: LoopTick| -> SceneResult<()> {
            p.ticks.push(tick.count);
            Ok(())
        };

        let mut whole = Recorder::default();
        whole.timeline.every(0.02, push, None);
        Timeline::advance(&mut whole, 1.0);

        let mut chunked = Recorder::default();
        chunked.timeline.every(0.02, push, None);
        for _ in 0..50 {
            Timeline::advance(&mut chunked, 0.02);
        }

        assert_eq!(whole.ticks.len(), 50);
        assert_eq!(chunked.ticks, whole.ticks);
    }

    #[test]
    fn test_loop_self_terminates() {
        let mut rec = Recorder::default();
        let id = rec.timeline.every(
            0.5,
            |p: &mut Recorder, tick: LoopTick| {
                p.ticks.push(tick.count);
                if tick.count == 2 {
                    p.timeline.kill(tick.id);
                }
                Ok(())
            },
            None,
        );

        // 一次跨过 4 个间隔，第 2 次触发后终止
        Timeline::advance(&mut rec, 2.0);
        assert_eq!(rec.ticks, vec![1, 2]);
        assert!(!rec.timeline.is_active(id));

        Timeline::advance(&mut rec, 1.0);
        assert_eq!(rec.ticks, vec![1, 2]);
        assert!(!rec.timeline.is_live(id));
    }

    #[test]
    fn test_loop_timeout() {
        let mut rec = Recorder::default();
        let id = rec.timeline.every(
            0.25,
            |p: &mut Recorder, tick: LoopTick| {
                p.ticks.push(tick.count);
                Ok(())
            },
            Some(0.75),
        );
        Timeline::advance(&mut rec, 0.5);
        assert_eq!(rec.ticks, vec![1, 2]);
        assert_eq!(rec.timeline.loop_triggers(id), Some(2));

        Timeline::advance(&mut rec, 0.25);
        assert_eq!(rec.ticks, vec![1, 2]);
        assert!(!rec.timeline.is_active(id));
    }

    #[test]
    fn test_custom_easing_registration() {
        fn half(t: f32) -> f32 {
            t * 0.5
        }
        let mut rec = Recorder::default();
        rec.timeline.register_easing("half", half);
        rec.timeline.tween(1.0, 0.0, 8.0, &Easing::from("half"), record);
        Timeline::advance(&mut rec, 0.5);
        assert_eq!(rec.values, vec![2.0]);
    }
}
