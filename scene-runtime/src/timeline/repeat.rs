//! # Repeat 模块
//!
//! 周期计时器：每经过一个固定间隔触发一次，可选超时。
//!
//! 累计时间用 f64 保存。`0.02`、`1/60` 这类间隔在二进制下不精确，
//! 逐帧相加的和会略小于整倍数，判定时留出间隔的 [`DUE_TOLERANCE`] 倍余量。

/// 触发判定的相对余量
pub const DUE_TOLERANCE: f64 = 1e-4;

/// 周期计时器的时钟部分
///
/// 触发判定基于累计时间和已触发次数（`elapsed >= (count + 1) * interval`），
/// 因此累计触发次数只取决于总时长，与每帧 dt 的切分方式无关。
#[derive(Debug, Clone, PartialEq)]
pub struct Loop {
    interval: f64,
    elapsed: f64,
    count: u32,
    timeout: Option<f64>,
}

impl Loop {
    /// 创建计时器
    pub fn new(interval: f32, timeout: Option<f32>) -> Self {
        Self {
            interval: f64::from(interval),
            elapsed: 0.0,
            count: 0,
            timeout: timeout.map(f64::from),
        }
    }

    /// 触发间隔
    pub fn interval(&self) -> f32 {
        self.interval as f32
    }

    /// 累计时间
    pub fn elapsed(&self) -> f32 {
        self.elapsed as f32
    }

    /// 已触发次数
    pub fn count(&self) -> u32 {
        self.count
    }

    /// 推进时间
    pub fn advance(&mut self, dt: f32) {
        self.elapsed += f64::from(dt.max(0.0));
    }

    /// 是否已超时
    pub fn timed_out(&self) -> bool {
        self.timeout.is_some_and(|limit| self.elapsed >= limit)
    }

    /// 是否应当触发下一次
    pub fn is_due(&self) -> bool {
        let slack = self.interval.max(0.0) * DUE_TOLERANCE;
        self.elapsed + slack >= f64::from(self.count + 1) * self.interval
    }

    /// 记录一次触发，返回新的触发次数
    pub fn trigger(&mut self) -> u32 {
        self.count += 1;
        self.count
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn drain(lp: &mut Loop) -> u32 {
        let mut fired = 0;
        while lp.is_due() {
            lp.trigger();
            fired += 1;
        }
        fired
    }

    #[test]
    fn test_due_after_full_interval() {
        let mut lp = Loop::new(0.5, None);
        assert!(!lp.is_due());
        lp.advance(0.25);
        assert!(!lp.is_due());
        lp.advance(0.25);
        assert!(lp.is_due());
        assert_eq!(lp.trigger(), 1);
        assert!(!lp.is_due());
    }

    #[test]
    fn test_count_independent_of_chunking() {
        let mut whole = Loop::new(0.25, None);
        whole.advance(0.75);
        assert_eq!(drain(&mut whole), 3);

        let mut chunked = Loop::new(0.25, None);
        let mut fired = 0;
        for _ in 0..3 {
            chunked.advance(0.25);
            fired += drain(&mut chunked);
        }
        assert_eq!(fired, 3);
        assert_eq!(whole.count(), chunked.count());
    }

    #[test]
    fn test_inexact_interval_chunking() {
        // (间隔, 每帧 dt, 帧数, 期望触发次数)
        let cases = [
            (0.02, 0.02, 50, 50),
            (1.0 / 60.0, 1.0 / 60.0, 120, 120),
            (0.3, 0.1, 30, 10),
        ];
        for (interval, dt, frames, expected) in cases {
            let mut chunked = Loop::new(interval, None);
            let mut fired = 0;
            for _ in 0..frames {
                chunked.advance(dt);
                fired += drain(&mut chunked);
            }
            assert_eq!(fired, expected, "interval {interval} chunked by {dt}");

            let mut whole = Loop::new(interval, None);
            whole.advance(dt * frames as f32);
            assert_eq!(drain(&mut whole), expected, "interval {interval} in one step");
        }
    }

    #[test]
    fn test_tolerance_does_not_fire_early() {
        let mut lp = Loop::new(0.02, None);
        lp.advance(0.0199);
        assert!(!lp.is_due());
        lp.advance(0.0001);
        assert!(lp.is_due());
    }

    #[test]
    fn test_timeout() {
        let mut lp = Loop::new(0.125, Some(1.0));
        lp.advance(0.75);
        assert!(!lp.timed_out());
        lp.advance(0.25);
        assert!(lp.timed_out());
    }
}
