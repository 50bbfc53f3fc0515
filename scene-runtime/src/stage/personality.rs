//! # Personality 模块
//!
//! 角色说话时使用的预设：对话框与立绘的缓动、文字速度、字体和说话音效。

use crate::geometry::Vec2;
use crate::timeline::Easing;
use crate::ui::FontRef;

/// 默认的逐字间隔系数（秒/字）
pub const DEFAULT_CHAR_DELAY: f32 = 0.02;

/// 一段位移动画的参数
#[derive(Debug, Clone, PartialEq)]
pub struct Motion {
    pub easing: Easing,
    pub duration: f32,
    /// 相对静止位置的像素偏移
    pub offset: Vec2,
}

impl Default for Motion {
    fn default() -> Self {
        Self {
            easing: Easing::EaseOutQuad,
            duration: 0.25,
            offset: Vec2::zero(),
        }
    }
}

/// 说话预设
#[derive(Debug, Clone, Default)]
pub struct Personality {
    /// 对话框的位移
    pub box_motion: Motion,
    /// 立绘的位移
    pub actor_motion: Motion,
    /// 固定逐字间隔；`None` 时按文字长度推算
    pub text_delay: Option<f32>,
    /// 对话文字字体；`None` 时使用场景默认字体
    pub font: Option<FontRef>,
    /// 说话音效路径
    pub talk_sound: Option<String>,
}

impl Personality {
    pub fn new() -> Self {
        Self::default()
    }

    /// 对话框偏移
    pub fn with_box_offset(mut self, x: f32, y: f32) -> Self {
        self.box_motion.offset = Vec2::new(x, y);
        self
    }

    /// 立绘偏移
    pub fn with_actor_offset(mut self, x: f32, y: f32) -> Self {
        self.actor_motion.offset = Vec2::new(x, y);
        self
    }

    /// 对话框的缓动和时长
    pub fn with_box_motion(mut self, easing: Easing, duration: f32) -> Self {
        self.box_motion.easing = easing;
        self.box_motion.duration = duration;
        self
    }

    /// 立绘的缓动和时长
    pub fn with_actor_motion(mut self, easing: Easing, duration: f32) -> Self {
        self.actor_motion.easing = easing;
        self.actor_motion.duration = duration;
        self
    }

    pub fn with_text_delay(mut self, delay: Option<f32>) -> Self {
        self.text_delay = delay;
        self
    }

    pub fn with_font(mut self, font: FontRef) -> Self {
        self.font = Some(font);
        self
    }

    pub fn with_talk_sound(mut self, path: impl Into<String>) -> Self {
        self.talk_sound = Some(path.into());
        self
    }

    /// 逐字显示的间隔
    ///
    /// 未设置固定间隔时，总时长为 `0.02 * 字数`，平均到每个字。
    /// 返回 0 表示一次性显示全部文字。
    pub fn char_interval(&self, text: &str) -> f32 {
        if let Some(delay) = self.text_delay {
            return delay;
        }
        let len = text.chars().count();
        if len == 0 {
            return 0.0;
        }
        DEFAULT_CHAR_DELAY * len as f32 / len as f32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_char_interval() {
        let personality = Personality::new();
        assert!((personality.char_interval("Hi") - 0.02).abs() < 1e-6);
        assert_eq!(personality.char_interval(""), 0.0);

        let fixed = Personality::new().with_text_delay(Some(0.1));
        assert_eq!(fixed.char_interval("anything"), 0.1);

        let instant = Personality::new().with_text_delay(Some(0.0));
        assert_eq!(instant.char_interval("Hi"), 0.0);
    }

    #[test]
    fn test_builders() {
        let personality = Personality::new()
            .with_box_offset(30.0, 0.0)
            .with_actor_offset(0.0, -40.0)
            .with_actor_motion(Easing::EaseOutBounce, 0.5)
            .with_talk_sound("sfx/talk.wav");
        assert_eq!(personality.box_motion.offset, Vec2::new(30.0, 0.0));
        assert_eq!(personality.actor_motion.offset, Vec2::new(0.0, -40.0));
        assert_eq!(personality.actor_motion.easing, Easing::EaseOutBounce);
        assert_eq!(personality.box_motion.easing, Easing::EaseOutQuad);
        assert_eq!(personality.talk_sound.as_deref(), Some("sfx/talk.wav"));
    }
}
