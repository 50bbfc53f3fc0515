//! # Config 模块
//!
//! 运行时配置管理，集中管理所有配置项。
//!
//! ## 配置优先级
//!
//! 1. 命令行参数（最高）
//! 2. 配置文件 (config.json)
//! 3. 默认值（最低）

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use scene_runtime::{Easing, Motion, Personality, Vec2};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

/// 应用配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    /// 资源根目录
    #[serde(default = "default_assets_root")]
    pub assets_root: PathBuf,

    /// 渲染分辨率
    #[serde(default)]
    pub viewport: ViewportConfig,

    /// 每秒帧数（无头模式下用于计算每帧 dt）
    #[serde(default = "default_frame_rate")]
    pub frame_rate: u32,

    /// 日志级别（trace/debug/info/warn/error）
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// 内置块字体的度量
    #[serde(default)]
    pub font: FontConfig,

    /// 音频配置
    #[serde(default)]
    pub audio: AudioConfig,

    /// 说话预设，键为预设名
    #[serde(default = "default_personalities")]
    pub personalities: BTreeMap<String, PersonalityPreset>,
}

/// 渲染分辨率
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ViewportConfig {
    #[serde(default = "default_viewport_width")]
    pub width: u32,

    #[serde(default = "default_viewport_height")]
    pub height: u32,
}

/// 字体配置
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FontConfig {
    /// 每个字符的横向步进（像素）
    #[serde(default = "default_font_advance")]
    pub advance: u32,

    /// 行高（像素）
    #[serde(default = "default_font_line_height")]
    pub line_height: u32,
}

/// 音频配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AudioConfig {
    /// 主音量 (0.0 - 1.0)
    #[serde(default = "default_master_volume")]
    pub master_volume: f32,

    /// 是否静音
    #[serde(default)]
    pub muted: bool,

    /// 分组音量 (0.0 - 1.0)，未列出的分组为 1.0
    #[serde(default)]
    pub groups: BTreeMap<String, f32>,

    /// 音频逻辑路径 → 分组名；未列出的音频属于 `default` 分组
    #[serde(default)]
    pub sound_groups: BTreeMap<String, String>,
}

/// 配置文件中的说话预设
///
/// 字体不在配置中出现，说话时使用场景默认字体。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersonalityPreset {
    /// 对话框缓动名称
    #[serde(default = "default_easing")]
    pub box_easing: Easing,

    /// 对话框位移时长（秒）
    #[serde(default = "default_motion_duration")]
    pub box_duration: f32,

    /// 对话框像素偏移
    #[serde(default)]
    pub box_offset: [f32; 2],

    /// 立绘缓动名称
    #[serde(default = "default_easing")]
    pub actor_easing: Easing,

    /// 立绘位移时长（秒）
    #[serde(default = "default_motion_duration")]
    pub actor_duration: f32,

    /// 立绘像素偏移（相对于静止位置）
    #[serde(default)]
    pub actor_offset: [f32; 2],

    /// 固定的逐字间隔；不填时按文字长度推算
    #[serde(default)]
    pub text_delay: Option<f32>,

    /// 说话音效路径
    #[serde(default)]
    pub talk_sound: Option<String>,
}

impl PersonalityPreset {
    /// 转换为运行时的说话预设
    pub fn to_personality(&self) -> Personality {
        Personality {
            box_motion: Motion {
                easing: self.box_easing.clone(),
                duration: self.box_duration,
                offset: Vec2::from(self.box_offset),
            },
            actor_motion: Motion {
                easing: self.actor_easing.clone(),
                duration: self.actor_duration,
                offset: Vec2::from(self.actor_offset),
            },
            text_delay: self.text_delay,
            font: None,
            talk_sound: self.talk_sound.clone(),
        }
    }
}

// 默认值函数
fn default_assets_root() -> PathBuf {
    PathBuf::from("assets")
}

fn default_frame_rate() -> u32 {
    60
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_viewport_width() -> u32 {
    1280
}

fn default_viewport_height() -> u32 {
    720
}

fn default_font_advance() -> u32 {
    8
}

fn default_font_line_height() -> u32 {
    16
}

fn default_master_volume() -> f32 {
    1.0
}

fn default_easing() -> Easing {
    Easing::EaseOutQuad
}

fn default_motion_duration() -> f32 {
    0.25
}

fn default_personalities() -> BTreeMap<String, PersonalityPreset> {
    let mut presets = BTreeMap::new();
    presets.insert(
        "default".to_string(),
        PersonalityPreset {
            box_offset: [30.0, 0.0],
            actor_offset: [0.0, -40.0],
            ..PersonalityPreset::default()
        },
    );
    presets
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            assets_root: default_assets_root(),
            viewport: ViewportConfig::default(),
            frame_rate: default_frame_rate(),
            log_level: default_log_level(),
            font: FontConfig::default(),
            audio: AudioConfig::default(),
            personalities: default_personalities(),
        }
    }
}

impl Default for ViewportConfig {
    fn default() -> Self {
        Self {
            width: default_viewport_width(),
            height: default_viewport_height(),
        }
    }
}

impl Default for FontConfig {
    fn default() -> Self {
        Self {
            advance: default_font_advance(),
            line_height: default_font_line_height(),
        }
    }
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            master_volume: default_master_volume(),
            muted: false,
            groups: BTreeMap::new(),
            sound_groups: BTreeMap::new(),
        }
    }
}

impl Default for PersonalityPreset {
    fn default() -> Self {
        Self {
            box_easing: default_easing(),
            box_duration: default_motion_duration(),
            box_offset: [0.0, 0.0],
            actor_easing: default_easing(),
            actor_duration: default_motion_duration(),
            actor_offset: [0.0, 0.0],
            text_delay: None,
            talk_sound: None,
        }
    }
}

impl AppConfig {
    /// 加载配置文件
    ///
    /// 如果文件不存在或解析失败，返回默认配置并记录警告。
    pub fn load(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();

        if !path.exists() {
            warn!(path = %path.display(), "配置文件不存在，使用默认配置");
            return Self::default();
        }

        match fs::read_to_string(path) {
            Ok(content) => match serde_json::from_str(&content) {
                Ok(config) => {
                    info!(path = %path.display(), "配置文件加载成功");
                    config
                }
                Err(e) => {
                    warn!(error = %e, "配置文件解析失败，使用默认配置");
                    Self::default()
                }
            },
            Err(e) => {
                warn!(error = %e, "配置文件读取失败，使用默认配置");
                Self::default()
            }
        }
    }

    /// 保存配置到文件
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }

    /// 每帧经过的时间（秒）
    pub fn frame_dt(&self) -> f32 {
        1.0 / self.frame_rate.max(1) as f32
    }

    /// 验证配置有效性
    ///
    /// 资源目录不存在不算错误，缺失的图片由占位图代替。
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.viewport.width == 0 || self.viewport.height == 0 {
            return Err(ConfigError::ValidationFailed(format!(
                "渲染分辨率无效: {}x{}",
                self.viewport.width, self.viewport.height
            )));
        }

        if self.frame_rate == 0 {
            return Err(ConfigError::ValidationFailed(
                "帧率必须大于 0".to_string(),
            ));
        }

        if self.font.advance == 0 || self.font.line_height == 0 {
            return Err(ConfigError::ValidationFailed(
                "字体步进和行高必须大于 0".to_string(),
            ));
        }

        if !(0.0..=1.0).contains(&self.audio.master_volume) {
            return Err(ConfigError::ValidationFailed(
                "主音量必须在 0.0 - 1.0 之间".to_string(),
            ));
        }

        for (group, volume) in &self.audio.groups {
            if !(0.0..=1.0).contains(volume) {
                return Err(ConfigError::ValidationFailed(format!(
                    "分组 '{}' 的音量必须在 0.0 - 1.0 之间",
                    group
                )));
            }
        }

        for (name, preset) in &self.personalities {
            if preset.box_duration < 0.0 || preset.actor_duration < 0.0 {
                return Err(ConfigError::ValidationFailed(format!(
                    "预设 '{}' 的时长不能为负",
                    name
                )));
            }
            if preset.text_delay.is_some_and(|delay| delay < 0.0) {
                return Err(ConfigError::ValidationFailed(format!(
                    "预设 '{}' 的逐字间隔不能为负",
                    name
                )));
            }
        }

        Ok(())
    }
}

/// 配置错误
#[derive(Debug, Error)]
pub enum ConfigError {
    /// 序列化失败
    #[error("配置序列化失败: {0}")]
    SerializationFailed(#[from] serde_json::Error),

    /// IO 错误
    #[error("配置 IO 错误: {0}")]
    Io(#[from] std::io::Error),

    /// 验证失败
    #[error("配置验证失败: {0}")]
    ValidationFailed(String),
}
