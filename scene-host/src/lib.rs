//! # Scene Host
//!
//! scene-runtime 的宿主层实现。
//!
//! ## 架构说明
//!
//! Host 层负责：
//! - 配置加载
//! - 图片解码
//! - 音频播放
//! - 逐帧驱动与输入注入
//!
//! 场景逻辑全部在 scene-runtime 中，Host 只提供外部协作者的具体实现。

pub mod assets;
pub mod audio;
pub mod config;
pub mod demo;
pub mod driver;
pub mod error;

pub use assets::FsAssets;
pub use audio::{MasterVolume, create_audio};
pub use config::{AppConfig, AudioConfig, ConfigError, FontConfig, PersonalityPreset, ViewportConfig};
pub use demo::{Demo, build_demo};
pub use driver::{HeadlessDriver, RunSummary, ScriptedInput, load_input_script};
pub use error::{HostError, HostResult};

#[cfg(feature = "playback")]
pub use audio::RodioAudio;
