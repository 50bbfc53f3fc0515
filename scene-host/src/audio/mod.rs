//! # Audio 模块
//!
//! 场景音频后端。
//!
//! ## 功能特性
//!
//! - `playback` feature 开启时使用 rodio 播放，支持后台线程预加载
//! - 没有音频设备或未开启 feature 时退回静音后端
//! - 主音量、分组音量与静音开关由 [`MasterVolume`] 统一处理，与具体后端无关

#[cfg(feature = "playback")]
mod rodio_backend;

#[cfg(feature = "playback")]
pub use rodio_backend::RodioAudio;

use std::collections::HashMap;

use scene_runtime::{AudioBackend, SceneResult, SilentAudio, SoundId};
use tracing::{debug, info, warn};

use crate::assets::normalize_logical_path;
use crate::config::{AppConfig, AudioConfig};

/// 未指定分组的音频所属分组
pub const DEFAULT_GROUP: &str = "default";

/// 主音量包装
///
/// 播放音量依次乘以所属分组的音量和主音量；静音时以音量 0 播放，保持播放状态不变。
/// 分组音量只影响之后的播放，正在播放的音频保持原音量。
#[derive(Debug)]
pub struct MasterVolume<B> {
    inner: B,
    /// 主音量 (0.0 - 1.0)
    volume: f32,
    muted: bool,
    /// 分组 → 音量
    groups: HashMap<String, f32>,
    /// 逻辑路径 → 分组，加载时据此登记句柄
    path_groups: HashMap<String, String>,
    /// 句柄 → 分组
    sound_groups: HashMap<SoundId, String>,
}

impl<B: AudioBackend> MasterVolume<B> {
    pub fn new(inner: B, volume: f32, muted: bool) -> Self {
        Self {
            inner,
            volume: volume.clamp(0.0, 1.0),
            muted,
            groups: HashMap::new(),
            path_groups: HashMap::new(),
            sound_groups: HashMap::new(),
        }
    }

    /// 按音频配置创建，包括分组音量和路径分组
    pub fn from_config(inner: B, config: &AudioConfig) -> Self {
        let mut audio = Self::new(inner, config.master_volume, config.muted);
        for (group, volume) in &config.groups {
            audio.set_group_volume(group, *volume);
        }
        audio.path_groups = config
            .sound_groups
            .iter()
            .map(|(path, group)| (normalize_logical_path(path), group.clone()))
            .collect();
        audio
    }

    pub fn volume(&self) -> f32 {
        self.volume
    }

    /// 设置主音量，超出范围时截断
    pub fn set_volume(&mut self, volume: f32) {
        self.volume = volume.clamp(0.0, 1.0);
    }

    pub fn is_muted(&self) -> bool {
        self.muted
    }

    pub fn set_muted(&mut self, muted: bool) {
        self.muted = muted;
    }

    /// 实际生效的音量
    pub fn effective_volume(&self) -> f32 {
        if self.muted { 0.0 } else { self.volume }
    }

    /// 分组音量，未设置的分组为 1.0
    pub fn group_volume(&self, group: &str) -> f32 {
        self.groups.get(group).copied().unwrap_or(1.0)
    }

    /// 设置分组音量，超出范围时截断
    pub fn set_group_volume(&mut self, group: &str, volume: f32) {
        self.groups.insert(group.to_string(), volume.clamp(0.0, 1.0));
    }

    /// 把音频放入分组
    pub fn assign_group(&mut self, sound: SoundId, group: &str) {
        self.sound_groups.insert(sound, group.to_string());
    }

    /// 音频所属分组
    pub fn group_of(&self, sound: SoundId) -> &str {
        self.sound_groups
            .get(&sound)
            .map(String::as_str)
            .unwrap_or(DEFAULT_GROUP)
    }

    pub fn inner(&self) -> &B {
        &self.inner
    }

    pub fn inner_mut(&mut self) -> &mut B {
        &mut self.inner
    }
}

impl<B: AudioBackend> AudioBackend for MasterVolume<B> {
    fn load(&mut self, path: &str) -> SceneResult<SoundId> {
        let sound = self.inner.load(path)?;
        if let Some(group) = self.path_groups.get(&normalize_logical_path(path)) {
            debug!(path, group = %group, "音频加入分组");
            self.sound_groups.insert(sound, group.clone());
        }
        Ok(sound)
    }

    fn play(&mut self, sound: SoundId, volume: f32, looping: bool) {
        let group = self.group_volume(self.group_of(sound));
        let volume = volume.clamp(0.0, 1.0) * group * self.effective_volume();
        self.inner.play(sound, volume, looping);
    }

    fn stop(&mut self, sound: SoundId) {
        self.inner.stop(sound);
    }

    fn pause(&mut self, sound: SoundId) {
        self.inner.pause(sound);
    }

    fn is_playing(&self, sound: SoundId) -> bool {
        self.inner.is_playing(sound)
    }
}

/// 根据配置创建音频后端
///
/// `headless` 为 `true` 时不尝试打开音频设备。
/// `preload` 中的音频在 rodio 后端上由后台线程预先读取。
pub fn create_audio(config: &AppConfig, headless: bool, preload: &[&str]) -> Box<dyn AudioBackend> {
    let volume = config.audio.master_volume;
    let muted = config.audio.muted;
    let groups = config.audio.groups.len();

    #[cfg(feature = "playback")]
    if !headless {
        match RodioAudio::new(&config.assets_root) {
            Ok(mut audio) => {
                info!("音频系统初始化成功");
                for path in preload {
                    audio.load_async(path);
                }
                return Box::new(MasterVolume::from_config(audio, &config.audio));
            }
            Err(e) => warn!(error = %e, "音频系统初始化失败，使用静音后端"),
        }
    }

    #[cfg(not(feature = "playback"))]
    if !headless {
        warn!("未启用 playback feature，使用静音后端");
    }

    info!(volume, muted, groups, "使用静音音频后端");
    let mut audio = MasterVolume::from_config(SilentAudio::new(), &config.audio);
    for path in preload {
        if let Err(e) = audio.load(path) {
            warn!(path, error = %e, "音频预加载失败");
        }
    }
    Box::new(audio)
}
