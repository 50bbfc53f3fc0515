//! # Audio 模块
//!
//! 音频播放接口。解码与混音由 Host 实现，核心层只通过句柄发出指令。

use std::collections::{HashMap, HashSet};

use tracing::debug;

use crate::error::SceneResult;

/// 已加载音频的句柄
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SoundId(u64);

impl SoundId {
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    pub const fn raw(self) -> u64 {
        self.0
    }
}

/// 音频后端
pub trait AudioBackend {
    /// 加载音频；同一路径重复加载返回同一句柄
    fn load(&mut self, path: &str) -> SceneResult<SoundId>;

    /// 播放；音频处于暂停状态时继续播放
    fn play(&mut self, sound: SoundId, volume: f32, looping: bool);

    /// 停止
    fn stop(&mut self, sound: SoundId);

    /// 暂停
    fn pause(&mut self, sound: SoundId);

    /// 是否在播放（暂停也算）
    fn is_playing(&self, sound: SoundId) -> bool;
}

/// 一次播放指令
#[derive(Debug, Clone, PartialEq)]
pub struct PlayRecord {
    pub sound: SoundId,
    pub volume: f32,
    pub looping: bool,
}

/// 不出声的后端，记录所有播放指令
///
/// 用于无头运行和测试。没有时长概念，播放后一直处于播放状态直到 `stop()`。
#[derive(Debug, Default)]
pub struct SilentAudio {
    paths: HashMap<String, SoundId>,
    playing: HashSet<SoundId>,
    history: Vec<PlayRecord>,
}

impl SilentAudio {
    pub fn new() -> Self {
        Self::default()
    }

    /// 所有播放指令
    pub fn history(&self) -> &[PlayRecord] {
        &self.history
    }

    /// 路径对应的句柄
    pub fn sound_for(&self, path: &str) -> Option<SoundId> {
        self.paths.get(path).copied()
    }
}

impl AudioBackend for SilentAudio {
    fn load(&mut self, path: &str) -> SceneResult<SoundId> {
        let next = SoundId::new(self.paths.len() as u64 + 1);
        Ok(*self.paths.entry(path.to_string()).or_insert(next))
    }

    fn play(&mut self, sound: SoundId, volume: f32, looping: bool) {
        debug!(sound = sound.raw(), volume, looping, "播放音频（静音后端）");
        self.playing.insert(sound);
        self.history.push(PlayRecord {
            sound,
            volume,
            looping,
        });
    }

    fn stop(&mut self, sound: SoundId) {
        self.playing.remove(&sound);
    }

    fn pause(&mut self, _sound: SoundId) {}

    fn is_playing(&self, sound: SoundId) -> bool {
        self.playing.contains(&sound)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_silent_audio_dedups_and_records() {
        let mut audio = SilentAudio::new();
        let click = audio.load("sfx/click.wav").unwrap();
        assert_eq!(audio.load("sfx/click.wav").unwrap(), click);
        let talk = audio.load("sfx/talk.wav").unwrap();
        assert_ne!(click, talk);

        audio.play(talk, 0.5, false);
        assert!(audio.is_playing(talk));
        audio.stop(talk);
        assert!(!audio.is_playing(talk));
        assert_eq!(
            audio.history(),
            &[PlayRecord {
                sound: talk,
                volume: 0.5,
                looping: false
            }]
        );
    }
}
