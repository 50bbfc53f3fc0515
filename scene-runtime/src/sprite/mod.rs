//! # Sprite 模块
//!
//! 挂在界面节点上的帧网格动画。
//!
//! - `track`: 精灵表、播放状态与节点上的轨道集合
//! - `animator`: 正在播放的精灵集合与逐帧推进

mod animator;
mod track;

pub use animator::Animator;
pub use track::{Playback, SpriteSheet, SpriteTracks};
