//! # Scene Runtime
//!
//! 对话演出的保留模式场景运行时。
//!
//! ## 核心设计
//!
//! - **纯逻辑**：不读写文件、不打开窗口、不播放声音，外部协作者都是 trait
//! - **显式上下文**：所有状态都在 [`Scene`] 中，回调接收 `&mut Scene`
//! - **逐帧推进**：Host 每帧调用一次 [`Scene::advance`]，不存在阻塞等待
//!
//! ## 模块结构
//!
//! - `timeline`: 补间、周期计时器、缓动
//! - `ui`: 节点、布局、事件、文字
//! - `sprite`: 帧网格动画
//! - `stage`: 背景、对话框、角色编排
//! - `scene`: 场景上下文
//! - `audio` / `assets`: 音频与资源接口
//! - `input`: 单帧输入快照
//! - `geometry`: 基础几何类型
//! - `error`: 错误类型

pub mod assets;
pub mod audio;
pub mod error;
pub mod geometry;
pub mod input;
pub mod scene;
pub mod sprite;
pub mod stage;
pub mod timeline;
pub mod ui;

pub use assets::{AssetLoader, MemoryAssets};
pub use audio::{AudioBackend, PlayRecord, SilentAudio, SoundId};
pub use error::{SceneError, SceneResult};
pub use geometry::{Point, Rect, Vec2};
pub use input::FrameInput;
pub use scene::Scene;
pub use sprite::{Animator, SpriteSheet};
pub use stage::{ActorController, ControllerId, DialogueBox, Motion, Personality, Placement};
pub use timeline::{Easing, LoopId, LoopTick, Timeline, TimerHandle, TweenId};
pub use ui::{
    Alignment, Axis, BlockFont, Canvas, EventKind, Font, FontRef, NodeId, Surface, UiTree,
};
