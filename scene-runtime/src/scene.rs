//! # Scene 模块
//!
//! 场景上下文：持有节点集合、时间轴、精灵调度器、编排状态和外部协作者。
//!
//! 所有回调都接收 `&mut Scene`，不存在全局状态。
//!
//! ## 每帧顺序
//!
//! 1. 时间轴：补间（注册顺序）→ 计时器（注册顺序）
//! 2. 界面：按 (z, id) 升序绘制、命中检测、触发事件、重新定位
//! 3. 精灵动画

use image::RgbaImage;
use tracing::trace;

use crate::assets::AssetLoader;
use crate::audio::AudioBackend;
use crate::error::SceneResult;
use crate::geometry::Rect;
use crate::input::FrameInput;
use crate::sprite::Animator;
use crate::stage::Stage;
use crate::timeline::{Timeline, TimelineHost};
use crate::ui::{FontRef, NodeId, Surface, UiHost, UiTree};

/// 场景
pub struct Scene {
    pub(crate) ui: UiTree<Scene>,
    pub(crate) timeline: Timeline<Scene>,
    pub(crate) animator: Animator,
    pub(crate) stage: Stage,
    pub(crate) audio: Box<dyn AudioBackend>,
    pub(crate) assets: Box<dyn AssetLoader>,
    pub(crate) font: FontRef,
    frame: u64,
}

impl std::fmt::Debug for Scene {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scene")
            .field("ui", &self.ui)
            .field("timeline", &self.timeline)
            .field("animator", &self.animator)
            .field("stage", &self.stage)
            .field("frame", &self.frame)
            .finish()
    }
}

impl TimelineHost for Scene {
    fn timeline(&mut self) -> &mut Timeline<Self> {
        &mut self.timeline
    }
}

impl UiHost for Scene {
    fn ui(&mut self) -> &mut UiTree<Self> {
        &mut self.ui
    }
}

impl Scene {
    /// 创建场景
    ///
    /// `viewport` 是渲染分辨率，`font` 是对话文字的默认字体。
    pub fn new(
        viewport: Rect,
        assets: Box<dyn AssetLoader>,
        audio: Box<dyn AudioBackend>,
        font: FontRef,
    ) -> Self {
        Self {
            ui: UiTree::new(viewport),
            timeline: Timeline::new(),
            animator: Animator::new(),
            stage: Stage::new(),
            audio,
            assets,
            font,
            frame: 0,
        }
    }

    /// 推进一帧
    pub fn advance(&mut self, input: &FrameInput, surface: &mut dyn Surface) {
        self.frame += 1;
        trace!(frame = self.frame, dt = input.dt, "推进场景");
        Timeline::advance(self, input.dt);
        UiTree::update_all(self, input, surface);
        self.animator.advance(&mut self.ui, input.dt);
    }

    /// 已推进的帧数
    pub fn frame_count(&self) -> u64 {
        self.frame
    }

    pub fn viewport(&self) -> Rect {
        self.ui.viewport()
    }

    /// 节点集合
    pub fn nodes(&self) -> &UiTree<Scene> {
        &self.ui
    }

    pub fn nodes_mut(&mut self) -> &mut UiTree<Scene> {
        &mut self.ui
    }

    /// 时间轴
    pub fn timers(&self) -> &Timeline<Scene> {
        &self.timeline
    }

    pub fn timers_mut(&mut self) -> &mut Timeline<Scene> {
        &mut self.timeline
    }

    /// 编排状态
    pub fn stage(&self) -> &Stage {
        &self.stage
    }

    pub fn animator(&self) -> &Animator {
        &self.animator
    }

    pub fn audio(&self) -> &dyn AudioBackend {
        self.audio.as_ref()
    }

    pub fn audio_mut(&mut self) -> &mut dyn AudioBackend {
        self.audio.as_mut()
    }

    /// 默认字体
    pub fn font(&self) -> &FontRef {
        &self.font
    }

    /// 通过资源加载器读取图片
    pub fn load_image(&self, path: &str) -> SceneResult<RgbaImage> {
        self.assets.load_image(path)
    }

    /// 播放精灵动画
    pub fn play_animation(&mut self, node: NodeId, track: &str, loops: u32) -> SceneResult<()> {
        self.animator.play(&mut self.ui, node, track, loops)
    }

    /// 停止精灵动画
    pub fn stop_animation(&mut self, node: NodeId) -> bool {
        self.animator.stop(&mut self.ui, node)
    }

    /// 设置精灵动画速度倍率
    pub fn set_animation_speed(&mut self, node: NodeId, speed: f32) -> SceneResult<()> {
        self.animator.set_speed(&mut self.ui, node, speed)
    }
}
