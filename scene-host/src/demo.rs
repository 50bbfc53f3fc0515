//! # Demo 模块
//!
//! 内置演示场景：教室背景、一个对话框、一名角色从左侧上台。
//! 点击对话框播放按钮音效并说下一句台词。

use std::rc::Rc;

use scene_runtime::{
    AssetLoader, AudioBackend, BlockFont, ControllerId, FontRef, Personality, Placement, Rect,
    Scene, SceneError, SceneResult, Vec2,
};
use tracing::{info, warn};

use crate::config::AppConfig;

pub const BACKGROUND_ALIAS: &str = "classroom";
pub const BACKGROUND_PATH: &str = "bg/classroom.png";
pub const DIALOGUE_BOX_ALIAS: &str = "Basic";
pub const DIALOGUE_BOX_PATH: &str = "ui/textbox.png";
pub const ACTOR_ALIAS: &str = "student";
pub const ACTOR_PATH: &str = "sprite/student.png";
pub const BUTTON_SOUND: &str = "sfx/button.wav";

/// 演示使用的预设名
pub const DEMO_PERSONALITY: &str = "default";

/// 对话框宽度占视口的比例
const DIALOGUE_BOX_SCALE: Vec2 = Vec2::new(0.8, 1.0);
/// 角色高度占视口的比例
const ACTOR_SCALE: f32 = 0.8;

/// 依次说出的台词
pub const DEMO_LINES: &[&str] = &[
    "Good morning! Did you finish the homework from yesterday?",
    "I stayed up late working on it, so I hope it was worth it.",
    "Click the box again if you want to hear me keep talking.",
];

/// 演示场景
#[derive(Debug)]
pub struct Demo {
    pub scene: Scene,
    /// 台上角色的控制器
    pub controller: ControllerId,
}

/// 按配置创建默认字体
pub fn config_font(config: &AppConfig) -> FontRef {
    Rc::new(BlockFont::new(
        "block",
        config.font.advance,
        config.font.line_height,
    ))
}

/// 构建演示场景
///
/// 配置中的说话预设全部登记到角色控制器上；没有 `default` 预设时补一个默认值。
pub fn build_demo(
    config: &AppConfig,
    assets: Box<dyn AssetLoader>,
    audio: Box<dyn AudioBackend>,
) -> SceneResult<Demo> {
    let viewport = Rect::from_size(config.viewport.width, config.viewport.height);
    let mut scene = Scene::new(viewport, assets, audio, config_font(config));

    // 1. 登记资源
    scene.define_background(BACKGROUND_ALIAS, BACKGROUND_PATH)?;
    let dialogue_box =
        scene.define_dialogue_box(DIALOGUE_BOX_ALIAS, DIALOGUE_BOX_PATH, DIALOGUE_BOX_SCALE)?;
    scene.define_actor(ACTOR_ALIAS, ACTOR_PATH, ACTOR_SCALE)?;

    // 2. 切换背景与对话框
    scene.switch_background(BACKGROUND_ALIAS);
    scene.switch_dialogue_box(DIALOGUE_BOX_ALIAS);

    // 3. 角色上台
    let controller = scene
        .add_to_scene(ACTOR_ALIAS, DIALOGUE_BOX_ALIAS, Placement::Left, true)
        .ok_or_else(|| SceneError::unknown_alias("角色", ACTOR_ALIAS))?;
    for (name, preset) in &config.personalities {
        scene.assign_personality(controller, name, preset.to_personality());
    }
    if !config.personalities.contains_key(DEMO_PERSONALITY) {
        scene.assign_personality(controller, DEMO_PERSONALITY, Personality::new());
    }

    // 4. 点击对话框说下一句
    let mut next_line = 0;
    scene
        .nodes_mut()
        .on_click(dialogue_box.panel, move |scene: &mut Scene| {
            match scene.audio_mut().load(BUTTON_SOUND) {
                Ok(sound) => scene.audio_mut().play(sound, 1.0, false),
                Err(e) => warn!(error = %e, "按钮音效加载失败"),
            }
            let line = DEMO_LINES[next_line % DEMO_LINES.len()];
            next_line += 1;
            if scene.say_line(controller, line, DEMO_PERSONALITY) {
                Ok(())
            } else {
                Err(SceneError::callback("台词未能开始"))
            }
        });

    info!(controller = %controller, "演示场景就绪");
    Ok(Demo { scene, controller })
}

#[cfg(test)]
mod tests {
    use image::{Rgba, RgbaImage};
    use scene_runtime::{Canvas, FrameInput, MemoryAssets, SilentAudio};

    use super::*;

    fn demo_assets() -> MemoryAssets {
        MemoryAssets::new()
            .with(BACKGROUND_PATH, RgbaImage::from_pixel(64, 36, Rgba([90, 120, 160, 255])))
            .with(DIALOGUE_BOX_PATH, RgbaImage::from_pixel(100, 20, Rgba([20, 20, 20, 200])))
            .with(ACTOR_PATH, RgbaImage::from_pixel(30, 60, Rgba([240, 200, 180, 255])))
    }

    #[test]
    fn test_demo_setup() {
        let config = AppConfig::default();
        let demo = build_demo(&config, Box::new(demo_assets()), Box::new(SilentAudio::new()))
            .unwrap();
        assert_eq!(demo.scene.staged_actors(), vec![ACTOR_ALIAS]);
        assert_eq!(demo.scene.stage().active_background(), Some(BACKGROUND_ALIAS));
        assert_eq!(
            demo.scene.stage().active_dialogue_box(),
            Some(DIALOGUE_BOX_ALIAS)
        );
        let controller = demo.scene.controller(demo.controller).unwrap();
        assert!(controller.is_functional());
        assert!(controller.personality(DEMO_PERSONALITY).is_some());
    }

    #[test]
    fn test_click_speaks_next_line() {
        let mut config = AppConfig::default();
        config.viewport.width = 400;
        config.viewport.height = 300;
        if let Some(preset) = config.personalities.get_mut(DEMO_PERSONALITY) {
            preset.text_delay = Some(0.0);
        }
        let mut demo =
            build_demo(&config, Box::new(demo_assets()), Box::new(SilentAudio::new())).unwrap();

        let dialogue_box = demo.scene.dialogue_box(DIALOGUE_BOX_ALIAS).unwrap();
        let bounds = demo.scene.nodes().node(dialogue_box.panel).unwrap().bounds();
        let x = bounds.x + bounds.width as i32 / 2;
        let y = bounds.y + bounds.height as i32 / 2;

        let mut canvas = Canvas::new(400, 300);
        let click = FrameInput::idle(0.016).with_pointer(x, y).with_release();
        demo.scene.advance(&click, &mut canvas);

        let text = demo.scene.nodes().node(dialogue_box.text).unwrap();
        assert_eq!(text.text(), Some(DEMO_LINES[0]));
        let button = demo.scene.audio_mut().load(BUTTON_SOUND).unwrap();
        assert!(demo.scene.audio().is_playing(button));
    }

    #[test]
    fn test_missing_asset_fails() {
        let config = AppConfig::default();
        let result = build_demo(
            &config,
            Box::new(MemoryAssets::new()),
            Box::new(SilentAudio::new()),
        );
        assert!(matches!(result, Err(SceneError::AssetLoad { .. })));
    }
}
