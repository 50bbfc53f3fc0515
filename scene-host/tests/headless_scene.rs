//! # 无头运行集成测试
//!
//! 在临时目录中准备配置、图片和输入脚本，完整走一遍 Host 启动流程。

use std::path::Path;

use image::{Rgba, RgbaImage};
use scene_host::demo::{
    ACTOR_PATH, BACKGROUND_PATH, DEMO_LINES, DIALOGUE_BOX_ALIAS, DIALOGUE_BOX_PATH,
};
use scene_host::{
    AppConfig, FsAssets, HeadlessDriver, MasterVolume, ScriptedInput, build_demo, create_audio,
    load_input_script,
};
use scene_runtime::{AudioBackend, SilentAudio};

/// 写入一张纯色 PNG
fn write_png(root: &Path, relative: &str, width: u32, height: u32, color: [u8; 4]) {
    let path = root.join(relative);
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    RgbaImage::from_pixel(width, height, Rgba(color))
        .save(path)
        .unwrap();
}

/// 准备资源目录和配置
fn prepare(root: &Path) -> AppConfig {
    let assets = root.join("assets");
    write_png(&assets, BACKGROUND_PATH, 64, 36, [90, 120, 160, 255]);
    write_png(&assets, DIALOGUE_BOX_PATH, 100, 20, [20, 20, 20, 255]);
    write_png(&assets, ACTOR_PATH, 30, 60, [240, 200, 180, 255]);

    let mut config = AppConfig::default();
    config.assets_root = assets;
    config.viewport.width = 320;
    config.viewport.height = 180;
    config.frame_rate = 50;
    if let Some(preset) = config.personalities.get_mut("default") {
        preset.text_delay = Some(0.0);
    }
    config
}

#[test]
fn test_config_round_trip_on_disk() {
    let dir = tempfile::tempdir().unwrap();
    let config = prepare(dir.path());
    let path = dir.path().join("config.json");

    // 1. 保存并重新加载
    config.save(&path).unwrap();
    let loaded = AppConfig::load(&path);
    assert_eq!(loaded, config);
    assert!(loaded.validate().is_ok());

    // 2. 损坏的文件退回默认配置
    std::fs::write(&path, "{ broken").unwrap();
    assert_eq!(AppConfig::load(&path), AppConfig::default());

    // 3. 不存在的文件退回默认配置
    assert_eq!(
        AppConfig::load(dir.path().join("missing.json")),
        AppConfig::default()
    );
}

#[test]
fn test_audio_groups_from_config_file() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = prepare(dir.path());
    config.audio.master_volume = 0.5;
    config.audio.groups.insert("voice".to_string(), 0.4);
    config
        .audio
        .sound_groups
        .insert("sfx/talk.wav".to_string(), "voice".to_string());
    let path = dir.path().join("config.json");
    config.save(&path).unwrap();

    let loaded = AppConfig::load(&path);
    assert_eq!(loaded.audio, config.audio);
    let mut audio = MasterVolume::from_config(SilentAudio::new(), &loaded.audio);

    let talk = audio.load("sfx/talk.wav").unwrap();
    let button = audio.load(scene_host::demo::BUTTON_SOUND).unwrap();
    audio.play(talk, 1.0, false);
    audio.play(button, 1.0, false);
    let volumes: Vec<f32> = audio.inner().history().iter().map(|r| r.volume).collect();
    assert_eq!(volumes, vec![0.2, 0.5]);
}

#[test]
fn test_headless_run_with_click_and_snapshot() {
    let dir = tempfile::tempdir().unwrap();
    let config = prepare(dir.path());

    // 1. 构建演示场景
    let assets = FsAssets::new(&config.assets_root);
    let audio = create_audio(&config, true, &[]);
    let demo = build_demo(&config, Box::new(assets), audio).unwrap();
    let dialogue_box = demo.scene.dialogue_box(DIALOGUE_BOX_ALIAS).unwrap();
    let bounds = demo.scene.nodes().node(dialogue_box.panel).unwrap().bounds();
    let (x, y) = (
        bounds.x + bounds.width as i32 / 2,
        bounds.y + bounds.height as i32 / 2,
    );

    // 2. 写入输入脚本：第 60 帧点击对话框
    let script_path = dir.path().join("input.json");
    let script = vec![
        ScriptedInput {
            frame: 59,
            pointer: Some([x, y]),
            release: false,
            quit: false,
        },
        ScriptedInput {
            frame: 60,
            pointer: None,
            release: true,
            quit: false,
        },
    ];
    std::fs::write(&script_path, serde_json::to_string(&script).unwrap()).unwrap();
    let script = load_input_script(&script_path).unwrap();

    // 3. 运行 100 帧
    let mut driver = HeadlessDriver::new(demo.scene, config.frame_dt());
    let summary = driver.run(100, &script);
    assert_eq!(summary.frames, 100);
    assert!(!summary.quit);

    let text = driver.scene().nodes().node(dialogue_box.text).unwrap();
    assert_eq!(text.text(), Some(DEMO_LINES[0]));

    // 4. 保存截图
    let snapshot = dir.path().join("last.png");
    driver.save_snapshot(&snapshot).unwrap();
    let image = image::open(&snapshot).unwrap().into_rgba8();
    assert_eq!(image.dimensions(), (320, 180));
    // 背景铺满视口，左上角不再是底色
    assert_ne!(*image.get_pixel(0, 0), Rgba([0, 0, 0, 255]));
}

#[test]
fn test_missing_assets_use_placeholder() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = AppConfig::default();
    config.assets_root = dir.path().join("nowhere");
    config.viewport.width = 160;
    config.viewport.height = 90;

    let assets = FsAssets::new(&config.assets_root).with_placeholder(32, 32);
    let demo = build_demo(&config, Box::new(assets), create_audio(&config, true, &[])).unwrap();
    let mut driver = HeadlessDriver::new(demo.scene, config.frame_dt());
    assert_eq!(driver.run(10, &[]).frames, 10);
}
