//! # Scene Host
//!
//! 运行内置演示场景。
//!
//! ## 用法
//!
//! ```bash
//! cargo run -p scene-host
//! cargo run -p scene-host -- --frames 600 --snapshot last.png
//! cargo run -p scene-host -- --config config.json --input clicks.json --verbose
//! cargo run -p scene-host --features playback -- --frames 600
//! ```

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use scene_host::{
    AppConfig, FsAssets, HeadlessDriver, build_demo, create_audio, demo, load_input_script,
};
use tracing::{Level, info, warn};

#[derive(Parser)]
#[command(name = "scene-host")]
#[command(about = "场景运行时演示 - 无头逐帧运行并可导出最后一帧")]
#[command(version)]
struct Cli {
    /// 配置文件（默认：config.json）
    #[arg(short, long, default_value = "config.json")]
    config: PathBuf,

    /// 运行的帧数
    #[arg(short, long, default_value_t = 300)]
    frames: u64,

    /// 输入脚本（JSON）
    #[arg(short, long)]
    input: Option<PathBuf>,

    /// 最后一帧保存为 PNG
    #[arg(short, long)]
    snapshot: Option<PathBuf>,

    /// 输出 debug 级别日志
    #[arg(short, long)]
    verbose: bool,

    /// 尝试打开音频设备（需要 playback feature）
    #[arg(long)]
    audio: bool,
}

fn init_tracing(level: &str) {
    let level = level.parse::<Level>().unwrap_or(Level::INFO);
    tracing_subscriber::fmt().with_max_level(level).init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = AppConfig::load(&cli.config);
    let level = if cli.verbose {
        "debug"
    } else {
        config.log_level.as_str()
    };
    init_tracing(level);
    config.validate().context("配置无效")?;

    let script = match &cli.input {
        Some(path) => load_input_script(path)?,
        None => Vec::new(),
    };

    let viewport = &config.viewport;
    let assets = FsAssets::new(&config.assets_root).with_placeholder(viewport.width, viewport.height);
    if !config.assets_root.exists() {
        warn!(path = %config.assets_root.display(), "资源目录不存在，所有图片使用占位图");
    }
    let audio = create_audio(&config, !cli.audio, &[demo::BUTTON_SOUND]);

    let demo = build_demo(&config, Box::new(assets), audio).context("演示场景构建失败")?;
    let mut driver = HeadlessDriver::new(demo.scene, config.frame_dt());
    let summary = driver.run(cli.frames, &script);
    info!(frames = summary.frames, quit = summary.quit, "运行结束");

    if let Some(path) = cli.snapshot {
        driver.save_snapshot(path)?;
    }
    Ok(())
}
