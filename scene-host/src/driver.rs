//! # Driver 模块
//!
//! 无头帧驱动：不开窗口，按固定 dt 推进场景并绘制到内存画布。
//!
//! 交互由输入脚本提供，脚本是一个 JSON 数组，每项指定在某一帧注入的指针事件：
//!
//! ```json
//! [
//!   { "frame": 10, "pointer": [640, 650] },
//!   { "frame": 11, "pointer": [640, 650], "release": true },
//!   { "frame": 300, "quit": true }
//! ]
//! ```

use std::path::{Path, PathBuf};

use image::Rgba;
use scene_runtime::{Canvas, FrameInput, Point, Scene};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{HostError, HostResult};

/// 画布每帧的底色
const CLEAR_COLOR: Rgba<u8> = Rgba([0, 0, 0, 255]);

/// 输入脚本中的一项
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScriptedInput {
    /// 注入的帧号（从 1 开始）
    pub frame: u64,
    /// 指针移动到的位置
    #[serde(default)]
    pub pointer: Option<[i32; 2]>,
    /// 本帧是否松开指针
    #[serde(default)]
    pub release: bool,
    /// 本帧是否退出
    #[serde(default)]
    pub quit: bool,
}

/// 读取输入脚本
pub fn load_input_script(path: impl AsRef<Path>) -> HostResult<Vec<ScriptedInput>> {
    let path = path.as_ref();
    let invalid = |message: String| HostError::InputScript {
        path: path.to_path_buf(),
        message,
    };
    let content = std::fs::read_to_string(path).map_err(|e| invalid(e.to_string()))?;
    let mut script: Vec<ScriptedInput> =
        serde_json::from_str(&content).map_err(|e| invalid(e.to_string()))?;
    script.sort_by_key(|entry| entry.frame);
    Ok(script)
}

/// 一次运行的结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    /// 实际推进的帧数
    pub frames: u64,
    /// 是否因退出信号提前结束
    pub quit: bool,
}

/// 无头帧驱动
#[derive(Debug)]
pub struct HeadlessDriver {
    scene: Scene,
    canvas: Canvas,
    dt: f32,
    /// 指针保持在上一次设置的位置
    pointer: Point,
}

impl HeadlessDriver {
    /// 创建驱动，画布尺寸与场景视口一致
    pub fn new(scene: Scene, dt: f32) -> Self {
        let viewport = scene.viewport();
        Self {
            scene,
            canvas: Canvas::new(viewport.width, viewport.height),
            dt,
            pointer: Point::default(),
        }
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    pub fn scene_mut(&mut self) -> &mut Scene {
        &mut self.scene
    }

    /// 最近一帧的画面
    pub fn canvas(&self) -> &Canvas {
        &self.canvas
    }

    /// 推进一帧
    pub fn step(&mut self, input: &FrameInput) {
        self.canvas.clear(CLEAR_COLOR);
        self.scene.advance(input, &mut self.canvas);
    }

    /// 运行 `frames` 帧，按帧号注入脚本输入
    pub fn run(&mut self, frames: u64, script: &[ScriptedInput]) -> RunSummary {
        let start = self.scene.frame_count();
        let mut pending = script.iter().peekable();

        for offset in 1..=frames {
            let frame = start + offset;
            let mut input = FrameInput::idle(self.dt);
            while let Some(entry) = pending.next_if(|entry| entry.frame <= frame) {
                if let Some([x, y]) = entry.pointer {
                    self.pointer = Point::new(x, y);
                }
                input.pointer_releases += u32::from(entry.release);
                input.quit |= entry.quit;
                debug!(frame, ?entry, "注入脚本输入");
            }
            input.pointer = self.pointer;

            if input.quit {
                info!(frame, "收到退出信号");
                return RunSummary {
                    frames: offset - 1,
                    quit: true,
                };
            }
            self.step(&input);
        }

        RunSummary {
            frames,
            quit: false,
        }
    }

    /// 把最近一帧保存为 PNG
    pub fn save_snapshot(&self, path: impl Into<PathBuf>) -> HostResult<()> {
        let path = path.into();
        self.canvas
            .image()
            .save(&path)
            .map_err(|e| HostError::Snapshot {
                path: path.clone(),
                message: e.to_string(),
            })?;
        info!(path = %path.display(), "截图已保存");
        Ok(())
    }
}
