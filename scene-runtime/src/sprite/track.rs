//! # Track 模块
//!
//! 帧网格精灵表与播放状态。
//!
//! 帧按列优先排列：第 `i` 帧位于第 `i / rows` 列、第 `i % rows` 行。

use std::collections::BTreeMap;

use image::{RgbaImage, imageops};

use crate::error::{SceneError, SceneResult};
use crate::geometry::Rect;

/// 精灵表
#[derive(Debug, Clone)]
pub struct SpriteSheet {
    /// 原始帧网格（裁掉网格外的部分）
    strip: RgbaImage,
    /// 按节点尺寸缩放后的帧网格
    scaled: RgbaImage,
    frame_size: (u32, u32),
    /// 缩放后的单帧尺寸
    cell: (u32, u32),
    columns: u32,
    rows: u32,
    duration: f32,
}

impl SpriteSheet {
    /// 从帧网格创建
    ///
    /// `grid` 为 (列数, 行数)，`duration` 为播放完所有帧的总时长。
    pub fn new(
        strip: &RgbaImage,
        frame_size: (u32, u32),
        grid: (u32, u32),
        duration: f32,
    ) -> SceneResult<Self> {
        let (frame_width, frame_height) = frame_size;
        let (columns, rows) = grid;
        let invalid = SceneError::InvalidGrid {
            columns,
            rows,
            frame_width,
            frame_height,
        };
        if columns == 0 || rows == 0 || frame_width == 0 || frame_height == 0 {
            return Err(invalid);
        }
        let (width, height) = (columns * frame_width, rows * frame_height);
        if strip.width() < width || strip.height() < height {
            return Err(invalid);
        }

        let strip = imageops::crop_imm(strip, 0, 0, width, height).to_image();
        Ok(Self {
            scaled: strip.clone(),
            strip,
            frame_size,
            cell: frame_size,
            columns,
            rows,
            duration: duration.max(0.0),
        })
    }

    /// 总帧数
    pub fn total_frames(&self) -> u32 {
        self.columns * self.rows
    }

    /// 每帧时长
    pub fn frame_time(&self) -> f32 {
        self.duration / self.total_frames() as f32
    }

    /// 原始单帧尺寸
    pub fn frame_size(&self) -> (u32, u32) {
        self.frame_size
    }

    /// 缩放后的单帧尺寸
    pub fn cell_size(&self) -> (u32, u32) {
        self.cell
    }

    /// (列数, 行数)
    pub fn grid(&self) -> (u32, u32) {
        (self.columns, self.rows)
    }

    pub fn duration(&self) -> f32 {
        self.duration
    }

    /// 原始单帧宽高比
    pub fn natural_ratio(&self) -> f32 {
        self.frame_size.0 as f32 / self.frame_size.1 as f32
    }

    /// 缩放后的帧网格
    pub fn scaled(&self) -> &RgbaImage {
        &self.scaled
    }

    /// 缩放帧网格，使每一帧等于 `width x height`
    pub(crate) fn fit(&mut self, width: u32, height: u32) {
        let cell = (width.max(1), height.max(1));
        if cell == self.cell {
            return;
        }
        self.scaled = imageops::resize(
            &self.strip,
            cell.0 * self.columns,
            cell.1 * self.rows,
            imageops::FilterType::Triangle,
        );
        self.cell = cell;
    }

    /// 指定帧在缩放帧网格中的位置
    pub fn frame_rect(&self, frame: u32) -> Rect {
        let frame = frame % self.total_frames();
        let (column, row) = (frame / self.rows, frame % self.rows);
        Rect::new(
            (column * self.cell.0) as i32,
            (row * self.cell.1) as i32,
            self.cell.0,
            self.cell.1,
        )
    }
}

/// 播放状态
#[derive(Debug, Clone, PartialEq)]
pub struct Playback {
    track: String,
    frame: u32,
    elapsed: f32,
    current_loop: u32,
    loops: u32,
}

impl Playback {
    pub fn track(&self) -> &str {
        &self.track
    }

    pub fn frame(&self) -> u32 {
        self.frame
    }

    pub fn current_loop(&self) -> u32 {
        self.current_loop
    }

    /// 前进一帧，返回是否播放结束
    fn next_frame(&mut self, total: u32) -> bool {
        self.frame += 1;
        if self.frame >= total {
            self.frame = 0;
            self.current_loop += 1;
            if self.current_loop > self.loops {
                return true;
            }
        }
        false
    }
}

/// 节点上的所有动画轨道
#[derive(Debug, Clone)]
pub struct SpriteTracks {
    tracks: BTreeMap<String, SpriteSheet>,
    playback: Option<Playback>,
    speed: f32,
}

impl Default for SpriteTracks {
    fn default() -> Self {
        Self {
            tracks: BTreeMap::new(),
            playback: None,
            speed: 1.0,
        }
    }
}

impl SpriteTracks {
    pub fn new() -> Self {
        Self::default()
    }

    /// 添加（或替换）轨道
    pub fn insert(&mut self, name: impl Into<String>, sheet: SpriteSheet) {
        self.tracks.insert(name.into(), sheet);
    }

    /// 按名字查找轨道
    pub fn get(&self, name: &str) -> Option<&SpriteSheet> {
        self.tracks.get(name)
    }

    /// 轨道名列表
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.tracks.keys().map(String::as_str)
    }

    /// 当前播放状态
    pub fn playback(&self) -> Option<&Playback> {
        self.playback.as_ref()
    }

    pub fn is_playing(&self) -> bool {
        self.playback.is_some()
    }

    /// 播放速度倍率
    pub fn speed(&self) -> f32 {
        self.speed
    }

    pub fn set_speed(&mut self, speed: f32) {
        self.speed = speed.max(0.0);
    }

    /// 所有轨道适配新的节点尺寸
    pub(crate) fn fit_all(&mut self, width: u32, height: u32) {
        for sheet in self.tracks.values_mut() {
            sheet.fit(width, height);
        }
    }

    /// 当前应绘制的帧
    pub(crate) fn current_frame(&self) -> Option<(&SpriteSheet, Rect)> {
        let playback = self.playback.as_ref()?;
        let sheet = self.tracks.get(&playback.track)?;
        Some((sheet, sheet.frame_rect(playback.frame)))
    }

    /// 从第 0 帧开始播放；`loops = 0` 表示只播放一遍
    pub(crate) fn start(&mut self, track: &str, loops: u32) -> SceneResult<()> {
        if !self.tracks.contains_key(track) {
            return Err(SceneError::UnknownTrack(track.to_string()));
        }
        self.playback = Some(Playback {
            track: track.to_string(),
            frame: 0,
            elapsed: 0.0,
            current_loop: 0,
            loops,
        });
        Ok(())
    }

    /// 停止并清空帧/时间/循环状态
    pub(crate) fn stop(&mut self) {
        self.playback = None;
    }

    /// 推进播放，返回是否仍在播放
    ///
    /// 累计时间达到一个帧时长时前进一帧，每次调用最多前进一帧，
    /// 对帧时长取余后的余量留到下一次。
    pub(crate) fn step(&mut self, dt: f32) -> bool {
        let speed = self.speed;
        let Some(playback) = self.playback.as_mut() else {
            return false;
        };
        let Some(sheet) = self.tracks.get(&playback.track) else {
            self.playback = None;
            return false;
        };
        let frame_time = sheet.frame_time();
        let total = sheet.total_frames();

        playback.elapsed += dt.max(0.0) * speed;
        if frame_time > 0.0 {
            if playback.elapsed < frame_time {
                return true;
            }
            playback.elapsed %= frame_time;
        }

        if playback.next_frame(total) {
            self.playback = None;
            return false;
        }
        true
    }
}
