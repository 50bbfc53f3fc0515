//! # Node 模块
//!
//! 单个界面节点：像素、边界、定位参数、z 序、可见性与事件监听。
//!
//! 节点种类用 [`NodeKind`] 区分，布局与事件逻辑对所有种类通用。

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use image::{Rgba, RgbaImage, imageops};
use tracing::warn;

use crate::error::{SceneError, SceneResult};
use crate::geometry::{Point, Rect, Vec2};
use crate::sprite::{SpriteSheet, SpriteTracks};

use super::font::FontRef;
use super::surface::Surface;
use super::text::{Alignment, TextBlock};
use super::{Axis, Binding, EventKind, NodeId};

/// 事件监听器
pub(crate) type Listener<C> = Rc<RefCell<dyn FnMut(&mut C) -> SceneResult<()>>>;

/// 节点种类
#[derive(Debug, Clone)]
pub enum NodeKind {
    /// 纯色或透明容器
    Panel,
    /// 图片
    Image,
    /// 文字
    Text(TextBlock),
    /// 可播放帧动画的图片
    Sprite(SpriteTracks),
}

impl NodeKind {
    /// 种类名（用于错误信息）
    pub fn label(&self) -> &'static str {
        match self {
            NodeKind::Panel => "面板",
            NodeKind::Image => "图片",
            NodeKind::Text(_) => "文字",
            NodeKind::Sprite(_) => "精灵",
        }
    }
}

struct Listeners<C> {
    next_slot: u64,
    hover: Vec<(u64, Listener<C>)>,
    leave: Vec<(u64, Listener<C>)>,
    click: Vec<(u64, Listener<C>)>,
}

impl<C> Listeners<C> {
    fn new() -> Self {
        Self {
            next_slot: 1,
            hover: Vec::new(),
            leave: Vec::new(),
            click: Vec::new(),
        }
    }

    fn slot(&self, kind: EventKind) -> &Vec<(u64, Listener<C>)> {
        match kind {
            EventKind::Hover => &self.hover,
            EventKind::Leave => &self.leave,
            EventKind::Click => &self.click,
        }
    }

    fn slot_mut(&mut self, kind: EventKind) -> &mut Vec<(u64, Listener<C>)> {
        match kind {
            EventKind::Hover => &mut self.hover,
            EventKind::Leave => &mut self.leave,
            EventKind::Click => &mut self.click,
        }
    }
}

/// 界面节点
pub struct Node<C> {
    id: NodeId,
    kind: NodeKind,
    /// 原始像素，缩放总是从这里重新采样
    source: RgbaImage,
    /// 当前绘制的像素
    pixels: RgbaImage,
    bounds: Rect,
    parent: Rect,
    anchor: Vec2,
    scale_pos: Vec2,
    pixel_pos: Vec2,
    z_index: i32,
    visible: bool,
    hovered: bool,
    listeners: Listeners<C>,
}

impl<C> fmt::Debug for Node<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Node")
            .field("id", &self.id)
            .field("kind", &self.kind.label())
            .field("bounds", &self.bounds)
            .field("z_index", &self.z_index)
            .field("visible", &self.visible)
            .finish()
    }
}

impl<C> Node<C> {
    pub(crate) fn new(id: NodeId, kind: NodeKind, source: RgbaImage, parent: Rect) -> Self {
        let (width, height) = source.dimensions();
        let mut node = Self {
            id,
            kind,
            pixels: source.clone(),
            source,
            bounds: Rect::new(parent.x, parent.y, width, height),
            parent,
            anchor: Vec2::zero(),
            scale_pos: Vec2::zero(),
            pixel_pos: Vec2::zero(),
            z_index: 0,
            visible: true,
            hovered: false,
            listeners: Listeners::new(),
        };
        node.reposition();
        node
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn kind(&self) -> &NodeKind {
        &self.kind
    }

    /// 当前边界
    pub fn bounds(&self) -> Rect {
        self.bounds
    }

    /// 父矩形
    pub fn parent(&self) -> Rect {
        self.parent
    }

    pub fn anchor(&self) -> Vec2 {
        self.anchor
    }

    /// 最近一次的比例坐标
    pub fn scale_position(&self) -> Vec2 {
        self.scale_pos
    }

    /// 最近一次的像素偏移
    pub fn pixel_position(&self) -> Vec2 {
        self.pixel_pos
    }

    pub fn z_index(&self) -> i32 {
        self.z_index
    }

    pub fn set_z_index(&mut self, z_index: i32) {
        self.z_index = z_index;
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn is_hovered(&self) -> bool {
        self.hovered
    }

    /// 当前像素
    pub fn pixels(&self) -> &RgbaImage {
        &self.pixels
    }

    pub(crate) fn set_visible_flag(&mut self, visible: bool) {
        self.visible = visible;
        if !visible {
            self.hovered = false;
        }
    }

    // ===== 布局 =====

    /// 定位
    ///
    /// 传入 `None` 的参数沿用上一次的值，两者都为 `None` 等价于 [`Node::reposition`]。
    pub fn position(&mut self, scale: Option<Vec2>, pixel: Option<Vec2>) {
        if let Some(scale) = scale {
            self.scale_pos = scale;
        }
        if let Some(pixel) = pixel {
            self.pixel_pos = pixel;
        }
        let (width, height) = (self.bounds.width as f32, self.bounds.height as f32);
        let x = self.parent.x as f32 + self.scale_pos.x * self.parent.width as f32 + self.pixel_pos.x
            - self.anchor.x * width;
        let y = self.parent.y as f32 + self.scale_pos.y * self.parent.height as f32 + self.pixel_pos.y
            - self.anchor.y * height;
        self.bounds.x = x.floor() as i32;
        self.bounds.y = y.floor() as i32;
    }

    /// 按已保存的参数重新定位
    pub fn reposition(&mut self) {
        self.position(None, None);
    }

    /// 设置锚点（(0, 0) 左上，(1, 1) 右下）
    pub fn set_anchor(&mut self, anchor: impl Into<Vec2>) {
        self.anchor = anchor.into();
        self.reposition();
    }

    /// 更换父矩形并重新定位
    pub fn set_parent(&mut self, parent: Rect) {
        self.parent = parent;
        self.reposition();
    }

    /// 当前宽高比（宽 / 高）
    pub fn ratio(&self) -> f32 {
        self.bounds.width as f32 / self.bounds.height.max(1) as f32
    }

    /// 缩放到指定尺寸（不保持比例）
    pub fn resize(&mut self, width: u32, height: u32) {
        let (width, height) = (width.max(1), height.max(1));
        self.pixels = if self.source.dimensions() == (width, height) {
            self.source.clone()
        } else {
            imageops::resize(&self.source, width, height, imageops::FilterType::Triangle)
        };
        if let NodeKind::Sprite(tracks) = &mut self.kind {
            tracks.fit_all(width, height);
        }
        self.bounds.width = width;
        self.bounds.height = height;
        self.reposition();
    }

    /// 按比例缩放
    ///
    /// `Axis::X` 保持宽度，高度为 `width / ratio`；`Axis::Y` 保持高度，宽度为 `height * ratio`。
    pub fn resize_ratio(&mut self, ratio: f32, keep: Axis) {
        if !(ratio > 0.0 && ratio.is_finite()) {
            warn!(node = %self.id, ratio, "无效的宽高比，忽略缩放");
            return;
        }
        let (width, height) = (self.bounds.width as f32, self.bounds.height as f32);
        match keep {
            Axis::X => self.resize(self.bounds.width, (width / ratio).round() as u32),
            Axis::Y => self.resize((height * ratio).round() as u32, self.bounds.height),
        }
    }

    /// 适配到指定尺寸的一条轴上，保持当前宽高比
    pub fn image_fit(&mut self, size: (u32, u32), keep: Axis) {
        let ratio = self.ratio();
        self.resize(size.0, size.1);
        self.resize_ratio(ratio, keep);
    }

    /// 更换像素，保持当前尺寸
    pub fn replace_image(&mut self, pixels: RgbaImage) {
        self.source = pixels;
        let (width, height) = self.bounds.size();
        self.resize(width, height);
    }

    /// 翻转像素
    pub fn flip(&mut self, horizontal: bool, vertical: bool) {
        for image in [&mut self.source, &mut self.pixels] {
            if horizontal {
                imageops::flip_horizontal_in_place(image);
            }
            if vertical {
                imageops::flip_vertical_in_place(image);
            }
        }
    }

    // ===== 文字 =====

    /// 文字内容
    pub fn text_block(&self) -> Option<&TextBlock> {
        match &self.kind {
            NodeKind::Text(block) => Some(block),
            _ => None,
        }
    }

    /// 当前文字（非文字节点返回 `None`）
    pub fn text(&self) -> Option<&str> {
        self.text_block().map(TextBlock::text)
    }

    /// 当前换行结果
    pub fn lines(&self) -> Option<&[String]> {
        self.text_block().map(TextBlock::lines)
    }

    fn edit_text(&mut self, edit: impl FnOnce(&mut TextBlock)) -> SceneResult<()> {
        let NodeKind::Text(block) = &mut self.kind else {
            return Err(SceneError::WrongNodeKind {
                node: self.id,
                expected: "文字",
            });
        };
        edit(block);
        self.source = block.render();
        self.pixels = self.source.clone();
        let (width, height) = self.source.dimensions();
        self.bounds.width = width;
        self.bounds.height = height;
        self.reposition();
        Ok(())
    }

    /// 设置文字；`wrap` 为 `None` 时沿用当前换行宽度
    pub fn set_text(&mut self, text: &str, wrap: Option<u32>) -> SceneResult<()> {
        self.edit_text(|block| block.set_text(text, wrap))
    }

    pub fn set_alignment(&mut self, alignment: Alignment) -> SceneResult<()> {
        self.edit_text(|block| block.set_alignment(alignment))
    }

    /// 设置描边并重绘
    pub fn set_border(&mut self, thickness: u32, color: Rgba<u8>) -> SceneResult<()> {
        self.edit_text(|block| block.set_border(thickness, color))
    }

    /// 设置前景/背景色并重绘
    pub fn set_colors(&mut self, fg: Rgba<u8>, bg: Option<Rgba<u8>>) -> SceneResult<()> {
        self.edit_text(|block| block.set_colors(fg, bg))
    }

    /// 更换字体并重绘
    pub fn change_font(&mut self, font: FontRef) -> SceneResult<()> {
        self.edit_text(|block| block.change_font(font))
    }

    // ===== 精灵 =====

    /// 动画轨道集合
    pub fn sprite(&self) -> Option<&SpriteTracks> {
        match &self.kind {
            NodeKind::Sprite(tracks) => Some(tracks),
            _ => None,
        }
    }

    pub(crate) fn sprite_mut(&mut self) -> SceneResult<&mut SpriteTracks> {
        match &mut self.kind {
            NodeKind::Sprite(tracks) => Ok(tracks),
            _ => Err(SceneError::WrongNodeKind {
                node: self.id,
                expected: "精灵",
            }),
        }
    }

    /// 加载动画轨道
    ///
    /// `frame_size` 为单帧像素尺寸，`grid` 为 (列数, 行数)，`duration` 为一遍的总时长。
    pub fn load_track(
        &mut self,
        name: &str,
        strip: &RgbaImage,
        frame_size: (u32, u32),
        grid: (u32, u32),
        duration: f32,
    ) -> SceneResult<()> {
        let (width, height) = self.bounds.size();
        let tracks = self.sprite_mut()?;
        let mut sheet = SpriteSheet::new(strip, frame_size, grid, duration)?;
        sheet.fit(width, height);
        tracks.insert(name, sheet);
        Ok(())
    }

    /// 按名字查找动画轨道
    pub fn track(&self, name: &str) -> Option<&SpriteSheet> {
        self.sprite()?.get(name)
    }

    // ===== 每帧 =====

    /// 绘制到目标
    pub(crate) fn blit(&self, surface: &mut dyn Surface) {
        if let NodeKind::Sprite(tracks) = &self.kind {
            if let Some((sheet, frame)) = tracks.current_frame() {
                let dest = Rect::new(self.bounds.x, self.bounds.y, frame.width, frame.height);
                surface.blit(sheet.scaled(), dest, Some(frame));
                return;
            }
        }
        surface.blit(&self.pixels, self.bounds, None);
    }

    /// 命中检测并更新悬停状态，返回本帧应触发的监听器
    pub(crate) fn update_states(
        &mut self,
        pointer: Point,
        releases: u32,
    ) -> Vec<(EventKind, Listener<C>)> {
        let inside = self.bounds.contains(pointer);
        let mut fired = Vec::new();
        let mut collect = |kind: EventKind, listeners: &Listeners<C>| {
            fired.extend(
                listeners
                    .slot(kind)
                    .iter()
                    .map(|(_, listener)| (kind, Rc::clone(listener))),
            );
        };

        if inside && !self.hovered {
            collect(EventKind::Hover, &self.listeners);
        } else if !inside && self.hovered {
            collect(EventKind::Leave, &self.listeners);
        }
        self.hovered = inside;

        if inside {
            for _ in 0..releases {
                collect(EventKind::Click, &self.listeners);
            }
        }
        fired
    }

    // ===== 事件绑定 =====

    pub(crate) fn bind<F>(&mut self, kind: EventKind, callback: F) -> Binding
    where
        F: FnMut(&mut C) -> SceneResult<()> + 'static,
    {
        let slot = self.listeners.next_slot;
        self.listeners.next_slot += 1;
        let listener: Listener<C> = Rc::new(RefCell::new(callback));
        self.listeners.slot_mut(kind).push((slot, listener));
        Binding {
            node: self.id,
            kind,
            slot,
        }
    }

    pub(crate) fn unbind(&mut self, binding: Binding) -> bool {
        let listeners = self.listeners.slot_mut(binding.kind);
        let before = listeners.len();
        listeners.retain(|(slot, _)| *slot != binding.slot);
        listeners.len() != before
    }

    /// 某类事件的监听器数量
    pub fn listener_count(&self, kind: EventKind) -> usize {
        self.listeners.slot(kind).len()
    }
}
