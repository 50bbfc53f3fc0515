//! # Animator 模块
//!
//! 正在播放的精灵集合，每帧统一推进。

use std::collections::BTreeSet;

use tracing::debug;

use crate::error::{SceneError, SceneResult};
use crate::ui::{NodeId, UiTree};

/// 精灵动画调度器
#[derive(Debug, Default)]
pub struct Animator {
    playing: BTreeSet<NodeId>,
}

impl Animator {
    pub fn new() -> Self {
        Self::default()
    }

    /// 从头播放指定轨道
    ///
    /// 已在播放时先重置。节点高度不变，宽度按轨道单帧的宽高比重新计算。
    pub fn play<C>(
        &mut self,
        ui: &mut UiTree<C>,
        node: NodeId,
        track: &str,
        loops: u32,
    ) -> SceneResult<()> {
        let target = ui.node_mut(node).ok_or(SceneError::NodeNotFound(node))?;
        let tracks = target.sprite_mut()?;
        let ratio = tracks
            .get(track)
            .map(|sheet| sheet.natural_ratio())
            .ok_or_else(|| SceneError::UnknownTrack(track.to_string()))?;
        tracks.start(track, loops)?;

        let height = target.bounds().height;
        let width = (height as f32 * ratio).round().max(1.0) as u32;
        target.resize(width, height);

        self.playing.insert(node);
        debug!(node = %node, track, loops, "开始播放精灵动画");
        Ok(())
    }

    /// 停止播放，返回此前是否在播放
    pub fn stop<C>(&mut self, ui: &mut UiTree<C>, node: NodeId) -> bool {
        if let Some(tracks) = ui.node_mut(node).and_then(|n| n.sprite_mut().ok()) {
            tracks.stop();
        }
        self.playing.remove(&node)
    }

    /// 设置播放速度倍率
    pub fn set_speed<C>(&mut self, ui: &mut UiTree<C>, node: NodeId, speed: f32) -> SceneResult<()> {
        let target = ui.node_mut(node).ok_or(SceneError::NodeNotFound(node))?;
        target.sprite_mut()?.set_speed(speed);
        Ok(())
    }

    pub fn is_playing(&self, node: NodeId) -> bool {
        self.playing.contains(&node)
    }

    /// 正在播放的精灵数量
    pub fn active_count(&self) -> usize {
        self.playing.len()
    }

    /// 每帧推进；播放结束或节点已销毁的精灵移出集合
    pub fn advance<C>(&mut self, ui: &mut UiTree<C>, dt: f32) {
        self.playing.retain(|&id| {
            match ui.node_mut(id).and_then(|node| node.sprite_mut().ok()) {
                Some(tracks) => tracks.step(dt),
                None => false,
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use image::{Rgba, RgbaImage};

    use super::*;
    use crate::geometry::Rect;

    fn sprite_tree() -> (UiTree<()>, NodeId) {
        let mut ui = UiTree::new(Rect::from_size(400, 300));
        let node = ui.create_sprite(RgbaImage::from_pixel(50, 100, Rgba([1, 1, 1, 255])));
        let strip = RgbaImage::from_pixel(80, 20, Rgba([2, 2, 2, 255]));
        if let Some(n) = ui.node_mut(node) {
            // 4 帧，每帧 20x20
            n.load_track("idle", &strip, (20, 20), (4, 1), 0.4).unwrap();
        }
        (ui, node)
    }

    #[test]
    fn test_play_rescales_to_track_ratio() {
        let (mut ui, node) = sprite_tree();
        let mut animator = Animator::new();
        animator.play(&mut ui, node, "idle", 0).unwrap();

        let bounds = ui.node(node).unwrap().bounds();
        assert_eq!(bounds.size(), (100, 100));
        let sheet = ui.node(node).unwrap().track("idle").unwrap();
        assert_eq!(sheet.cell_size(), (100, 100));
        assert!(animator.is_playing(node));
    }

    #[test]
    fn test_plays_once_then_deregisters() {
        let (mut ui, node) = sprite_tree();
        let mut animator = Animator::new();
        animator.play(&mut ui, node, "idle", 0).unwrap();

        // 每次推进最多一帧
        for expected in 1..4 {
            animator.advance(&mut ui, 0.25);
            assert_eq!(animator.active_count(), 1);
            let frame = ui
                .node(node)
                .and_then(|n| n.sprite())
                .and_then(|s| s.playback())
                .map(|p| p.frame());
            assert_eq!(frame, Some(expected));
        }

        animator.advance(&mut ui, 0.25);
        assert_eq!(animator.active_count(), 0);
        assert!(ui.node(node).and_then(|n| n.sprite()).is_some_and(|s| !s.is_playing()));
    }

    #[test]
    fn test_stop_and_missing_node() {
        let (mut ui, node) = sprite_tree();
        let mut animator = Animator::new();
        animator.play(&mut ui, node, "idle", 3).unwrap();
        assert!(animator.stop(&mut ui, node));
        assert!(!animator.stop(&mut ui, node));

        animator.play(&mut ui, node, "idle", 3).unwrap();
        ui.release(node);
        animator.advance(&mut ui, 0.1);
        assert_eq!(animator.active_count(), 0);
    }

    #[test]
    fn test_play_errors() {
        let (mut ui, node) = sprite_tree();
        let image = ui.create_image(RgbaImage::new(4, 4));
        let mut animator = Animator::new();
        assert!(matches!(
            animator.play(&mut ui, node, "walk", 0),
            Err(SceneError::UnknownTrack(_))
        ));
        assert!(matches!(
            animator.play(&mut ui, image, "idle", 0),
            Err(SceneError::WrongNodeKind { .. })
        ));
        assert_eq!(animator.active_count(), 0);
    }
}
