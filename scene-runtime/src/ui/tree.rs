//! # Tree 模块
//!
//! 节点集合与逐帧更新。
//!
//! 每帧按 (z, id) 升序处理可见节点：绘制 → 命中检测与事件 → 重新定位。
//! 监听器在节点借用之外调用，回调内可以自由地创建、隐藏、销毁节点。

use std::collections::BTreeMap;

use image::{Rgba, RgbaImage};
use tracing::{debug, warn};

use crate::error::SceneResult;
use crate::geometry::Rect;
use crate::input::FrameInput;
use crate::sprite::SpriteTracks;

use super::font::FontRef;
use super::node::{Node, NodeKind};
use super::surface::Surface;
use super::text::TextBlock;
use super::{Binding, EventKind, NodeId};

/// 持有 [`UiTree`] 的宿主上下文
pub trait UiHost: Sized + 'static {
    fn ui(&mut self) -> &mut UiTree<Self>;
}

/// 节点集合
pub struct UiTree<C> {
    nodes: BTreeMap<NodeId, Node<C>>,
    viewport: Rect,
    next_id: u64,
}

impl<C> std::fmt::Debug for UiTree<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UiTree")
            .field("viewport", &self.viewport)
            .field("nodes", &self.nodes.len())
            .finish()
    }
}

impl<C> UiTree<C> {
    /// 创建空集合，`viewport` 是顶层节点的默认父矩形
    pub fn new(viewport: Rect) -> Self {
        Self {
            nodes: BTreeMap::new(),
            viewport,
            next_id: 1,
        }
    }

    pub fn viewport(&self) -> Rect {
        self.viewport
    }

    /// 更换视口，父矩形为旧视口的节点跟随更新
    pub fn set_viewport(&mut self, viewport: Rect) {
        let old = self.viewport;
        self.viewport = viewport;
        for node in self.nodes.values_mut() {
            if node.parent() == old {
                node.set_parent(viewport);
            }
        }
    }

    fn insert(&mut self, kind: NodeKind, source: RgbaImage) -> NodeId {
        let id = NodeId::new(self.next_id);
        self.next_id += 1;
        debug!(node = %id, kind = kind.label(), "创建节点");
        self.nodes.insert(id, Node::new(id, kind, source, self.viewport));
        id
    }

    /// 创建面板；`fill` 为 `None` 时透明
    pub fn create_panel(&mut self, width: u32, height: u32, fill: Option<Rgba<u8>>) -> NodeId {
        let (width, height) = (width.max(1), height.max(1));
        let source = match fill {
            Some(color) => RgbaImage::from_pixel(width, height, color),
            None => RgbaImage::new(width, height),
        };
        self.insert(NodeKind::Panel, source)
    }

    /// 创建图片节点，初始尺寸为图片尺寸
    pub fn create_image(&mut self, pixels: RgbaImage) -> NodeId {
        self.insert(NodeKind::Image, pixels)
    }

    /// 创建文字节点，换行宽度默认为视口宽度
    pub fn create_text(&mut self, font: FontRef, text: &str) -> NodeId {
        let mut block = TextBlock::new(font, self.viewport.width);
        block.set_text(text, None);
        let source = block.render();
        self.insert(NodeKind::Text(block), source)
    }

    /// 创建精灵节点，未播放动画时显示 `pixels`
    pub fn create_sprite(&mut self, pixels: RgbaImage) -> NodeId {
        self.insert(NodeKind::Sprite(SpriteTracks::new()), pixels)
    }

    pub fn node(&self, id: NodeId) -> Option<&Node<C>> {
        self.nodes.get(&id)
    }

    pub fn node_mut(&mut self, id: NodeId) -> Option<&mut Node<C>> {
        self.nodes.get_mut(&id)
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.contains_key(&id)
    }

    /// 节点总数（包括隐藏节点）
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// 显示或隐藏；隐藏的节点不参与每帧处理，但仍然存在
    pub fn set_visible(&mut self, id: NodeId, visible: bool) -> bool {
        match self.nodes.get_mut(&id) {
            Some(node) => {
                node.set_visible_flag(visible);
                true
            }
            None => false,
        }
    }

    pub fn is_visible(&self, id: NodeId) -> bool {
        self.nodes.get(&id).is_some_and(Node::is_visible)
    }

    /// 销毁节点
    pub fn release(&mut self, id: NodeId) -> bool {
        let removed = self.nodes.remove(&id).is_some();
        if removed {
            debug!(node = %id, "销毁节点");
        }
        removed
    }

    /// 绑定事件；节点不存在时返回 `None`
    pub fn bind<F>(&mut self, id: NodeId, kind: EventKind, callback: F) -> Option<Binding>
    where
        F: FnMut(&mut C) -> SceneResult<()> + 'static,
    {
        self.nodes
            .get_mut(&id)
            .map(|node| node.bind(kind, callback))
    }

    /// 绑定指针进入事件
    pub fn on_hover<F>(&mut self, id: NodeId, callback: F) -> Option<Binding>
    where
        F: FnMut(&mut C) -> SceneResult<()> + 'static,
    {
        self.bind(id, EventKind::Hover, callback)
    }

    /// 绑定指针离开事件
    pub fn on_leave<F>(&mut self, id: NodeId, callback: F) -> Option<Binding>
    where
        F: FnMut(&mut C) -> SceneResult<()> + 'static,
    {
        self.bind(id, EventKind::Leave, callback)
    }

    /// 绑定点击事件
    pub fn on_click<F>(&mut self, id: NodeId, callback: F) -> Option<Binding>
    where
        F: FnMut(&mut C) -> SceneResult<()> + 'static,
    {
        self.bind(id, EventKind::Click, callback)
    }

    /// 解绑
    pub fn unbind(&mut self, binding: Binding) -> bool {
        self.nodes
            .get_mut(&binding.node)
            .is_some_and(|node| node.unbind(binding))
    }

    /// 本帧处理顺序：可见节点按 (z, id) 升序
    pub fn draw_order(&self) -> Vec<NodeId> {
        let mut order: Vec<(i32, NodeId)> = self
            .nodes
            .values()
            .filter(|node| node.is_visible())
            .map(|node| (node.z_index(), node.id()))
            .collect();
        order.sort_unstable();
        order.into_iter().map(|(_, id)| id).collect()
    }
}

impl<C: UiHost> UiTree<C> {
    /// 每帧更新
    ///
    /// 对每个可见节点：绘制、命中检测（悬停/离开按边沿触发，
    /// 点击按本帧松开次数触发）、按保存的参数重新定位。
    /// 回调返回的错误只记录日志。
    pub fn update_all(ctx: &mut C, input: &FrameInput, surface: &mut dyn Surface) {
        for id in ctx.ui().draw_order() {
            let fired = {
                let Some(node) = ctx.ui().nodes.get_mut(&id) else {
                    continue;
                };
                // 被同帧更早的回调隐藏
                if !node.is_visible() {
                    continue;
                }
                node.blit(surface);
                node.update_states(input.pointer, input.pointer_releases)
            };

            for (kind, listener) in fired {
                let Ok(mut callback) = listener.try_borrow_mut() else {
                    warn!(node = %id, event = ?kind, "监听器正在执行，跳过重入调用");
                    continue;
                };
                if let Err(e) = (&mut *callback)(ctx) {
                    warn!(node = %id, event = ?kind, error = %e, "界面事件回调执行失败");
                }
            }

            if let Some(node) = ctx.ui().nodes.get_mut(&id) {
                node.reposition();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::rc::Rc;

    use super::*;
    use crate::error::SceneError;
    use crate::geometry::Vec2;
    use crate::ui::font::BlockFont;
    use crate::ui::surface::Canvas;

    struct Host {
        ui: UiTree<Host>,
        log: Vec<String>,
    }

    impl UiHost for Host {
        fn ui(&mut self) -> &mut UiTree<Self> {
            &mut self.ui
        }
    }

    impl Host {
        fn new() -> Self {
            Self {
                ui: UiTree::new(Rect::from_size(100, 100)),
                log: Vec::new(),
            }
        }
    }

    fn solid(width: u32, height: u32, r: u8) -> RgbaImage {
        RgbaImage::from_pixel(width, height, Rgba([r, 0, 0, 255]))
    }

    #[test]
    fn test_draw_order_by_z_then_id() {
        let mut ui: UiTree<()> = UiTree::new(Rect::from_size(100, 100));
        let a = ui.create_image(solid(1, 1, 1));
        let b = ui.create_image(solid(1, 1, 2));
        let c = ui.create_image(solid(1, 1, 3));
        if let Some(node) = ui.node_mut(a) {
            node.set_z_index(5);
        }
        if let Some(node) = ui.node_mut(c) {
            node.set_z_index(-1);
        }
        ui.set_visible(b, false);
        assert_eq!(ui.draw_order(), vec![c, a]);
        ui.set_visible(b, true);
        assert_eq!(ui.draw_order(), vec![c, b, a]);
    }

    #[test]
    fn test_higher_z_drawn_on_top() {
        let mut host = Host::new();
        let low = host.ui.create_image(solid(10, 10, 1));
        let high = host.ui.create_image(solid(10, 10, 2));
        if let Some(node) = host.ui.node_mut(high) {
            node.set_z_index(1);
        }
        // id 更小但 z 更高
        if let Some(node) = host.ui.node_mut(low) {
            node.set_z_index(2);
        }

        let mut canvas = Canvas::new(100, 100);
        UiTree::update_all(&mut host, &FrameInput::idle(0.016), &mut canvas);
        assert_eq!(canvas.image().get_pixel(5, 5).0[0], 1);
    }

    #[test]
    fn test_click_fires_per_release_inside_only() {
        let mut host = Host::new();
        let button = host.ui.create_image(solid(20, 20, 1));
        host.ui.on_click(button, |p: &mut Host| {
            p.log.push("click".to_string());
            Ok(())
        });

        let mut canvas = Canvas::new(100, 100);
        let outside = FrameInput::idle(0.016).with_pointer(50, 50).with_release();
        UiTree::update_all(&mut host, &outside, &mut canvas);
        assert!(host.log.is_empty());

        let inside = FrameInput::idle(0.016)
            .with_pointer(5, 5)
            .with_release()
            .with_release();
        UiTree::update_all(&mut host, &inside, &mut canvas);
        assert_eq!(host.log, vec!["click", "click"]);
    }

    #[test]
    fn test_hidden_node_gets_no_events() {
        let mut host = Host::new();
        let node = host.ui.create_image(solid(20, 20, 1));
        host.ui.on_hover(node, |p: &mut Host| {
            p.log.push("hover".to_string());
            Ok(())
        });
        host.ui.set_visible(node, false);

        let mut canvas = Canvas::new(100, 100);
        UiTree::update_all(&mut host, &FrameInput::idle(0.0).with_pointer(1, 1), &mut canvas);
        assert!(host.log.is_empty());

        host.ui.set_visible(node, true);
        UiTree::update_all(&mut host, &FrameInput::idle(0.0).with_pointer(1, 1), &mut canvas);
        assert_eq!(host.log, vec!["hover"]);
    }

    #[test]
    fn test_callback_can_mutate_tree() {
        let mut host = Host::new();
        let first = host.ui.create_image(solid(20, 20, 1));
        let second = host.ui.create_image(solid(20, 20, 2));
        host.ui.on_hover(first, move |p: &mut Host| {
            p.ui.release(second);
            p.ui.create_text(Rc::new(BlockFont::default()), "new");
            Ok(())
        });
        host.ui.on_hover(second, |p: &mut Host| {
            p.log.push("second".to_string());
            Ok(())
        });

        let mut canvas = Canvas::new(100, 100);
        UiTree::update_all(&mut host, &FrameInput::idle(0.0).with_pointer(1, 1), &mut canvas);
        assert!(host.log.is_empty());
        assert!(!host.ui.contains(second));
        assert_eq!(host.ui.len(), 2);
    }

    #[test]
    fn test_failing_listener_does_not_stop_pass() {
        let mut host = Host::new();
        let a = host.ui.create_image(solid(20, 20, 1));
        let b = host.ui.create_image(solid(20, 20, 2));
        host.ui.on_hover(a, |_: &mut Host| Err(SceneError::callback("boom")));
        host.ui.on_hover(b, |p: &mut Host| {
            p.log.push("b".to_string());
            Ok(())
        });

        let mut canvas = Canvas::new(100, 100);
        UiTree::update_all(&mut host, &FrameInput::idle(0.0).with_pointer(1, 1), &mut canvas);
        assert_eq!(host.log, vec!["b"]);
    }

    #[test]
    fn test_unbind_and_reposition() {
        let mut host = Host::new();
        let node = host.ui.create_image(solid(10, 10, 1));
        let binding = host
            .ui
            .on_click(node, |p: &mut Host| {
                p.log.push("click".to_string());
                Ok(())
            })
            .expect("node exists");
        assert!(host.ui.unbind(binding));

        if let Some(n) = host.ui.node_mut(node) {
            n.position(Some(Vec2::new(0.5, 0.5)), None);
        }
        host.ui.set_viewport(Rect::from_size(200, 200));
        assert_eq!(host.ui.node(node).map(|n| n.bounds().x), Some(100));

        let mut canvas = Canvas::new(200, 200);
        let click = FrameInput::idle(0.0).with_pointer(105, 105).with_release();
        UiTree::update_all(&mut host, &click, &mut canvas);
        assert!(host.log.is_empty());
    }
}
