//! # Director 模块
//!
//! 在 [`Scene`] 上实现的编排操作：登记资源、切换背景与对话框、角色上下台、说台词。
//!
//! 位移全部用补间完成。同一属性的新补间会先终止旧补间：
//! - 重新排布时终止该角色上一次的横向补间
//! - 说新台词时终止该对话框底板上一句的补间（不论是哪个角色说的）、
//!   该角色上一句的立绘补间和逐字计时器
//! - 上台与下台互相终止对方尚未完成的纵向补间

use std::rc::Rc;

use tracing::{debug, error, info, warn};

use crate::error::{SceneError, SceneResult};
use crate::geometry::Vec2;
use crate::scene::Scene;
use crate::timeline::{Easing, LoopTick, TweenId};
use crate::ui::{Axis, NodeId};

use super::{
    ACTOR_REST_OFFSET, ACTOR_Z, BACKGROUND_Z, ControllerId, DIALOGUE_PANEL_Z, DIALOGUE_TEXT_MARGIN,
    DIALOGUE_TEXT_Z, DialogueBox, OFFSCREEN_Y, Personality, Placement, STAGE_TWEEN_SECONDS,
    slot_positions,
};

/// 只修改比例坐标的一个分量
fn set_scale_axis(scene: &mut Scene, node: NodeId, axis: Axis, value: f32) {
    if let Some(node) = scene.ui.node_mut(node) {
        let current = node.scale_position();
        let scale = match axis {
            Axis::X => Vec2::new(value, current.y),
            Axis::Y => Vec2::new(current.x, value),
        };
        node.position(Some(scale), None);
    }
}

impl Scene {
    // ===== 登记 =====

    /// 登记背景
    ///
    /// 图片按视口宽度等比缩放，底边居中对齐，初始隐藏。同名背景会被替换。
    pub fn define_background(&mut self, alias: &str, path: &str) -> SceneResult<NodeId> {
        let pixels = self.assets.load_image(path)?;
        let viewport = self.ui.viewport();
        let id = self.ui.create_image(pixels);
        if let Some(node) = self.ui.node_mut(id) {
            node.image_fit((viewport.width, viewport.height), Axis::X);
            node.set_anchor((0.5, 1.0));
            node.position(Some(Vec2::new(0.5, 1.0)), None);
            node.set_z_index(BACKGROUND_Z);
        }
        self.ui.set_visible(id, false);

        if let Some(old) = self.stage.backgrounds.insert(alias.to_string(), id) {
            self.ui.release(old);
            if self.stage.active_background.as_deref() == Some(alias) {
                self.ui.set_visible(id, true);
            }
        }
        debug!(alias, path, node = %id, "登记背景");
        Ok(id)
    }

    /// 登记角色
    ///
    /// 图片按视口高度乘以 `size_scale` 等比缩放，初始隐藏。
    pub fn define_actor(&mut self, alias: &str, path: &str, size_scale: f32) -> SceneResult<NodeId> {
        let pixels = self.assets.load_image(path)?;
        let viewport = self.ui.viewport();
        let id = self.ui.create_sprite(pixels);
        if let Some(node) = self.ui.node_mut(id) {
            let width = (viewport.width as f32 * size_scale).round() as u32;
            let height = (viewport.height as f32 * size_scale).round() as u32;
            node.image_fit((width, height), Axis::Y);
            node.set_anchor((0.5, 1.0));
            node.position(Some(Vec2::new(0.5, 1.0)), Some(ACTOR_REST_OFFSET));
            node.set_z_index(ACTOR_Z);
        }
        self.ui.set_visible(id, false);

        if let Some(old) = self.stage.actors.insert(alias.to_string(), id) {
            warn!(alias, "角色别名重复定义，旧节点已销毁");
            self.ui.release(old);
        }
        debug!(alias, path, node = %id, "登记角色");
        Ok(id)
    }

    /// 登记对话框
    ///
    /// 底板按视口尺寸乘以 `size_scale` 适配宽度，底边居中；
    /// 文字节点以底板为父矩形，换行宽度为底板宽度减去两侧边距。
    pub fn define_dialogue_box(
        &mut self,
        alias: &str,
        path: &str,
        size_scale: Vec2,
    ) -> SceneResult<DialogueBox> {
        let pixels = self.assets.load_image(path)?;
        let viewport = self.ui.viewport();

        let panel = self.ui.create_image(pixels);
        let mut panel_bounds = viewport;
        if let Some(node) = self.ui.node_mut(panel) {
            let width = (viewport.width as f32 * size_scale.x).round() as u32;
            let height = (viewport.height as f32 * size_scale.y).round() as u32;
            node.image_fit((width, height), Axis::X);
            node.set_anchor((0.5, 1.0));
            node.position(Some(Vec2::new(0.5, 1.0)), None);
            node.set_z_index(DIALOGUE_PANEL_Z);
            panel_bounds = node.bounds();
        }

        let text = self.ui.create_text(Rc::clone(&self.font), "");
        if let Some(node) = self.ui.node_mut(text) {
            let wrap = panel_bounds
                .width
                .saturating_sub((DIALOGUE_TEXT_MARGIN.x * 2.0) as u32)
                .max(1);
            node.set_text("", Some(wrap))?;
            node.set_parent(panel_bounds);
            node.position(Some(Vec2::zero()), Some(DIALOGUE_TEXT_MARGIN));
            node.set_z_index(DIALOGUE_TEXT_Z);
        }
        self.ui.set_visible(panel, false);
        self.ui.set_visible(text, false);

        let dialogue_box = DialogueBox { panel, text };
        if let Some(old) = self.stage.dialogue_boxes.insert(alias.to_string(), dialogue_box) {
            warn!(alias, "对话框别名重复定义，旧节点已销毁");
            if let Some(tween) = self.stage.panel_tweens.remove(&old.panel) {
                self.timeline.kill(tween);
            }
            if let Some(typing) = self.stage.typing.remove(&old.text) {
                self.timeline.kill(typing);
            }
            self.ui.release(old.panel);
            self.ui.release(old.text);
            // 已绑定旧对话框的控制器改绑到新节点
            for controller in self.stage.controllers.values_mut() {
                if controller.dialogue_box == Some(old) {
                    controller.dialogue_box = Some(dialogue_box);
                }
            }
            if self.stage.active_box.as_deref() == Some(alias) {
                self.stage.active_box = None;
                self.switch_dialogue_box(alias);
            }
        }
        debug!(alias, path, panel = %panel, text = %text, "登记对话框");
        Ok(dialogue_box)
    }

    // ===== 切换 =====

    /// 切换背景，别名未定义时返回 `false`
    pub fn switch_background(&mut self, alias: &str) -> bool {
        let Some(&next) = self.stage.backgrounds.get(alias) else {
            debug!(alias, "切换背景失败：别名未定义");
            return false;
        };
        if let Some(previous) = self.stage.active_background.take() {
            if let Some(&node) = self.stage.backgrounds.get(&previous) {
                self.ui.set_visible(node, false);
            }
        }
        self.ui.set_visible(next, true);
        self.stage.active_background = Some(alias.to_string());
        info!(alias, "切换背景");
        true
    }

    /// 切换对话框，别名未定义时返回 `false`
    pub fn switch_dialogue_box(&mut self, alias: &str) -> bool {
        let Some(&next) = self.stage.dialogue_boxes.get(alias) else {
            debug!(alias, "切换对话框失败：别名未定义");
            return false;
        };
        if self.stage.active_box.as_deref() == Some(alias) {
            return true;
        }
        if let Some(previous) = self.stage.active_box.take() {
            if let Some(&old) = self.stage.dialogue_boxes.get(&previous) {
                self.ui.set_visible(old.panel, false);
                self.ui.set_visible(old.text, false);
            }
        }
        self.ui.set_visible(next.panel, true);
        self.ui.set_visible(next.text, true);
        self.glue_dialogue_text(next);
        self.stage.active_box = Some(alias.to_string());
        info!(alias, "切换对话框");
        true
    }

    /// 让文字节点跟随底板当前位置
    fn glue_dialogue_text(&mut self, dialogue_box: DialogueBox) {
        let Some(panel) = self.ui.node(dialogue_box.panel).map(|node| node.bounds()) else {
            return;
        };
        if let Some(text) = self.ui.node_mut(dialogue_box.text) {
            text.set_parent(panel);
        }
    }

    // ===== 查找 =====

    /// 背景节点
    pub fn background(&self, alias: &str) -> Option<NodeId> {
        self.stage.backgrounds.get(alias).copied()
    }

    /// 角色节点
    pub fn actor(&self, alias: &str) -> Option<NodeId> {
        self.stage.actors.get(alias).copied()
    }

    /// 对话框节点
    pub fn dialogue_box(&self, alias: &str) -> Option<DialogueBox> {
        self.stage.dialogue_boxes.get(alias).copied()
    }

    // ===== 上台与下台 =====

    /// 角色上台
    ///
    /// 同一角色别名共用一个控制器；已在台上的角色会移动到新位置。
    /// `animate` 为 `true` 时角色从画面下方升起，其他角色滑动到新位置；
    /// 否则所有角色直接就位。
    ///
    /// 角色别名未定义时返回 `None`。对话框别名未定义时记录错误，
    /// 返回的控制器无法说话。
    pub fn add_to_scene(
        &mut self,
        actor_alias: &str,
        box_alias: &str,
        placement: Placement,
        animate: bool,
    ) -> Option<ControllerId> {
        let Some(&actor) = self.stage.actors.get(actor_alias) else {
            warn!(alias = actor_alias, "角色上台失败：别名未定义");
            return None;
        };
        let dialogue_box = self.stage.dialogue_boxes.get(box_alias).copied();
        if dialogue_box.is_none() {
            error!(
                actor = actor_alias,
                error = %SceneError::unknown_alias("对话框", box_alias),
                "角色控制器没有可用的对话框"
            );
        }

        let id = match self.stage.controller_for_alias(actor_alias) {
            Some(id) => {
                if let Some(controller) = self.stage.controllers.get_mut(&id) {
                    controller.box_alias = box_alias.to_string();
                    controller.dialogue_box = dialogue_box;
                }
                id
            }
            None => self
                .stage
                .new_controller(actor_alias, actor, box_alias, dialogue_box),
        };

        if let Some(previous) = self.stage.vertical_tweens.remove(&actor) {
            self.timeline.kill(previous);
        }
        self.stage.staged.retain(|staged| *staged != id);
        let index = placement.resolve(self.stage.staged.len());
        self.stage.staged.insert(index, id);

        self.ui.set_visible(actor, true);
        let start_y = if animate { OFFSCREEN_Y } else { 1.0 };
        if let Some(node) = self.ui.node_mut(actor) {
            let x = node.scale_position().x;
            node.position(Some(Vec2::new(x, start_y)), Some(ACTOR_REST_OFFSET));
        }
        if animate {
            let rise = self.timeline.tween(
                STAGE_TWEEN_SECONDS,
                OFFSCREEN_Y,
                1.0,
                &Easing::EaseOutQuad,
                move |scene: &mut Scene, y: f32| {
                    set_scale_axis(scene, actor, Axis::Y, y);
                    Ok(())
                },
            );
            self.stage.vertical_tweens.insert(actor, rise);
        }

        self.relayout(Some(id), animate);
        info!(actor = actor_alias, dialogue_box = box_alias, index, "角色上台");
        Some(id)
    }

    /// 角色下台
    ///
    /// 角色向画面下方退出，完成后隐藏；其余角色重新排布。
    /// 控制器不存在或角色不在台上时返回 `false`。
    pub fn remove(&mut self, id: ControllerId) -> bool {
        let Some(index) = self.stage.staged_index(id) else {
            debug!(controller = %id, "下台失败：角色不在台上");
            return false;
        };
        let Some(actor) = self.stage.controllers.get(&id).map(|c| c.actor) else {
            return false;
        };
        self.stage.staged.remove(index);

        if let Some(slide) = self.stage.slide_tweens.remove(&actor) {
            self.timeline.kill(slide);
        }
        if let Some(previous) = self.stage.vertical_tweens.remove(&actor) {
            self.timeline.kill(previous);
        }

        let from = self
            .ui
            .node(actor)
            .map(|node| node.scale_position().y)
            .unwrap_or(1.0);
        let exit = self.timeline.tween(
            STAGE_TWEEN_SECONDS,
            from,
            OFFSCREEN_Y,
            &Easing::EaseInQuad,
            move |scene: &mut Scene, y: f32| {
                set_scale_axis(scene, actor, Axis::Y, y);
                Ok(())
            },
        );
        self.timeline.on_complete(exit, move |scene: &mut Scene| {
            scene.ui.set_visible(actor, false);
            if scene.stage.vertical_tweens.get(&actor) == Some(&exit) {
                scene.stage.vertical_tweens.remove(&actor);
            }
            Ok(())
        });
        self.stage.vertical_tweens.insert(actor, exit);

        self.relayout(None, true);
        info!(controller = %id, "角色下台");
        true
    }

    /// 重新计算台上角色的横向位置
    ///
    /// `entering` 指定的角色直接就位；`animate` 为 `false` 时所有角色直接就位。
    pub fn relayout(&mut self, entering: Option<ControllerId>, animate: bool) {
        let slots = slot_positions(self.stage.staged.len());
        let staged: Vec<(ControllerId, NodeId)> = self
            .stage
            .staged
            .iter()
            .filter_map(|id| self.stage.controllers.get(id).map(|c| (*id, c.actor)))
            .collect();

        for ((id, actor), slot) in staged.into_iter().zip(slots) {
            if let Some(previous) = self.stage.slide_tweens.remove(&actor) {
                self.timeline.kill(previous);
            }
            let Some(from) = self.ui.node(actor).map(|node| node.scale_position().x) else {
                continue;
            };
            if !animate || entering == Some(id) {
                set_scale_axis(self, actor, Axis::X, slot);
                continue;
            }
            let slide = self.timeline.tween(
                STAGE_TWEEN_SECONDS,
                from,
                slot,
                &Easing::EaseOutQuad,
                move |scene: &mut Scene, x: f32| {
                    set_scale_axis(scene, actor, Axis::X, x);
                    Ok(())
                },
            );
            self.stage.slide_tweens.insert(actor, slide);
        }
    }

    // ===== 台词 =====

    /// 为控制器设置说话预设
    pub fn assign_personality(
        &mut self,
        id: ControllerId,
        name: &str,
        personality: Personality,
    ) -> bool {
        match self.stage.controllers.get_mut(&id) {
            Some(controller) => {
                controller.personalities.insert(name.to_string(), personality);
                true
            }
            None => false,
        }
    }

    /// 说一句台词
    ///
    /// 播放说话音效、切换到控制器的对话框、按需更换字体，
    /// 把对话框和立绘移动到预设偏移处，然后逐字显示文字。
    /// 新台词会打断上一句的位移和逐字显示。
    ///
    /// 控制器无效、没有对话框或预设未定义时记录日志并返回 `false`。
    pub fn say_line(&mut self, id: ControllerId, text: &str, personality: &str) -> bool {
        let Some(controller) = self.stage.controllers.get_mut(&id) else {
            warn!(controller = %id, "说台词失败：控制器不存在");
            return false;
        };
        let Some(dialogue_box) = controller.dialogue_box else {
            error!(
                actor = %controller.alias,
                dialogue_box = %controller.box_alias,
                "说台词失败：角色控制器没有可用的对话框"
            );
            return false;
        };
        let Some(preset) = controller.personalities.get(personality).cloned() else {
            warn!(
                actor = %controller.alias,
                error = %SceneError::UnknownPersonality(personality.to_string()),
                "说台词失败"
            );
            return false;
        };
        let actor = controller.actor;
        let box_alias = controller.box_alias.clone();

        if let Some(path) = &preset.talk_sound {
            match self.audio.load(path) {
                Ok(sound) => {
                    self.audio.stop(sound);
                    self.audio.play(sound, 1.0, false);
                }
                Err(e) => warn!(path = %path, error = %e, "说话音效加载失败"),
            }
        }

        self.switch_dialogue_box(&box_alias);

        let font = preset.font.clone().unwrap_or_else(|| Rc::clone(&self.font));
        if let Some(node) = self.ui.node_mut(dialogue_box.text) {
            let same_font = node
                .text_block()
                .is_some_and(|block| Rc::ptr_eq(block.font(), &font));
            if !same_font {
                if let Err(e) = node.change_font(font) {
                    warn!(error = %e, "更换对话字体失败");
                }
            }
        }

        if let Some(typing) = self.stage.typing.remove(&dialogue_box.text) {
            self.timeline.kill(typing);
        }
        // 底板由共用该对话框的所有角色共享，按节点终止上一句的补间
        if let Some(previous) = self.stage.panel_tweens.remove(&dialogue_box.panel) {
            self.timeline.kill(previous);
        }
        if let Some(previous) = self.stage.portrait_tweens.remove(&actor) {
            self.timeline.kill(previous);
        }

        let panel_tween = self.tween_dialogue_panel(dialogue_box, &preset);
        self.stage.panel_tweens.insert(dialogue_box.panel, panel_tween);
        let portrait_tween = self.tween_actor_portrait(actor, &preset);
        self.stage.portrait_tweens.insert(actor, portrait_tween);

        self.start_typing(dialogue_box.text, text, preset.char_interval(text));
        debug!(controller = %id, personality, chars = text.chars().count(), "说台词");
        true
    }

    fn tween_dialogue_panel(
        &mut self,
        dialogue_box: DialogueBox,
        preset: &Personality,
    ) -> TweenId {
        let from = self
            .ui
            .node(dialogue_box.panel)
            .map(|node| node.pixel_position())
            .unwrap_or_default();
        let motion = &preset.box_motion;
        self.timeline.tween(
            motion.duration,
            from,
            motion.offset,
            &motion.easing,
            move |scene: &mut Scene, offset: Vec2| {
                let node = scene
                    .ui
                    .node_mut(dialogue_box.panel)
                    .ok_or(SceneError::NodeNotFound(dialogue_box.panel))?;
                node.position(None, Some(offset));
                scene.glue_dialogue_text(dialogue_box);
                Ok(())
            },
        )
    }

    fn tween_actor_portrait(&mut self, actor: NodeId, preset: &Personality) -> TweenId {
        let from = self
            .ui
            .node(actor)
            .map(|node| node.pixel_position())
            .unwrap_or(ACTOR_REST_OFFSET);
        let motion = &preset.actor_motion;
        self.timeline.tween(
            motion.duration,
            from,
            ACTOR_REST_OFFSET.offset(motion.offset),
            &motion.easing,
            move |scene: &mut Scene, offset: Vec2| {
                let node = scene
                    .ui
                    .node_mut(actor)
                    .ok_or(SceneError::NodeNotFound(actor))?;
                node.position(None, Some(offset));
                Ok(())
            },
        )
    }

    /// 逐字显示；间隔不为正或文字为空时一次显示全部
    fn start_typing(&mut self, text_node: NodeId, text: &str, interval: f32) {
        let chars: Vec<char> = text.chars().collect();
        if interval <= 0.0 || chars.is_empty() {
            if let Some(node) = self.ui.node_mut(text_node) {
                if let Err(e) = node.set_text(text, None) {
                    warn!(error = %e, "设置对话文字失败");
                }
            }
            return;
        }

        if let Some(node) = self.ui.node_mut(text_node) {
            if let Err(e) = node.set_text("", None) {
                warn!(error = %e, "清空对话文字失败");
            }
        }
        let typing = self.timeline.every(
            interval,
            move |scene: &mut Scene, tick: LoopTick| {
                let shown = (tick.count as usize).min(chars.len());
                let result = match scene.ui.node_mut(text_node) {
                    Some(node) => {
                        let partial: String = chars[..shown].iter().collect();
                        node.set_text(&partial, None)
                    }
                    None => Err(SceneError::NodeNotFound(text_node)),
                };
                if shown >= chars.len() || result.is_err() {
                    scene.timeline.kill(tick.id);
                    if scene.stage.typing.get(&text_node) == Some(&tick.id) {
                        scene.stage.typing.remove(&text_node);
                    }
                }
                result
            },
            None,
        );
        self.stage.typing.insert(text_node, typing);
    }

    // ===== 查询 =====

    /// 控制器
    pub fn controller(&self, id: ControllerId) -> Option<&super::ActorController> {
        self.stage.controller(id)
    }

    /// 台上角色的别名，从左到右
    pub fn staged_actors(&self) -> Vec<&str> {
        self.stage.staged_actors()
    }
}
