//! # Stage 模块
//!
//! 对话场景的编排状态：背景、对话框、角色及其控制器。
//!
//! ## 模块结构
//!
//! - `personality`: 说话预设
//! - `director`: 在 [`Scene`](crate::Scene) 上实现的编排操作
//!
//! 本模块只保存别名表和上台顺序，所有节点都在场景的 `UiTree` 中。
//! 全局只有一个激活的背景和一个激活的对话框。

mod director;
mod personality;

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::str::FromStr;

use crate::error::SceneError;
use crate::geometry::Vec2;
use crate::timeline::{LoopId, TweenId};
use crate::ui::NodeId;

pub use personality::{DEFAULT_CHAR_DELAY, Motion, Personality};

/// 背景层级
pub const BACKGROUND_Z: i32 = -10;
/// 角色层级
pub const ACTOR_Z: i32 = 0;
/// 对话框底板层级
pub const DIALOGUE_PANEL_Z: i32 = 10;
/// 对话文字层级
pub const DIALOGUE_TEXT_Z: i32 = 11;

/// 角色静止时的像素偏移
pub const ACTOR_REST_OFFSET: Vec2 = Vec2::new(0.0, 20.0);
/// 对话文字在底板内的边距
pub const DIALOGUE_TEXT_MARGIN: Vec2 = Vec2::new(24.0, 16.0);

/// 角色排布区间的起点（视口宽度比例）
pub const BAND_START: f32 = 0.25;
/// 角色排布区间的宽度（视口宽度比例）
pub const BAND_WIDTH: f32 = 0.5;
/// 上台、下台与重新排布的时长
pub const STAGE_TWEEN_SECONDS: f32 = 1.0;
/// 画面外的纵向比例坐标
pub const OFFSCREEN_Y: f32 = 2.0;

/// 计算 `count` 个角色的横向比例坐标
///
/// 在 `[0.25, 0.75]` 区间内均匀分布，单个角色居中。
pub fn slot_positions(count: usize) -> Vec<f32> {
    match count {
        0 => Vec::new(),
        1 => vec![BAND_START + BAND_WIDTH / 2.0],
        n => {
            let step = BAND_WIDTH / (n - 1) as f32;
            (0..n).map(|i| BAND_START + step * i as f32).collect()
        }
    }
}

/// 上台位置
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placement {
    /// 最左侧
    Left,
    /// 最右侧
    Right,
    /// 插入到指定位置（超出范围时放到最右侧）
    Index(usize),
}

impl Placement {
    /// 在长度为 `len` 的序列中的插入位置
    pub fn resolve(self, len: usize) -> usize {
        match self {
            Placement::Left => 0,
            Placement::Right => len,
            Placement::Index(index) => index.min(len),
        }
    }
}

impl FromStr for Placement {
    type Err = SceneError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "left" => Ok(Placement::Left),
            "right" => Ok(Placement::Right),
            other => other
                .parse::<usize>()
                .map(Placement::Index)
                .map_err(|_| SceneError::unknown_alias("上台位置", other)),
        }
    }
}

/// 对话框：底板 + 文字
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DialogueBox {
    pub panel: NodeId,
    pub text: NodeId,
}

/// 角色控制器 ID
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ControllerId(u64);

impl fmt::Display for ControllerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "controller#{}", self.0)
    }
}

/// 角色控制器
///
/// 把一个角色节点绑定到一个对话框，并保存该角色的说话预设。
/// 对话框别名无效时 `dialogue_box` 为 `None`，控制器仍然存在但无法说话。
#[derive(Debug, Clone)]
pub struct ActorController {
    id: ControllerId,
    alias: String,
    actor: NodeId,
    box_alias: String,
    dialogue_box: Option<DialogueBox>,
    personalities: HashMap<String, Personality>,
}

impl ActorController {
    pub fn id(&self) -> ControllerId {
        self.id
    }

    /// 角色别名
    pub fn alias(&self) -> &str {
        &self.alias
    }

    /// 角色节点
    pub fn actor(&self) -> NodeId {
        self.actor
    }

    pub fn box_alias(&self) -> &str {
        &self.box_alias
    }

    pub fn dialogue_box(&self) -> Option<DialogueBox> {
        self.dialogue_box
    }

    /// 是否绑定了可用的对话框
    pub fn is_functional(&self) -> bool {
        self.dialogue_box.is_some()
    }

    pub fn personality(&self, name: &str) -> Option<&Personality> {
        self.personalities.get(name)
    }
}

/// 编排状态
#[derive(Debug, Default)]
pub struct Stage {
    backgrounds: BTreeMap<String, NodeId>,
    active_background: Option<String>,
    actors: BTreeMap<String, NodeId>,
    dialogue_boxes: BTreeMap<String, DialogueBox>,
    active_box: Option<String>,
    controllers: BTreeMap<ControllerId, ActorController>,
    /// 台上角色，从左到右
    staged: Vec<ControllerId>,
    /// 角色节点 → 重新排布的横向补间
    slide_tweens: HashMap<NodeId, TweenId>,
    /// 角色节点 → 上台/下台的纵向补间
    vertical_tweens: HashMap<NodeId, TweenId>,
    /// 对话框底板 → 台词位移补间（同一对话框的所有角色共用）
    panel_tweens: HashMap<NodeId, TweenId>,
    /// 角色节点 → 台词位移补间
    portrait_tweens: HashMap<NodeId, TweenId>,
    /// 文字节点 → 逐字显示计时器
    typing: HashMap<NodeId, LoopId>,
    next_controller: u64,
}

impl Stage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn active_background(&self) -> Option<&str> {
        self.active_background.as_deref()
    }

    pub fn active_dialogue_box(&self) -> Option<&str> {
        self.active_box.as_deref()
    }

    pub fn controller(&self, id: ControllerId) -> Option<&ActorController> {
        self.controllers.get(&id)
    }

    /// 台上角色的别名，从左到右
    pub fn staged_actors(&self) -> Vec<&str> {
        self.staged
            .iter()
            .filter_map(|id| self.controllers.get(id))
            .map(ActorController::alias)
            .collect()
    }

    /// 控制器在台上的位置
    pub fn staged_index(&self, id: ControllerId) -> Option<usize> {
        self.staged.iter().position(|staged| *staged == id)
    }

    /// 指定文字节点正在运行的逐字计时器
    pub fn typing_loop(&self, text: NodeId) -> Option<LoopId> {
        self.typing.get(&text).copied()
    }

    /// 指定对话框底板正在运行的台词位移补间
    pub fn panel_tween(&self, panel: NodeId) -> Option<TweenId> {
        self.panel_tweens.get(&panel).copied()
    }

    fn controller_for_alias(&self, alias: &str) -> Option<ControllerId> {
        self.controllers
            .values()
            .find(|controller| controller.alias == alias)
            .map(ActorController::id)
    }

    fn new_controller(
        &mut self,
        alias: &str,
        actor: NodeId,
        box_alias: &str,
        dialogue_box: Option<DialogueBox>,
    ) -> ControllerId {
        self.next_controller += 1;
        let id = ControllerId(self.next_controller);
        self.controllers.insert(
            id,
            ActorController {
                id,
                alias: alias.to_string(),
                actor,
                box_alias: box_alias.to_string(),
                dialogue_box,
                personalities: HashMap::new(),
            },
        );
        id
    }
}
