use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::model::{Poi, Point, Rect, Shape};

pub const AUTHORING_SCHEMA_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct AuthoringWorld {
    pub meta: WorldMeta,
    pub map: MapDef,
    pub objects: Vec<MapObject>,
    pub colliders: Vec<Collider>,
    pub triggers: Vec<Trigger>,
    pub interactions: Vec<Interaction>,
    pub dialogues: Vec<Dialogue>,
    pub npcs: Vec<Npc>,
    pub poi_index: Vec<Poi>,
    pub ui_texts: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct WorldMeta {
    pub project_id: String,
    pub schema_version: u32,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct MapDef {
    pub tile_size: u32,
    pub columns: u32,
    pub rows: u32,
    pub terrain: Vec<Vec<i32>>,
    pub tilesets: Vec<Tileset>,
    pub overlay: Overlay,
}

impl MapDef {
    pub fn pixel_width(&self) -> f64 {
        f64::from(self.columns) * f64::from(self.tile_size)
    }

    pub fn pixel_height(&self) -> f64 {
        f64::from(self.rows) * f64::from(self.tile_size)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct Tileset {
    pub key: String,
    pub image: String,
    pub upper: UpperRule,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(
    tag = "type",
    rename_all = "snake_case",
    rename_all_fields = "camelCase",
    deny_unknown_fields
)]
pub enum UpperRule {
    Equals { terrain_id: i32 },
    OneOf { terrain_ids: Vec<i32> },
    AtLeast { terrain_id: i32 },
}

impl UpperRule {
    pub fn is_upper(&self, terrain_id: i32) -> bool {
        match self {
            Self::Equals { terrain_id: id } => terrain_id == *id,
            Self::OneOf { terrain_ids } => terrain_ids.contains(&terrain_id),
            Self::AtLeast { terrain_id: min } => terrain_id >= *min,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct Overlay {
    pub key: String,
    pub image: String,
    pub x: f64,
    pub y: f64,
    pub depth: f64,
    pub alpha: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RenderGroup {
    Ground,
    Props,
    Buildings,
    Overhead,
}

// x/y is the sprite centre.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct MapObject {
    pub id: String,
    pub key: String,
    pub texture: String,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    pub depth: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub poi_id: Option<String>,
    pub visible: bool,
    pub render_group: RenderGroup,
}

impl MapObject {
    pub fn bounds(&self) -> Rect {
        Rect {
            x: self.x - self.width / 2.0,
            y: self.y - self.height / 2.0,
            width: self.width,
            height: self.height,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct Collider {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub object_id: Option<String>,
    pub shape: Shape,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TriggerType {
    Door,
    Interact,
    Proximity,
    ClickZone,
    AreaEnter,
}

impl TriggerType {
    pub fn requires_interaction(self) -> bool {
        matches!(self, Self::Door | Self::Interact | Self::ClickZone)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Door => "door",
            Self::Interact => "interact",
            Self::Proximity => "proximity",
            Self::ClickZone => "click_zone",
            Self::AreaEnter => "area_enter",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct Trigger {
    pub id: String,
    #[serde(rename = "type")]
    pub trigger_type: TriggerType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub object_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interaction_id: Option<String>,
    pub shape: Shape,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct Interaction {
    pub id: String,
    pub trigger_id: String,
    pub actions: Vec<AuthoringAction>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(
    tag = "type",
    rename_all = "snake_case",
    rename_all_fields = "camelCase",
    deny_unknown_fields
)]
pub enum AuthoringAction {
    OpenDialogue {
        id: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        label: Option<String>,
        dialogue_id: String,
    },
    OpenLinkConfirm {
        id: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        label: Option<String>,
        href: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        confirm_message: Option<String>,
    },
    Teleport {
        id: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        label: Option<String>,
        x: f64,
        y: f64,
    },
    SetFlag {
        id: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        label: Option<String>,
        flag: String,
        value: bool,
    },
    ShowToast {
        id: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        label: Option<String>,
        message: String,
    },
}

impl AuthoringAction {
    pub fn id(&self) -> &str {
        match self {
            Self::OpenDialogue { id, .. }
            | Self::OpenLinkConfirm { id, .. }
            | Self::Teleport { id, .. }
            | Self::SetFlag { id, .. }
            | Self::ShowToast { id, .. } => id,
        }
    }

    pub fn label(&self) -> Option<&str> {
        match self {
            Self::OpenDialogue { label, .. }
            | Self::OpenLinkConfirm { label, .. }
            | Self::Teleport { label, .. }
            | Self::SetFlag { label, .. }
            | Self::ShowToast { label, .. } => label.as_deref(),
        }
    }

    pub fn dialogue_id(&self) -> Option<&str> {
        match self {
            Self::OpenDialogue { dialogue_id, .. } => Some(dialogue_id),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct Dialogue {
    pub id: String,
    pub start_node_id: String,
    pub nodes: Vec<DialogueNode>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct DialogueChoice {
    pub label: String,
    pub next: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(
    tag = "type",
    rename_all = "snake_case",
    rename_all_fields = "camelCase",
    deny_unknown_fields
)]
pub enum DialogueNode {
    Line {
        id: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        speaker: Option<String>,
        text: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        next: Option<String>,
    },
    Choice {
        id: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        prompt: Option<String>,
        choices: Vec<DialogueChoice>,
    },
    Condition {
        id: String,
        flag: String,
        if_true: String,
        if_false: String,
    },
    Jump {
        id: String,
        target: String,
    },
    Action {
        id: String,
        action: AuthoringAction,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        next: Option<String>,
    },
    End {
        id: String,
    },
}

impl DialogueNode {
    pub fn id(&self) -> &str {
        match self {
            Self::Line { id, .. }
            | Self::Choice { id, .. }
            | Self::Condition { id, .. }
            | Self::Jump { id, .. }
            | Self::Action { id, .. }
            | Self::End { id } => id,
        }
    }

    pub fn explicit_edges(&self) -> Vec<&str> {
        match self {
            Self::Line { next, .. } | Self::Action { next, .. } => {
                next.as_deref().into_iter().collect()
            }
            Self::Choice { choices, .. } => {
                choices.iter().map(|choice| choice.next.as_str()).collect()
            }
            Self::Condition {
                if_true, if_false, ..
            } => vec![if_true.as_str(), if_false.as_str()],
            Self::Jump { target, .. } => vec![target.as_str()],
            Self::End { .. } => Vec::new(),
        }
    }

    pub fn falls_through(&self) -> bool {
        matches!(
            self,
            Self::Line { next: None, .. } | Self::Action { next: None, .. }
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Facing {
    Up,
    Down,
    Left,
    Right,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Movement {
    Static,
    Wander,
    Patrol,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct Npc {
    pub id: String,
    pub sprite: String,
    pub x: f64,
    pub y: f64,
    pub facing: Facing,
    pub movement: Movement,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interaction_id: Option<String>,
}

impl Npc {
    pub fn position(&self) -> Point {
        Point::new(self.x, self.y)
    }
}
