use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::authoring::{Overlay, Tileset};
use super::model::{Poi, PoiAction, Point};

pub const DEFAULT_PLAYER_SPAWN: Point = Point::new(64.0, 64.0);

pub const PLAYER_SPAWN_ID: &str = "playerSpawn";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct RuntimeWorld {
    pub glossary: Vec<Poi>,
    pub map_data: MapData,
    pub ui_texts: BTreeMap<String, String>,
    pub interactions: Vec<RuntimeInteraction>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct MapData {
    pub tile_size: u32,
    pub columns: u32,
    pub rows: u32,
    pub terrain: Vec<Vec<i32>>,
    pub tilesets: Vec<Tileset>,
    pub overlay: Overlay,
    pub objects: Vec<RuntimeObject>,
    pub npc_positions: BTreeMap<String, Point>,
    pub player_spawn: Point,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct RuntimeObject {
    pub key: String,
    pub texture: String,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    pub depth: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub poi_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct RuntimeInteraction {
    pub id: String,
    pub trigger_id: String,
    pub actions: Vec<PoiAction>,
}

impl RuntimeWorld {
    pub fn poi(&self, id: &str) -> Option<&Poi> {
        self.glossary.iter().find(|poi| poi.id == id)
    }

    pub fn interaction(&self, id: &str) -> Option<&RuntimeInteraction> {
        self.interactions
            .iter()
            .find(|interaction| interaction.id == id)
    }
}
