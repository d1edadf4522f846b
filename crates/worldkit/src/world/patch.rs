use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::model::{Poi, PoiStatus, Point, Rect, VisualType};
use super::runtime::{RuntimeObject, RuntimeWorld};

pub const ADMIN_PATCH_VERSION: u32 = 1;

#[derive(Debug, Error)]
pub enum PatchError {
    #[error("unsupported patch version {found}; expected 1")]
    UnsupportedVersion { found: serde_json::Value },
    #[error("patch document is missing its `version` field")]
    MissingVersion,
    #[error("malformed patch document at {path}: {message}")]
    Malformed { path: String, message: String },
    #[error("failed to encode patch json: {0}")]
    Encode(#[source] serde_json::Error),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct AdminPatch {
    pub version: u32,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub pois: BTreeMap<String, PoiPatch>,
    // keyed by object key
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub map_objects: BTreeMap<String, ObjectPatch>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub npcs: BTreeMap<String, PointPatch>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub global_offset: Option<Point>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub ui_texts: BTreeMap<String, String>,
}

impl Default for AdminPatch {
    fn default() -> Self {
        Self {
            version: ADMIN_PATCH_VERSION,
            pois: BTreeMap::new(),
            map_objects: BTreeMap::new(),
            npcs: BTreeMap::new(),
            global_offset: None,
            ui_texts: BTreeMap::new(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct PoiPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<PoiStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dialog_text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub world: Option<PoiWorldPatch>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct PoiWorldPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub y: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hitbox: Option<HitboxPatch>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interact_radius: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub visual: Option<VisualType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub solid: Option<bool>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct HitboxPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub y: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<f64>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ObjectPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub y: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub depth: Option<f64>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PointPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub y: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MergedWorld {
    pub pois: Vec<Poi>,
    pub map_objects: Vec<RuntimeObject>,
    pub npc_positions: BTreeMap<String, Point>,
    pub player_spawn: Point,
    pub global_offset: Point,
    pub ui_texts: BTreeMap<String, String>,
}

fn take_newer<T>(slot: &mut Option<T>, newer: Option<T>) {
    if newer.is_some() {
        *slot = newer;
    }
}

fn override_with<T: Clone>(slot: &mut T, value: &Option<T>) {
    if let Some(value) = value {
        *slot = value.clone();
    }
}

impl AdminPatch {
    pub fn from_json(raw: &str) -> Result<Self, PatchError> {
        let value = serde_json::from_str::<serde_json::Value>(raw).map_err(|error| {
            PatchError::Malformed {
                path: "<root>".to_string(),
                message: error.to_string(),
            }
        })?;
        let version = value.get("version").ok_or(PatchError::MissingVersion)?;
        if version.as_u64() != Some(u64::from(ADMIN_PATCH_VERSION)) {
            return Err(PatchError::UnsupportedVersion {
                found: version.clone(),
            });
        }

        serde_path_to_error::deserialize::<_, AdminPatch>(value).map_err(|error| {
            let path = error.path().to_string();
            PatchError::Malformed {
                path,
                message: error.into_inner().to_string(),
            }
        })
    }

    pub fn to_json_pretty(&self) -> Result<String, PatchError> {
        serde_json::to_string_pretty(self).map_err(PatchError::Encode)
    }

    pub fn is_empty(&self) -> bool {
        self.pois.is_empty()
            && self.map_objects.is_empty()
            && self.npcs.is_empty()
            && self.global_offset.is_none()
            && self.ui_texts.is_empty()
    }

    pub fn layer(&mut self, newer: AdminPatch) {
        for (id, patch) in newer.pois {
            self.pois.entry(id).or_default().layer(patch);
        }
        for (key, patch) in newer.map_objects {
            self.map_objects.entry(key).or_default().layer(patch);
        }
        for (id, patch) in newer.npcs {
            self.npcs.entry(id).or_default().layer(patch);
        }
        take_newer(&mut self.global_offset, newer.global_offset);
        self.ui_texts.extend(newer.ui_texts);
    }
}

impl PoiPatch {
    pub fn layer(&mut self, newer: PoiPatch) {
        take_newer(&mut self.name, newer.name);
        take_newer(&mut self.status, newer.status);
        take_newer(&mut self.description, newer.description);
        take_newer(&mut self.tags, newer.tags);
        take_newer(&mut self.dialog_text, newer.dialog_text);
        if let Some(world) = newer.world {
            self.world.get_or_insert_with(Default::default).layer(world);
        }
    }
}

impl PoiWorldPatch {
    pub fn layer(&mut self, newer: PoiWorldPatch) {
        take_newer(&mut self.x, newer.x);
        take_newer(&mut self.y, newer.y);
        take_newer(&mut self.width, newer.width);
        take_newer(&mut self.height, newer.height);
        take_newer(&mut self.interact_radius, newer.interact_radius);
        take_newer(&mut self.visual, newer.visual);
        take_newer(&mut self.solid, newer.solid);
        if let Some(hitbox) = newer.hitbox {
            self.hitbox.get_or_insert_with(Default::default).layer(hitbox);
        }
    }
}

impl HitboxPatch {
    pub fn layer(&mut self, newer: HitboxPatch) {
        take_newer(&mut self.x, newer.x);
        take_newer(&mut self.y, newer.y);
        take_newer(&mut self.width, newer.width);
        take_newer(&mut self.height, newer.height);
    }

    fn apply(&self, base: Rect) -> Rect {
        let mut rect = base;
        override_with(&mut rect.x, &self.x);
        override_with(&mut rect.y, &self.y);
        override_with(&mut rect.width, &self.width);
        override_with(&mut rect.height, &self.height);
        rect
    }
}

impl ObjectPatch {
    pub fn layer(&mut self, newer: ObjectPatch) {
        take_newer(&mut self.x, newer.x);
        take_newer(&mut self.y, newer.y);
        take_newer(&mut self.width, newer.width);
        take_newer(&mut self.height, newer.height);
        take_newer(&mut self.depth, newer.depth);
    }
}

impl PointPatch {
    pub fn layer(&mut self, newer: PointPatch) {
        take_newer(&mut self.x, newer.x);
        take_newer(&mut self.y, newer.y);
    }

    fn apply(&self, base: Point) -> Point {
        Point::new(self.x.unwrap_or(base.x), self.y.unwrap_or(base.y))
    }
}

pub fn merge_world(base: &RuntimeWorld, patch: &AdminPatch) -> MergedWorld {
    let (npc_positions, player_spawn) = merge_npc_positions(
        &base.map_data.npc_positions,
        base.map_data.player_spawn,
        &patch.npcs,
    );
    let mut ui_texts = base.ui_texts.clone();
    ui_texts.extend(
        patch
            .ui_texts
            .iter()
            .map(|(key, text)| (key.clone(), text.clone())),
    );

    MergedWorld {
        pois: merge_pois(&base.glossary, &patch.pois),
        map_objects: merge_map_objects(&base.map_data.objects, &patch.map_objects),
        npc_positions,
        player_spawn,
        global_offset: patch.global_offset.unwrap_or(Point::new(0.0, 0.0)),
        ui_texts,
    }
}

pub fn merge_pois(base: &[Poi], patches: &BTreeMap<String, PoiPatch>) -> Vec<Poi> {
    base.iter()
        .map(|poi| match patches.get(&poi.id) {
            Some(patch) => apply_poi_patch(poi, patch),
            None => poi.clone(),
        })
        .collect()
}

fn apply_poi_patch(base: &Poi, patch: &PoiPatch) -> Poi {
    let mut poi = base.clone();
    override_with(&mut poi.name, &patch.name);
    override_with(&mut poi.status, &patch.status);
    override_with(&mut poi.description, &patch.description);
    override_with(&mut poi.tags, &patch.tags);
    if patch.dialog_text.is_some() {
        poi.dialog_text = patch.dialog_text.clone();
    }

    if let Some(world_patch) = &patch.world {
        let world = &mut poi.world;
        override_with(&mut world.x, &world_patch.x);
        override_with(&mut world.y, &world_patch.y);
        override_with(&mut world.width, &world_patch.width);
        override_with(&mut world.height, &world_patch.height);
        override_with(&mut world.interact_radius, &world_patch.interact_radius);
        override_with(&mut world.visual, &world_patch.visual);
        override_with(&mut world.solid, &world_patch.solid);
        if let Some(hitbox_patch) = &world_patch.hitbox {
            let base_hitbox = world.hitbox.unwrap_or(Rect {
                x: 0.0,
                y: 0.0,
                width: world.width,
                height: world.height,
            });
            world.hitbox = Some(hitbox_patch.apply(base_hitbox));
        }
    }
    poi
}

pub fn merge_map_objects(
    base: &[RuntimeObject],
    patches: &BTreeMap<String, ObjectPatch>,
) -> Vec<RuntimeObject> {
    base.iter()
        .map(|object| {
            let mut merged = object.clone();
            if let Some(patch) = patches.get(&object.key) {
                override_with(&mut merged.x, &patch.x);
                override_with(&mut merged.y, &patch.y);
                override_with(&mut merged.width, &patch.width);
                override_with(&mut merged.height, &patch.height);
                override_with(&mut merged.depth, &patch.depth);
            }
            merged
        })
        .collect()
}

pub fn merge_npc_positions(
    base: &BTreeMap<String, Point>,
    base_spawn: Point,
    patches: &BTreeMap<String, PointPatch>,
) -> (BTreeMap<String, Point>, Point) {
    let positions = base
        .iter()
        .map(|(id, position)| {
            let merged = patches
                .get(id)
                .map_or(*position, |patch| patch.apply(*position));
            (id.clone(), merged)
        })
        .collect::<BTreeMap<_, _>>();
    let spawn = patches
        .get(super::runtime::PLAYER_SPAWN_ID)
        .map_or(base_spawn, |patch| patch.apply(base_spawn));
    (positions, spawn)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::world::compiler::{compile_world, CompileOptions};
    use crate::world::test_support::canonical_world;

    fn base() -> RuntimeWorld {
        compile_world(&canonical_world(), &CompileOptions::default())
            .expect("compile")
            .runtime
    }

    fn hq(pois: &[Poi]) -> &Poi {
        pois.iter()
            .find(|poi| poi.id == "company-hq")
            .expect("company-hq")
    }

    #[test]
    fn empty_patch_reproduces_base() {
        let base = base();
        let merged = merge_world(&base, &AdminPatch::default());
        assert_eq!(merged.pois, base.glossary);
        assert_eq!(merged.map_objects, base.map_data.objects);
        assert_eq!(merged.npc_positions, base.map_data.npc_positions);
        assert_eq!(merged.player_spawn, base.map_data.player_spawn);
        assert_eq!(merged.global_offset, Point::new(0.0, 0.0));
        assert_eq!(merged.ui_texts, base.ui_texts);
    }

    #[test]
    fn present_fields_replace_and_absent_fields_fall_back() {
        let base = base();
        let mut patch = AdminPatch::default();
        patch.pois.insert(
            "company-hq".to_string(),
            PoiPatch {
                name: Some("Neue Zentrale".to_string()),
                world: Some(PoiWorldPatch {
                    x: Some(300.0),
                    ..PoiWorldPatch::default()
                }),
                ..PoiPatch::default()
            },
        );

        let merged = merge_world(&base, &patch);
        let before = hq(&base.glossary).clone();
        let after = hq(&merged.pois);
        assert_eq!(after.name, "Neue Zentrale");
        assert_eq!(after.world.x, 300.0);
        assert_eq!(after.world.y, before.world.y);
        assert_eq!(after.description, before.description);
        assert_eq!(after.actions, before.actions);
        assert_eq!(hq(&base.glossary), &before, "base untouched");
        assert_ne!(after, &before);
    }

    #[test]
    fn partial_hitbox_patch_keeps_untouched_hitbox_fields() {
        let base = base();
        let before = hq(&base.glossary).world.hitbox.expect("fixture hitbox");
        let mut patch = AdminPatch::default();
        patch.pois.insert(
            "company-hq".to_string(),
            PoiPatch {
                world: Some(PoiWorldPatch {
                    hitbox: Some(HitboxPatch {
                        x: Some(4.0),
                        ..HitboxPatch::default()
                    }),
                    ..PoiWorldPatch::default()
                }),
                ..PoiPatch::default()
            },
        );

        let merged = merge_world(&base, &patch);
        let hitbox = hq(&merged.pois).world.hitbox.expect("hitbox");
        assert_eq!(hitbox.x, 4.0);
        assert_eq!(hitbox.y, before.y);
        assert_eq!(hitbox.width, before.width);
        assert_eq!(hitbox.height, before.height);
    }

    #[test]
    fn layered_hitbox_edits_merge_key_by_key() {
        let mut session = AdminPatch::default();
        session.layer(hitbox_patch(HitboxPatch {
            width: Some(50.0),
            height: Some(20.0),
            ..HitboxPatch::default()
        }));
        session.layer(hitbox_patch(HitboxPatch {
            x: Some(7.0),
            ..HitboxPatch::default()
        }));

        let hitbox = session.pois["company-hq"]
            .world
            .as_ref()
            .and_then(|world| world.hitbox)
            .expect("hitbox");
        assert_eq!(
            hitbox,
            HitboxPatch {
                x: Some(7.0),
                y: None,
                width: Some(50.0),
                height: Some(20.0),
            }
        );
    }

    fn hitbox_patch(hitbox: HitboxPatch) -> AdminPatch {
        let mut patch = AdminPatch::default();
        patch.pois.insert(
            "company-hq".to_string(),
            PoiPatch {
                world: Some(PoiWorldPatch {
                    hitbox: Some(hitbox),
                    ..PoiWorldPatch::default()
                }),
                ..PoiPatch::default()
            },
        );
        patch
    }

    #[test]
    fn missing_base_hitbox_starts_from_the_poi_box() {
        let mut base = base();
        for poi in &mut base.glossary {
            poi.world.hitbox = None;
        }
        let merged = merge_world(
            &base,
            &hitbox_patch(HitboxPatch {
                y: Some(10.0),
                ..HitboxPatch::default()
            }),
        );
        let poi = hq(&merged.pois);
        assert_eq!(
            poi.world.hitbox,
            Some(Rect {
                x: 0.0,
                y: 10.0,
                width: poi.world.width,
                height: poi.world.height,
            })
        );
    }

    #[test]
    fn object_npc_spawn_and_ui_overrides_apply_independently() {
        let base = base();
        let object_key = base.map_data.objects[0].key.clone();
        let npc_id = base
            .map_data
            .npc_positions
            .keys()
            .find(|id| id.as_str() != "playerSpawn")
            .expect("npc")
            .clone();

        let mut patch = AdminPatch::default();
        patch.map_objects.insert(
            object_key.clone(),
            ObjectPatch {
                depth: Some(99.0),
                ..ObjectPatch::default()
            },
        );
        patch.npcs.insert(
            npc_id.clone(),
            PointPatch {
                y: Some(12.0),
                ..PointPatch::default()
            },
        );
        patch.npcs.insert(
            "playerSpawn".to_string(),
            PointPatch {
                x: Some(1.0),
                y: Some(2.0),
            },
        );
        patch.global_offset = Some(Point::new(-8.0, 4.0));
        patch
            .ui_texts
            .insert("hud.interact".to_string(), "Taste E".to_string());

        let merged = merge_world(&base, &patch);
        let object = &merged.map_objects[0];
        assert_eq!(object.depth, 99.0);
        assert_eq!(object.x, base.map_data.objects[0].x);
        let npc = merged.npc_positions[&npc_id];
        assert_eq!(npc.x, base.map_data.npc_positions[&npc_id].x);
        assert_eq!(npc.y, 12.0);
        assert_eq!(merged.player_spawn, Point::new(1.0, 2.0));
        assert_eq!(merged.npc_positions["playerSpawn"], Point::new(1.0, 2.0));
        assert_eq!(merged.global_offset, Point::new(-8.0, 4.0));
        assert_eq!(merged.ui_texts["hud.interact"], "Taste E");
        assert_eq!(merged.pois, base.glossary);
    }

    #[test]
    fn patches_for_unknown_ids_are_ignored() {
        let base = base();
        let mut patch = AdminPatch::default();
        patch.pois.insert("ghost".to_string(), PoiPatch::default());
        patch
            .map_objects
            .insert("ghost".to_string(), ObjectPatch::default());
        let merged = merge_world(&base, &patch);
        assert_eq!(merged.pois.len(), base.glossary.len());
        assert_eq!(merged.map_objects.len(), base.map_data.objects.len());
    }

    #[test]
    fn export_import_round_trip_preserves_patch() {
        let mut patch = hitbox_patch(HitboxPatch {
            x: Some(3.0),
            ..HitboxPatch::default()
        });
        patch.global_offset = Some(Point::new(5.0, 6.0));
        let json = patch.to_json_pretty().expect("encode");
        let imported = AdminPatch::from_json(&json).expect("import");
        assert_eq!(imported, patch);
        assert!(!json.contains("mapObjects"));
    }

    #[test]
    fn import_rejects_other_versions() {
        let error = AdminPatch::from_json(r#"{"version": 2, "pois": {}}"#).expect_err("v2");
        assert!(matches!(error, PatchError::UnsupportedVersion { found } if found == 2));

        let error = AdminPatch::from_json(r#"{"pois": {}}"#).expect_err("no version");
        assert!(matches!(error, PatchError::MissingVersion));
    }

    #[test]
    fn non_integer_version_is_unsupported_not_missing() {
        for raw in [r#"{"version": -1}"#, r#"{"version": "1"}"#, r#"{"version": 1.0}"#] {
            let error = AdminPatch::from_json(raw).expect_err("bad version");
            assert!(
                matches!(error, PatchError::UnsupportedVersion { .. }),
                "{raw}: {error}"
            );
        }

        let error = AdminPatch::from_json(r#"{"version": "1"}"#).expect_err("string version");
        assert_eq!(
            error.to_string(),
            "unsupported patch version \"1\"; expected 1"
        );
    }

    #[test]
    fn import_reports_malformed_entries_with_path() {
        let error = AdminPatch::from_json(r#"{"version": 1, "npcs": {"guide": {"z": 1}}}"#)
            .expect_err("bad npc patch");
        let PatchError::Malformed { path, message } = error else {
            panic!("expected malformed error");
        };
        assert!(path.starts_with("npcs.guide"), "{path}");
        assert!(message.contains('z'));
    }

    #[test]
    fn default_patch_is_empty_and_versioned() {
        let patch = AdminPatch::default();
        assert!(patch.is_empty());
        assert_eq!(patch.version, ADMIN_PATCH_VERSION);
    }
}
