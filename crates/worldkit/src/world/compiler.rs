use std::collections::{BTreeMap, HashMap, HashSet};
use std::fmt;

use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

use super::authoring::{AuthoringAction, AuthoringWorld, Interaction};
use super::codegen::{render_modules, GeneratedModules};
use super::model::{Poi, PoiAction};
use super::runtime::{
    MapData, RuntimeInteraction, RuntimeObject, RuntimeWorld, DEFAULT_PLAYER_SPAWN,
    PLAYER_SPAWN_ID,
};
use super::schema::{parse_authoring_value, SchemaError};

pub const DEFAULT_CONFIRM_MESSAGE: &str = "Externer Link. Fortfahren?";

#[derive(Debug, Clone, Default)]
pub struct CompileOptions {
    pub source_path: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WarningCode {
    MissingTrigger,
    MissingDialogue,
}

impl WarningCode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::MissingTrigger => "MISSING_TRIGGER",
            Self::MissingDialogue => "MISSING_DIALOGUE",
        }
    }
}

impl fmt::Display for WarningCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CompileWarning {
    pub code: WarningCode,
    pub message: String,
}

impl fmt::Display for CompileWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

#[derive(Debug, Error)]
pub enum CompileError {
    #[error(transparent)]
    Schema(#[from] SchemaError),
    #[error("failed to render generated modules: {0}")]
    Render(#[from] serde_json::Error),
}

#[derive(Debug, Clone)]
pub struct CompileOutput {
    pub runtime: RuntimeWorld,
    pub generated: GeneratedModules,
    pub warnings: Vec<CompileWarning>,
}

pub fn compile(raw: Value, options: &CompileOptions) -> Result<CompileOutput, CompileError> {
    let world = parse_authoring_value(raw)?;
    compile_world(&world, options)
}

pub fn compile_world(
    world: &AuthoringWorld,
    options: &CompileOptions,
) -> Result<CompileOutput, CompileError> {
    let warnings = collect_warnings(world);
    let runtime = RuntimeWorld {
        glossary: build_glossary(world),
        map_data: build_map_data(world),
        ui_texts: world.ui_texts.clone(),
        interactions: build_interactions(world),
    };
    let generated = render_modules(&runtime, &options.source_path)?;
    Ok(CompileOutput {
        runtime,
        generated,
        warnings,
    })
}

fn collect_warnings(world: &AuthoringWorld) -> Vec<CompileWarning> {
    let trigger_ids = world
        .triggers
        .iter()
        .map(|trigger| trigger.id.as_str())
        .collect::<HashSet<_>>();
    let dialogue_ids = world
        .dialogues
        .iter()
        .map(|dialogue| dialogue.id.as_str())
        .collect::<HashSet<_>>();

    let mut warnings = Vec::new();
    for interaction in sorted_by_id(&world.interactions, |interaction| &interaction.id) {
        if !trigger_ids.contains(interaction.trigger_id.as_str()) {
            warnings.push(CompileWarning {
                code: WarningCode::MissingTrigger,
                message: format!(
                    "interaction '{}' references missing trigger '{}'",
                    interaction.id, interaction.trigger_id
                ),
            });
        }
        for action in &interaction.actions {
            if let Some(dialogue_id) = action.dialogue_id() {
                if !dialogue_ids.contains(dialogue_id) {
                    warnings.push(CompileWarning {
                        code: WarningCode::MissingDialogue,
                        message: format!(
                            "action '{}' in interaction '{}' opens missing dialogue '{dialogue_id}'",
                            action.id(),
                            interaction.id
                        ),
                    });
                }
            }
        }
    }
    warnings
}

fn sorted_by_id<'a, T>(items: &'a [T], id: impl Fn(&T) -> &String) -> Vec<&'a T> {
    let mut sorted = items.iter().collect::<Vec<_>>();
    sorted.sort_by(|a, b| id(a).cmp(id(b)));
    sorted
}

pub fn translate_action(action: &AuthoringAction) -> PoiAction {
    let id = action.id().to_string();
    let label = action.label().map(str::to_string);
    match action {
        AuthoringAction::OpenDialogue { dialogue_id, .. } => PoiAction::OpenModal {
            id,
            label,
            dialogue_id: Some(dialogue_id.clone()),
        },
        AuthoringAction::OpenLinkConfirm {
            href,
            confirm_message,
            ..
        } => PoiAction::OpenLink {
            id,
            label,
            href: href.clone(),
            confirm_message: Some(
                confirm_message
                    .clone()
                    .unwrap_or_else(|| DEFAULT_CONFIRM_MESSAGE.to_string()),
            ),
        },
        AuthoringAction::Teleport { .. }
        | AuthoringAction::SetFlag { .. }
        | AuthoringAction::ShowToast { .. } => PoiAction::ComingSoon { id, label },
    }
}

pub fn merge_actions_by_id(actions: impl IntoIterator<Item = PoiAction>) -> Vec<PoiAction> {
    let mut merged = Vec::<PoiAction>::new();
    let mut position_by_id = HashMap::<String, usize>::new();
    for action in actions {
        match position_by_id.get(action.id()) {
            Some(&position) => {
                let earlier = merged[position].clone();
                merged[position] = earlier.overlaid(action);
            }
            None => {
                position_by_id.insert(action.id().to_string(), merged.len());
                merged.push(action);
            }
        }
    }
    merged
}

fn build_glossary(world: &AuthoringWorld) -> Vec<Poi> {
    let interactions_by_id = world
        .interactions
        .iter()
        .map(|interaction| (interaction.id.as_str(), interaction))
        .collect::<HashMap<&str, &Interaction>>();

    sorted_by_id(&world.poi_index, |poi| &poi.id)
        .into_iter()
        .map(|poi| {
            let derived = poi
                .interaction_id
                .as_deref()
                .and_then(|id| interactions_by_id.get(id))
                .map(|interaction| {
                    interaction
                        .actions
                        .iter()
                        .map(translate_action)
                        .collect::<Vec<_>>()
                })
                .unwrap_or_default();
            let mut entry = poi.clone();
            entry.actions = merge_actions_by_id(poi.actions.iter().cloned().chain(derived));
            entry
        })
        .collect()
}

fn build_map_data(world: &AuthoringWorld) -> MapData {
    let mut visible = world
        .objects
        .iter()
        .filter(|object| object.visible)
        .collect::<Vec<_>>();
    visible.sort_by(|a, b| a.key.cmp(&b.key));
    let objects = visible
        .into_iter()
        .map(|object| RuntimeObject {
            key: object.key.clone(),
            texture: object.texture.clone(),
            x: object.x,
            y: object.y,
            width: object.width,
            height: object.height,
            depth: object.depth,
            poi_id: object.poi_id.clone(),
        })
        .collect();

    let npc_positions = world
        .npcs
        .iter()
        .map(|npc| (npc.id.clone(), npc.position()))
        .collect::<BTreeMap<_, _>>();
    let player_spawn = world
        .npcs
        .iter()
        .find(|npc| npc.id == PLAYER_SPAWN_ID)
        .map(|npc| npc.position())
        .unwrap_or(DEFAULT_PLAYER_SPAWN);

    MapData {
        tile_size: world.map.tile_size,
        columns: world.map.columns,
        rows: world.map.rows,
        terrain: world.map.terrain.clone(),
        tilesets: world.map.tilesets.clone(),
        overlay: world.map.overlay.clone(),
        objects,
        npc_positions,
        player_spawn,
    }
}

fn build_interactions(world: &AuthoringWorld) -> Vec<RuntimeInteraction> {
    sorted_by_id(&world.interactions, |interaction| &interaction.id)
        .into_iter()
        .map(|interaction| RuntimeInteraction {
            id: interaction.id.clone(),
            trigger_id: interaction.trigger_id.clone(),
            actions: interaction.actions.iter().map(translate_action).collect(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::world::model::Point;
    use crate::world::test_support::{canonical_world, canonical_world_value};

    fn options() -> CompileOptions {
        CompileOptions {
            source_path: "assets/world/world.json".to_string(),
        }
    }

    #[test]
    fn company_hq_glossary_entry_carries_the_confirmed_link() {
        let output = compile(canonical_world_value(), &options()).expect("compile");
        let hq = output.runtime.poi("company-hq").expect("company-hq");

        let links = hq
            .actions
            .iter()
            .filter(|action| action.type_tag() == "open_link")
            .collect::<Vec<_>>();
        assert_eq!(links.len(), 1);

        let source = canonical_world();
        let interaction = source
            .interactions
            .iter()
            .find(|interaction| Some(interaction.id.as_str()) == hq.interaction_id.as_deref())
            .expect("linked interaction");
        let AuthoringAction::OpenLinkConfirm {
            href: source_href,
            confirm_message: source_confirm,
            ..
        } = &interaction.actions[0]
        else {
            panic!("expected open_link_confirm");
        };
        let PoiAction::OpenLink {
            href,
            confirm_message,
            ..
        } = links[0]
        else {
            panic!("expected open_link");
        };
        assert_eq!(href, source_href);
        assert_eq!(
            confirm_message.as_deref(),
            Some(
                source_confirm
                    .as_deref()
                    .unwrap_or(DEFAULT_CONFIRM_MESSAGE)
            )
        );
    }

    #[test]
    fn missing_confirm_message_falls_back_to_default() {
        let action = AuthoringAction::OpenLinkConfirm {
            id: "a".to_string(),
            label: None,
            href: "https://example.com".to_string(),
            confirm_message: None,
        };
        assert_eq!(
            translate_action(&action),
            PoiAction::OpenLink {
                id: "a".to_string(),
                label: None,
                href: "https://example.com".to_string(),
                confirm_message: Some("Externer Link. Fortfahren?".to_string()),
            }
        );
    }

    #[test]
    fn non_link_non_dialogue_actions_become_coming_soon() {
        let action = AuthoringAction::SetFlag {
            id: "flag".to_string(),
            label: Some("Merken".to_string()),
            flag: "seen".to_string(),
            value: true,
        };
        assert_eq!(
            translate_action(&action),
            PoiAction::ComingSoon {
                id: "flag".to_string(),
                label: Some("Merken".to_string()),
            }
        );
    }

    #[test]
    fn shared_action_id_is_merged_with_interaction_fields_winning() {
        let mut world = canonical_world();
        let interaction_id = world
            .poi_index
            .iter()
            .find(|poi| poi.id == "company-hq")
            .and_then(|poi| poi.interaction_id.clone())
            .expect("linked");
        let shared_id = world
            .interactions
            .iter()
            .find(|interaction| interaction.id == interaction_id)
            .expect("interaction")
            .actions[0]
            .id()
            .to_string();
        let hq = world
            .poi_index
            .iter_mut()
            .find(|poi| poi.id == "company-hq")
            .expect("company-hq");
        hq.actions = vec![PoiAction::OpenLink {
            id: shared_id.clone(),
            label: Some("Unsere Website".to_string()),
            href: "https://stale.example".to_string(),
            confirm_message: None,
        }];

        let output = compile_world(&world, &options()).expect("compile");
        let entry = output.runtime.poi("company-hq").expect("entry");
        let with_id = entry
            .actions
            .iter()
            .filter(|action| action.id() == shared_id)
            .collect::<Vec<_>>();
        assert_eq!(with_id.len(), 1);
        let PoiAction::OpenLink { label, href, .. } = with_id[0] else {
            panic!("expected open_link");
        };
        assert_ne!(href, "https://stale.example");
        assert_eq!(label.as_deref(), Some("Website"));
    }

    #[test]
    fn merge_keeps_first_position_for_repeated_ids() {
        let merged = merge_actions_by_id(vec![
            PoiAction::ComingSoon {
                id: "a".to_string(),
                label: None,
            },
            PoiAction::ComingSoon {
                id: "b".to_string(),
                label: None,
            },
            PoiAction::OpenModal {
                id: "a".to_string(),
                label: None,
                dialogue_id: Some("d".to_string()),
            },
        ]);
        assert_eq!(merged.len(), 2);
        assert_eq!(merged[0].id(), "a");
        assert_eq!(merged[0].type_tag(), "open_modal");
        assert_eq!(merged[1].id(), "b");
    }

    #[test]
    fn missing_trigger_yields_one_warning_and_still_compiles() {
        let mut value = canonical_world_value();
        value["interactions"][0]["triggerId"] = json!("trg-ghost");
        let interaction_id = value["interactions"][0]["id"]
            .as_str()
            .expect("id")
            .to_string();

        let output = compile(value, &options()).expect("compile");
        let missing = output
            .warnings
            .iter()
            .filter(|warning| warning.code == WarningCode::MissingTrigger)
            .collect::<Vec<_>>();
        assert_eq!(missing.len(), 1);
        assert!(missing[0].message.contains(&interaction_id));
        assert!(missing[0].message.contains("trg-ghost"));

        let projected = output
            .runtime
            .interaction(&interaction_id)
            .expect("interaction kept");
        assert_eq!(projected.trigger_id, "trg-ghost");
    }

    #[test]
    fn missing_dialogue_is_flagged_and_carried_through() {
        let mut world = canonical_world();
        world.dialogues.clear();

        let output = compile_world(&world, &options()).expect("compile");
        assert!(output
            .warnings
            .iter()
            .any(|warning| warning.code == WarningCode::MissingDialogue));
        let modal_targets = output
            .runtime
            .interactions
            .iter()
            .flat_map(|interaction| interaction.actions.iter())
            .filter_map(|action| match action {
                PoiAction::OpenModal { dialogue_id, .. } => dialogue_id.clone(),
                _ => None,
            })
            .collect::<Vec<_>>();
        assert!(!modal_targets.is_empty());
    }

    #[test]
    fn spawn_defaults_when_player_spawn_npc_is_absent() {
        let mut world = canonical_world();
        world.npcs.retain(|npc| npc.id != "playerSpawn");
        let output = compile_world(&world, &options()).expect("compile");
        assert_eq!(output.runtime.map_data.player_spawn, Point::new(64.0, 64.0));
    }

    #[test]
    fn spawn_uses_player_spawn_npc_when_present() {
        let world = canonical_world();
        let spawn = world
            .npcs
            .iter()
            .find(|npc| npc.id == "playerSpawn")
            .expect("spawn npc")
            .position();
        let output = compile_world(&world, &options()).expect("compile");
        assert_eq!(output.runtime.map_data.player_spawn, spawn);
        assert_eq!(
            output.runtime.map_data.npc_positions.get("playerSpawn"),
            Some(&spawn)
        );
    }

    #[test]
    fn only_visible_objects_sorted_by_key_reach_the_runtime() {
        let world = canonical_world();
        let output = compile_world(&world, &options()).expect("compile");
        let keys = output
            .runtime
            .map_data
            .objects
            .iter()
            .map(|object| object.key.as_str())
            .collect::<Vec<_>>();

        let mut expected = world
            .objects
            .iter()
            .filter(|object| object.visible)
            .map(|object| object.key.as_str())
            .collect::<Vec<_>>();
        expected.sort();
        assert_eq!(keys, expected);
        assert!(world.objects.iter().any(|object| !object.visible));
    }

    #[test]
    fn glossary_and_interactions_are_sorted_by_id() {
        let mut world = canonical_world();
        world.poi_index.reverse();
        world.interactions.reverse();
        let output = compile_world(&world, &options()).expect("compile");

        let poi_ids = output
            .runtime
            .glossary
            .iter()
            .map(|poi| poi.id.clone())
            .collect::<Vec<_>>();
        let mut sorted = poi_ids.clone();
        sorted.sort();
        assert_eq!(poi_ids, sorted);

        let interaction_ids = output
            .runtime
            .interactions
            .iter()
            .map(|interaction| interaction.id.clone())
            .collect::<Vec<_>>();
        let mut sorted = interaction_ids.clone();
        sorted.sort();
        assert_eq!(interaction_ids, sorted);
    }

    #[test]
    fn compiling_twice_is_byte_identical() {
        let first = compile(canonical_world_value(), &options()).expect("first");
        let second = compile(canonical_world_value(), &options()).expect("second");
        assert_eq!(first.runtime, second.runtime);
        assert_eq!(first.generated, second.generated);
        assert_eq!(
            serde_json::to_string(&first.runtime).expect("encode"),
            serde_json::to_string(&second.runtime).expect("encode")
        );
    }

    #[test]
    fn structural_violation_aborts_compilation() {
        let mut value = canonical_world_value();
        value["map"]["tileSize"] = json!(0);
        let error = compile(value, &options()).expect_err("structural");
        let CompileError::Schema(error) = error else {
            panic!("expected schema error");
        };
        assert_eq!(error.path, "map.tileSize");
    }
}
