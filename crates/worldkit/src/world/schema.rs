use std::fmt::Display;

use serde::de::DeserializeOwned;
use serde_json::Value;
use thiserror::Error;

use super::authoring::{
    AuthoringAction, AuthoringWorld, DialogueNode, MapDef, UpperRule, AUTHORING_SCHEMA_VERSION,
};
use super::model::{Poi, PoiAction, Rect, Shape};
use super::runtime::RuntimeWorld;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("schema violation at {path}: {message}")]
pub struct SchemaError {
    pub path: String,
    pub message: String,
}

impl SchemaError {
    fn at(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

type SchemaResult<T> = Result<T, SchemaError>;

pub fn parse_authoring_world(raw: &str) -> SchemaResult<AuthoringWorld> {
    let world = deserialize_str::<AuthoringWorld>(raw)?;
    check_authoring_world(&world)?;
    Ok(world)
}

pub fn parse_authoring_value(value: Value) -> SchemaResult<AuthoringWorld> {
    let world = serde_path_to_error::deserialize::<_, AuthoringWorld>(value).map_err(path_error)?;
    check_authoring_world(&world)?;
    Ok(world)
}

pub fn parse_runtime_world(raw: &str) -> SchemaResult<RuntimeWorld> {
    let world = deserialize_str::<RuntimeWorld>(raw)?;
    check_grid(
        "mapData",
        world.map_data.tile_size,
        world.map_data.columns,
        world.map_data.rows,
        &world.map_data.terrain,
    )?;
    for (index, poi) in world.glossary.iter().enumerate() {
        check_poi(&format!("glossary[{index}]"), poi)?;
    }
    Ok(world)
}

fn deserialize_str<T: DeserializeOwned>(raw: &str) -> SchemaResult<T> {
    let mut deserializer = serde_json::Deserializer::from_str(raw);
    let value = serde_path_to_error::deserialize::<_, T>(&mut deserializer).map_err(path_error)?;
    deserializer
        .end()
        .map_err(|error| SchemaError::at("<root>", error.to_string()))?;
    Ok(value)
}

fn path_error<E: Display>(error: serde_path_to_error::Error<E>) -> SchemaError {
    let path = error.path().to_string();
    let source = error.into_inner();
    if path.is_empty() || path == "." {
        SchemaError::at("<root>", source.to_string())
    } else {
        SchemaError::at(path, source.to_string())
    }
}

pub fn check_authoring_world(world: &AuthoringWorld) -> SchemaResult<()> {
    if world.meta.schema_version != AUTHORING_SCHEMA_VERSION {
        return Err(SchemaError::at(
            "meta.schemaVersion",
            format!(
                "expected {AUTHORING_SCHEMA_VERSION}, got {}",
                world.meta.schema_version
            ),
        ));
    }
    require_text("meta.projectId", &world.meta.project_id)?;
    check_map("map", &world.map)?;

    for (index, object) in world.objects.iter().enumerate() {
        let path = format!("objects[{index}]");
        require_text(&format!("{path}.id"), &object.id)?;
        require_text(&format!("{path}.key"), &object.key)?;
        require_text(&format!("{path}.texture"), &object.texture)?;
        require_finite(&format!("{path}.x"), object.x)?;
        require_finite(&format!("{path}.y"), object.y)?;
        require_positive(&format!("{path}.width"), object.width)?;
        require_positive(&format!("{path}.height"), object.height)?;
        require_finite(&format!("{path}.depth"), object.depth)?;
        require_optional_text(&format!("{path}.poiId"), object.poi_id.as_deref())?;
    }

    for (index, collider) in world.colliders.iter().enumerate() {
        let path = format!("colliders[{index}]");
        require_text(&format!("{path}.id"), &collider.id)?;
        require_optional_text(&format!("{path}.objectId"), collider.object_id.as_deref())?;
        check_shape(&format!("{path}.shape"), &collider.shape)?;
    }

    for (index, trigger) in world.triggers.iter().enumerate() {
        let path = format!("triggers[{index}]");
        require_text(&format!("{path}.id"), &trigger.id)?;
        require_optional_text(&format!("{path}.objectId"), trigger.object_id.as_deref())?;
        require_optional_text(
            &format!("{path}.interactionId"),
            trigger.interaction_id.as_deref(),
        )?;
        check_shape(&format!("{path}.shape"), &trigger.shape)?;
    }

    for (index, interaction) in world.interactions.iter().enumerate() {
        let path = format!("interactions[{index}]");
        require_text(&format!("{path}.id"), &interaction.id)?;
        require_text(&format!("{path}.triggerId"), &interaction.trigger_id)?;
        if interaction.actions.is_empty() {
            return Err(SchemaError::at(
                format!("{path}.actions"),
                "must contain at least one action",
            ));
        }
        for (action_index, action) in interaction.actions.iter().enumerate() {
            check_authoring_action(&format!("{path}.actions[{action_index}]"), action)?;
        }
    }

    for (index, dialogue) in world.dialogues.iter().enumerate() {
        let path = format!("dialogues[{index}]");
        require_text(&format!("{path}.id"), &dialogue.id)?;
        require_text(&format!("{path}.startNodeId"), &dialogue.start_node_id)?;
        if dialogue.nodes.is_empty() {
            return Err(SchemaError::at(
                format!("{path}.nodes"),
                "must contain at least one node",
            ));
        }
        for (node_index, node) in dialogue.nodes.iter().enumerate() {
            check_dialogue_node(&format!("{path}.nodes[{node_index}]"), node)?;
        }
    }

    for (index, npc) in world.npcs.iter().enumerate() {
        let path = format!("npcs[{index}]");
        require_text(&format!("{path}.id"), &npc.id)?;
        require_text(&format!("{path}.sprite"), &npc.sprite)?;
        require_finite(&format!("{path}.x"), npc.x)?;
        require_finite(&format!("{path}.y"), npc.y)?;
        require_optional_text(
            &format!("{path}.interactionId"),
            npc.interaction_id.as_deref(),
        )?;
    }

    for (index, poi) in world.poi_index.iter().enumerate() {
        check_poi(&format!("poiIndex[{index}]"), poi)?;
    }

    for key in world.ui_texts.keys() {
        require_text(&format!("uiTexts[{key:?}]"), key)?;
    }

    Ok(())
}

fn check_map(path: &str, map: &MapDef) -> SchemaResult<()> {
    check_grid(path, map.tile_size, map.columns, map.rows, &map.terrain)?;
    for (index, tileset) in map.tilesets.iter().enumerate() {
        let tileset_path = format!("{path}.tilesets[{index}]");
        require_text(&format!("{tileset_path}.key"), &tileset.key)?;
        require_text(&format!("{tileset_path}.image"), &tileset.image)?;
        if let UpperRule::OneOf { terrain_ids } = &tileset.upper {
            if terrain_ids.is_empty() {
                return Err(SchemaError::at(
                    format!("{tileset_path}.upper.terrainIds"),
                    "must contain at least one terrain id",
                ));
            }
        }
    }

    let overlay_path = format!("{path}.overlay");
    require_text(&format!("{overlay_path}.key"), &map.overlay.key)?;
    require_text(&format!("{overlay_path}.image"), &map.overlay.image)?;
    require_finite(&format!("{overlay_path}.x"), map.overlay.x)?;
    require_finite(&format!("{overlay_path}.y"), map.overlay.y)?;
    require_finite(&format!("{overlay_path}.depth"), map.overlay.depth)?;
    if !(0.0..=1.0).contains(&map.overlay.alpha) {
        return Err(SchemaError::at(
            format!("{overlay_path}.alpha"),
            format!("expected a value in [0, 1], got {}", map.overlay.alpha),
        ));
    }
    Ok(())
}

fn check_grid(
    path: &str,
    tile_size: u32,
    columns: u32,
    rows: u32,
    terrain: &[Vec<i32>],
) -> SchemaResult<()> {
    if tile_size == 0 {
        return Err(SchemaError::at(format!("{path}.tileSize"), "must be > 0"));
    }
    if columns == 0 {
        return Err(SchemaError::at(format!("{path}.columns"), "must be > 0"));
    }
    if rows == 0 {
        return Err(SchemaError::at(format!("{path}.rows"), "must be > 0"));
    }
    if terrain.len() != rows as usize {
        return Err(SchemaError::at(
            format!("{path}.terrain"),
            format!("expected {rows} rows, got {}", terrain.len()),
        ));
    }
    for (row_index, row) in terrain.iter().enumerate() {
        if row.len() != columns as usize {
            return Err(SchemaError::at(
                format!("{path}.terrain[{row_index}]"),
                format!("expected {columns} columns, got {}", row.len()),
            ));
        }
    }
    Ok(())
}

fn check_shape(path: &str, shape: &Shape) -> SchemaResult<()> {
    match shape {
        Shape::Rect {
            x,
            y,
            width,
            height,
        } => check_rect(
            path,
            &Rect {
                x: *x,
                y: *y,
                width: *width,
                height: *height,
            },
        )?,
        Shape::Polygon { points } => {
            if points.len() < 3 {
                return Err(SchemaError::at(
                    format!("{path}.points"),
                    format!("polygon needs at least 3 points, got {}", points.len()),
                ));
            }
            for (index, point) in points.iter().enumerate() {
                require_finite(&format!("{path}.points[{index}].x"), point.x)?;
                require_finite(&format!("{path}.points[{index}].y"), point.y)?;
            }
        }
    }
    Ok(())
}

fn check_rect(path: &str, rect: &Rect) -> SchemaResult<()> {
    require_finite(&format!("{path}.x"), rect.x)?;
    require_finite(&format!("{path}.y"), rect.y)?;
    require_positive(&format!("{path}.width"), rect.width)?;
    require_positive(&format!("{path}.height"), rect.height)
}

fn check_authoring_action(path: &str, action: &AuthoringAction) -> SchemaResult<()> {
    require_text(&format!("{path}.id"), action.id())?;
    match action {
        AuthoringAction::OpenDialogue { dialogue_id, .. } => {
            require_text(&format!("{path}.dialogueId"), dialogue_id)
        }
        AuthoringAction::OpenLinkConfirm { href, .. } => require_text(&format!("{path}.href"), href),
        AuthoringAction::Teleport { x, y, .. } => {
            require_finite(&format!("{path}.x"), *x)?;
            require_finite(&format!("{path}.y"), *y)
        }
        AuthoringAction::SetFlag { flag, .. } => require_text(&format!("{path}.flag"), flag),
        AuthoringAction::ShowToast { message, .. } => {
            require_text(&format!("{path}.message"), message)
        }
    }
}

fn check_dialogue_node(path: &str, node: &DialogueNode) -> SchemaResult<()> {
    require_text(&format!("{path}.id"), node.id())?;
    match node {
        DialogueNode::Line { next, .. } => {
            require_optional_text(&format!("{path}.next"), next.as_deref())
        }
        DialogueNode::Choice { choices, .. } => {
            if choices.is_empty() {
                return Err(SchemaError::at(
                    format!("{path}.choices"),
                    "must contain at least one choice",
                ));
            }
            for (index, choice) in choices.iter().enumerate() {
                require_text(&format!("{path}.choices[{index}].label"), &choice.label)?;
                require_text(&format!("{path}.choices[{index}].next"), &choice.next)?;
            }
            Ok(())
        }
        DialogueNode::Condition {
            flag,
            if_true,
            if_false,
            ..
        } => {
            require_text(&format!("{path}.flag"), flag)?;
            require_text(&format!("{path}.ifTrue"), if_true)?;
            require_text(&format!("{path}.ifFalse"), if_false)
        }
        DialogueNode::Jump { target, .. } => require_text(&format!("{path}.target"), target),
        DialogueNode::Action { action, next, .. } => {
            check_authoring_action(&format!("{path}.action"), action)?;
            require_optional_text(&format!("{path}.next"), next.as_deref())
        }
        DialogueNode::End { .. } => Ok(()),
    }
}

fn check_poi(path: &str, poi: &Poi) -> SchemaResult<()> {
    require_text(&format!("{path}.id"), &poi.id)?;
    require_text(&format!("{path}.name"), &poi.name)?;
    require_optional_text(&format!("{path}.objectId"), poi.object_id.as_deref())?;
    require_optional_text(
        &format!("{path}.interactionId"),
        poi.interaction_id.as_deref(),
    )?;

    let world_path = format!("{path}.world");
    check_rect(&world_path, &poi.world.rect())?;
    if let Some(hitbox) = &poi.world.hitbox {
        check_rect(&format!("{world_path}.hitbox"), hitbox)?;
    }
    let radius = poi.world.interact_radius;
    if !radius.is_finite() || radius < 0.0 {
        return Err(SchemaError::at(
            format!("{world_path}.interactRadius"),
            format!("must be finite and >= 0, got {radius}"),
        ));
    }

    for (index, action) in poi.actions.iter().enumerate() {
        let action_path = format!("{path}.actions[{index}]");
        require_text(&format!("{action_path}.id"), action.id())?;
        if let PoiAction::OpenLink { href, .. } = action {
            require_text(&format!("{action_path}.href"), href)?;
        }
    }
    Ok(())
}

fn require_text(path: &str, value: &str) -> SchemaResult<()> {
    if value.trim().is_empty() {
        return Err(SchemaError::at(path, "must not be empty"));
    }
    Ok(())
}

fn require_optional_text(path: &str, value: Option<&str>) -> SchemaResult<()> {
    match value {
        Some(value) => require_text(path, value),
        None => Ok(()),
    }
}

fn require_finite(path: &str, value: f64) -> SchemaResult<()> {
    if !value.is_finite() {
        return Err(SchemaError::at(
            path,
            format!("expected finite number, got {value}"),
        ));
    }
    Ok(())
}

fn require_positive(path: &str, value: f64) -> SchemaResult<()> {
    if !value.is_finite() || value <= 0.0 {
        return Err(SchemaError::at(path, format!("must be > 0, got {value}")));
    }
    Ok(())
}
