use std::collections::{HashMap, HashSet, VecDeque};

use super::authoring::{AuthoringWorld, Dialogue};
use super::model::{Rect, Shape};

pub fn validate(world: &AuthoringWorld) -> Vec<String> {
    let mut issues = Vec::new();
    check_unique_ids(world, &mut issues);
    check_bounds(world, &mut issues);
    check_references(world, &mut issues);
    check_trigger_completeness(world, &mut issues);
    check_binding_cardinality(world, &mut issues);
    for dialogue in &world.dialogues {
        check_dialogue_graph(dialogue, &mut issues);
    }
    issues
}

fn check_unique_ids(world: &AuthoringWorld, issues: &mut Vec<String>) {
    report_duplicates(
        "Object",
        "id",
        world.objects.iter().map(|object| object.id.as_str()),
        issues,
    );
    report_duplicates(
        "Object",
        "key",
        world.objects.iter().map(|object| object.key.as_str()),
        issues,
    );
    report_duplicates(
        "Collider",
        "id",
        world.colliders.iter().map(|collider| collider.id.as_str()),
        issues,
    );
    report_duplicates(
        "Trigger",
        "id",
        world.triggers.iter().map(|trigger| trigger.id.as_str()),
        issues,
    );
    report_duplicates(
        "Interaction",
        "id",
        world
            .interactions
            .iter()
            .map(|interaction| interaction.id.as_str()),
        issues,
    );
    report_duplicates(
        "Dialogue",
        "id",
        world.dialogues.iter().map(|dialogue| dialogue.id.as_str()),
        issues,
    );
    report_duplicates(
        "NPC",
        "id",
        world.npcs.iter().map(|npc| npc.id.as_str()),
        issues,
    );
    report_duplicates(
        "POI",
        "id",
        world.poi_index.iter().map(|poi| poi.id.as_str()),
        issues,
    );
    for dialogue in &world.dialogues {
        report_duplicates(
            &format!("Dialogue '{}'", dialogue.id),
            "node id",
            dialogue.nodes.iter().map(|node| node.id()),
            issues,
        );
    }
}

fn report_duplicates<'a>(
    label: &str,
    field: &str,
    values: impl IntoIterator<Item = &'a str>,
    issues: &mut Vec<String>,
) {
    let mut seen = HashSet::<&str>::new();
    for value in values {
        if !seen.insert(value) {
            issues.push(format!("{label}: duplicate {field} '{value}'"));
        }
    }
}

struct Extent {
    width: f64,
    height: f64,
}

fn check_bounds(world: &AuthoringWorld, issues: &mut Vec<String>) {
    let map = Extent {
        width: world.map.pixel_width(),
        height: world.map.pixel_height(),
    };

    for object in &world.objects {
        check_rect_within(
            &format!("Object '{}'", object.id),
            &object.bounds(),
            &map,
            "map",
            issues,
        );
    }
    for collider in &world.colliders {
        check_shape_within(
            &format!("Collider '{}'", collider.id),
            &collider.shape,
            &map,
            issues,
        );
    }
    for trigger in &world.triggers {
        check_shape_within(
            &format!("Trigger '{}'", trigger.id),
            &trigger.shape,
            &map,
            issues,
        );
    }
    for poi in &world.poi_index {
        let label = format!("POI '{}'", poi.id);
        check_rect_within(&label, &poi.world.rect(), &map, "map", issues);
        if let Some(hitbox) = &poi.world.hitbox {
            let own = Extent {
                width: poi.world.width,
                height: poi.world.height,
            };
            check_rect_within(
                &format!("{label} hitbox"),
                hitbox,
                &own,
                "POI",
                issues,
            );
        }
    }
}

fn check_shape_within(label: &str, shape: &Shape, map: &Extent, issues: &mut Vec<String>) {
    match shape {
        Shape::Rect { .. } => {
            if let Some(rect) = shape.as_rect() {
                check_rect_within(label, &rect, map, "map", issues);
            }
        }
        Shape::Polygon { points } => {
            for (index, point) in points.iter().enumerate() {
                if point.x < 0.0 || point.y < 0.0 || point.x > map.width || point.y > map.height
                {
                    issues.push(format!(
                        "{label}: polygon point {index} ({}, {}) lies outside the map ({}x{})",
                        point.x, point.y, map.width, map.height
                    ));
                }
            }
        }
    }
}

fn check_rect_within(
    label: &str,
    rect: &Rect,
    extent: &Extent,
    extent_name: &str,
    issues: &mut Vec<String>,
) {
    if rect.width <= 0.0 || rect.height <= 0.0 {
        issues.push(format!(
            "{label}: size must be positive (width={}, height={})",
            rect.width, rect.height
        ));
        return;
    }
    if rect.x < 0.0 || rect.y < 0.0 {
        issues.push(format!(
            "{label}: origin is negative (x={}, y={})",
            rect.x, rect.y
        ));
    }
    if rect.right() > extent.width || rect.bottom() > extent.height {
        issues.push(format!(
            "{label}: extends beyond {extent_name} bounds ({}x{}); right={}, bottom={}",
            extent.width,
            extent.height,
            rect.right(),
            rect.bottom()
        ));
    }
}

fn check_references(world: &AuthoringWorld, issues: &mut Vec<String>) {
    let object_ids = id_set(world.objects.iter().map(|object| object.id.as_str()));
    let trigger_ids = id_set(world.triggers.iter().map(|trigger| trigger.id.as_str()));
    let interaction_ids = id_set(
        world
            .interactions
            .iter()
            .map(|interaction| interaction.id.as_str()),
    );
    let dialogue_ids = id_set(world.dialogues.iter().map(|dialogue| dialogue.id.as_str()));
    let poi_ids = id_set(world.poi_index.iter().map(|poi| poi.id.as_str()));

    for object in &world.objects {
        if let Some(poi_id) = object.poi_id.as_deref() {
            if !poi_ids.contains(poi_id) {
                issues.push(format!(
                    "Object '{}': references unknown poiId '{poi_id}'",
                    object.id
                ));
            }
        }
    }
    for collider in &world.colliders {
        if let Some(object_id) = collider.object_id.as_deref() {
            if !object_ids.contains(object_id) {
                issues.push(format!(
                    "Collider '{}': references unknown objectId '{object_id}'",
                    collider.id
                ));
            }
        }
    }
    for trigger in &world.triggers {
        if let Some(object_id) = trigger.object_id.as_deref() {
            if !object_ids.contains(object_id) {
                issues.push(format!(
                    "Trigger '{}': references unknown objectId '{object_id}'",
                    trigger.id
                ));
            }
        }
        if let Some(interaction_id) = trigger.interaction_id.as_deref() {
            if !interaction_ids.contains(interaction_id) {
                issues.push(format!(
                    "Trigger '{}': references unknown interactionId '{interaction_id}'",
                    trigger.id
                ));
            }
        }
    }
    for interaction in &world.interactions {
        if !trigger_ids.contains(interaction.trigger_id.as_str()) {
            issues.push(format!(
                "Interaction '{}': references unknown triggerId '{}'",
                interaction.id, interaction.trigger_id
            ));
        }
        for action in &interaction.actions {
            if let Some(dialogue_id) = action.dialogue_id() {
                if !dialogue_ids.contains(dialogue_id) {
                    issues.push(format!(
                        "Interaction '{}': action '{}' references unknown dialogueId '{dialogue_id}'",
                        interaction.id,
                        action.id()
                    ));
                }
            }
        }
    }
    for npc in &world.npcs {
        if let Some(interaction_id) = npc.interaction_id.as_deref() {
            if !interaction_ids.contains(interaction_id) {
                issues.push(format!(
                    "NPC '{}': references unknown interactionId '{interaction_id}'",
                    npc.id
                ));
            }
        }
    }
    for poi in &world.poi_index {
        if let Some(object_id) = poi.object_id.as_deref() {
            if !object_ids.contains(object_id) {
                issues.push(format!(
                    "POI '{}': references unknown objectId '{object_id}'",
                    poi.id
                ));
            }
        }
        if let Some(interaction_id) = poi.interaction_id.as_deref() {
            if !interaction_ids.contains(interaction_id) {
                issues.push(format!(
                    "POI '{}': references unknown interactionId '{interaction_id}'",
                    poi.id
                ));
            }
        }
    }
}

fn id_set<'a>(ids: impl Iterator<Item = &'a str>) -> HashSet<&'a str> {
    ids.collect()
}

fn check_trigger_completeness(world: &AuthoringWorld, issues: &mut Vec<String>) {
    for trigger in &world.triggers {
        if trigger.trigger_type.requires_interaction() && trigger.interaction_id.is_none() {
            issues.push(format!(
                "Trigger '{}': type '{}' requires an interactionId",
                trigger.id,
                trigger.trigger_type.as_str()
            ));
        }
    }
}

fn check_binding_cardinality(world: &AuthoringWorld, issues: &mut Vec<String>) {
    let mut bindings = Vec::<(&str, Vec<&str>)>::new();
    let mut index_by_trigger = HashMap::<&str, usize>::new();
    for interaction in &world.interactions {
        let trigger_id = interaction.trigger_id.as_str();
        match index_by_trigger.get(trigger_id) {
            Some(&index) => bindings[index].1.push(interaction.id.as_str()),
            None => {
                index_by_trigger.insert(trigger_id, bindings.len());
                bindings.push((trigger_id, vec![interaction.id.as_str()]));
            }
        }
    }

    for (trigger_id, interaction_ids) in bindings {
        if interaction_ids.len() > 1 {
            let listed = interaction_ids
                .iter()
                .map(|id| format!("'{id}'"))
                .collect::<Vec<_>>()
                .join(", ");
            issues.push(format!(
                "Interactions: duplicate binding for triggerId '{trigger_id}' ({listed})"
            ));
        }
    }
}

fn check_dialogue_graph(dialogue: &Dialogue, issues: &mut Vec<String>) {
    let mut index_by_id = HashMap::<&str, usize>::with_capacity(dialogue.nodes.len());
    for (index, node) in dialogue.nodes.iter().enumerate() {
        index_by_id.entry(node.id()).or_insert(index);
    }

    let Some(&start) = index_by_id.get(dialogue.start_node_id.as_str()) else {
        issues.push(format!(
            "Dialogue '{}': unknown startNodeId '{}'",
            dialogue.id, dialogue.start_node_id
        ));
        return;
    };

    for node in &dialogue.nodes {
        for target in node.explicit_edges() {
            if !index_by_id.contains_key(target) {
                issues.push(format!(
                    "Dialogue '{}': node '{}' points to unknown node '{target}'",
                    dialogue.id,
                    node.id()
                ));
            }
        }
    }

    let mut visited = vec![false; dialogue.nodes.len()];
    let mut queue = VecDeque::from([start]);
    while let Some(index) = queue.pop_front() {
        if visited[index] {
            continue;
        }
        visited[index] = true;

        let node = &dialogue.nodes[index];
        let mut successors = node
            .explicit_edges()
            .into_iter()
            .filter_map(|target| index_by_id.get(target).copied())
            .collect::<Vec<_>>();
        if node.falls_through() && index + 1 < dialogue.nodes.len() {
            successors.push(index + 1);
        }
        queue.extend(successors.into_iter().filter(|&next| !visited[next]));
    }

    for (index, node) in dialogue.nodes.iter().enumerate() {
        if !visited[index] {
            issues.push(format!(
                "Dialogue '{}': node '{}' is unreachable from startNodeId '{}'",
                dialogue.id,
                node.id(),
                dialogue.start_node_id
            ));
        }
    }
}
