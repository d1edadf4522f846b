use serde::Serialize;
use serde_json::Value;

use super::authoring::{Tileset, UpperRule};
use super::runtime::RuntimeWorld;

pub const GENERATED_MARKER: &str = "// AUTO-GENERATED by worldc. DO NOT EDIT.";

pub const TERRAIN_NAMES: [(i32, &str); 5] = [
    (0, "water"),
    (1, "sand"),
    (2, "grass"),
    (3, "path"),
    (4, "stone"),
];

pub const OUT_OF_BOUNDS_TERRAIN: i32 = 0;

// Indexed by NW*8 + NE*4 + SW*2 + SE, set bit = upper-terrain corner.
pub const WANG_CORNER_FRAMES: [u8; 16] = [6, 7, 10, 9, 2, 11, 4, 15, 5, 14, 1, 8, 3, 0, 13, 12];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedModules {
    pub glossary: String,
    pub map_data: String,
    pub ui_texts: String,
}

pub fn render_modules(
    runtime: &RuntimeWorld,
    source_path: &str,
) -> Result<GeneratedModules, serde_json::Error> {
    Ok(GeneratedModules {
        glossary: render_glossary(runtime, source_path)?,
        map_data: render_map_data(runtime, source_path)?,
        ui_texts: render_ui_texts(runtime, source_path)?,
    })
}

fn header(source_path: &str) -> String {
    format!("{GENERATED_MARKER}\n// Source: {source_path}\n")
}

fn pretty<T: Serialize>(value: &T) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(value)
}

fn string_literal(value: &str) -> String {
    Value::from(value).to_string()
}

fn render_glossary(runtime: &RuntimeWorld, source_path: &str) -> Result<String, serde_json::Error> {
    let mut output = header(source_path);
    output.push('\n');
    output.push_str(&format!(
        "export const GLOSSARY = {} as const;\n\n",
        pretty(&runtime.glossary)?
    ));
    output.push_str("export type GlossaryEntry = (typeof GLOSSARY)[number];\n\n");
    output.push_str(
        "export const GLOSSARY_BY_ID: Readonly<Record<string, GlossaryEntry>> = Object.fromEntries(\n  GLOSSARY.map((entry) => [entry.id, entry]),\n);\n",
    );
    Ok(output)
}

fn render_map_data(runtime: &RuntimeWorld, source_path: &str) -> Result<String, serde_json::Error> {
    let map = &runtime.map_data;
    let mut output = header(source_path);
    output.push('\n');
    output.push_str(&format!("export const TILE_SIZE = {};\n", map.tile_size));
    output.push_str(&format!("export const MAP_COLUMNS = {};\n", map.columns));
    output.push_str(&format!("export const MAP_ROWS = {};\n\n", map.rows));

    output.push_str("export const TERRAIN_NAMES: Readonly<Record<number, string>> = {\n");
    for (id, name) in TERRAIN_NAMES {
        output.push_str(&format!("  {id}: {},\n", string_literal(name)));
    }
    output.push_str("};\n\n");
    output.push_str(&format!(
        "export const OUT_OF_BOUNDS_TERRAIN = {OUT_OF_BOUNDS_TERRAIN};\n\n"
    ));

    output.push_str("// Index: NW * 8 + NE * 4 + SW * 2 + SE, bit set for upper-terrain corners.\n");
    output.push_str(&format!(
        "export const WANG_CORNER_FRAMES: readonly number[] = [{}];\n\n",
        join_numbers(WANG_CORNER_FRAMES.iter())
    ));

    output.push_str("export const TERRAIN_GRID: readonly (readonly number[])[] = [\n");
    for row in &map.terrain {
        output.push_str(&format!("  [{}],\n", join_numbers(row.iter())));
    }
    output.push_str("];\n\n");

    output.push_str(
        "export interface TilesetDefinition {\n  readonly key: string;\n  readonly image: string;\n  readonly isUpper: (terrainId: number) => boolean;\n}\n\n",
    );
    output.push_str("export const TILESETS: readonly TilesetDefinition[] = [\n");
    for tileset in &map.tilesets {
        output.push_str(&render_tileset(tileset));
    }
    output.push_str("];\n\n");

    output.push_str(&format!(
        "export const MAP_OBJECTS = {} as const;\n\n",
        pretty(&map.objects)?
    ));
    output.push_str(&format!(
        "export const MAP_OVERLAY = {} as const;\n\n",
        pretty(&map.overlay)?
    ));
    output.push_str(&format!(
        "export const NPC_POSITIONS: Readonly<Record<string, {{ x: number; y: number }}>> = {};\n\n",
        pretty(&map.npc_positions)?
    ));
    output.push_str(&format!(
        "export const PLAYER_SPAWN = {} as const;\n\n",
        pretty(&map.player_spawn)?
    ));

    output.push_str(
        "export function terrainAt(column: number, row: number): number {\n  if (\n    !Number.isInteger(column) ||\n    !Number.isInteger(row) ||\n    row < 0 ||\n    row >= MAP_ROWS ||\n    column < 0 ||\n    column >= MAP_COLUMNS\n  ) {\n    return OUT_OF_BOUNDS_TERRAIN;\n  }\n  return TERRAIN_GRID[row][column];\n}\n",
    );
    Ok(output)
}

fn render_tileset(tileset: &Tileset) -> String {
    format!(
        "  {{\n    key: {},\n    image: {},\n    isUpper: (terrainId: number): boolean => {},\n  }},\n",
        string_literal(&tileset.key),
        string_literal(&tileset.image),
        upper_predicate(&tileset.upper)
    )
}

fn upper_predicate(rule: &UpperRule) -> String {
    match rule {
        UpperRule::Equals { terrain_id } => format!("terrainId === {terrain_id}"),
        UpperRule::OneOf { terrain_ids } => {
            format!("[{}].includes(terrainId)", join_numbers(terrain_ids.iter()))
        }
        UpperRule::AtLeast { terrain_id } => format!("terrainId >= {terrain_id}"),
    }
}

fn join_numbers<T: ToString>(values: impl Iterator<Item = T>) -> String {
    values
        .map(|value| value.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

fn render_ui_texts(runtime: &RuntimeWorld, source_path: &str) -> Result<String, serde_json::Error> {
    let mut output = header(source_path);
    output.push('\n');
    output.push_str(&format!(
        "export const UI_TEXT_OVERRIDES: Readonly<Record<string, string>> = {};\n",
        pretty(&runtime.ui_texts)?
    ));
    Ok(output)
}
