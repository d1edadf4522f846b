use std::fs;
use std::path::PathBuf;

use serde_json::Value;

use super::authoring::AuthoringWorld;
use super::schema::parse_authoring_world;

pub(crate) fn canonical_world_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("../../assets/world/world.json")
}

pub(crate) fn canonical_world_json() -> String {
    fs::read_to_string(canonical_world_path()).expect("read canonical world fixture")
}

pub(crate) fn canonical_world_value() -> Value {
    serde_json::from_str(&canonical_world_json()).expect("canonical world is json")
}

pub(crate) fn canonical_world() -> AuthoringWorld {
    parse_authoring_world(&canonical_world_json()).expect("canonical world parses")
}
