pub mod authoring;
mod codegen;
mod compiler;
mod hashing;
pub mod model;
mod patch;
mod pipeline;
pub mod runtime;
mod schema;
#[cfg(test)]
mod test_support;
mod validate;

pub use codegen::{
    render_modules, GeneratedModules, GENERATED_MARKER, OUT_OF_BOUNDS_TERRAIN, TERRAIN_NAMES,
    WANG_CORNER_FRAMES,
};
pub use compiler::{
    compile, compile_world, merge_actions_by_id, translate_action, CompileError, CompileOptions,
    CompileOutput, CompileWarning, WarningCode, DEFAULT_CONFIRM_MESSAGE,
};
pub use patch::{
    merge_map_objects, merge_npc_positions, merge_pois, merge_world, AdminPatch, HitboxPatch,
    MergedWorld, ObjectPatch, PatchError, PoiPatch, PoiWorldPatch, PointPatch,
    ADMIN_PATCH_VERSION,
};
pub use pipeline::{
    artifacts, check_drift, compile_file, load_patch, load_runtime_world, load_source,
    render_runtime_json, write_artifacts, Artifact, DriftEntry, DriftReason, DriftReport,
    OutputLayout, PipelineError,
};
pub use schema::{
    check_authoring_world, parse_authoring_value, parse_authoring_world, parse_runtime_world,
    SchemaError,
};
pub use validate::validate;
