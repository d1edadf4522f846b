use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde_json::Value;
use thiserror::Error;
use tracing::{info, warn};

use super::compiler::{compile, CompileError, CompileOptions, CompileOutput};
use super::hashing::sha256_hex;
use super::patch::{AdminPatch, PatchError};
use super::runtime::RuntimeWorld;
use super::schema::{parse_runtime_world, SchemaError};

pub const RUNTIME_JSON_FILE: &str = "world.runtime.json";
pub const GLOSSARY_MODULE_FILE: &str = "glossary.generated.ts";
pub const MAP_DATA_MODULE_FILE: &str = "mapData.generated.ts";
pub const UI_TEXTS_MODULE_FILE: &str = "uiTexts.generated.ts";

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("{path} is not valid json: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("{path}: {source}")]
    Schema {
        path: PathBuf,
        #[source]
        source: SchemaError,
    },
    #[error("{path}: {source}")]
    Patch {
        path: PathBuf,
        #[source]
        source: PatchError,
    },
    #[error("failed to render artifacts: {0}")]
    Render(#[source] serde_json::Error),
    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputLayout {
    pub runtime_json: PathBuf,
    pub glossary_module: PathBuf,
    pub map_data_module: PathBuf,
    pub ui_texts_module: PathBuf,
}

impl OutputLayout {
    pub fn under(dir: &Path) -> Self {
        Self {
            runtime_json: dir.join(RUNTIME_JSON_FILE),
            glossary_module: dir.join(GLOSSARY_MODULE_FILE),
            map_data_module: dir.join(MAP_DATA_MODULE_FILE),
            ui_texts_module: dir.join(UI_TEXTS_MODULE_FILE),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    pub path: PathBuf,
    pub contents: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DriftReason {
    Missing,
    Changed {
        expected_sha256: String,
        actual_sha256: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DriftEntry {
    pub path: PathBuf,
    pub reason: DriftReason,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DriftReport {
    pub stale: Vec<DriftEntry>,
}

impl DriftReport {
    pub fn is_clean(&self) -> bool {
        self.stale.is_empty()
    }
}

pub fn load_source(path: &Path) -> Result<Value, PipelineError> {
    let raw = read_text(path)?;
    serde_json::from_str(&raw).map_err(|source| PipelineError::Json {
        path: path.to_path_buf(),
        source,
    })
}

pub fn load_runtime_world(path: &Path) -> Result<RuntimeWorld, PipelineError> {
    let raw = read_text(path)?;
    parse_runtime_world(&raw).map_err(|source| PipelineError::Schema {
        path: path.to_path_buf(),
        source,
    })
}

pub fn load_patch(path: &Path) -> Result<AdminPatch, PipelineError> {
    let raw = read_text(path)?;
    AdminPatch::from_json(&raw).map_err(|source| PipelineError::Patch {
        path: path.to_path_buf(),
        source,
    })
}

fn read_text(path: &Path) -> Result<String, PipelineError> {
    fs::read_to_string(path).map_err(|source| PipelineError::Read {
        path: path.to_path_buf(),
        source,
    })
}

pub fn compile_file(path: &Path, source_label: &str) -> Result<CompileOutput, PipelineError> {
    let raw = load_source(path)?;
    let options = CompileOptions {
        source_path: source_label.to_string(),
    };
    let output = compile(raw, &options).map_err(|error| match error {
        CompileError::Schema(source) => PipelineError::Schema {
            path: path.to_path_buf(),
            source,
        },
        CompileError::Render(source) => PipelineError::Render(source),
    })?;

    for warning in &output.warnings {
        warn!(
            code = %warning.code,
            message = %warning.message,
            "world_compile_warning"
        );
    }
    info!(
        path = %path.display(),
        pois = output.runtime.glossary.len(),
        objects = output.runtime.map_data.objects.len(),
        interactions = output.runtime.interactions.len(),
        warnings = output.warnings.len(),
        "world_compiled"
    );
    Ok(output)
}

pub fn render_runtime_json(runtime: &RuntimeWorld) -> Result<String, serde_json::Error> {
    let mut text = serde_json::to_string_pretty(runtime)?;
    text.push('\n');
    Ok(text)
}

pub fn artifacts(
    output: &CompileOutput,
    layout: &OutputLayout,
) -> Result<Vec<Artifact>, PipelineError> {
    let runtime_json = render_runtime_json(&output.runtime).map_err(PipelineError::Render)?;
    Ok(vec![
        Artifact {
            path: layout.runtime_json.clone(),
            contents: runtime_json,
        },
        Artifact {
            path: layout.glossary_module.clone(),
            contents: output.generated.glossary.clone(),
        },
        Artifact {
            path: layout.map_data_module.clone(),
            contents: output.generated.map_data.clone(),
        },
        Artifact {
            path: layout.ui_texts_module.clone(),
            contents: output.generated.ui_texts.clone(),
        },
    ])
}

pub fn write_artifacts(output: &CompileOutput, layout: &OutputLayout) -> Result<(), PipelineError> {
    for artifact in artifacts(output, layout)? {
        stage_and_swap(&artifact).map_err(|source| PipelineError::Write {
            path: artifact.path.clone(),
            source,
        })?;
        info!(
            path = %artifact.path.display(),
            bytes = artifact.contents.len(),
            sha256 = %sha256_hex(artifact.contents.as_bytes()),
            "world_artifact_written"
        );
    }
    Ok(())
}

// Readers of the output directory see either the previous artifact or the
// complete new one.
fn stage_and_swap(artifact: &Artifact) -> io::Result<()> {
    let dir = match artifact.path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    };
    fs::create_dir_all(dir)?;

    let staged = staging_path(&artifact.path);
    fs::write(&staged, artifact.contents.as_bytes())?;
    if let Err(error) = fs::rename(&staged, &artifact.path) {
        let _ = fs::remove_file(&staged);
        return Err(error);
    }
    Ok(())
}

fn staging_path(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .map_or_else(|| "artifact".into(), |name| name.to_string_lossy());
    path.with_file_name(format!(".{name}.staged"))
}

pub fn check_drift(
    output: &CompileOutput,
    layout: &OutputLayout,
) -> Result<DriftReport, PipelineError> {
    let mut report = DriftReport::default();
    for artifact in artifacts(output, layout)? {
        let on_disk = match fs::read(&artifact.path) {
            Ok(bytes) => bytes,
            Err(error) if error.kind() == io::ErrorKind::NotFound => {
                warn!(path = %artifact.path.display(), "world_artifact_missing");
                report.stale.push(DriftEntry {
                    path: artifact.path,
                    reason: DriftReason::Missing,
                });
                continue;
            }
            Err(source) => {
                return Err(PipelineError::Read {
                    path: artifact.path,
                    source,
                })
            }
        };

        let expected_sha256 = sha256_hex(artifact.contents.as_bytes());
        let actual_sha256 = sha256_hex(&on_disk);
        if expected_sha256 != actual_sha256 {
            warn!(
                path = %artifact.path.display(),
                expected_sha256 = %expected_sha256,
                actual_sha256 = %actual_sha256,
                "world_artifact_stale"
            );
            report.stale.push(DriftEntry {
                path: artifact.path,
                reason: DriftReason::Changed {
                    expected_sha256,
                    actual_sha256,
                },
            });
        }
    }
    info!(stale = report.stale.len(), "world_drift_checked");
    Ok(report)
}
