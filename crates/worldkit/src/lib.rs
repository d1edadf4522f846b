use std::env;
use std::ffi::OsString;
use std::fs;
use std::path::{Component, Path, PathBuf};

use thiserror::Error;

pub mod world;

pub use world::authoring::{AuthoringWorld, AUTHORING_SCHEMA_VERSION};
pub use world::model::{Poi, PoiAction, Point, Rect, Shape};
pub use world::runtime::{RuntimeWorld, DEFAULT_PLAYER_SPAWN, PLAYER_SPAWN_ID};
pub use world::{
    check_drift, compile, compile_file, compile_world, load_patch, load_runtime_world,
    load_source, merge_world, parse_authoring_world, validate, write_artifacts, AdminPatch,
    CompileError, CompileOptions, CompileOutput, CompileWarning, DriftReason, DriftReport,
    MergedWorld, OutputLayout, PatchError, PipelineError, SchemaError, WarningCode,
};

pub const ROOT_ENV_VAR: &str = "WORLDC_ROOT";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkspacePaths {
    pub root: PathBuf,
    pub default_source: PathBuf,
    pub generated_dir: PathBuf,
}

impl WorkspacePaths {
    pub fn under(root: PathBuf) -> Self {
        let default_source = root.join("assets").join("world").join("world.json");
        let generated_dir = root.join("generated");
        Self {
            root,
            default_source,
            generated_dir,
        }
    }

    pub fn output_layout(&self) -> OutputLayout {
        OutputLayout::under(&self.generated_dir)
    }

    pub fn source_label(&self, source: &Path) -> String {
        let normalized = normalize_path(source);
        let (relative, absolute) = match normalized.strip_prefix(&self.root) {
            Ok(relative) => (relative, false),
            Err(_) => (normalized.as_path(), true),
        };
        let parts = relative
            .components()
            .filter_map(|component| match component {
                Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
                Component::ParentDir => Some("..".to_string()),
                Component::CurDir | Component::RootDir | Component::Prefix(_) => None,
            })
            .collect::<Vec<_>>()
            .join("/");
        match relative.components().next() {
            Some(Component::Prefix(prefix)) if absolute => {
                format!("{}/{parts}", prefix.as_os_str().to_string_lossy())
            }
            _ if relative.has_root() => format!("/{parts}"),
            _ => parts,
        }
    }
}

#[derive(Debug, Error)]
pub enum PathsError {
    #[error("failed to read environment variable {var}: {source}")]
    EnvVar {
        var: &'static str,
        #[source]
        source: env::VarError,
    },
    #[error("failed to resolve current directory: {0}")]
    CurrentDir(#[source] std::io::Error),
    #[error("WORLDC_ROOT is set but is not a directory: {path}")]
    InvalidEnvRoot { path: PathBuf },
}

pub fn resolve_workspace_paths() -> Result<WorkspacePaths, PathsError> {
    let env_root = match env::var(ROOT_ENV_VAR) {
        Ok(value) => Some(OsString::from(value)),
        Err(env::VarError::NotPresent) => None,
        Err(source) => {
            return Err(PathsError::EnvVar {
                var: ROOT_ENV_VAR,
                source,
            })
        }
    };
    let cwd = env::current_dir().map_err(PathsError::CurrentDir)?;
    resolve_root(env_root, &cwd).map(WorkspacePaths::under)
}

fn resolve_root(env_root: Option<OsString>, cwd: &Path) -> Result<PathBuf, PathsError> {
    if let Some(value) = env_root {
        let normalized = normalize_path(&PathBuf::from(value));
        return if normalized.is_dir() {
            Ok(normalized)
        } else {
            Err(PathsError::InvalidEnvRoot { path: normalized })
        };
    }

    for candidate in cwd.ancestors() {
        if is_repo_marker(candidate) {
            return Ok(normalize_path(candidate));
        }
    }
    Ok(normalize_path(cwd))
}

fn is_repo_marker(path: &Path) -> bool {
    path.join("Cargo.toml").is_file() && path.join("assets").is_dir()
}

fn normalize_path(path: &Path) -> PathBuf {
    fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf())
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;

    #[test]
    fn repo_marker_requires_cargo_toml_and_assets() {
        let temp = TempDir::new().expect("tempdir");
        assert!(!is_repo_marker(temp.path()));
        fs::create_dir_all(temp.path().join("assets")).expect("assets");
        assert!(!is_repo_marker(temp.path()));
        fs::write(temp.path().join("Cargo.toml"), "[workspace]\n").expect("cargo toml");
        assert!(is_repo_marker(temp.path()));
    }

    #[test]
    fn root_is_found_by_walking_upward() {
        let temp = TempDir::new().expect("tempdir");
        fs::create_dir_all(temp.path().join("assets")).expect("assets");
        fs::write(temp.path().join("Cargo.toml"), "[workspace]\n").expect("cargo toml");
        let nested = temp.path().join("crates").join("worldc");
        fs::create_dir_all(&nested).expect("nested");

        let root = resolve_root(None, &nested).expect("root");
        assert_eq!(root, normalize_path(temp.path()));
    }

    #[test]
    fn env_root_wins_and_must_exist() {
        let temp = TempDir::new().expect("tempdir");
        let root = resolve_root(Some(temp.path().as_os_str().to_owned()), Path::new("/"))
            .expect("env root");
        assert_eq!(root, normalize_path(temp.path()));

        let missing = temp.path().join("missing");
        let error = resolve_root(Some(missing.into_os_string()), Path::new("/"))
            .expect_err("missing root");
        assert!(matches!(error, PathsError::InvalidEnvRoot { .. }));
    }

    #[test]
    fn source_label_is_root_relative_with_forward_slashes() {
        let temp = TempDir::new().expect("tempdir");
        let paths = WorkspacePaths::under(normalize_path(temp.path()));
        fs::create_dir_all(paths.default_source.parent().expect("parent")).expect("mkdir");
        fs::write(&paths.default_source, "{}").expect("write");

        assert_eq!(
            paths.source_label(&paths.default_source),
            "assets/world/world.json"
        );
        assert_eq!(
            paths.output_layout().runtime_json,
            paths.generated_dir.join("world.runtime.json")
        );
    }

    #[test]
    fn source_label_outside_root_has_single_leading_separator() {
        let root = TempDir::new().expect("root");
        let elsewhere = TempDir::new().expect("elsewhere");
        let source = elsewhere.path().join("w.json");
        fs::write(&source, "{}").expect("write");
        let paths = WorkspacePaths::under(normalize_path(root.path()));

        let label = paths.source_label(&source);
        assert!(!label.starts_with("//"), "{label}");
        assert!(!label.contains('\\'), "{label}");
        assert!(label.ends_with("/w.json"), "{label}");
        #[cfg(unix)]
        assert_eq!(label, normalize_path(&source).to_string_lossy());
    }
}
