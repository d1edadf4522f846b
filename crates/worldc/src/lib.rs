use std::io::Write;
use std::path::{Path, PathBuf};

use tracing::{info, warn};
use worldkit::world::{parse_authoring_value, DriftReason};
use worldkit::{
    check_drift, compile_file, load_patch, load_runtime_world, load_source, merge_world,
    validate, write_artifacts, CompileOutput, OutputLayout, WorkspacePaths,
};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommonOptions {
    pub out_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandKind {
    Validate {
        source: Option<PathBuf>,
    },
    Compile {
        source: Option<PathBuf>,
        check: bool,
        deny_warnings: bool,
    },
    Merge {
        runtime: PathBuf,
        patch: PathBuf,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Success,
    Failure,
    Drift,
}

impl Outcome {
    pub fn exit_code(self) -> u8 {
        match self {
            Self::Success => 0,
            Self::Failure => 1,
            Self::Drift => 2,
        }
    }
}

pub fn run<W: Write>(
    kind: CommandKind,
    opts: CommonOptions,
    paths: &WorkspacePaths,
    stdout: &mut W,
) -> Result<Outcome, String> {
    let layout = match &opts.out_dir {
        Some(dir) => OutputLayout::under(dir),
        None => paths.output_layout(),
    };

    match kind {
        CommandKind::Validate { source } => {
            let source = source.unwrap_or_else(|| paths.default_source.clone());
            run_validate(&source, stdout)
        }
        CommandKind::Compile {
            source,
            check,
            deny_warnings,
        } => {
            let source = source.unwrap_or_else(|| paths.default_source.clone());
            let label = paths.source_label(&source);
            let output = compile_file(&source, &label).map_err(|error| error.to_string())?;
            run_compile(&output, &layout, check, deny_warnings, stdout)
        }
        CommandKind::Merge { runtime, patch } => run_merge(&runtime, &patch, stdout),
    }
}

fn run_validate<W: Write>(source: &Path, stdout: &mut W) -> Result<Outcome, String> {
    let raw = load_source(source).map_err(|error| error.to_string())?;
    let world = parse_authoring_value(raw)
        .map_err(|error| format!("{}: {error}", source.display()))?;
    let issues = validate(&world);
    info!(
        path = %source.display(),
        issues = issues.len(),
        "world_validated"
    );

    for issue in &issues {
        write_line(stdout, issue)?;
    }
    if issues.is_empty() {
        write_line(stdout, &format!("{}: no issues", source.display()))?;
        Ok(Outcome::Success)
    } else {
        write_line(stdout, &format!("{} issue(s) found", issues.len()))?;
        Ok(Outcome::Failure)
    }
}

fn run_compile<W: Write>(
    output: &CompileOutput,
    layout: &OutputLayout,
    check: bool,
    deny_warnings: bool,
    stdout: &mut W,
) -> Result<Outcome, String> {
    for warning in &output.warnings {
        write_line(stdout, &format!("warning: {warning}"))?;
    }
    if deny_warnings && !output.warnings.is_empty() {
        warn!(
            warnings = output.warnings.len(),
            "world_compile_rejected_warnings"
        );
        return Ok(Outcome::Failure);
    }

    if check {
        let report = check_drift(output, layout).map_err(|error| error.to_string())?;
        for entry in &report.stale {
            let detail = match &entry.reason {
                DriftReason::Missing => "missing".to_string(),
                DriftReason::Changed {
                    expected_sha256,
                    actual_sha256,
                } => format!("changed (expected {expected_sha256}, found {actual_sha256})"),
            };
            write_line(stdout, &format!("stale: {} {detail}", entry.path.display()))?;
        }
        if report.is_clean() {
            write_line(stdout, "generated artifacts are up to date")?;
            return Ok(Outcome::Success);
        }
        return Ok(Outcome::Drift);
    }

    write_artifacts(output, layout).map_err(|error| error.to_string())?;
    write_line(
        stdout,
        &format!(
            "compiled {} POIs, {} objects, {} interactions into {}",
            output.runtime.glossary.len(),
            output.runtime.map_data.objects.len(),
            output.runtime.interactions.len(),
            layout
                .runtime_json
                .parent()
                .map_or_else(|| ".".to_string(), |dir| dir.display().to_string())
        ),
    )?;
    Ok(Outcome::Success)
}

fn run_merge<W: Write>(runtime: &Path, patch: &Path, stdout: &mut W) -> Result<Outcome, String> {
    let base = load_runtime_world(runtime).map_err(|error| error.to_string())?;
    let patch_doc = load_patch(patch).map_err(|error| error.to_string())?;
    let merged = merge_world(&base, &patch_doc);
    info!(
        runtime = %runtime.display(),
        patch = %patch.display(),
        patched_pois = patch_doc.pois.len(),
        patched_objects = patch_doc.map_objects.len(),
        patched_npcs = patch_doc.npcs.len(),
        "world_patch_merged"
    );
    let json = serde_json::to_string_pretty(&merged)
        .map_err(|error| format!("failed to encode merged world: {error}"))?;
    write_line(stdout, &json)?;
    Ok(Outcome::Success)
}

fn write_line<W: Write>(stdout: &mut W, line: &str) -> Result<(), String> {
    writeln!(stdout, "{line}").map_err(|error| format!("failed to write output: {error}"))
}
