use std::env;
use std::io;
use std::path::PathBuf;
use std::process::ExitCode;

use tracing_subscriber::EnvFilter;
use worldc::{run, CommandKind, CommonOptions, Outcome};
use worldkit::resolve_workspace_paths;

fn main() -> ExitCode {
    init_tracing();
    match run_cli() {
        Ok(outcome) => ExitCode::from(outcome.exit_code()),
        Err(message) => {
            eprintln!("{message}");
            ExitCode::from(Outcome::Failure.exit_code())
        }
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .compact()
        .init();
}

fn run_cli() -> Result<Outcome, String> {
    let args = env::args().skip(1).collect::<Vec<_>>();
    if args.is_empty() {
        return Err(usage_text());
    }
    if args[0] == "-h" || args[0] == "--help" {
        print_usage();
        return Ok(Outcome::Success);
    }

    let (options, kind) = parse_args(&args)?;
    let paths = resolve_workspace_paths().map_err(|error| error.to_string())?;
    run(kind, options, &paths, &mut io::stdout())
}

fn parse_args(args: &[String]) -> Result<(CommonOptions, CommandKind), String> {
    let mut options = CommonOptions::default();
    let mut index = 0usize;
    while index < args.len() {
        match args[index].as_str() {
            "--out-dir" => {
                let value = args
                    .get(index + 1)
                    .ok_or_else(|| "missing value for --out-dir".to_string())?;
                options.out_dir = Some(PathBuf::from(value));
                index += 2;
            }
            _ => break,
        }
    }

    let command = args
        .get(index)
        .ok_or_else(|| "missing subcommand".to_string())?
        .as_str();
    let command_args = &args[(index + 1)..];

    let kind = match command {
        "validate" => {
            if command_args.len() > 1 {
                return Err("validate takes at most one file".to_string());
            }
            CommandKind::Validate {
                source: command_args.first().map(PathBuf::from),
            }
        }
        "compile" => {
            let mut source = None;
            let mut check = false;
            let mut deny_warnings = false;
            for arg in command_args {
                match arg.as_str() {
                    "--check" => check = true,
                    "--deny-warnings" => deny_warnings = true,
                    flag if flag.starts_with("--") => {
                        return Err(format!(
                            "unknown compile argument '{flag}' (expected --check or --deny-warnings)"
                        ));
                    }
                    path if source.is_none() => source = Some(PathBuf::from(path)),
                    extra => return Err(format!("unexpected compile argument '{extra}'")),
                }
            }
            CommandKind::Compile {
                source,
                check,
                deny_warnings,
            }
        }
        "merge" => {
            let [runtime, patch] = command_args else {
                return Err("merge requires <runtime.json> <patch.json>".to_string());
            };
            CommandKind::Merge {
                runtime: PathBuf::from(runtime),
                patch: PathBuf::from(patch),
            }
        }
        other => return Err(format!("unknown subcommand '{other}'")),
    };

    Ok((options, kind))
}

fn print_usage() {
    println!("{}", usage_text());
}

fn usage_text() -> String {
    [
        "worldc - compile the authored world into runtime data and generated modules",
        "",
        "Usage:",
        "  worldc [--out-dir <dir>] validate [<file>]",
        "  worldc [--out-dir <dir>] compile [<file>] [--check] [--deny-warnings]",
        "  worldc merge <runtime.json> <patch.json>",
        "",
        "Defaults:",
        "  <file>     assets/world/world.json under the project root",
        "  --out-dir  generated/ under the project root",
        "",
        "Environment:",
        "  WORLDC_ROOT  project root (otherwise found by walking up from the current directory)",
        "  RUST_LOG     log filter (default info)",
        "",
        "Exit codes: 0 ok, 1 failure, 2 generated artifacts are stale (--check)",
    ]
    .join("\n")
}
