//! matchdiff CLI: driving adapter for the matchdiff explain engine.
//!
//! Subcommands:
//! - `explain <left> <right> [-v]...`: compare two documents and print the explanation
//! - `check <pattern>`: validate a pattern document loads without errors
//! - `kinds`: print the pattern tags, kind names and registered explainers

use std::process;

use matchdiff::{
    assertrepr_compare_with, Collaborators, CompareConfig, ExplainerRegistry, Op, Value,
};
use tracing_subscriber::EnvFilter;

/// Kind names accepted by `$isa`, besides class names.
const KIND_NAMES: &[&str] = &[
    "NoneType", "bool", "int", "float", "str", "bytes", "list", "tuple", "set", "dict",
    "datetime", "matcher",
];

fn main() {
    let args: Vec<String> = std::env::args().collect();

    if args.len() < 2 {
        print_usage();
        process::exit(1);
    }

    let options = match parse_options(&args[2..]) {
        Ok(options) => options,
        Err(e) => {
            eprintln!("error: {e}");
            print_usage();
            process::exit(1);
        }
    };
    init_tracing(options.verbose > 0);

    let result = match args[1].as_str() {
        "explain" => cmd_explain(&options),
        "check" => cmd_check(&options).map(|()| true),
        "kinds" => cmd_kinds().map(|()| true),
        "--help" | "-h" | "help" => {
            print_usage();
            Ok(true)
        }
        other => {
            eprintln!("error: unknown command \"{other}\"");
            print_usage();
            process::exit(1);
        }
    };

    match result {
        Ok(true) => {}
        Ok(false) => process::exit(1),
        Err(e) => {
            eprintln!("error: {e}");
            process::exit(1);
        }
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "matchdiff=debug" } else { "matchdiff=warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default)),
        )
        .with_target(false)
        .without_time()
        .with_writer(std::io::stderr)
        .init();
}

// ═══════════════════════════════════════════════════════════════════════════════
// Commands
// ═══════════════════════════════════════════════════════════════════════════════

/// Returns `Ok(false)` when the documents do not match.
fn cmd_explain(options: &Options) -> Result<bool, String> {
    let [left_path, right_path] = options.paths.as_slice() else {
        return Err("explain requires a left and a right document path".into());
    };

    let left = load_document(left_path)?;
    let right = load_document(right_path)?;
    let mut config = CompareConfig::from_env();
    config.verbose = config.verbose.max(options.verbose);

    let lines = explain(&build_registry(), &config, &left, &right)?;
    match lines {
        None => {
            println!("equal");
            Ok(true)
        }
        Some(lines) => {
            for line in lines {
                println!("{line}");
            }
            Ok(false)
        }
    }
}

fn cmd_check(options: &Options) -> Result<(), String> {
    let [path] = options.paths.as_slice() else {
        return Err("check requires a pattern document path".into());
    };

    let pattern = load_document(path)?;
    tracing::debug!(kind = %pattern.kind(), "pattern loaded");
    println!("Pattern valid");
    Ok(())
}

#[allow(clippy::unnecessary_wraps)] // Uniform return type for all commands
fn cmd_kinds() -> Result<(), String> {
    println!("Pattern tags:");
    for tag in matchdiff::KNOWN_TAGS {
        println!("  {tag}");
    }

    println!("\nKind names:");
    for name in KIND_NAMES {
        println!("  {name}");
    }

    let registry = build_registry();
    println!("\nRegistered explainers:");
    for op in Op::ALL {
        let names = registry.explainer_names(op);
        if !names.is_empty() {
            println!("  {op}  {}", names.join(", "));
        }
    }

    Ok(())
}

/// `None` when the documents match, otherwise the failure body.
fn explain(
    registry: &ExplainerRegistry,
    config: &CompareConfig,
    left: &Value,
    right: &Value,
) -> Result<Option<Vec<String>>, String> {
    if left.try_matches(right).map_err(|e| format!("comparison failed: {e}"))? {
        return Ok(None);
    }
    let collaborators = Collaborators::shared();
    let lines = assertrepr_compare_with(registry, collaborators, config, Op::Eq, left, right);
    Ok(Some(lines.unwrap_or_else(|| {
        vec![format!(
            "{} != {}",
            collaborators.safe_repr.repr(left, None),
            collaborators.safe_repr.repr(right, None)
        )]
    })))
}

// ═══════════════════════════════════════════════════════════════════════════════
// Registry assembly (composition root)
// ═══════════════════════════════════════════════════════════════════════════════

fn build_registry() -> ExplainerRegistry {
    let builder = matchdiff::ExplainerRegistryBuilder::new();
    matchdiff_test::register(builder).build()
}

// ═══════════════════════════════════════════════════════════════════════════════
// Document loading
// ═══════════════════════════════════════════════════════════════════════════════

fn load_document(path: &str) -> Result<Value, String> {
    let content =
        std::fs::read_to_string(path).map_err(|e| format!("failed to read \"{path}\": {e}"))?;
    parse_document(path, &content)
}

fn parse_document(path: &str, content: &str) -> Result<Value, String> {
    let is_json = std::path::Path::new(path)
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));

    let doc: serde_json::Value = if is_json {
        serde_json::from_str(content).map_err(|e| format!("JSON parse error: {e}"))?
    } else {
        // Default to YAML (handles .yaml and .yml)
        serde_yaml::from_str(content).map_err(|e| format!("YAML parse error: {e}"))?
    };

    Value::from_json(&doc).map_err(|e| format!("pattern invalid: {e}"))
}

// ═══════════════════════════════════════════════════════════════════════════════
// Argument parsing
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Default, PartialEq, Eq)]
struct Options {
    paths: Vec<String>,
    verbose: u8,
}

fn parse_options(args: &[String]) -> Result<Options, String> {
    let mut options = Options::default();

    for arg in args {
        match arg.as_str() {
            "--verbose" => options.verbose = options.verbose.saturating_add(1),
            flag if flag.starts_with("-v") && flag[1..].chars().all(|c| c == 'v') => {
                let count = u8::try_from(flag.len() - 1).unwrap_or(u8::MAX);
                options.verbose = options.verbose.saturating_add(count);
            }
            flag if flag.starts_with('-') => {
                return Err(format!("unexpected argument \"{flag}\""));
            }
            path => options.paths.push(path.to_owned()),
        }
    }

    Ok(options)
}

fn print_usage() {
    eprintln!(
        "Usage: matchdiff <command> [options]

Commands:
  explain <left> <right> [-v]...   Compare two documents, exit 1 if they differ
  check <pattern>                  Validate a pattern document
  kinds                            Print pattern tags, kind names and explainers
  help                             Show this help

Documents are JSON (by .json extension) or YAML."
    );
}
