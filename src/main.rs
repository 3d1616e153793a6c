//! CardioRisk: Explainable cardiovascular risk estimation
//!
//! Command-line entry point. Reads one patient record (or an array of
//! records) as JSON and prints the assessment as JSON on stdout.
//!
//! ```text
//! cardiorisk [--models <dir>] [--health] [<record.json> | -]
//! ```
//!
//! Exit codes: 0 success, 1 model or computation failure, 2 invalid input.

use std::io::Read;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use serde::Serialize;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use cardiorisk::adapters::sanitize::SanitizingMakeWriter;
use cardiorisk::adapters::ModelArtifacts;
use cardiorisk::config::{Config, LogMode};
use cardiorisk::domain::ValidationError;
use cardiorisk::{AssessmentService, PatientInput, PatientRecord};

const EXIT_FAILURE: u8 = 1;
const EXIT_INVALID_INPUT: u8 = 2;

struct Args {
    model_dir: Option<PathBuf>,
    health: bool,
    input: Option<String>,
}

fn usage() -> String {
    "Usage: cardiorisk [--models <dir>] [--health] [<record.json> | -]".to_string()
}

fn parse_args() -> Result<Args, String> {
    let mut args = std::env::args().skip(1);
    let mut parsed = Args {
        model_dir: None,
        health: false,
        input: None,
    };

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--models" => {
                let v = args.next().ok_or_else(usage)?;
                parsed.model_dir = Some(PathBuf::from(v));
            }
            "--health" => parsed.health = true,
            "-h" | "--help" => return Err(usage()),
            _ => {
                if parsed.input.is_none() {
                    parsed.input = Some(arg);
                } else {
                    return Err(usage());
                }
            }
        }
    }
    Ok(parsed)
}

fn init_logging(config: &Config) -> Result<WorkerGuard> {
    // stdout carries the JSON response, so logs never go there.
    let (writer, guard) = match config.log_mode {
        LogMode::File => {
            if let Some(parent) = config.log_file.parent() {
                // Best-effort: don't fail startup just because the directory is missing.
                let _ = std::fs::create_dir_all(parent);
            }
            let file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(&config.log_file)
                .with_context(|| format!("Failed to open log file {:?}", config.log_file))?;
            tracing_appender::non_blocking(file)
        }
        LogMode::Stderr => tracing_appender::non_blocking(std::io::stderr()),
    };

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer().with_writer(SanitizingMakeWriter::new(writer)))
        .init();

    Ok(guard)
}

fn read_input(source: Option<&str>) -> Result<String> {
    match source {
        None | Some("-") => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .context("Failed to read stdin")?;
            Ok(buf)
        }
        Some(path) => {
            std::fs::read_to_string(path).with_context(|| format!("Failed to read {path}"))
        }
    }
}

/// Field errors for one record of the request.
#[derive(Serialize)]
struct RecordErrors {
    record: usize,
    errors: Vec<ValidationError>,
}

/// Parse and validate every record before any is assessed.
fn parse_records(body: &str) -> Result<(Vec<PatientRecord>, bool), Vec<RecordErrors>> {
    let value: serde_json::Value = serde_json::from_str(body).map_err(|e| {
        vec![RecordErrors {
            record: 0,
            errors: vec![ValidationError {
                field: "request",
                message: format!("invalid JSON: {e}"),
            }],
        }]
    })?;

    let (items, is_batch) = match value {
        serde_json::Value::Array(items) => (items, true),
        single => (vec![single], false),
    };

    let mut records = Vec::with_capacity(items.len());
    let mut failures = Vec::new();
    for (index, item) in items.into_iter().enumerate() {
        let result = serde_json::from_value::<PatientInput>(item)
            .map_err(|e| {
                vec![ValidationError {
                    field: "request",
                    message: e.to_string(),
                }]
            })
            .and_then(|input| input.validate().map_err(|e| e.0));
        match result {
            Ok(record) => records.push(record),
            Err(errors) => failures.push(RecordErrors {
                record: index,
                errors,
            }),
        }
    }

    if failures.is_empty() {
        Ok((records, is_batch))
    } else {
        Err(failures)
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn run(args: Args) -> Result<ExitCode> {
    // Re-read after logging is up so that invalid-value warnings are visible.
    let mut config = Config::from_env();
    if let Some(dir) = args.model_dir {
        config.model_dir = dir;
    }

    tracing::info!("Starting CardioRisk...");

    let artifacts = match ModelArtifacts::load(&config.model_dir, config.require_manifest) {
        Ok(a) => a,
        Err(e) => {
            tracing::error!("Failed to load model artifacts: {e}");
            eprintln!("{}", serde_json::json!({ "error": "model artifacts unavailable" }));
            return Ok(ExitCode::from(EXIT_FAILURE));
        }
    };
    let service = AssessmentService::from_artifacts(artifacts);

    if args.health {
        print_json(&service.health())?;
        if args.input.is_none() {
            return Ok(ExitCode::SUCCESS);
        }
    }

    let body = read_input(args.input.as_deref())?;
    let (records, is_batch) = match parse_records(&body) {
        Ok(parsed) => parsed,
        Err(failures) => {
            tracing::warn!("Rejected request: {} invalid record(s)", failures.len());
            eprintln!("{}", serde_json::to_string_pretty(&failures)?);
            return Ok(ExitCode::from(EXIT_INVALID_INPUT));
        }
    };

    let mut assessments = Vec::with_capacity(records.len());
    for record in &records {
        match service.assess(record) {
            Ok(a) => assessments.push(a),
            Err(e) => {
                tracing::error!("Assessment failed: {e}");
                eprintln!("{}", serde_json::json!({ "error": "computation failed" }));
                return Ok(ExitCode::from(EXIT_FAILURE));
            }
        }
    }

    if is_batch {
        print_json(&assessments)?;
    } else if let Some(assessment) = assessments.first() {
        print_json(assessment)?;
    }

    tracing::info!("CardioRisk finished: {} record(s) assessed", assessments.len());
    Ok(ExitCode::SUCCESS)
}

fn main() -> Result<ExitCode> {
    let args = match parse_args() {
        Ok(a) => a,
        Err(msg) => {
            eprintln!("{msg}");
            return Ok(ExitCode::from(EXIT_INVALID_INPUT));
        }
    };

    let config = Config::from_env();
    let _guard = init_logging(&config)?;

    run(args)
}
