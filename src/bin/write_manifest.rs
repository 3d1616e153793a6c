//! Writes `manifest.json` for a model directory.
//!
//! Records the SHA-256 of `encoding.json`, `scaler.json` and
//! `classifier.json` so that `cardiorisk` can detect modified artifacts.
//!
//! # Usage
//!
//! ```bash
//! cargo run --bin write_manifest -- <model_dir> [--check]
//! ```
//!
//! With `--check` the directory is loaded and verified against an existing
//! manifest instead of writing a new one.

use std::env;
use std::path::PathBuf;

use cardiorisk::adapters::{write_manifest, ModelArtifacts};
use cardiorisk::ports::RiskClassifier;

fn usage() -> String {
    "Usage: write_manifest <model_dir> [--check]".to_string()
}

fn parse_args() -> Result<(PathBuf, bool), String> {
    let mut model_dir: Option<PathBuf> = None;
    let mut check = false;

    for arg in env::args().skip(1) {
        match arg.as_str() {
            "--check" => check = true,
            "-h" | "--help" => return Err(usage()),
            _ => {
                if model_dir.is_none() {
                    model_dir = Some(PathBuf::from(arg));
                } else {
                    return Err(usage());
                }
            }
        }
    }

    let model_dir = model_dir.ok_or_else(usage)?;
    Ok((model_dir, check))
}

fn main() -> Result<(), String> {
    let (model_dir, check) = parse_args()?;

    if check {
        let artifacts = ModelArtifacts::load(&model_dir, true).map_err(|e| e.to_string())?;
        println!(
            "Verified {model_dir:?}: {}",
            artifacts.classifier.describe()
        );
        return Ok(());
    }

    let manifest_path = write_manifest(&model_dir).map_err(|e| e.to_string())?;
    println!("Wrote manifest: {manifest_path:?}");

    // The hashes are written regardless; report artifacts that still fail to load.
    let artifacts = ModelArtifacts::load(&model_dir, true).map_err(|e| e.to_string())?;
    println!("Verified: {}", artifacts.classifier.describe());
    Ok(())
}
