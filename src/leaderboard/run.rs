use std::path::Path;

use anyhow::{Context, Result, bail};
use serde::de::DeserializeOwned;
use tracing::{info, warn};

use super::{Documents, Inputs, OutputPaths, ResultPaths, assemble};
use crate::cli::Cli;
use crate::model::SourceRecord;
use crate::normalize::Normalizer;
use crate::stats::round_floats;
use crate::util::{now_local_string, read_json, sha256_file, write_json_pretty};

const FLOAT_DIGITS: usize = 3;

pub fn run(args: Cli) -> Result<()> {
    let paths = ResultPaths::new(&args.results_root);
    let outputs = OutputPaths::new(&args.output_dir);

    info!(
        results_root = %args.results_root.display(),
        output_dir = %args.output_dir.display(),
        "starting leaderboard build"
    );

    let documents = build(&paths)?;

    if args.dry_run {
        info!(
            models = documents.leaderboard.models.len(),
            human_vs_model = !documents.leaderboard.human_vs_model.is_empty(),
            "leaderboard dry-run complete"
        );
        return Ok(());
    }

    write_documents(&documents, &outputs)?;
    println!("已生成文件：{}", outputs.leaderboard.display());
    println!("标准对照文件：{}", outputs.standards.display());

    Ok(())
}

/// Reads every input and assembles both documents in memory. Nothing is
/// written, so a missing required file leaves no partial output behind.
pub fn build(paths: &ResultPaths) -> Result<Documents> {
    let sources = source_records(paths)?;
    let inputs = load_inputs(paths)?;
    let normalizer = Normalizer::new()?;
    Ok(assemble(inputs, sources, now_local_string(), &normalizer))
}

pub fn write_documents(documents: &Documents, outputs: &OutputPaths) -> Result<()> {
    let leaderboard =
        serde_json::to_value(&documents.leaderboard).context("failed to serialize leaderboard")?;
    write_json_pretty(&outputs.leaderboard, &round_floats(leaderboard, FLOAT_DIGITS))?;
    info!(path = %outputs.leaderboard.display(), "wrote leaderboard");

    write_json_pretty(&outputs.standards, &documents.standards)?;
    info!(path = %outputs.standards.display(), "wrote standards");

    Ok(())
}

fn source_records(paths: &ResultPaths) -> Result<Vec<SourceRecord>> {
    let mut records = Vec::new();
    for slot in paths.slots() {
        let present = slot.path.is_file();
        if !present && slot.required {
            bail!(
                "missing required {} results file: {}",
                slot.role,
                slot.path.display()
            );
        }
        if !present {
            warn!(
                role = slot.role,
                path = %slot.path.display(),
                "optional results file missing, section skipped"
            );
        }

        let sha256 = if present {
            Some(sha256_file(slot.path)?)
        } else {
            None
        };
        records.push(SourceRecord {
            role: slot.role.to_string(),
            path: slot.path.display().to_string(),
            required: slot.required,
            present,
            sha256,
        });
    }
    Ok(records)
}

fn load_inputs(paths: &ResultPaths) -> Result<Inputs> {
    Ok(Inputs {
        multiple_choice: load(&paths.multiple_choice)?,
        spatial_detail: load(&paths.spatial_detail)?,
        spatial_overall: load(&paths.spatial_overall)?,
        comparison: load_optional(&paths.comparison)?,
        spatial_comparison: load_optional(&paths.spatial_comparison)?,
        likert: load_optional(&paths.likert)?,
    })
}

fn load<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let parsed = read_json(path)?;
    info!(path = %path.display(), "loaded results file");
    Ok(parsed)
}

fn load_optional<T: DeserializeOwned>(path: &Path) -> Result<Option<T>> {
    if !path.is_file() {
        return Ok(None);
    }
    load(path).map(Some)
}
