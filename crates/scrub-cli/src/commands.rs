//! Subcommand implementations.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::info;

use scrub_apply::ApplyOptions;
use scrub_engine::PipelineConfig;
use scrub_model::{Plan, Stage, StagePlan};
use scrub_session::{SessionStore, StageSuggestions};

use crate::cli::{CorrMethodArg, InspectArgs, RunArgs, SuggestArgs};
use crate::tables;

pub fn run(args: &RunArgs) -> Result<()> {
    let store = SessionStore::new();
    let (id, schema) = store
        .create_session_from_csv_path(&args.input)
        .with_context(|| format!("read {}", args.input.display()))?;
    println!(
        "Loaded {} ({} rows x {} columns)",
        args.input.display(),
        schema.rows,
        schema.column_count()
    );
    println!("{}", tables::schema_table(&schema));

    let config = pipeline_config(args.corr_threshold, args.corr_method);
    let options = ApplyOptions {
        iqr_multiplier: config.outliers.iqr_multiplier,
    };
    let stages = [
        (Stage::Missing, args.no_missing),
        (Stage::Outliers, args.no_outliers),
        (Stage::Correlation, args.no_correlation),
        (Stage::Encoding, args.no_encoding),
        (Stage::Scaling, args.no_scaling),
    ];

    for (stage, skipped) in stages {
        if skipped {
            info!(stage = %stage, "disabled by flag");
            continue;
        }
        let suggestions = store.suggestions(id, stage, &config)?;
        if suggestions.is_empty() {
            info!(stage = %stage, "nothing to do");
            continue;
        }
        println!("\n[{stage}]");
        println!("{}", tables::suggestion_table(&suggestions));

        if stage == Stage::Correlation {
            if args.auto_drop {
                let schema = store.apply_correlation_drop(id, &config.correlation, true)?;
                println!("-> {} rows x {} columns", schema.rows, schema.column_count());
            } else {
                println!("(rerun with --auto-drop to drop the listed columns)");
            }
            continue;
        }
        if let Some(plan) = accept_all(&suggestions) {
            let schema = store.apply_plan(id, plan, &options)?;
            println!("-> {} rows x {} columns", schema.rows, schema.column_count());
        }
    }

    let output = args
        .output
        .clone()
        .unwrap_or_else(|| default_output(&args.input));
    let bytes = store.export_csv(id)?;
    fs::write(&output, bytes).with_context(|| format!("write {}", output.display()))?;
    println!("\nCleaned CSV written to {}", output.display());

    if let Some(path) = &args.log_json {
        let log = store.step_log(id)?;
        let json = serde_json::to_string_pretty(&log).context("serialize step log")?;
        fs::write(path, json).with_context(|| format!("write {}", path.display()))?;
        println!("Step log written to {}", path.display());
    }
    store.remove_session(id)?;
    Ok(())
}

pub fn schema(args: &InspectArgs) -> Result<()> {
    let store = SessionStore::new();
    let (_, schema) = store
        .create_session_from_csv_path(&args.input)
        .with_context(|| format!("read {}", args.input.display()))?;
    if args.json {
        println!("{}", serde_json::to_string_pretty(&schema)?);
    } else {
        println!("{}", tables::schema_table(&schema));
        println!("{} rows", schema.rows);
    }
    Ok(())
}

pub fn suggest(args: &SuggestArgs) -> Result<()> {
    let store = SessionStore::new();
    let (id, _) = store
        .create_session_from_csv_path(&args.input)
        .with_context(|| format!("read {}", args.input.display()))?;
    let config = pipeline_config(args.corr_threshold, args.corr_method);
    let stage: Stage = args.stage.into();
    let suggestions = store.suggestions(id, stage, &config)?;
    if args.json {
        println!("{}", serde_json::to_string_pretty(&suggestions)?);
    } else if suggestions.is_empty() {
        println!("no suggestions for stage '{stage}'");
    } else {
        println!("{}", tables::suggestion_table(&suggestions));
    }
    Ok(())
}

fn pipeline_config(corr_threshold: Option<f64>, corr_method: CorrMethodArg) -> PipelineConfig {
    let mut config = PipelineConfig::default();
    if let Some(threshold) = corr_threshold {
        config.correlation.threshold = threshold;
    }
    config.correlation.method = corr_method.into();
    config
}

/// Turn a suggestion map into a plan accepting every recommendation.
fn accept_all(suggestions: &StageSuggestions) -> Option<StagePlan> {
    match suggestions {
        StageSuggestions::Missing { suggestions } => Some(StagePlan::Missing {
            plan: Plan::from_assignments(suggestions.iter().map(|(id, r)| (*id, r.action))),
        }),
        StageSuggestions::Outliers { suggestions } => Some(StagePlan::Outliers {
            plan: Plan::from_assignments(suggestions.iter().map(|(id, r)| (*id, r.action))),
        }),
        StageSuggestions::Encoding { suggestions } => Some(StagePlan::Encoding {
            plan: Plan::from_assignments(suggestions.iter().map(|(id, r)| (*id, r.action))),
        }),
        StageSuggestions::Scaling { suggestions } => Some(StagePlan::Scaling {
            plan: Plan::from_assignments(suggestions.iter().map(|(id, r)| (*id, r.action))),
        }),
        StageSuggestions::Prune | StageSuggestions::Correlation { .. } => None,
    }
}

fn default_output(input: &Path) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "cleaned".to_string());
    input.with_file_name(format!("{stem}_cleaned.csv"))
}
