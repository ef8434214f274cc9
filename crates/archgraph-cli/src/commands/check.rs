//! Check command implementation.

use anyhow::{Context, Result};
use archgraph_core::{ClassGraphBuilder, Config, SliceGraph, SlicePartition, SlicePattern};
use std::path::Path;

use super::output::{CheckReport, CycleViolation};
use crate::OutputFormat;

const CONFIG_FILE_NAME: &str = "archgraph.toml";

/// Runs the check command.
pub fn run(
    path: &Path,
    format: OutputFormat,
    fail_fast: bool,
    config_path: Option<&Path>,
) -> Result<()> {
    let config = load_config(path, config_path)?;
    if config.slices.is_empty() {
        tracing::warn!("no [[slices]] rules configured, only import diagnostics will be reported");
    }

    let sources = crate::sources::collect(path)?;
    tracing::info!("Analyzing {} class file(s) under {:?}", sources.len(), path);

    let mut builder =
        ClassGraphBuilder::new().fail_fast(fail_fast || config.import.fail_fast);
    builder.add_sources(sources).context("Import failed")?;
    let outcome = builder.resolve().context("Import failed")?;

    let mut violations = Vec::new();
    for rule in &config.slices {
        let mut pattern = SlicePattern::new(&rule.pattern)
            .with_context(|| format!("Invalid slice rule {:?}", rule.pattern))?;
        if let Some(template) = &rule.name {
            pattern = pattern
                .with_name_template(template)
                .with_context(|| format!("Invalid slice rule {:?}", rule.pattern))?;
        }

        let partition = SlicePartition::partition(&outcome.universe, &pattern);
        let graph = SliceGraph::build(&outcome.universe, &partition, rule.evidence_limit);
        for cycle in graph.find_cycles() {
            violations.push(CycleViolation {
                rule: rule.pattern.clone(),
                severity: rule.severity,
                cycle,
            });
        }
    }

    let report = CheckReport {
        classes: outcome.universe.len(),
        skipped: outcome.report.skipped.len(),
        violations,
    };

    super::output::print(&report, format)?;

    if report.has_errors() {
        std::process::exit(1);
    }

    Ok(())
}

/// Loads the configuration: `--config` wins, then `archgraph.toml` next to
/// the analyzed path, then defaults.
fn load_config(path: &Path, explicit: Option<&Path>) -> Result<Config> {
    if let Some(explicit) = explicit {
        return Config::from_file(explicit)
            .with_context(|| format!("Failed to load config: {}", explicit.display()));
    }

    let root = if path.is_dir() { path } else { path.parent().unwrap_or(path) };
    let candidate = root.join(CONFIG_FILE_NAME);
    if candidate.exists() {
        tracing::info!("Using config: {}", candidate.display());
        return Config::from_file(&candidate)
            .with_context(|| format!("Failed to load config: {}", candidate.display()));
    }

    Ok(Config::default())
}
