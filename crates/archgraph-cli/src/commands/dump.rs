//! Dump command implementation.

use anyhow::{Context, Result};
use archgraph_core::ClassGraphBuilder;
use std::path::Path;

use crate::DumpFormat;

/// Runs the dump command.
pub fn run(path: &Path, format: DumpFormat) -> Result<()> {
    let sources = crate::sources::collect(path)?;
    tracing::info!("Importing {} class file(s) under {:?}", sources.len(), path);

    let mut builder = ClassGraphBuilder::new();
    builder.add_sources(sources).context("Import failed")?;
    let outcome = builder.resolve().context("Import failed")?;

    match format {
        DumpFormat::Text => print_stats(&outcome),
        DumpFormat::Json => {
            let json = serde_json::to_string_pretty(&outcome.universe)?;
            println!("{json}");
        }
    }
    Ok(())
}

fn print_stats(outcome: &archgraph_core::ImportOutcome) {
    let stats = outcome.universe.stats();
    println!("classes:      {}", stats.classes);
    println!("stubs:        {}", stats.stubs);
    println!("members:      {}", stats.members);
    println!("dependencies: {}", stats.dependencies);
    for (kind, count) in &stats.by_kind {
        println!("  {:<20} {count}", kind.label());
    }
    if !outcome.report.skipped.is_empty() {
        println!("skipped inputs: {}", outcome.report.skipped.len());
        for skipped in &outcome.report.skipped {
            println!("  {}: {}", skipped.identifier, skipped.error);
        }
    }
}
