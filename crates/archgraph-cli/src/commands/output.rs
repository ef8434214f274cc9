//! Shared output formatting for check results.

use anyhow::Result;
use archgraph_core::{Severity, SliceCycle};
use serde::Serialize;

use crate::OutputFormat;

/// Everything `check` wants to report.
#[derive(Debug, Serialize)]
pub struct CheckReport {
    /// Number of classes in the resolved universe (stubs included).
    pub classes: usize,
    /// Inputs skipped for parse errors.
    pub skipped: usize,
    /// Cycle violations across all rules.
    pub violations: Vec<CycleViolation>,
}

impl CheckReport {
    /// Returns `true` if any violation is error severity.
    #[must_use]
    pub fn has_errors(&self) -> bool {
        self.violations.iter().any(|v| v.severity == Severity::Error)
    }

    fn count_by_severity(&self) -> (usize, usize, usize) {
        let mut counts = (0, 0, 0);
        for violation in &self.violations {
            match violation.severity {
                Severity::Error => counts.0 += 1,
                Severity::Warning => counts.1 += 1,
                Severity::Info => counts.2 += 1,
            }
        }
        counts
    }
}

/// One slice cycle, attributed to the rule that found it.
#[derive(Debug, Serialize)]
pub struct CycleViolation {
    /// Pattern text of the rule.
    pub rule: String,
    /// Severity configured for the rule.
    pub severity: Severity,
    /// The cycle walk with evidence.
    pub cycle: SliceCycle,
}

/// Print check results in the specified format.
pub fn print(report: &CheckReport, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Text => print_text(report),
        OutputFormat::Json => return print_json(report),
        OutputFormat::Compact => print_compact(report),
    }
    Ok(())
}

fn print_text(report: &CheckReport) {
    let (errors, warnings, infos) = report.count_by_severity();

    for violation in &report.violations {
        let severity_indicator = match violation.severity {
            Severity::Error => "\x1b[31merror\x1b[0m",
            Severity::Warning => "\x1b[33mwarning\x1b[0m",
            Severity::Info => "\x1b[34minfo\x1b[0m",
        };

        println!(
            "{severity_indicator}: slice cycle {}",
            violation.cycle.describe()
        );
        println!("  rule: {}", violation.rule);
        for edge in &violation.cycle.edges {
            println!("  {} -> {} ({} dependencies)", edge.from, edge.to, edge.total);
            for evidence in &edge.evidence {
                let member = evidence
                    .member
                    .as_ref()
                    .map(|name| format!(".{name}"))
                    .unwrap_or_default();
                let line = evidence
                    .line
                    .map(|line| format!(" at line {line}"))
                    .unwrap_or_default();
                println!(
                    "    {} -> {}{member} ({}){line}",
                    evidence.origin,
                    evidence.target,
                    evidence.kind.label(),
                );
            }
        }
        println!();
    }

    let summary_color = if errors > 0 {
        "\x1b[31m"
    } else if warnings > 0 {
        "\x1b[33m"
    } else {
        "\x1b[32m"
    };

    println!(
        "{}Found {} error(s), {} warning(s), {} info(s) in {} class(es), {} input(s) skipped\x1b[0m",
        summary_color, errors, warnings, infos, report.classes, report.skipped
    );
}

fn print_json(report: &CheckReport) -> Result<()> {
    let json = serde_json::to_string_pretty(report)?;
    println!("{json}");
    Ok(())
}

fn print_compact(report: &CheckReport) {
    for violation in &report.violations {
        println!(
            "{} [{}] {}",
            violation.severity,
            violation.rule,
            violation.cycle.describe(),
        );
    }
}
