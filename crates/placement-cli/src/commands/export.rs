//! The `placement export` command.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use placement_core::model::Assessment;
use placement_core::parser;
use placement_core::report::AssessmentReport;
use placement_report::{detailed_csv, summary_csv, write_csv, write_html_report};

pub fn execute(
    report_path: PathBuf,
    assessment_path: Option<PathBuf>,
    format: String,
    output: PathBuf,
) -> Result<()> {
    let report = AssessmentReport::load_json(&report_path)?;

    let assessment = match &assessment_path {
        Some(path) => {
            let assessment = parser::parse_assessment(path)?;
            anyhow::ensure!(
                assessment.id == report.assessment.id,
                "assessment '{}' does not match report for '{}'",
                assessment.id,
                report.assessment.id
            );
            Some(assessment)
        }
        None => None,
    };

    write_formats(&report, assessment.as_ref(), &format, &output)
}

/// Write `report` in each comma-separated format to `output`.
///
/// CSV formats need the full assessment definition; `html` and `json` only
/// need the report.
pub fn write_formats(
    report: &AssessmentReport,
    assessment: Option<&Assessment>,
    format: &str,
    output: &Path,
) -> Result<()> {
    let formats: Vec<&str> = if format == "all" {
        vec!["json", "csv", "detailed", "html"]
    } else {
        format.split(',').map(str::trim).collect()
    };

    std::fs::create_dir_all(output)
        .with_context(|| format!("failed to create output directory: {}", output.display()))?;
    let id = &report.assessment.id;
    let timestamp = report.created_at.format("%Y-%m-%d_%H%M%S");

    for fmt in formats {
        match fmt {
            "json" => {
                let path = output.join(format!("assessment_{id}_report_{timestamp}.json"));
                report.save_json(&path)?;
                eprintln!("Report saved to: {}", path.display());
            }
            "csv" => {
                let assessment = require_assessment(assessment, fmt)?;
                let bytes = summary_csv(
                    assessment,
                    report.assessment.total_marks,
                    &report.attempts,
                    report.created_at,
                );
                let path = output.join(format!("assessment_{id}_results_{timestamp}.csv"));
                write_csv(&bytes, &path)?;
                eprintln!("Summary CSV: {}", path.display());
            }
            "detailed" => {
                let assessment = require_assessment(assessment, fmt)?;
                let bytes = detailed_csv(assessment, &report.attempts);
                let path =
                    output.join(format!("assessment_{id}_detailed_results_{timestamp}.csv"));
                write_csv(&bytes, &path)?;
                eprintln!("Detailed CSV: {}", path.display());
            }
            "html" => {
                let path = output.join(format!("assessment_{id}_report_{timestamp}.html"));
                write_html_report(report, &path)?;
                eprintln!("HTML report: {}", path.display());
            }
            _ => {
                eprintln!("Unknown format: {fmt}");
            }
        }
    }

    Ok(())
}

fn require_assessment<'a>(assessment: Option<&'a Assessment>, fmt: &str) -> Result<&'a Assessment> {
    assessment.with_context(|| format!("--assessment is required for the '{fmt}' format"))
}
