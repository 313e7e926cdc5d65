//! The `placement score` command.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use chrono::Utc;

use placement_core::error::PortalError;
use placement_core::model::{Attempt, SubmissionRecord};
use placement_core::parser;
use placement_core::service::AttemptService;
use placement_core::store::MemoryStore;
use placement_core::traits::{ChangeNotifier, NoopNotifier};
use placement_notify::{build_notifier, load_config_from};

use super::export::write_formats;
use super::stats::print_summary;

pub async fn execute(
    assessment_path: PathBuf,
    submissions_path: PathBuf,
    output: Option<PathBuf>,
    format: String,
    no_notify: bool,
    config_path: Option<PathBuf>,
) -> Result<()> {
    let config = load_config_from(config_path.as_deref())?;
    let assessment = parser::parse_assessment(&assessment_path)?;
    let records = parser::parse_submissions(&submissions_path)?;

    let notifier: Arc<dyn ChangeNotifier> = if no_notify {
        Arc::new(NoopNotifier)
    } else {
        Arc::new(build_notifier(&config)?)
    };
    let service = AttemptService::new(
        Arc::new(MemoryStore::new()),
        notifier,
        config.scoring.to_scoring_config(),
    );

    service.save_assessment(&assessment).await?;

    eprintln!(
        "placement v{}: scoring {} submissions for {}",
        env!("CARGO_PKG_VERSION"),
        records.len(),
        assessment.title
    );
    eprintln!();

    let mut skipped = 0;
    for record in records {
        let student_name = record.student.name.clone();
        let outcome = score_record(&service, &assessment.id, record).await;

        match outcome {
            Ok(attempt) => eprintln!(
                "  Scored: {} {} ({:.2}%) {}",
                student_name,
                attempt.score_fraction(),
                attempt.percentage,
                attempt.pass_status.map(|s| s.label()).unwrap_or("-"),
            ),
            Err(e) => {
                skipped += 1;
                eprintln!("  Skipped: {student_name}: {e:#}");
            }
        }
    }
    if skipped > 0 {
        eprintln!("\n{skipped} submission(s) skipped.");
    }

    let report = service.report(&assessment.id, Utc::now()).await?;
    print_summary(&report);

    let output = output.unwrap_or_else(|| config.output_dir.clone());
    write_formats(&report, Some(&assessment), &format, &output)?;

    Ok(())
}

async fn score_record(
    service: &AttemptService,
    assessment_id: &str,
    record: SubmissionRecord,
) -> Result<Attempt, PortalError> {
    let attempt = service
        .start_attempt(assessment_id, record.student, record.started_at)
        .await?;
    service
        .submit_attempt(attempt.id, &record.submission, record.submitted_at)
        .await
}
