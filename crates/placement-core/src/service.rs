//! Attempt service: the lifecycle from starting an attempt to a stored,
//! scored result.
//!
//! Ties an [`AssessmentStore`] and a [`ChangeNotifier`] to the scoring
//! engine. Notifications are fired after the store write succeeds and their
//! failures are logged, never returned.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::PortalError;
use crate::model::{Assessment, Attempt, AttemptStatus, PassStatus, Student, Submission};
use crate::report::AssessmentReport;
use crate::scoring::{Grade, ScoringConfig, ScoringEngine};
use crate::timing::{elapsed_secs, time_remaining};
use crate::traits::{AssessmentStore, BeginOutcome, ChangeNotifier};

/// Coordinates assessments and attempts over a store and a notifier.
pub struct AttemptService {
    store: Arc<dyn AssessmentStore>,
    notifier: Arc<dyn ChangeNotifier>,
    engine: ScoringEngine,
}

impl AttemptService {
    pub fn new(
        store: Arc<dyn AssessmentStore>,
        notifier: Arc<dyn ChangeNotifier>,
        scoring: ScoringConfig,
    ) -> Self {
        Self {
            store,
            notifier,
            engine: ScoringEngine::new(scoring),
        }
    }

    pub fn engine(&self) -> &ScoringEngine {
        &self.engine
    }

    /// Validate and store an assessment, then announce the change.
    pub async fn save_assessment(&self, assessment: &Assessment) -> Result<(), PortalError> {
        assessment.validate()?;
        self.store.save_assessment(assessment).await?;
        tracing::info!(assessment = %assessment.id, "assessment saved");
        self.announce_change(&assessment.id).await;
        Ok(())
    }

    /// Delete an assessment, then announce the change.
    pub async fn delete_assessment(&self, assessment_id: &str) -> Result<(), PortalError> {
        if !self.store.delete_assessment(assessment_id).await? {
            return Err(PortalError::AssessmentNotFound(assessment_id.to_string()));
        }
        tracing::info!(assessment = %assessment_id, "assessment deleted");
        self.announce_change(assessment_id).await;
        Ok(())
    }

    /// Start a new attempt for a student.
    ///
    /// Fails if the student has an attempt in progress, or has completed one
    /// and the assessment does not allow retakes.
    pub async fn start_attempt(
        &self,
        assessment_id: &str,
        student: Student,
        now: DateTime<Utc>,
    ) -> Result<Attempt, PortalError> {
        let assessment = self.require_assessment(assessment_id).await?;
        let attempt = Attempt::start(assessment_id, student, now);

        match self
            .store
            .begin_attempt(&attempt, assessment.policy.allow_multiple_attempts)
            .await?
        {
            BeginOutcome::Started => {}
            BeginOutcome::InProgress(open) => {
                return Err(PortalError::AttemptInProgress {
                    student_id: attempt.student.id,
                    attempt_id: open,
                });
            }
            BeginOutcome::AlreadyAttempted => {
                return Err(PortalError::AttemptNotAllowed {
                    student_id: attempt.student.id,
                    assessment_id: assessment_id.to_string(),
                });
            }
        }
        tracing::info!(
            attempt = %attempt.id,
            assessment = %assessment_id,
            student = %attempt.student.id,
            "attempt started"
        );
        Ok(attempt)
    }

    /// Score and complete an attempt.
    ///
    /// Late submissions are still scored; the overrun is only logged.
    pub async fn submit_attempt(
        &self,
        attempt_id: Uuid,
        submission: &Submission,
        now: DateTime<Utc>,
    ) -> Result<Attempt, PortalError> {
        let mut attempt = self
            .store
            .attempt(attempt_id)
            .await?
            .ok_or(PortalError::AttemptNotFound(attempt_id))?;
        if attempt.is_completed() {
            return Err(PortalError::AttemptCompleted(attempt_id));
        }
        let assessment = self.require_assessment(&attempt.assessment_id).await?;

        let remaining = time_remaining(attempt.started_at, now, assessment.duration_secs());
        if remaining < 0 {
            tracing::warn!(attempt = %attempt.id, overrun_secs = -remaining, "attempt submitted after time limit");
        }

        let sheet = self.engine.score(&assessment, submission);
        attempt.answers = sheet.answers;
        attempt.obtained_marks = sheet.obtained_marks;
        attempt.total_marks = sheet.total_marks;
        attempt.percentage = sheet.percentage;
        attempt.pass_status = Some(sheet.pass_status);
        attempt.submitted_at = Some(now);
        attempt.time_taken_secs = elapsed_secs(attempt.started_at, now);
        attempt.status = AttemptStatus::Completed;

        if !self.store.complete_attempt(&attempt).await? {
            return Err(PortalError::AttemptCompleted(attempt_id));
        }
        tracing::info!(
            attempt = %attempt.id,
            assessment = %assessment.id,
            score = %attempt.score_fraction(),
            percentage = attempt.percentage,
            status = %sheet.pass_status,
            "attempt submitted"
        );

        if let Err(e) = self.notifier.result_published(&attempt, &assessment).await {
            tracing::warn!(
                notifier = self.notifier.name(),
                attempt = %attempt.id,
                "result notification failed: {e:#}"
            );
        }

        Ok(attempt)
    }

    /// Seconds left on an in-progress attempt. Negative once overrun.
    pub async fn time_remaining(
        &self,
        attempt_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<i64, PortalError> {
        let attempt = self
            .store
            .attempt(attempt_id)
            .await?
            .ok_or(PortalError::AttemptNotFound(attempt_id))?;
        if attempt.is_completed() {
            return Err(PortalError::AttemptCompleted(attempt_id));
        }
        let assessment = self.require_assessment(&attempt.assessment_id).await?;
        Ok(time_remaining(attempt.started_at, now, assessment.duration_secs()))
    }

    /// Build a results report from the store's completed attempts.
    pub async fn report(
        &self,
        assessment_id: &str,
        now: DateTime<Utc>,
    ) -> Result<AssessmentReport, PortalError> {
        let assessment = self.require_assessment(assessment_id).await?;
        let attempts = self.store.completed_attempts(assessment_id).await?;
        Ok(AssessmentReport::build(
            &assessment,
            self.engine.total_marks(&assessment),
            attempts,
            now,
        ))
    }

    async fn require_assessment(&self, id: &str) -> Result<Assessment, PortalError> {
        self.store
            .assessment(id)
            .await?
            .ok_or_else(|| PortalError::AssessmentNotFound(id.to_string()))
    }

    async fn announce_change(&self, assessment_id: &str) {
        if let Err(e) = self.notifier.assessment_changed(assessment_id).await {
            tracing::warn!(
                notifier = self.notifier.name(),
                assessment = %assessment_id,
                "change notification failed: {e:#}"
            );
        }
    }
}

/// What a student is shown after submitting, per the assessment's policy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultView {
    pub attempt_id: Uuid,
    pub assessment_title: String,
    pub submitted_at: Option<DateTime<Utc>>,
    /// `None` when results are withheld.
    pub score: Option<ScoreSummary>,
    /// Per-question review; empty when results are withheld.
    pub review: Vec<AnswerReview>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreSummary {
    pub obtained_marks: u32,
    pub total_marks: u32,
    pub percentage: f64,
    pub pass_status: PassStatus,
    pub grade: Grade,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnswerReview {
    pub question_id: String,
    pub submitted: Option<String>,
    pub is_correct: bool,
    /// Present only when the assessment reveals correct answers.
    pub correct_answer: Option<String>,
}

impl ResultView {
    /// Apply the display policy of `assessment` to a completed attempt.
    pub fn new(attempt: &Attempt, assessment: &Assessment) -> Self {
        let policy = assessment.policy;
        let visible = policy.show_results_immediately && attempt.is_completed();

        let score = visible.then(|| ScoreSummary {
            obtained_marks: attempt.obtained_marks,
            total_marks: attempt.total_marks,
            percentage: attempt.percentage,
            pass_status: attempt.pass_status.unwrap_or(PassStatus::Fail),
            grade: Grade::from_percentage(attempt.percentage),
        });

        let review = if visible {
            attempt
                .answers
                .iter()
                .map(|record| AnswerReview {
                    question_id: record.question_id.clone(),
                    submitted: record.submitted.clone(),
                    is_correct: record.is_correct,
                    correct_answer: policy
                        .show_correct_answers
                        .then(|| assessment.question(&record.question_id))
                        .flatten()
                        .map(|q| q.correct_answer_label()),
                })
                .collect()
        } else {
            Vec::new()
        };

        Self {
            attempt_id: attempt.id,
            assessment_title: assessment.title.clone(),
            submitted_at: attempt.submitted_at,
            score,
            review,
        }
    }
}
