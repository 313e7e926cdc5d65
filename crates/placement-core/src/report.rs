//! Assessment report types with JSON persistence.

use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::model::{Assessment, Attempt};
use crate::scoring::GradeBand;
use crate::statistics::{
    difficulty_level, difficulty_mix, distribution, question_analysis, student_performance,
    summarize, BucketCount, DifficultyLevel, DifficultyMix, QuestionStats, StudentPerformance,
    SummaryStats,
};

/// A complete results report for one assessment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssessmentReport {
    /// Unique report identifier.
    pub id: Uuid,
    /// When the report was created.
    pub created_at: DateTime<Utc>,
    /// Summary of the assessment.
    pub assessment: AssessmentSummary,
    /// Completed attempts, highest percentage first.
    pub attempts: Vec<Attempt>,
    pub summary: SummaryStats,
    pub distribution: Vec<BucketCount>,
    /// Per-question accuracy and option picks.
    pub questions: Vec<QuestionStats>,
    pub students: Vec<StudentPerformance>,
    /// Observed difficulty from the average score.
    pub difficulty: DifficultyLevel,
    /// Declared difficulty of the question set.
    pub difficulty_mix: DifficultyMix,
}

/// Summary of an assessment (without the full question definitions).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssessmentSummary {
    pub id: String,
    pub title: String,
    pub category: String,
    pub question_count: usize,
    pub total_marks: u32,
    pub pass_percentage: f64,
    pub duration_minutes: u32,
}

impl AssessmentReport {
    /// Build a report from an assessment and its attempts.
    ///
    /// Attempts that are still in progress or belong to another assessment
    /// are dropped.
    pub fn build(
        assessment: &Assessment,
        total_marks: u32,
        attempts: Vec<Attempt>,
        created_at: DateTime<Utc>,
    ) -> Self {
        let mut attempts: Vec<Attempt> = attempts
            .into_iter()
            .filter(|a| a.is_completed() && a.assessment_id == assessment.id)
            .collect();
        sort_by_percentage(&mut attempts);

        let summary = summarize(&attempts);
        Self {
            id: Uuid::new_v4(),
            created_at,
            assessment: AssessmentSummary {
                id: assessment.id.clone(),
                title: assessment.title.clone(),
                category: assessment.category.clone(),
                question_count: assessment.questions.len(),
                total_marks,
                pass_percentage: assessment.pass_percentage,
                duration_minutes: assessment.duration_minutes,
            },
            distribution: distribution(&attempts),
            questions: question_analysis(assessment, &attempts),
            students: student_performance(&attempts),
            difficulty: difficulty_level(summary.average_percentage),
            difficulty_mix: difficulty_mix(assessment.ordered_questions()),
            summary,
            attempts,
        }
    }

    /// Save the report as JSON to a file.
    pub fn save_json(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self).context("failed to serialize report")?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, json)
            .with_context(|| format!("failed to write report to {}", path.display()))?;
        Ok(())
    }

    /// Load a report from a JSON file.
    pub fn load_json(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read report from {}", path.display()))?;
        let report: AssessmentReport =
            serde_json::from_str(&content).context("failed to parse report JSON")?;
        Ok(report)
    }
}

/// Admin filter over a report's attempts.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AttemptFilter {
    /// Case-insensitive substring of the student's name or email.
    pub search: Option<String>,
    pub grade: Option<GradeBand>,
}

impl AttemptFilter {
    pub fn matches(&self, attempt: &Attempt) -> bool {
        let search_ok = self.search.as_deref().map_or(true, |needle| {
            let needle = needle.to_lowercase();
            attempt.student.name.to_lowercase().contains(&needle)
                || attempt.student.email.to_lowercase().contains(&needle)
        });
        let grade_ok = self
            .grade
            .map_or(true, |band| GradeBand::from_percentage(attempt.percentage) == band);
        search_ok && grade_ok
    }
}

impl AssessmentReport {
    /// Attempts matching `filter`, in report order.
    pub fn filtered_attempts(&self, filter: &AttemptFilter) -> Vec<&Attempt> {
        self.attempts.iter().filter(|a| filter.matches(a)).collect()
    }
}

/// Sort attempts by percentage, highest first. Ties go to the earlier submission.
pub fn sort_by_percentage(attempts: &mut [Attempt]) {
    attempts.sort_by(|a, b| {
        b.percentage
            .total_cmp(&a.percentage)
            .then_with(|| a.submitted_at.cmp(&b.submitted_at))
    });
}
