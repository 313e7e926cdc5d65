//! Error types for the assessment model and attempt service.
//!
//! Scoring itself never fails: malformed answers are simply incorrect and
//! empty totals yield zero. These errors cover definitions that break the
//! model's invariants and attempt lifecycle violations.

use thiserror::Error;
use uuid::Uuid;

/// A question or assessment definition that violates a model invariant.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DefinitionError {
    /// An MCQ must offer between 2 and 4 options.
    #[error("question {question_id}: expected 2-4 options, found {count}")]
    OptionCount { question_id: String, count: usize },

    /// The correct option does not index into the option list.
    #[error("question {question_id}: correct option {index} is out of range for {count} options")]
    CorrectOptionOutOfRange {
        question_id: String,
        index: usize,
        count: usize,
    },

    /// A question must be worth at least one mark.
    #[error("question {0}: marks must be positive")]
    ZeroMarks(String),

    /// A question may be worth at most `MAX_QUESTION_MARKS`.
    #[error("question {question_id}: {marks} marks exceeds the limit of {max}", max = crate::model::MAX_QUESTION_MARKS)]
    MarksTooLarge { question_id: String, marks: u32 },

    /// Pass percentage must lie in 1..=100.
    #[error("pass percentage {0} is outside 1..=100")]
    PassPercentage(f64),

    /// Duration must be positive and at most four hours.
    #[error("duration of {0} minutes is outside 1..=240")]
    Duration(u32),

    /// Two questions in one assessment share an id.
    #[error("duplicate question id: {0}")]
    DuplicateQuestion(String),
}

/// Errors raised by the attempt service.
#[derive(Debug, Error)]
pub enum PortalError {
    /// The referenced assessment does not exist.
    #[error("assessment not found: {0}")]
    AssessmentNotFound(String),

    /// The referenced attempt does not exist.
    #[error("attempt not found: {0}")]
    AttemptNotFound(Uuid),

    /// The student already has an attempt and retakes are disabled.
    #[error("student {student_id} has already attempted {assessment_id}")]
    AttemptNotAllowed {
        student_id: String,
        assessment_id: String,
    },

    /// The student has an unfinished attempt for this assessment.
    #[error("student {student_id} already has attempt {attempt_id} in progress")]
    AttemptInProgress { student_id: String, attempt_id: Uuid },

    /// Completed attempts are immutable.
    #[error("attempt {0} is already completed")]
    AttemptCompleted(Uuid),

    /// The assessment definition is invalid.
    #[error(transparent)]
    Definition(#[from] DefinitionError),

    /// The backing store failed.
    #[error("store error: {0:#}")]
    Store(#[from] anyhow::Error),
}
