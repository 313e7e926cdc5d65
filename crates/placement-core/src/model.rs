//! Core data model types for placement.
//!
//! Questions, assessments, and attempts are plain data. Scoring and
//! aggregation live in [`crate::scoring`] and [`crate::statistics`]; nothing
//! here talks to storage.

use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::DefinitionError;

/// Category label used when an assessment has none.
pub const UNCATEGORIZED: &str = "Uncategorized";

/// Longest allowed assessment, in minutes.
pub const MAX_DURATION_MINUTES: u32 = 240;

/// Upper bound on the marks of a single question.
pub const MAX_QUESTION_MARKS: u32 = 1000;

/// A single question in the bank.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Question {
    /// Unique identifier.
    pub id: String,
    /// The prompt shown to the student. May contain HTML markup.
    pub text: String,
    /// Answer format and the correct answer.
    pub kind: QuestionKind,
    /// Weight awarded for a correct answer.
    pub marks: u32,
    /// Difficulty label.
    #[serde(default)]
    pub difficulty: Difficulty,
}

/// How a question is answered.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum QuestionKind {
    /// Multiple choice with a zero-based correct option.
    Mcq {
        options: Vec<String>,
        correct_option: usize,
    },
    /// Free-text answer compared against a reference string.
    FreeText { correct_answer: String },
}

impl Question {
    /// Check the question's invariants.
    pub fn validate(&self) -> Result<(), DefinitionError> {
        if self.marks == 0 {
            return Err(DefinitionError::ZeroMarks(self.id.clone()));
        }
        if self.marks > MAX_QUESTION_MARKS {
            return Err(DefinitionError::MarksTooLarge {
                question_id: self.id.clone(),
                marks: self.marks,
            });
        }
        if let QuestionKind::Mcq {
            options,
            correct_option,
        } = &self.kind
        {
            if !(2..=4).contains(&options.len()) {
                return Err(DefinitionError::OptionCount {
                    question_id: self.id.clone(),
                    count: options.len(),
                });
            }
            if *correct_option >= options.len() {
                return Err(DefinitionError::CorrectOptionOutOfRange {
                    question_id: self.id.clone(),
                    index: *correct_option,
                    count: options.len(),
                });
            }
        }
        Ok(())
    }

    /// The correct answer as shown in results and exports.
    ///
    /// MCQ answers render as option letters (`A`, `B`, ...).
    pub fn correct_answer_label(&self) -> String {
        match &self.kind {
            QuestionKind::Mcq { correct_option, .. } => option_letter(*correct_option)
                .map(String::from)
                .unwrap_or_else(|| correct_option.to_string()),
            QuestionKind::FreeText { correct_answer } => correct_answer.clone(),
        }
    }

    /// Number of options, or zero for free-text questions.
    pub fn option_count(&self) -> usize {
        match &self.kind {
            QuestionKind::Mcq { options, .. } => options.len(),
            QuestionKind::FreeText { .. } => 0,
        }
    }
}

/// Letter for a zero-based option index (`0` → `A`).
pub fn option_letter(index: usize) -> Option<char> {
    u8::try_from(index)
        .ok()
        .filter(|i| *i < 26)
        .map(|i| (b'A' + i) as char)
}

/// Question difficulty.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    #[default]
    Medium,
    Hard,
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Difficulty::Easy => write!(f, "easy"),
            Difficulty::Medium => write!(f, "medium"),
            Difficulty::Hard => write!(f, "hard"),
        }
    }
}

impl FromStr for Difficulty {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "easy" => Ok(Difficulty::Easy),
            "medium" => Ok(Difficulty::Medium),
            "hard" => Ok(Difficulty::Hard),
            other => Err(format!("unknown difficulty: {other}")),
        }
    }
}

/// A question placed at a position within an assessment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssessmentQuestion {
    /// Position within the assessment (ascending).
    pub order: u32,
    pub question: Question,
}

/// Attempt and display policy flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttemptPolicy {
    /// Whether a student may start a new attempt after completing one.
    #[serde(default)]
    pub allow_multiple_attempts: bool,
    /// Whether the score is shown right after submission.
    #[serde(default = "default_true")]
    pub show_results_immediately: bool,
    /// Whether correct answers are revealed alongside the score.
    #[serde(default)]
    pub show_correct_answers: bool,
}

impl Default for AttemptPolicy {
    fn default() -> Self {
        Self {
            allow_multiple_attempts: false,
            show_results_immediately: true,
            show_correct_answers: false,
        }
    }
}

fn default_true() -> bool {
    true
}

/// An assessment: an ordered set of questions with a pass threshold.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Assessment {
    /// Unique identifier.
    pub id: String,
    /// Display title.
    pub title: String,
    /// Category label used for grouping in reports.
    #[serde(default = "default_category")]
    pub category: String,
    #[serde(default)]
    pub description: String,
    /// Questions with their positions.
    #[serde(default)]
    pub questions: Vec<AssessmentQuestion>,
    /// Explicitly configured total, independent of the question marks.
    #[serde(default)]
    pub total_marks: Option<u32>,
    /// Minimum percentage required to pass, in 1..=100.
    pub pass_percentage: f64,
    /// Time limit in minutes.
    pub duration_minutes: u32,
    #[serde(default)]
    pub policy: AttemptPolicy,
}

fn default_category() -> String {
    UNCATEGORIZED.to_string()
}

impl Assessment {
    /// Check the assessment and every attached question.
    pub fn validate(&self) -> Result<(), DefinitionError> {
        if !(1.0..=100.0).contains(&self.pass_percentage) {
            return Err(DefinitionError::PassPercentage(self.pass_percentage));
        }
        if self.duration_minutes == 0 || self.duration_minutes > MAX_DURATION_MINUTES {
            return Err(DefinitionError::Duration(self.duration_minutes));
        }
        let mut seen = HashSet::new();
        for entry in &self.questions {
            if !seen.insert(entry.question.id.as_str()) {
                return Err(DefinitionError::DuplicateQuestion(entry.question.id.clone()));
            }
            entry.question.validate()?;
        }
        Ok(())
    }

    /// Questions sorted by position. Ties keep their declaration order.
    pub fn ordered_questions(&self) -> Vec<&Question> {
        let mut entries: Vec<&AssessmentQuestion> = self.questions.iter().collect();
        entries.sort_by_key(|e| e.order);
        entries.into_iter().map(|e| &e.question).collect()
    }

    /// Sum of the marks of all attached questions.
    pub fn question_marks_total(&self) -> u32 {
        self.questions
            .iter()
            .fold(0u32, |total, e| total.saturating_add(e.question.marks))
    }

    /// Look up an attached question by id.
    pub fn question(&self, id: &str) -> Option<&Question> {
        self.questions
            .iter()
            .map(|e| &e.question)
            .find(|q| q.id == id)
    }

    /// Time limit in seconds.
    pub fn duration_secs(&self) -> i64 {
        i64::from(self.duration_minutes) * 60
    }
}

/// The student who owns an attempt.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Student {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub email: String,
}

/// Lifecycle state of an attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttemptStatus {
    InProgress,
    Completed,
}

/// Outcome of a scored attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PassStatus {
    Pass,
    Fail,
}

impl PassStatus {
    /// Capitalised label used in exports ("Pass" / "Fail").
    pub fn label(&self) -> &'static str {
        match self {
            PassStatus::Pass => "Pass",
            PassStatus::Fail => "Fail",
        }
    }
}

impl fmt::Display for PassStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PassStatus::Pass => write!(f, "pass"),
            PassStatus::Fail => write!(f, "fail"),
        }
    }
}

/// A student's answer to one question, with its derived score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnswerRecord {
    pub question_id: String,
    /// Raw submitted value; `None` when the question was skipped.
    pub submitted: Option<String>,
    pub is_correct: bool,
    pub marks_obtained: u32,
    #[serde(default)]
    pub time_spent_secs: Option<u32>,
}

/// One student's timed run through an assessment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Attempt {
    pub id: Uuid,
    pub assessment_id: String,
    pub student: Student,
    pub started_at: DateTime<Utc>,
    #[serde(default)]
    pub submitted_at: Option<DateTime<Utc>>,
    pub status: AttemptStatus,
    /// Per-question results in assessment order.
    #[serde(default)]
    pub answers: Vec<AnswerRecord>,
    #[serde(default)]
    pub obtained_marks: u32,
    /// Total marks snapshotted at submission.
    #[serde(default)]
    pub total_marks: u32,
    #[serde(default)]
    pub percentage: f64,
    #[serde(default)]
    pub pass_status: Option<PassStatus>,
    #[serde(default)]
    pub time_taken_secs: u64,
}

impl Attempt {
    /// Create a fresh in-progress attempt.
    pub fn start(assessment_id: &str, student: Student, started_at: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            assessment_id: assessment_id.to_string(),
            student,
            started_at,
            submitted_at: None,
            status: AttemptStatus::InProgress,
            answers: Vec::new(),
            obtained_marks: 0,
            total_marks: 0,
            percentage: 0.0,
            pass_status: None,
            time_taken_secs: 0,
        }
    }

    pub fn is_completed(&self) -> bool {
        self.status == AttemptStatus::Completed
    }

    pub fn is_pass(&self) -> bool {
        self.pass_status == Some(PassStatus::Pass)
    }

    /// Score as `obtained/total`.
    pub fn score_fraction(&self) -> String {
        format!("{}/{}", self.obtained_marks, self.total_marks)
    }

    /// The recorded answer for a question, if any.
    pub fn answer(&self, question_id: &str) -> Option<&AnswerRecord> {
        self.answers.iter().find(|a| a.question_id == question_id)
    }
}

/// The answers a student hands in for an attempt.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Submission {
    /// Question id → submitted value (option letter, option index, or text).
    #[serde(default)]
    pub answers: BTreeMap<String, String>,
    /// Question id → seconds spent.
    #[serde(default)]
    pub time_spent: BTreeMap<String, u32>,
}

/// A recorded submission loaded from disk, used for offline scoring.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubmissionRecord {
    pub student: Student,
    pub started_at: DateTime<Utc>,
    pub submitted_at: DateTime<Utc>,
    #[serde(flatten)]
    pub submission: Submission,
}
