//! Attempt scoring: answer matching, percentages, pass/fail, and grades.
//!
//! Every function here is total. Division by zero yields `0.0`, and a
//! missing, unparseable, or out-of-range answer is scored as incorrect.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::model::{AnswerRecord, Assessment, PassStatus, Question, QuestionKind, Submission};

/// `obtained / total * 100`, or `0.0` when `total` is zero.
pub fn percentage(obtained: f64, total: f64) -> f64 {
    if total == 0.0 {
        return 0.0;
    }
    obtained / total * 100.0
}

/// Whether a percentage meets the threshold. The boundary passes.
pub fn is_passing(percentage: f64, threshold: f64) -> bool {
    percentage >= threshold
}

/// Letter grade on the 13-tier plus/minus scale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Grade {
    #[serde(rename = "A+")]
    APlus,
    A,
    #[serde(rename = "A-")]
    AMinus,
    #[serde(rename = "B+")]
    BPlus,
    B,
    #[serde(rename = "B-")]
    BMinus,
    #[serde(rename = "C+")]
    CPlus,
    C,
    #[serde(rename = "C-")]
    CMinus,
    #[serde(rename = "D+")]
    DPlus,
    D,
    #[serde(rename = "D-")]
    DMinus,
    F,
}

/// Lower bounds, checked top-down; the first match wins.
const GRADE_THRESHOLDS: [(f64, Grade); 12] = [
    (97.0, Grade::APlus),
    (93.0, Grade::A),
    (90.0, Grade::AMinus),
    (87.0, Grade::BPlus),
    (83.0, Grade::B),
    (80.0, Grade::BMinus),
    (77.0, Grade::CPlus),
    (73.0, Grade::C),
    (70.0, Grade::CMinus),
    (67.0, Grade::DPlus),
    (63.0, Grade::D),
    (60.0, Grade::DMinus),
];

impl Grade {
    pub fn from_percentage(percentage: f64) -> Self {
        GRADE_THRESHOLDS
            .iter()
            .find(|(min, _)| percentage >= *min)
            .map(|(_, grade)| *grade)
            .unwrap_or(Grade::F)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Grade::APlus => "A+",
            Grade::A => "A",
            Grade::AMinus => "A-",
            Grade::BPlus => "B+",
            Grade::B => "B",
            Grade::BMinus => "B-",
            Grade::CPlus => "C+",
            Grade::C => "C",
            Grade::CMinus => "C-",
            Grade::DPlus => "D+",
            Grade::D => "D",
            Grade::DMinus => "D-",
            Grade::F => "F",
        }
    }
}

impl fmt::Display for Grade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Coarse five-band grade used to filter report attempts (90/80/70/60).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum GradeBand {
    A,
    B,
    C,
    D,
    F,
}

impl GradeBand {
    pub fn from_percentage(percentage: f64) -> Self {
        if percentage >= 90.0 {
            GradeBand::A
        } else if percentage >= 80.0 {
            GradeBand::B
        } else if percentage >= 70.0 {
            GradeBand::C
        } else if percentage >= 60.0 {
            GradeBand::D
        } else {
            GradeBand::F
        }
    }
}

impl fmt::Display for GradeBand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            GradeBand::A => "A",
            GradeBand::B => "B",
            GradeBand::C => "C",
            GradeBand::D => "D",
            GradeBand::F => "F",
        };
        f.write_str(s)
    }
}

impl std::str::FromStr for GradeBand {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "A" => Ok(GradeBand::A),
            "B" => Ok(GradeBand::B),
            "C" => Ok(GradeBand::C),
            "D" => Ok(GradeBand::D),
            "F" => Ok(GradeBand::F),
            other => Err(format!("unknown grade band: {other} (expected A, B, C, D or F)")),
        }
    }
}

/// How free-text answers are compared with the reference answer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnswerMatching {
    /// Compare free-text answers case-sensitively. Both sides are always trimmed.
    #[serde(default)]
    pub case_sensitive: bool,
}

/// Where an attempt's total marks come from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TotalMarksPolicy {
    /// Always the sum of the attached question marks.
    #[default]
    SumOfQuestions,
    /// The assessment's configured total when set, else the question sum.
    PreferConfigured,
}

/// Parse a submitted MCQ value into a zero-based option index.
///
/// Accepts an option letter (`"b"`, `" C "`) or a numeric index (`"2"`).
pub fn parse_option(submitted: &str) -> Option<usize> {
    let trimmed = submitted.trim();
    if let Ok(index) = trimmed.parse::<usize>() {
        return Some(index);
    }
    let mut chars = trimmed.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) if c.is_ascii_alphabetic() => {
            Some((c.to_ascii_uppercase() as u8 - b'A') as usize)
        }
        _ => None,
    }
}

/// Whether `submitted` answers `question` correctly.
pub fn is_correct(question: &Question, submitted: Option<&str>, matching: AnswerMatching) -> bool {
    let Some(submitted) = submitted else {
        return false;
    };
    match &question.kind {
        QuestionKind::Mcq {
            options,
            correct_option,
        } => match parse_option(submitted) {
            Some(index) => index < options.len() && index == *correct_option,
            None => false,
        },
        QuestionKind::FreeText { correct_answer } => {
            let expected = correct_answer.trim();
            let given = submitted.trim();
            if expected.is_empty() {
                return false;
            }
            if matching.case_sensitive {
                given == expected
            } else {
                given.to_lowercase() == expected.to_lowercase()
            }
        }
    }
}

/// Scoring configuration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoringConfig {
    #[serde(default)]
    pub matching: AnswerMatching,
    #[serde(default)]
    pub total_marks_policy: TotalMarksPolicy,
}

/// The scored outcome of one submission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreSheet {
    /// One record per question, in assessment order.
    pub answers: Vec<AnswerRecord>,
    pub obtained_marks: u32,
    pub total_marks: u32,
    pub percentage: f64,
    pub pass_status: PassStatus,
}

/// Scores submissions against an assessment.
#[derive(Debug, Clone, Default)]
pub struct ScoringEngine {
    config: ScoringConfig,
}

impl ScoringEngine {
    pub fn new(config: ScoringConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ScoringConfig {
        &self.config
    }

    /// Total marks for an assessment under the configured policy.
    pub fn total_marks(&self, assessment: &Assessment) -> u32 {
        match (self.config.total_marks_policy, assessment.total_marks) {
            (TotalMarksPolicy::PreferConfigured, Some(configured)) => configured,
            _ => assessment.question_marks_total(),
        }
    }

    /// Score a submission. Answers to questions outside the assessment are ignored.
    pub fn score(&self, assessment: &Assessment, submission: &Submission) -> ScoreSheet {
        let answers: Vec<AnswerRecord> = assessment
            .ordered_questions()
            .into_iter()
            .map(|question| {
                let submitted = submission.answers.get(&question.id).cloned();
                let correct = is_correct(question, submitted.as_deref(), self.config.matching);
                AnswerRecord {
                    question_id: question.id.clone(),
                    submitted,
                    is_correct: correct,
                    marks_obtained: if correct { question.marks } else { 0 },
                    time_spent_secs: submission.time_spent.get(&question.id).copied(),
                }
            })
            .collect();

        let obtained_marks = answers
            .iter()
            .fold(0u32, |total, a| total.saturating_add(a.marks_obtained));
        let total_marks = self.total_marks(assessment);
        let pct = percentage(f64::from(obtained_marks), f64::from(total_marks));
        let pass_status = if is_passing(pct, assessment.pass_percentage) {
            PassStatus::Pass
        } else {
            PassStatus::Fail
        };

        tracing::debug!(
            assessment = %assessment.id,
            obtained_marks,
            total_marks,
            percentage = pct,
            "scored submission"
        );

        ScoreSheet {
            answers,
            obtained_marks,
            total_marks,
            percentage: pct,
            pass_status,
        }
    }
}
