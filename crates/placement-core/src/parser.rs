//! TOML question bank parser.
//!
//! Loads assessments from TOML files and directories, validates them, and
//! reads recorded submissions from JSON.

use std::collections::HashSet;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::model::{
    Assessment, AssessmentQuestion, AttemptPolicy, Difficulty, Question, QuestionKind,
    SubmissionRecord, UNCATEGORIZED,
};
use crate::scoring::parse_option;

/// Intermediate TOML structure for parsing question bank files.
#[derive(Debug, Deserialize)]
struct TomlAssessmentFile {
    assessment: TomlAssessmentHeader,
    #[serde(default)]
    questions: Vec<TomlQuestion>,
}

#[derive(Debug, Deserialize)]
struct TomlAssessmentHeader {
    id: String,
    title: String,
    #[serde(default)]
    category: Option<String>,
    #[serde(default)]
    description: String,
    #[serde(default)]
    total_marks: Option<u32>,
    #[serde(default = "default_pass_percentage")]
    pass_percentage: f64,
    #[serde(default = "default_duration")]
    duration_minutes: u32,
    #[serde(default)]
    allow_multiple_attempts: bool,
    #[serde(default = "default_true")]
    show_results_immediately: bool,
    #[serde(default)]
    show_correct_answers: bool,
}

fn default_pass_percentage() -> f64 {
    40.0
}

fn default_duration() -> u32 {
    30
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Deserialize)]
struct TomlQuestion {
    id: String,
    text: String,
    #[serde(default, rename = "type")]
    kind: Option<String>,
    #[serde(default)]
    options: Vec<String>,
    #[serde(default)]
    correct_option: Option<TomlOption>,
    #[serde(default)]
    correct_answer: Option<String>,
    #[serde(default = "default_marks")]
    marks: u32,
    #[serde(default)]
    difficulty: Option<String>,
    #[serde(default)]
    order: Option<u32>,
}

fn default_marks() -> u32 {
    1
}

/// A correct option written either as an index (`1`) or a letter (`"B"`).
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum TomlOption {
    Index(usize),
    Letter(String),
}

/// Parse a single TOML file into an `Assessment`.
pub fn parse_assessment(path: &Path) -> Result<Assessment> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read assessment file: {}", path.display()))?;

    parse_assessment_str(&content, path)
}

/// Parse a TOML string into an `Assessment` (useful for testing).
///
/// The result is checked with [`Assessment::validate`]; definitions that
/// break a model invariant are rejected.
pub fn parse_assessment_str(content: &str, source_path: &Path) -> Result<Assessment> {
    let parsed: TomlAssessmentFile = toml::from_str(content)
        .with_context(|| format!("failed to parse TOML: {}", source_path.display()))?;

    let questions = parsed
        .questions
        .into_iter()
        .enumerate()
        .map(|(i, q)| {
            let order = q.order.unwrap_or(i as u32 + 1);
            let question = convert_question(q)?;
            Ok(AssessmentQuestion { order, question })
        })
        .collect::<Result<Vec<_>>>()
        .with_context(|| format!("invalid question in {}", source_path.display()))?;

    let header = parsed.assessment;
    let category = header
        .category
        .filter(|c| !c.trim().is_empty())
        .unwrap_or_else(|| UNCATEGORIZED.to_string());

    let assessment = Assessment {
        id: header.id,
        title: header.title,
        category,
        description: header.description,
        questions,
        total_marks: header.total_marks,
        pass_percentage: header.pass_percentage,
        duration_minutes: header.duration_minutes,
        policy: AttemptPolicy {
            allow_multiple_attempts: header.allow_multiple_attempts,
            show_results_immediately: header.show_results_immediately,
            show_correct_answers: header.show_correct_answers,
        },
    };

    assessment
        .validate()
        .with_context(|| format!("invalid assessment {} in {}", assessment.id, source_path.display()))?;

    Ok(assessment)
}

fn convert_question(q: TomlQuestion) -> Result<Question> {
    let difficulty: Difficulty = q
        .difficulty
        .map(|d| d.parse().map_err(|e: String| anyhow::anyhow!("{}: {}", q.id, e)))
        .transpose()?
        .unwrap_or_default();

    let kind_name = q.kind.as_deref().unwrap_or(if q.options.is_empty() {
        "free_text"
    } else {
        "mcq"
    });

    let kind = match kind_name {
        "mcq" => {
            let correct_option = match q.correct_option {
                Some(TomlOption::Index(i)) => i,
                Some(TomlOption::Letter(letter)) => parse_option(&letter).ok_or_else(|| {
                    anyhow::anyhow!("{}: correct_option {:?} is not an option letter", q.id, letter)
                })?,
                None => anyhow::bail!("{}: mcq question has no correct_option", q.id),
            };
            QuestionKind::Mcq {
                options: q.options,
                correct_option,
            }
        }
        "free_text" => QuestionKind::FreeText {
            correct_answer: q
                .correct_answer
                .ok_or_else(|| anyhow::anyhow!("{}: free_text question has no correct_answer", q.id))?,
        },
        other => anyhow::bail!("{}: unknown question type: {}", q.id, other),
    };

    Ok(Question {
        id: q.id,
        text: q.text,
        kind,
        marks: q.marks,
        difficulty,
    })
}

/// Recursively load all `.toml` assessment files from a directory.
///
/// Files that fail to parse are skipped with a warning. The result is sorted
/// by assessment id.
pub fn load_assessment_directory(dir: &Path) -> Result<Vec<Assessment>> {
    if !dir.is_dir() {
        anyhow::bail!("not a directory: {}", dir.display());
    }

    let mut assessments = Vec::new();
    collect_assessments(dir, &mut assessments)?;
    assessments.sort_by(|a, b| a.id.cmp(&b.id));
    Ok(assessments)
}

fn collect_assessments(dir: &Path, out: &mut Vec<Assessment>) -> Result<()> {
    for entry in std::fs::read_dir(dir)
        .with_context(|| format!("failed to read directory: {}", dir.display()))?
    {
        let entry = entry?;
        let path = entry.path();

        if path.is_dir() {
            collect_assessments(&path, out)?;
        } else if path.extension().is_some_and(|ext| ext == "toml") {
            match parse_assessment(&path) {
                Ok(assessment) => out.push(assessment),
                Err(e) => {
                    tracing::warn!("skipping {}: {:#}", path.display(), e);
                }
            }
        }
    }
    Ok(())
}

/// A warning from assessment validation.
#[derive(Debug, Clone)]
pub struct ValidationWarning {
    /// The question ID (if applicable).
    pub question_id: Option<String>,
    /// Warning message.
    pub message: String,
}

/// Check a parsed assessment for issues that do not break scoring.
pub fn validate_assessment(assessment: &Assessment) -> Vec<ValidationWarning> {
    let mut warnings = Vec::new();

    if assessment.questions.is_empty() {
        warnings.push(ValidationWarning {
            question_id: None,
            message: "assessment has no questions".into(),
        });
    }

    let question_total = assessment.question_marks_total();
    if let Some(configured) = assessment.total_marks {
        if configured != question_total {
            warnings.push(ValidationWarning {
                question_id: None,
                message: format!(
                    "configured total_marks {configured} differs from question marks sum {question_total}"
                ),
            });
        }
    }

    let mut orders = HashSet::new();
    for entry in &assessment.questions {
        if !orders.insert(entry.order) {
            warnings.push(ValidationWarning {
                question_id: Some(entry.question.id.clone()),
                message: format!("order {} is shared with another question", entry.order),
            });
        }
    }

    for q in assessment.questions.iter().map(|e| &e.question) {
        if q.text.trim().is_empty() {
            warnings.push(ValidationWarning {
                question_id: Some(q.id.clone()),
                message: "question text is empty".into(),
            });
        }
        match &q.kind {
            QuestionKind::Mcq { options, .. } => {
                let mut seen = HashSet::new();
                if options
                    .iter()
                    .any(|o| !seen.insert(o.trim().to_lowercase()))
                {
                    warnings.push(ValidationWarning {
                        question_id: Some(q.id.clone()),
                        message: "options contain duplicates".into(),
                    });
                }
            }
            QuestionKind::FreeText { correct_answer } => {
                if correct_answer.trim().is_empty() {
                    warnings.push(ValidationWarning {
                        question_id: Some(q.id.clone()),
                        message: "correct_answer is empty; no answer can match".into(),
                    });
                }
            }
        }
    }

    warnings
}

/// Load recorded submissions from a JSON array.
pub fn parse_submissions(path: &Path) -> Result<Vec<SubmissionRecord>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read submissions file: {}", path.display()))?;
    serde_json::from_str(&content)
        .with_context(|| format!("failed to parse submissions JSON: {}", path.display()))
}
