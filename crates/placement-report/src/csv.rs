//! CSV exports of assessment results.
//!
//! Both exports start with a UTF-8 byte order mark so spreadsheet tools
//! detect the encoding. Fields are quoted only when they contain a comma,
//! a double quote, or a line break.

use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};

use placement_core::model::{Assessment, Attempt};
use placement_core::report::sort_by_percentage;
use placement_core::statistics::summarize;
use placement_core::timing::format_clock;

const BOM: &[u8] = b"\xEF\xBB\xBF";
const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Quote a field if it contains a comma, double quote, CR, or LF.
pub fn escape_field(field: &str) -> String {
    if field.contains(&[',', '"', '\r', '\n'][..]) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

/// Remove markup tags, keeping only the text between them.
///
/// A tag starts at `<` followed by a letter, `/` or `!`; any other `<` is
/// literal text. An unclosed tag is kept as text.
pub fn strip_markup(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    // Byte offset of the `<` opening the current tag.
    let mut tag_start: Option<usize> = None;
    let mut chars = text.char_indices().peekable();

    while let Some((i, c)) = chars.next() {
        if tag_start.is_some() {
            if c == '>' {
                tag_start = None;
            }
        } else if c == '<'
            && chars
                .peek()
                .is_some_and(|&(_, n)| n.is_ascii_alphabetic() || n == '/' || n == '!')
        {
            tag_start = Some(i);
        } else {
            out.push(c);
        }
    }
    if let Some(start) = tag_start {
        out.push_str(&text[start..]);
    }
    out
}

/// Accumulates CSV rows behind a byte order mark.
struct CsvWriter {
    buf: String,
}

impl CsvWriter {
    fn new() -> Self {
        Self { buf: String::new() }
    }

    fn row<I, S>(&mut self, fields: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let line: Vec<String> = fields
            .into_iter()
            .map(|f| escape_field(f.as_ref()))
            .collect();
        self.buf.push_str(&line.join(","));
        self.buf.push('\n');
    }

    fn blank(&mut self) {
        self.buf.push('\n');
    }

    fn finish(self) -> Vec<u8> {
        let mut bytes = BOM.to_vec();
        bytes.extend_from_slice(self.buf.as_bytes());
        bytes
    }
}

fn completed_by_percentage(attempts: &[Attempt]) -> Vec<Attempt> {
    let mut completed: Vec<Attempt> = attempts.iter().filter(|a| a.is_completed()).cloned().collect();
    sort_by_percentage(&mut completed);
    completed
}

/// Summary export: assessment metadata followed by one row per completed
/// attempt, highest percentage first.
pub fn summary_csv(
    assessment: &Assessment,
    total_marks: u32,
    attempts: &[Attempt],
    generated_at: DateTime<Utc>,
) -> Vec<u8> {
    let completed = completed_by_percentage(attempts);
    let stats = summarize(&completed);
    let average = if stats.average_percentage == 0.0 {
        "0%".to_string()
    } else {
        format!("{:.2}%", stats.average_percentage)
    };

    let mut w = CsvWriter::new();
    w.row(["Assessment Report"]);
    w.row(["Assessment Title", assessment.title.as_str()]);
    w.row(["Category", assessment.category.as_str()]);
    w.row(["Total Marks".to_string(), total_marks.to_string()]);
    w.row(["Pass Percentage".to_string(), format!("{}%", assessment.pass_percentage)]);
    w.row(["Total Attempts".to_string(), stats.total_attempts.to_string()]);
    w.row(["Passed".to_string(), stats.passed.to_string()]);
    w.row(["Failed".to_string(), stats.failed.to_string()]);
    w.row(["Average Score".to_string(), average]);
    w.row([
        "Generated On".to_string(),
        generated_at.format(TIMESTAMP_FORMAT).to_string(),
    ]);
    w.blank();

    w.row([
        "Student Name",
        "Email",
        "Score",
        "Percentage",
        "Status",
        "Time Taken",
        "Submitted At",
    ]);
    for attempt in &completed {
        w.row([
            attempt.student.name.clone(),
            attempt.student.email.clone(),
            attempt.score_fraction(),
            format!("{:.2}%", attempt.percentage),
            status_label(attempt).to_string(),
            format_clock(attempt.time_taken_secs),
            submitted_label(attempt),
        ]);
    }

    w.finish()
}

/// Detailed export: a block per completed attempt with one row per answer.
pub fn detailed_csv(assessment: &Assessment, attempts: &[Attempt]) -> Vec<u8> {
    let completed = completed_by_percentage(attempts);

    let mut w = CsvWriter::new();
    w.row(["Detailed Assessment Report with Question-wise Analysis"]);
    w.row(["Assessment", assessment.title.as_str()]);
    w.blank();

    for attempt in &completed {
        w.row(["Student", attempt.student.name.as_str()]);
        w.row(["Score".to_string(), attempt.score_fraction()]);
        w.row(["Percentage".to_string(), format!("{:.2}%", attempt.percentage)]);
        w.row(["Status", status_label(attempt)]);
        w.blank();

        w.row([
            "Q#",
            "Question",
            "Student Answer",
            "Correct Answer",
            "Result",
            "Marks",
            "Time Spent",
        ]);
        for (index, record) in attempt.answers.iter().enumerate() {
            let question = assessment.question(&record.question_id);
            w.row([
                (index + 1).to_string(),
                question
                    .map(|q| strip_markup(&q.text))
                    .unwrap_or_else(|| "N/A".to_string()),
                record
                    .submitted
                    .clone()
                    .filter(|s| !s.trim().is_empty())
                    .unwrap_or_else(|| "No answer".to_string()),
                question
                    .map(|q| q.correct_answer_label())
                    .unwrap_or_else(|| "N/A".to_string()),
                if record.is_correct { "Correct" } else { "Incorrect" }.to_string(),
                format!(
                    "{}/{}",
                    record.marks_obtained,
                    question.map(|q| q.marks).unwrap_or(0)
                ),
                record
                    .time_spent_secs
                    .filter(|t| *t > 0)
                    .map(|t| format!("{t}s"))
                    .unwrap_or_else(|| "N/A".to_string()),
            ]);
        }
        w.blank();
        w.blank();
    }

    w.finish()
}

fn status_label(attempt: &Attempt) -> &'static str {
    attempt.pass_status.map(|s| s.label()).unwrap_or("N/A")
}

fn submitted_label(attempt: &Attempt) -> String {
    attempt
        .submitted_at
        .map(|t| t.format(TIMESTAMP_FORMAT).to_string())
        .unwrap_or_else(|| "N/A".to_string())
}

/// Write export bytes to a file, creating parent directories.
pub fn write_csv(bytes: &[u8], path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, bytes)
        .with_context(|| format!("failed to write CSV to {}", path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use placement_core::model::*;

    fn assessment() -> Assessment {
        let mcq = |id: &str, text: &str, correct: usize, marks: u32| AssessmentQuestion {
            order: 0,
            question: Question {
                id: id.into(),
                text: text.into(),
                kind: QuestionKind::Mcq {
                    options: vec!["a".into(), "b".into(), "c".into(), "d".into()],
                    correct_option: correct,
                },
                marks,
                difficulty: Difficulty::Medium,
            },
        };
        Assessment {
            id: "apt".into(),
            title: "Aptitude, Round 1".into(),
            category: "Aptitude".into(),
            description: String::new(),
            questions: vec![
                mcq("q1", "<p>What is <b>15%</b> of 200?</p>", 1, 2),
                mcq("q2", "Pick \"C\", please", 2, 3),
            ],
            total_marks: None,
            pass_percentage: 40.0,
            duration_minutes: 30,
            policy: AttemptPolicy::default(),
        }
    }

    fn attempt(name: &str, email: &str, obtained: u32, pct: f64, pass: bool) -> Attempt {
        let started = Utc.with_ymd_and_hms(2024, 3, 1, 10, 0, 0).unwrap();
        let mut a = Attempt::start(
            "apt",
            Student {
                id: name.to_lowercase(),
                name: name.into(),
                email: email.into(),
            },
            started,
        );
        a.status = AttemptStatus::Completed;
        a.submitted_at = Some(Utc.with_ymd_and_hms(2024, 3, 1, 10, 12, 34).unwrap());
        a.obtained_marks = obtained;
        a.total_marks = 5;
        a.percentage = pct;
        a.pass_status = Some(if pass { PassStatus::Pass } else { PassStatus::Fail });
        a.time_taken_secs = 754;
        a.answers = vec![
            AnswerRecord {
                question_id: "q1".into(),
                submitted: Some("B".into()),
                is_correct: true,
                marks_obtained: 2,
                time_spent_secs: Some(40),
            },
            AnswerRecord {
                question_id: "q2".into(),
                submitted: None,
                is_correct: false,
                marks_obtained: 0,
                time_spent_secs: None,
            },
        ];
        a
    }

    fn text(bytes: &[u8]) -> &str {
        assert!(bytes.starts_with(BOM));
        std::str::from_utf8(&bytes[BOM.len()..]).unwrap()
    }

    #[test]
    fn escape_rules() {
        assert_eq!(escape_field("plain"), "plain");
        assert_eq!(escape_field("a,b"), "\"a,b\"");
        assert_eq!(escape_field("say \"hi\""), "\"say \"\"hi\"\"\"");
        assert_eq!(escape_field("two\nlines"), "\"two\nlines\"");
        assert_eq!(escape_field("cr\r"), "\"cr\r\"");
        assert_eq!(escape_field(""), "");
    }

    #[test]
    fn strip_markup_removes_tags() {
        assert_eq!(strip_markup("<p>What is <b>15%</b> of 200?</p>"), "What is 15% of 200?");
        assert_eq!(strip_markup("no tags"), "no tags");
        assert_eq!(strip_markup("2 > 1"), "2 > 1");
        assert_eq!(
            strip_markup("If x < 5 and y > 2, which holds?"),
            "If x < 5 and y > 2, which holds?"
        );
        assert_eq!(strip_markup("Is 3 < 7?"), "Is 3 < 7?");
        assert_eq!(strip_markup("<p>Is 3 <7?</p>"), "Is 3 <7?");
        assert_eq!(strip_markup("a<!-- note -->b</br>"), "ab");
        assert_eq!(strip_markup("x <y"), "x <y");
    }

    #[test]
    fn summary_layout() {
        let generated = Utc.with_ymd_and_hms(2024, 3, 2, 9, 30, 0).unwrap();
        let mut pending = attempt("Zed", "zed@example.edu", 0, 0.0, false);
        pending.status = AttemptStatus::InProgress;
        let attempts = vec![
            attempt("Ravi", "ravi@example.edu", 2, 40.0, true),
            attempt("Asha", "asha@example.edu", 5, 100.0, true),
            attempt("Meena, K", "meena@example.edu", 0, 0.0, false),
            pending,
        ];

        let bytes = summary_csv(&assessment(), 5, &attempts, generated);
        let lines: Vec<&str> = text(&bytes).lines().collect();

        assert_eq!(lines[0], "Assessment Report");
        assert_eq!(lines[1], "Assessment Title,\"Aptitude, Round 1\"");
        assert_eq!(lines[2], "Category,Aptitude");
        assert_eq!(lines[3], "Total Marks,5");
        assert_eq!(lines[4], "Pass Percentage,40%");
        assert_eq!(lines[5], "Total Attempts,3");
        assert_eq!(lines[6], "Passed,2");
        assert_eq!(lines[7], "Failed,1");
        assert_eq!(lines[8], "Average Score,46.67%");
        assert_eq!(lines[9], "Generated On,2024-03-02 09:30:00");
        assert_eq!(lines[10], "");
        assert_eq!(
            lines[11],
            "Student Name,Email,Score,Percentage,Status,Time Taken,Submitted At"
        );
        assert_eq!(
            lines[12],
            "Asha,asha@example.edu,5/5,100.00%,Pass,00:12:34,2024-03-01 10:12:34"
        );
        assert!(lines[13].starts_with("Ravi,"));
        assert!(lines[14].starts_with("\"Meena, K\",meena@example.edu,0/5,0.00%,Fail"));
        assert_eq!(lines.len(), 15);
    }

    #[test]
    fn summary_without_attempts() {
        let bytes = summary_csv(&assessment(), 5, &[], Utc::now());
        let body = text(&bytes);
        assert!(body.contains("Total Attempts,0\n"));
        assert!(body.contains("Average Score,0%\n"));
        assert!(body.ends_with("Submitted At\n"));
    }

    #[test]
    fn missing_submission_time_is_na() {
        let mut a = attempt("Asha", "asha@example.edu", 5, 100.0, true);
        a.submitted_at = None;
        let bytes = summary_csv(&assessment(), 5, &[a], Utc::now());
        assert!(text(&bytes).contains(",00:12:34,N/A\n"));
    }

    #[test]
    fn detailed_layout() {
        let bytes = detailed_csv(&assessment(), &[attempt("Asha", "asha@example.edu", 2, 40.0, true)]);
        let lines: Vec<&str> = text(&bytes).lines().collect();

        assert_eq!(lines[0], "Detailed Assessment Report with Question-wise Analysis");
        assert_eq!(lines[1], "Assessment,\"Aptitude, Round 1\"");
        assert_eq!(lines[2], "");
        assert_eq!(lines[3], "Student,Asha");
        assert_eq!(lines[4], "Score,2/5");
        assert_eq!(lines[5], "Percentage,40.00%");
        assert_eq!(lines[6], "Status,Pass");
        assert_eq!(lines[7], "");
        assert_eq!(
            lines[8],
            "Q#,Question,Student Answer,Correct Answer,Result,Marks,Time Spent"
        );
        assert_eq!(lines[9], "1,What is 15% of 200?,B,B,Correct,2/2,40s");
        assert_eq!(
            lines[10],
            "2,\"Pick \"\"C\"\", please\",No answer,C,Incorrect,0/3,N/A"
        );
    }

    #[test]
    fn write_creates_parent_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("exports/summary.csv");
        write_csv(&summary_csv(&assessment(), 5, &[], Utc::now()), &path).unwrap();
        assert!(std::fs::read(&path).unwrap().starts_with(BOM));
    }
}
