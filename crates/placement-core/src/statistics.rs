//! Aggregate statistics over completed attempts.
//!
//! Only completed attempts are counted; in-progress attempts carry no score
//! and are skipped everywhere in this module.

use std::collections::{BTreeMap, HashMap};
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::model::{option_letter, Assessment, Attempt, Difficulty, Question, QuestionKind, UNCATEGORIZED};
use crate::scoring::parse_option;

/// Arithmetic mean, or `0.0` for an empty slice.
pub fn average(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Headline numbers for a set of attempts.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SummaryStats {
    pub total_attempts: usize,
    pub passed: usize,
    pub failed: usize,
    /// Mean percentage across completed attempts.
    pub average_percentage: f64,
    /// Share of passing attempts, as a percentage.
    pub pass_rate: f64,
    pub highest_percentage: f64,
    pub lowest_percentage: f64,
    /// Mean time taken, in seconds.
    pub average_time_secs: f64,
}

/// Summarize completed attempts. All fields are zero when there are none.
pub fn summarize<'a, I>(attempts: I) -> SummaryStats
where
    I: IntoIterator<Item = &'a Attempt>,
{
    let completed: Vec<&Attempt> = attempts.into_iter().filter(|a| a.is_completed()).collect();
    if completed.is_empty() {
        return SummaryStats::default();
    }

    let percentages: Vec<f64> = completed.iter().map(|a| a.percentage).collect();
    let times: Vec<f64> = completed.iter().map(|a| a.time_taken_secs as f64).collect();
    let passed = completed.iter().filter(|a| a.is_pass()).count();
    let total = completed.len();

    SummaryStats {
        total_attempts: total,
        passed,
        failed: total - passed,
        average_percentage: average(&percentages),
        pass_rate: passed as f64 / total as f64 * 100.0,
        highest_percentage: percentages.iter().copied().fold(f64::MIN, f64::max),
        lowest_percentage: percentages.iter().copied().fold(f64::MAX, f64::min),
        average_time_secs: average(&times),
    }
}

/// Score band used by the distribution chart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ScoreBucket {
    /// 90 to 100 inclusive. Anything above 100 lands here too.
    Top,
    Eighties,
    Seventies,
    Sixties,
    Fifties,
    /// Below 50, including negative percentages.
    Below50,
}

impl ScoreBucket {
    /// All buckets, highest first.
    pub const ALL: [ScoreBucket; 6] = [
        ScoreBucket::Top,
        ScoreBucket::Eighties,
        ScoreBucket::Seventies,
        ScoreBucket::Sixties,
        ScoreBucket::Fifties,
        ScoreBucket::Below50,
    ];

    pub fn from_percentage(percentage: f64) -> Self {
        if percentage >= 90.0 {
            ScoreBucket::Top
        } else if percentage >= 80.0 {
            ScoreBucket::Eighties
        } else if percentage >= 70.0 {
            ScoreBucket::Seventies
        } else if percentage >= 60.0 {
            ScoreBucket::Sixties
        } else if percentage >= 50.0 {
            ScoreBucket::Fifties
        } else {
            ScoreBucket::Below50
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ScoreBucket::Top => "90-100",
            ScoreBucket::Eighties => "80-89",
            ScoreBucket::Seventies => "70-79",
            ScoreBucket::Sixties => "60-69",
            ScoreBucket::Fifties => "50-59",
            ScoreBucket::Below50 => "<50",
        }
    }
}

impl fmt::Display for ScoreBucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BucketCount {
    pub bucket: ScoreBucket,
    pub count: usize,
}

/// Count completed attempts per score band. Every band is present, highest first.
pub fn distribution<'a, I>(attempts: I) -> Vec<BucketCount>
where
    I: IntoIterator<Item = &'a Attempt>,
{
    let mut counts: HashMap<ScoreBucket, usize> = HashMap::new();
    for attempt in attempts.into_iter().filter(|a| a.is_completed()) {
        *counts.entry(ScoreBucket::from_percentage(attempt.percentage)).or_default() += 1;
    }
    ScoreBucket::ALL
        .iter()
        .map(|bucket| BucketCount {
            bucket: *bucket,
            count: counts.get(bucket).copied().unwrap_or(0),
        })
        .collect()
}

/// Summary statistics grouped by assessment category.
///
/// Attempts whose assessment is not in `assessments` are grouped under
/// [`UNCATEGORIZED`].
pub fn category_breakdown(
    assessments: &[Assessment],
    attempts: &[Attempt],
) -> BTreeMap<String, SummaryStats> {
    let categories: HashMap<&str, &str> = assessments
        .iter()
        .map(|a| (a.id.as_str(), a.category.as_str()))
        .collect();

    let mut grouped: BTreeMap<String, Vec<&Attempt>> = BTreeMap::new();
    for attempt in attempts.iter().filter(|a| a.is_completed()) {
        let category = categories
            .get(attempt.assessment_id.as_str())
            .copied()
            .filter(|c| !c.trim().is_empty())
            .unwrap_or(UNCATEGORIZED);
        grouped.entry(category.to_string()).or_default().push(attempt);
    }

    grouped
        .into_iter()
        .map(|(category, group)| (category, summarize(group)))
        .collect()
}

/// How often one MCQ option was picked.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptionPick {
    pub letter: char,
    pub text: String,
    pub count: usize,
    /// Share of answering attempts that picked this option.
    pub percentage: f64,
    pub is_correct: bool,
}

/// Per-question results across attempts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestionStats {
    pub question_id: String,
    pub text: String,
    pub difficulty: Difficulty,
    /// Completed attempts that answered this question.
    pub answered: usize,
    pub correct: usize,
    /// `correct / answered` as a percentage, `0.0` when unanswered.
    pub accuracy: f64,
    /// Pick counts per option; empty for free-text questions.
    pub options: Vec<OptionPick>,
}

/// Analyse each question of `assessment` over its completed attempts.
pub fn question_analysis(assessment: &Assessment, attempts: &[Attempt]) -> Vec<QuestionStats> {
    let relevant: Vec<&Attempt> = attempts
        .iter()
        .filter(|a| a.is_completed() && a.assessment_id == assessment.id)
        .collect();

    assessment
        .ordered_questions()
        .into_iter()
        .map(|question| analyse_question(question, &relevant))
        .collect()
}

fn analyse_question(question: &Question, attempts: &[&Attempt]) -> QuestionStats {
    let records: Vec<_> = attempts
        .iter()
        .filter_map(|a| a.answer(&question.id))
        .filter(|r| r.submitted.as_deref().is_some_and(|s| !s.trim().is_empty()))
        .collect();

    let answered = records.len();
    let correct = records.iter().filter(|r| r.is_correct).count();
    let accuracy = if answered == 0 {
        0.0
    } else {
        correct as f64 / answered as f64 * 100.0
    };

    let options = match &question.kind {
        QuestionKind::Mcq {
            options,
            correct_option,
        } => {
            let mut counts = vec![0usize; options.len()];
            for record in &records {
                if let Some(index) = record.submitted.as_deref().and_then(parse_option) {
                    if let Some(slot) = counts.get_mut(index) {
                        *slot += 1;
                    }
                }
            }
            options
                .iter()
                .zip(counts)
                .enumerate()
                .filter_map(|(i, (text, count))| {
                    option_letter(i).map(|letter| OptionPick {
                        letter,
                        text: text.clone(),
                        count,
                        percentage: if answered == 0 {
                            0.0
                        } else {
                            count as f64 / answered as f64 * 100.0
                        },
                        is_correct: i == *correct_option,
                    })
                })
                .collect()
        }
        QuestionKind::FreeText { .. } => Vec::new(),
    };

    QuestionStats {
        question_id: question.id.clone(),
        text: question.text.clone(),
        difficulty: question.difficulty,
        answered,
        correct,
        accuracy,
        options,
    }
}

/// Observed difficulty of an assessment, judged by its average score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DifficultyLevel {
    Easy,
    Medium,
    Hard,
}

impl fmt::Display for DifficultyLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DifficultyLevel::Easy => write!(f, "Easy"),
            DifficultyLevel::Medium => write!(f, "Medium"),
            DifficultyLevel::Hard => write!(f, "Hard"),
        }
    }
}

/// `>= 70` is Easy, `>= 50` Medium, anything lower Hard.
pub fn difficulty_level(average_percentage: f64) -> DifficultyLevel {
    if average_percentage >= 70.0 {
        DifficultyLevel::Easy
    } else if average_percentage >= 50.0 {
        DifficultyLevel::Medium
    } else {
        DifficultyLevel::Hard
    }
}

/// Share of questions at each difficulty, as percentages.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct DifficultyMix {
    pub easy: f64,
    pub medium: f64,
    pub hard: f64,
}

pub fn difficulty_mix<'a, I>(questions: I) -> DifficultyMix
where
    I: IntoIterator<Item = &'a Question>,
{
    let (mut easy, mut medium, mut hard) = (0usize, 0usize, 0usize);
    for q in questions {
        match q.difficulty {
            Difficulty::Easy => easy += 1,
            Difficulty::Medium => medium += 1,
            Difficulty::Hard => hard += 1,
        }
    }
    let total = easy + medium + hard;
    if total == 0 {
        return DifficultyMix::default();
    }
    let share = |n: usize| n as f64 / total as f64 * 100.0;
    DifficultyMix {
        easy: share(easy),
        medium: share(medium),
        hard: share(hard),
    }
}

/// One student's results across attempts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StudentPerformance {
    pub student_id: String,
    pub name: String,
    pub attempts: usize,
    pub average_percentage: f64,
    pub best_percentage: f64,
    pub passed: usize,
    pub total_time_secs: u64,
}

/// Per-student results, ordered by average percentage (highest first).
pub fn student_performance(attempts: &[Attempt]) -> Vec<StudentPerformance> {
    let mut grouped: BTreeMap<&str, Vec<&Attempt>> = BTreeMap::new();
    for attempt in attempts.iter().filter(|a| a.is_completed()) {
        grouped.entry(attempt.student.id.as_str()).or_default().push(attempt);
    }

    let mut rows: Vec<StudentPerformance> = grouped
        .into_iter()
        .map(|(student_id, group)| {
            let percentages: Vec<f64> = group.iter().map(|a| a.percentage).collect();
            StudentPerformance {
                student_id: student_id.to_string(),
                name: group[0].student.name.clone(),
                attempts: group.len(),
                average_percentage: average(&percentages),
                best_percentage: percentages.iter().copied().fold(f64::MIN, f64::max),
                passed: group.iter().filter(|a| a.is_pass()).count(),
                total_time_secs: group.iter().map(|a| a.time_taken_secs).sum(),
            }
        })
        .collect();

    rows.sort_by(|a, b| {
        b.average_percentage
            .total_cmp(&a.average_percentage)
            .then_with(|| a.student_id.cmp(&b.student_id))
    });
    rows
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{AnswerRecord, AssessmentQuestion, AttemptPolicy, AttemptStatus, PassStatus, Student};
    use chrono::Utc;

    fn attempt(assessment: &str, student: &str, pct: f64, pass: bool) -> Attempt {
        let mut a = Attempt::start(
            assessment,
            Student {
                id: student.into(),
                name: format!("Student {student}"),
                email: String::new(),
            },
            Utc::now(),
        );
        a.status = AttemptStatus::Completed;
        a.percentage = pct;
        a.pass_status = Some(if pass { PassStatus::Pass } else { PassStatus::Fail });
        a.time_taken_secs = 600;
        a
    }

    fn question(id: &str, difficulty: Difficulty) -> Question {
        Question {
            id: id.into(),
            text: format!("Question {id}"),
            kind: QuestionKind::Mcq {
                options: vec!["a".into(), "b".into(), "c".into()],
                correct_option: 1,
            },
            marks: 1,
            difficulty,
        }
    }

    fn assessment(id: &str, category: &str, questions: Vec<Question>) -> Assessment {
        Assessment {
            id: id.into(),
            title: id.to_uppercase(),
            category: category.into(),
            description: String::new(),
            questions: questions
                .into_iter()
                .enumerate()
                .map(|(i, question)| AssessmentQuestion {
                    order: i as u32,
                    question,
                })
                .collect(),
            total_marks: None,
            pass_percentage: 50.0,
            duration_minutes: 20,
            policy: AttemptPolicy::default(),
        }
    }

    #[test]
    fn average_of_scores() {
        assert_eq!(average(&[80.0, 90.0, 70.0, 85.0, 95.0]), 84.0);
        assert_eq!(average(&[]), 0.0);
        assert_eq!(average(&[42.5]), 42.5);
    }

    #[test]
    fn summarize_counts_completed_only() {
        let mut pending = attempt("a1", "s4", 0.0, false);
        pending.status = AttemptStatus::InProgress;
        let attempts = vec![
            attempt("a1", "s1", 90.0, true),
            attempt("a1", "s2", 30.0, false),
            attempt("a1", "s3", 60.0, true),
            pending,
        ];
        let stats = summarize(&attempts);
        assert_eq!(stats.total_attempts, 3);
        assert_eq!(stats.passed, 2);
        assert_eq!(stats.failed, 1);
        assert_eq!(stats.average_percentage, 60.0);
        assert!((stats.pass_rate - 66.666_666).abs() < 0.001);
        assert_eq!(stats.highest_percentage, 90.0);
        assert_eq!(stats.lowest_percentage, 30.0);
        assert_eq!(stats.average_time_secs, 600.0);
    }

    #[test]
    fn summarize_empty_is_all_zero() {
        let stats = summarize(&[]);
        assert_eq!(stats, SummaryStats::default());
        assert_eq!(stats.pass_rate, 0.0);
    }

    #[test]
    fn buckets_are_closed_open() {
        assert_eq!(ScoreBucket::from_percentage(100.0), ScoreBucket::Top);
        assert_eq!(ScoreBucket::from_percentage(90.0), ScoreBucket::Top);
        assert_eq!(ScoreBucket::from_percentage(89.99), ScoreBucket::Eighties);
        assert_eq!(ScoreBucket::from_percentage(80.0), ScoreBucket::Eighties);
        assert_eq!(ScoreBucket::from_percentage(79.5), ScoreBucket::Seventies);
        assert_eq!(ScoreBucket::from_percentage(60.0), ScoreBucket::Sixties);
        assert_eq!(ScoreBucket::from_percentage(50.0), ScoreBucket::Fifties);
        assert_eq!(ScoreBucket::from_percentage(49.99), ScoreBucket::Below50);
        assert_eq!(ScoreBucket::from_percentage(-5.0), ScoreBucket::Below50);
        assert_eq!(ScoreBucket::from_percentage(120.0), ScoreBucket::Top);
    }

    #[test]
    fn distribution_reports_every_bucket() {
        let attempts = vec![
            attempt("a1", "s1", 95.0, true),
            attempt("a1", "s2", 91.0, true),
            attempt("a1", "s3", 55.0, true),
            attempt("a1", "s4", 10.0, false),
        ];
        let dist = distribution(&attempts);
        assert_eq!(dist.len(), 6);
        assert_eq!(dist[0].bucket.label(), "90-100");
        assert_eq!(dist[0].count, 2);
        assert_eq!(dist[1].count, 0);
        assert_eq!(dist[4].count, 1);
        assert_eq!(dist[5].count, 1);
        assert_eq!(dist.iter().map(|b| b.count).sum::<usize>(), 4);
    }

    #[test]
    fn category_breakdown_groups_unknown_as_uncategorized() {
        let assessments = vec![
            assessment("apt", "Aptitude", vec![]),
            assessment("tech", "Technical", vec![]),
        ];
        let attempts = vec![
            attempt("apt", "s1", 80.0, true),
            attempt("apt", "s2", 40.0, false),
            attempt("tech", "s1", 70.0, true),
            attempt("gone", "s3", 50.0, true),
        ];
        let breakdown = category_breakdown(&assessments, &attempts);
        assert_eq!(breakdown.len(), 3);
        assert_eq!(breakdown["Aptitude"].total_attempts, 2);
        assert_eq!(breakdown["Aptitude"].average_percentage, 60.0);
        assert_eq!(breakdown["Technical"].passed, 1);
        assert_eq!(breakdown[UNCATEGORIZED].total_attempts, 1);
    }

    #[test]
    fn question_analysis_counts_picks() {
        let a = assessment("apt", "Aptitude", vec![question("q1", Difficulty::Easy)]);
        let answers = [Some("B"), Some("b"), Some("A"), None];
        let attempts: Vec<Attempt> = answers
            .iter()
            .enumerate()
            .map(|(i, ans)| {
                let mut at = attempt("apt", &format!("s{i}"), 0.0, false);
                at.answers.push(AnswerRecord {
                    question_id: "q1".into(),
                    submitted: ans.map(String::from),
                    is_correct: ans.is_some_and(|s| s.eq_ignore_ascii_case("b")),
                    marks_obtained: 0,
                    time_spent_secs: None,
                });
                at
            })
            .collect();

        let stats = question_analysis(&a, &attempts);
        assert_eq!(stats.len(), 1);
        let q = &stats[0];
        assert_eq!(q.answered, 3);
        assert_eq!(q.correct, 2);
        assert!((q.accuracy - 66.666_666).abs() < 0.001);
        assert_eq!(q.options.len(), 3);
        assert_eq!(q.options[0].count, 1);
        assert_eq!(q.options[1].count, 2);
        assert!(q.options[1].is_correct);
        assert_eq!(q.options[2].percentage, 0.0);
    }

    #[test]
    fn question_analysis_without_attempts() {
        let a = assessment("apt", "Aptitude", vec![question("q1", Difficulty::Hard)]);
        let stats = question_analysis(&a, &[]);
        assert_eq!(stats[0].answered, 0);
        assert_eq!(stats[0].accuracy, 0.0);
    }

    #[test]
    fn difficulty_levels() {
        assert_eq!(difficulty_level(85.0), DifficultyLevel::Easy);
        assert_eq!(difficulty_level(70.0), DifficultyLevel::Easy);
        assert_eq!(difficulty_level(69.9), DifficultyLevel::Medium);
        assert_eq!(difficulty_level(50.0), DifficultyLevel::Medium);
        assert_eq!(difficulty_level(49.0), DifficultyLevel::Hard);
    }

    #[test]
    fn difficulty_mix_shares() {
        let qs = vec![
            question("q1", Difficulty::Easy),
            question("q2", Difficulty::Easy),
            question("q3", Difficulty::Medium),
            question("q4", Difficulty::Hard),
        ];
        let mix = difficulty_mix(&qs);
        assert_eq!(mix.easy, 50.0);
        assert_eq!(mix.medium, 25.0);
        assert_eq!(mix.hard, 25.0);
        assert_eq!(difficulty_mix(&Vec::<Question>::new()), DifficultyMix::default());
    }

    #[test]
    fn student_performance_orders_by_average() {
        let attempts = vec![
            attempt("a1", "s1", 50.0, true),
            attempt("a2", "s1", 70.0, true),
            attempt("a1", "s2", 90.0, true),
            attempt("a1", "s3", 20.0, false),
        ];
        let rows = student_performance(&attempts);
        let ids: Vec<&str> = rows.iter().map(|r| r.student_id.as_str()).collect();
        assert_eq!(ids, vec!["s2", "s1", "s3"]);
        assert_eq!(rows[1].attempts, 2);
        assert_eq!(rows[1].average_percentage, 60.0);
        assert_eq!(rows[1].best_percentage, 70.0);
        assert_eq!(rows[1].total_time_secs, 1200);
        assert_eq!(rows[2].passed, 0);
    }
}
