//! The `placement stats` command.

use std::path::PathBuf;

use anyhow::Result;
use comfy_table::{Cell, Table};

use placement_core::report::{AssessmentReport, AttemptFilter};
use placement_core::scoring::{Grade, GradeBand};
use placement_core::timing::{format_clock, format_time};

pub fn execute(report_path: PathBuf, filter: AttemptFilter) -> Result<()> {
    let report = AssessmentReport::load_json(&report_path)?;

    print_summary(&report);
    print_questions(&report);
    print_students(&report);
    print_attempts(&report, &filter);

    Ok(())
}

/// Print the headline numbers and score distribution.
pub fn print_summary(report: &AssessmentReport) {
    let a = &report.assessment;
    let s = &report.summary;

    println!(
        "\n{} [{}]: {} questions, {} marks, pass at {}%",
        a.title, a.category, a.question_count, a.total_marks, a.pass_percentage
    );

    let mut table = Table::new();
    table.set_header(vec![
        "Attempts",
        "Passed",
        "Failed",
        "Pass Rate",
        "Average",
        "Highest",
        "Lowest",
        "Avg Time",
        "Difficulty",
    ]);
    table.add_row(vec![
        Cell::new(s.total_attempts),
        Cell::new(s.passed),
        Cell::new(s.failed),
        Cell::new(format!("{:.1}%", s.pass_rate)),
        Cell::new(format!("{:.2}%", s.average_percentage)),
        Cell::new(format!("{:.2}%", s.highest_percentage)),
        Cell::new(format!("{:.2}%", s.lowest_percentage)),
        Cell::new(format_time(s.average_time_secs.round() as u64)),
        Cell::new(report.difficulty),
    ]);
    println!("{table}");

    let mut dist = Table::new();
    dist.set_header(vec!["Range", "Students"]);
    for bucket in &report.distribution {
        dist.add_row(vec![Cell::new(bucket.bucket.label()), Cell::new(bucket.count)]);
    }
    println!("{dist}");
}

fn print_questions(report: &AssessmentReport) {
    let mut table = Table::new();
    table.set_header(vec!["Question", "Difficulty", "Answered", "Correct", "Accuracy"]);
    for q in &report.questions {
        table.add_row(vec![
            Cell::new(&q.question_id),
            Cell::new(q.difficulty),
            Cell::new(q.answered),
            Cell::new(q.correct),
            Cell::new(format!("{:.1}%", q.accuracy)),
        ]);
    }
    println!("{table}");
}

fn print_students(report: &AssessmentReport) {
    let mut table = Table::new();
    table.set_header(vec!["Student", "Attempts", "Average", "Best", "Passed", "Time"]);
    for p in &report.students {
        table.add_row(vec![
            Cell::new(&p.name),
            Cell::new(p.attempts),
            Cell::new(format!("{:.2}%", p.average_percentage)),
            Cell::new(format!("{:.2}%", p.best_percentage)),
            Cell::new(p.passed),
            Cell::new(format_time(p.total_time_secs)),
        ]);
    }
    println!("{table}");
}

fn print_attempts(report: &AssessmentReport, filter: &AttemptFilter) {
    let attempts = report.filtered_attempts(filter);

    let mut table = Table::new();
    table.set_header(vec![
        "Student", "Email", "Score", "Percentage", "Grade", "Band", "Status", "Time",
    ]);
    for a in &attempts {
        table.add_row(vec![
            Cell::new(&a.student.name),
            Cell::new(&a.student.email),
            Cell::new(a.score_fraction()),
            Cell::new(format!("{:.2}%", a.percentage)),
            Cell::new(Grade::from_percentage(a.percentage)),
            Cell::new(GradeBand::from_percentage(a.percentage)),
            Cell::new(a.pass_status.map(|s| s.label()).unwrap_or("-")),
            Cell::new(format_clock(a.time_taken_secs)),
        ]);
    }
    println!("{table}");
    println!("{} of {} attempts shown", attempts.len(), report.attempts.len());
}
