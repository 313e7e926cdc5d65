//! HTML report generator.
//!
//! Produces a self-contained HTML file with all CSS/JS inlined.

use anyhow::Result;
use std::path::Path;

use placement_core::markup::escape_html;
use placement_core::report::AssessmentReport;
use placement_core::scoring::Grade;
use placement_core::statistics::BucketCount;
use placement_core::timing::{format_clock, format_time};

/// Generate an HTML report from an assessment report.
pub fn generate_html(report: &AssessmentReport) -> String {
    let a = &report.assessment;
    let s = &report.summary;
    let mut html = String::new();

    html.push_str("<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n");
    html.push_str("<meta charset=\"utf-8\">\n");
    html.push_str("<meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">\n");
    html.push_str(&format!(
        "<title>Assessment report: {}</title>\n",
        escape_html(&a.title)
    ));
    html.push_str("<style>\n");
    html.push_str(CSS);
    html.push_str("</style>\n");
    html.push_str("</head>\n<body>\n");

    // Header
    html.push_str("<header>\n");
    html.push_str(&format!("<h1>{}</h1>\n", escape_html(&a.title)));
    html.push_str(&format!(
        "<p class=\"meta\">Category: <strong>{}</strong> | {} questions | {} marks | pass at {}% | {} | generated {}</p>\n",
        escape_html(&a.category),
        a.question_count,
        a.total_marks,
        a.pass_percentage,
        format_time(u64::from(a.duration_minutes) * 60),
        report.created_at.format("%Y-%m-%d %H:%M:%S UTC")
    ));
    html.push_str("</header>\n");

    // Summary dashboard
    html.push_str("<section class=\"dashboard\">\n");
    html.push_str("<h2>Summary</h2>\n");
    html.push_str("<table class=\"summary\">\n");
    html.push_str("<thead><tr><th>Attempts</th><th>Passed</th><th>Failed</th><th>Pass Rate</th><th>Average</th><th>Highest</th><th>Lowest</th><th>Avg Time</th><th>Difficulty</th></tr></thead>\n");
    html.push_str(&format!(
        "<tbody><tr><td>{}</td><td>{}</td><td>{}</td><td>{:.1}%</td><td>{:.2}%</td><td>{:.2}%</td><td>{:.2}%</td><td>{}</td><td>{}</td></tr></tbody>\n",
        s.total_attempts,
        s.passed,
        s.failed,
        s.pass_rate,
        s.average_percentage,
        s.highest_percentage,
        s.lowest_percentage,
        format_time(s.average_time_secs.round() as u64),
        report.difficulty,
    ));
    html.push_str("</table>\n");
    html.push_str(&format!(
        "<p class=\"meta\">Question mix: {:.0}% easy, {:.0}% medium, {:.0}% hard</p>\n",
        report.difficulty_mix.easy, report.difficulty_mix.medium, report.difficulty_mix.hard
    ));

    html.push_str("<h2>Score Distribution</h2>\n");
    html.push_str(&generate_bar_chart(&report.distribution));
    html.push_str("</section>\n");

    // Per-question analysis
    html.push_str("<section class=\"questions\">\n");
    html.push_str("<h2>Questions</h2>\n");
    html.push_str("<table class=\"questions-table\">\n");
    html.push_str("<thead><tr><th>#</th><th>Question</th><th>Difficulty</th><th>Answered</th><th>Correct</th><th>Accuracy</th><th>Option Picks</th></tr></thead>\n");
    html.push_str("<tbody>\n");
    for (i, q) in report.questions.iter().enumerate() {
        let picks: Vec<String> = q
            .options
            .iter()
            .map(|o| {
                let label = format!("{}: {} ({:.0}%)", o.letter, o.count, o.percentage);
                if o.is_correct {
                    format!("<strong>{label}</strong>")
                } else {
                    label
                }
            })
            .collect();
        html.push_str(&format!(
            "<tr><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{:.1}%</td><td>{}</td></tr>\n",
            i + 1,
            escape_html(&q.text),
            q.difficulty,
            q.answered,
            q.correct,
            q.accuracy,
            if picks.is_empty() { "-".to_string() } else { picks.join(", ") },
        ));
    }
    html.push_str("</tbody></table>\n");
    html.push_str("</section>\n");

    // Attempts
    html.push_str("<section class=\"results\">\n");
    html.push_str("<h2>Attempts</h2>\n");
    html.push_str("<table class=\"results-table\" id=\"results\">\n");
    html.push_str("<thead><tr><th onclick=\"sortTable(0)\">Student</th><th onclick=\"sortTable(1)\">Email</th><th onclick=\"sortTable(2)\">Score</th><th onclick=\"sortTable(3)\">Percentage</th><th onclick=\"sortTable(4)\">Grade</th><th onclick=\"sortTable(5)\">Status</th><th onclick=\"sortTable(6)\">Time Taken</th></tr></thead>\n");
    html.push_str("<tbody>\n");

    for attempt in &report.attempts {
        let passed = attempt.is_pass();
        let class = if passed { "pass" } else { "fail" };
        html.push_str(&format!(
            "<tr class=\"{}\"><td>{}</td><td>{}</td><td>{}</td><td>{:.2}%</td><td>{}</td><td>{}</td><td>{}</td></tr>\n",
            class,
            escape_html(&attempt.student.name),
            escape_html(&attempt.student.email),
            attempt.score_fraction(),
            attempt.percentage,
            Grade::from_percentage(attempt.percentage),
            if passed { "Pass" } else { "Fail" },
            format_clock(attempt.time_taken_secs),
        ));
    }

    html.push_str("</tbody></table>\n");
    html.push_str("</section>\n");

    // Raw JSON
    html.push_str("<section class=\"raw-data\">\n");
    html.push_str("<details>\n<summary>Raw JSON Data</summary>\n");
    html.push_str("<pre><code>");
    html.push_str(&escape_html(
        &serde_json::to_string_pretty(report).unwrap_or_default(),
    ));
    html.push_str("</code></pre>\n");
    html.push_str("</details>\n</section>\n");

    // JavaScript for sorting
    html.push_str("<script>\n");
    html.push_str(JS);
    html.push_str("</script>\n");

    html.push_str("</body>\n</html>");
    html
}

/// Write an HTML report to a file.
pub fn write_html_report(report: &AssessmentReport, path: &Path) -> Result<()> {
    let html = generate_html(report);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, html)?;
    Ok(())
}

fn generate_bar_chart(buckets: &[BucketCount]) -> String {
    let bar_height = 30;
    let max_width = 400;
    let padding = 10;
    let label_width = 80;

    let max_count = buckets.iter().map(|b| b.count).max().unwrap_or(0).max(1);
    let total_height = buckets.len() * (bar_height + padding) + padding;

    let mut svg = format!(
        "<svg width=\"{}\" height=\"{}\" xmlns=\"http://www.w3.org/2000/svg\">\n",
        label_width + max_width + 60,
        total_height
    );

    for (i, bucket) in buckets.iter().enumerate() {
        let y = i * (bar_height + padding) + padding;
        let width = bucket.count * max_width / max_count;

        let color = match i {
            0 | 1 => "#22c55e",
            2 | 3 => "#eab308",
            _ => "#ef4444",
        };

        svg.push_str(&format!(
            "  <text x=\"{}\" y=\"{}\" font-size=\"14\" fill=\"currentColor\" text-anchor=\"end\" dominant-baseline=\"middle\">{}</text>\n",
            label_width - 10,
            y + bar_height / 2,
            escape_html(bucket.bucket.label())
        ));
        svg.push_str(&format!(
            "  <rect x=\"{}\" y=\"{}\" width=\"{}\" height=\"{}\" fill=\"{}\" rx=\"4\"/>\n",
            label_width, y, width, bar_height, color
        ));
        svg.push_str(&format!(
            "  <text x=\"{}\" y=\"{}\" font-size=\"12\" fill=\"currentColor\" dominant-baseline=\"middle\">{}</text>\n",
            label_width + width + 8,
            y + bar_height / 2,
            bucket.count
        ));
    }

    svg.push_str("</svg>\n");
    svg
}

const CSS: &str = r#"
:root { --bg: #fff; --fg: #1a1a1a; --border: #e5e7eb; --pass: #dcfce7; --fail: #fde2e2; }
@media (prefers-color-scheme: dark) {
  :root { --bg: #111827; --fg: #f9fafb; --border: #374151; --pass: #064e3b; --fail: #7f1d1d; }
}
body { font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', sans-serif; margin: 0; padding: 2rem; background: var(--bg); color: var(--fg); }
h1, h2 { margin-top: 2rem; }
.meta { color: #6b7280; }
table { border-collapse: collapse; width: 100%; margin: 1rem 0; }
th, td { border: 1px solid var(--border); padding: 0.5rem 1rem; text-align: left; }
th { background: var(--border); }
#results th { cursor: pointer; }
.pass { background: var(--pass); }
.fail { background: var(--fail); }
pre { overflow-x: auto; padding: 1rem; background: var(--border); border-radius: 8px; }
code { font-family: 'JetBrains Mono', 'Fira Code', monospace; font-size: 0.85rem; }
details { margin: 1rem 0; }
summary { cursor: pointer; font-weight: bold; }
svg { margin: 1rem 0; }
"#;

const JS: &str = r#"
function sortTable(col) {
  const table = document.getElementById('results');
  const tbody = table.querySelector('tbody');
  const rows = Array.from(tbody.querySelectorAll('tr'));
  const asc = table.dataset.sortCol == col && table.dataset.sortDir == 'asc' ? false : true;
  rows.sort((a, b) => {
    const va = a.cells[col].textContent;
    const vb = b.cells[col].textContent;
    const na = parseFloat(va), nb = parseFloat(vb);
    if (!isNaN(na) && !isNaN(nb)) return asc ? na - nb : nb - na;
    return asc ? va.localeCompare(vb) : vb.localeCompare(va);
  });
  table.dataset.sortCol = col;
  table.dataset.sortDir = asc ? 'asc' : 'desc';
  rows.forEach(r => tbody.appendChild(r));
}
"#;
