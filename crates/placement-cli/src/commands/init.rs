//! The `placement init` command.

use anyhow::Result;

pub fn execute() -> Result<()> {
    if std::path::Path::new("placement.toml").exists() {
        println!("placement.toml already exists, skipping.");
    } else {
        std::fs::write("placement.toml", SAMPLE_CONFIG)?;
        println!("Created placement.toml");
    }

    std::fs::create_dir_all("assessments")?;
    let example_path = std::path::Path::new("assessments/example.toml");
    if example_path.exists() {
        println!("assessments/example.toml already exists, skipping.");
    } else {
        std::fs::write(example_path, EXAMPLE_ASSESSMENT)?;
        println!("Created assessments/example.toml");
    }

    let submissions_path = std::path::Path::new("assessments/example-submissions.json");
    if submissions_path.exists() {
        println!("assessments/example-submissions.json already exists, skipping.");
    } else {
        std::fs::write(submissions_path, EXAMPLE_SUBMISSIONS)?;
        println!("Created assessments/example-submissions.json");
    }

    println!("\nNext steps:");
    println!("  1. Edit placement.toml with your RAG and mail endpoints");
    println!("  2. Run: placement validate --assessments assessments/example.toml");
    println!(
        "  3. Run: placement score --assessment assessments/example.toml --submissions assessments/example-submissions.json --format all"
    );

    Ok(())
}

const SAMPLE_CONFIG: &str = r#"# placement configuration

output_dir = "./placement-reports"

[scoring]
free_text_case_sensitive = false
# sum_of_questions | prefer_configured
total_marks_policy = "sum_of_questions"

[rag]
base_url = "http://localhost:8001"
timeout_secs = 5
enabled = true

[mail]
# webhook_url = "https://mail.example.com/send"
api_key = "${PLACEMENT_MAIL_API_KEY}"
from = "noreply@collegeportal.com"
college_name = "College Placement Portal"
enabled = false
"#;

const EXAMPLE_ASSESSMENT: &str = r#"[assessment]
id = "example"
title = "Example Assessment"
category = "Aptitude"
description = "A short example assessment to get started"
pass_percentage = 50
duration_minutes = 10
show_correct_answers = true

[[questions]]
id = "q1"
text = "What is 12 x 12?"
options = ["124", "144", "154", "164"]
correct_option = "B"
marks = 2
difficulty = "easy"

[[questions]]
id = "q2"
text = "Which word is the odd one out: apple, mango, carrot, banana?"
options = ["apple", "mango", "carrot", "banana"]
correct_option = "C"
difficulty = "medium"

[[questions]]
id = "q3"
type = "free_text"
text = "What is the square root of 81?"
correct_answer = "9"
difficulty = "easy"
"#;

const EXAMPLE_SUBMISSIONS: &str = r#"[
  {
    "student": { "id": "s1", "name": "First Student", "email": "first@example.edu" },
    "started_at": "2026-01-10T10:00:00Z",
    "submitted_at": "2026-01-10T10:06:30Z",
    "answers": { "q1": "B", "q2": "C", "q3": "9" },
    "time_spent": { "q1": 60, "q2": 150, "q3": 180 }
  },
  {
    "student": { "id": "s2", "name": "Second Student", "email": "second@example.edu" },
    "started_at": "2026-01-10T10:00:00Z",
    "submitted_at": "2026-01-10T10:09:00Z",
    "answers": { "q1": "A", "q3": "9" },
    "time_spent": { "q1": 200, "q3": 120 }
  }
]
"#;
