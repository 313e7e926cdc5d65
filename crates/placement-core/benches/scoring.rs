use criterion::{black_box, criterion_group, criterion_main, Criterion};

use placement_core::model::*;
use placement_core::scoring::{percentage, Grade, ScoringEngine};
use placement_core::similarity::cosine_similarity;

fn make_assessment(questions: usize) -> Assessment {
    Assessment {
        id: "bench".into(),
        title: "Bench".into(),
        category: "Aptitude".into(),
        description: String::new(),
        questions: (0..questions)
            .map(|i| AssessmentQuestion {
                order: i as u32,
                question: Question {
                    id: format!("q{i}"),
                    text: format!("Question {i}"),
                    kind: if i % 5 == 0 {
                        QuestionKind::FreeText {
                            correct_answer: "Answer".into(),
                        }
                    } else {
                        QuestionKind::Mcq {
                            options: vec!["a".into(), "b".into(), "c".into(), "d".into()],
                            correct_option: i % 4,
                        }
                    },
                    marks: 1 + (i % 3) as u32,
                    difficulty: Difficulty::Medium,
                },
            })
            .collect(),
        total_marks: None,
        pass_percentage: 40.0,
        duration_minutes: 60,
        policy: AttemptPolicy::default(),
    }
}

fn make_submission(questions: usize) -> Submission {
    Submission {
        answers: (0..questions)
            .map(|i| {
                let answer = if i % 5 == 0 { " answer " } else { "B" };
                (format!("q{i}"), answer.to_string())
            })
            .collect(),
        time_spent: Default::default(),
    }
}

fn bench_score_submission(c: &mut Criterion) {
    let mut group = c.benchmark_group("score_submission");
    let engine = ScoringEngine::default();

    for size in [10, 50, 200] {
        let assessment = make_assessment(size);
        let submission = make_submission(size);
        group.bench_function(format!("questions={size}"), |b| {
            b.iter(|| engine.score(black_box(&assessment), black_box(&submission)))
        });
    }

    group.finish();
}

fn bench_grading(c: &mut Criterion) {
    let mut group = c.benchmark_group("grading");

    group.bench_function("percentage", |b| {
        b.iter(|| percentage(black_box(37.0), black_box(45.0)))
    });

    group.bench_function("grade", |b| {
        b.iter(|| Grade::from_percentage(black_box(64.5)))
    });

    group.finish();
}

fn bench_cosine(c: &mut Criterion) {
    let a: Vec<f64> = (0..768).map(|i| (i as f64).sin()).collect();
    let v: Vec<f64> = (0..768).map(|i| (i as f64).cos()).collect();
    c.bench_function("cosine_similarity/768", |b| {
        b.iter(|| cosine_similarity(black_box(&a), black_box(&v)))
    });
}

criterion_group!(benches, bench_score_submission, bench_grading, bench_cosine);
criterion_main!(benches);
