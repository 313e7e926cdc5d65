//! Core trait definitions for persistence and change notification.
//!
//! The attempt service only ever talks to these traits. `MemoryStore` in
//! [`crate::store`] backs tests and the CLI; the HTTP notifiers live in the
//! `placement-notify` crate.

use std::sync::Arc;

use async_trait::async_trait;
use futures::future::join_all;
use uuid::Uuid;

use crate::model::{Assessment, Attempt};

// ---------------------------------------------------------------------------
// Assessment store trait
// ---------------------------------------------------------------------------

/// Persistence for assessments and attempts.
#[async_trait]
pub trait AssessmentStore: Send + Sync {
    /// Fetch an assessment by id.
    async fn assessment(&self, id: &str) -> anyhow::Result<Option<Assessment>>;

    /// All stored assessments, ordered by id.
    async fn list_assessments(&self) -> anyhow::Result<Vec<Assessment>>;

    /// Insert or replace an assessment.
    async fn save_assessment(&self, assessment: &Assessment) -> anyhow::Result<()>;

    /// Remove an assessment. Returns `false` if it did not exist.
    async fn delete_assessment(&self, id: &str) -> anyhow::Result<bool>;

    /// Fetch an attempt by id.
    async fn attempt(&self, id: Uuid) -> anyhow::Result<Option<Attempt>>;

    /// Every attempt a student has made at an assessment, oldest first.
    async fn attempts_for_student(
        &self,
        student_id: &str,
        assessment_id: &str,
    ) -> anyhow::Result<Vec<Attempt>>;

    /// Completed attempts for an assessment, oldest first.
    async fn completed_attempts(&self, assessment_id: &str) -> anyhow::Result<Vec<Attempt>>;

    /// Insert or replace an attempt.
    async fn save_attempt(&self, attempt: &Attempt) -> anyhow::Result<()>;

    /// Insert a new attempt unless the student already has a conflicting
    /// one for the same assessment. The check and the insert are atomic.
    ///
    /// An unfinished attempt always conflicts; a completed one conflicts
    /// unless `allow_multiple` is set.
    async fn begin_attempt(
        &self,
        attempt: &Attempt,
        allow_multiple: bool,
    ) -> anyhow::Result<BeginOutcome>;

    /// Replace a stored in-progress attempt with its completed form.
    ///
    /// Returns `false`, leaving the store untouched, if the stored attempt is
    /// missing or already completed.
    async fn complete_attempt(&self, attempt: &Attempt) -> anyhow::Result<bool>;
}

/// Result of [`AssessmentStore::begin_attempt`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BeginOutcome {
    /// The attempt was stored.
    Started,
    /// The student has this attempt open already.
    InProgress(Uuid),
    /// The student has completed an attempt and retakes are off.
    AlreadyAttempted,
}

// ---------------------------------------------------------------------------
// Change notifier trait
// ---------------------------------------------------------------------------

/// Side channel told about assessment changes and published results.
///
/// Callers treat every notification as best-effort: an `Err` is logged and
/// never fails the operation that triggered it.
#[async_trait]
pub trait ChangeNotifier: Send + Sync {
    /// Short name used in logs (e.g. "rag").
    fn name(&self) -> &str;

    /// An assessment was created, updated, or deleted.
    async fn assessment_changed(&self, assessment_id: &str) -> anyhow::Result<()>;

    /// An attempt was scored and its result is ready to share.
    async fn result_published(
        &self,
        attempt: &Attempt,
        assessment: &Assessment,
    ) -> anyhow::Result<()>;
}

/// Notifier that does nothing.
pub struct NoopNotifier;

#[async_trait]
impl ChangeNotifier for NoopNotifier {
    fn name(&self) -> &str {
        "noop"
    }

    async fn assessment_changed(&self, _: &str) -> anyhow::Result<()> {
        Ok(())
    }

    async fn result_published(&self, _: &Attempt, _: &Assessment) -> anyhow::Result<()> {
        Ok(())
    }
}

/// Forwards each notification to several notifiers concurrently.
///
/// All notifiers are always called. If any fail, the error lists each
/// failing notifier by name.
pub struct FanoutNotifier {
    notifiers: Vec<Arc<dyn ChangeNotifier>>,
}

impl FanoutNotifier {
    pub fn new(notifiers: Vec<Arc<dyn ChangeNotifier>>) -> Self {
        Self { notifiers }
    }

    pub fn is_empty(&self) -> bool {
        self.notifiers.is_empty()
    }

    fn collect(&self, results: Vec<anyhow::Result<()>>) -> anyhow::Result<()> {
        let failures: Vec<String> = self
            .notifiers
            .iter()
            .zip(results)
            .filter_map(|(n, r)| r.err().map(|e| format!("{}: {e:#}", n.name())))
            .collect();
        if failures.is_empty() {
            Ok(())
        } else {
            anyhow::bail!("{} notifier(s) failed: {}", failures.len(), failures.join("; "))
        }
    }
}

#[async_trait]
impl ChangeNotifier for FanoutNotifier {
    fn name(&self) -> &str {
        "fanout"
    }

    async fn assessment_changed(&self, assessment_id: &str) -> anyhow::Result<()> {
        let results = join_all(
            self.notifiers
                .iter()
                .map(|n| n.assessment_changed(assessment_id)),
        )
        .await;
        self.collect(results)
    }

    async fn result_published(
        &self,
        attempt: &Attempt,
        assessment: &Assessment,
    ) -> anyhow::Result<()> {
        let results = join_all(
            self.notifiers
                .iter()
                .map(|n| n.result_published(attempt, assessment)),
        )
        .await;
        self.collect(results)
    }
}
