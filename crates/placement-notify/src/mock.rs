//! Recording notifier for testing.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use uuid::Uuid;

use placement_core::model::{Assessment, Attempt};
use placement_core::traits::ChangeNotifier;

/// A notification seen by [`RecordingNotifier`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotifyEvent {
    AssessmentChanged(String),
    ResultPublished { attempt_id: Uuid, assessment_id: String },
}

/// A notifier that records every call, for testing the attempt service
/// without real endpoints.
///
/// With [`RecordingNotifier::failing`] every call is recorded and then
/// reported as an error.
#[derive(Default)]
pub struct RecordingNotifier {
    events: Mutex<Vec<NotifyEvent>>,
    fail: AtomicBool,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// A notifier whose every call fails after being recorded.
    pub fn failing() -> Self {
        let notifier = Self::default();
        notifier.set_failing(true);
        notifier
    }

    pub fn set_failing(&self, fail: bool) {
        self.fail.store(fail, Ordering::Relaxed);
    }

    /// Every event recorded so far, in call order.
    pub fn events(&self) -> Vec<NotifyEvent> {
        self.lock().clone()
    }

    /// Number of calls made to this notifier.
    pub fn call_count(&self) -> usize {
        self.lock().len()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<NotifyEvent>> {
        // a poisoned lock still holds valid events
        self.events.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn record(&self, event: NotifyEvent) -> anyhow::Result<()> {
        self.lock().push(event);
        if self.fail.load(Ordering::Relaxed) {
            anyhow::bail!("recording notifier set to fail");
        }
        Ok(())
    }
}

#[async_trait]
impl ChangeNotifier for RecordingNotifier {
    fn name(&self) -> &str {
        "recording"
    }

    async fn assessment_changed(&self, assessment_id: &str) -> anyhow::Result<()> {
        self.record(NotifyEvent::AssessmentChanged(assessment_id.to_string()))
    }

    async fn result_published(
        &self,
        attempt: &Attempt,
        assessment: &Assessment,
    ) -> anyhow::Result<()> {
        self.record(NotifyEvent::ResultPublished {
            attempt_id: attempt.id,
            assessment_id: assessment.id.clone(),
        })
    }
}
