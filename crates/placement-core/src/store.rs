//! In-memory [`AssessmentStore`].

use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::model::{Assessment, Attempt};
use crate::traits::{AssessmentStore, BeginOutcome};

/// Thread-safe store holding everything in memory.
#[derive(Default)]
pub struct MemoryStore {
    assessments: RwLock<BTreeMap<String, Assessment>>,
    attempts: RwLock<HashMap<Uuid, Attempt>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a store pre-loaded with assessments and attempts.
    pub fn with_data(assessments: Vec<Assessment>, attempts: Vec<Attempt>) -> Self {
        Self {
            assessments: RwLock::new(assessments.into_iter().map(|a| (a.id.clone(), a)).collect()),
            attempts: RwLock::new(attempts.into_iter().map(|a| (a.id, a)).collect()),
        }
    }

    async fn filtered<F>(&self, keep: F) -> Vec<Attempt>
    where
        F: Fn(&Attempt) -> bool,
    {
        let attempts = self.attempts.read().await;
        let mut out: Vec<Attempt> = attempts.values().filter(|a| keep(a)).cloned().collect();
        out.sort_by_key(|a| (a.started_at, a.id));
        out
    }
}

#[async_trait]
impl AssessmentStore for MemoryStore {
    async fn assessment(&self, id: &str) -> anyhow::Result<Option<Assessment>> {
        Ok(self.assessments.read().await.get(id).cloned())
    }

    async fn list_assessments(&self) -> anyhow::Result<Vec<Assessment>> {
        Ok(self.assessments.read().await.values().cloned().collect())
    }

    async fn save_assessment(&self, assessment: &Assessment) -> anyhow::Result<()> {
        self.assessments
            .write()
            .await
            .insert(assessment.id.clone(), assessment.clone());
        Ok(())
    }

    async fn delete_assessment(&self, id: &str) -> anyhow::Result<bool> {
        Ok(self.assessments.write().await.remove(id).is_some())
    }

    async fn attempt(&self, id: Uuid) -> anyhow::Result<Option<Attempt>> {
        Ok(self.attempts.read().await.get(&id).cloned())
    }

    async fn attempts_for_student(
        &self,
        student_id: &str,
        assessment_id: &str,
    ) -> anyhow::Result<Vec<Attempt>> {
        Ok(self
            .filtered(|a| a.student.id == student_id && a.assessment_id == assessment_id)
            .await)
    }

    async fn completed_attempts(&self, assessment_id: &str) -> anyhow::Result<Vec<Attempt>> {
        Ok(self
            .filtered(|a| a.is_completed() && a.assessment_id == assessment_id)
            .await)
    }

    async fn save_attempt(&self, attempt: &Attempt) -> anyhow::Result<()> {
        self.attempts.write().await.insert(attempt.id, attempt.clone());
        Ok(())
    }

    async fn begin_attempt(
        &self,
        attempt: &Attempt,
        allow_multiple: bool,
    ) -> anyhow::Result<BeginOutcome> {
        let mut attempts = self.attempts.write().await;
        let previous: Vec<&Attempt> = attempts
            .values()
            .filter(|a| {
                a.student.id == attempt.student.id && a.assessment_id == attempt.assessment_id
            })
            .collect();

        if let Some(open) = previous.iter().find(|a| !a.is_completed()) {
            return Ok(BeginOutcome::InProgress(open.id));
        }
        if !previous.is_empty() && !allow_multiple {
            return Ok(BeginOutcome::AlreadyAttempted);
        }

        attempts.insert(attempt.id, attempt.clone());
        Ok(BeginOutcome::Started)
    }

    async fn complete_attempt(&self, attempt: &Attempt) -> anyhow::Result<bool> {
        let mut attempts = self.attempts.write().await;
        match attempts.get_mut(&attempt.id) {
            Some(stored) if !stored.is_completed() => {
                *stored = attempt.clone();
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{AttemptPolicy, AttemptStatus, Student};
    use chrono::{Duration, Utc};

    fn assessment(id: &str) -> Assessment {
        Assessment {
            id: id.into(),
            title: id.into(),
            category: "Aptitude".into(),
            description: String::new(),
            questions: vec![],
            total_marks: None,
            pass_percentage: 40.0,
            duration_minutes: 30,
            policy: AttemptPolicy::default(),
        }
    }

    fn student(id: &str) -> Student {
        Student {
            id: id.into(),
            name: id.into(),
            email: String::new(),
        }
    }

    #[tokio::test]
    async fn assessment_crud() {
        let store = MemoryStore::new();
        store.save_assessment(&assessment("b")).await.unwrap();
        store.save_assessment(&assessment("a")).await.unwrap();

        let ids: Vec<String> = store
            .list_assessments()
            .await
            .unwrap()
            .into_iter()
            .map(|a| a.id)
            .collect();
        assert_eq!(ids, vec!["a", "b"]);

        assert!(store.delete_assessment("a").await.unwrap());
        assert!(!store.delete_assessment("a").await.unwrap());
        assert!(store.assessment("a").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn attempt_queries_filter_and_order() {
        let now = Utc::now();
        let first = Attempt::start("apt", student("s1"), now - Duration::minutes(10));
        let mut second = Attempt::start("apt", student("s1"), now);
        second.status = AttemptStatus::Completed;
        let other = Attempt::start("apt", student("s2"), now);
        let elsewhere = Attempt::start("tech", student("s1"), now);

        let store = MemoryStore::with_data(
            vec![],
            vec![second.clone(), first.clone(), other, elsewhere],
        );

        let mine = store.attempts_for_student("s1", "apt").await.unwrap();
        assert_eq!(mine.len(), 2);
        assert_eq!(mine[0].id, first.id);

        let done = store.completed_attempts("apt").await.unwrap();
        assert_eq!(done.len(), 1);
        assert_eq!(done[0].id, second.id);

        assert_eq!(store.attempt(first.id).await.unwrap().unwrap().id, first.id);
    }

    #[tokio::test]
    async fn begin_attempt_rejects_conflicts() {
        let store = MemoryStore::new();
        let now = Utc::now();
        let first = Attempt::start("apt", student("s1"), now);

        assert_eq!(
            store.begin_attempt(&first, false).await.unwrap(),
            BeginOutcome::Started
        );
        let second = Attempt::start("apt", student("s1"), now);
        assert_eq!(
            store.begin_attempt(&second, true).await.unwrap(),
            BeginOutcome::InProgress(first.id)
        );

        let mut done = first.clone();
        done.status = AttemptStatus::Completed;
        assert!(store.complete_attempt(&done).await.unwrap());
        assert_eq!(
            store.begin_attempt(&second, false).await.unwrap(),
            BeginOutcome::AlreadyAttempted
        );
        assert_eq!(
            store.begin_attempt(&second, true).await.unwrap(),
            BeginOutcome::Started
        );
        assert_eq!(store.attempts_for_student("s1", "apt").await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn complete_attempt_only_swaps_once() {
        let store = MemoryStore::new();
        let attempt = Attempt::start("apt", student("s1"), Utc::now());
        let mut done = attempt.clone();
        done.status = AttemptStatus::Completed;

        assert!(!store.complete_attempt(&done).await.unwrap());
        store.begin_attempt(&attempt, false).await.unwrap();

        done.obtained_marks = 1;
        assert!(store.complete_attempt(&done).await.unwrap());
        let mut again = done.clone();
        again.obtained_marks = 5;
        assert!(!store.complete_attempt(&again).await.unwrap());
        assert_eq!(store.attempt(attempt.id).await.unwrap().unwrap().obtained_marks, 1);
    }
}
