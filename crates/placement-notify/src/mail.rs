//! Result emails delivered through a transactional mail webhook.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::instrument;

use placement_core::markup::escape_html;
use placement_core::model::{Assessment, Attempt};
use placement_core::scoring::Grade;
use placement_core::timing::format_time;
use placement_core::traits::ChangeNotifier;

use crate::config::MailConfig;
use crate::error::{check_status, http_client, NotifyError};

/// JSON body posted to the mail webhook.
#[derive(Debug, Clone, Serialize)]
pub struct ResultEmail {
    pub to: String,
    pub from: String,
    pub from_name: String,
    pub subject: String,
    pub html_content: String,
    pub text_content: String,
    pub student_name: String,
    pub assessment_id: String,
    pub timestamp: DateTime<Utc>,
}

/// Sends a result email to the student when an attempt is published.
pub struct ResultMailer {
    webhook_url: String,
    api_key: Option<String>,
    from: String,
    college_name: String,
    timeout_secs: u64,
    client: reqwest::Client,
}

impl ResultMailer {
    pub fn new(webhook_url: &str, config: &MailConfig) -> Result<Self, NotifyError> {
        Ok(Self {
            webhook_url: webhook_url.to_string(),
            api_key: config.api_key.clone().filter(|k| !k.is_empty()),
            from: config.from.clone(),
            college_name: config.college_name.clone(),
            timeout_secs: config.timeout_secs,
            client: http_client(config.timeout_secs)?,
        })
    }

    /// Build the email for a completed attempt.
    ///
    /// Returns `None` when the student has no address, the attempt is not
    /// completed, or the assessment withholds results.
    pub fn compose(&self, attempt: &Attempt, assessment: &Assessment) -> Option<ResultEmail> {
        if attempt.student.email.trim().is_empty()
            || !attempt.is_completed()
            || !assessment.policy.show_results_immediately
        {
            return None;
        }

        let status = attempt.pass_status.map(|s| s.label()).unwrap_or("Fail");
        let grade = Grade::from_percentage(attempt.percentage);
        let taken = format_time(attempt.time_taken_secs);

        let text_content = format!(
            "Dear {name},\n\n\
             Your result for \"{title}\" is now available.\n\n\
             Score: {score}\n\
             Percentage: {pct:.2}%\n\
             Grade: {grade}\n\
             Status: {status}\n\
             Time taken: {taken}\n\n\
             Regards,\n{college}\n",
            name = attempt.student.name,
            title = assessment.title,
            score = attempt.score_fraction(),
            pct = attempt.percentage,
            college = self.college_name,
        );

        let html_content = format!(
            "<p>Dear {name},</p>\
             <p>Your result for <strong>{title}</strong> is now available.</p>\
             <table>\
             <tr><td>Score</td><td>{score}</td></tr>\
             <tr><td>Percentage</td><td>{pct:.2}%</td></tr>\
             <tr><td>Grade</td><td>{grade}</td></tr>\
             <tr><td>Status</td><td>{status}</td></tr>\
             <tr><td>Time taken</td><td>{taken}</td></tr>\
             </table>\
             <p>Regards,<br>{college}</p>",
            name = escape_html(&attempt.student.name),
            title = escape_html(&assessment.title),
            score = attempt.score_fraction(),
            pct = attempt.percentage,
            college = escape_html(&self.college_name),
        );

        Some(ResultEmail {
            to: attempt.student.email.clone(),
            from: self.from.clone(),
            from_name: self.college_name.clone(),
            subject: format!("Assessment Result: {} - {}", assessment.title, self.college_name),
            html_content,
            text_content,
            student_name: attempt.student.name.clone(),
            assessment_id: assessment.id.clone(),
            timestamp: Utc::now(),
        })
    }

    /// POST one email to the webhook.
    #[instrument(skip(self, email), fields(to = %email.to))]
    pub async fn send(&self, email: &ResultEmail) -> Result<(), NotifyError> {
        let mut request = self
            .client
            .post(&self.webhook_url)
            .header("Accept", "application/json")
            .json(email);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request
            .send()
            .await
            .map_err(|e| NotifyError::from_reqwest(e, self.timeout_secs))?;
        check_status(response, &self.webhook_url).await?;
        tracing::info!(subject = %email.subject, "result email sent");
        Ok(())
    }
}

#[async_trait]
impl ChangeNotifier for ResultMailer {
    fn name(&self) -> &str {
        "mail"
    }

    async fn assessment_changed(&self, _: &str) -> anyhow::Result<()> {
        Ok(())
    }

    async fn result_published(
        &self,
        attempt: &Attempt,
        assessment: &Assessment,
    ) -> anyhow::Result<()> {
        match self.compose(attempt, assessment) {
            Some(email) => Ok(self.send(&email).await?),
            None => {
                tracing::debug!(attempt = %attempt.id, "no result email to send");
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use placement_core::model::{AttemptPolicy, AttemptStatus, PassStatus, Student};
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn assessment() -> Assessment {
        Assessment {
            id: "apt".into(),
            title: "Aptitude <Round 1>".into(),
            category: "Aptitude".into(),
            description: String::new(),
            questions: vec![],
            total_marks: None,
            pass_percentage: 40.0,
            duration_minutes: 30,
            policy: AttemptPolicy::default(),
        }
    }

    fn attempt(email: &str) -> Attempt {
        let mut a = Attempt::start(
            "apt",
            Student {
                id: "s1".into(),
                name: "Asha".into(),
                email: email.into(),
            },
            Utc::now(),
        );
        a.status = AttemptStatus::Completed;
        a.obtained_marks = 17;
        a.total_marks = 20;
        a.percentage = 85.0;
        a.pass_status = Some(PassStatus::Pass);
        a.time_taken_secs = 754;
        a
    }

    fn mailer(url: &str, api_key: Option<&str>) -> ResultMailer {
        let config = MailConfig {
            api_key: api_key.map(String::from),
            ..Default::default()
        };
        ResultMailer::new(url, &config).unwrap()
    }

    #[test]
    fn compose_result_email() {
        let m = mailer("http://localhost/mail", None);
        let email = m.compose(&attempt("asha@example.edu"), &assessment()).unwrap();
        assert_eq!(email.to, "asha@example.edu");
        assert!(email.subject.starts_with("Assessment Result: Aptitude <Round 1>"));
        assert!(email.text_content.contains("Score: 17/20"));
        assert!(email.text_content.contains("Percentage: 85.00%"));
        assert!(email.text_content.contains("Grade: B"));
        assert!(email.text_content.contains("Status: Pass"));
        assert!(email.text_content.contains("Time taken: 12m 34s"));
        assert!(email.html_content.contains("Aptitude &lt;Round 1&gt;"));
    }

    #[test]
    fn html_body_escapes_apostrophes() {
        let m = mailer("http://localhost/mail", None);
        let mut a = attempt("conor@example.edu");
        a.student.name = "Conor O'Brien".into();
        let email = m.compose(&a, &assessment()).unwrap();
        assert!(email.html_content.contains("Conor O&#x27;Brien"));
        assert!(!email.html_content.contains("O'Brien"));
        assert!(email.text_content.contains("Conor O'Brien"));
    }

    #[test]
    fn compose_skips_when_not_deliverable() {
        let m = mailer("http://localhost/mail", None);
        assert!(m.compose(&attempt(""), &assessment()).is_none());

        let mut withheld = assessment();
        withheld.policy.show_results_immediately = false;
        assert!(m.compose(&attempt("asha@example.edu"), &withheld).is_none());

        let mut pending = attempt("asha@example.edu");
        pending.status = AttemptStatus::InProgress;
        assert!(m.compose(&pending, &assessment()).is_none());
    }

    #[tokio::test]
    async fn posts_email_with_auth() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/mail"))
            .and(header("authorization", "Bearer test-key"))
            .and(body_partial_json(serde_json::json!({
                "to": "asha@example.edu",
                "student_name": "Asha",
                "assessment_id": "apt"
            })))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let m = mailer(&format!("{}/mail", server.uri()), Some("test-key"));
        m.result_published(&attempt("asha@example.edu"), &assessment())
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn no_request_without_address() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let m = mailer(&format!("{}/mail", server.uri()), None);
        m.result_published(&attempt(""), &assessment()).await.unwrap();
    }

    #[tokio::test]
    async fn webhook_rejection_is_an_error() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/mail"))
            .respond_with(ResponseTemplate::new(401).set_body_string("bad key"))
            .mount(&server)
            .await;

        let m = mailer(&format!("{}/mail", server.uri()), Some("wrong"));
        let err = m
            .result_published(&attempt("asha@example.edu"), &assessment())
            .await
            .unwrap_err();
        assert!(err.to_string().contains("401"), "{err}");
    }
}
