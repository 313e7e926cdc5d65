//! Portal configuration and notifier factory.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use placement_core::scoring::{AnswerMatching, ScoringConfig, TotalMarksPolicy};
use placement_core::traits::{ChangeNotifier, FanoutNotifier};

use crate::mail::ResultMailer;
use crate::rag::RagSyncClient;

/// Top-level placement configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PortalConfig {
    #[serde(default)]
    pub scoring: ScoringSection,
    #[serde(default)]
    pub rag: RagConfig,
    #[serde(default)]
    pub mail: MailConfig,
    /// Output directory for exports and reports.
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
}

/// `[scoring]` section.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct ScoringSection {
    /// Compare free-text answers case-sensitively.
    #[serde(default)]
    pub free_text_case_sensitive: bool,
    #[serde(default)]
    pub total_marks_policy: TotalMarksPolicy,
}

impl ScoringSection {
    pub fn to_scoring_config(&self) -> ScoringConfig {
        ScoringConfig {
            matching: AnswerMatching {
                case_sensitive: self.free_text_case_sensitive,
            },
            total_marks_policy: self.total_marks_policy,
        }
    }
}

/// `[rag]` section: the knowledge-base sync endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RagConfig {
    #[serde(default = "default_rag_url")]
    pub base_url: String,
    #[serde(default = "default_rag_timeout")]
    pub timeout_secs: u64,
    #[serde(default = "default_true")]
    pub enabled: bool,
}

impl Default for RagConfig {
    fn default() -> Self {
        Self {
            base_url: default_rag_url(),
            timeout_secs: default_rag_timeout(),
            enabled: true,
        }
    }
}

/// `[mail]` section: the transactional mail webhook.
///
/// Note: Custom Debug impl masks the API key to prevent accidental exposure in logs.
#[derive(Clone, Serialize, Deserialize)]
pub struct MailConfig {
    #[serde(default)]
    pub webhook_url: Option<String>,
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default = "default_from")]
    pub from: String,
    #[serde(default = "default_college_name")]
    pub college_name: String,
    #[serde(default = "default_mail_timeout")]
    pub timeout_secs: u64,
    #[serde(default)]
    pub enabled: bool,
}

impl Default for MailConfig {
    fn default() -> Self {
        Self {
            webhook_url: None,
            api_key: None,
            from: default_from(),
            college_name: default_college_name(),
            timeout_secs: default_mail_timeout(),
            enabled: false,
        }
    }
}

impl std::fmt::Debug for MailConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MailConfig")
            .field("webhook_url", &self.webhook_url)
            .field("api_key", &self.api_key.as_ref().map(|_| "***"))
            .field("from", &self.from)
            .field("college_name", &self.college_name)
            .field("timeout_secs", &self.timeout_secs)
            .field("enabled", &self.enabled)
            .finish()
    }
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("./placement-reports")
}
fn default_rag_url() -> String {
    "http://localhost:8001".to_string()
}
fn default_rag_timeout() -> u64 {
    5
}
fn default_mail_timeout() -> u64 {
    30
}
fn default_from() -> String {
    "noreply@collegeportal.com".to_string()
}
fn default_college_name() -> String {
    "College Placement Portal".to_string()
}
fn default_true() -> bool {
    true
}

/// Resolve environment variable references like `${VAR_NAME}` in a string.
fn resolve_env_vars(s: &str) -> String {
    let mut result = s.to_string();
    let mut from = 0;
    while let Some(offset) = result[from..].find("${") {
        let start = from + offset;
        let Some(end) = result[start..].find('}') else {
            break;
        };
        let var_name = &result[start + 2..start + end];
        let value = std::env::var(var_name).unwrap_or_default();
        result = format!("{}{}{}", &result[..start], value, &result[start + end + 1..]);
        from = start + value.len();
    }
    result
}

impl PortalConfig {
    /// Apply `PLACEMENT_*` overrides using `lookup` to read variables.
    fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup("PLACEMENT_RAG_URL") {
            self.rag.base_url = url;
        }
        if let Some(url) = lookup("PLACEMENT_MAIL_WEBHOOK") {
            self.mail.webhook_url = Some(url);
            self.mail.enabled = true;
        }
        if let Some(key) = lookup("PLACEMENT_MAIL_API_KEY") {
            self.mail.api_key = Some(key);
        }
        if let Some(dir) = lookup("PLACEMENT_OUTPUT_DIR") {
            self.output_dir = PathBuf::from(dir);
        }
    }

    fn resolve_env(&mut self) {
        self.rag.base_url = resolve_env_vars(&self.rag.base_url);
        self.mail.webhook_url = self.mail.webhook_url.as_deref().map(resolve_env_vars);
        self.mail.api_key = self.mail.api_key.as_deref().map(resolve_env_vars);
        self.mail.from = resolve_env_vars(&self.mail.from);
    }
}

/// Load configuration from well-known paths.
///
/// Search order:
/// 1. `placement.toml` in the current directory
/// 2. `~/.config/placement/config.toml`
///
/// Environment variable overrides: `PLACEMENT_RAG_URL`, `PLACEMENT_MAIL_WEBHOOK`,
/// `PLACEMENT_MAIL_API_KEY`, `PLACEMENT_OUTPUT_DIR`.
pub fn load_config() -> Result<PortalConfig> {
    load_config_from(None)
}

/// Load config from an explicit path, or search the default locations.
pub fn load_config_from(path: Option<&Path>) -> Result<PortalConfig> {
    let config_path = if let Some(p) = path {
        if p.exists() {
            Some(p.to_path_buf())
        } else {
            anyhow::bail!("config file not found: {}", p.display());
        }
    } else {
        let local = PathBuf::from("placement.toml");
        if local.exists() {
            Some(local)
        } else {
            dirs_path()
                .map(|home| home.join("config.toml"))
                .filter(|global| global.exists())
        }
    };

    let mut config = match config_path {
        Some(path) => {
            let content = std::fs::read_to_string(&path)
                .with_context(|| format!("failed to read config: {}", path.display()))?;
            toml::from_str::<PortalConfig>(&content)
                .with_context(|| format!("failed to parse config: {}", path.display()))?
        }
        None => PortalConfig::default(),
    };

    config.apply_overrides(|name| std::env::var(name).ok());
    config.resolve_env();

    Ok(config)
}

fn dirs_path() -> Option<PathBuf> {
    std::env::var("HOME")
        .ok()
        .map(|h| PathBuf::from(h).join(".config").join("placement"))
}

/// Build the notifier set described by `config`.
///
/// RAG sync is included when enabled. The result mailer is included when
/// enabled and a webhook URL is configured.
pub fn build_notifier(config: &PortalConfig) -> Result<FanoutNotifier> {
    let mut notifiers: Vec<Arc<dyn ChangeNotifier>> = Vec::new();

    if config.rag.enabled {
        notifiers.push(Arc::new(
            RagSyncClient::new(&config.rag.base_url, config.rag.timeout_secs)
                .context("failed to create RAG sync client")?,
        ));
    }

    if config.mail.enabled {
        match &config.mail.webhook_url {
            Some(url) => notifiers.push(Arc::new(
                ResultMailer::new(url, &config.mail).context("failed to create result mailer")?,
            )),
            None => tracing::warn!("mail is enabled but no webhook_url is configured"),
        }
    }

    Ok(FanoutNotifier::new(notifiers))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn resolve_env_vars_basic() {
        std::env::set_var("_PLACEMENT_TEST_VAR", "hello");
        assert_eq!(resolve_env_vars("${_PLACEMENT_TEST_VAR}"), "hello");
        assert_eq!(
            resolve_env_vars("prefix_${_PLACEMENT_TEST_VAR}_suffix"),
            "prefix_hello_suffix"
        );
        assert_eq!(resolve_env_vars("${_PLACEMENT_UNSET_VAR}x"), "x");
        assert_eq!(resolve_env_vars("no ${closing"), "no ${closing");
        std::env::remove_var("_PLACEMENT_TEST_VAR");
    }

    #[test]
    fn default_config() {
        let config = PortalConfig::default();
        assert_eq!(config.rag.base_url, "http://localhost:8001");
        assert_eq!(config.rag.timeout_secs, 5);
        assert!(config.rag.enabled);
        assert!(!config.mail.enabled);
        assert!(!config.scoring.free_text_case_sensitive);
    }

    #[test]
    fn parse_full_config() {
        let toml_str = r#"
output_dir = "./out"

[scoring]
free_text_case_sensitive = true
total_marks_policy = "prefer_configured"

[rag]
base_url = "http://rag.internal:9000"
enabled = false

[mail]
webhook_url = "https://hooks.example.com/mail"
api_key = "secret-key"
college_name = "Govt. Engineering College"
enabled = true
"#;
        let config: PortalConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.output_dir, PathBuf::from("./out"));
        assert!(!config.rag.enabled);
        assert_eq!(config.rag.timeout_secs, 5);
        assert_eq!(config.mail.from, "noreply@collegeportal.com");

        let scoring = config.scoring.to_scoring_config();
        assert!(scoring.matching.case_sensitive);
        assert_eq!(scoring.total_marks_policy, TotalMarksPolicy::PreferConfigured);
    }

    #[test]
    fn debug_masks_api_key() {
        let mail = MailConfig {
            api_key: Some("secret-key".into()),
            ..Default::default()
        };
        let debug = format!("{mail:?}");
        assert!(!debug.contains("secret-key"));
        assert!(debug.contains("***"));
    }

    #[test]
    fn overrides_take_precedence() {
        let vars: HashMap<&str, &str> = [
            ("PLACEMENT_RAG_URL", "http://override:8001"),
            ("PLACEMENT_MAIL_WEBHOOK", "https://hooks.example.com/x"),
        ]
        .into_iter()
        .collect();
        let mut config = PortalConfig::default();
        config.apply_overrides(|name| vars.get(name).map(|v| v.to_string()));

        assert_eq!(config.rag.base_url, "http://override:8001");
        assert_eq!(config.mail.webhook_url.as_deref(), Some("https://hooks.example.com/x"));
        assert!(config.mail.enabled);
        assert!(config.mail.api_key.is_none());
    }

    #[test]
    fn load_explicit_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("placement.toml");
        std::fs::write(&path, "[rag]\nenabled = false\n").unwrap();
        let config = load_config_from(Some(&path)).unwrap();
        assert!(!config.rag.enabled);

        assert!(load_config_from(Some(&dir.path().join("missing.toml"))).is_err());
    }

    #[test]
    fn notifier_set_follows_config() {
        let mut config = PortalConfig::default();
        config.rag.enabled = false;
        assert!(build_notifier(&config).unwrap().is_empty());

        config.mail.enabled = true;
        assert!(build_notifier(&config).unwrap().is_empty());

        config.mail.webhook_url = Some("https://hooks.example.com/mail".into());
        assert!(!build_notifier(&config).unwrap().is_empty());
    }
}
