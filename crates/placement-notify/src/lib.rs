//! placement-notify: Configuration and side-channel notifiers.
//!
//! Loads `placement.toml` and implements the `ChangeNotifier` trait for the
//! RAG knowledge sync endpoint and a transactional mail webhook. Every
//! notifier makes a single attempt under its own timeout; callers log and
//! discard failures.

pub mod config;
pub mod error;
pub mod mail;
pub mod mock;
pub mod rag;

pub use config::{build_notifier, load_config, load_config_from, PortalConfig};
pub use error::NotifyError;
pub use mail::ResultMailer;
pub use mock::RecordingNotifier;
pub use rag::RagSyncClient;
