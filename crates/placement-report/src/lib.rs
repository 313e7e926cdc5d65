//! placement-report: Result exports.
//!
//! CSV summary and detailed exports for spreadsheet use, and a
//! self-contained HTML report for admins.

pub mod csv;
pub mod html;

pub use csv::{detailed_csv, summary_csv, write_csv};
pub use html::{generate_html, write_html_report};
