//! placement-core: Assessment model, scoring engine, and statistics.
//!
//! This crate defines the data model for question banks, assessments and
//! attempts, the pure scoring and aggregation functions built on it, and the
//! attempt service that ties them to a pluggable store and notifier.

pub mod error;
pub mod markup;
pub mod model;
pub mod parser;
pub mod report;
pub mod scoring;
pub mod service;
pub mod similarity;
pub mod statistics;
pub mod store;
pub mod timing;
pub mod traits;
