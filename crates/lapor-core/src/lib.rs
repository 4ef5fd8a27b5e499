//! lapor-core - Core library for Lapor
//!
//! This crate contains the shared models, local database layer, report
//! lifecycle rules, and the reconciliation engine used by all Lapor
//! interfaces.

pub mod db;
pub mod error;
pub mod geo;
pub mod lifecycle;
pub mod models;
pub mod service;
pub mod sync;
pub mod util;

pub use error::{Error, Result};
pub use models::{Report, ReportId, ReportStatus};
pub use service::ReportService;
