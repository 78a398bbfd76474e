#![forbid(unsafe_code)]

//! Core domain model and business logic for Fitplan.
//!
//! This crate provides:
//! - Domain types (categories, programs, exercises, consultations)
//! - Body metric classification
//! - The validated rule table and program resolver
//! - Program catalog and user directory
//! - Persistence (JSON stores, consultation WAL, CSV archive)

pub mod types;
pub mod error;
pub mod labels;
pub mod classify;
pub mod rules;
pub mod engine;
pub mod catalog;
pub mod users;
pub mod config;
pub mod logging;
pub mod store;
pub mod wal;
pub mod csv_rollup;
pub mod history;

// Re-export commonly used types
pub use error::{Error, Result};
pub use types::*;
pub use classify::{classify_bmi, classify_body_fat, compute_bmi};
pub use rules::RuleTable;
pub use engine::{consult, resolve_program, Consultation, Resolution};
pub use catalog::{build_default_catalog, get_default_catalog};
pub use users::UserDirectory;
pub use config::Config;
pub use wal::{ConsultationSink, JsonlSink};
pub use history::load_recent;
