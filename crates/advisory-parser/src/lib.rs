//! # advisory-parser
//!
//! Run `yarn npm audit --json` and parse its advisory report.
//!
//! This crate spawns the audit subprocess and turns its JSON output
//! into typed [`Advisory`] records with fail-fast validation.
//!
//! ## Overview
//!
//! The audit report is a map of opaque advisory ids to records, each
//! naming an affected module, the vulnerable version range, and the
//! patched version range:
//!
//! ```json
//! {
//!   "advisories": {
//!     "118": {
//!       "module_name": "left-pad",
//!       "vulnerable_versions": "<1.3.0",
//!       "patched_versions": ">=1.3.0",
//!       "severity": "high"
//!     }
//!   }
//! }
//! ```
//!
//! A record missing any of the three required fields fails parsing
//! with a descriptive error before any remediation can start.
//! Additional fields are ignored.
//!
//! ## Example
//!
//! ```ignore
//! use advisory_parser::{AuditOptions, AuditSource};
//! use std::path::Path;
//!
//! let source = AuditSource::new("yarn", Path::new("/path/to/project"));
//! let advisories = source.advisories(&AuditOptions::default()).await?;
//! for advisory in &advisories {
//!     println!("{}: {}", advisory.module_name, advisory.vulnerable_versions);
//! }
//! ```

mod advisory;
mod error;
mod parser;
mod source;

pub use advisory::{Advisory, Severity};
pub use error::AdvisoryError;
pub use parser::parse_audit_report;
pub use source::{AuditEnvironment, AuditOptions, AuditSource};
