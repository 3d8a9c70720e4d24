//! Commit message rule engine
//!
//! Validates and auto-corrects conventional commit messages against a
//! commitlint-compatible rule configuration. The same engine backs the
//! `commit-rules` linter and field-by-field composition with AI-drafted
//! suggestions.
pub mod api;
pub mod config;
pub mod engine;
pub mod error;
pub mod git;
pub mod message;
pub mod report;
pub mod rules;
pub mod style;
pub mod templates;
pub mod types;

// Re-export commonly used types
pub use config::LintConfig;
pub use engine::RulesEngine;
pub use error::{LintError, Result};
pub use message::{CommitMessage, DisplayValue};
pub use report::{PartReport, Report};
pub use rules::{Rule, RuleKind};
pub use types::{Applicability, CommitPart, Severity};
