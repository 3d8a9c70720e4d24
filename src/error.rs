use thiserror::Error;

#[derive(Debug, Error)]
pub enum LintError {
   #[error("Unknown rule '{name}'")]
   UnknownRule { name: String },

   #[error("Invalid configuration for rule '{rule}': {reason}")]
   InvalidRuleConfig { rule: String, reason: String },

   #[error("Configuration error: {0}")]
   Config(String),

   #[error("Git command failed: {0}")]
   Git(String),

   #[error("Not a git repository: {0}")]
   NotARepository(String),

   #[error("No staged changes found")]
   NoStagedChanges,

   #[error("API request failed (HTTP {status}): {body}")]
   Api { status: u16, body: String },

   #[error("API call failed after {retries} retries: {source}")]
   ApiRetryExhausted {
      retries: u32,
      #[source]
      source:  Box<Self>,
   },

   #[error("Template error: {0}")]
   Template(String),

   #[error("IO error: {0}")]
   Io(#[from] std::io::Error),

   #[error("JSON error: {0}")]
   Json(#[from] serde_json::Error),

   #[error("HTTP error: {0}")]
   Http(#[from] reqwest::Error),

   #[error("{0}")]
   Other(String),
}

impl LintError {
   pub(crate) fn invalid_rule(rule: &str, reason: impl Into<String>) -> Self {
      Self::InvalidRuleConfig { rule: rule.to_string(), reason: reason.into() }
   }
}

pub type Result<T> = std::result::Result<T, LintError>;
