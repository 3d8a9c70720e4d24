use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use serde::Deserialize;
use tracing::debug;

use crate::{
   error::{LintError, Result},
   types::{Applicability, RuleArg, RuleTuple, Severity},
};

/// Project-level configuration files, most specific first
pub const PROJECT_CONFIG_FILES: &[&str] =
   &[".commitlintrc.json", "commitlint.config.json", ".commit-rules.toml"];

/// Types accepted by the default `type-enum` rule
pub const CONVENTIONAL_TYPES: &[&str] = &[
   "build", "chore", "ci", "docs", "feat", "fix", "perf", "refactor", "revert", "style", "test",
];

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LintConfig {
   /// `rule-name -> [severity, applicability, value]`, in evaluation order.
   /// A file that sets this table replaces the default rule set entirely.
   pub rules: IndexMap<String, RuleTuple>,

   /// Separator between several scopes in one header
   pub scope_delimiter: String,

   pub api_base_url: String,

   /// Optional API key for authentication (overridden by
   /// `COMMIT_RULES_API_KEY`)
   pub api_key: Option<String>,

   pub model: String,

   /// HTTP request timeout in seconds
   pub request_timeout_secs: u64,

   /// HTTP connection timeout in seconds
   pub connect_timeout_secs: u64,

   pub max_retries:        u32,
   pub initial_backoff_ms: u64,
   pub temperature:        f32,

   /// Staged diffs longer than this are truncated before being sent
   pub max_diff_length: usize,

   /// Prompt variant for suggestions (e.g., "default")
   #[serde(default = "default_suggest_prompt_variant")]
   pub suggest_prompt_variant: String,
}

fn default_suggest_prompt_variant() -> String {
   "default".to_string()
}

fn rule(severity: Severity, applicable: Applicability, value: Option<RuleArg>) -> RuleTuple {
   RuleTuple::new(severity, applicable, value)
}

/// The conventional-commit preset used when no configuration file exists
pub fn default_rules() -> IndexMap<String, RuleTuple> {
   use Applicability::{Always, Never};
   use Severity::{Error, Warning};

   let types = CONVENTIONAL_TYPES.iter().map(|t| (*t).to_string()).collect();
   IndexMap::from([
      ("type-enum".to_string(), rule(Error, Always, Some(RuleArg::List(types)))),
      ("type-empty".to_string(), rule(Error, Never, None)),
      ("subject-empty".to_string(), rule(Error, Never, None)),
      ("subject-full-stop".to_string(), rule(Error, Never, Some(RuleArg::Text(".".to_string())))),
      ("header-max-length".to_string(), rule(Error, Always, Some(RuleArg::Integer(100)))),
      ("header-trim".to_string(), rule(Error, Always, None)),
      ("body-leading-blank".to_string(), rule(Warning, Always, None)),
      ("body-max-line-length".to_string(), rule(Error, Always, Some(RuleArg::Integer(100)))),
      ("footer-leading-blank".to_string(), rule(Warning, Always, None)),
      ("footer-max-line-length".to_string(), rule(Error, Always, Some(RuleArg::Integer(100)))),
   ])
}

impl Default for LintConfig {
   fn default() -> Self {
      Self {
         rules:                  default_rules(),
         scope_delimiter:        ",".to_string(),
         api_base_url:           "http://localhost:4000".to_string(),
         api_key:                None,
         model:                  "claude-haiku-4-5".to_string(),
         request_timeout_secs:   60,
         connect_timeout_secs:   10,
         max_retries:            3,
         initial_backoff_ms:     1000,
         temperature:            0.2,
         max_diff_length:        50000,
         suggest_prompt_variant: default_suggest_prompt_variant(),
      }
   }
}

impl LintConfig {
   /// Resolve configuration for a working directory, in order:
   /// - `$COMMIT_RULES_CONFIG`
   /// - a project file in `dir` (see [`PROJECT_CONFIG_FILES`])
   /// - `~/.config/commit-rules/config.toml`
   /// - built-in defaults
   ///
   /// Environment variables override file values:
   /// - `COMMIT_RULES_API_URL` overrides `api_base_url`
   /// - `COMMIT_RULES_API_KEY` overrides `api_key`
   /// - `COMMIT_RULES_MODEL` overrides `model`
   pub fn load(dir: &Path) -> Result<Self> {
      let config_path = std::env::var_os("COMMIT_RULES_CONFIG")
         .map(PathBuf::from)
         .filter(|path| path.exists())
         .or_else(|| Self::find_project_config(dir))
         .or_else(|| Self::default_config_path().ok().filter(|path| path.exists()));

      match config_path {
         Some(path) => Self::from_file(&path),
         None => {
            debug!("no configuration file found, using defaults");
            let mut config = Self::default();
            config.apply_env_overrides();
            Ok(config)
         },
      }
   }

   /// Load config from a specific file. `.json` files are read as
   /// commitlint configuration, anything else as TOML.
   pub fn from_file(path: &Path) -> Result<Self> {
      let contents = std::fs::read_to_string(path).map_err(|e| {
         LintError::Config(format!("Failed to read config {}: {e}", path.display()))
      })?;

      let is_json = path
         .extension()
         .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
      let mut config = if is_json {
         Self::from_json(&contents)
      } else {
         Self::from_toml(&contents)
      }
      .map_err(|e| LintError::Config(format!("Failed to parse config {}: {e}", path.display())))?;

      debug!(path = %path.display(), rules = config.rules.len(), "loaded configuration");
      config.apply_env_overrides();
      Ok(config)
   }

   pub fn from_json(contents: &str) -> std::result::Result<Self, String> {
      serde_json::from_str(contents).map_err(|e| e.to_string())
   }

   pub fn from_toml(contents: &str) -> std::result::Result<Self, String> {
      toml::from_str(contents).map_err(|e| e.to_string())
   }

   /// First project configuration file present in `dir`
   pub fn find_project_config(dir: &Path) -> Option<PathBuf> {
      PROJECT_CONFIG_FILES
         .iter()
         .map(|name| dir.join(name))
         .find(|path| path.is_file())
   }

   fn apply_env_overrides(&mut self) {
      self.apply_overrides(|key| std::env::var(key).ok());
   }

   /// Apply overrides from a variable lookup
   pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
      if let Some(api_url) = lookup("COMMIT_RULES_API_URL") {
         self.api_base_url = api_url;
      }

      if let Some(api_key) = lookup("COMMIT_RULES_API_KEY") {
         self.api_key = Some(api_key);
      }

      if let Some(model) = lookup("COMMIT_RULES_MODEL") {
         self.model = model;
      }
   }

   /// Get default config path (platform-safe)
   /// Tries HOME (Unix/Linux/macOS) then USERPROFILE (Windows)
   pub fn default_config_path() -> Result<PathBuf> {
      if let Ok(home) = std::env::var("HOME") {
         return Ok(PathBuf::from(home).join(".config/commit-rules/config.toml"));
      }

      if let Ok(home) = std::env::var("USERPROFILE") {
         return Ok(PathBuf::from(home).join(".config/commit-rules/config.toml"));
      }

      Err(LintError::Config("No home directory found (tried HOME and USERPROFILE)".to_string()))
   }
}

#[cfg(test)]
mod tests {
   use tempfile::TempDir;

   use super::*;
   use crate::engine::RulesEngine;

   #[test]
   fn test_default_rules_build_an_engine() {
      let config = LintConfig::default();
      let engine = RulesEngine::from_config(&config).unwrap();
      assert_eq!(engine.rules().len(), 10);
      assert_eq!(engine.rules()[0].name(), "type-enum");
      assert!(engine.lint("feat(api): add retries").is_empty());
   }

   #[test]
   fn test_commitlint_json() {
      let json = r#"{
         "extends": ["@commitlint/config-conventional"],
         "rules": {
            "header-max-length": [2, "always", 72],
            "scope-enum": [1, "always", ["api", "core"]],
            "subject-empty": [2, "never"],
            "body-leading-blank": [0]
         }
      }"#;
      let config = LintConfig::from_json(json).unwrap();
      let names: Vec<_> = config.rules.keys().map(String::as_str).collect();
      assert_eq!(names, vec![
         "header-max-length",
         "scope-enum",
         "subject-empty",
         "body-leading-blank"
      ]);
      assert_eq!(config.scope_delimiter, ",");

      let engine = RulesEngine::from_config(&config).unwrap();
      assert_eq!(engine.rules().len(), 3);
   }

   #[test]
   fn test_toml_config() {
      let toml = r#"
         scope_delimiter = "/"
         model = "gpt-4o-mini"
         max_retries = 5

         [rules]
         "scope-allow-multiple" = [2, "never"]
         "header-max-length" = [2, "always", 50]
      "#;
      let config = LintConfig::from_toml(toml).unwrap();
      assert_eq!(config.scope_delimiter, "/");
      assert_eq!(config.model, "gpt-4o-mini");
      assert_eq!(config.max_retries, 5);
      assert_eq!(config.request_timeout_secs, 60);
      assert_eq!(config.rules.len(), 2);
   }

   #[test]
   fn test_missing_rules_keep_defaults() {
      let config = LintConfig::from_toml("temperature = 0.5").unwrap();
      assert_eq!(config.rules, default_rules());
      assert_eq!(config.suggest_prompt_variant, "default");
   }

   #[test]
   fn test_from_file_picks_parser_by_extension() {
      let dir = TempDir::new().unwrap();
      let json = dir.path().join(".commitlintrc.json");
      std::fs::write(&json, r#"{"rules": {"type-empty": [2, "never"]}}"#).unwrap();
      let config = LintConfig::from_file(&json).unwrap();
      assert_eq!(config.rules.len(), 1);

      let toml = dir.path().join(".commit-rules.toml");
      std::fs::write(&toml, "[rules]\n\"type-empty\" = [1, \"never\"]\n").unwrap();
      let config = LintConfig::from_file(&toml).unwrap();
      assert_eq!(
         config.rules["type-empty"],
         RuleTuple::new(Severity::Warning, Applicability::Never, None)
      );
   }

   #[test]
   fn test_from_file_errors() {
      let dir = TempDir::new().unwrap();
      let missing = LintConfig::from_file(&dir.path().join("nope.toml")).unwrap_err();
      assert!(matches!(missing, LintError::Config(_)));

      let broken = dir.path().join("commitlint.config.json");
      std::fs::write(&broken, "{ not json").unwrap();
      let err = LintConfig::from_file(&broken).unwrap_err();
      assert!(matches!(err, LintError::Config(ref msg) if msg.contains("Failed to parse")));
   }

   #[test]
   fn test_project_config_precedence() {
      let dir = TempDir::new().unwrap();
      assert!(LintConfig::find_project_config(dir.path()).is_none());

      std::fs::write(dir.path().join(".commit-rules.toml"), "").unwrap();
      let found = LintConfig::find_project_config(dir.path()).unwrap();
      assert!(found.ends_with(".commit-rules.toml"));

      std::fs::write(dir.path().join(".commitlintrc.json"), "{}").unwrap();
      let found = LintConfig::find_project_config(dir.path()).unwrap();
      assert!(found.ends_with(".commitlintrc.json"));
   }

   #[test]
   fn test_overrides() {
      let mut config = LintConfig::default();
      config.apply_overrides(|key| match key {
         "COMMIT_RULES_API_URL" => Some("https://api.example.com/v1".to_string()),
         "COMMIT_RULES_MODEL" => Some("local-model".to_string()),
         _ => None,
      });
      assert_eq!(config.api_base_url, "https://api.example.com/v1");
      assert_eq!(config.model, "local-model");
      assert!(config.api_key.is_none());
   }
}
