use std::{fmt, path::PathBuf, str::FromStr};

use clap::{Parser, Subcommand, ValueEnum};
use serde::{Deserialize, Serialize};

use crate::error::{LintError, Result};

/// Structural field of a commit message that a rule governs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CommitPart {
   Header,
   Type,
   Scope,
   Subject,
   Body,
   Footer,
   /// Body and footers together, as rendered after the header
   Trailer,
}

impl CommitPart {
   pub const ALL: &'static [Self] = &[
      Self::Header,
      Self::Type,
      Self::Scope,
      Self::Subject,
      Self::Body,
      Self::Footer,
      Self::Trailer,
   ];

   pub const fn as_str(&self) -> &'static str {
      match self {
         Self::Header => "header",
         Self::Type => "type",
         Self::Scope => "scope",
         Self::Subject => "subject",
         Self::Body => "body",
         Self::Footer => "footer",
         Self::Trailer => "trailer",
      }
   }

   /// Parts that hold an ordered list of values rather than one string
   pub const fn is_repeatable(&self) -> bool {
      matches!(self, Self::Scope | Self::Footer)
   }
}

impl fmt::Display for CommitPart {
   fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
      f.write_str(self.as_str())
   }
}

impl FromStr for CommitPart {
   type Err = LintError;

   fn from_str(s: &str) -> Result<Self> {
      Self::ALL
         .iter()
         .copied()
         .find(|part| part.as_str().eq_ignore_ascii_case(s))
         .ok_or_else(|| LintError::Other(format!("Unknown commit part '{s}'")))
   }
}

/// Polarity of a rule: whether its condition must hold or must not hold
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Applicability {
   #[default]
   Always,
   Never,
}

impl Applicability {
   pub const fn is_always(self) -> bool {
      matches!(self, Self::Always)
   }

   pub const fn flip(self) -> Self {
      match self {
         Self::Always => Self::Never,
         Self::Never => Self::Always,
      }
   }

   /// Modal verb used in rule descriptions
   pub const fn must(self) -> &'static str {
      match self {
         Self::Always => "must",
         Self::Never => "must not",
      }
   }
}

impl fmt::Display for Applicability {
   fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
      f.write_str(match self {
         Self::Always => "always",
         Self::Never => "never",
      })
   }
}

impl FromStr for Applicability {
   type Err = LintError;

   fn from_str(s: &str) -> Result<Self> {
      match s {
         "always" => Ok(Self::Always),
         "never" => Ok(Self::Never),
         other => Err(LintError::Other(format!(
            "applicability must be \"always\" or \"never\", got \"{other}\""
         ))),
      }
   }
}

/// Rule severity in the commitlint numbering (0 = off, 1 = warning, 2 = error)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
   Disabled,
   Warning,
   Error,
}

impl Severity {
   pub const fn from_level(level: i64) -> Option<Self> {
      match level {
         0 => Some(Self::Disabled),
         1 => Some(Self::Warning),
         2 => Some(Self::Error),
         _ => None,
      }
   }

   pub const fn level(self) -> u8 {
      match self {
         Self::Disabled => 0,
         Self::Warning => 1,
         Self::Error => 2,
      }
   }
}

impl fmt::Display for Severity {
   fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
      f.write_str(match self {
         Self::Disabled => "off",
         Self::Warning => "warning",
         Self::Error => "error",
      })
   }
}

/// One element of a rule tuple as written in a configuration file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RuleArg {
   Integer(i64),
   Text(String),
   List(Vec<String>),
}

impl RuleArg {
   fn kind(&self) -> &'static str {
      match self {
         Self::Integer(_) => "a number",
         Self::Text(_) => "a string",
         Self::List(_) => "a list of strings",
      }
   }
}

/// Rule configuration tuple: `[severity, applicability?, value?]`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RuleTuple(pub Vec<RuleArg>);

impl RuleTuple {
   pub fn new(severity: Severity, applicable: Applicability, value: Option<RuleArg>) -> Self {
      let mut args = vec![
         RuleArg::Integer(severity.level() as i64),
         RuleArg::Text(applicable.to_string()),
      ];
      args.extend(value);
      Self(args)
   }

   /// Decode the positional arguments, reporting problems against `rule`
   pub fn decode(&self, rule: &str) -> Result<(Severity, Applicability, Option<&RuleArg>)> {
      let severity = match self.0.first() {
         Some(RuleArg::Integer(level)) => Severity::from_level(*level).ok_or_else(|| {
            LintError::invalid_rule(rule, format!("severity must be 0, 1 or 2, got {level}"))
         })?,
         Some(other) => {
            return Err(LintError::invalid_rule(
               rule,
               format!("severity must be a number, got {}", other.kind()),
            ));
         },
         None => return Err(LintError::invalid_rule(rule, "empty rule configuration")),
      };

      let applicable = match self.0.get(1) {
         None => Applicability::Always,
         Some(RuleArg::Text(s)) => s
            .parse()
            .map_err(|e: LintError| LintError::invalid_rule(rule, e.to_string()))?,
         Some(other) => {
            return Err(LintError::invalid_rule(
               rule,
               format!("applicability must be a string, got {}", other.kind()),
            ));
         },
      };

      if self.0.len() > 3 {
         return Err(LintError::invalid_rule(
            rule,
            format!("expected at most 3 elements, got {}", self.0.len()),
         ));
      }

      Ok((severity, applicable, self.0.get(2)))
   }
}

/// Expected type of a rule's comparison value, used in configuration errors
pub(crate) fn expect_number(rule: &str, value: Option<&RuleArg>) -> Result<usize> {
   match value {
      Some(RuleArg::Integer(n)) if *n >= 0 => Ok(*n as usize),
      Some(RuleArg::Integer(n)) => {
         Err(LintError::invalid_rule(rule, format!("value must not be negative, got {n}")))
      },
      Some(other) => Err(LintError::invalid_rule(
         rule,
         format!("value must be a number, got {}", other.kind()),
      )),
      None => Err(LintError::invalid_rule(rule, "missing numeric value")),
   }
}

pub(crate) fn expect_text(rule: &str, value: Option<&RuleArg>) -> Result<String> {
   match value {
      Some(RuleArg::Text(s)) => Ok(s.clone()),
      Some(other) => Err(LintError::invalid_rule(
         rule,
         format!("value must be a string, got {}", other.kind()),
      )),
      None => Err(LintError::invalid_rule(rule, "missing string value")),
   }
}

pub(crate) fn expect_list(rule: &str, value: Option<&RuleArg>) -> Result<Vec<String>> {
   match value {
      Some(RuleArg::List(items)) => Ok(items.clone()),
      Some(other) => Err(LintError::invalid_rule(
         rule,
         format!("value must be a list of strings, got {}", other.kind()),
      )),
      None => Err(LintError::invalid_rule(rule, "missing list value")),
   }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
   /// Human-readable, coloured when supported
   #[default]
   Text,
   /// Machine-readable JSON report
   Json,
}

// CLI Args
#[derive(Parser, Debug)]
#[command(author, version, about = "Validate and auto-correct conventional commit messages", long_about = None)]
pub struct Args {
   #[command(subcommand)]
   pub command: Command,

   /// Path to config file (default: project commitlint file or
   /// ~/.config/commit-rules/config.toml)
   #[arg(long, global = true)]
   pub config: Option<PathBuf>,

   /// Directory to run git commands in
   #[arg(long, default_value = ".", global = true)]
   pub dir: String,

   /// Enable debug logging on stderr
   #[arg(long, short = 'v', global = true)]
   pub verbose: bool,
}

#[derive(Subcommand, Debug)]
pub enum Command {
   /// Lint a commit message from a file, stdin, or a revision range
   Lint {
      /// Message file (e.g. .git/COMMIT_EDITMSG); reads stdin when omitted
      file: Option<PathBuf>,

      /// Apply automatic fixes and write the corrected message back
      #[arg(long)]
      fix: bool,

      /// Lint every commit in a revision range (e.g. main..HEAD)
      #[arg(long, conflicts_with_all = ["file", "fix"])]
      range: Option<String>,

      /// Report format
      #[arg(long, value_enum, default_value = "text")]
      format: OutputFormat,
   },

   /// Draft a value for one commit part from the staged diff
   Suggest {
      /// Commit part to draft (type, scope, subject, body, footer)
      part: String,

      /// Commit type already chosen
      #[arg(long = "type")]
      commit_type: Option<String>,

      /// Scope already chosen
      #[arg(long)]
      scope: Option<String>,

      /// Subject already written
      #[arg(long)]
      subject: Option<String>,
   },

   /// List the configured rules
   Rules,
}

#[cfg(test)]
mod tests {
   use super::*;

   #[test]
   fn test_commit_part_round_trip_names() {
      for part in CommitPart::ALL {
         assert_eq!(part.as_str().parse::<CommitPart>().unwrap(), *part);
      }
      assert!("headline".parse::<CommitPart>().is_err());
   }

   #[test]
   fn test_repeatable_parts() {
      assert!(CommitPart::Scope.is_repeatable());
      assert!(CommitPart::Footer.is_repeatable());
      assert!(!CommitPart::Subject.is_repeatable());
      assert!(!CommitPart::Trailer.is_repeatable());
   }

   #[test]
   fn test_applicability_flip_and_modal() {
      assert_eq!(Applicability::Always.flip(), Applicability::Never);
      assert_eq!(Applicability::Never.flip(), Applicability::Always);
      assert_eq!(Applicability::Always.must(), "must");
      assert_eq!(Applicability::Never.must(), "must not");
   }

   #[test]
   fn test_rule_tuple_decode_full() {
      let tuple: RuleTuple = serde_json::from_str(r#"[2, "never", 72]"#).unwrap();
      let (severity, applicable, value) = tuple.decode("header-max-length").unwrap();
      assert_eq!(severity, Severity::Error);
      assert_eq!(applicable, Applicability::Never);
      assert_eq!(value, Some(&RuleArg::Integer(72)));
   }

   #[test]
   fn test_rule_tuple_decode_defaults_to_always() {
      let tuple: RuleTuple = serde_json::from_str("[1]").unwrap();
      let (severity, applicable, value) = tuple.decode("header-trim").unwrap();
      assert_eq!(severity, Severity::Warning);
      assert_eq!(applicable, Applicability::Always);
      assert!(value.is_none());
   }

   #[test]
   fn test_rule_tuple_decode_list_value() {
      let tuple: RuleTuple = serde_json::from_str(r#"[2, "always", ["feat", "fix"]]"#).unwrap();
      let (_, _, value) = tuple.decode("type-enum").unwrap();
      assert_eq!(value, Some(&RuleArg::List(vec!["feat".to_string(), "fix".to_string()])));
   }

   #[test]
   fn test_rule_tuple_decode_rejects_bad_severity() {
      let tuple: RuleTuple = serde_json::from_str(r#"[3, "always"]"#).unwrap();
      let err = tuple.decode("subject-empty").unwrap_err();
      assert!(matches!(err, LintError::InvalidRuleConfig { .. }));
      assert!(err.to_string().contains("severity must be 0, 1 or 2"));
   }

   #[test]
   fn test_rule_tuple_decode_rejects_bad_applicability() {
      let tuple: RuleTuple = serde_json::from_str(r#"[2, "sometimes"]"#).unwrap();
      let err = tuple.decode("subject-empty").unwrap_err();
      assert!(err.to_string().contains("\"always\" or \"never\""));
   }

   #[test]
   fn test_rule_tuple_from_toml() {
      #[derive(Deserialize)]
      struct Wrapper {
         rule: RuleTuple,
      }
      let wrapper: Wrapper = toml::from_str(r#"rule = [2, "always", "."]"#).unwrap();
      assert_eq!(
         wrapper.rule,
         RuleTuple::new(Severity::Error, Applicability::Always, Some(RuleArg::Text(".".into())))
      );
   }

   #[test]
   fn test_expect_value_types() {
      assert_eq!(expect_number("r", Some(&RuleArg::Integer(5))).unwrap(), 5);
      assert!(expect_number("r", Some(&RuleArg::Integer(-1))).is_err());
      assert!(expect_number("r", Some(&RuleArg::Text("5".into()))).is_err());
      assert!(expect_text("r", None).is_err());
      assert!(expect_list("r", Some(&RuleArg::Text("feat".into()))).is_err());
   }
}
