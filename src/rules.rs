//! Commit message rules.
//!
//! Every rule pairs one [`RuleKind`] (the condition it checks) with an
//! [`Applicability`] polarity. `Always` means the condition must hold for a
//! value to be valid, `Never` means it must not. The inversion lives in
//! [`Rule::validate`] and nowhere else.
//!
//! A rule runs in one of two cardinalities, resolved when it is built: a
//! single string (a subject, a header) or an ordered list of strings (several
//! scopes, several footer lines). List-mode results are keyed by item index.

use std::{collections::BTreeMap, fmt};

use crate::{
   error::{LintError, Result},
   message::CommitMessage,
   types::{
      Applicability, CommitPart, RuleArg, RuleTuple, Severity, expect_list, expect_number,
      expect_text,
   },
};

/// Errors of a list-mode rule, keyed by item index
pub type ItemErrors = BTreeMap<usize, String>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cardinality {
   Single,
   Multiple,
}

/// The closed set of conditions a rule can check
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuleKind {
   /// More than one non-empty item is present
   AllowMultiple { delimiter: String },
   MaxLength(usize),
   MinLength(usize),
   /// Every line is at most this many characters
   MaxLineLength(usize),
   /// Value equals its whitespace-stripped form
   Trim,
   /// Value is empty after trimming
   Empty,
   Enum(Vec<String>),
   /// Header contains `!:`
   ExclamationMark,
   FullStop(String),
   /// First line is empty
   LeadingBlank,
   Trailer(String),
}

type Constructor = fn(&str, Option<&RuleArg>, &str) -> Result<RuleKind>;

/// Configuration kind names and how to build each kind from its value
const CONSTRUCTORS: &[(&str, Constructor)] = &[
   ("allow-multiple", build_allow_multiple),
   ("max-length", build_max_length),
   ("min-length", build_min_length),
   ("max-line-length", build_max_line_length),
   ("trim", build_trim),
   ("empty", build_empty),
   ("enum", build_enum),
   ("exclamation-mark", build_exclamation_mark),
   ("full-stop", build_full_stop),
   ("leading-blank", build_leading_blank),
   ("exists", build_trailer),
];

fn build_allow_multiple(rule: &str, value: Option<&RuleArg>, delimiter: &str) -> Result<RuleKind> {
   let delimiter = match value {
      None => delimiter.to_string(),
      some => expect_text(rule, some)?,
   };
   Ok(RuleKind::AllowMultiple { delimiter })
}

fn build_max_length(rule: &str, value: Option<&RuleArg>, _: &str) -> Result<RuleKind> {
   expect_number(rule, value).map(RuleKind::MaxLength)
}

fn build_min_length(rule: &str, value: Option<&RuleArg>, _: &str) -> Result<RuleKind> {
   expect_number(rule, value).map(RuleKind::MinLength)
}

fn build_max_line_length(rule: &str, value: Option<&RuleArg>, _: &str) -> Result<RuleKind> {
   expect_number(rule, value).map(RuleKind::MaxLineLength)
}

fn build_trim(_: &str, _: Option<&RuleArg>, _: &str) -> Result<RuleKind> {
   Ok(RuleKind::Trim)
}

fn build_empty(_: &str, _: Option<&RuleArg>, _: &str) -> Result<RuleKind> {
   Ok(RuleKind::Empty)
}

fn build_enum(rule: &str, value: Option<&RuleArg>, _: &str) -> Result<RuleKind> {
   expect_list(rule, value).map(RuleKind::Enum)
}

fn build_exclamation_mark(_: &str, _: Option<&RuleArg>, _: &str) -> Result<RuleKind> {
   Ok(RuleKind::ExclamationMark)
}

fn build_full_stop(rule: &str, value: Option<&RuleArg>, _: &str) -> Result<RuleKind> {
   let stop = match value {
      None => ".".to_string(),
      some => expect_text(rule, some)?,
   };
   if stop.is_empty() {
      return Err(LintError::invalid_rule(rule, "full stop must not be empty"));
   }
   Ok(RuleKind::FullStop(stop))
}

fn build_leading_blank(_: &str, _: Option<&RuleArg>, _: &str) -> Result<RuleKind> {
   Ok(RuleKind::LeadingBlank)
}

fn build_trailer(rule: &str, value: Option<&RuleArg>, _: &str) -> Result<RuleKind> {
   let token = expect_text(rule, value)?;
   if token.is_empty() {
      return Err(LintError::invalid_rule(rule, "trailer token must not be empty"));
   }
   Ok(RuleKind::Trailer(token))
}

impl RuleKind {
   /// Build a kind from its configuration name (`max-length`, `enum`, ...)
   pub fn from_config(
      kind: &str,
      rule: &str,
      value: Option<&RuleArg>,
      delimiter: &str,
   ) -> Result<Self> {
      let (_, build) = CONSTRUCTORS
         .iter()
         .find(|(name, _)| *name == kind)
         .ok_or_else(|| LintError::UnknownRule { name: rule.to_string() })?;
      build(rule, value, delimiter)
   }

   /// Kinds that can check each item of a list separately
   pub const fn supports_multiple(&self) -> bool {
      matches!(
         self,
         Self::AllowMultiple { .. }
            | Self::MaxLength(_)
            | Self::MinLength(_)
            | Self::Trim
            | Self::Enum(_)
      )
   }

   /// The rule's core predicate, before polarity is applied
   pub fn holds(&self, value: &str) -> bool {
      match self {
         Self::AllowMultiple { delimiter } => count_segments(value, delimiter) > 1,
         Self::MaxLength(max) => value.chars().count() <= *max,
         Self::MinLength(min) => value.chars().count() >= *min,
         Self::MaxLineLength(max) => value.split('\n').all(|line| line.chars().count() <= *max),
         Self::Trim => value == value.trim(),
         Self::Empty => value.trim().is_empty(),
         Self::Enum(allowed) => allowed.iter().any(|a| a == value),
         Self::ExclamationMark => value.contains("!:"),
         Self::FullStop(stop) => value.ends_with(stop.as_str()),
         Self::LeadingBlank => value
            .split('\n')
            .next()
            .is_none_or(|first| first.trim_end_matches('\r').is_empty()),
         Self::Trailer(token) => value.contains(token.as_str()),
      }
   }

   /// An empty value passes these kinds under either polarity; presence is
   /// the job of an `empty` rule.
   const fn skips_empty(&self) -> bool {
      matches!(
         self,
         Self::AllowMultiple { .. }
            | Self::Enum(_)
            | Self::FullStop(_)
            | Self::LeadingBlank
            | Self::MaxLineLength(_)
      )
   }

   /// Mechanical repair of an invalid value, if one exists
   fn repair(&self, value: &str, applicable: Applicability) -> Option<String> {
      use Applicability::{Always, Never};

      match (self, applicable) {
         (Self::AllowMultiple { delimiter }, Never) => first_segment(value, delimiter),
         (Self::MaxLength(max), Always) => Some(value.chars().take(*max).collect()),
         (Self::MaxLineLength(max), Always) => Some(
            value
               .split('\n')
               .map(|line| line.chars().take(*max).collect::<String>())
               .collect::<Vec<_>>()
               .join("\n"),
         ),
         (Self::Trim, Always) => Some(value.trim().to_string()),
         (Self::Empty, Always) => Some(String::new()),
         (Self::ExclamationMark, Always) => match value.find(':') {
            Some(colon) if colon > 0 => {
               let mut fixed = value.to_string();
               fixed.insert(colon, '!');
               Some(fixed)
            },
            _ => None,
         },
         (Self::ExclamationMark, Never) => {
            let mut fixed = value.to_string();
            while fixed.contains("!:") {
               fixed = fixed.replace("!:", ":");
            }
            Some(fixed)
         },
         (Self::FullStop(stop), Always) => Some(format!("{value}{stop}")),
         (Self::FullStop(stop), Never) => Some(value.trim_end_matches(stop.as_str()).to_string()),
         (Self::LeadingBlank, Always) => Some(format!("\n{value}")),
         (Self::LeadingBlank, Never) => Some(value.trim_start_matches(['\n', '\r']).to_string()),
         (Self::Trailer(token), Always) => Some(append_trailer(value, token)),
         // Cannot lengthen, pad, invent content, guess enum members or
         // remove trailers safely.
         _ => None,
      }
   }

   fn phrase(&self) -> String {
      match self {
         Self::AllowMultiple { .. } => "contain multiple values".to_string(),
         Self::MaxLength(max) => format!("have at most {max} characters"),
         Self::MinLength(min) => format!("have at least {min} characters"),
         Self::MaxLineLength(max) => format!("have lines of at most {max} characters"),
         Self::Trim => "be free of leading and trailing whitespace".to_string(),
         Self::Empty => "be empty".to_string(),
         Self::Enum(allowed) => format!("be one of [{}]", allowed.join(", ")),
         Self::ExclamationMark => "contain an exclamation mark before the colon".to_string(),
         Self::FullStop(stop) => format!("end with \"{stop}\""),
         Self::LeadingBlank => "begin with a blank line".to_string(),
         Self::Trailer(token) => format!("contain the trailer \"{token}\""),
      }
   }
}

fn count_segments(value: &str, delimiter: &str) -> usize {
   if delimiter.is_empty() {
      return usize::from(!value.trim().is_empty());
   }
   value
      .split(delimiter)
      .filter(|segment| !segment.trim().is_empty())
      .count()
}

fn first_segment(value: &str, delimiter: &str) -> Option<String> {
   if delimiter.is_empty() {
      return None;
   }
   value
      .split(delimiter)
      .find(|segment| !segment.trim().is_empty())
      .map(str::to_string)
}

/// Append `token` to the footer block of a message tail. An existing block is
/// extended, otherwise a new one starts after exactly one blank line.
fn append_trailer(text: &str, token: &str) -> String {
   let mut tail = CommitMessage::default();
   tail.set_tail(text);
   tail.footers.push(token.to_string());
   tail.tail()
}

/// A configured rule bound to one commit part
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rule {
   name:        String,
   part:        CommitPart,
   kind:        RuleKind,
   applicable:  Applicability,
   severity:    Severity,
   cardinality: Cardinality,
}

impl Rule {
   /// Create an error-severity rule. Cardinality follows from the part and
   /// the kind.
   pub fn new(part: CommitPart, kind: RuleKind, applicable: Applicability) -> Self {
      let cardinality = if part.is_repeatable() && kind.supports_multiple() {
         Cardinality::Multiple
      } else {
         Cardinality::Single
      };
      Self {
         name: format!("{part}-{}", kind_name(&kind)),
         part,
         kind,
         applicable,
         severity: Severity::Error,
         cardinality,
      }
   }

   pub fn with_severity(mut self, severity: Severity) -> Self {
      self.severity = severity;
      self
   }

   /// Build a rule from a configuration entry such as
   /// `"header-max-length" = [2, "always", 72]`. Disabled rules are still
   /// checked for well-formedness and then yield `None`.
   pub fn from_config(name: &str, tuple: &RuleTuple, delimiter: &str) -> Result<Option<Self>> {
      let (part, kind_name) = if name == "trailer-exists" {
         (CommitPart::Trailer, "exists")
      } else {
         let (part, kind) = name
            .split_once('-')
            .ok_or_else(|| LintError::UnknownRule { name: name.to_string() })?;
         let part = part
            .parse::<CommitPart>()
            .map_err(|_| LintError::UnknownRule { name: name.to_string() })?;
         (part, kind)
      };

      let (severity, applicable, value) = tuple.decode(name)?;
      let kind = RuleKind::from_config(kind_name, name, value, delimiter)?;

      if severity == Severity::Disabled {
         return Ok(None);
      }

      let mut rule = Self::new(part, kind, applicable).with_severity(severity);
      rule.name = name.to_string();
      Ok(Some(rule))
   }

   pub fn name(&self) -> &str {
      &self.name
   }

   pub const fn part(&self) -> CommitPart {
      self.part
   }

   pub const fn kind(&self) -> &RuleKind {
      &self.kind
   }

   pub const fn applicable(&self) -> Applicability {
      self.applicable
   }

   pub const fn severity(&self) -> Severity {
      self.severity
   }

   pub const fn cardinality(&self) -> Cardinality {
      self.cardinality
   }

   /// The message field this rule reads. The exclamation mark lives in the
   /// header whichever part the rule is reported under.
   pub fn field(&self) -> CommitPart {
      match self.kind {
         RuleKind::ExclamationMark => CommitPart::Header,
         _ => self.part,
      }
   }

   /// Same rule with the opposite polarity
   pub fn inverted(&self) -> Self {
      Self { applicable: self.applicable.flip(), ..self.clone() }
   }

   /// Human-readable statement of what a valid value looks like
   pub fn describe(&self) -> String {
      format!("{} {} {}", self.part, self.applicable.must(), self.kind.phrase())
   }

   fn describe_item(&self, item: &str) -> String {
      format!("{} \"{item}\" {} {}", self.part, self.applicable.must(), self.kind.phrase())
   }

   /// Check a single value
   pub fn validate(&self, value: &str) -> bool {
      if value.is_empty() && self.kind.skips_empty() {
         return true;
      }
      self.kind.holds(value) == self.applicable.is_always()
   }

   /// Fix a single value. Returns the corrected value and, when no
   /// mechanical fix resolves the violation, the residual error.
   pub fn fix(&self, value: &str) -> (String, Option<String>) {
      if self.validate(value) {
         return (value.to_string(), None);
      }
      let fixed = self
         .kind
         .repair(value, self.applicable)
         .unwrap_or_else(|| value.to_string());
      let residual = (!self.validate(&fixed)).then(|| self.describe());
      (fixed, residual)
   }

   /// Check a list of values. `None` when every item is valid.
   pub fn validate_items(&self, items: &[String]) -> Option<ItemErrors> {
      let errors: ItemErrors = match &self.kind {
         RuleKind::AllowMultiple { .. } => self.multiplicity_errors(items),
         _ => items
            .iter()
            .enumerate()
            .filter(|(_, item)| !self.validate(item))
            .map(|(index, item)| (index, self.describe_item(item)))
            .collect(),
      };
      (!errors.is_empty()).then_some(errors)
   }

   /// Fix a list of values, returning residual errors and the fixed items
   pub fn fix_items(&self, items: &[String]) -> (Option<ItemErrors>, Vec<String>) {
      let fixed: Vec<String> = match (&self.kind, self.applicable) {
         (RuleKind::AllowMultiple { .. }, Applicability::Never) => items
            .iter()
            .find(|item| !item.trim().is_empty())
            .cloned()
            .into_iter()
            .collect(),
         (RuleKind::AllowMultiple { .. }, Applicability::Always) => items.to_vec(),
         _ => items.iter().map(|item| self.fix(item).0).collect(),
      };
      (self.validate_items(&fixed), fixed)
   }

   fn multiplicity_errors(&self, items: &[String]) -> ItemErrors {
      let present: Vec<usize> = items
         .iter()
         .enumerate()
         .filter(|(_, item)| !item.trim().is_empty())
         .map(|(index, _)| index)
         .collect();

      let multiple = present.len() > 1;
      if present.is_empty() || multiple == self.applicable.is_always() {
         return ItemErrors::new();
      }

      match self.applicable {
         Applicability::Always => ItemErrors::from([(0, self.describe())]),
         Applicability::Never => present
            .into_iter()
            .skip(1)
            .map(|index| (index, self.describe()))
            .collect(),
      }
   }
}

impl fmt::Display for Rule {
   fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
      write!(f, "{} [{}, {}]", self.name, self.severity, self.applicable)
   }
}

fn kind_name(kind: &RuleKind) -> &'static str {
   match kind {
      RuleKind::AllowMultiple { .. } => "allow-multiple",
      RuleKind::MaxLength(_) => "max-length",
      RuleKind::MinLength(_) => "min-length",
      RuleKind::MaxLineLength(_) => "max-line-length",
      RuleKind::Trim => "trim",
      RuleKind::Empty => "empty",
      RuleKind::Enum(_) => "enum",
      RuleKind::ExclamationMark => "exclamation-mark",
      RuleKind::FullStop(_) => "full-stop",
      RuleKind::LeadingBlank => "leading-blank",
      RuleKind::Trailer(_) => "exists",
   }
}

#[cfg(test)]
mod tests {
   use proptest::prelude::*;

   use super::*;
   use crate::types::Applicability::{Always, Never};

   fn rule(part: CommitPart, kind: RuleKind, applicable: Applicability) -> Rule {
      Rule::new(part, kind, applicable)
   }

   fn items(values: &[&str]) -> Vec<String> {
      values.iter().map(|s| s.to_string()).collect()
   }

   #[test]
   fn test_max_length_truncates_to_prefix() {
      let r = rule(CommitPart::Subject, RuleKind::MaxLength(10), Always);
      assert!(!r.validate("this is too long"));
      let (fixed, residual) = r.fix("this is too long");
      assert_eq!(fixed, "this is to");
      assert_eq!(fixed.chars().count(), 10);
      assert!(residual.is_none());
      assert!(r.validate(&fixed));
   }

   #[test]
   fn test_max_length_never_cannot_lengthen() {
      let r = rule(CommitPart::Subject, RuleKind::MaxLength(10), Never);
      let (fixed, residual) = r.fix("short");
      assert_eq!(fixed, "short");
      assert_eq!(residual.as_deref(), Some("subject must not have at most 10 characters"));
   }

   #[test]
   fn test_max_length_counts_chars_not_bytes() {
      let r = rule(CommitPart::Subject, RuleKind::MaxLength(3), Always);
      assert!(r.validate("äöü"));
      assert_eq!(r.fix("äöüß").0, "äöü");
   }

   #[test]
   fn test_min_length_is_not_fixable() {
      let r = rule(CommitPart::Subject, RuleKind::MinLength(5), Always);
      assert!(!r.validate("hi"));
      let (fixed, residual) = r.fix("hi");
      assert_eq!(fixed, "hi");
      assert_eq!(residual, Some(r.describe()));
      assert!(r.validate("hello"));
   }

   #[test]
   fn test_max_line_length_truncates_each_line() {
      let r = rule(CommitPart::Body, RuleKind::MaxLineLength(5), Always);
      let (fixed, residual) = r.fix("\nabcdefgh\nok\nlonger line\n");
      assert_eq!(fixed, "\nabcde\nok\nlonge\n");
      assert!(residual.is_none());
      assert_eq!(r.fix("fine\nok").0, "fine\nok");
   }

   #[test]
   fn test_trim_strips_whitespace() {
      let r = rule(CommitPart::Header, RuleKind::Trim, Always);
      assert!(!r.validate("  feat: x "));
      assert_eq!(r.fix("  feat: x "), ("feat: x".to_string(), None));
      let never = r.inverted();
      assert!(never.validate(" padded"));
      assert_eq!(never.fix("tight"), ("tight".to_string(), Some(never.describe())));
   }

   #[test]
   fn test_allow_multiple_never_keeps_first_segment() {
      let r = rule(
         CommitPart::Subject,
         RuleKind::AllowMultiple { delimiter: ",".into() },
         Never,
      );
      assert!(!r.validate("a,b,c"));
      assert_eq!(r.fix("a,b,c"), ("a".to_string(), None));
      assert!(r.validate("a"));
      assert_eq!(r.fix("a"), ("a".to_string(), None));
   }

   #[test]
   fn test_allow_multiple_ignores_empty_segments() {
      let r = rule(
         CommitPart::Subject,
         RuleKind::AllowMultiple { delimiter: ",".into() },
         Never,
      );
      assert!(r.validate("a,,"));
      assert!(r.validate(",a, "));
      assert_eq!(r.fix(",,a,b").0, "a");
   }

   #[test]
   fn test_allow_multiple_always_is_a_no_op_fix() {
      let r = rule(
         CommitPart::Subject,
         RuleKind::AllowMultiple { delimiter: ",".into() },
         Always,
      );
      assert!(r.validate("a,b"));
      let (fixed, residual) = r.fix("a");
      assert_eq!(fixed, "a");
      assert!(residual.is_some());
   }

   #[test]
   fn test_allow_multiple_list_mode() {
      let r = rule(
         CommitPart::Scope,
         RuleKind::AllowMultiple { delimiter: ",".into() },
         Never,
      );
      assert_eq!(r.cardinality(), Cardinality::Multiple);
      let errors = r.validate_items(&items(&["api", "core", "ui"])).unwrap();
      assert_eq!(errors.keys().copied().collect::<Vec<_>>(), vec![1, 2]);
      assert!(r.validate_items(&items(&["api"])).is_none());
      assert!(r.validate_items(&[]).is_none());

      let (residual, fixed) = r.fix_items(&items(&["", "api", "core"]));
      assert!(residual.is_none());
      assert_eq!(fixed, items(&["api"]));
   }

   #[test]
   fn test_empty_rule() {
      let r = rule(CommitPart::Subject, RuleKind::Empty, Never);
      assert!(!r.validate("   "));
      assert_eq!(r.fix(""), (String::new(), Some("subject must not be empty".to_string())));
      let always = r.inverted();
      assert_eq!(always.fix("text"), (String::new(), None));
   }

   #[test]
   fn test_enum_empty_is_vacuously_valid() {
      let r = rule(CommitPart::Type, RuleKind::Enum(items(&["feat", "fix"])), Always);
      assert!(r.validate(""));
      assert!(r.inverted().validate(""));
      assert!(r.validate("fix"));
      assert!(!r.validate("feature"));
      assert_eq!(r.fix("feature"), ("feature".to_string(), Some(r.describe())));
      assert_eq!(r.describe(), "type must be one of [feat, fix]");
   }

   #[test]
   fn test_enum_list_mode_reports_by_index() {
      let r = rule(CommitPart::Scope, RuleKind::Enum(items(&["api", "core"])), Always);
      let errors = r.validate_items(&items(&["api", "web", "core", "cli"])).unwrap();
      assert_eq!(errors.len(), 2);
      assert_eq!(errors[&1], "scope \"web\" must be one of [api, core]");
      assert!(errors.contains_key(&3));
   }

   #[test]
   fn test_exclamation_mark_insert_and_remove() {
      let always = rule(CommitPart::Header, RuleKind::ExclamationMark, Always);
      assert_eq!(always.fix("feat(api): x").0, "feat(api)!: x");
      assert!(always.validate("feat!: x"));

      let never = always.inverted();
      assert_eq!(never.fix("feat(api)!: x"), ("feat(api): x".to_string(), None));
   }

   #[test]
   fn test_exclamation_mark_needs_colon_after_start() {
      let always = rule(CommitPart::Header, RuleKind::ExclamationMark, Always);
      assert_eq!(always.fix("no colon here").0, "no colon here");
      assert_eq!(always.fix(": leading colon").0, ": leading colon");
      assert!(always.fix(": leading colon").1.is_some());
   }

   #[test]
   fn test_exclamation_mark_reads_header() {
      let r = rule(CommitPart::Subject, RuleKind::ExclamationMark, Never);
      assert_eq!(r.field(), CommitPart::Header);
      assert_eq!(rule(CommitPart::Subject, RuleKind::Trim, Always).field(), CommitPart::Subject);
   }

   #[test]
   fn test_full_stop() {
      let always = rule(CommitPart::Subject, RuleKind::FullStop(".".into()), Always);
      assert_eq!(always.fix("add retries").0, "add retries.");
      let never = always.inverted();
      assert_eq!(never.fix("add retries.").0, "add retries");
      assert_eq!(never.fix("wait...").0, "wait");
      assert!(never.validate(""));
      assert!(always.validate(""));
   }

   #[test]
   fn test_leading_blank() {
      let always = rule(CommitPart::Body, RuleKind::LeadingBlank, Always);
      assert!(always.validate("\nBody"));
      assert_eq!(always.fix("Body").0, "\nBody");
      let never = always.inverted();
      assert_eq!(never.fix("\n\nBody").0, "Body");
      assert!(never.validate("Body"));
   }

   #[test]
   fn test_trailer_appends_after_one_blank_line() {
      let r = rule(CommitPart::Trailer, RuleKind::Trailer("BREAKING CHANGE:".into()), Always);
      assert_eq!(r.fix("body text").0, "body text\n\nBREAKING CHANGE:");
      assert_eq!(r.fix("body text\n").0, "body text\n\nBREAKING CHANGE:");
      assert_eq!(r.fix("body text\n\n").0, "body text\n\nBREAKING CHANGE:");
      assert!(r.fix("body text").1.is_none());
   }

   #[test]
   fn test_trailer_joins_existing_footer_block() {
      let r = rule(CommitPart::Trailer, RuleKind::Trailer("Signed-off-by: me".into()), Always);
      assert_eq!(r.fix("").0, "\nSigned-off-by: me");
      assert_eq!(r.fix("\nRefs #1").0, "\nRefs #1\nSigned-off-by: me");
      assert_eq!(r.fix("\nBody\n\nRefs #1\n").0, "\nBody\n\nRefs #1\nSigned-off-by: me");
   }

   #[test]
   fn test_trailer_never_is_reported_not_removed() {
      let r = rule(CommitPart::Trailer, RuleKind::Trailer("Signed-off-by:".into()), Never);
      let text = "body\n\nSigned-off-by: me";
      assert!(!r.validate(text));
      assert_eq!(r.fix(text), (text.to_string(), Some(r.describe())));
   }

   #[test]
   fn test_describe_tracks_polarity() {
      let r = rule(CommitPart::Header, RuleKind::MaxLength(72), Always);
      assert_eq!(r.describe(), "header must have at most 72 characters");
      assert_eq!(r.inverted().describe(), "header must not have at most 72 characters");
   }

   #[test]
   fn test_cardinality_resolution() {
      assert_eq!(
         rule(CommitPart::Scope, RuleKind::MaxLength(5), Always).cardinality(),
         Cardinality::Multiple
      );
      assert_eq!(
         rule(CommitPart::Scope, RuleKind::FullStop(".".into()), Always).cardinality(),
         Cardinality::Single
      );
      assert_eq!(
         rule(CommitPart::Subject, RuleKind::MaxLength(5), Always).cardinality(),
         Cardinality::Single
      );
      assert_eq!(
         rule(CommitPart::Footer, RuleKind::Trim, Always).cardinality(),
         Cardinality::Multiple
      );
   }

   #[test]
   fn test_list_mode_fix_truncates_each_item() {
      let r = rule(CommitPart::Scope, RuleKind::MaxLength(4), Always);
      let (residual, fixed) = r.fix_items(&items(&["api", "database"]));
      assert!(residual.is_none());
      assert_eq!(fixed, items(&["api", "data"]));

      let min = rule(CommitPart::Scope, RuleKind::MinLength(3), Always);
      let (residual, fixed) = min.fix_items(&items(&["api", "db"]));
      assert_eq!(fixed, items(&["api", "db"]));
      assert_eq!(residual.unwrap().keys().copied().collect::<Vec<_>>(), vec![1]);
   }

   #[test]
   fn test_from_config_builds_rules() {
      let tuple = RuleTuple::new(Severity::Warning, Never, Some(RuleArg::Text(".".into())));
      let rule = Rule::from_config("subject-full-stop", &tuple, ",").unwrap().unwrap();
      assert_eq!(rule.part(), CommitPart::Subject);
      assert_eq!(rule.kind(), &RuleKind::FullStop(".".into()));
      assert_eq!(rule.severity(), Severity::Warning);
      assert_eq!(rule.name(), "subject-full-stop");

      let tuple = RuleTuple::new(Severity::Error, Always, Some(RuleArg::Text("Refs".into())));
      let rule = Rule::from_config("trailer-exists", &tuple, ",").unwrap().unwrap();
      assert_eq!(rule.part(), CommitPart::Trailer);

      let tuple = RuleTuple::new(Severity::Error, Never, None);
      let rule = Rule::from_config("scope-allow-multiple", &tuple, "/").unwrap().unwrap();
      assert_eq!(rule.kind(), &RuleKind::AllowMultiple { delimiter: "/".into() });
   }

   #[test]
   fn test_from_config_disabled_rule_is_skipped_but_checked() {
      let tuple = RuleTuple::new(Severity::Disabled, Always, Some(RuleArg::Integer(10)));
      assert!(Rule::from_config("header-max-length", &tuple, ",").unwrap().is_none());

      let bad = RuleTuple::new(Severity::Disabled, Always, Some(RuleArg::Text("ten".into())));
      assert!(Rule::from_config("header-max-length", &bad, ",").is_err());
   }

   #[test]
   fn test_from_config_rejects_unknown_rules() {
      let tuple = RuleTuple::new(Severity::Error, Always, None);
      for name in ["subject-shouting", "headline-trim", "trim"] {
         let err = Rule::from_config(name, &tuple, ",").unwrap_err();
         assert!(matches!(err, LintError::UnknownRule { .. }), "{name}");
      }
   }

   #[test]
   fn test_from_config_rejects_wrong_value_type() {
      let tuple = RuleTuple::new(Severity::Error, Always, Some(RuleArg::Integer(3)));
      let err = Rule::from_config("type-enum", &tuple, ",").unwrap_err();
      assert!(matches!(err, LintError::InvalidRuleConfig { .. }));
      let missing = RuleTuple::new(Severity::Error, Always, None);
      assert!(Rule::from_config("body-max-line-length", &missing, ",").is_err());
   }

   fn sample_kinds() -> Vec<(CommitPart, RuleKind)> {
      vec![
         (CommitPart::Subject, RuleKind::AllowMultiple { delimiter: ",".into() }),
         (CommitPart::Subject, RuleKind::MaxLength(8)),
         (CommitPart::Subject, RuleKind::MinLength(4)),
         (CommitPart::Body, RuleKind::MaxLineLength(6)),
         (CommitPart::Subject, RuleKind::Trim),
         (CommitPart::Subject, RuleKind::Empty),
         (CommitPart::Type, RuleKind::Enum(vec!["feat".into(), "fix".into()])),
         (CommitPart::Header, RuleKind::ExclamationMark),
         (CommitPart::Subject, RuleKind::FullStop(".".into())),
         (CommitPart::Body, RuleKind::LeadingBlank),
         (CommitPart::Trailer, RuleKind::Trailer("Refs:".into())),
      ]
   }

   proptest! {
      #[test]
      fn prop_polarity_flips_validity(value in "[a-z !:.,\n]{1,24}") {
         for (part, kind) in sample_kinds() {
            let always = Rule::new(part, kind, Always);
            prop_assert_ne!(always.validate(&value), always.inverted().validate(&value));
         }
      }

      #[test]
      fn prop_fix_without_residual_is_valid(value in "[a-z !:.,\n]{0,24}") {
         for (part, kind) in sample_kinds() {
            for applicable in [Always, Never] {
               let r = Rule::new(part, kind.clone(), applicable);
               let (fixed, residual) = r.fix(&value);
               if residual.is_none() {
                  prop_assert!(r.validate(&fixed), "{} on {:?} -> {:?}", r.describe(), value, fixed);
               } else {
                  prop_assert!(!r.validate(&fixed));
               }
            }
         }
      }

      #[test]
      fn prop_list_fix_without_residual_is_valid(values in proptest::collection::vec("[a-z ]{0,8}", 0..5)) {
         for kind in [
            RuleKind::AllowMultiple { delimiter: ",".into() },
            RuleKind::MaxLength(3),
            RuleKind::Trim,
         ] {
            for applicable in [Always, Never] {
               let r = Rule::new(CommitPart::Scope, kind.clone(), applicable);
               let (residual, fixed) = r.fix_items(&values);
               if residual.is_none() {
                  prop_assert!(r.validate_items(&fixed).is_none());
               }
            }
         }
      }
   }
}
