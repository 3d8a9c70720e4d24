//! Rule registry and the validate/fix protocol over whole messages or single
//! fields.
//!
//! Rules are kept in configuration order. Validation runs every rule and
//! never stops at the first failure. Fixing runs a per-part pipeline in
//! registration order where each rule consumes the previous rule's output,
//! then re-validates the result to report what could not be fixed.

use indexmap::IndexMap;
use tracing::{debug, trace};

use crate::{
   config::LintConfig,
   error::Result,
   message::{CommitMessage, split_items},
   report::{PartReport, Report},
   rules::{Cardinality, Rule},
   types::{CommitPart, RuleTuple},
};

pub const DEFAULT_SCOPE_DELIMITER: &str = ",";

#[derive(Debug, Clone)]
pub struct RulesEngine {
   rules:           Vec<Rule>,
   scope_delimiter: String,
}

impl RulesEngine {
   pub fn new(rules: Vec<Rule>) -> Self {
      Self { rules, scope_delimiter: DEFAULT_SCOPE_DELIMITER.to_string() }
   }

   pub fn with_scope_delimiter(mut self, delimiter: impl Into<String>) -> Self {
      self.scope_delimiter = delimiter.into();
      self
   }

   /// Build the engine from the rule table of a loaded configuration
   pub fn from_config(config: &LintConfig) -> Result<Self> {
      Self::from_rules(&config.rules, &config.scope_delimiter)
   }

   /// Build the engine from `name -> [severity, applicability, value]`
   /// entries. Any malformed entry fails the whole construction.
   pub fn from_rules(table: &IndexMap<String, RuleTuple>, scope_delimiter: &str) -> Result<Self> {
      let mut rules = Vec::with_capacity(table.len());
      for (name, tuple) in table {
         match Rule::from_config(name, tuple, scope_delimiter)? {
            Some(rule) => {
               debug!(rule = %rule, cardinality = ?rule.cardinality(), "registered rule");
               rules.push(rule);
            },
            None => trace!(rule = name.as_str(), "rule disabled"),
         }
      }
      Ok(Self::new(rules).with_scope_delimiter(scope_delimiter))
   }

   pub fn rules(&self) -> &[Rule] {
      &self.rules
   }

   pub fn is_empty(&self) -> bool {
      self.rules.is_empty()
   }

   pub fn scope_delimiter(&self) -> &str {
      &self.scope_delimiter
   }

   /// Governed parts, in order of first registration
   pub fn parts(&self) -> Vec<CommitPart> {
      let mut parts = Vec::new();
      for rule in &self.rules {
         if !parts.contains(&rule.part()) {
            parts.push(rule.part());
         }
      }
      parts
   }

   /// Engine restricted to the rules governing `part`, order preserved
   pub fn narrow(&self, part: CommitPart) -> Self {
      Self {
         rules:           self
            .rules
            .iter()
            .filter(|rule| rule.part() == part)
            .cloned()
            .collect(),
         scope_delimiter: self.scope_delimiter.clone(),
      }
   }

   /// Parse and validate a raw commit message
   pub fn lint(&self, raw: &str) -> Report {
      self.validate(&CommitMessage::parse(raw))
   }

   /// Run every rule against the message and collect all violations
   pub fn validate(&self, msg: &CommitMessage) -> Report {
      let mut report = Report::new();
      for rule in &self.rules {
         let part = report.part_mut(rule.part());
         match rule.cardinality() {
            Cardinality::Single => {
               if !rule.validate(&msg.text(rule.field())) {
                  part.push(rule.severity(), rule.describe());
               }
            },
            Cardinality::Multiple => {
               let items = msg.items(rule.field(), &self.scope_delimiter);
               if let Some(errors) = rule.validate_items(&items) {
                  part.push_items(rule.severity(), &errors);
               }
            },
         }
      }
      report
   }

   /// Apply every rule's fix, part by part, each rule seeing the output of
   /// the one before it. Returns the corrected copy and the residual report.
   pub fn fix(&self, msg: &CommitMessage) -> (CommitMessage, Report) {
      let mut fixed = msg.clone();
      for part in self.parts() {
         for rule in self.rules.iter().filter(|rule| rule.part() == part) {
            self.apply_fix(rule, &mut fixed);
         }
      }
      let report = self.validate(&fixed);
      (fixed, report)
   }

   fn apply_fix(&self, rule: &Rule, msg: &mut CommitMessage) {
      let field = rule.field();
      match rule.cardinality() {
         Cardinality::Single => {
            let value = msg.text(field);
            let (fixed, residual) = rule.fix(&value);
            if fixed != value {
               debug!(rule = rule.name(), before = ?value, after = ?fixed, "applied fix");
               msg.set_text(field, &fixed);
            }
            if let Some(residual) = residual {
               trace!(rule = rule.name(), residual = residual.as_str(), "not fixable");
            }
         },
         Cardinality::Multiple => {
            let items = msg.items(field, &self.scope_delimiter);
            let (residual, fixed) = rule.fix_items(&items);
            if fixed != items {
               debug!(rule = rule.name(), before = ?items, after = ?fixed, "applied fix");
               msg.set_items(field, fixed, &self.scope_delimiter);
            }
            if let Some(residual) = residual {
               trace!(rule = rule.name(), ?residual, "not fixable");
            }
         },
      }
   }

   /// Rules of `part` that read the value of `part` itself. Rules reading
   /// another field (the header, for the exclamation mark) need the whole
   /// message and are left to [`validate`](Self::validate).
   fn value_rules(&self, part: CommitPart) -> impl Iterator<Item = &Rule> {
      self
         .rules
         .iter()
         .filter(move |rule| rule.part() == part && rule.field() == part)
   }

   /// Validate one field value in isolation, e.g. while it is being typed
   pub fn validate_value(&self, part: CommitPart, value: &str) -> PartReport {
      let mut report = PartReport::default();
      for rule in self.value_rules(part) {
         match rule.cardinality() {
            Cardinality::Single => {
               if !rule.validate(value) {
                  report.push(rule.severity(), rule.describe());
               }
            },
            Cardinality::Multiple => {
               if let Some(errors) = rule.validate_items(&self.split_value(part, value)) {
                  report.push_items(rule.severity(), &errors);
               }
            },
         }
      }
      report
   }

   /// Validate one item of a repeatable part (the `index`-th scope, say)
   pub fn validate_item(&self, part: CommitPart, index: usize, value: &str) -> PartReport {
      let mut report = self.validate_value(part, value);
      report.filter = Some(format!("{part}[{index}]"));
      report
   }

   /// Fix one field value in isolation with the same pipeline as [`fix`]
   ///
   /// [`fix`]: Self::fix
   pub fn fix_value(&self, part: CommitPart, value: &str) -> (String, PartReport) {
      let mut current = value.to_string();
      for rule in self.value_rules(part) {
         current = match rule.cardinality() {
            Cardinality::Single => rule.fix(&current).0,
            Cardinality::Multiple => {
               let (_, items) = rule.fix_items(&self.split_value(part, &current));
               self.join_value(part, &items)
            },
         };
      }
      let report = self.validate_value(part, &current);
      (current, report)
   }

   fn split_value(&self, part: CommitPart, value: &str) -> Vec<String> {
      match part {
         CommitPart::Footer => value
            .lines()
            .filter(|line| !line.is_empty())
            .map(str::to_string)
            .collect(),
         _ if value.is_empty() => Vec::new(),
         _ => split_items(value, &self.scope_delimiter),
      }
   }

   fn join_value(&self, part: CommitPart, items: &[String]) -> String {
      match part {
         CommitPart::Footer => items.join("\n"),
         _ => items.join(&self.scope_delimiter),
      }
   }
}
