use indexmap::IndexMap;
use serde::Serialize;

use crate::{
   rules::ItemErrors,
   types::{CommitPart, Severity},
};

/// Errors and warnings collected for one commit part
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PartReport {
   pub errors:   Vec<String>,
   pub warnings: Vec<String>,
   /// Sub-scope the messages apply to, e.g. `scope[1]`
   #[serde(skip_serializing_if = "Option::is_none")]
   pub filter:   Option<String>,
}

impl PartReport {
   pub fn is_valid(&self) -> bool {
      self.errors.is_empty()
   }

   pub fn is_empty(&self) -> bool {
      self.errors.is_empty() && self.warnings.is_empty()
   }

   pub fn push(&mut self, severity: Severity, message: String) {
      match severity {
         Severity::Error => self.errors.push(message),
         Severity::Warning => self.warnings.push(message),
         Severity::Disabled => {},
      }
   }

   /// Flatten item-indexed errors into ordered messages
   pub fn push_items(&mut self, severity: Severity, items: &ItemErrors) {
      for (index, message) in items {
         self.push(severity, format!("[{index}] {message}"));
      }
   }
}

/// Validation report keyed by commit part, in rule registration order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Report {
   parts: IndexMap<CommitPart, PartReport>,
}

impl Report {
   pub fn new() -> Self {
      Self::default()
   }

   pub fn part_mut(&mut self, part: CommitPart) -> &mut PartReport {
      self.parts.entry(part).or_default()
   }

   pub fn get(&self, part: CommitPart) -> Option<&PartReport> {
      self.parts.get(&part)
   }

   pub fn record(&mut self, part: CommitPart, severity: Severity, message: String) {
      self.part_mut(part).push(severity, message);
   }

   /// Parts with at least one message, in order
   pub fn iter(&self) -> impl Iterator<Item = (CommitPart, &PartReport)> {
      self
         .parts
         .iter()
         .filter(|(_, report)| !report.is_empty())
         .map(|(part, report)| (*part, report))
   }

   pub fn is_valid(&self) -> bool {
      self.parts.values().all(PartReport::is_valid)
   }

   pub fn is_empty(&self) -> bool {
      self.parts.values().all(PartReport::is_empty)
   }

   pub fn error_count(&self) -> usize {
      self.parts.values().map(|r| r.errors.len()).sum()
   }

   pub fn warning_count(&self) -> usize {
      self.parts.values().map(|r| r.warnings.len()).sum()
   }
}
