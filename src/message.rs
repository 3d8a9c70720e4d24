//! Structured commit message model.
//!
//! A message is split into a header (`type(scope)!: subject`), a body kept
//! verbatim (including the blank line that separates it from the header) and
//! a trailing block of footers/trailers. Parsing and formatting are inverses
//! for every message the model can represent.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::types::CommitPart;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitMessage {
   #[serde(rename = "type")]
   pub commit_type: Option<String>,
   pub scope:       Option<String>,
   pub subject:     Option<String>,
   /// Text between the header line and the footer block, verbatim
   pub body:        Option<String>,
   pub breaking:    bool,
   pub footers:     Vec<String>,
}

impl CommitMessage {
   /// Parse a full commit message. Lines starting with `#` are git template
   /// comments and are dropped.
   pub fn parse(raw: &str) -> Self {
      let text = raw
         .lines()
         .map(|line| line.strip_suffix('\r').unwrap_or(line))
         .filter(|line| !line.starts_with('#'))
         .collect::<Vec<_>>()
         .join("\n");

      let (header, tail) = text.split_once('\n').unwrap_or((text.as_str(), ""));
      let mut msg = Self::parse_header(header);
      msg.set_tail(tail);
      msg
   }

   /// Parse a header line of the form `type(scope)!: subject`. Anything that
   /// does not have that shape becomes the subject.
   pub fn parse_header(header: &str) -> Self {
      let mut msg = Self::default();
      let prefix = header
         .find(':')
         .and_then(|colon| split_prefix(&header[..colon]).map(|prefix| (colon, prefix)));

      let Some((colon, (commit_type, scope, breaking))) = prefix else {
         msg.subject = non_empty(header);
         return msg;
      };

      msg.commit_type = commit_type;
      msg.scope = scope;
      msg.breaking = breaking;

      let rest = &header[colon + 1..];
      if !rest.is_empty() {
         msg.subject = Some(rest.strip_prefix(' ').unwrap_or(rest).to_string());
      }
      msg
   }

   /// Render the header line. `:` is only emitted after a type or scope.
   ///
   /// Without a type or scope the header is the bare subject, so two shapes
   /// do not survive a [`parse_header`](Self::parse_header) round trip: a
   /// subject that itself starts with a conventional prefix (`note: x`
   /// parses back as type `note`), and a breaking flag, which is dropped.
   pub fn format_header(&self) -> String {
      let mut header = String::new();
      if let Some(commit_type) = &self.commit_type {
         header.push_str(commit_type);
      }
      if let Some(scope) = &self.scope {
         header.push('(');
         header.push_str(scope);
         header.push(')');
      }

      if self.commit_type.is_some() || self.scope.is_some() {
         if self.breaking {
            header.push('!');
         }
         header.push(':');
         if let Some(subject) = &self.subject {
            header.push(' ');
            header.push_str(subject);
         }
      } else if let Some(subject) = &self.subject {
         header.push_str(subject);
      }
      header
   }

   /// Render the full message
   pub fn format(&self) -> String {
      let mut out = self.format_header();
      let tail = self.tail();
      if !tail.is_empty() {
         out.push('\n');
         out.push_str(&tail);
      }
      out
   }

   /// Everything after the header line: body, then footers after one blank
   /// line
   pub fn tail(&self) -> String {
      let mut tail = self.body.clone().unwrap_or_default();
      if !self.footers.is_empty() {
         let kept = tail.trim_end_matches('\n').len();
         tail.truncate(kept);
         tail.push_str(if tail.is_empty() { "\n" } else { "\n\n" });
         tail.push_str(&self.footers.join("\n"));
      }
      tail
   }

   /// Replace body and footers from the text that follows the header line.
   /// The last paragraph becomes the footer block when every line in it
   /// looks like a trailer.
   pub fn set_tail(&mut self, tail: &str) {
      let trimmed = tail.trim_end_matches('\n');
      let (body, block) = match trimmed.rfind("\n\n") {
         Some(i) => (&trimmed[..i], &trimmed[i + 2..]),
         None => match trimmed.strip_prefix('\n') {
            Some(block) => ("", block),
            None => (trimmed, ""),
         },
      };

      if !block.is_empty() && block.lines().all(is_trailer_line) {
         self.body = non_empty(body);
         self.footers = block.lines().map(str::to_string).collect();
      } else {
         self.body = non_empty(trimmed);
         self.footers.clear();
      }
   }

   /// Scalar text of one part, as rules see it
   pub fn text(&self, part: CommitPart) -> String {
      match part {
         CommitPart::Header => self.format_header(),
         CommitPart::Type => self.commit_type.clone().unwrap_or_default(),
         CommitPart::Scope => self.scope.clone().unwrap_or_default(),
         CommitPart::Subject => self.subject.clone().unwrap_or_default(),
         CommitPart::Body => self.body.clone().unwrap_or_default(),
         CommitPart::Footer if self.footers.is_empty() => String::new(),
         CommitPart::Footer => format!("\n{}", self.footers.join("\n")),
         CommitPart::Trailer => self.tail(),
      }
   }

   /// Write back the scalar text of one part
   pub fn set_text(&mut self, part: CommitPart, value: &str) {
      match part {
         CommitPart::Header => {
            let parsed = Self::parse_header(value);
            self.commit_type = parsed.commit_type;
            self.scope = parsed.scope;
            self.subject = parsed.subject;
            self.breaking = parsed.breaking;
         },
         CommitPart::Type => self.commit_type = non_empty(value),
         CommitPart::Scope => self.scope = non_empty(value),
         CommitPart::Subject => self.subject = non_empty(value),
         CommitPart::Body => self.body = non_empty(value),
         CommitPart::Footer => {
            self.footers = value
               .lines()
               .filter(|line| !line.is_empty())
               .map(str::to_string)
               .collect();
         },
         CommitPart::Trailer => self.set_tail(value),
      }
   }

   /// List view of a repeatable part. Scopes are split on `delimiter`.
   pub fn items(&self, part: CommitPart, delimiter: &str) -> Vec<String> {
      match part {
         CommitPart::Scope => self
            .scope
            .as_deref()
            .map(|scope| split_items(scope, delimiter))
            .unwrap_or_default(),
         CommitPart::Footer => self.footers.clone(),
         other => vec![self.text(other)],
      }
   }

   pub fn set_items(&mut self, part: CommitPart, items: Vec<String>, delimiter: &str) {
      match part {
         CommitPart::Scope if items.is_empty() => self.scope = None,
         CommitPart::Scope => self.scope = Some(items.join(delimiter)),
         CommitPart::Footer => self.footers = items,
         other => self.set_text(other, &items.join("\n")),
      }
   }
}

impl fmt::Display for CommitMessage {
   fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
      f.write_str(&self.format())
   }
}

/// Split a delimited value into items; an empty delimiter yields one item
pub fn split_items(value: &str, delimiter: &str) -> Vec<String> {
   if delimiter.is_empty() {
      return vec![value.to_string()];
   }
   value.split(delimiter).map(str::to_string).collect()
}

fn non_empty(s: &str) -> Option<String> {
   (!s.is_empty()).then(|| s.to_string())
}

/// Split `type(scope)!` into its components. Returns `None` when the text
/// is not a conventional prefix (e.g. contains spaces).
fn split_prefix(prefix: &str) -> Option<(Option<String>, Option<String>, bool)> {
   let (prefix, breaking) = match prefix.strip_suffix('!') {
      Some(rest) => (rest, true),
      None => (prefix, false),
   };

   let (commit_type, scope) = match prefix.find('(') {
      Some(open) => {
         let scope = prefix[open + 1..].strip_suffix(')')?;
         if scope.contains(['(', ')', '\n']) {
            return None;
         }
         (&prefix[..open], Some(scope.to_string()))
      },
      None => (prefix, None),
   };

   let valid_type = commit_type
      .chars()
      .all(|c| c.is_alphanumeric() || c == '-' || c == '_');
   if !valid_type || (commit_type.is_empty() && scope.is_none()) {
      return None;
   }

   Some((non_empty(commit_type), scope, breaking))
}

/// `Token: value`, `Token #value` or a breaking-change note
pub fn is_trailer_line(line: &str) -> bool {
   if line.starts_with("BREAKING CHANGE:") || line.starts_with("BREAKING-CHANGE:") {
      return true;
   }
   let token_end = line
      .find(|c: char| !(c.is_ascii_alphanumeric() || c == '-'))
      .unwrap_or(line.len());
   if token_end == 0 {
      return false;
   }
   let rest = &line[token_end..];
   rest == ":" || rest.starts_with(": ") || rest.starts_with(" #")
}

/// A value paired with an optional presentation function. Validation and
/// fixing only ever see the raw text.
#[derive(Clone)]
pub struct DisplayValue {
   raw:    String,
   render: Option<fn(&str) -> String>,
}

impl DisplayValue {
   pub fn new(raw: impl Into<String>) -> Self {
      Self { raw: raw.into(), render: None }
   }

   pub fn styled(raw: impl Into<String>, render: fn(&str) -> String) -> Self {
      Self { raw: raw.into(), render: Some(render) }
   }

   pub fn raw(&self) -> &str {
      &self.raw
   }

   /// Presentation form; falls back to the raw text when unstyled
   pub fn render(&self) -> String {
      self.render.map_or_else(|| self.raw.clone(), |render| render(&self.raw))
   }
}

impl fmt::Display for DisplayValue {
   fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
      f.write_str(&self.raw)
   }
}

impl fmt::Debug for DisplayValue {
   fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
      f.debug_struct("DisplayValue")
         .field("raw", &self.raw)
         .field("styled", &self.render.is_some())
         .finish()
   }
}
