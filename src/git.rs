use std::{collections::HashMap, process::Command};

use tracing::debug;

use crate::{
   error::{LintError, Result},
   message::CommitMessage,
};

/// Read-only repository access used by the suggestion flow
pub trait GitStatus {
   fn is_repository(&self) -> bool;

   fn staged_files(&self) -> Result<Vec<String>>;

   fn staged_diff(&self) -> Result<String>;

   /// Scopes used in recent history, most frequent first
   fn common_scopes(&self, _limit: usize) -> Result<Vec<(String, usize)>> {
      Ok(Vec::new())
   }
}

/// One commit of a linted range
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitEntry {
   pub hash:    String,
   pub message: String,
}

/// [`GitStatus`] backed by the `git` executable
#[derive(Debug, Clone)]
pub struct GitCli {
   dir: String,
}

impl GitCli {
   pub fn new(dir: impl Into<String>) -> Self {
      Self { dir: dir.into() }
   }

   fn run(&self, args: &[&str]) -> Result<String> {
      debug!(dir = self.dir.as_str(), ?args, "running git");
      let output = Command::new("git")
         .args(args)
         .current_dir(&self.dir)
         .output()
         .map_err(|e| LintError::Git(format!("Failed to run git {}: {e}", args.join(" "))))?;

      if !output.status.success() {
         let stderr = String::from_utf8_lossy(&output.stderr);
         return Err(LintError::Git(format!("git {} failed: {}", args.join(" "), stderr.trim())));
      }

      Ok(String::from_utf8_lossy(&output.stdout).to_string())
   }

   /// Full messages of every commit in `range` (e.g. `main..HEAD`), newest
   /// first
   pub fn commit_messages(&self, range: &str) -> Result<Vec<CommitEntry>> {
      if !self.is_repository() {
         return Err(LintError::NotARepository(self.dir.clone()));
      }
      let stdout = self.run(&["log", "--format=%H%x00%B%x1e", range])?;
      Ok(parse_log(&stdout))
   }
}

impl GitStatus for GitCli {
   fn is_repository(&self) -> bool {
      self
         .run(&["rev-parse", "--is-inside-work-tree"])
         .is_ok_and(|out| out.trim() == "true")
   }

   fn staged_files(&self) -> Result<Vec<String>> {
      let stdout = self.run(&["diff", "--cached", "--name-only"])?;
      Ok(stdout
         .lines()
         .filter(|line| !line.is_empty())
         .map(str::to_string)
         .collect())
   }

   fn staged_diff(&self) -> Result<String> {
      if !self.is_repository() {
         return Err(LintError::NotARepository(self.dir.clone()));
      }
      let diff = self.run(&["diff", "--cached"])?;
      if diff.trim().is_empty() {
         return Err(LintError::NoStagedChanges);
      }
      Ok(diff)
   }

   fn common_scopes(&self, limit: usize) -> Result<Vec<(String, usize)>> {
      let stdout = self.run(&["log", &format!("-{limit}"), "--pretty=format:%s"])?;
      Ok(count_scopes(stdout.lines()))
   }
}

/// Split `git log --format=%H%x00%B%x1e` output into entries
fn parse_log(stdout: &str) -> Vec<CommitEntry> {
   stdout
      .split('\x1e')
      .filter_map(|record| {
         let (hash, message) = record.trim_start_matches('\n').split_once('\0')?;
         Some(CommitEntry {
            hash:    hash.to_string(),
            message: message.trim_end().to_string(),
         })
      })
      .collect()
}

/// Count scopes across conventional headers, sorted by frequency then name
fn count_scopes<'a>(headers: impl Iterator<Item = &'a str>) -> Vec<(String, usize)> {
   let mut counts: HashMap<String, usize> = HashMap::new();
   for header in headers {
      if let Some(scope) = CommitMessage::parse_header(header).scope {
         *counts.entry(scope).or_insert(0) += 1;
      }
   }

   let mut scopes: Vec<(String, usize)> = counts.into_iter().collect();
   scopes.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
   scopes
}

/// Cut a diff down to `max_len` bytes on a line boundary
pub fn truncate_diff(diff: &str, max_len: usize) -> String {
   if diff.len() <= max_len {
      return diff.to_string();
   }
   let mut end = max_len;
   while !diff.is_char_boundary(end) {
      end -= 1;
   }
   let cut = diff[..end]
      .rfind('\n')
      .map_or(0, |i| i + 1);
   format!("{}... (diff truncated)\n", &diff[..cut])
}
