//! Terminal styling utilities for consistent CLI output.
//!
//! Respects `NO_COLOR` environment variable and terminal capabilities.

use std::{
   fmt::Write as _,
   io::{self, Write},
   sync::OnceLock,
   thread,
   time::Duration,
};

use owo_colors::OwoColorize;

use crate::{
   report::{PartReport, Report},
   rules::Rule,
   types::{CommitPart, Severity},
};

/// Whether color output is enabled (cached on first call).
static COLOR_ENABLED: OnceLock<bool> = OnceLock::new();

/// Check if colors should be used.
pub fn colors_enabled() -> bool {
   *COLOR_ENABLED.get_or_init(|| {
      // NO_COLOR takes precedence (https://no-color.org/)
      if std::env::var("NO_COLOR").is_ok() {
         return false;
      }
      supports_color::on(supports_color::Stream::Stdout).is_some_and(|level| level.has_basic)
   })
}

// === Color Palette ===

/// Success: checkmarks, clean reports (green + bold).
pub fn success(s: &str) -> String {
   if colors_enabled() {
      s.green().bold().to_string()
   } else {
      s.to_string()
   }
}

/// Warning: warning-severity rules, collaborator fallbacks (yellow).
pub fn warning(s: &str) -> String {
   if colors_enabled() {
      s.yellow().to_string()
   } else {
      s.to_string()
   }
}

/// Error: error-severity rules, hard failures (red + bold).
pub fn error(s: &str) -> String {
   if colors_enabled() {
      s.red().bold().to_string()
   } else {
      s.to_string()
   }
}

/// Info: informational messages (cyan).
pub fn info(s: &str) -> String {
   if colors_enabled() {
      s.cyan().to_string()
   } else {
      s.to_string()
   }
}

/// Print warning message to stderr, clearing any active spinner line first.
pub fn warn(msg: &str) {
   eprint!("\r\x1b[K");
   io::stderr().flush().ok();
   eprintln!("{} {}", warning(icons::WARNING), warning(msg));
}

/// Dim: less important details, hashes (dimmed).
pub fn dim(s: &str) -> String {
   if colors_enabled() {
      s.dimmed().to_string()
   } else {
      s.to_string()
   }
}

/// Bold: part names, key values.
pub fn bold(s: &str) -> String {
   if colors_enabled() {
      s.bold().to_string()
   } else {
      s.to_string()
   }
}

/// Commit type styling (blue + bold).
pub fn commit_type(s: &str) -> String {
   if colors_enabled() {
      s.blue().bold().to_string()
   } else {
      s.to_string()
   }
}

/// Scope styling (cyan).
pub fn scope(s: &str) -> String {
   if colors_enabled() {
      s.cyan().to_string()
   } else {
      s.to_string()
   }
}

/// Presentation function for values of `part`, for use with
/// [`DisplayValue::styled`](crate::message::DisplayValue::styled)
pub fn render_for_part(part: CommitPart) -> fn(&str) -> String {
   match part {
      CommitPart::Type => commit_type,
      CommitPart::Scope => scope,
      CommitPart::Subject | CommitPart::Header => bold,
      CommitPart::Body | CommitPart::Footer | CommitPart::Trailer => str::to_string,
   }
}

/// Get terminal width, capped at 120 columns.
pub fn term_width() -> usize {
   terminal_size::terminal_size()
      .map_or(80, |(w, _)| w.0 as usize)
      .min(120)
}

/// Horizontal separator line.
pub fn separator(width: usize) -> String {
   let line = "\u{2500}".repeat(width);
   if colors_enabled() { dim(&line) } else { line }
}

fn severity_icon(severity: Severity) -> String {
   match severity {
      Severity::Error => error(icons::ERROR),
      Severity::Warning => warning(icons::WARNING),
      Severity::Disabled => dim(icons::BULLET),
   }
}

fn render_part(out: &mut String, part: CommitPart, report: &PartReport) {
   let label = report
      .filter
      .clone()
      .unwrap_or_else(|| part.as_str().to_string());
   for message in &report.errors {
      writeln!(out, "{} {}: {message}", severity_icon(Severity::Error), bold(&label)).ok();
   }
   for message in &report.warnings {
      writeln!(out, "{} {}: {message}", severity_icon(Severity::Warning), bold(&label)).ok();
   }
}

/// Render a report as one line per problem followed by a summary line.
pub fn render_report(report: &Report) -> String {
   let mut out = String::new();
   for (part, part_report) in report.iter() {
      render_part(&mut out, part, part_report);
   }
   out.push_str(&summary(report.error_count(), report.warning_count()));
   out
}

/// Render a single-field report (no summary line when clean).
pub fn render_part_report(part: CommitPart, report: &PartReport) -> String {
   let mut out = String::new();
   render_part(&mut out, part, report);
   out
}

fn summary(errors: usize, warnings: usize) -> String {
   let plural = |n: usize, word: &str| format!("{n} {word}{}", if n == 1 { "" } else { "s" });
   match (errors, warnings) {
      (0, 0) => format!("{} no problems", success(icons::SUCCESS)),
      (0, w) => format!("{} {}", warning(icons::WARNING), warning(&plural(w, "warning"))),
      (e, w) => format!(
         "{} {}, {}",
         error(icons::ERROR),
         error(&plural(e, "error")),
         plural(w, "warning")
      ),
   }
}

/// One line describing a configured rule.
pub fn render_rule(rule: &Rule) -> String {
   format!(
      "{} {:<28} {}",
      severity_icon(rule.severity()),
      bold(rule.name()),
      dim(&rule.describe())
   )
}

// === Status Icons ===

pub mod icons {
   pub const SUCCESS: &str = "\u{2713}";
   pub const WARNING: &str = "\u{26A0}";
   pub const ERROR: &str = "\u{2717}";
   pub const INFO: &str = "\u{2139}";
   pub const BULLET: &str = "\u{2022}";
   pub const ROBOT: &str = "\u{1F916}";
}

// === Spinner ===

const SPINNER_FRAMES: &[char] = &[
   '\u{280B}', '\u{2819}', '\u{2839}', '\u{2838}', '\u{283C}', '\u{2834}', '\u{2826}', '\u{2827}',
   '\u{2807}', '\u{280F}',
];

/// Run a function with a spinner on stderr, showing success or failure when
/// it returns. Falls back to a static line without colors.
pub fn with_spinner_result<F, T, E>(message: &str, f: F) -> Result<T, E>
where
   F: FnOnce() -> Result<T, E>,
{
   if !colors_enabled() {
      eprintln!("{message}");
      return f();
   }

   let (tx, rx) = std::sync::mpsc::channel::<bool>();
   let msg = message.to_string();

   let spinner = thread::spawn(move || {
      let mut idx = 0;
      loop {
         match rx.try_recv() {
            Ok(success) => {
               let icon = if success {
                  icons::SUCCESS.green().to_string()
               } else {
                  icons::ERROR.red().to_string()
               };
               eprint!("\r\x1b[K{icon} {msg}\n");
               io::stderr().flush().ok();
               break;
            },
            Err(std::sync::mpsc::TryRecvError::Disconnected) => break,
            Err(std::sync::mpsc::TryRecvError::Empty) => {},
         }
         eprint!("\r{} {}", SPINNER_FRAMES[idx].cyan(), msg);
         io::stderr().flush().ok();
         idx = (idx + 1) % SPINNER_FRAMES.len();
         thread::sleep(Duration::from_millis(80));
      }
   });

   let result = f();
   tx.send(result.is_ok()).ok();
   spinner.join().ok();
   result
}
