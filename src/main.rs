use std::{
   io::{self, Read},
   path::{Path, PathBuf},
   process::ExitCode,
};

use clap::Parser;
use commit_rules::*;
use git::{CommitEntry, GitCli};
use rayon::prelude::*;
use tracing::debug;
use tracing_subscriber::EnvFilter;
use types::{Args, Command, OutputFormat};

/// Install the stderr log subscriber. `--verbose` forces debug output,
/// otherwise `RUST_LOG` decides and defaults to warnings only.
fn init_tracing(verbose: bool) {
   let filter = if verbose {
      EnvFilter::new("debug")
   } else {
      EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
   };
   tracing_subscriber::fmt()
      .with_env_filter(filter)
      .with_writer(io::stderr)
      .with_target(false)
      .init();
}

/// Load config from args or default
fn load_config_from_args(args: &Args) -> Result<LintConfig> {
   if let Some(ref config_path) = args.config {
      LintConfig::from_file(config_path)
   } else {
      LintConfig::load(Path::new(&args.dir))
   }
}

fn read_message(file: Option<&Path>) -> Result<String> {
   match file {
      Some(path) => Ok(std::fs::read_to_string(path)?),
      None => {
         let mut buf = String::new();
         io::stdin().read_to_string(&mut buf)?;
         Ok(buf)
      },
   }
}

fn print_report(report: &Report, format: OutputFormat, to_stderr: bool) -> Result<()> {
   let out = match format {
      OutputFormat::Text => style::render_report(report),
      OutputFormat::Json => serde_json::to_string_pretty(report)?,
   };
   if to_stderr {
      eprintln!("{out}");
   } else {
      println!("{out}");
   }
   Ok(())
}

/// Lint one message. With `fix`, the corrected message replaces the file, or
/// goes to stdout (report on stderr) when the message came from stdin.
fn lint_message(
   engine: &RulesEngine,
   file: Option<&PathBuf>,
   fix: bool,
   format: OutputFormat,
) -> Result<bool> {
   let raw = read_message(file.map(PathBuf::as_path))?;
   let msg = CommitMessage::parse(&raw);

   if !fix {
      let report = engine.validate(&msg);
      print_report(&report, format, false)?;
      return Ok(report.is_valid());
   }

   let (fixed, report) = engine.fix(&msg);
   match file {
      Some(path) => {
         if fixed != msg {
            debug!(path = %path.display(), "writing fixed message");
            std::fs::write(path, format!("{fixed}\n"))?;
         }
         print_report(&report, format, false)?;
      },
      None => {
         println!("{fixed}");
         print_report(&report, format, true)?;
      },
   }
   Ok(report.is_valid())
}

/// Lint every commit of a revision range in parallel
fn lint_range(engine: &RulesEngine, dir: &str, range: &str, format: OutputFormat) -> Result<bool> {
   let commits = GitCli::new(dir).commit_messages(range)?;
   debug!(range = range, count = commits.len(), "linting commits");

   let results: Vec<(CommitEntry, Report)> = commits
      .into_par_iter()
      .map(|commit| {
         let report = engine.lint(&commit.message);
         (commit, report)
      })
      .collect();

   let valid = results.iter().all(|(_, report)| report.is_valid());

   match format {
      OutputFormat::Json => {
         let entries: Vec<_> = results
            .iter()
            .map(|(commit, report)| serde_json::json!({ "hash": commit.hash, "report": report }))
            .collect();
         println!("{}", serde_json::to_string_pretty(&entries)?);
      },
      OutputFormat::Text => {
         let width = style::term_width();
         for (commit, report) in &results {
            let short = commit.hash.get(..8).unwrap_or(&commit.hash);
            let header = commit.message.lines().next().unwrap_or_default();
            println!("{} {}", style::dim(short), style::bold(header));
            println!("{}", style::render_report(report));
            println!("{}", style::separator(width));
         }
         let failing = results.iter().filter(|(_, r)| !r.is_valid()).count();
         let summary = format!("{failing} of {} commits failed", results.len());
         println!("{}", if valid { style::success(&summary) } else { style::error(&summary) });
      },
   }
   Ok(valid)
}

fn suggest(
   engine: &RulesEngine,
   config: &LintConfig,
   dir: &str,
   part: CommitPart,
   partial: &CommitMessage,
) -> Result<bool> {
   let git = GitCli::new(dir);
   let provider = api::OpenAiProvider::new(config)?;

   let message = format!("{} Drafting {part} with {}", style::icons::ROBOT, config.model);
   let draft = style::with_spinner_result(&message, || {
      let draft = api::draft(engine, part, partial, &git, &provider, config.max_diff_length);
      if draft.value.is_some() { Ok(draft) } else { Err(draft) }
   })
   .unwrap_or_else(|draft| draft);

   for warning in &draft.warnings {
      style::warn(warning);
   }

   let Some(value) = draft.value else {
      return Ok(false);
   };
   let shown = DisplayValue::styled(value, style::render_for_part(part));
   println!("{}", shown.render());
   eprint!("{}", style::render_part_report(part, &draft.report));
   Ok(draft.report.is_valid())
}

fn list_rules(engine: &RulesEngine) {
   if engine.is_empty() {
      println!("{}", style::info("No rules configured"));
      return;
   }
   println!(
      "{} {} rules, scope delimiter \"{}\"",
      style::info(style::icons::INFO),
      engine.rules().len(),
      engine.scope_delimiter()
   );
   for rule in engine.rules() {
      println!("{}", style::render_rule(rule));
   }
}

fn run(args: &Args) -> Result<bool> {
   let config = load_config_from_args(args)?;
   let engine = RulesEngine::from_config(&config)?;

   match &args.command {
      Command::Lint { file, fix, range, format } => match range {
         Some(range) => lint_range(&engine, &args.dir, range, *format),
         None => lint_message(&engine, file.as_ref(), *fix, *format),
      },
      Command::Suggest { part, commit_type, scope, subject } => {
         let part: CommitPart = part.parse()?;
         let partial = CommitMessage {
            commit_type: commit_type.clone(),
            scope: scope.clone(),
            subject: subject.clone(),
            ..Default::default()
         };
         suggest(&engine, &config, &args.dir, part, &partial)
      },
      Command::Rules => {
         list_rules(&engine);
         Ok(true)
      },
   }
}

fn main() -> ExitCode {
   dotenvy::dotenv().ok();
   let args = Args::parse();
   init_tracing(args.verbose);

   match run(&args) {
      Ok(true) => ExitCode::SUCCESS,
      Ok(false) => ExitCode::FAILURE,
      Err(e) => {
         eprintln!("{} {e}", style::error(style::icons::ERROR));
         ExitCode::from(2)
      },
   }
}
