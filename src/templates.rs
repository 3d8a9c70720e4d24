use std::{path::PathBuf, sync::LazyLock};

use parking_lot::Mutex;
use rust_embed::RustEmbed;
use tera::{Context, Tera};
use tracing::debug;

use crate::{
   error::{LintError, Result},
   message::CommitMessage,
   types::CommitPart,
};

/// Embedded prompts folder (compiled into binary)
#[derive(RustEmbed)]
#[folder = "prompts/"]
struct Prompts;

/// Shared Tera instance for rendering loaded template sources
static TERA: LazyLock<Mutex<Tera>> = LazyLock::new(|| {
   let mut tera = Tera::default();
   // Prompts are markdown, not HTML
   tera.autoescape_on(vec![]);
   Mutex::new(tera)
});

/// User prompts directory (~/.config/commit-rules/prompts/) if a home dir
/// exists. Files there override the embedded defaults.
fn user_prompts_dir() -> Option<PathBuf> {
   std::env::var("HOME")
      .or_else(|_| std::env::var("USERPROFILE"))
      .ok()
      .map(|home| PathBuf::from(home).join(".config/commit-rules/prompts"))
}

/// Load template source, preferring a user override
fn load_template_file(category: &str, variant: &str) -> Result<String> {
   if let Some(prompts_dir) = user_prompts_dir() {
      let template_path = prompts_dir.join(category).join(format!("{variant}.md"));
      if template_path.is_file() {
         debug!(path = %template_path.display(), "using user prompt template");
         return std::fs::read_to_string(&template_path).map_err(|e| {
            LintError::Template(format!(
               "Failed to read template file {}: {e}",
               template_path.display()
            ))
         });
      }
   }

   let embedded_key = format!("{category}/{variant}.md");
   if let Some(bytes) = Prompts::get(&embedded_key) {
      return std::str::from_utf8(bytes.data.as_ref())
         .map(str::to_string)
         .map_err(|e| {
            LintError::Template(format!("Embedded template {embedded_key} is not valid UTF-8: {e}"))
         });
   }

   Err(LintError::Template(format!(
      "Template variant '{variant}' in category '{category}' not found as user override or \
       embedded default"
   )))
}

/// Render the prompt asking for a value of `part`
pub fn render_suggest_prompt(
   variant: &str,
   part: CommitPart,
   partial: &CommitMessage,
   rules: &[String],
   common_scopes: &[(String, usize)],
   diff: &str,
) -> Result<String> {
   let template_content = load_template_file("suggest", variant)?;

   let scopes = common_scopes
      .iter()
      .map(|(scope, count)| format!("{scope} ({count})"))
      .collect::<Vec<_>>()
      .join(", ");

   let mut context = Context::new();
   context.insert("part", part.as_str());
   context.insert("commit_type", partial.commit_type.as_deref().unwrap_or_default());
   context.insert("scope", partial.scope.as_deref().unwrap_or_default());
   context.insert("subject", partial.subject.as_deref().unwrap_or_default());
   context.insert("rules", rules);
   context.insert("common_scopes", &scopes);
   context.insert("diff", diff);

   let mut tera = TERA.lock();
   tera.render_str(&template_content, &context).map_err(|e| {
      LintError::Template(format!("Failed to render suggest prompt template '{variant}': {e}"))
   })
}
