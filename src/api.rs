//! AI-drafted field suggestions.
//!
//! The provider only ever hands back plain text. Whatever it returns is run
//! through the rules governing the requested part before it is shown, and a
//! failing provider or repository degrades to "no suggestion" rather than an
//! error.

use std::{thread, time::Duration};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::{
   config::LintConfig,
   engine::RulesEngine,
   error::{LintError, Result},
   git::{GitStatus, truncate_diff},
   message::CommitMessage,
   report::PartReport,
   rules::Rule,
   templates,
   types::CommitPart,
};

/// Everything a provider gets to draft one field
#[derive(Debug, Clone)]
pub struct SuggestionRequest<'a> {
   pub part:          CommitPart,
   /// Staged diff, possibly truncated or empty
   pub diff:          &'a str,
   /// Fields the user has already filled in
   pub partial:       &'a CommitMessage,
   /// What a valid value looks like, one line per rule
   pub rules:         Vec<String>,
   pub common_scopes: Vec<(String, usize)>,
}

pub trait SuggestionProvider {
   fn suggest(&self, request: &SuggestionRequest<'_>) -> Result<String>;
}

/// Build HTTP client with timeouts from config
fn build_client(config: &LintConfig) -> Result<reqwest::blocking::Client> {
   reqwest::blocking::Client::builder()
      .timeout(Duration::from_secs(config.request_timeout_secs))
      .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
      .build()
      .map_err(LintError::Http)
}

#[derive(Debug, Serialize)]
struct Message {
   role:    String,
   content: String,
}

#[derive(Debug, Serialize, Deserialize)]
struct FunctionParameters {
   #[serde(rename = "type")]
   param_type: String,
   properties: serde_json::Value,
   required:   Vec<String>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Function {
   name:        String,
   description: String,
   parameters:  FunctionParameters,
}

#[derive(Debug, Serialize, Deserialize)]
struct Tool {
   #[serde(rename = "type")]
   tool_type: String,
   function:  Function,
}

#[derive(Debug, Serialize)]
struct ApiRequest {
   model:       String,
   max_tokens:  u32,
   temperature: f32,
   tools:       Vec<Tool>,
   #[serde(skip_serializing_if = "Option::is_none")]
   tool_choice: Option<serde_json::Value>,
   messages:    Vec<Message>,
}

#[derive(Debug, Deserialize)]
struct ToolCall {
   function: FunctionCall,
}

#[derive(Debug, Deserialize)]
struct FunctionCall {
   name:      String,
   arguments: String,
}

#[derive(Debug, Deserialize)]
struct Choice {
   message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
   #[serde(default)]
   tool_calls: Vec<ToolCall>,
   #[serde(default)]
   content:    Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiResponse {
   choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct SuggestionOutput {
   value: String,
}

const TOOL_NAME: &str = "suggest_commit_field";

/// Retry an API call with exponential backoff. The closure returns
/// `(retry, result)`; `true` asks for another attempt.
pub fn retry_api_call<F, T>(config: &LintConfig, mut f: F) -> Result<T>
where
   F: FnMut() -> Result<(bool, Option<T>)>,
{
   let mut attempt = 0;

   loop {
      attempt += 1;

      match f() {
         Ok((false, Some(result))) => return Ok(result),
         Ok((false, None)) => {
            return Err(LintError::Other("API call failed without result".to_string()));
         },
         Ok((true, _)) if attempt < config.max_retries => {
            let backoff_ms = config.initial_backoff_ms * (1 << (attempt - 1));
            warn!(attempt, max = config.max_retries, backoff_ms, "retrying API call");
            thread::sleep(Duration::from_millis(backoff_ms));
         },
         Ok((true, _)) => {
            return Err(LintError::ApiRetryExhausted {
               retries: config.max_retries,
               source:  Box::new(LintError::Other("Max retries exceeded".to_string())),
            });
         },
         Err(e) => {
            if attempt < config.max_retries {
               let backoff_ms = config.initial_backoff_ms * (1 << (attempt - 1));
               warn!(error = %e, attempt, max = config.max_retries, backoff_ms, "API call failed");
               thread::sleep(Duration::from_millis(backoff_ms));
               continue;
            }
            return Err(e);
         },
      }
   }
}

/// [`SuggestionProvider`] for OpenAI-compatible chat completion endpoints
pub struct OpenAiProvider<'a> {
   config: &'a LintConfig,
   client: reqwest::blocking::Client,
}

impl<'a> OpenAiProvider<'a> {
   pub fn new(config: &'a LintConfig) -> Result<Self> {
      Ok(Self { config, client: build_client(config)? })
   }

   fn tool(part: CommitPart) -> Tool {
      Tool {
         tool_type: "function".to_string(),
         function:  Function {
            name:        TOOL_NAME.to_string(),
            description: format!("Propose the {part} of a conventional commit message"),
            parameters:  FunctionParameters {
               param_type: "object".to_string(),
               properties: serde_json::json!({
                  "value": {
                     "type": "string",
                     "description": format!("The commit {part}, without any other part of the message")
                  }
               }),
               required:   vec!["value".to_string()],
            },
         },
      }
   }

   /// One attempt; `Ok((true, None))` asks the caller to retry
   fn attempt(&self, request: &ApiRequest) -> Result<(bool, Option<String>)> {
      let mut request_builder = self
         .client
         .post(format!("{}/chat/completions", self.config.api_base_url))
         .header("content-type", "application/json");

      if let Some(ref api_key) = self.config.api_key {
         request_builder = request_builder.header("Authorization", format!("Bearer {api_key}"));
      }

      let response = request_builder.json(request).send()?;
      let status = response.status();

      if status.is_server_error() {
         let error_text = response
            .text()
            .unwrap_or_else(|_| "Unknown error".to_string());
         warn!(%status, body = error_text.as_str(), "server error");
         return Ok((true, None));
      }

      if !status.is_success() {
         let error_text = response
            .text()
            .unwrap_or_else(|_| "Unknown error".to_string());
         return Err(LintError::Api { status: status.as_u16(), body: error_text });
      }

      let api_response: ApiResponse = response.json()?;
      parse_response(api_response).map(|value| (false, Some(value)))
   }
}

fn parse_response(response: ApiResponse) -> Result<String> {
   let message = response
      .choices
      .into_iter()
      .next()
      .map(|choice| choice.message)
      .ok_or_else(|| LintError::Other("API returned empty response".to_string()))?;

   if let Some(tool_call) = message
      .tool_calls
      .iter()
      .find(|call| call.function.name == TOOL_NAME)
   {
      let args = &tool_call.function.arguments;
      if args.is_empty() {
         return Err(LintError::Other(
            "Model returned empty function arguments - it may not support function calling"
               .to_string(),
         ));
      }
      let output: SuggestionOutput = serde_json::from_str(args).map_err(|e| {
         LintError::Other(format!(
            "Failed to parse model response: {e}. Response was: {}",
            args.chars().take(200).collect::<String>()
         ))
      })?;
      return Ok(output.value);
   }

   // Models without tool support answer in plain text
   match message.content {
      Some(content) if !content.trim().is_empty() => Ok(content),
      _ => Err(LintError::Other("No suggestion found in API response".to_string())),
   }
}

impl SuggestionProvider for OpenAiProvider<'_> {
   fn suggest(&self, request: &SuggestionRequest<'_>) -> Result<String> {
      let prompt = templates::render_suggest_prompt(
         &self.config.suggest_prompt_variant,
         request.part,
         request.partial,
         &request.rules,
         &request.common_scopes,
         request.diff,
      )?;

      let api_request = ApiRequest {
         model:       self.config.model.clone(),
         max_tokens:  1000,
         temperature: self.config.temperature,
         tools:       vec![Self::tool(request.part)],
         tool_choice: Some(
            serde_json::json!({ "type": "function", "function": { "name": TOOL_NAME } }),
         ),
         messages:    vec![Message { role: "user".to_string(), content: prompt }],
      };

      debug!(part = %request.part, model = self.config.model.as_str(), "requesting suggestion");
      retry_api_call(self.config, || self.attempt(&api_request))
   }
}

/// A drafted value for one part, already passed through that part's rules
#[derive(Debug, Clone, Default)]
pub struct Draft {
   pub value:    Option<String>,
   /// Problems the rules could not fix in `value`
   pub report:   PartReport,
   /// Collaborator failures that were worked around
   pub warnings: Vec<String>,
}

/// Ask `provider` for a value of `part` and fix it with the rules governing
/// that part
pub fn draft(
   engine: &RulesEngine,
   part: CommitPart,
   partial: &CommitMessage,
   git: &dyn GitStatus,
   provider: &dyn SuggestionProvider,
   max_diff_length: usize,
) -> Draft {
   let narrowed = engine.narrow(part);
   let mut warnings = Vec::new();

   let diff = match git.staged_diff() {
      Ok(diff) => truncate_diff(&diff, max_diff_length),
      Err(e) => {
         warnings.push(format!("Continuing without a diff: {e}"));
         String::new()
      },
   };

   let common_scopes = if part == CommitPart::Scope {
      git.common_scopes(100).unwrap_or_else(|e| {
         debug!(error = %e, "no scope history");
         Vec::new()
      })
   } else {
      Vec::new()
   };

   let request = SuggestionRequest {
      part,
      diff: &diff,
      partial,
      rules: narrowed.rules().iter().map(Rule::describe).collect(),
      common_scopes,
   };

   match provider.suggest(&request) {
      Ok(raw) => {
         let (value, report) = narrowed.fix_value(part, raw.trim());
         Draft { value: Some(value), report, warnings }
      },
      Err(e) => {
         warnings.push(format!("No suggestion available: {e}"));
         Draft { value: None, report: PartReport::default(), warnings }
      },
   }
}
