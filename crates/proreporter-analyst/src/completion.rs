//! The structured-completion seam and the response schema sent across it.

use std::{future::Future, sync::Arc};

use proreporter_core::insight::ChartSpec;
use serde_json::{Value, json};

use crate::error::CompletionError;

/// One structured-generation request: a system prompt, a user prompt and the
/// JSON schema the answer must follow.
#[derive(Debug, Clone)]
pub struct CompletionRequest {
  pub system:      String,
  pub prompt:      String,
  pub schema_name: String,
  pub schema:      Value,
}

/// A service that turns a [`CompletionRequest`] into a JSON value.
///
/// The returned value is untrusted: callers validate it against the schema
/// themselves.
pub trait CompletionService: Send + Sync {
  fn complete<'a>(
    &'a self,
    request: &'a CompletionRequest,
  ) -> impl Future<Output = Result<Value, CompletionError>> + Send + 'a;
}

impl<T: CompletionService> CompletionService for Arc<T> {
  fn complete<'a>(
    &'a self,
    request: &'a CompletionRequest,
  ) -> impl Future<Output = Result<Value, CompletionError>> + Send + 'a {
    (**self).complete(request)
  }
}

/// JSON schema of an analysis answer: the reply text plus optional summary,
/// trends and chart configurations.
pub fn analysis_schema() -> Value {
  let described = |description: &str| json!({ "type": "string", "description": description });

  let chart = json!({
    "type": "object",
    "properties": {
      "chartType":   {
        "type": "string",
        "enum": ChartSpec::TYPES,
        "description": "The type of chart to display"
      },
      "title":       described("The title of the chart"),
      "description": described("A brief description of what the chart shows"),
      "xAxis":       described("The data key to use for the x-axis"),
      "yAxis":       described("The data key to use for the y-axis"),
      "data": {
        "type": "array",
        "description": "The data for the chart",
        "items": {
          "type": "object",
          "additionalProperties": { "type": ["string", "number"] }
        }
      }
    },
    "required": ["chartType", "title", "data"]
  });

  json!({
    "type": "object",
    "properties": {
      "text": described("The text response to the user's query"),
      "insights": {
        "type": "object",
        "properties": {
          "summary": described("A 2-3 sentence summary of the data"),
          "trends": {
            "type": "array",
            "items": { "type": "string" },
            "description": "Key trends identified in the data"
          },
          "charts": {
            "type": "array",
            "items": chart,
            "description": "Chart configurations to display"
          }
        }
      }
    },
    "required": ["text", "insights"]
  })
}
