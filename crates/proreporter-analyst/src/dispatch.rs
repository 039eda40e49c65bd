//! The query dispatcher: one dataset plus one query in, one [`Analysis`] out.
//!
//! The dispatcher never fails. Any transport, status or schema problem is
//! logged and answered with [`fallback`]. Individual charts that do not
//! decode are dropped; the rest of the answer is kept.

use proreporter_core::{
  dataset::Dataset,
  insight::{Analysis, ChartSpec, InsightDelta},
};
use serde_json::Value;

use crate::completion::{CompletionRequest, CompletionService, analysis_schema};

pub const FALLBACK_TEXT: &str = "I'm sorry, I couldn't analyze your data. There might be an issue \
                                 with the data format or my connection to the AI service.";
pub const FALLBACK_SUMMARY: &str = "Analysis could not be generated.";
pub const FALLBACK_TREND: &str = "No trends could be identified.";

const SYSTEM_PROMPT: &str = "You are an AI data analyst that helps users analyze CSV data.
Your task is to analyze the provided data and generate insights.
When asked to create charts, you should return properly formatted chart configurations.
Always return your response in the specified format.";

const SCHEMA_NAME: &str = "analysis";

/// The canned answer used whenever the completion service cannot produce a
/// usable one.
pub fn fallback() -> Analysis {
  Analysis {
    text:     FALLBACK_TEXT.to_string(),
    insights: InsightDelta {
      summary: Some(FALLBACK_SUMMARY.to_string()),
      trends:  Some(vec![FALLBACK_TREND.to_string()]),
      charts:  Some(Vec::new()),
    },
  }
}

pub struct Dispatcher<C> {
  completion: C,
}

impl<C: CompletionService> Dispatcher<C> {
  pub fn new(completion: C) -> Self { Self { completion } }

  /// Ask the completion service about `data`.
  pub async fn dispatch(&self, data: &Dataset, query: &str) -> Analysis {
    let rows = match data.rows_json() {
      Ok(rows) => rows,
      Err(e) => {
        tracing::warn!(error = %e, "could not serialise dataset; using fallback");
        return fallback();
      }
    };

    let request = CompletionRequest {
      system:      SYSTEM_PROMPT.to_string(),
      prompt:      user_prompt(&rows, query),
      schema_name: SCHEMA_NAME.to_string(),
      schema:      analysis_schema(),
    };

    let value = match self.completion.complete(&request).await {
      Ok(value) => value,
      Err(e) => {
        tracing::warn!(error = %e, "completion failed; using fallback");
        return fallback();
      }
    };

    match decode(value) {
      Some(analysis) => {
        tracing::debug!(
          charts = analysis.insights.charts.as_ref().map_or(0, Vec::len),
          "analysis decoded"
        );
        analysis
      }
      None => fallback(),
    }
  }
}

fn user_prompt(rows_json: &str, query: &str) -> String {
  format!(
    "Analyze this data: {rows_json}.
User query: {query}

If the user asks for a chart, make sure to include a properly formatted chart configuration.
For charts, use the actual data values from the provided dataset."
  )
}

/// Validate an untrusted answer. `None` means the top level is unusable.
fn decode(value: Value) -> Option<Analysis> {
  let Value::Object(mut top) = value else {
    tracing::warn!("completion answer is not an object; using fallback");
    return None;
  };

  let Some(Value::String(text)) = top.remove("text") else {
    tracing::warn!("completion answer has no text; using fallback");
    return None;
  };

  let Some(Value::Object(mut insights)) = top.remove("insights") else {
    tracing::warn!("completion answer has no insights object; using fallback");
    return None;
  };

  let summary = match insights.remove("summary") {
    None | Some(Value::Null) => None,
    Some(Value::String(s)) => Some(s),
    Some(_) => {
      tracing::warn!("summary is not a string; using fallback");
      return None;
    }
  };

  let trends = match insights.remove("trends") {
    None | Some(Value::Null) => None,
    Some(v) => match serde_json::from_value::<Vec<String>>(v) {
      Ok(trends) => Some(trends),
      Err(e) => {
        tracing::warn!(error = %e, "trends are not a list of strings; using fallback");
        return None;
      }
    },
  };

  let charts = match insights.remove("charts") {
    None | Some(Value::Null) => None,
    Some(Value::Array(items)) => Some(decode_charts(items)),
    Some(_) => {
      tracing::warn!("charts is not a list; using fallback");
      return None;
    }
  };

  Some(Analysis { text, insights: InsightDelta { summary, trends, charts } })
}

fn decode_charts(items: Vec<Value>) -> Vec<ChartSpec> {
  items
    .into_iter()
    .enumerate()
    .filter_map(|(index, item)| match ChartSpec::from_json(item) {
      Ok(chart) => Some(chart),
      Err(e) => {
        tracing::warn!(index, error = %e, "dropping malformed chart");
        None
      }
    })
    .collect()
}

#[cfg(test)]
mod tests {
  use std::sync::Mutex;

  use proreporter_core::dataset::{Row, Scalar};
  use serde_json::json;

  use super::*;
  use crate::error::CompletionError;

  /// Answers every request with the same canned result and records prompts.
  struct Canned {
    answer:  fn() -> Result<Value, CompletionError>,
    prompts: Mutex<Vec<String>>,
  }

  impl Canned {
    fn new(answer: fn() -> Result<Value, CompletionError>) -> Self {
      Self { answer, prompts: Mutex::new(Vec::new()) }
    }
  }

  impl CompletionService for Canned {
    async fn complete(&self, request: &CompletionRequest) -> Result<Value, CompletionError> {
      self.prompts.lock().unwrap().push(request.prompt.clone());
      (self.answer)()
    }
  }

  fn sales() -> Dataset {
    let rows = [("Jan", 10), ("Feb", 20)]
      .into_iter()
      .map(|(m, s)| {
        let mut row = Row::new();
        row.insert("month".into(), Scalar::from(m));
        row.insert("sales".into(), Scalar::from(s));
        row
      })
      .collect();
    Dataset::new(vec!["month".into(), "sales".into()], rows)
  }

  fn chart(kind: &str, title: &str) -> Value {
    json!({
      "chartType": kind,
      "title": title,
      "xAxis": "month",
      "yAxis": "sales",
      "data": [{ "month": "Jan", "sales": 10 }, { "month": "Feb", "sales": 20 }]
    })
  }

  async fn run(answer: fn() -> Result<Value, CompletionError>) -> Analysis {
    Dispatcher::new(Canned::new(answer)).dispatch(&sales(), "Analyze this data").await
  }

  #[tokio::test]
  async fn well_formed_answer_passes_through() {
    let analysis = run(|| {
      Ok(json!({
        "text": "Sales doubled.",
        "insights": {
          "summary": "Sales went from 10 to 20.",
          "trends": ["Upward"],
          "charts": [chart("line", "Sales over time")]
        }
      }))
    })
    .await;

    assert_eq!(analysis.text, "Sales doubled.");
    assert_eq!(analysis.insights.summary.as_deref(), Some("Sales went from 10 to 20."));
    assert_eq!(analysis.insights.trends, Some(vec!["Upward".to_string()]));
    let charts = analysis.insights.charts.unwrap();
    assert_eq!(charts.len(), 1);
    assert_eq!(charts[0].chart_type(), "line");
  }

  #[tokio::test]
  async fn transport_failure_yields_fallback_verbatim() {
    let analysis = run(|| Err(CompletionError::MissingContent)).await;
    assert_eq!(analysis, fallback());
    assert_eq!(analysis.text, FALLBACK_TEXT);
    assert_eq!(analysis.insights.summary.as_deref(), Some("Analysis could not be generated."));
    assert_eq!(
      analysis.insights.trends,
      Some(vec!["No trends could be identified.".to_string()])
    );
    assert_eq!(analysis.insights.charts, Some(vec![]));
  }

  #[tokio::test]
  async fn missing_text_yields_fallback() {
    let analysis = run(|| Ok(json!({ "insights": {} }))).await;
    assert_eq!(analysis, fallback());
  }

  #[tokio::test]
  async fn non_object_insights_yields_fallback() {
    let analysis = run(|| Ok(json!({ "text": "hi", "insights": [] }))).await;
    assert_eq!(analysis, fallback());
  }

  #[tokio::test]
  async fn unknown_and_malformed_charts_are_dropped() {
    let analysis = run(|| {
      Ok(json!({
        "text": "Here you go.",
        "insights": {
          "charts": [
            chart("bar", "kept"),
            chart("histogram", "unknown type"),
            { "chartType": "pie", "title": "no data" },
            chart("scatter", "also kept")
          ]
        }
      }))
    })
    .await;

    let charts = analysis.insights.charts.unwrap();
    let titles: Vec<_> = charts.iter().map(ChartSpec::title).collect();
    assert_eq!(titles, ["kept", "also kept"]);
    assert!(charts.iter().all(|c| ChartSpec::TYPES.contains(&c.chart_type())));
  }

  #[tokio::test]
  async fn absent_insight_fields_stay_absent() {
    let analysis = run(|| Ok(json!({ "text": "Nothing new.", "insights": {} }))).await;
    assert_eq!(analysis.text, "Nothing new.");
    assert_eq!(analysis.insights, InsightDelta::default());
  }

  #[tokio::test]
  async fn prompt_embeds_rows_and_query() {
    let canned = Canned::new(|| Ok(json!({ "text": "ok", "insights": {} })));
    let dispatcher = Dispatcher::new(canned);
    dispatcher.dispatch(&sales(), "Show me a bar chart").await;

    let prompts = dispatcher.completion.prompts.lock().unwrap();
    assert_eq!(prompts.len(), 1);
    assert!(prompts[0].contains(r#"{"month":"Jan","sales":10}"#), "{}", prompts[0]);
    assert!(prompts[0].contains("User query: Show me a bar chart"));
  }
}
