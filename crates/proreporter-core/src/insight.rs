//! Insight types: chat transcript, chart specifications, and the
//! accumulated per-report insight state.
//!
//! Field names on the wire are camelCase (`chartType`, `xAxis`,
//! `chatHistory`) to match the structured-output schema the completion
//! service is asked to follow.

use serde::{Deserialize, Serialize};

use crate::{Error, Result, dataset::Row};

// ─── Chat ────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
  User,
  Assistant,
}

/// One entry of the append-only transcript.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
  pub role:    ChatRole,
  pub content: String,
}

impl ChatMessage {
  pub fn user(content: impl Into<String>) -> Self {
    Self { role: ChatRole::User, content: content.into() }
  }

  pub fn assistant(content: impl Into<String>) -> Self {
    Self { role: ChatRole::Assistant, content: content.into() }
  }
}

// ─── Charts ──────────────────────────────────────────────────────────────────

/// Fields shared by every chart type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartBody {
  pub title:       String,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub description: Option<String>,
  /// Data key for the x-axis.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub x_axis:      Option<String>,
  /// Data key for the y-axis.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub y_axis:      Option<String>,
  pub data:        Vec<Row>,
}

/// A chart recommendation, tagged by its `chartType`.
///
/// The set of variants is closed: a payload naming any other chart type does
/// not deserialise.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "chartType", rename_all = "lowercase")]
pub enum ChartSpec {
  Bar(ChartBody),
  Line(ChartBody),
  Pie(ChartBody),
  Area(ChartBody),
  Scatter(ChartBody),
}

impl ChartSpec {
  /// Every accepted `chartType` value.
  pub const TYPES: [&'static str; 5] = ["bar", "line", "pie", "area", "scatter"];

  /// The `chartType` discriminant. Must match the serde tags above.
  pub fn chart_type(&self) -> &'static str {
    match self {
      Self::Bar(_) => "bar",
      Self::Line(_) => "line",
      Self::Pie(_) => "pie",
      Self::Area(_) => "area",
      Self::Scatter(_) => "scatter",
    }
  }

  pub fn body(&self) -> &ChartBody {
    match self {
      Self::Bar(b) | Self::Line(b) | Self::Pie(b) | Self::Area(b) | Self::Scatter(b) => b,
    }
  }

  pub fn title(&self) -> &str { &self.body().title }

  /// Decode one untrusted chart object.
  ///
  /// An unrecognised `chartType` is reported as
  /// [`Error::UnknownChartType`]; any other shape problem as
  /// [`Error::Serialization`].
  pub fn from_json(value: serde_json::Value) -> Result<Self> {
    if let Some(kind) = value.get("chartType").and_then(|v| v.as_str())
      && !Self::TYPES.contains(&kind)
    {
      return Err(Error::UnknownChartType(kind.to_owned()));
    }
    Ok(serde_json::from_value(value)?)
  }
}

// ─── Accumulated state ───────────────────────────────────────────────────────

/// Summary, trends, charts and transcript accumulated for one report.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InsightState {
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub summary:      Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub trends:       Option<Vec<String>>,
  #[serde(default)]
  pub charts:       Vec<ChartSpec>,
  #[serde(default)]
  pub chat_history: Vec<ChatMessage>,
}

// ─── Dispatch result ─────────────────────────────────────────────────────────

/// The insight part of one completion response. Every field is optional; the
/// accumulator decides which ones are applied.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InsightDelta {
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub summary: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub trends:  Option<Vec<String>>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub charts:  Option<Vec<ChartSpec>>,
}

/// A well-formed answer to one query: the assistant's reply plus any
/// insights it produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Analysis {
  pub text:     String,
  pub insights: InsightDelta,
}
