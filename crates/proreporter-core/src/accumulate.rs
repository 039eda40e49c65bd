//! The insight accumulator.
//!
//! Folds one chat turn and its [`Analysis`] into the report's running
//! [`InsightState`]:
//!
//! - the user message and the assistant reply are appended, in that order;
//! - returned charts are appended after every chart already collected
//!   (never replaced, never de-duplicated);
//! - `summary` and `trends` are taken from the first turn only and stay
//!   frozen afterwards.

use crate::insight::{Analysis, ChatMessage, InsightState};

/// Merge one turn into `prior`, returning the new state.
///
/// `prior` is `None` before the first turn of a report. The prior state is
/// never modified.
pub fn merge(
  prior: Option<&InsightState>,
  user: ChatMessage,
  analysis: Analysis,
) -> InsightState {
  let Analysis { text, insights } = analysis;
  let new_charts = insights.charts.unwrap_or_default();

  let mut next = match prior {
    // First turn: the response's insights become the state.
    None => InsightState {
      summary: insights.summary,
      trends: insights.trends,
      charts: new_charts,
      chat_history: Vec::with_capacity(2),
    },
    // Later turns only grow the chart list and the transcript.
    Some(prior) => {
      let mut next = prior.clone();
      next.charts.extend(new_charts);
      next
    }
  };

  next.chat_history.push(user);
  next.chat_history.push(ChatMessage::assistant(text));
  next
}

/// Fold a sequence of turns from an empty report.
pub fn replay<I>(turns: I) -> Option<InsightState>
where
  I: IntoIterator<Item = (ChatMessage, Analysis)>,
{
  turns
    .into_iter()
    .fold(None, |state, (user, analysis)| Some(merge(state.as_ref(), user, analysis)))
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::insight::{ChartBody, ChartSpec, ChatRole, InsightDelta};

  fn chart(title: &str) -> ChartSpec {
    ChartSpec::Bar(ChartBody {
      title:       title.into(),
      description: None,
      x_axis:      Some("month".into()),
      y_axis:      Some("sales".into()),
      data:        vec![],
    })
  }

  fn analysis(text: &str, charts: Option<Vec<ChartSpec>>) -> Analysis {
    Analysis {
      text:     text.into(),
      insights: InsightDelta {
        summary: Some(format!("summary of {text}")),
        trends: Some(vec![format!("trend of {text}")]),
        charts,
      },
    }
  }

  #[test]
  fn first_turn_takes_all_insights() {
    let state = merge(
      None,
      ChatMessage::user("Analyze this data"),
      analysis("first", Some(vec![chart("a"), chart("b")])),
    );

    assert_eq!(state.summary.as_deref(), Some("summary of first"));
    assert_eq!(state.trends, Some(vec!["trend of first".to_string()]));
    assert_eq!(state.charts.len(), 2);
    assert_eq!(state.chat_history.len(), 2);
    assert_eq!(state.chat_history[0].role, ChatRole::User);
    assert_eq!(state.chat_history[0].content, "Analyze this data");
    assert_eq!(state.chat_history[1].role, ChatRole::Assistant);
    assert_eq!(state.chat_history[1].content, "first");
  }

  #[test]
  fn later_turns_keep_first_summary_and_trends() {
    let first = merge(None, ChatMessage::user("q1"), analysis("first", None));
    let second = merge(Some(&first), ChatMessage::user("q2"), analysis("second", None));

    assert_eq!(second.summary.as_deref(), Some("summary of first"));
    assert_eq!(second.trends, Some(vec!["trend of first".to_string()]));
    assert_eq!(second.chat_history.len(), 4);
    assert_eq!(second.chat_history[3].content, "second");
  }

  #[test]
  fn new_chart_is_appended_at_the_end() {
    let first = merge(None, ChatMessage::user("q1"), analysis("a", Some(vec![chart("x")])));
    let second = merge(
      Some(&first),
      ChatMessage::user("Show me a bar chart"),
      analysis("b", Some(vec![chart("bar")])),
    );

    assert_eq!(second.charts.len(), first.charts.len() + 1);
    assert_eq!(second.charts.last().unwrap().title(), "bar");
    assert_eq!(second.charts.last().unwrap().chart_type(), "bar");
  }

  #[test]
  fn duplicate_titles_accumulate() {
    let first = merge(None, ChatMessage::user("q"), analysis("a", Some(vec![chart("same")])));
    let second = merge(Some(&first), ChatMessage::user("q"), analysis("b", Some(vec![chart("same")])));
    assert_eq!(second.charts.len(), 2);
  }

  #[test]
  fn prior_is_not_modified() {
    let first = merge(None, ChatMessage::user("q1"), analysis("a", Some(vec![chart("x")])));
    let snapshot = first.clone();
    let _ = merge(Some(&first), ChatMessage::user("q2"), analysis("b", Some(vec![chart("y")])));
    assert_eq!(first, snapshot);
  }

  #[test]
  fn charts_concatenate_across_turns_with_empty_gaps() {
    let turns = vec![
      (ChatMessage::user("1"), analysis("1", Some(vec![chart("a")]))),
      (ChatMessage::user("2"), analysis("2", None)),
      (ChatMessage::user("3"), analysis("3", Some(vec![]))),
      (ChatMessage::user("4"), analysis("4", Some(vec![chart("b"), chart("c")]))),
    ];
    let state = replay(turns).unwrap();

    let titles: Vec<_> = state.charts.iter().map(ChartSpec::title).collect();
    assert_eq!(titles, ["a", "b", "c"]);
    assert_eq!(state.chat_history.len(), 8);
  }

  #[test]
  fn chart_count_never_shrinks() {
    let mut state = merge(None, ChatMessage::user("0"), analysis("0", Some(vec![chart("a")])));
    for i in 0..5 {
      let charts = if i % 2 == 0 { None } else { Some(vec![chart("n")]) };
      let next = merge(Some(&state), ChatMessage::user("q"), analysis("r", charts));
      assert!(next.charts.len() >= state.charts.len());
      state = next;
    }
  }
}
