//! Per-report analysis sessions.
//!
//! An [`AnalysisSession`] keeps one slot per open report: the latest
//! [`InsightState`] and a busy flag. While a slot holds insights they are the
//! source of truth; the store is written behind them, and a failed write
//! never undoes a turn. Writes for one report land in turn order, and a slot
//! is dropped once its latest state is safely stored, so the next turn reads
//! it back from the store.

use std::{
  collections::HashMap,
  sync::{Arc, Mutex, MutexGuard, PoisonError},
};

use proreporter_core::{
  Caller,
  accumulate,
  insight::{ChatMessage, InsightState},
  report::Report,
  store::ReportStore,
};
use tokio::task::JoinHandle;
use uuid::Uuid;

use crate::{
  completion::CompletionService,
  dispatch::Dispatcher,
  error::{Result, SessionError},
};

/// The query sent when a report is opened for the first time.
pub const INITIAL_PROMPT: &str = "Analyze this data. Generate a 3-sentence summary, key trends, and \
                                  3 chart recommendations with configuration details.";

/// Serialises a report's writes; holds the generation last stored.
type Writer = Arc<tokio::sync::Mutex<u64>>;

#[derive(Debug, Default)]
struct Slot {
  insights:   Option<InsightState>,
  busy:       bool,
  /// Bumped by every merged turn.
  generation: u64,
  writer:     Writer,
}

type Slots = Arc<Mutex<HashMap<Uuid, Slot>>>;

fn lock(slots: &Slots) -> MutexGuard<'_, HashMap<Uuid, Slot>> {
  slots.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Clears a report's busy flag when dropped, whichever way the turn ends.
/// A slot that never got insights is removed.
struct BusyGuard {
  slots:     Slots,
  report_id: Uuid,
}

impl Drop for BusyGuard {
  fn drop(&mut self) {
    let mut slots = lock(&self.slots);
    let empty = match slots.get_mut(&self.report_id) {
      Some(slot) => {
        slot.busy = false;
        slot.insights.is_none()
      }
      None => false,
    };
    if empty {
      slots.remove(&self.report_id);
    }
  }
}

/// Result of one chat turn.
pub struct TurnOutcome {
  /// The merged state, already visible to later turns.
  pub insights:    InsightState,
  /// The background write of `insights`; resolves to `false` only if the
  /// write failed. A write overtaken by a later turn's is skipped and
  /// counts as success.
  pub persistence: JoinHandle<bool>,
}

/// Dispatch-and-merge cycles for every open report.
///
/// Cheap to clone; all clones share the same slots.
pub struct AnalysisSession<S, C> {
  store:      Arc<S>,
  dispatcher: Arc<Dispatcher<C>>,
  slots:      Slots,
}

impl<S, C> Clone for AnalysisSession<S, C> {
  fn clone(&self) -> Self {
    Self {
      store:      Arc::clone(&self.store),
      dispatcher: Arc::clone(&self.dispatcher),
      slots:      Arc::clone(&self.slots),
    }
  }
}

impl<S, C> AnalysisSession<S, C>
where
  S: ReportStore + 'static,
  C: CompletionService + 'static,
{
  pub fn new(store: Arc<S>, dispatcher: Dispatcher<C>) -> Self {
    Self {
      store,
      dispatcher: Arc::new(dispatcher),
      slots: Arc::default(),
    }
  }

  /// Run one chat turn for `caller` on their report `report_id`.
  ///
  /// Refused with [`SessionError::Busy`] while another turn on the same
  /// report is in flight. The store write is spawned after the in-memory
  /// state is updated and the busy flag released.
  pub async fn submit(&self, caller: &Caller, report_id: Uuid, query: &str) -> Result<TurnOutcome> {
    let query = query.trim();
    if query.is_empty() {
      return Err(SessionError::EmptyQuery);
    }

    let report = self.owned_report(caller, report_id).await?;
    let (guard, in_memory) = self.claim(report_id)?;
    let (data, prior) = match in_memory {
      Some(state) => (report.data, Some(state)),
      // The slot may have been dropped after `report` was read.
      None => {
        let fresh = self.owned_report(caller, report_id).await?;
        (fresh.data, fresh.insights)
      }
    };

    tracing::info!(%report_id, user = %caller.username, "dispatching query");
    let analysis = self.dispatcher.dispatch(&data, query).await;
    let next = accumulate::merge(prior.as_ref(), ChatMessage::user(query), analysis);

    let (generation, writer) = match lock(&self.slots).get_mut(&report_id) {
      Some(slot) => {
        slot.insights = Some(next.clone());
        slot.generation += 1;
        (slot.generation, Arc::clone(&slot.writer))
      }
      // Forgotten mid-turn.
      None => (1, Writer::default()),
    };
    drop(guard);

    let persistence = self.persist(report_id, caller.user_id, generation, writer, next.clone());
    Ok(TurnOutcome { insights: next, persistence })
  }

  /// The insights to show when `caller` opens their report. A report with no
  /// insights yet gets the initial analysis first.
  pub async fn open(&self, caller: &Caller, report_id: Uuid) -> Result<InsightState> {
    let live = self.current(report_id);
    let report = self.owned_report(caller, report_id).await?;
    if let Some(insights) = live.or(report.insights) {
      return Ok(insights);
    }

    tracing::info!(%report_id, "running initial analysis");
    let outcome = self.submit(caller, report_id, INITIAL_PROMPT).await?;
    Ok(outcome.insights)
  }

  /// Write the in-memory state of `caller`'s report to the store now,
  /// returning what was written. Unlike the write behind a chat turn, a
  /// failure here is reported.
  pub async fn save(&self, caller: &Caller, report_id: Uuid) -> Result<InsightState> {
    let live = lock(&self.slots).get(&report_id).and_then(|slot| {
      let insights = slot.insights.clone()?;
      Some((insights, slot.generation, Arc::clone(&slot.writer)))
    });
    let report = self.owned_report(caller, report_id).await?;

    let insights = match live {
      Some((insights, generation, writer)) => {
        write_in_order(&*self.store, report_id, caller.user_id, generation, &writer, &insights)
          .await?;
        insights
      }
      None => {
        let insights = report.insights.ok_or(SessionError::NoInsights(report_id))?;
        self
          .store
          .save_insights(report_id, caller.user_id, &insights)
          .await
          .map_err(SessionError::store)?;
        insights
      }
    };

    tracing::info!(%report_id, charts = insights.charts.len(), "insights saved");
    Ok(insights)
  }

  /// The in-memory insights for a report, if it is held in memory.
  pub fn current(&self, report_id: Uuid) -> Option<InsightState> {
    lock(&self.slots).get(&report_id).and_then(|s| s.insights.clone())
  }

  /// Drop a report's slot, e.g. after it was deleted. A turn still in flight
  /// finishes but leaves nothing behind in memory.
  pub fn forget(&self, report_id: Uuid) {
    lock(&self.slots).remove(&report_id);
  }

  async fn owned_report(&self, caller: &Caller, report_id: Uuid) -> Result<Report> {
    self
      .store
      .get_report(report_id)
      .await
      .map_err(SessionError::store)?
      .filter(|r| caller.owns(r.user_id))
      .ok_or(SessionError::ReportNotFound(report_id))
  }

  /// Set the busy flag, returning its guard and the in-memory insights.
  fn claim(&self, report_id: Uuid) -> Result<(BusyGuard, Option<InsightState>)> {
    let mut slots = lock(&self.slots);
    let slot = slots.entry(report_id).or_default();
    if slot.busy {
      return Err(SessionError::Busy(report_id));
    }
    slot.busy = true;
    let guard = BusyGuard { slots: Arc::clone(&self.slots), report_id };
    Ok((guard, slot.insights.clone()))
  }

  fn persist(
    &self,
    report_id: Uuid,
    owner: Uuid,
    generation: u64,
    writer: Writer,
    insights: InsightState,
  ) -> JoinHandle<bool> {
    let store = Arc::clone(&self.store);
    let slots = Arc::clone(&self.slots);
    tokio::spawn(async move {
      match write_in_order(&*store, report_id, owner, generation, &writer, &insights).await {
        Ok(()) => {
          tracing::debug!(%report_id, generation, "insights persisted");
          release(&slots, report_id, generation, &writer);
          true
        }
        Err(e) => {
          tracing::warn!(%report_id, error = %e, "failed to persist insights; keeping in-memory state");
          false
        }
      }
    })
  }
}

/// Store the state of turn `generation` unless a later turn's state is
/// already stored.
async fn write_in_order<S: ReportStore>(
  store: &S,
  report_id: Uuid,
  owner: Uuid,
  generation: u64,
  writer: &tokio::sync::Mutex<u64>,
  insights: &InsightState,
) -> Result<()> {
  let mut stored = writer.lock().await;
  if *stored >= generation {
    tracing::debug!(%report_id, generation, stored = *stored, "skipping superseded write");
    return Ok(());
  }
  store
    .save_insights(report_id, owner, insights)
    .await
    .map_err(SessionError::store)?;
  *stored = generation;
  Ok(())
}

/// Drop the slot if the state just stored is still its latest and no turn
/// is running.
fn release(slots: &Slots, report_id: Uuid, generation: u64, writer: &Writer) {
  let mut slots = lock(slots);
  let idle = slots.get(&report_id).is_some_and(|slot| {
    !slot.busy && slot.generation == generation && Arc::ptr_eq(&slot.writer, writer)
  });
  if idle {
    slots.remove(&report_id);
  }
}
