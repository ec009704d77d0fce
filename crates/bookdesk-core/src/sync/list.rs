//! Filtered, owned projection of one remote table.
//!
//! A `ListSynchronizer` keeps a collection of records consistent with the
//! remote store across filter changes, single and batch status transitions,
//! and partial failure. Every fetch is stamped with the generation that was
//! current when it was issued; a result whose stamp no longer matches is
//! dropped without touching any state. Mutations never re-fetch: a
//! successful transition removes the affected records locally, and the
//! selection loses the same ids under the same lock.

use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard};

use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::api::ListSource;
use crate::models::{Filter, Record, StatusRecord};

use super::selection::SelectionController;

/// What happened to an operation once it settled.
///
/// Failures are not returned as errors; they are recorded in the
/// synchronizer's `error` flag and this only reports that it happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The result was written to the collection.
    Committed,
    /// The result arrived after a newer filter change or after unmount.
    Discarded,
    /// The remote call failed; `error` holds the message.
    Failed,
    /// Nothing to do (empty batch).
    Skipped,
}

/// Point-in-time copy of a synchronizer's state, for rendering.
#[derive(Debug, Clone)]
pub struct SyncSnapshot<R: StatusRecord> {
    pub filter: Filter<R::Status>,
    pub loading: bool,
    pub error: Option<String>,
    pub records: Vec<R>,
    pub selected: HashSet<R::Id>,
    pub revision: u64,
}

impl<R: StatusRecord> SyncSnapshot<R> {
    pub fn is_selected(&self, id: &R::Id) -> bool {
        self.selected.contains(id)
    }

    pub fn bulk_disabled(&self) -> bool {
        self.selected.is_empty() || self.loading
    }
}

struct SyncState<R: StatusRecord> {
    filter: Filter<R::Status>,
    generation: u64,
    /// Generation of the fetch whose result the view is waiting for.
    fetching: Option<u64>,
    /// Transitions issued and not yet settled.
    mutations: usize,
    error: Option<String>,
    records: Vec<R>,
    selection: SelectionController<R::Id>,
    revision: u64,
    mounted: bool,
}

impl<R: StatusRecord> SyncState<R> {
    fn is_loading(&self) -> bool {
        self.fetching.is_some() || self.mutations > 0
    }

    fn release(&mut self, hold: Hold) {
        match hold {
            // A superseded fetch gave up its slot when the newer one began.
            Hold::Fetch(generation) => {
                if self.fetching == Some(generation) {
                    self.fetching = None;
                }
            }
            Hold::Mutation => self.mutations = self.mutations.saturating_sub(1),
        }
    }

    fn replace_records(&mut self, records: Vec<R>) {
        self.records = records;
        let present: HashSet<R::Id> = self.records.iter().map(Record::id).collect();
        self.selection.retain_present(|id| present.contains(id));
        self.revision += 1;
    }

    /// Remove every record whose id is in `ids`, in one pass.
    fn remove_ids(&mut self, ids: &HashSet<R::Id>) -> usize {
        let before = self.records.len();
        self.records.retain(|record| !ids.contains(&record.id()));
        let removed = before - self.records.len();
        self.selection.retain_present(|id| !ids.contains(id));
        if removed > 0 {
            self.revision += 1;
        }
        removed
    }
}

#[derive(Debug, Clone, Copy)]
enum Hold {
    Fetch(u64),
    Mutation,
}

/// An operation's share of `loading`. Released when the operation settles,
/// including when its future is dropped part way.
struct InFlight<'a, R: StatusRecord> {
    sync: &'a ListSynchronizer<R>,
    hold: Hold,
    armed: bool,
}

impl<'a, R: StatusRecord> InFlight<'a, R> {
    fn new(sync: &'a ListSynchronizer<R>, hold: Hold) -> Self {
        Self {
            sync,
            hold,
            armed: true,
        }
    }

    /// Release under a lock the caller already holds.
    fn settle(mut self, state: &mut SyncState<R>) {
        state.release(self.hold);
        self.armed = false;
    }
}

impl<R: StatusRecord> Drop for InFlight<'_, R> {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        debug!(hold = ?self.hold, "Operation dropped before settling");
        let mut state = self.sync.lock();
        state.release(self.hold);
        self.sync.publish(&state);
    }
}

pub struct ListSynchronizer<R: StatusRecord> {
    source: Arc<dyn ListSource<R>>,
    state: Mutex<SyncState<R>>,
    revision_tx: watch::Sender<u64>,
}

impl<R: StatusRecord> ListSynchronizer<R> {
    /// Create a synchronizer for `filter`. Nothing is fetched until
    /// [`set_filter`](Self::set_filter) or [`refresh`](Self::refresh) runs.
    pub fn new(source: Arc<dyn ListSource<R>>, filter: Filter<R::Status>) -> Self {
        let (revision_tx, _) = watch::channel(0);
        Self {
            source,
            state: Mutex::new(SyncState {
                filter,
                generation: 0,
                fetching: None,
                mutations: 0,
                error: None,
                records: Vec::new(),
                selection: SelectionController::new(),
                revision: 0,
                mounted: true,
            }),
            revision_tx,
        }
    }

    fn lock(&self) -> MutexGuard<'_, SyncState<R>> {
        self.state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn publish(&self, state: &SyncState<R>) {
        self.revision_tx.send_replace(state.revision);
    }

    // =========================================================================
    // Fetching
    // =========================================================================

    /// Switch to `filter` and fetch its records.
    ///
    /// Any fetch still in flight for an earlier filter loses the right to
    /// commit. `Filter::NoStatus` commits an empty collection immediately.
    pub async fn set_filter(&self, filter: Filter<R::Status>) -> Outcome {
        self.fetch(Some(filter)).await
    }

    /// Re-fetch the active filter. This is the only way to reconcile the
    /// collection after optimistic removals.
    pub async fn refresh(&self) -> Outcome {
        self.fetch(None).await
    }

    async fn fetch(&self, new_filter: Option<Filter<R::Status>>) -> Outcome {
        let filter_changed = new_filter.is_some();
        let (generation, status, hold) = {
            let mut state = self.lock();
            if !state.mounted {
                debug!("Fetch requested after unmount, ignoring");
                return Outcome::Discarded;
            }
            if let Some(filter) = new_filter {
                state.filter = filter;
            }
            state.generation += 1;
            state.error = None;
            let generation = state.generation;

            match state.filter.status() {
                Some(status) => {
                    state.fetching = Some(generation);
                    self.publish(&state);
                    (generation, status, InFlight::new(self, Hold::Fetch(generation)))
                }
                None => {
                    debug!("No-status filter active, committing empty collection");
                    state.fetching = None;
                    state.replace_records(Vec::new());
                    self.publish(&state);
                    return Outcome::Committed;
                }
            }
        };

        info!(%status, generation, "Fetching records");
        let result = self.source.fetch_by_filter(status).await;

        let mut state = self.lock();
        hold.settle(&mut state);
        if !state.mounted || state.generation != generation {
            debug!(
                %status,
                generation,
                current = state.generation,
                "Discarding stale fetch result"
            );
            return Outcome::Discarded;
        }

        let outcome = match result {
            Ok(records) => {
                debug!(%status, count = records.len(), "Fetch committed");
                state.replace_records(records);
                Outcome::Committed
            }
            Err(e) => {
                warn!(%status, error = %e, "Fetch failed");
                state.error = Some(e.user_message());
                if filter_changed {
                    // The old records belong to another filter.
                    state.replace_records(Vec::new());
                }
                Outcome::Failed
            }
        };
        self.publish(&state);
        outcome
    }

    // =========================================================================
    // Status transitions
    // =========================================================================

    /// Move one record to `status`, removing it locally on success.
    pub async fn transition(&self, id: R::Id, status: R::Status) -> Outcome {
        let hold = match self.begin_mutation() {
            Some(hold) => hold,
            None => return Outcome::Discarded,
        };

        info!(%id, %status, "Transitioning record");
        let result = self.source.update_status(&id, status).await;
        self.finish_mutation(hold, HashSet::from([id]), status, result)
    }

    /// Move every record in `ids` to `status` with one remote call.
    ///
    /// An empty `ids` is a no-op: no remote call, no flag changes.
    pub async fn transition_many(&self, ids: &[R::Id], status: R::Status) -> Outcome {
        if ids.is_empty() {
            debug!(%status, "Empty batch transition, skipping");
            return Outcome::Skipped;
        }
        let hold = match self.begin_mutation() {
            Some(hold) => hold,
            None => return Outcome::Discarded,
        };

        info!(count = ids.len(), %status, "Transitioning batch");
        let result = self.source.update_status_many(ids, status).await;
        self.finish_mutation(hold, ids.iter().cloned().collect(), status, result)
    }

    fn begin_mutation(&self) -> Option<InFlight<'_, R>> {
        let mut state = self.lock();
        if !state.mounted {
            debug!("Mutation requested after unmount, ignoring");
            return None;
        }
        state.mutations += 1;
        state.error = None;
        self.publish(&state);
        Some(InFlight::new(self, Hold::Mutation))
    }

    fn finish_mutation(
        &self,
        hold: InFlight<'_, R>,
        ids: HashSet<R::Id>,
        status: R::Status,
        result: Result<(), crate::api::ApiError>,
    ) -> Outcome {
        let mut state = self.lock();
        hold.settle(&mut state);
        if !state.mounted {
            debug!(%status, "Mutation settled after unmount, discarding");
            return Outcome::Discarded;
        }

        let outcome = match result {
            Ok(()) => {
                let removed = state.remove_ids(&ids);
                info!(%status, removed, "Transition committed");
                Outcome::Committed
            }
            Err(e) => {
                warn!(%status, error = %e, "Transition failed");
                state.error = Some(e.user_message());
                Outcome::Failed
            }
        };
        self.publish(&state);
        outcome
    }

    // =========================================================================
    // Selection
    // =========================================================================

    /// Flip selection of `id`. Ids not in the collection are ignored.
    pub fn toggle_selected(&self, id: R::Id) -> bool {
        let mut state = self.lock();
        if !state.records.iter().any(|record| record.id() == id) {
            return false;
        }
        let selected = state.selection.toggle(id);
        self.publish(&state);
        selected
    }

    pub fn select_all(&self) {
        let mut state = self.lock();
        let ids: Vec<R::Id> = state.records.iter().map(Record::id).collect();
        state.selection.select_all(ids);
        self.publish(&state);
    }

    pub fn clear_selection(&self) {
        let mut state = self.lock();
        state.selection.clear();
        self.publish(&state);
    }

    /// Selected ids in collection order.
    pub fn selected_ids(&self) -> Vec<R::Id> {
        let state = self.lock();
        let ids = state
            .records
            .iter()
            .map(Record::id)
            .filter(|id| state.selection.contains(id))
            .collect();
        ids
    }

    pub fn selection_count(&self) -> usize {
        self.lock().selection.count()
    }

    pub fn bulk_actions_disabled(&self) -> bool {
        let state = self.lock();
        state.selection.bulk_disabled(state.is_loading())
    }

    // =========================================================================
    // Observation
    // =========================================================================

    pub fn filter(&self) -> Filter<R::Status> {
        self.lock().filter
    }

    /// True while the active filter's fetch or any transition is in flight.
    pub fn is_loading(&self) -> bool {
        self.lock().is_loading()
    }

    pub fn error(&self) -> Option<String> {
        self.lock().error.clone()
    }

    pub fn clear_error(&self) {
        let mut state = self.lock();
        state.error = None;
        self.publish(&state);
    }

    pub fn records(&self) -> Vec<R> {
        self.lock().records.clone()
    }

    pub fn len(&self) -> usize {
        self.lock().records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().records.is_empty()
    }

    /// Bumped once for every committed change to the collection.
    pub fn revision(&self) -> u64 {
        self.lock().revision
    }

    /// Receive the revision after every observable state change: collection
    /// commits, loading and error flags, and selection edits.
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.revision_tx.subscribe()
    }

    pub fn snapshot(&self) -> SyncSnapshot<R> {
        let state = self.lock();
        SyncSnapshot {
            filter: state.filter,
            loading: state.is_loading(),
            error: state.error.clone(),
            records: state.records.clone(),
            selected: state.selection.ids().clone(),
            revision: state.revision,
        }
    }

    /// Mark the owning view as gone. Every later commit is discarded.
    pub fn unmount(&self) {
        let mut state = self.lock();
        state.mounted = false;
        state.generation += 1;
        debug!("Synchronizer unmounted");
    }

    pub fn is_mounted(&self) -> bool {
        self.lock().mounted
    }
}
