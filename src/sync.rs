//! Pending-order synchronization.
//!
//! Each tick fetches every order from the backend, keeps the `PENDING` ones,
//! and diffs them against the orders the desk currently tracks. The diff is
//! emitted as add/remove events that the list view applies. Polling only runs
//! while the synchronizer is active; the confirmation modal suspends it.

use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};

use crate::api::OrderApi;
use crate::error::DeskError;
use crate::models::OrderSummary;

/// How a tick decides what changed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiffMode {
    /// Compare ids every tick; adds and removes are detected independently.
    #[default]
    Membership,
    /// Only look at the sign of the pending-count change. A tick where one
    /// order arrives and another leaves goes unnoticed.
    PendingCount,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SyncEvent {
    Added(OrderSummary),
    Removed(OrderSummary),
}

#[derive(Debug)]
pub struct SyncState {
    tracked: Vec<OrderSummary>,
    last_pending_count: usize,
    /// Set while the confirmation modal is open; no polling happens then.
    modal_open: bool,
}

impl Default for SyncState {
    fn default() -> Self {
        Self::new()
    }
}

impl SyncState {
    pub fn new() -> Self {
        Self {
            tracked: Vec::new(),
            last_pending_count: 0,
            modal_open: false,
        }
    }

    pub fn tracked(&self) -> &[OrderSummary] {
        &self.tracked
    }

    pub fn get(&self, order_id: &str) -> Option<&OrderSummary> {
        self.tracked.iter().find(|o| o.id == order_id)
    }

    pub fn is_tracked(&self, order_id: &str) -> bool {
        self.get(order_id).is_some()
    }

    pub fn last_pending_count(&self) -> usize {
        self.last_pending_count
    }

    pub fn is_active(&self) -> bool {
        !self.modal_open
    }

    /// Stop polling because the modal opened. Returns false when already
    /// suspended so callers never suspend twice.
    pub fn suspend(&mut self) -> bool {
        if self.modal_open {
            return false;
        }
        self.modal_open = true;
        debug!("Order polling suspended");
        true
    }

    pub fn resume(&mut self) -> bool {
        if !self.modal_open {
            return false;
        }
        self.modal_open = false;
        debug!("Order polling resumed");
        true
    }

    /// Diff a fresh fetch (any status) against the tracked set.
    pub fn apply_fetch(&mut self, fetched: &[OrderSummary], mode: DiffMode) -> Vec<SyncEvent> {
        let pending: Vec<&OrderSummary> = fetched.iter().filter(|o| o.is_pending()).collect();
        let current = pending.len();
        let previous = self.last_pending_count;
        debug!(current, previous, ?mode, "Pending order count");

        let (detect_adds, detect_removes) = match mode {
            DiffMode::Membership => (true, true),
            DiffMode::PendingCount => (current > previous, current < previous),
        };
        if !detect_adds && !detect_removes {
            return Vec::new();
        }

        let mut events = Vec::new();
        if detect_removes {
            let mut kept = Vec::with_capacity(self.tracked.len());
            for order in self.tracked.drain(..) {
                if pending.iter().any(|p| p.id == order.id) {
                    kept.push(order);
                } else {
                    events.push(SyncEvent::Removed(order));
                }
            }
            self.tracked = kept;
        }
        if detect_adds {
            events.extend(self.add_untracked(&pending));
        }
        self.last_pending_count = current;

        if !events.is_empty() {
            info!(
                added = events.iter().filter(|e| matches!(e, SyncEvent::Added(_))).count(),
                removed = events.iter().filter(|e| matches!(e, SyncEvent::Removed(_))).count(),
                "Pending orders changed"
            );
        }
        events
    }

    /// Manual reload: start tracking every pending order not yet tracked.
    /// Never removes anything and leaves the pending count alone, so a drop
    /// the reload skipped is still seen as a decrease by the next tick.
    pub fn merge_fetch(&mut self, fetched: &[OrderSummary]) -> Vec<SyncEvent> {
        let pending: Vec<&OrderSummary> = fetched.iter().filter(|o| o.is_pending()).collect();
        self.add_untracked(&pending)
    }

    /// Drop an order after a local delete or release. The local view runs
    /// ahead of the server until the next poll.
    pub fn remove_local(&mut self, order_id: &str) -> Option<OrderSummary> {
        let idx = self.tracked.iter().position(|o| o.id == order_id)?;
        self.last_pending_count = self.last_pending_count.saturating_sub(1);
        Some(self.tracked.remove(idx))
    }

    fn add_untracked(&mut self, pending: &[&OrderSummary]) -> Vec<SyncEvent> {
        let mut events = Vec::new();
        for order in pending {
            if !self.is_tracked(&order.id) {
                self.tracked.push((*order).clone());
                events.push(SyncEvent::Added((*order).clone()));
            }
        }
        events
    }
}

/// Run one polling tick. Does nothing while suspended. A failed fetch leaves
/// the state untouched.
pub async fn poll_once(
    state: &mut SyncState,
    api: &dyn OrderApi,
    mode: DiffMode,
) -> Result<Vec<SyncEvent>, DeskError> {
    if !state.is_active() {
        debug!("Poll skipped while suspended");
        return Ok(Vec::new());
    }
    match api.list_orders().await {
        Ok(fetched) => Ok(state.apply_fetch(&fetched, mode)),
        Err(e) if e.is_transport() => {
            warn!(error = %e, "Error fetching orders; skipping tick");
            Err(e)
        }
        Err(e) => {
            error!(error = %e, "Unreadable order list; skipping tick");
            Err(e)
        }
    }
}
