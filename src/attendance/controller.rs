use std::sync::{Mutex, MutexGuard, PoisonError};

use chrono::NaiveDate;
use tracing::{debug, warn};

use super::error::AttendanceError;
use super::service::{AggregateResult, AttendanceService};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryState {
    Idle,
    Selected,
    Loading,
    Error,
}

/// Employee under inspection plus an optional day filter. An empty
/// `employee_id` means nothing is selected.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QuerySelection {
    pub employee_id: String,
    pub date: Option<NaiveDate>,
}

impl QuerySelection {
    pub fn has_employee(&self) -> bool {
        !self.employee_id.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryOutcome {
    /// Fresh aggregate attached to the selection.
    Completed(AggregateResult),
    /// Query failed; the aggregate was reset to empty.
    Failed(String),
    /// Another query was already loading, so this one was dropped.
    Rejected,
    /// A write landed while a query was loading; that query re-runs once
    /// before it settles.
    RefreshQueued,
    /// Selection changed while the query ran; the response was discarded.
    Stale,
    /// No employee selected, nothing to run.
    Skipped,
}

/// Point-in-time copy of everything the controller holds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControllerSnapshot {
    pub state: QueryState,
    pub selection: QuerySelection,
    pub aggregate: AggregateResult,
    pub error: Option<String>,
}

struct Inner {
    state: QueryState,
    selection: QuerySelection,
    aggregate: AggregateResult,
    error: Option<String>,
    // Bumped on every selection change; a response carrying an older value is stale.
    generation: u64,
    refresh_pending: bool,
}

/// Owns one query selection and the aggregate derived from it.
///
/// At most one query is loading at a time. Calling [`run_query`] while a query
/// is loading returns [`QueryOutcome::Rejected`] without contacting the store.
/// Changing the employee while a query is loading leaves that query to finish
/// on its own, but its response is dropped as [`QueryOutcome::Stale`].
///
/// A write for the selected employee committed while a query is loading may
/// have missed that query's read, so [`notify_write_committed`] marks a
/// refresh as pending and the loading query fetches again before settling.
///
/// [`notify_write_committed`]: QueryController::notify_write_committed
/// [`run_query`]: QueryController::run_query
pub struct QueryController {
    service: AttendanceService,
    inner: Mutex<Inner>,
}

impl QueryController {
    pub fn new(service: AttendanceService) -> Self {
        Self {
            service,
            inner: Mutex::new(Inner {
                state: QueryState::Idle,
                selection: QuerySelection::default(),
                aggregate: AggregateResult::default(),
                error: None,
                generation: 0,
                refresh_pending: false,
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn state(&self) -> QueryState {
        self.lock().state
    }

    pub fn selection(&self) -> QuerySelection {
        self.lock().selection.clone()
    }

    pub fn snapshot(&self) -> ControllerSnapshot {
        let inner = self.lock();
        ControllerSnapshot {
            state: inner.state,
            selection: inner.selection.clone(),
            aggregate: inner.aggregate.clone(),
            error: inner.error.clone(),
        }
    }

    /// Switches the inspected employee. The date filter and any held
    /// aggregate are cleared in the same update.
    pub fn select_employee(&self, employee_id: &str) {
        let employee_id = employee_id.trim();
        let mut inner = self.lock();

        inner.selection = QuerySelection {
            employee_id: employee_id.to_string(),
            date: None,
        };
        inner.aggregate = AggregateResult::default();
        inner.error = None;
        inner.generation += 1;
        inner.refresh_pending = false;
        inner.state = if employee_id.is_empty() {
            QueryState::Idle
        } else {
            QueryState::Selected
        };
    }

    /// Sets or clears the day filter. Ignored unless an employee is selected
    /// and no query is loading. Returns whether the filter was applied.
    pub fn set_date_filter(&self, date: Option<NaiveDate>) -> bool {
        let mut inner = self.lock();
        let accepts = matches!(inner.state, QueryState::Selected | QueryState::Error)
            && inner.selection.has_employee();
        if !accepts {
            debug!(state = ?inner.state, "Date filter ignored");
            return false;
        }

        if inner.selection.date != date {
            inner.selection.date = date;
            inner.generation += 1;
        }
        true
    }

    pub async fn run_query(&self) -> QueryOutcome {
        let (mut requested, mut generation) = {
            let mut inner = self.lock();
            match inner.state {
                QueryState::Loading => {
                    debug!(employee_id = %inner.selection.employee_id, "Query already loading");
                    return QueryOutcome::Rejected;
                }
                QueryState::Idle => return QueryOutcome::Skipped,
                QueryState::Selected | QueryState::Error => {}
            }
            if !inner.selection.has_employee() {
                return QueryOutcome::Skipped;
            }
            inner.state = QueryState::Loading;
            (inner.selection.clone(), inner.generation)
        };

        loop {
            let mut guard = LoadingGuard {
                controller: self,
                generation,
                armed: true,
            };
            let result = self
                .service
                .query_attendance(&requested.employee_id, requested.date)
                .await;
            guard.armed = false;

            let mut inner = self.lock();
            if inner.generation != generation || inner.selection != requested {
                debug!(employee_id = %requested.employee_id, "Discarding stale attendance response");
                return QueryOutcome::Stale;
            }

            if inner.refresh_pending {
                debug!(employee_id = %requested.employee_id, "Re-running query after committed write");
                inner.refresh_pending = false;
                requested = inner.selection.clone();
                generation = inner.generation;
                continue;
            }

            return self.settle(&mut inner, &requested, result);
        }
    }

    fn settle(
        &self,
        inner: &mut Inner,
        requested: &QuerySelection,
        result: Result<AggregateResult, AttendanceError>,
    ) -> QueryOutcome {
        match result {
            Ok(aggregate) => {
                inner.state = QueryState::Selected;
                inner.aggregate = aggregate.clone();
                inner.error = None;
                QueryOutcome::Completed(aggregate)
            }
            Err(e) => {
                warn!(error = %e, employee_id = %requested.employee_id, "Attendance query failed");
                let message = e.user_message();
                inner.state = QueryState::Error;
                inner.aggregate = AggregateResult::default();
                inner.error = Some(message.clone());
                QueryOutcome::Failed(message)
            }
        }
    }

    /// Re-runs the query when a committed write targets the selected
    /// employee. Returns `None` when the write concerns someone else, and
    /// [`QueryOutcome::RefreshQueued`] when a loading query will pick it up.
    pub async fn notify_write_committed(&self, written_employee_id: &str) -> Option<QueryOutcome> {
        let written_employee_id = written_employee_id.trim();
        {
            let mut inner = self.lock();
            if !inner.selection.has_employee() || inner.selection.employee_id != written_employee_id {
                return None;
            }
            if inner.state == QueryState::Loading {
                inner.refresh_pending = true;
                return Some(QueryOutcome::RefreshQueued);
            }
        }

        Some(self.run_query().await)
    }
}

/// Puts the controller back to `Selected` if a loading query is dropped
/// before it completes, so later queries are not rejected forever.
struct LoadingGuard<'a> {
    controller: &'a QueryController,
    generation: u64,
    armed: bool,
}

impl Drop for LoadingGuard<'_> {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        let mut inner = self.controller.lock();
        if inner.generation == self.generation && inner.state == QueryState::Loading {
            inner.state = QueryState::Selected;
            inner.refresh_pending = false;
        }
    }
}
