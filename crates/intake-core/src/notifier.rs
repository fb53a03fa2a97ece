//! Deadline notifier.
//!
//! A periodic sweep over reminder candidates: every order that is neither
//! terminal nor already reminded gets one reminder to its originating chat
//! once the due date is less than the configured window away. The flag is
//! only set after a successful send, so a failed delivery is retried on
//! the next sweep. An order whose due date has already passed is never
//! reminded.

use chrono::{Duration, NaiveDateTime};
use intake_storage::StoreService;
use intake_transport::TransportService;
use intake_types::{format_date, ReminderCandidate};
use std::sync::Arc;
use thiserror::Error;

/// Errors from a single reminder attempt; the sweep logs and continues.
#[derive(Debug, Error)]
enum ReminderError {
	#[error("Transport error: {0}")]
	Transport(String),
	#[error("Store error: {0}")]
	Store(String),
}

/// Periodic due-date reminder sweep.
pub struct DeadlineNotifier {
	store: Arc<StoreService>,
	transport: Arc<TransportService>,
	window: Duration,
}

impl DeadlineNotifier {
	pub fn new(store: Arc<StoreService>, transport: Arc<TransportService>, window_hours: u64) -> Self {
		Self {
			store,
			transport,
			window: Duration::hours(window_hours as i64),
		}
	}

	/// Runs one sweep at the given wall-clock instant.
	///
	/// Failures are contained per candidate: a store error aborts the
	/// sweep (nothing to iterate), a delivery error is logged and the
	/// sweep moves on, leaving the flag unset for the next run.
	pub async fn run_once(&self, now: NaiveDateTime) {
		let candidates = match self.store.reminder_candidates().await {
			Ok(candidates) => candidates,
			Err(e) => {
				tracing::error!(error = %e, "Failed to load reminder candidates");
				return;
			},
		};

		for candidate in candidates {
			if !self.is_due_soon(&candidate, now) {
				continue;
			}
			if let Err(e) = self.remind(&candidate).await {
				tracing::warn!(
					order_id = %candidate.id,
					error = %e,
					"Failed to deliver deadline reminder"
				);
			}
		}
	}

	/// A reminder fires while the due date is ahead of `now` but closer
	/// than the window. Midnight of the due date is the deadline, so an
	/// order already past it is silently skipped.
	fn is_due_soon(&self, candidate: &ReminderCandidate, now: NaiveDateTime) -> bool {
		let Some(deadline) = candidate.due_date.and_hms_opt(0, 0, 0) else {
			return false;
		};
		now < deadline && deadline - now < self.window
	}

	async fn remind(&self, candidate: &ReminderCandidate) -> Result<(), ReminderError> {
		let text = format!(
			"Reminder: order #{} ({}) is due {}.",
			candidate.id,
			candidate.description,
			format_date(candidate.due_date),
		);
		self.transport
			.send_message(candidate.chat, &text, None)
			.await
			.map_err(|e| ReminderError::Transport(e.to_string()))?;
		self.store
			.mark_notified(candidate.id)
			.await
			.map_err(|e| ReminderError::Store(e.to_string()))?;
		tracing::info!(order_id = %candidate.id, "Deadline reminder sent");
		Ok(())
	}
}
