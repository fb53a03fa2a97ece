//! Order domain model.
//!
//! This module defines the single persisted entity of the system, the
//! `Order`, together with the draft accumulated by the wizard and the
//! narrow row types returned by store queries.

use crate::chat::{ChatId, PhotoRef};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Store-assigned order identifier.
///
/// Identifiers are assigned monotonically starting at 1 and are never reused
/// except after a full reset of the store.
#[derive(
	Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct OrderId(pub u64);

impl fmt::Display for OrderId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}", self.0)
	}
}

/// Lifecycle status of an order.
///
/// There is deliberately no transition graph: any status may follow any
/// other, chosen freely from the edit menu. `Completed` is the only terminal
/// status and is excluded from active listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderStatus {
	New,
	InProgress,
	Ready,
	Completed,
}

impl OrderStatus {
	/// Stable token used in callback payloads and persisted records.
	pub fn token(&self) -> &'static str {
		match self {
			OrderStatus::New => "new",
			OrderStatus::InProgress => "in_progress",
			OrderStatus::Ready => "ready",
			OrderStatus::Completed => "completed",
		}
	}

	/// Statuses selectable from the edit menu.
	pub fn menu_choices() -> [OrderStatus; 3] {
		[
			OrderStatus::InProgress,
			OrderStatus::Ready,
			OrderStatus::Completed,
		]
	}

	pub fn is_terminal(&self) -> bool {
		matches!(self, OrderStatus::Completed)
	}
}

impl fmt::Display for OrderStatus {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let label = match self {
			OrderStatus::New => "New",
			OrderStatus::InProgress => "In Progress",
			OrderStatus::Ready => "Ready",
			OrderStatus::Completed => "Completed",
		};
		write!(f, "{}", label)
	}
}

impl FromStr for OrderStatus {
	type Err = UnknownStatus;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s {
			"new" => Ok(OrderStatus::New),
			"in_progress" => Ok(OrderStatus::InProgress),
			"ready" => Ok(OrderStatus::Ready),
			"completed" => Ok(OrderStatus::Completed),
			other => Err(UnknownStatus(other.to_string())),
		}
	}
}

/// Error returned when parsing an unrecognized status token.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown order status: {0}")]
pub struct UnknownStatus(pub String);

/// A persisted order record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
	/// Unique identifier assigned by the store.
	pub id: OrderId,
	/// Chat the order was created from; target of the deadline reminder.
	pub originating_chat: ChatId,
	/// Handle to the uploaded order photo.
	pub photo: PhotoRef,
	/// Free-form order description.
	pub description: String,
	/// Customer phone number.
	pub phone: String,
	/// Delivery address.
	pub address: String,
	/// Current lifecycle status.
	pub status: OrderStatus,
	/// Day-precision due date.
	pub due_date: NaiveDate,
	/// Creation timestamp, set once by the store service.
	pub created_at: DateTime<Utc>,
	/// Whether the deadline reminder has been sent for this order.
	/// Flips false -> true at most once, never reverts.
	pub notification_sent: bool,
}

/// A fully collected order ready to be persisted.
///
/// Produced from a complete [`OrderDraft`]; the store assigns the id and the
/// store service stamps `created_at`, `status = New` and
/// `notification_sent = false`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewOrder {
	pub originating_chat: ChatId,
	pub photo: PhotoRef,
	pub description: String,
	pub phone: String,
	pub address: String,
	pub due_date: NaiveDate,
}

/// The wizard's accumulating partial order.
///
/// One field is filled per wizard step; the draft converts into a
/// [`NewOrder`] only once every field is present.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderDraft {
	pub originating_chat: ChatId,
	pub photo: Option<PhotoRef>,
	pub description: Option<String>,
	pub phone: Option<String>,
	pub address: Option<String>,
	pub due_date: Option<NaiveDate>,
}

impl OrderDraft {
	pub fn new(originating_chat: ChatId) -> Self {
		Self {
			originating_chat,
			photo: None,
			description: None,
			phone: None,
			address: None,
			due_date: None,
		}
	}

	/// Converts the draft into a [`NewOrder`] if all fields were collected.
	pub fn into_new_order(self) -> Option<NewOrder> {
		Some(NewOrder {
			originating_chat: self.originating_chat,
			photo: self.photo?,
			description: self.description?,
			phone: self.phone?,
			address: self.address?,
			due_date: self.due_date?,
		})
	}
}

/// Listing row: enough to render one selectable menu entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderSummary {
	pub id: OrderId,
	pub description: String,
}

/// Row returned by the reminder-candidate query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReminderCandidate {
	pub id: OrderId,
	pub chat: ChatId,
	pub description: String,
	pub due_date: NaiveDate,
}
