//! Typed callback codec for inline menu buttons.
//!
//! Every selectable menu entry carries a `CallbackAction` serialized into the
//! transport's opaque callback payload. The encoding is a versioned,
//! colon-delimited tuple (`v1:<kind>[:<order-id>[:<payload>]]`); parsing is
//! centralized here so no handler ever branches on raw strings.

use crate::order::{OrderId, OrderStatus};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Version prefix carried by every encoded payload.
const VERSION: &str = "v1";

/// An action encoded into an inline button.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallbackAction {
	/// Show the full detail view of an order.
	ViewOrder(OrderId),
	/// Open the edit menu for an order.
	EditOrder(OrderId),
	/// Set the order's status verbatim.
	SetStatus(OrderId, OrderStatus),
	/// Set the order's due date to today plus the given number of days.
	SetDue(OrderId, u32),
	/// Ask for delete confirmation.
	DeleteConfirm(OrderId),
	/// Execute the delete.
	DeleteExecute(OrderId),
	/// Admin confirmed the full store reset.
	ResetConfirm,
	/// Admin cancelled the reset.
	ResetCancel,
}

/// Errors returned when decoding a callback payload.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CallbackParseError {
	#[error("Unsupported callback version: {0}")]
	Version(String),
	#[error("Unknown callback kind: {0}")]
	Kind(String),
	#[error("Malformed callback payload: {0}")]
	Malformed(String),
}

impl CallbackAction {
	/// Serializes the action into the wire payload.
	pub fn encode(&self) -> String {
		match self {
			CallbackAction::ViewOrder(id) => format!("{}:view:{}", VERSION, id),
			CallbackAction::EditOrder(id) => format!("{}:edit:{}", VERSION, id),
			CallbackAction::SetStatus(id, status) => {
				format!("{}:status:{}:{}", VERSION, id, status.token())
			},
			CallbackAction::SetDue(id, days) => format!("{}:due:{}:{}", VERSION, id, days),
			CallbackAction::DeleteConfirm(id) => format!("{}:delete:{}", VERSION, id),
			CallbackAction::DeleteExecute(id) => format!("{}:delete_go:{}", VERSION, id),
			CallbackAction::ResetConfirm => format!("{}:reset_go", VERSION),
			CallbackAction::ResetCancel => format!("{}:reset_no", VERSION),
		}
	}
}

impl fmt::Display for CallbackAction {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}", self.encode())
	}
}

impl FromStr for CallbackAction {
	type Err = CallbackParseError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		let mut parts = s.split(':');

		let version = parts.next().unwrap_or_default();
		if version != VERSION {
			return Err(CallbackParseError::Version(version.to_string()));
		}

		let kind = parts
			.next()
			.ok_or_else(|| CallbackParseError::Malformed(s.to_string()))?;

		let mut next_id = || -> Result<OrderId, CallbackParseError> {
			let raw = parts
				.next()
				.ok_or_else(|| CallbackParseError::Malformed(s.to_string()))?;
			raw.parse::<u64>()
				.map(OrderId)
				.map_err(|_| CallbackParseError::Malformed(s.to_string()))
		};

		let action = match kind {
			"view" => CallbackAction::ViewOrder(next_id()?),
			"edit" => CallbackAction::EditOrder(next_id()?),
			"status" => {
				let id = next_id()?;
				let token = parts
					.next()
					.ok_or_else(|| CallbackParseError::Malformed(s.to_string()))?;
				let status = token
					.parse::<OrderStatus>()
					.map_err(|_| CallbackParseError::Malformed(s.to_string()))?;
				CallbackAction::SetStatus(id, status)
			},
			"due" => {
				let id = next_id()?;
				let days = parts
					.next()
					.and_then(|raw| raw.parse::<u32>().ok())
					.ok_or_else(|| CallbackParseError::Malformed(s.to_string()))?;
				CallbackAction::SetDue(id, days)
			},
			"delete" => CallbackAction::DeleteConfirm(next_id()?),
			"delete_go" => CallbackAction::DeleteExecute(next_id()?),
			"reset_go" => CallbackAction::ResetConfirm,
			"reset_no" => CallbackAction::ResetCancel,
			other => return Err(CallbackParseError::Kind(other.to_string())),
		};

		// Trailing fields are a malformed payload, not extra context.
		if parts.next().is_some() {
			return Err(CallbackParseError::Malformed(s.to_string()));
		}

		Ok(action)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn encode_parse_round_trip() {
		let actions = [
			CallbackAction::ViewOrder(OrderId(12)),
			CallbackAction::EditOrder(OrderId(3)),
			CallbackAction::SetStatus(OrderId(5), OrderStatus::Ready),
			CallbackAction::SetDue(OrderId(5), 7),
			CallbackAction::DeleteConfirm(OrderId(9)),
			CallbackAction::DeleteExecute(OrderId(9)),
			CallbackAction::ResetConfirm,
			CallbackAction::ResetCancel,
		];

		for action in actions {
			let encoded = action.encode();
			assert_eq!(encoded.parse::<CallbackAction>().unwrap(), action);
		}
	}

	#[test]
	fn wire_format_is_stable() {
		assert_eq!(
			CallbackAction::SetStatus(OrderId(12), OrderStatus::InProgress).encode(),
			"v1:status:12:in_progress"
		);
		assert_eq!(CallbackAction::SetDue(OrderId(4), 15).encode(), "v1:due:4:15");
		assert_eq!(CallbackAction::ResetConfirm.encode(), "v1:reset_go");
	}

	#[test]
	fn rejects_unversioned_payloads() {
		assert!(matches!(
			"view:12".parse::<CallbackAction>(),
			Err(CallbackParseError::Version(_))
		));
	}

	#[test]
	fn rejects_unknown_kind() {
		assert!(matches!(
			"v1:explode:1".parse::<CallbackAction>(),
			Err(CallbackParseError::Kind(_))
		));
	}

	#[test]
	fn rejects_malformed_payloads() {
		for raw in ["v1:view", "v1:view:abc", "v1:due:3", "v1:status:3:sideways", "v1:view:1:9"] {
			assert!(matches!(
				raw.parse::<CallbackAction>(),
				Err(CallbackParseError::Malformed(_))
			));
		}
	}
}
