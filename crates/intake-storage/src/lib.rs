//! Order store for the intake bot.
//!
//! This module provides the persistence abstraction for order records,
//! supporting different backend implementations such as in-memory or
//! file-based storage. The contract is deliberately narrow: order CRUD, the
//! active listing, the reminder-candidate query and the full reset.

use async_trait::async_trait;
use chrono::NaiveDate;
use intake_types::{
	ConfigSchema, ImplementationRegistry, NewOrder, Order, OrderDraft, OrderId, OrderStatus,
	OrderSummary, ReminderCandidate,
};
use thiserror::Error;

/// Re-export implementations
pub mod implementations {
	pub mod file;
	pub mod memory;
}

/// Errors that can occur during store operations.
#[derive(Debug, Error)]
pub enum StoreError {
	/// The requested order does not exist.
	#[error("Order not found")]
	NotFound,
	/// A draft was submitted before all wizard fields were collected.
	#[error("Order draft is missing required fields")]
	IncompleteDraft,
	/// Error that occurs during serialization/deserialization.
	#[error("Serialization error: {0}")]
	Serialization(String),
	/// Error that occurs in the storage backend.
	#[error("Backend error: {0}")]
	Backend(String),
	/// Error that occurs during configuration validation.
	#[error("Configuration error: {0}")]
	Configuration(String),
}

/// Trait defining the interface for order store backends.
///
/// Backends apply record defaults on creation (status `New`, the creation
/// timestamp, `notification_sent = false`) and assign ids monotonically
/// starting at 1. Ids are never reused except after [`reset_all`].
///
/// [`reset_all`]: OrderStore::reset_all
#[async_trait]
pub trait OrderStore: Send + Sync {
	/// Persists a new order and returns its assigned id.
	async fn create(&self, new: NewOrder) -> Result<OrderId, StoreError>;

	/// Fetches a full order record, or `None` if it does not exist.
	async fn get(&self, id: OrderId) -> Result<Option<Order>, StoreError>;

	/// Lists all non-terminal orders, newest first.
	async fn list_active(&self) -> Result<Vec<OrderSummary>, StoreError>;

	/// Sets an order's status verbatim.
	async fn set_status(&self, id: OrderId, status: OrderStatus) -> Result<(), StoreError>;

	/// Sets an order's due date.
	async fn set_due_date(&self, id: OrderId, due_date: NaiveDate) -> Result<(), StoreError>;

	/// Removes an order. Deleting an absent order is not an error.
	async fn delete(&self, id: OrderId) -> Result<(), StoreError>;

	/// Destroys all orders and restarts the id sequence at 1.
	async fn reset_all(&self) -> Result<(), StoreError>;

	/// Returns orders eligible for a deadline reminder: status not in
	/// {Completed, Ready} and the reminder not yet sent.
	async fn reminder_candidates(&self) -> Result<Vec<ReminderCandidate>, StoreError>;

	/// Marks an order's reminder as sent. The flag never reverts.
	async fn mark_notified(&self, id: OrderId) -> Result<(), StoreError>;

	/// Returns the configuration schema for validation.
	fn config_schema(&self) -> Box<dyn ConfigSchema>;
}

/// Type alias for store factory functions.
///
/// This is the function signature that all store implementations must
/// provide to create instances of their backend.
pub type StoreFactory = fn(&toml::Value) -> Result<Box<dyn OrderStore>, StoreError>;

/// Registry trait for store implementations.
pub trait StoreRegistry: ImplementationRegistry<Factory = StoreFactory> {}

/// Get all registered store implementations.
///
/// Returns a vector of (name, factory) tuples for all available store
/// implementations, used by the engine builder to wire the configured one.
pub fn get_all_implementations() -> Vec<(&'static str, StoreFactory)> {
	use implementations::{file, memory};

	vec![
		(file::Registry::NAME, file::Registry::factory()),
		(memory::Registry::NAME, memory::Registry::factory()),
	]
}

/// High-level store service consumed by the handlers.
///
/// Wraps a backend and adds the draft-finalization step between the wizard
/// and the store contract.
pub struct StoreService {
	/// The underlying store backend implementation.
	backend: Box<dyn OrderStore>,
}

impl StoreService {
	/// Creates a new StoreService with the specified backend.
	pub fn new(backend: Box<dyn OrderStore>) -> Self {
		Self { backend }
	}

	/// Finalizes a completed wizard draft into a persisted order.
	///
	/// Returns [`StoreError::IncompleteDraft`] if any wizard field is
	/// missing; the wizard only calls this after the final step, so hitting
	/// that error indicates a handler bug rather than user input.
	pub async fn create_from_draft(&self, draft: OrderDraft) -> Result<OrderId, StoreError> {
		let new = draft.into_new_order().ok_or(StoreError::IncompleteDraft)?;
		let id = self.backend.create(new).await?;
		tracing::debug!(order_id = %id, "Order persisted");
		Ok(id)
	}

	pub async fn get(&self, id: OrderId) -> Result<Option<Order>, StoreError> {
		self.backend.get(id).await
	}

	pub async fn list_active(&self) -> Result<Vec<OrderSummary>, StoreError> {
		self.backend.list_active().await
	}

	pub async fn set_status(&self, id: OrderId, status: OrderStatus) -> Result<(), StoreError> {
		self.backend.set_status(id, status).await
	}

	pub async fn set_due_date(&self, id: OrderId, due_date: NaiveDate) -> Result<(), StoreError> {
		self.backend.set_due_date(id, due_date).await
	}

	pub async fn delete(&self, id: OrderId) -> Result<(), StoreError> {
		self.backend.delete(id).await
	}

	pub async fn reset_all(&self) -> Result<(), StoreError> {
		self.backend.reset_all().await
	}

	pub async fn reminder_candidates(&self) -> Result<Vec<ReminderCandidate>, StoreError> {
		self.backend.reminder_candidates().await
	}

	pub async fn mark_notified(&self, id: OrderId) -> Result<(), StoreError> {
		self.backend.mark_notified(id).await
	}
}
