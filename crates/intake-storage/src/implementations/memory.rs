//! In-memory store backend.
//!
//! This module provides a memory-based implementation of the OrderStore
//! trait, useful for testing and for deployments that accept losing orders
//! across restarts.

use crate::{StoreError, OrderStore, StoreFactory, StoreRegistry};
use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use intake_types::{
	ConfigSchema, ImplementationRegistry, NewOrder, Order, OrderId, OrderStatus, OrderSummary,
	ReminderCandidate, Schema, ValidationError,
};
use std::collections::HashMap;
use tokio::sync::RwLock;

/// Mutable store state behind the lock.
#[derive(Debug)]
struct MemoryState {
	/// Next id to assign; restarts at 1 only on a full reset.
	next_id: u64,
	orders: HashMap<u64, Order>,
}

impl MemoryState {
	fn new() -> Self {
		Self {
			next_id: 1,
			orders: HashMap::new(),
		}
	}
}

/// In-memory order store.
pub struct MemoryStore {
	state: RwLock<MemoryState>,
}

impl MemoryStore {
	/// Creates a new empty MemoryStore.
	pub fn new() -> Self {
		Self {
			state: RwLock::new(MemoryState::new()),
		}
	}
}

impl Default for MemoryStore {
	fn default() -> Self {
		Self::new()
	}
}

#[async_trait]
impl OrderStore for MemoryStore {
	async fn create(&self, new: NewOrder) -> Result<OrderId, StoreError> {
		let mut state = self.state.write().await;
		let id = OrderId(state.next_id);
		state.next_id += 1;

		state.orders.insert(
			id.0,
			Order {
				id,
				originating_chat: new.originating_chat,
				photo: new.photo,
				description: new.description,
				phone: new.phone,
				address: new.address,
				status: OrderStatus::New,
				due_date: new.due_date,
				created_at: Utc::now(),
				notification_sent: false,
			},
		);

		Ok(id)
	}

	async fn get(&self, id: OrderId) -> Result<Option<Order>, StoreError> {
		let state = self.state.read().await;
		Ok(state.orders.get(&id.0).cloned())
	}

	async fn list_active(&self) -> Result<Vec<OrderSummary>, StoreError> {
		let state = self.state.read().await;
		let mut rows: Vec<&Order> = state
			.orders
			.values()
			.filter(|order| !order.status.is_terminal())
			.collect();
		// Ids are monotonic, so descending id means newest first.
		rows.sort_by(|a, b| b.id.cmp(&a.id));

		Ok(rows
			.into_iter()
			.map(|order| OrderSummary {
				id: order.id,
				description: order.description.clone(),
			})
			.collect())
	}

	async fn set_status(&self, id: OrderId, status: OrderStatus) -> Result<(), StoreError> {
		let mut state = self.state.write().await;
		let order = state.orders.get_mut(&id.0).ok_or(StoreError::NotFound)?;
		order.status = status;
		Ok(())
	}

	async fn set_due_date(&self, id: OrderId, due_date: NaiveDate) -> Result<(), StoreError> {
		let mut state = self.state.write().await;
		let order = state.orders.get_mut(&id.0).ok_or(StoreError::NotFound)?;
		order.due_date = due_date;
		Ok(())
	}

	async fn delete(&self, id: OrderId) -> Result<(), StoreError> {
		let mut state = self.state.write().await;
		state.orders.remove(&id.0);
		Ok(())
	}

	async fn reset_all(&self) -> Result<(), StoreError> {
		let mut state = self.state.write().await;
		*state = MemoryState::new();
		Ok(())
	}

	async fn reminder_candidates(&self) -> Result<Vec<ReminderCandidate>, StoreError> {
		let state = self.state.read().await;
		let mut rows: Vec<ReminderCandidate> = state
			.orders
			.values()
			.filter(|order| {
				!matches!(order.status, OrderStatus::Completed | OrderStatus::Ready)
					&& !order.notification_sent
			})
			.map(|order| ReminderCandidate {
				id: order.id,
				chat: order.originating_chat,
				description: order.description.clone(),
				due_date: order.due_date,
			})
			.collect();
		rows.sort_by_key(|row| row.id);
		Ok(rows)
	}

	async fn mark_notified(&self, id: OrderId) -> Result<(), StoreError> {
		let mut state = self.state.write().await;
		let order = state.orders.get_mut(&id.0).ok_or(StoreError::NotFound)?;
		order.notification_sent = true;
		Ok(())
	}

	fn config_schema(&self) -> Box<dyn ConfigSchema> {
		Box::new(MemoryStoreSchema)
	}
}

/// Configuration schema for MemoryStore.
pub struct MemoryStoreSchema;

impl ConfigSchema for MemoryStoreSchema {
	fn validate(&self, config: &toml::Value) -> Result<(), ValidationError> {
		// Memory storage has no required configuration
		let schema = Schema::new(vec![], vec![]);
		schema.validate(config)
	}
}

/// Registry entry for the memory store.
pub struct Registry;

impl ImplementationRegistry for Registry {
	const NAME: &'static str = "memory";
	type Factory = StoreFactory;

	fn factory() -> Self::Factory {
		create_store
	}
}

impl StoreRegistry for Registry {}

/// Factory function to create a memory store from configuration.
///
/// Configuration parameters: none required.
pub fn create_store(_config: &toml::Value) -> Result<Box<dyn OrderStore>, StoreError> {
	Ok(Box::new(MemoryStore::new()))
}

#[cfg(test)]
mod tests {
	use super::*;
	use intake_types::{ChatId, PhotoRef};

	fn sample(description: &str) -> NewOrder {
		NewOrder {
			originating_chat: ChatId(100),
			photo: PhotoRef("file-1".into()),
			description: description.to_string(),
			phone: "+1000".into(),
			address: "Main st 1".into(),
			due_date: NaiveDate::from_ymd_opt(2025, 12, 31).unwrap(),
		}
	}

	#[tokio::test]
	async fn create_applies_record_defaults() {
		let store = MemoryStore::new();
		let id = store.create(sample("cake")).await.unwrap();
		assert_eq!(id, OrderId(1));

		let order = store.get(id).await.unwrap().unwrap();
		assert_eq!(order.status, OrderStatus::New);
		assert!(!order.notification_sent);
		assert_eq!(order.description, "cake");
	}

	#[tokio::test]
	async fn ids_are_monotonic_and_listing_is_newest_first() {
		let store = MemoryStore::new();
		for n in 1..=3 {
			let id = store.create(sample(&format!("order {}", n))).await.unwrap();
			assert_eq!(id, OrderId(n));
		}

		let listed: Vec<u64> = store
			.list_active()
			.await
			.unwrap()
			.into_iter()
			.map(|row| row.id.0)
			.collect();
		assert_eq!(listed, vec![3, 2, 1]);
	}

	#[tokio::test]
	async fn completed_orders_leave_the_listing() {
		let store = MemoryStore::new();
		let id = store.create(sample("cake")).await.unwrap();
		store.create(sample("pie")).await.unwrap();

		store.set_status(id, OrderStatus::Completed).await.unwrap();
		let listed = store.list_active().await.unwrap();
		assert_eq!(listed.len(), 1);
		assert!(listed.iter().all(|row| row.id != id));
	}

	#[tokio::test]
	async fn delete_removes_the_record() {
		let store = MemoryStore::new();
		let id = store.create(sample("cake")).await.unwrap();

		store.delete(id).await.unwrap();
		assert!(store.get(id).await.unwrap().is_none());
		assert!(store.list_active().await.unwrap().is_empty());

		// Deleting again is a no-op, not an error.
		store.delete(id).await.unwrap();
	}

	#[tokio::test]
	async fn reset_restarts_the_id_sequence() {
		let store = MemoryStore::new();
		store.create(sample("one")).await.unwrap();
		store.create(sample("two")).await.unwrap();

		store.reset_all().await.unwrap();
		assert!(store.list_active().await.unwrap().is_empty());

		let id = store.create(sample("three")).await.unwrap();
		assert_eq!(id, OrderId(1));
	}

	#[tokio::test]
	async fn candidates_exclude_ready_completed_and_notified() {
		let store = MemoryStore::new();
		let a = store.create(sample("a")).await.unwrap();
		let b = store.create(sample("b")).await.unwrap();
		let c = store.create(sample("c")).await.unwrap();
		let d = store.create(sample("d")).await.unwrap();

		store.set_status(b, OrderStatus::Ready).await.unwrap();
		store.set_status(c, OrderStatus::Completed).await.unwrap();
		store.mark_notified(d).await.unwrap();

		let ids: Vec<OrderId> = store
			.reminder_candidates()
			.await
			.unwrap()
			.into_iter()
			.map(|row| row.id)
			.collect();
		assert_eq!(ids, vec![a]);
	}

	#[tokio::test]
	async fn in_progress_orders_remain_candidates() {
		let store = MemoryStore::new();
		let id = store.create(sample("a")).await.unwrap();
		store.set_status(id, OrderStatus::InProgress).await.unwrap();
		assert_eq!(store.reminder_candidates().await.unwrap().len(), 1);
	}

	#[tokio::test]
	async fn mutations_on_absent_orders_report_not_found() {
		let store = MemoryStore::new();
		let missing = OrderId(99);

		assert!(matches!(
			store.set_status(missing, OrderStatus::Ready).await,
			Err(StoreError::NotFound)
		));
		assert!(matches!(
			store
				.set_due_date(missing, NaiveDate::from_ymd_opt(2026, 1, 1).unwrap())
				.await,
			Err(StoreError::NotFound)
		));
		assert!(matches!(
			store.mark_notified(missing).await,
			Err(StoreError::NotFound)
		));
	}
}
