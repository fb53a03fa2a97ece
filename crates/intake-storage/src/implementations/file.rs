//! File-backed store backend.
//!
//! Persists the whole order collection as a single JSON snapshot. Every
//! mutation loads the snapshot, applies the change and writes it back via a
//! temporary file and an atomic rename, so a crash mid-write never leaves a
//! torn snapshot behind. Suited to the single-process, low-volume deployment
//! this bot targets.

use crate::{OrderStore, StoreError, StoreFactory, StoreRegistry};
use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use intake_types::{
	ConfigSchema, Field, FieldType, ImplementationRegistry, NewOrder, Order, OrderId, OrderStatus,
	OrderSummary, ReminderCandidate, Schema, ValidationError,
};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tokio::fs;
use tokio::sync::Mutex;

/// On-disk snapshot layout.
#[derive(Debug, Serialize, Deserialize)]
struct StoreSnapshot {
	/// Next id to assign; restarts at 1 only on a full reset.
	next_id: u64,
	orders: Vec<Order>,
}

impl StoreSnapshot {
	fn empty() -> Self {
		Self {
			next_id: 1,
			orders: Vec::new(),
		}
	}

	fn find(&self, id: OrderId) -> Option<&Order> {
		self.orders.iter().find(|order| order.id == id)
	}

	fn find_mut(&mut self, id: OrderId) -> Option<&mut Order> {
		self.orders.iter_mut().find(|order| order.id == id)
	}
}

/// File-backed order store.
pub struct FileStore {
	path: PathBuf,
	/// Serializes load-modify-save cycles across tasks.
	lock: Mutex<()>,
}

impl FileStore {
	/// Creates a new FileStore persisting to the given path.
	///
	/// The file is created lazily on the first write.
	pub fn new(path: impl Into<PathBuf>) -> Self {
		Self {
			path: path.into(),
			lock: Mutex::new(()),
		}
	}

	async fn load(&self) -> Result<StoreSnapshot, StoreError> {
		match fs::read(&self.path).await {
			Ok(bytes) => serde_json::from_slice(&bytes)
				.map_err(|e| StoreError::Serialization(e.to_string())),
			Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(StoreSnapshot::empty()),
			Err(e) => Err(StoreError::Backend(e.to_string())),
		}
	}

	async fn save(&self, snapshot: &StoreSnapshot) -> Result<(), StoreError> {
		let bytes = serde_json::to_vec_pretty(snapshot)
			.map_err(|e| StoreError::Serialization(e.to_string()))?;

		if let Some(parent) = self.path.parent() {
			if !parent.as_os_str().is_empty() {
				fs::create_dir_all(parent)
					.await
					.map_err(|e| StoreError::Backend(e.to_string()))?;
			}
		}

		// Write-then-rename keeps the previous snapshot intact on failure.
		let tmp = self.path.with_extension("json.tmp");
		fs::write(&tmp, &bytes)
			.await
			.map_err(|e| StoreError::Backend(e.to_string()))?;
		fs::rename(&tmp, &self.path)
			.await
			.map_err(|e| StoreError::Backend(e.to_string()))?;
		Ok(())
	}
}

#[async_trait]
impl OrderStore for FileStore {
	async fn create(&self, new: NewOrder) -> Result<OrderId, StoreError> {
		let _guard = self.lock.lock().await;
		let mut snapshot = self.load().await?;

		let id = OrderId(snapshot.next_id);
		snapshot.next_id += 1;
		snapshot.orders.push(Order {
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
		});

		self.save(&snapshot).await?;
		Ok(id)
	}

	async fn get(&self, id: OrderId) -> Result<Option<Order>, StoreError> {
		let _guard = self.lock.lock().await;
		let snapshot = self.load().await?;
		Ok(snapshot.find(id).cloned())
	}

	async fn list_active(&self) -> Result<Vec<OrderSummary>, StoreError> {
		let _guard = self.lock.lock().await;
		let mut orders = self.load().await?.orders;
		orders.retain(|order| !order.status.is_terminal());
		orders.sort_by(|a, b| b.id.cmp(&a.id));

		Ok(orders
			.into_iter()
			.map(|order| OrderSummary {
				id: order.id,
				description: order.description,
			})
			.collect())
	}

	async fn set_status(&self, id: OrderId, status: OrderStatus) -> Result<(), StoreError> {
		let _guard = self.lock.lock().await;
		let mut snapshot = self.load().await?;
		snapshot.find_mut(id).ok_or(StoreError::NotFound)?.status = status;
		self.save(&snapshot).await
	}

	async fn set_due_date(&self, id: OrderId, due_date: NaiveDate) -> Result<(), StoreError> {
		let _guard = self.lock.lock().await;
		let mut snapshot = self.load().await?;
		snapshot.find_mut(id).ok_or(StoreError::NotFound)?.due_date = due_date;
		self.save(&snapshot).await
	}

	async fn delete(&self, id: OrderId) -> Result<(), StoreError> {
		let _guard = self.lock.lock().await;
		let mut snapshot = self.load().await?;
		snapshot.orders.retain(|order| order.id != id);
		self.save(&snapshot).await
	}

	async fn reset_all(&self) -> Result<(), StoreError> {
		let _guard = self.lock.lock().await;
		self.save(&StoreSnapshot::empty()).await
	}

	async fn reminder_candidates(&self) -> Result<Vec<ReminderCandidate>, StoreError> {
		let _guard = self.lock.lock().await;
		let snapshot = self.load().await?;

		let mut rows: Vec<ReminderCandidate> = snapshot
			.orders
			.iter()
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
		let _guard = self.lock.lock().await;
		let mut snapshot = self.load().await?;
		snapshot
			.find_mut(id)
			.ok_or(StoreError::NotFound)?
			.notification_sent = true;
		self.save(&snapshot).await
	}

	fn config_schema(&self) -> Box<dyn ConfigSchema> {
		Box::new(FileStoreSchema)
	}
}

/// Configuration schema for FileStore.
pub struct FileStoreSchema;

impl ConfigSchema for FileStoreSchema {
	fn validate(&self, config: &toml::Value) -> Result<(), ValidationError> {
		let schema = Schema::new(
			vec![Field::new("path", FieldType::String).with_validator(|value| {
				match value.as_str() {
					Some(path) if !path.is_empty() => Ok(()),
					_ => Err("path must be a non-empty string".to_string()),
				}
			})],
			vec![],
		);
		schema.validate(config)
	}
}

/// Registry entry for the file store.
pub struct Registry;

impl ImplementationRegistry for Registry {
	const NAME: &'static str = "file";
	type Factory = StoreFactory;

	fn factory() -> Self::Factory {
		create_store
	}
}

impl StoreRegistry for Registry {}

/// Factory function to create a file store from configuration.
///
/// Configuration parameters:
/// - `path`: snapshot file location (required)
pub fn create_store(config: &toml::Value) -> Result<Box<dyn OrderStore>, StoreError> {
	FileStoreSchema
		.validate(config)
		.map_err(|e| StoreError::Configuration(e.to_string()))?;

	let path = config
		.get("path")
		.and_then(|value| value.as_str())
		.ok_or_else(|| StoreError::Configuration("path is required".to_string()))?;

	Ok(Box::new(FileStore::new(path)))
}
