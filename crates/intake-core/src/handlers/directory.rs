//! Order directory and editor.
//!
//! Renders the active-order listing in its two modes (view and edit),
//! the full detail view, and the in-place edit menu with its status,
//! due-date and delete actions. Every editor action replaces the menu
//! message with a confirmation instead of sending new messages.

use crate::event_bus::{BotEvent, EventBus};
use crate::menu::{self, ListMode};
use chrono::{Duration, Local};
use intake_storage::{StoreError, StoreService};
use intake_transport::TransportService;
use intake_types::{format_date, CallbackQuery, ChatId, Markup, OrderId, OrderStatus};
use std::sync::Arc;
use thiserror::Error;

/// Errors that can occur while serving the directory.
#[derive(Debug, Error)]
pub enum DirectoryError {
	#[error("Transport error: {0}")]
	Transport(String),
	#[error("Store error: {0}")]
	Store(String),
}

/// Handler for the order directory and the in-place editor.
pub struct DirectoryHandler {
	store: Arc<StoreService>,
	transport: Arc<TransportService>,
	event_bus: EventBus,
}

impl DirectoryHandler {
	pub fn new(
		store: Arc<StoreService>,
		transport: Arc<TransportService>,
		event_bus: EventBus,
	) -> Self {
		Self {
			store,
			transport,
			event_bus,
		}
	}

	/// Sends the active-order listing as an inline menu.
	pub async fn list(&self, chat: ChatId, mode: ListMode) -> Result<(), DirectoryError> {
		let summaries = self
			.store
			.list_active()
			.await
			.map_err(|e| DirectoryError::Store(e.to_string()))?;

		if summaries.is_empty() {
			self.send(chat, "No active orders.", None).await?;
			return Ok(());
		}

		let heading = match mode {
			ListMode::View => "Select an order:",
			ListMode::Edit => "Select an order to edit:",
		};
		self.send(
			chat,
			heading,
			Some(Markup::Inline(menu::order_list(&summaries, mode))),
		)
		.await
	}

	/// Shows the full detail of one order and removes the listing message.
	pub async fn view(&self, query: &CallbackQuery, id: OrderId) -> Result<(), DirectoryError> {
		let Some(order) = self
			.store
			.get(id)
			.await
			.map_err(|e| DirectoryError::Store(e.to_string()))?
		else {
			self.send(query.chat, &format!("Order #{} no longer exists.", id), None)
				.await?;
			return Ok(());
		};

		let caption = format!(
			"Order #{}\nDescription: {}\nStatus: {}\nDue: {}\nPhone: {}\nAddress: {}",
			order.id,
			order.description,
			order.status,
			format_date(order.due_date),
			order.phone,
			order.address,
		);
		self.transport
			.send_photo(query.chat, &order.photo, &caption)
			.await
			.map_err(|e| DirectoryError::Transport(e.to_string()))?;

		// The detail view replaces the selection menu.
		self.transport
			.delete_message(query.chat, query.message_id)
			.await
			.map_err(|e| DirectoryError::Transport(e.to_string()))?;
		Ok(())
	}

	/// Replaces the pressed message with the edit menu for this order.
	pub async fn open_edit_menu(
		&self,
		query: &CallbackQuery,
		id: OrderId,
	) -> Result<(), DirectoryError> {
		self.edit(
			query,
			&format!("Order #{} — choose an action:", id),
			Some(menu::edit_menu(id)),
		)
		.await
	}

	/// Applies the chosen status verbatim and confirms in place.
	pub async fn set_status(
		&self,
		query: &CallbackQuery,
		id: OrderId,
		status: OrderStatus,
	) -> Result<(), DirectoryError> {
		match self.store.set_status(id, status).await {
			Ok(()) => {
				tracing::info!(order_id = %id, status = %status, "Order status updated");
				self.edit(query, &format!("Order #{} moved to {}.", id, status), None)
					.await
			},
			Err(StoreError::NotFound) => self.report_gone(query, id).await,
			Err(e) => Err(DirectoryError::Store(e.to_string())),
		}
	}

	/// Sets the due date to today plus the shortcut offset.
	pub async fn set_due(
		&self,
		query: &CallbackQuery,
		id: OrderId,
		days: u32,
	) -> Result<(), DirectoryError> {
		let due_date = Local::now().date_naive() + Duration::days(i64::from(days));
		match self.store.set_due_date(id, due_date).await {
			Ok(()) => {
				tracing::info!(order_id = %id, due_date = %format_date(due_date), "Due date updated");
				self.edit(
					query,
					&format!("Order #{} now due {}.", id, format_date(due_date)),
					None,
				)
				.await
			},
			Err(StoreError::NotFound) => self.report_gone(query, id).await,
			Err(e) => Err(DirectoryError::Store(e.to_string())),
		}
	}

	/// First delete step: swap the edit menu for a confirmation.
	pub async fn confirm_delete(
		&self,
		query: &CallbackQuery,
		id: OrderId,
	) -> Result<(), DirectoryError> {
		self.edit(
			query,
			&format!("Delete order #{}? This cannot be undone.", id),
			Some(menu::delete_confirm(id)),
		)
		.await
	}

	/// Second delete step: remove the order and confirm in place.
	pub async fn execute_delete(
		&self,
		query: &CallbackQuery,
		id: OrderId,
	) -> Result<(), DirectoryError> {
		self.store
			.delete(id)
			.await
			.map_err(|e| DirectoryError::Store(e.to_string()))?;
		tracing::info!(order_id = %id, "Order deleted");

		self.edit(query, &format!("Order #{} deleted.", id), None).await?;
		self.event_bus
			.publish(BotEvent::OrderDeleted { order_id: id })
			.ok();
		Ok(())
	}

	async fn report_gone(&self, query: &CallbackQuery, id: OrderId) -> Result<(), DirectoryError> {
		self.edit(query, &format!("Order #{} no longer exists.", id), None)
			.await
	}

	async fn send(
		&self,
		chat: ChatId,
		text: &str,
		markup: Option<Markup>,
	) -> Result<(), DirectoryError> {
		self.transport
			.send_message(chat, text, markup)
			.await
			.map_err(|e| DirectoryError::Transport(e.to_string()))?;
		Ok(())
	}

	async fn edit(
		&self,
		query: &CallbackQuery,
		text: &str,
		markup: Option<intake_types::InlineKeyboard>,
	) -> Result<(), DirectoryError> {
		self.transport
			.edit_message(query.chat, query.message_id, text, markup)
			.await
			.map_err(|e| DirectoryError::Transport(e.to_string()))?;
		Ok(())
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::test_support::{memory_store, recording_transport, Sent};
	use intake_types::{ChatId, MessageId, OrderDraft, PhotoRef, UserId};
	use chrono::NaiveDate;

	fn callback(chat: ChatId, message_id: MessageId) -> CallbackQuery {
		CallbackQuery {
			id: "cb-1".to_string(),
			chat,
			sender: UserId(42),
			message_id,
			payload: String::new(),
		}
	}

	async fn seed(store: &StoreService, description: &str) -> OrderId {
		store
			.create_from_draft(OrderDraft {
				originating_chat: ChatId(10),
				photo: Some(PhotoRef("file-1".into())),
				description: Some(description.to_string()),
				phone: Some("+1".into()),
				address: Some("Main st 1".into()),
				due_date: NaiveDate::from_ymd_opt(2025, 12, 31),
			})
			.await
			.unwrap()
	}

	#[tokio::test]
	async fn empty_listing_says_so() {
		let store = memory_store();
		let (transport, recorder) = recording_transport(None);
		let handler = DirectoryHandler::new(store, transport, EventBus::default());

		handler.list(ChatId(10), ListMode::View).await.unwrap();

		let sent = recorder.sent.lock().unwrap();
		assert!(matches!(
			&sent[0],
			Sent::Text { text, markup: None, .. } if text == "No active orders."
		));
	}

	#[tokio::test]
	async fn listing_is_newest_first_with_one_button_per_order() {
		let store = memory_store();
		let (transport, recorder) = recording_transport(None);
		let handler = DirectoryHandler::new(store.clone(), transport, EventBus::default());

		seed(&store, "first").await;
		seed(&store, "second").await;
		handler.list(ChatId(10), ListMode::Edit).await.unwrap();

		let sent = recorder.sent.lock().unwrap();
		let Sent::Text { markup: Some(Markup::Inline(kb)), .. } = &sent[0] else {
			panic!("expected inline keyboard");
		};
		assert_eq!(kb.rows.len(), 2);
		assert_eq!(kb.rows[0][0].label, "#2 — second");
		assert_eq!(kb.rows[0][0].action, intake_types::CallbackAction::EditOrder(OrderId(2)));
	}

	#[tokio::test]
	async fn view_sends_the_photo_and_removes_the_listing() {
		let store = memory_store();
		let (transport, recorder) = recording_transport(None);
		let handler = DirectoryHandler::new(store.clone(), transport, EventBus::default());

		let id = seed(&store, "cake").await;
		let query = callback(ChatId(10), MessageId(33));
		handler.view(&query, id).await.unwrap();

		let sent = recorder.sent.lock().unwrap();
		match &sent[0] {
			Sent::Photo { photo, caption, .. } => {
				assert_eq!(photo.0, "file-1");
				assert!(caption.contains("Order #1"));
				assert!(caption.contains("Due: 31.12.2025"));
				assert!(caption.contains("Status: New"));
			},
			other => panic!("unexpected send: {:?}", other),
		}
		assert!(matches!(
			&sent[1],
			Sent::Delete { message, .. } if *message == MessageId(33)
		));
	}

	#[tokio::test]
	async fn viewing_a_missing_order_reports_not_found() {
		let store = memory_store();
		let (transport, recorder) = recording_transport(None);
		let handler = DirectoryHandler::new(store, transport, EventBus::default());

		handler
			.view(&callback(ChatId(10), MessageId(33)), OrderId(9))
			.await
			.unwrap();

		let sent = recorder.sent.lock().unwrap();
		assert!(matches!(
			&sent[0],
			Sent::Text { text, .. } if text.contains("no longer exists")
		));
	}

	#[tokio::test]
	async fn set_status_confirms_in_place() {
		let store = memory_store();
		let (transport, recorder) = recording_transport(None);
		let handler = DirectoryHandler::new(store.clone(), transport, EventBus::default());

		let id = seed(&store, "cake").await;
		handler
			.set_status(&callback(ChatId(10), MessageId(5)), id, OrderStatus::Ready)
			.await
			.unwrap();

		assert_eq!(
			store.get(id).await.unwrap().unwrap().status,
			OrderStatus::Ready
		);
		let sent = recorder.sent.lock().unwrap();
		assert!(matches!(
			&sent[0],
			Sent::Edit { text, .. } if text.contains("moved to Ready")
		));
	}

	#[tokio::test]
	async fn editing_a_missing_order_reports_in_place() {
		let store = memory_store();
		let (transport, recorder) = recording_transport(None);
		let handler = DirectoryHandler::new(store, transport, EventBus::default());

		handler
			.set_status(
				&callback(ChatId(10), MessageId(5)),
				OrderId(4),
				OrderStatus::Ready,
			)
			.await
			.unwrap();

		let sent = recorder.sent.lock().unwrap();
		assert!(matches!(
			&sent[0],
			Sent::Edit { text, .. } if text.contains("no longer exists")
		));
	}

	#[tokio::test]
	async fn due_date_shortcut_moves_the_deadline() {
		let store = memory_store();
		let (transport, _) = recording_transport(None);
		let handler = DirectoryHandler::new(store.clone(), transport, EventBus::default());

		let id = seed(&store, "cake").await;
		handler
			.set_due(&callback(ChatId(10), MessageId(5)), id, 7)
			.await
			.unwrap();

		let expected = Local::now().date_naive() + Duration::days(7);
		assert_eq!(store.get(id).await.unwrap().unwrap().due_date, expected);
	}

	#[tokio::test]
	async fn delete_is_a_two_step_flow() {
		let store = memory_store();
		let (transport, recorder) = recording_transport(None);
		let bus = EventBus::default();
		let mut events = bus.subscribe();
		let handler = DirectoryHandler::new(store.clone(), transport, bus);

		let id = seed(&store, "cake").await;
		let query = callback(ChatId(10), MessageId(5));

		handler.confirm_delete(&query, id).await.unwrap();
		{
			let sent = recorder.sent.lock().unwrap();
			let Sent::Edit { markup: Some(kb), .. } = &sent[0] else {
				panic!("expected confirmation keyboard");
			};
			assert_eq!(
				kb.rows[0][0].action,
				intake_types::CallbackAction::DeleteExecute(id)
			);
			// "No" routes back to the edit menu.
			assert_eq!(
				kb.rows[0][1].action,
				intake_types::CallbackAction::EditOrder(id)
			);
		}

		handler.execute_delete(&query, id).await.unwrap();
		assert!(store.get(id).await.unwrap().is_none());
		match events.recv().await.unwrap() {
			BotEvent::OrderDeleted { order_id } => assert_eq!(order_id, id),
			other => panic!("unexpected event: {:?}", other),
		}
	}
}
