//! Admin-only full store reset.
//!
//! Two steps: the reset button asks for confirmation, the confirmation
//! callback performs the wipe. The admin identity is checked at both
//! steps, so a confirmation keyboard reached by anyone else (an old
//! message, a forwarded keyboard) still refuses to fire.

use crate::event_bus::{BotEvent, EventBus};
use crate::menu;
use intake_storage::StoreService;
use intake_transport::TransportService;
use intake_types::{CallbackQuery, IncomingMessage, Markup, UserId};
use std::sync::Arc;
use thiserror::Error;

/// Errors that can occur during the reset flow.
#[derive(Debug, Error)]
pub enum ResetError {
	#[error("Transport error: {0}")]
	Transport(String),
	#[error("Store error: {0}")]
	Store(String),
}

/// Handler for the two-step admin reset.
pub struct ResetHandler {
	store: Arc<StoreService>,
	transport: Arc<TransportService>,
	event_bus: EventBus,
	admin_id: String,
}

impl ResetHandler {
	pub fn new(
		store: Arc<StoreService>,
		transport: Arc<TransportService>,
		event_bus: EventBus,
		admin_id: String,
	) -> Self {
		Self {
			store,
			transport,
			event_bus,
			admin_id,
		}
	}

	fn is_admin(&self, sender: UserId) -> bool {
		sender.to_string() == self.admin_id
	}

	/// First step: offer the confirmation menu, admins only.
	pub async fn request(&self, msg: &IncomingMessage) -> Result<(), ResetError> {
		if !self.is_admin(msg.sender) {
			tracing::warn!(user = %msg.sender, "Reset requested by non-admin");
			self.transport
				.send_message(msg.chat, "Only the administrator can reset orders.", None)
				.await
				.map_err(|e| ResetError::Transport(e.to_string()))?;
			return Ok(());
		}

		self.transport
			.send_message(
				msg.chat,
				"Wipe all orders and restart numbering from 1?",
				Some(Markup::Inline(menu::reset_confirm())),
			)
			.await
			.map_err(|e| ResetError::Transport(e.to_string()))?;
		Ok(())
	}

	/// Second step: perform the wipe. The admin check is repeated here.
	pub async fn confirm(&self, query: &CallbackQuery) -> Result<(), ResetError> {
		if !self.is_admin(query.sender) {
			tracing::warn!(user = %query.sender, "Reset confirmation by non-admin");
			self.edit(query, "Only the administrator can reset orders.")
				.await?;
			return Ok(());
		}

		self.store
			.reset_all()
			.await
			.map_err(|e| ResetError::Store(e.to_string()))?;
		tracing::info!("Order store reset");

		self.edit(query, "All orders wiped. Numbering restarts from 1.")
			.await?;
		self.event_bus.publish(BotEvent::StoreReset).ok();
		Ok(())
	}

	/// Cancel path: replace the confirmation menu, change nothing.
	pub async fn cancel(&self, query: &CallbackQuery) -> Result<(), ResetError> {
		self.edit(query, "Reset cancelled.").await
	}

	async fn edit(&self, query: &CallbackQuery, text: &str) -> Result<(), ResetError> {
		self.transport
			.edit_message(query.chat, query.message_id, text, None)
			.await
			.map_err(|e| ResetError::Transport(e.to_string()))?;
		Ok(())
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::test_support::{memory_store, private_text, recording_transport, Sent};
	use intake_types::{ChatId, MessageId, OrderDraft, OrderId, PhotoRef};
	use chrono::NaiveDate;

	const ADMIN: &str = "42";

	fn handler(
		store: Arc<StoreService>,
		transport: Arc<TransportService>,
		bus: EventBus,
	) -> ResetHandler {
		ResetHandler::new(store, transport, bus, ADMIN.to_string())
	}

	fn confirm_query(sender: UserId) -> CallbackQuery {
		CallbackQuery {
			id: "cb-1".to_string(),
			chat: ChatId(10),
			sender,
			message_id: MessageId(5),
			payload: String::new(),
		}
	}

	async fn seed(store: &StoreService) -> OrderId {
		store
			.create_from_draft(OrderDraft {
				originating_chat: ChatId(10),
				photo: Some(PhotoRef("f".into())),
				description: Some("cake".into()),
				phone: Some("+1".into()),
				address: Some("a".into()),
				due_date: NaiveDate::from_ymd_opt(2025, 12, 31),
			})
			.await
			.unwrap()
	}

	#[tokio::test]
	async fn non_admin_request_is_denied() {
		let store = memory_store();
		let (transport, recorder) = recording_transport(None);
		let handler = handler(store, transport, EventBus::default());

		handler
			.request(&private_text(ChatId(10), UserId(7), "Reset orders"))
			.await
			.unwrap();

		let sent = recorder.sent.lock().unwrap();
		assert!(matches!(
			&sent[0],
			Sent::Text { text, markup: None, .. } if text.contains("administrator")
		));
	}

	#[tokio::test]
	async fn non_admin_confirmation_is_denied_even_with_the_menu() {
		let store = memory_store();
		let (transport, recorder) = recording_transport(None);
		let handler = handler(store.clone(), transport, EventBus::default());

		seed(&store).await;
		handler.confirm(&confirm_query(UserId(7))).await.unwrap();

		// Nothing was wiped.
		assert!(store.get(OrderId(1)).await.unwrap().is_some());
		let sent = recorder.sent.lock().unwrap();
		assert!(matches!(
			&sent[0],
			Sent::Edit { text, .. } if text.contains("administrator")
		));
	}

	#[tokio::test]
	async fn confirmed_reset_wipes_and_restarts_numbering() {
		let store = memory_store();
		let (transport, recorder) = recording_transport(None);
		let bus = EventBus::default();
		let mut events = bus.subscribe();
		let handler = handler(store.clone(), transport, bus);

		seed(&store).await;
		seed(&store).await;

		handler
			.request(&private_text(ChatId(10), UserId(42), "Reset orders"))
			.await
			.unwrap();
		handler.confirm(&confirm_query(UserId(42))).await.unwrap();

		assert!(store.list_active().await.unwrap().is_empty());
		assert_eq!(seed(&store).await, OrderId(1));
		assert!(matches!(events.recv().await.unwrap(), BotEvent::StoreReset));

		let sent = recorder.sent.lock().unwrap();
		assert!(matches!(
			sent.last().unwrap(),
			Sent::Edit { text, .. } if text.contains("wiped")
		));
	}

	#[tokio::test]
	async fn cancel_changes_nothing() {
		let store = memory_store();
		let (transport, recorder) = recording_transport(None);
		let handler = handler(store.clone(), transport, EventBus::default());

		seed(&store).await;
		handler.cancel(&confirm_query(UserId(42))).await.unwrap();

		assert!(store.get(OrderId(1)).await.unwrap().is_some());
		let sent = recorder.sent.lock().unwrap();
		assert!(matches!(
			&sent[0],
			Sent::Edit { text, .. } if text.contains("cancelled")
		));
	}
}
