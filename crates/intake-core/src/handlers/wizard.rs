//! Order-creation wizard.
//!
//! Walks a user through the five collection steps (photo, description,
//! phone, address, due date), one field per message, holding the partial
//! draft in the session store. The due-date step is the only one with
//! explicit validation; every other step silently ignores input of the
//! wrong shape. On the final step the draft is persisted, the session
//! cleared and a creation event published for the broadcast notice.

use crate::event_bus::{BotEvent, EventBus};
use crate::menu;
use crate::sessions::{SessionStore, WizardSession, WizardState};
use chrono::NaiveDate;
use intake_storage::StoreService;
use intake_transport::TransportService;
use intake_types::{format_date, IncomingMessage, Markup, MessageBody, DATE_FORMAT};
use std::sync::Arc;
use thiserror::Error;

/// Errors that can occur while running the wizard.
#[derive(Debug, Error)]
pub enum WizardError {
	#[error("Transport error: {0}")]
	Transport(String),
	#[error("Store error: {0}")]
	Store(String),
}

/// Handler for the order-creation wizard.
pub struct WizardHandler {
	store: Arc<StoreService>,
	transport: Arc<TransportService>,
	sessions: Arc<SessionStore>,
	event_bus: EventBus,
	admin_id: String,
}

impl WizardHandler {
	pub fn new(
		store: Arc<StoreService>,
		transport: Arc<TransportService>,
		sessions: Arc<SessionStore>,
		event_bus: EventBus,
		admin_id: String,
	) -> Self {
		Self {
			store,
			transport,
			sessions,
			event_bus,
			admin_id,
		}
	}

	fn is_admin(&self, msg: &IncomingMessage) -> bool {
		msg.sender.to_string() == self.admin_id
	}

	/// Starts (or restarts) the wizard for this user.
	///
	/// Only private chats may create orders; a group attempt is answered
	/// with a rejection and opens no session.
	pub async fn start(&self, msg: &IncomingMessage) -> Result<(), WizardError> {
		if !msg.chat_kind.is_private() {
			self.transport
				.send_message(
					msg.chat,
					"Orders can only be created in a private chat with the bot.",
					None,
				)
				.await
				.map_err(|e| WizardError::Transport(e.to_string()))?;
			return Ok(());
		}

		self.sessions
			.put(msg.sender, msg.chat, WizardSession::new(msg.chat))
			.await;

		self.transport
			.send_message(
				msg.chat,
				"Step 1 of 5 — send a photo of the order.",
				Some(Markup::Remove),
			)
			.await
			.map_err(|e| WizardError::Transport(e.to_string()))?;

		tracing::debug!(user = %msg.sender, chat = %msg.chat, "Wizard started");
		Ok(())
	}

	/// Feeds a message into the user's active session, if any.
	///
	/// Returns `false` when the user has no session, leaving the message
	/// for the remaining routes. A message of the wrong shape for the
	/// current step is consumed but changes nothing.
	pub async fn handle_step(&self, msg: &IncomingMessage) -> Result<bool, WizardError> {
		let Some(mut session) = self.sessions.get(msg.sender, msg.chat).await else {
			return Ok(false);
		};

		let prompt = match (session.state, &msg.body) {
			(WizardState::AwaitingPhoto, MessageBody::Photo { photo }) => {
				session.draft.photo = Some(photo.clone());
				session.state = WizardState::AwaitingDescription;
				"Step 2 of 5 — send a short description of the order."
			},
			(WizardState::AwaitingDescription, MessageBody::Text(text)) => {
				session.draft.description = Some(text.clone());
				session.state = WizardState::AwaitingPhone;
				"Step 3 of 5 — send the customer's phone number."
			},
			(WizardState::AwaitingPhone, MessageBody::Text(text)) => {
				session.draft.phone = Some(text.clone());
				session.state = WizardState::AwaitingAddress;
				"Step 4 of 5 — send the delivery address."
			},
			(WizardState::AwaitingAddress, MessageBody::Text(text)) => {
				session.draft.address = Some(text.clone());
				session.state = WizardState::AwaitingDueDate;
				"Step 5 of 5 — send the due date as DD.MM.YYYY."
			},
			(WizardState::AwaitingDueDate, MessageBody::Text(text)) => {
				return self.finish(msg, session, text).await.map(|_| true);
			},
			// Wrong input shape for the current step: ignored.
			_ => return Ok(true),
		};

		self.sessions.put(msg.sender, msg.chat, session).await;
		self.transport
			.send_message(msg.chat, prompt, None)
			.await
			.map_err(|e| WizardError::Transport(e.to_string()))?;
		Ok(true)
	}

	/// Final step: parse the date, persist the draft, clear the session.
	async fn finish(
		&self,
		msg: &IncomingMessage,
		mut session: WizardSession,
		text: &str,
	) -> Result<(), WizardError> {
		let due_date = match NaiveDate::parse_from_str(text.trim(), DATE_FORMAT) {
			Ok(date) => date,
			Err(_) => {
				// Re-prompt; the session stays at the date step.
				self.transport
					.send_message(
						msg.chat,
						"That doesn't look like a date. Send it as DD.MM.YYYY, e.g. 31.12.2025.",
						None,
					)
					.await
					.map_err(|e| WizardError::Transport(e.to_string()))?;
				return Ok(());
			},
		};

		session.draft.due_date = Some(due_date);
		let description = session.draft.description.clone().unwrap_or_default();

		let order_id = self
			.store
			.create_from_draft(session.draft)
			.await
			.map_err(|e| WizardError::Store(e.to_string()))?;
		self.sessions.take(msg.sender, msg.chat).await;

		tracing::info!(order_id = %order_id, due_date = %format_date(due_date), "Order created");

		self.transport
			.send_message(
				msg.chat,
				&format!("Order #{} created, due {}.", order_id, format_date(due_date)),
				Some(Markup::Reply(menu::main_menu(self.is_admin(msg)))),
			)
			.await
			.map_err(|e| WizardError::Transport(e.to_string()))?;

		self.event_bus
			.publish(BotEvent::OrderCreated {
				order_id,
				description,
			})
			.ok();
		Ok(())
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::test_support::{
		group_text, memory_store, private_photo, private_text, recording_transport, Sent,
	};
	use intake_types::{ChatId, OrderStatus, UserId};

	fn wizard(
		store: Arc<StoreService>,
		transport: Arc<TransportService>,
		sessions: Arc<SessionStore>,
		bus: EventBus,
	) -> WizardHandler {
		WizardHandler::new(store, transport, sessions, bus, "42".to_string())
	}

	#[tokio::test]
	async fn full_run_creates_an_order() {
		let store = memory_store();
		let (transport, recorder) = recording_transport(None);
		let sessions = Arc::new(SessionStore::new());
		let bus = EventBus::default();
		let mut events = bus.subscribe();
		let handler = wizard(store.clone(), transport, sessions.clone(), bus);

		let chat = ChatId(10);
		let user = UserId(42);

		handler.start(&private_text(chat, user, "New order")).await.unwrap();
		for msg in [
			private_photo(chat, user, "file-77"),
			private_text(chat, user, "three-tier cake"),
			private_text(chat, user, "+1 555 0100"),
			private_text(chat, user, "Main st 1"),
			private_text(chat, user, "31.12.2025"),
		] {
			assert!(handler.handle_step(&msg).await.unwrap());
		}

		// Session cleared, order persisted with the collected fields.
		assert!(!sessions.contains(user, chat).await);
		let order = store
			.get(intake_types::OrderId(1))
			.await
			.unwrap()
			.expect("order persisted");
		assert_eq!(order.description, "three-tier cake");
		assert_eq!(order.phone, "+1 555 0100");
		assert_eq!(order.status, OrderStatus::New);
		assert_eq!(order.photo.0, "file-77");

		// Creation event published for the broadcast notice.
		match events.recv().await.unwrap() {
			BotEvent::OrderCreated { order_id, .. } => {
				assert_eq!(order_id, intake_types::OrderId(1))
			},
			other => panic!("unexpected event: {:?}", other),
		}

		// Final acknowledgment names the order and the due date.
		let sent = recorder.sent.lock().unwrap();
		match sent.last().unwrap() {
			Sent::Text { text, .. } => {
				assert!(text.contains("Order #1"));
				assert!(text.contains("31.12.2025"));
			},
			other => panic!("unexpected send: {:?}", other),
		}
	}

	#[tokio::test]
	async fn group_entry_is_rejected_without_a_session() {
		let store = memory_store();
		let (transport, recorder) = recording_transport(None);
		let sessions = Arc::new(SessionStore::new());
		let handler = wizard(store, transport, sessions.clone(), EventBus::default());

		let msg = group_text(ChatId(-100), UserId(42), "New order");
		handler.start(&msg).await.unwrap();

		assert!(!sessions.contains(UserId(42), ChatId(-100)).await);
		let sent = recorder.sent.lock().unwrap();
		assert!(matches!(&sent[0], Sent::Text { text, .. } if text.contains("private chat")));
	}

	#[tokio::test]
	async fn bad_date_re_prompts_and_keeps_the_session() {
		let store = memory_store();
		let (transport, recorder) = recording_transport(None);
		let sessions = Arc::new(SessionStore::new());
		let handler = wizard(store.clone(), transport, sessions.clone(), EventBus::default());

		let chat = ChatId(10);
		let user = UserId(7);
		handler.start(&private_text(chat, user, "New order")).await.unwrap();
		handler.handle_step(&private_photo(chat, user, "f")).await.unwrap();
		handler.handle_step(&private_text(chat, user, "cake")).await.unwrap();
		handler.handle_step(&private_text(chat, user, "+1")).await.unwrap();
		handler.handle_step(&private_text(chat, user, "addr")).await.unwrap();

		// ISO order is rejected; the wizard asks again.
		handler
			.handle_step(&private_text(chat, user, "2025-12-31"))
			.await
			.unwrap();
		assert!(sessions.contains(user, chat).await);
		{
			let sent = recorder.sent.lock().unwrap();
			assert!(
				matches!(sent.last().unwrap(), Sent::Text { text, .. } if text.contains("DD.MM.YYYY"))
			);
		}

		// A well-formed date still completes the run.
		handler
			.handle_step(&private_text(chat, user, "31.12.2025"))
			.await
			.unwrap();
		assert!(!sessions.contains(user, chat).await);
		assert!(store.get(intake_types::OrderId(1)).await.unwrap().is_some());
	}

	#[tokio::test]
	async fn wrong_shaped_input_is_ignored() {
		let store = memory_store();
		let (transport, recorder) = recording_transport(None);
		let sessions = Arc::new(SessionStore::new());
		let handler = wizard(store, transport, sessions.clone(), EventBus::default());

		let chat = ChatId(10);
		let user = UserId(7);
		handler.start(&private_text(chat, user, "New order")).await.unwrap();
		let before = recorder.sent.lock().unwrap().len();

		// Text at the photo step: consumed, no reply, state unchanged.
		let consumed = handler
			.handle_step(&private_text(chat, user, "not a photo"))
			.await
			.unwrap();
		assert!(consumed);
		assert_eq!(recorder.sent.lock().unwrap().len(), before);
		let session = sessions.get(user, chat).await.unwrap();
		assert_eq!(session.state, WizardState::AwaitingPhoto);
	}

	#[tokio::test]
	async fn no_session_leaves_the_message_unconsumed() {
		let store = memory_store();
		let (transport, _) = recording_transport(None);
		let sessions = Arc::new(SessionStore::new());
		let handler = wizard(store, transport, sessions, EventBus::default());

		let consumed = handler
			.handle_step(&private_text(ChatId(1), UserId(1), "hello"))
			.await
			.unwrap();
		assert!(!consumed);
	}
}
