//! In-memory wizard session store.
//!
//! One session per `(user, chat)` pair, holding the wizard state and the
//! order draft accumulated so far. Sessions live only as long as the
//! process: an abandoned or interrupted draft is simply lost. There is no
//! timeout; a user may hold an open session indefinitely.

use intake_types::{ChatId, OrderDraft, UserId};
use std::collections::HashMap;
use tokio::sync::RwLock;

/// Steps of the order-creation wizard, in prompt order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WizardState {
	AwaitingPhoto,
	AwaitingDescription,
	AwaitingPhone,
	AwaitingAddress,
	AwaitingDueDate,
}

/// A user's in-flight wizard run.
#[derive(Debug, Clone)]
pub struct WizardSession {
	pub state: WizardState,
	pub draft: OrderDraft,
}

impl WizardSession {
	/// Starts a fresh session at the photo step.
	pub fn new(chat: ChatId) -> Self {
		Self {
			state: WizardState::AwaitingPhoto,
			draft: OrderDraft::new(chat),
		}
	}
}

/// Session key: sessions are independent across users and across chats.
type SessionKey = (UserId, ChatId);

/// Concurrent map of active wizard sessions.
#[derive(Debug, Default)]
pub struct SessionStore {
	sessions: RwLock<HashMap<SessionKey, WizardSession>>,
}

impl SessionStore {
	pub fn new() -> Self {
		Self::default()
	}

	/// Returns a snapshot of the session for this user/chat, if any.
	pub async fn get(&self, user: UserId, chat: ChatId) -> Option<WizardSession> {
		self.sessions.read().await.get(&(user, chat)).cloned()
	}

	/// Inserts or replaces a session. Starting the wizard again mid-run
	/// restarts it from the photo step.
	pub async fn put(&self, user: UserId, chat: ChatId, session: WizardSession) {
		self.sessions.write().await.insert((user, chat), session);
	}

	/// Removes the session, returning it if one existed.
	pub async fn take(&self, user: UserId, chat: ChatId) -> Option<WizardSession> {
		self.sessions.write().await.remove(&(user, chat))
	}

	/// Whether this user currently has a session in this chat.
	pub async fn contains(&self, user: UserId, chat: ChatId) -> bool {
		self.sessions.read().await.contains_key(&(user, chat))
	}
}
