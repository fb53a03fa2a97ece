//! Inbound chat events.
//!
//! The update source maps platform updates into these events; the engine
//! routes them to the wizard, the directory or the reset flow. Each event is
//! tagged with the chat, the sender and (for messages) the chat kind, which
//! is all the context the handlers need.

use crate::chat::{ChatId, ChatKind, MessageId, PhotoRef, UserId};

/// An inbound event delivered by the update source.
#[derive(Debug, Clone)]
pub enum ChatEvent {
	/// A text or photo message.
	Message(IncomingMessage),
	/// A button press on an inline keyboard.
	Callback(CallbackQuery),
}

/// A message received from a chat.
#[derive(Debug, Clone)]
pub struct IncomingMessage {
	pub chat: ChatId,
	pub sender: UserId,
	pub chat_kind: ChatKind,
	pub message_id: MessageId,
	pub body: MessageBody,
}

impl IncomingMessage {
	/// Returns the text content, if this is a text message.
	pub fn text(&self) -> Option<&str> {
		match &self.body {
			MessageBody::Text(text) => Some(text),
			MessageBody::Photo { .. } => None,
		}
	}
}

/// The payload of an inbound message.
#[derive(Debug, Clone)]
pub enum MessageBody {
	Text(String),
	Photo {
		/// Platform handle of the largest available rendition.
		photo: PhotoRef,
	},
}

/// A button press on a previously sent inline keyboard.
///
/// `payload` is the raw callback data; the engine decodes it through
/// [`crate::CallbackAction`] before dispatching.
#[derive(Debug, Clone)]
pub struct CallbackQuery {
	/// Platform identifier used to acknowledge the press.
	pub id: String,
	pub chat: ChatId,
	pub sender: UserId,
	/// Message carrying the keyboard, edited in place by most handlers.
	pub message_id: MessageId,
	pub payload: String,
}
