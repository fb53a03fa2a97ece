//! Chat-side primitives shared between the core and the transport.
//!
//! These types describe the surface the bot needs from a chat platform:
//! opaque identifiers for chats, users and messages, the private/group
//! distinction, and the two keyboard shapes the handlers render (reply
//! keyboards for the main menu, inline keyboards for order menus).

use crate::callback::CallbackAction;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of a chat (private conversation or group).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ChatId(pub i64);

impl fmt::Display for ChatId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}", self.0)
	}
}

/// Identifier of a message sender.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserId(pub i64);

impl fmt::Display for UserId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}", self.0)
	}
}

/// Identifier of a delivered message, used for in-place edits and deletion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MessageId(pub i64);

impl fmt::Display for MessageId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}", self.0)
	}
}

/// Opaque handle to an uploaded photo, as issued by the chat platform.
///
/// The bot never stores image bytes, only the platform handle needed to
/// re-send the photo later.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhotoRef(pub String);

/// Whether a chat is a private conversation or a shared group.
///
/// The wizard and the edit menus are restricted to private chats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChatKind {
	Private,
	Group,
}

impl ChatKind {
	pub fn is_private(&self) -> bool {
		matches!(self, ChatKind::Private)
	}
}

/// A button on an inline keyboard, carrying a typed callback action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InlineButton {
	/// Text shown on the button.
	pub label: String,
	/// Action dispatched when the button is pressed.
	pub action: CallbackAction,
}

impl InlineButton {
	pub fn new(label: impl Into<String>, action: CallbackAction) -> Self {
		Self {
			label: label.into(),
			action,
		}
	}
}

/// An inline keyboard attached to a message, rendered as rows of buttons.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InlineKeyboard {
	pub rows: Vec<Vec<InlineButton>>,
}

impl InlineKeyboard {
	pub fn new() -> Self {
		Self::default()
	}

	/// Appends a row of buttons.
	pub fn row(mut self, buttons: Vec<InlineButton>) -> Self {
		self.rows.push(buttons);
		self
	}
}

/// A persistent reply keyboard shown under the text input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplyKeyboard {
	/// Rows of button labels; pressing one sends the label as a message.
	pub rows: Vec<Vec<String>>,
	/// Whether the client should shrink the keyboard to fit.
	pub resize: bool,
}

impl ReplyKeyboard {
	pub fn new(rows: Vec<Vec<&str>>) -> Self {
		Self {
			rows: rows
				.into_iter()
				.map(|row| row.into_iter().map(str::to_string).collect())
				.collect(),
			resize: true,
		}
	}
}

/// Markup attached to an outgoing message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Markup {
	/// Inline buttons under the message itself.
	Inline(InlineKeyboard),
	/// Persistent reply keyboard.
	Reply(ReplyKeyboard),
	/// Removes any previously shown reply keyboard.
	Remove,
}
