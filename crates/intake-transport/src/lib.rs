//! Outbound chat transport for the intake bot.
//!
//! This module handles delivery of messages to the chat platform. It
//! provides the abstraction the handlers talk to: send text or photo
//! messages, edit a previously sent message in place, delete a message and
//! acknowledge button presses. The broadcast-notice path also lives here,
//! wrapped so its failures can never affect the primary mutation.

use async_trait::async_trait;
use intake_types::{
	ChatId, ConfigSchema, ImplementationRegistry, InlineKeyboard, Markup, MessageId, PhotoRef,
	SecretString,
};
use thiserror::Error;

/// Re-export implementations
pub mod implementations {
	pub mod telegram;
}

/// Errors that can occur during transport operations.
#[derive(Debug, Error)]
pub enum TransportError {
	/// Error that occurs during network communication.
	#[error("Network error: {0}")]
	Network(String),
	/// Error reported by the chat platform itself.
	#[error("Platform error: {0}")]
	Api(String),
	/// Error that occurs during configuration validation.
	#[error("Configuration error: {0}")]
	Configuration(String),
}

/// Trait defining the interface for chat transports.
///
/// This is the complete outward surface the core needs from a chat
/// platform; anything richer stays inside the implementation.
#[async_trait]
pub trait ChatTransport: Send + Sync {
	/// Returns the configuration schema for this transport implementation.
	fn config_schema(&self) -> Box<dyn ConfigSchema>;

	/// Sends a text message, optionally with a keyboard, returning the
	/// delivered message's id.
	async fn send_message(
		&self,
		chat: ChatId,
		text: &str,
		markup: Option<Markup>,
	) -> Result<MessageId, TransportError>;

	/// Sends a photo with a caption.
	async fn send_photo(
		&self,
		chat: ChatId,
		photo: &PhotoRef,
		caption: &str,
	) -> Result<MessageId, TransportError>;

	/// Replaces the text (and inline keyboard) of a previously sent message.
	async fn edit_message(
		&self,
		chat: ChatId,
		message: MessageId,
		text: &str,
		markup: Option<InlineKeyboard>,
	) -> Result<(), TransportError>;

	/// Deletes a previously sent message.
	async fn delete_message(&self, chat: ChatId, message: MessageId)
		-> Result<(), TransportError>;

	/// Acknowledges a callback query so the client stops its spinner.
	async fn ack_callback(&self, callback_id: &str) -> Result<(), TransportError>;
}

/// Type alias for transport factory functions.
///
/// Factories receive the implementation's TOML block plus the bot credential
/// from the `[bot]` section.
pub type TransportFactory =
	fn(&toml::Value, &SecretString) -> Result<Box<dyn ChatTransport>, TransportError>;

/// Registry trait for transport implementations.
pub trait TransportRegistry: ImplementationRegistry<Factory = TransportFactory> {}

/// Get all registered transport implementations.
pub fn get_all_implementations() -> Vec<(&'static str, TransportFactory)> {
	use implementations::telegram;

	vec![(telegram::Registry::NAME, telegram::Registry::factory())]
}

/// Service that wraps the transport together with the optional broadcast
/// destination.
///
/// Broadcast notices are best-effort by contract: [`broadcast`] returns the
/// delivery result so the caller can log it, but the absence of a configured
/// broadcast chat is a silent success, and callers never let a broadcast
/// failure roll back the mutation that triggered it.
///
/// [`broadcast`]: TransportService::broadcast
pub struct TransportService {
	transport: Box<dyn ChatTransport>,
	broadcast_chat: Option<ChatId>,
}

impl TransportService {
	/// Creates a new TransportService.
	pub fn new(transport: Box<dyn ChatTransport>, broadcast_chat: Option<ChatId>) -> Self {
		Self {
			transport,
			broadcast_chat,
		}
	}

	pub async fn send_message(
		&self,
		chat: ChatId,
		text: &str,
		markup: Option<Markup>,
	) -> Result<MessageId, TransportError> {
		self.transport.send_message(chat, text, markup).await
	}

	pub async fn send_photo(
		&self,
		chat: ChatId,
		photo: &PhotoRef,
		caption: &str,
	) -> Result<MessageId, TransportError> {
		self.transport.send_photo(chat, photo, caption).await
	}

	pub async fn edit_message(
		&self,
		chat: ChatId,
		message: MessageId,
		text: &str,
		markup: Option<InlineKeyboard>,
	) -> Result<(), TransportError> {
		self.transport.edit_message(chat, message, text, markup).await
	}

	pub async fn delete_message(
		&self,
		chat: ChatId,
		message: MessageId,
	) -> Result<(), TransportError> {
		self.transport.delete_message(chat, message).await
	}

	pub async fn ack_callback(&self, callback_id: &str) -> Result<(), TransportError> {
		self.transport.ack_callback(callback_id).await
	}

	/// Sends a notice to the broadcast chat, if one is configured.
	pub async fn broadcast(&self, text: &str) -> Result<(), TransportError> {
		let Some(chat) = self.broadcast_chat else {
			return Ok(());
		};
		self.transport.send_message(chat, text, None).await?;
		Ok(())
	}

	/// Whether a broadcast destination is configured.
	pub fn has_broadcast_chat(&self) -> bool {
		self.broadcast_chat.is_some()
	}
}
