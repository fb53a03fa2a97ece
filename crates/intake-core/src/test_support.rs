//! Shared fixtures for handler and engine tests.

use async_trait::async_trait;
use intake_storage::{implementations::memory::MemoryStore, StoreService};
use intake_transport::{ChatTransport, TransportError, TransportService};
use intake_types::{
	ChatId, ChatKind, ConfigSchema, InlineKeyboard, Markup, MessageBody, MessageId, PhotoRef,
	Schema, UserId, ValidationError,
};
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::{Arc, Mutex};

/// Everything the bot sent, in order.
#[derive(Debug, Clone, PartialEq)]
pub enum Sent {
	Text {
		chat: ChatId,
		text: String,
		markup: Option<Markup>,
	},
	Photo {
		chat: ChatId,
		photo: PhotoRef,
		caption: String,
	},
	Edit {
		chat: ChatId,
		message: MessageId,
		text: String,
		markup: Option<InlineKeyboard>,
	},
	Delete {
		chat: ChatId,
		message: MessageId,
	},
	Ack {
		callback_id: String,
	},
}

/// Transport double that records every outbound call.
///
/// `fail_sends` makes message/photo sends fail, for exercising the
/// best-effort delivery paths.
#[derive(Debug, Default)]
pub struct RecordingTransport {
	pub sent: Mutex<Vec<Sent>>,
	pub fail_sends: std::sync::atomic::AtomicBool,
	next_id: AtomicI64,
}

struct NoSchema;

impl ConfigSchema for NoSchema {
	fn validate(&self, config: &toml::Value) -> Result<(), ValidationError> {
		Schema::new(vec![], vec![]).validate(config)
	}
}

impl RecordingTransport {
	fn record(&self, entry: Sent) -> MessageId {
		self.sent.lock().unwrap().push(entry);
		MessageId(self.next_id.fetch_add(1, Ordering::SeqCst) + 1)
	}

	fn check_failure(&self) -> Result<(), TransportError> {
		if self.fail_sends.load(Ordering::SeqCst) {
			Err(TransportError::Network("injected failure".into()))
		} else {
			Ok(())
		}
	}
}

#[async_trait]
impl ChatTransport for RecordingTransport {
	fn config_schema(&self) -> Box<dyn ConfigSchema> {
		Box::new(NoSchema)
	}

	async fn send_message(
		&self,
		chat: ChatId,
		text: &str,
		markup: Option<Markup>,
	) -> Result<MessageId, TransportError> {
		self.check_failure()?;
		Ok(self.record(Sent::Text {
			chat,
			text: text.to_string(),
			markup,
		}))
	}

	async fn send_photo(
		&self,
		chat: ChatId,
		photo: &PhotoRef,
		caption: &str,
	) -> Result<MessageId, TransportError> {
		self.check_failure()?;
		Ok(self.record(Sent::Photo {
			chat,
			photo: photo.clone(),
			caption: caption.to_string(),
		}))
	}

	async fn edit_message(
		&self,
		chat: ChatId,
		message: MessageId,
		text: &str,
		markup: Option<InlineKeyboard>,
	) -> Result<(), TransportError> {
		self.record(Sent::Edit {
			chat,
			message,
			text: text.to_string(),
			markup,
		});
		Ok(())
	}

	async fn delete_message(
		&self,
		chat: ChatId,
		message: MessageId,
	) -> Result<(), TransportError> {
		self.record(Sent::Delete { chat, message });
		Ok(())
	}

	async fn ack_callback(&self, callback_id: &str) -> Result<(), TransportError> {
		self.record(Sent::Ack {
			callback_id: callback_id.to_string(),
		});
		Ok(())
	}
}

/// Builds a transport service around a shared recorder.
pub fn recording_transport(
	broadcast_chat: Option<ChatId>,
) -> (Arc<TransportService>, Arc<RecordingTransport>) {
	let recorder = Arc::new(RecordingTransport::default());
	let service = Arc::new(TransportService::new(
		Box::new(SharedTransport(recorder.clone())),
		broadcast_chat,
	));
	(service, recorder)
}

/// Boxable handle that keeps the recorder inspectable after the service
/// takes ownership of the transport.
struct SharedTransport(Arc<RecordingTransport>);

#[async_trait]
impl ChatTransport for SharedTransport {
	fn config_schema(&self) -> Box<dyn ConfigSchema> {
		self.0.config_schema()
	}

	async fn send_message(
		&self,
		chat: ChatId,
		text: &str,
		markup: Option<Markup>,
	) -> Result<MessageId, TransportError> {
		self.0.send_message(chat, text, markup).await
	}

	async fn send_photo(
		&self,
		chat: ChatId,
		photo: &PhotoRef,
		caption: &str,
	) -> Result<MessageId, TransportError> {
		self.0.send_photo(chat, photo, caption).await
	}

	async fn edit_message(
		&self,
		chat: ChatId,
		message: MessageId,
		text: &str,
		markup: Option<InlineKeyboard>,
	) -> Result<(), TransportError> {
		self.0.edit_message(chat, message, text, markup).await
	}

	async fn delete_message(
		&self,
		chat: ChatId,
		message: MessageId,
	) -> Result<(), TransportError> {
		self.0.delete_message(chat, message).await
	}

	async fn ack_callback(&self, callback_id: &str) -> Result<(), TransportError> {
		self.0.ack_callback(callback_id).await
	}
}

/// Fresh in-memory store service.
pub fn memory_store() -> Arc<StoreService> {
	Arc::new(StoreService::new(Box::new(MemoryStore::new())))
}

/// Update source that never produces events.
struct NullUpdates;

#[async_trait]
impl intake_updates::UpdateSource for NullUpdates {
	fn config_schema(&self) -> Box<dyn ConfigSchema> {
		Box::new(NoSchema)
	}

	async fn start(
		&self,
		_sender: tokio::sync::mpsc::UnboundedSender<intake_types::ChatEvent>,
	) -> Result<(), intake_updates::UpdatesError> {
		Ok(())
	}

	async fn stop(&self) -> Result<(), intake_updates::UpdatesError> {
		Ok(())
	}
}

/// Updates service backed by the inert source.
pub fn null_updates() -> Arc<intake_updates::UpdatesService> {
	Arc::new(intake_updates::UpdatesService::new(Box::new(NullUpdates)))
}

/// Minimal parsed configuration with admin id `42`.
pub fn test_config() -> intake_config::Config {
	r#"
		[bot]
		token = "test-token"
		admin_id = "42"

		[storage]
		primary = "memory"
		[storage.implementations.memory]

		[transport]
		primary = "telegram"
		[transport.implementations.telegram]

		[updates]
		primary = "telegram"
		[updates.implementations.telegram]
	"#
	.parse()
	.expect("test config parses")
}

/// Incoming private-chat text message.
pub fn private_text(chat: ChatId, sender: UserId, text: &str) -> intake_types::IncomingMessage {
	intake_types::IncomingMessage {
		chat,
		sender,
		chat_kind: ChatKind::Private,
		message_id: MessageId(1),
		body: MessageBody::Text(text.to_string()),
	}
}

/// Incoming group-chat text message.
pub fn group_text(chat: ChatId, sender: UserId, text: &str) -> intake_types::IncomingMessage {
	intake_types::IncomingMessage {
		chat,
		sender,
		chat_kind: ChatKind::Group,
		message_id: MessageId(1),
		body: MessageBody::Text(text.to_string()),
	}
}

/// Incoming private-chat photo message.
pub fn private_photo(chat: ChatId, sender: UserId, file_id: &str) -> intake_types::IncomingMessage {
	intake_types::IncomingMessage {
		chat,
		sender,
		chat_kind: ChatKind::Private,
		message_id: MessageId(1),
		body: MessageBody::Photo {
			photo: PhotoRef(file_id.to_string()),
		},
	}
}
