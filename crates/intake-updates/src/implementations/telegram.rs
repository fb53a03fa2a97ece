//! Telegram long-polling update source.
//!
//! Polls `getUpdates` with a long-poll timeout, maps raw updates into
//! [`ChatEvent`]s and pushes them into the engine's channel. Updates the
//! bot cannot represent (joins, stickers, edits, ...) are dropped with a
//! trace log. The confirmed offset advances past every received update,
//! including dropped ones.

use crate::{UpdateSource, UpdateSourceFactory, UpdateSourceRegistry, UpdatesError};
use async_trait::async_trait;
use intake_types::{
	CallbackQuery, ChatEvent, ChatId, ChatKind, ConfigSchema, Field, FieldType,
	ImplementationRegistry, IncomingMessage, MessageBody, MessageId, PhotoRef, Schema,
	SecretString, UserId, ValidationError,
};
use serde::Deserialize;
use serde_json::json;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::{mpsc, Mutex};

const DEFAULT_API_URL: &str = "https://api.telegram.org";
const DEFAULT_POLL_TIMEOUT_SECS: u64 = 30;

/// Wire representation of a `getUpdates` response.
#[derive(Debug, Deserialize)]
struct ApiResponse {
	ok: bool,
	result: Option<Vec<RawUpdate>>,
	description: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawUpdate {
	update_id: i64,
	message: Option<RawMessage>,
	callback_query: Option<RawCallback>,
}

#[derive(Debug, Deserialize)]
struct RawMessage {
	message_id: i64,
	from: Option<RawUser>,
	chat: RawChat,
	text: Option<String>,
	photo: Option<Vec<RawPhotoSize>>,
}

#[derive(Debug, Deserialize)]
struct RawUser {
	id: i64,
}

#[derive(Debug, Deserialize)]
struct RawChat {
	id: i64,
	#[serde(rename = "type")]
	kind: String,
}

#[derive(Debug, Deserialize)]
struct RawPhotoSize {
	file_id: String,
}

#[derive(Debug, Deserialize)]
struct RawCallback {
	id: String,
	from: RawUser,
	message: Option<RawMessage>,
	data: Option<String>,
}

/// Telegram long-polling update source.
pub struct TelegramUpdates {
	http: reqwest::Client,
	/// Method-call prefix: `<api_url>/bot<token>`.
	base_url: String,
	poll_timeout_secs: u64,
	/// Flag indicating if polling is active.
	is_polling: Arc<AtomicBool>,
	/// Channel for signaling polling shutdown.
	stop_signal: Arc<Mutex<Option<mpsc::Sender<()>>>>,
}

impl TelegramUpdates {
	/// Creates a new TelegramUpdates source for the given credential.
	pub fn new(api_url: &str, token: &SecretString, poll_timeout_secs: u64) -> Self {
		Self {
			http: reqwest::Client::new(),
			base_url: format!("{}/bot{}", api_url.trim_end_matches('/'), token.expose_secret()),
			poll_timeout_secs,
			is_polling: Arc::new(AtomicBool::new(false)),
			stop_signal: Arc::new(Mutex::new(None)),
		}
	}
}

/// Maps one raw update into a [`ChatEvent`], or `None` if the update has no
/// representation the handlers act on.
fn map_update(update: RawUpdate) -> Option<ChatEvent> {
	if let Some(message) = update.message {
		let sender = message.from?;
		let body = if let Some(text) = message.text {
			MessageBody::Text(text)
		} else if let Some(sizes) = message.photo {
			// Renditions are ordered smallest to largest; keep the largest.
			let best = sizes.into_iter().next_back()?;
			MessageBody::Photo {
				photo: PhotoRef(best.file_id),
			}
		} else {
			return None;
		};

		return Some(ChatEvent::Message(IncomingMessage {
			chat: ChatId(message.chat.id),
			sender: UserId(sender.id),
			chat_kind: chat_kind(&message.chat.kind),
			message_id: MessageId(message.message_id),
			body,
		}));
	}

	if let Some(callback) = update.callback_query {
		let message = callback.message?;
		return Some(ChatEvent::Callback(CallbackQuery {
			id: callback.id,
			chat: ChatId(message.chat.id),
			sender: UserId(callback.from.id),
			message_id: MessageId(message.message_id),
			payload: callback.data?,
		}));
	}

	None
}

fn chat_kind(raw: &str) -> ChatKind {
	// Supergroups and channels count as shared chats for gating purposes.
	if raw == "private" {
		ChatKind::Private
	} else {
		ChatKind::Group
	}
}

#[async_trait]
impl UpdateSource for TelegramUpdates {
	fn config_schema(&self) -> Box<dyn ConfigSchema> {
		Box::new(TelegramUpdatesSchema)
	}

	async fn start(&self, sender: mpsc::UnboundedSender<ChatEvent>) -> Result<(), UpdatesError> {
		if self.is_polling.swap(true, Ordering::SeqCst) {
			return Err(UpdatesError::AlreadyPolling);
		}

		let (stop_tx, mut stop_rx) = mpsc::channel(1);
		*self.stop_signal.lock().await = Some(stop_tx);

		let http = self.http.clone();
		let url = format!("{}/getUpdates", self.base_url);
		let poll_timeout_secs = self.poll_timeout_secs;
		let is_polling = self.is_polling.clone();

		tokio::spawn(async move {
			let mut offset: i64 = 0;

			loop {
				tokio::select! {
					_ = stop_rx.recv() => {
						tracing::debug!("Update polling stopped");
						break;
					}
					response = http
						.post(&url)
						.json(&json!({ "offset": offset, "timeout": poll_timeout_secs }))
						.send() =>
					{
						let batch = match parse_response(response).await {
							Ok(batch) => batch,
							Err(e) => {
								tracing::warn!(error = %e, "getUpdates failed; backing off");
								tokio::time::sleep(std::time::Duration::from_secs(5)).await;
								continue;
							},
						};

						for update in batch {
							offset = offset.max(update.update_id + 1);
							match map_update(update) {
								Some(event) => {
									if sender.send(event).is_err() {
										// Engine is gone; stop polling.
										is_polling.store(false, Ordering::SeqCst);
										return;
									}
								},
								None => {
									tracing::trace!("Dropped unsupported update");
								},
							}
						}
					}
				}
			}

			is_polling.store(false, Ordering::SeqCst);
		});

		Ok(())
	}

	async fn stop(&self) -> Result<(), UpdatesError> {
		if let Some(stop_tx) = self.stop_signal.lock().await.take() {
			stop_tx.send(()).await.ok();
		}
		Ok(())
	}
}

/// Unwraps a `getUpdates` HTTP response into the update batch.
async fn parse_response(
	response: Result<reqwest::Response, reqwest::Error>,
) -> Result<Vec<RawUpdate>, UpdatesError> {
	let response = response.map_err(|e| UpdatesError::Connection(e.to_string()))?;
	let envelope: ApiResponse = response
		.json()
		.await
		.map_err(|e| UpdatesError::Connection(e.to_string()))?;

	if !envelope.ok {
		return Err(UpdatesError::Connection(
			envelope
				.description
				.unwrap_or_else(|| "getUpdates failed without description".to_string()),
		));
	}

	Ok(envelope.result.unwrap_or_default())
}

/// Configuration schema for the Telegram update source.
pub struct TelegramUpdatesSchema;

impl ConfigSchema for TelegramUpdatesSchema {
	fn validate(&self, config: &toml::Value) -> Result<(), ValidationError> {
		let schema = Schema::new(
			vec![],
			vec![
				Field::new("api_url", FieldType::String),
				Field::new(
					"poll_timeout_seconds",
					FieldType::Integer {
						min: Some(1),
						max: Some(300),
					},
				),
			],
		);
		schema.validate(config)
	}
}

/// Registry entry for the Telegram update source.
pub struct Registry;

impl ImplementationRegistry for Registry {
	const NAME: &'static str = "telegram";
	type Factory = UpdateSourceFactory;

	fn factory() -> Self::Factory {
		create_source
	}
}

impl UpdateSourceRegistry for Registry {}

/// Factory function to create a Telegram update source from configuration.
///
/// Configuration parameters:
/// - `api_url`: Bot API base URL override (optional)
/// - `poll_timeout_seconds`: long-poll timeout (optional, default 30)
pub fn create_source(
	config: &toml::Value,
	token: &SecretString,
) -> Result<Box<dyn UpdateSource>, UpdatesError> {
	TelegramUpdatesSchema
		.validate(config)
		.map_err(|e| UpdatesError::Configuration(e.to_string()))?;

	let api_url = config
		.get("api_url")
		.and_then(|value| value.as_str())
		.unwrap_or(DEFAULT_API_URL);
	let poll_timeout_secs = config
		.get("poll_timeout_seconds")
		.and_then(|value| value.as_integer())
		.map(|value| value as u64)
		.unwrap_or(DEFAULT_POLL_TIMEOUT_SECS);

	Ok(Box::new(TelegramUpdates::new(api_url, token, poll_timeout_secs)))
}
