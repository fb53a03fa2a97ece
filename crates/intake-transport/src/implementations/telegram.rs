//! Telegram Bot API transport implementation.
//!
//! Delivers messages through the HTTP Bot API using a shared reqwest
//! client. Keyboards are rendered into the platform's `reply_markup` JSON;
//! all text is sent with HTML parse mode, matching the formatting used in
//! the handlers' message templates.

use crate::{ChatTransport, TransportError, TransportFactory, TransportRegistry};
use async_trait::async_trait;
use intake_types::{
	ChatId, ConfigSchema, Field, FieldType, ImplementationRegistry, InlineKeyboard, Markup,
	MessageId, PhotoRef, Schema, SecretString, ValidationError,
};
use serde::Deserialize;
use serde_json::json;

const DEFAULT_API_URL: &str = "https://api.telegram.org";

/// Envelope every Bot API method returns.
#[derive(Debug, Deserialize)]
struct ApiResponse<T> {
	ok: bool,
	result: Option<T>,
	description: Option<String>,
}

/// The only field of a delivered message the core cares about.
#[derive(Debug, Deserialize)]
struct DeliveredMessage {
	message_id: i64,
}

/// Telegram Bot API transport.
pub struct TelegramTransport {
	http: reqwest::Client,
	/// Method-call prefix: `<api_url>/bot<token>`.
	base_url: String,
}

impl TelegramTransport {
	/// Creates a new TelegramTransport for the given credential.
	pub fn new(api_url: &str, token: &SecretString) -> Self {
		Self {
			http: reqwest::Client::new(),
			base_url: format!("{}/bot{}", api_url.trim_end_matches('/'), token.expose_secret()),
		}
	}

	/// Calls a Bot API method and unwraps the response envelope.
	async fn call<T: for<'de> Deserialize<'de>>(
		&self,
		method: &str,
		params: serde_json::Value,
	) -> Result<T, TransportError> {
		let url = format!("{}/{}", self.base_url, method);
		let response = self
			.http
			.post(&url)
			.json(&params)
			.send()
			.await
			.map_err(|e| TransportError::Network(e.to_string()))?;

		let envelope: ApiResponse<T> = response
			.json()
			.await
			.map_err(|e| TransportError::Network(e.to_string()))?;

		if !envelope.ok {
			return Err(TransportError::Api(
				envelope
					.description
					.unwrap_or_else(|| format!("{} failed without description", method)),
			));
		}

		envelope
			.result
			.ok_or_else(|| TransportError::Api(format!("{} returned no result", method)))
	}
}

/// Renders markup into the Bot API `reply_markup` object.
fn markup_json(markup: &Markup) -> serde_json::Value {
	match markup {
		Markup::Inline(keyboard) => inline_keyboard_json(keyboard),
		Markup::Reply(keyboard) => json!({
			"keyboard": keyboard
				.rows
				.iter()
				.map(|row| row.iter().map(|label| json!({ "text": label })).collect::<Vec<_>>())
				.collect::<Vec<_>>(),
			"resize_keyboard": keyboard.resize,
		}),
		Markup::Remove => json!({ "remove_keyboard": true }),
	}
}

fn inline_keyboard_json(keyboard: &InlineKeyboard) -> serde_json::Value {
	json!({
		"inline_keyboard": keyboard
			.rows
			.iter()
			.map(|row| {
				row.iter()
					.map(|button| {
						json!({
							"text": button.label,
							"callback_data": button.action.encode(),
						})
					})
					.collect::<Vec<_>>()
			})
			.collect::<Vec<_>>(),
	})
}

#[async_trait]
impl ChatTransport for TelegramTransport {
	fn config_schema(&self) -> Box<dyn ConfigSchema> {
		Box::new(TelegramTransportSchema)
	}

	async fn send_message(
		&self,
		chat: ChatId,
		text: &str,
		markup: Option<Markup>,
	) -> Result<MessageId, TransportError> {
		let mut params = json!({
			"chat_id": chat.0,
			"text": text,
			"parse_mode": "HTML",
		});
		if let Some(markup) = &markup {
			params["reply_markup"] = markup_json(markup);
		}

		let delivered: DeliveredMessage = self.call("sendMessage", params).await?;
		Ok(MessageId(delivered.message_id))
	}

	async fn send_photo(
		&self,
		chat: ChatId,
		photo: &PhotoRef,
		caption: &str,
	) -> Result<MessageId, TransportError> {
		let params = json!({
			"chat_id": chat.0,
			"photo": photo.0,
			"caption": caption,
			"parse_mode": "HTML",
		});

		let delivered: DeliveredMessage = self.call("sendPhoto", params).await?;
		Ok(MessageId(delivered.message_id))
	}

	async fn edit_message(
		&self,
		chat: ChatId,
		message: MessageId,
		text: &str,
		markup: Option<InlineKeyboard>,
	) -> Result<(), TransportError> {
		let mut params = json!({
			"chat_id": chat.0,
			"message_id": message.0,
			"text": text,
			"parse_mode": "HTML",
		});
		if let Some(keyboard) = &markup {
			params["reply_markup"] = inline_keyboard_json(keyboard);
		}

		// editMessageText returns the edited message; the core has no use
		// for it beyond success.
		let _: serde_json::Value = self.call("editMessageText", params).await?;
		Ok(())
	}

	async fn delete_message(
		&self,
		chat: ChatId,
		message: MessageId,
	) -> Result<(), TransportError> {
		let params = json!({
			"chat_id": chat.0,
			"message_id": message.0,
		});
		let _: serde_json::Value = self.call("deleteMessage", params).await?;
		Ok(())
	}

	async fn ack_callback(&self, callback_id: &str) -> Result<(), TransportError> {
		let params = json!({ "callback_query_id": callback_id });
		let _: serde_json::Value = self.call("answerCallbackQuery", params).await?;
		Ok(())
	}
}

/// Configuration schema for the Telegram transport.
pub struct TelegramTransportSchema;

impl ConfigSchema for TelegramTransportSchema {
	fn validate(&self, config: &toml::Value) -> Result<(), ValidationError> {
		let schema = Schema::new(
			vec![],
			vec![Field::new("api_url", FieldType::String)],
		);
		schema.validate(config)
	}
}

/// Registry entry for the Telegram transport.
pub struct Registry;

impl ImplementationRegistry for Registry {
	const NAME: &'static str = "telegram";
	type Factory = TransportFactory;

	fn factory() -> Self::Factory {
		create_transport
	}
}

impl TransportRegistry for Registry {}

/// Factory function to create a Telegram transport from configuration.
///
/// Configuration parameters:
/// - `api_url`: Bot API base URL override (optional, defaults to the
///   public endpoint)
pub fn create_transport(
	config: &toml::Value,
	token: &SecretString,
) -> Result<Box<dyn ChatTransport>, TransportError> {
	TelegramTransportSchema
		.validate(config)
		.map_err(|e| TransportError::Configuration(e.to_string()))?;

	let api_url = config
		.get("api_url")
		.and_then(|value| value.as_str())
		.unwrap_or(DEFAULT_API_URL);

	Ok(Box::new(TelegramTransport::new(api_url, token)))
}
