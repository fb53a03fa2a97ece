//! Shared types for the order-intake bot.
//!
//! This crate defines the domain model (orders, drafts, statuses), the chat
//! primitives exchanged with the transport (chat/user/message identifiers,
//! keyboards, inbound events), the typed callback codec used for inline menu
//! buttons, and the configuration-validation framework shared by all
//! pluggable implementations.

pub mod callback;
pub mod chat;
pub mod events;
pub mod order;
pub mod registry;
pub mod secret_string;
pub mod utils;
pub mod validation;

pub use callback::{CallbackAction, CallbackParseError};
pub use chat::{
	ChatId, ChatKind, InlineButton, InlineKeyboard, Markup, MessageId, PhotoRef, ReplyKeyboard,
	UserId,
};
pub use events::{CallbackQuery, ChatEvent, IncomingMessage, MessageBody};
pub use order::{NewOrder, Order, OrderDraft, OrderId, OrderStatus, OrderSummary, ReminderCandidate};
pub use registry::ImplementationRegistry;
pub use secret_string::SecretString;
pub use utils::{format_date, truncate_label, DATE_FORMAT};
pub use validation::{ConfigSchema, Field, FieldType, Schema, ValidationError};
