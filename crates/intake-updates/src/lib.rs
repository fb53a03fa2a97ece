//! Inbound update source for the intake bot.
//!
//! This module handles receiving events from the chat platform. It provides
//! the abstraction for different delivery mechanisms (long polling today,
//! webhooks conceivably later): a source is started with a channel sender
//! and pushes mapped [`ChatEvent`]s into it until stopped.

use async_trait::async_trait;
use intake_types::{ChatEvent, ConfigSchema, ImplementationRegistry, SecretString};
use thiserror::Error;
use tokio::sync::mpsc;

/// Re-export implementations
pub mod implementations {
	pub mod telegram;
}

/// Errors that can occur during update-source operations.
#[derive(Debug, Error)]
pub enum UpdatesError {
	/// Error that occurs when connecting to the platform fails.
	#[error("Connection error: {0}")]
	Connection(String),
	/// Error that occurs when trying to start an already running source.
	#[error("Already polling")]
	AlreadyPolling,
	/// Error that occurs during configuration validation.
	#[error("Configuration error: {0}")]
	Configuration(String),
}

/// Trait defining the interface for update sources.
///
/// Implementations push events into the provided channel until `stop` is
/// called or the process shuts down.
#[async_trait]
pub trait UpdateSource: Send + Sync {
	/// Returns the configuration schema for this update-source
	/// implementation.
	fn config_schema(&self) -> Box<dyn ConfigSchema>;

	/// Starts receiving events from the platform.
	async fn start(&self, sender: mpsc::UnboundedSender<ChatEvent>) -> Result<(), UpdatesError>;

	/// Stops receiving events and releases associated resources.
	async fn stop(&self) -> Result<(), UpdatesError>;
}

/// Type alias for update-source factory functions.
pub type UpdateSourceFactory =
	fn(&toml::Value, &SecretString) -> Result<Box<dyn UpdateSource>, UpdatesError>;

/// Registry trait for update-source implementations.
pub trait UpdateSourceRegistry: ImplementationRegistry<Factory = UpdateSourceFactory> {}

/// Get all registered update-source implementations.
pub fn get_all_implementations() -> Vec<(&'static str, UpdateSourceFactory)> {
	use implementations::telegram;

	vec![(telegram::Registry::NAME, telegram::Registry::factory())]
}

/// Service that manages the configured update source.
pub struct UpdatesService {
	source: Box<dyn UpdateSource>,
}

impl UpdatesService {
	/// Creates a new UpdatesService with the specified source.
	pub fn new(source: Box<dyn UpdateSource>) -> Self {
		Self { source }
	}

	/// Starts the source; events flow into the provided channel.
	pub async fn start(
		&self,
		sender: mpsc::UnboundedSender<ChatEvent>,
	) -> Result<(), UpdatesError> {
		self.source.start(sender).await
	}

	/// Stops the source.
	pub async fn stop(&self) -> Result<(), UpdatesError> {
		self.source.stop().await
	}
}
