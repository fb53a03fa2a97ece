//! Builder for composing a bot engine from pluggable implementations.
//!
//! Factory maps keyed by implementation name let the binary decide which
//! store, transport and update-source implementations are compiled in;
//! the configuration decides which one of each actually runs. Factories
//! validate their own TOML block against its schema, so by the time the
//! engine is constructed every component is known-good.

use crate::engine::BotEngine;
use crate::event_bus::EventBus;
use intake_config::Config;
use intake_storage::{OrderStore, StoreError, StoreService};
use intake_transport::{ChatTransport, TransportError, TransportService};
use intake_types::SecretString;
use intake_updates::{UpdateSource, UpdatesError, UpdatesService};
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;

/// Errors that can occur during engine construction.
#[derive(Debug, Error)]
pub enum BuilderError {
	#[error("Configuration error: {0}")]
	Config(String),
	#[error("Missing required component: {0}")]
	MissingComponent(String),
}

/// Container for the factory functions needed to build a [`BotEngine`].
pub struct BotFactories<SF, TF, UF> {
	pub store_factories: HashMap<String, SF>,
	pub transport_factories: HashMap<String, TF>,
	pub updates_factories: HashMap<String, UF>,
}

/// Builder for constructing a [`BotEngine`] with pluggable implementations.
pub struct BotBuilder {
	config: Config,
}

impl BotBuilder {
	/// Creates a new builder with the given configuration.
	pub fn new(config: Config) -> Self {
		Self { config }
	}

	/// Builds the engine, instantiating the configured primary
	/// implementation of each component.
	pub async fn build<SF, TF, UF>(
		self,
		factories: BotFactories<SF, TF, UF>,
	) -> Result<BotEngine, BuilderError>
	where
		SF: Fn(&toml::Value) -> Result<Box<dyn OrderStore>, StoreError>,
		TF: Fn(&toml::Value, &SecretString) -> Result<Box<dyn ChatTransport>, TransportError>,
		UF: Fn(&toml::Value, &SecretString) -> Result<Box<dyn UpdateSource>, UpdatesError>,
	{
		let token = &self.config.bot.token;

		let store = Self::instantiate(
			"storage",
			&self.config.storage.primary,
			&self.config.storage.implementations,
			&factories.store_factories,
			|factory, value| factory(value),
		)?;

		let transport = Self::instantiate(
			"transport",
			&self.config.transport.primary,
			&self.config.transport.implementations,
			&factories.transport_factories,
			|factory, value| factory(value, token),
		)?;

		let updates = Self::instantiate(
			"updates",
			&self.config.updates.primary,
			&self.config.updates.implementations,
			&factories.updates_factories,
			|factory, value| factory(value, token),
		)?;

		let store = Arc::new(StoreService::new(store));
		let transport = Arc::new(TransportService::new(
			transport,
			self.config.bot.broadcast_chat,
		));
		let updates = Arc::new(UpdatesService::new(updates));
		let event_bus = EventBus::default();

		Ok(BotEngine::new(
			self.config,
			store,
			transport,
			updates,
			event_bus,
		))
	}

	/// Looks up the primary implementation's factory and config block and
	/// runs the factory. Schema validation happens inside the factory.
	fn instantiate<F, T, E>(
		component: &str,
		primary: &str,
		configs: &HashMap<String, toml::Value>,
		factories: &HashMap<String, F>,
		call: impl Fn(&F, &toml::Value) -> Result<T, E>,
	) -> Result<T, BuilderError>
	where
		E: std::fmt::Display,
	{
		let config = configs.get(primary).ok_or_else(|| {
			BuilderError::Config(format!(
				"No configuration for {} implementation '{}'",
				component, primary
			))
		})?;
		let factory = factories.get(primary).ok_or_else(|| {
			BuilderError::MissingComponent(format!("{} implementation '{}'", component, primary))
		})?;

		match call(factory, config) {
			Ok(implementation) => {
				tracing::info!(component = component, implementation = %primary, "Loaded");
				Ok(implementation)
			},
			Err(e) => {
				tracing::error!(
					component = component,
					implementation = %primary,
					error = %e,
					"Failed to create implementation"
				);
				Err(BuilderError::Config(format!(
					"Failed to create {} implementation '{}': {}",
					component, primary, e
				)))
			},
		}
	}
}
