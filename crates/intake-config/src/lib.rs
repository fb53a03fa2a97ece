//! Configuration module for the order-intake bot.
//!
//! This module provides structures and utilities for managing the bot
//! configuration. It supports loading configuration from TOML files,
//! resolving `${VAR}` / `${VAR:-default}` environment references, and
//! validating that all required values are properly set before startup.

use intake_types::{ChatId, SecretString};
use regex::Regex;
use serde::Deserialize;
use std::collections::HashMap;
use std::str::FromStr;
use thiserror::Error;

/// Errors that can occur during configuration operations.
#[derive(Debug, Error)]
pub enum ConfigError {
	/// Error that occurs during file I/O operations.
	#[error("IO error: {0}")]
	Io(#[from] std::io::Error),
	/// Error that occurs when parsing TOML configuration.
	#[error("Configuration error: {0}")]
	Parse(String),
	/// Error that occurs when configuration validation fails.
	#[error("Validation error: {0}")]
	Validation(String),
}

impl From<toml::de::Error> for ConfigError {
	fn from(err: toml::de::Error) -> Self {
		// Extract just the message without the huge input dump
		ConfigError::Parse(err.message().to_string())
	}
}

/// Main configuration structure for the bot.
///
/// Contains the bot identity section plus the storage, transport, updates
/// and notifier sections consumed by the engine builder.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
	/// Bot credential, admin identity and optional broadcast chat.
	pub bot: BotConfig,
	/// Configuration for the order store backend.
	pub storage: StorageConfig,
	/// Configuration for the outbound chat transport.
	pub transport: TransportConfig,
	/// Configuration for the inbound update source.
	pub updates: UpdatesConfig,
	/// Configuration for the deadline notifier sweep.
	#[serde(default)]
	pub notifier: NotifierConfig,
}

/// Bot identity configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct BotConfig {
	/// Platform credential; kept in a redacting wrapper.
	pub token: SecretString,
	/// Identity string of the single administrator. Compared verbatim
	/// against the sender identity of admin-only actions.
	pub admin_id: String,
	/// Optional shared chat receiving creation/deletion/reset notices.
	/// Absence silently disables all broadcast notices.
	#[serde(default)]
	pub broadcast_chat: Option<ChatId>,
}

/// Configuration for the order store backend.
#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
	/// Which implementation to use.
	pub primary: String,
	/// Map of storage implementation names to their configurations.
	pub implementations: HashMap<String, toml::Value>,
}

/// Configuration for the outbound chat transport.
#[derive(Debug, Clone, Deserialize)]
pub struct TransportConfig {
	/// Which implementation to use.
	pub primary: String,
	/// Map of transport implementation names to their configurations.
	pub implementations: HashMap<String, toml::Value>,
}

/// Configuration for the inbound update source.
#[derive(Debug, Clone, Deserialize)]
pub struct UpdatesConfig {
	/// Which implementation to use.
	pub primary: String,
	/// Map of update-source implementation names to their configurations.
	pub implementations: HashMap<String, toml::Value>,
}

/// Configuration for the deadline notifier sweep.
#[derive(Debug, Clone, Deserialize)]
pub struct NotifierConfig {
	/// Interval between sweeps, in seconds.
	#[serde(default = "default_notifier_interval_seconds")]
	pub interval_seconds: u64,
	/// Size of the reminder window before the due date, in hours.
	#[serde(default = "default_notifier_window_hours")]
	pub window_hours: u64,
}

impl Default for NotifierConfig {
	fn default() -> Self {
		Self {
			interval_seconds: default_notifier_interval_seconds(),
			window_hours: default_notifier_window_hours(),
		}
	}
}

/// Default sweep interval: hourly.
fn default_notifier_interval_seconds() -> u64 {
	3600
}

/// Default reminder window: one day before the due date.
fn default_notifier_window_hours() -> u64 {
	24
}

impl Config {
	/// Loads configuration from a TOML file, resolving environment
	/// references before parsing.
	pub async fn from_file(path: &str) -> Result<Self, ConfigError> {
		let content = tokio::fs::read_to_string(path).await?;
		content.parse()
	}

	/// Validates cross-field constraints that serde cannot express.
	fn validate(&self) -> Result<(), ConfigError> {
		if self.bot.token.is_empty() {
			return Err(ConfigError::Validation("bot.token must not be empty".into()));
		}
		if self.bot.admin_id.is_empty() {
			return Err(ConfigError::Validation(
				"bot.admin_id must not be empty".into(),
			));
		}

		for (section, primary, implementations) in [
			("storage", &self.storage.primary, &self.storage.implementations),
			(
				"transport",
				&self.transport.primary,
				&self.transport.implementations,
			),
			("updates", &self.updates.primary, &self.updates.implementations),
		] {
			if !implementations.contains_key(primary) {
				return Err(ConfigError::Validation(format!(
					"{}.primary '{}' has no matching entry in {}.implementations",
					section, primary, section
				)));
			}
		}

		if self.notifier.interval_seconds == 0 {
			return Err(ConfigError::Validation(
				"notifier.interval_seconds must be positive".into(),
			));
		}

		Ok(())
	}
}

impl FromStr for Config {
	type Err = ConfigError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		let resolved = resolve_env_vars(s)?;
		let config: Config = toml::from_str(&resolved)?;
		config.validate()?;
		Ok(config)
	}
}

/// Resolves `${VAR}` and `${VAR:-default}` references against the process
/// environment.
pub(crate) fn resolve_env_vars(input: &str) -> Result<String, ConfigError> {
	// Limit input size to prevent ReDoS attacks
	const MAX_INPUT_SIZE: usize = 1024 * 1024; // 1MB
	if input.len() > MAX_INPUT_SIZE {
		return Err(ConfigError::Validation(format!(
			"Configuration file too large: {} bytes (max: {} bytes)",
			input.len(),
			MAX_INPUT_SIZE
		)));
	}

	let re = Regex::new(r"\$\{([A-Z_][A-Z0-9_]{0,127})(?::-([^}]{0,256}))?\}")
		.map_err(|e| ConfigError::Parse(format!("Regex error: {}", e)))?;

	let mut result = input.to_string();
	let mut replacements = Vec::new();

	for cap in re.captures_iter(input) {
		let full_match = match cap.get(0) {
			Some(m) => m,
			None => continue,
		};
		let var_name = cap.get(1).map(|m| m.as_str()).unwrap_or_default();
		let default_value = cap.get(2).map(|m| m.as_str());

		let value = match std::env::var(var_name) {
			Ok(v) => v,
			Err(_) => {
				if let Some(default) = default_value {
					default.to_string()
				} else {
					return Err(ConfigError::Validation(format!(
						"Environment variable '{}' not found",
						var_name
					)));
				}
			},
		};

		replacements.push((full_match.start(), full_match.end(), value));
	}

	// Apply replacements in reverse order to maintain positions
	for (start, end, value) in replacements.iter().rev() {
		result.replace_range(*start..*end, value);
	}

	Ok(result)
}
