//! Main entry point for the order-intake bot.
//!
//! This binary wires concrete implementations into the engine: the order
//! store backends, the Telegram transport and the Telegram long-polling
//! update source. Which one of each actually runs is decided by the
//! configuration file.

use clap::Parser;
use intake_config::Config;
use intake_core::{BotBuilder, BotEngine, BotFactories};
use std::path::PathBuf;

use intake_storage::implementations::file::create_store as create_file_store;
use intake_storage::implementations::memory::create_store as create_memory_store;
use intake_transport::implementations::telegram::create_transport;
use intake_updates::implementations::telegram::create_source;

/// Command-line arguments for the intake bot.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
	/// Path to configuration file
	#[arg(short, long, default_value = "config.toml")]
	config: PathBuf,

	/// Log level (trace, debug, info, warn, error)
	#[arg(short, long, default_value = "info")]
	log_level: String,
}

/// Macro to create a factory HashMap with the appropriate type aliases
macro_rules! create_factory_map {
	($factory_type:path, $( $name:literal => $factory:expr ),* $(,)?) => {{
		let mut factories = std::collections::HashMap::new();
		$(
			factories.insert($name.to_string(), $factory as $factory_type);
		)*
		factories
	}};
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
	let args = Args::parse();

	// Initialize tracing with env filter
	use tracing_subscriber::{fmt, EnvFilter};

	let default_directive = args.log_level.to_string();
	let env_filter =
		EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive));

	fmt()
		.with_env_filter(env_filter)
		.with_thread_ids(true)
		.with_target(true)
		.init();

	tracing::info!("Started intake bot");

	// Load configuration
	let config_path = args
		.config
		.to_str()
		.ok_or("Configuration path is not valid UTF-8")?;
	let config = Config::from_file(config_path).await?;
	tracing::info!("Loaded configuration");

	let bot = build_bot(config).await?;
	bot.run().await?;

	tracing::info!("Stopped intake bot");
	Ok(())
}

/// Builds the bot engine with all compiled-in implementations.
async fn build_bot(config: Config) -> Result<BotEngine, Box<dyn std::error::Error>> {
	let store_factories = create_factory_map!(
		intake_storage::StoreFactory,
		"file" => create_file_store,
		"memory" => create_memory_store,
	);

	let transport_factories = create_factory_map!(
		intake_transport::TransportFactory,
		"telegram" => create_transport,
	);

	let updates_factories = create_factory_map!(
		intake_updates::UpdateSourceFactory,
		"telegram" => create_source,
	);

	let engine = BotBuilder::new(config)
		.build(BotFactories {
			store_factories,
			transport_factories,
			updates_factories,
		})
		.await?;

	Ok(engine)
}
