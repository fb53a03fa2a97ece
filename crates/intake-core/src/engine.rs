//! Engine event loop.
//!
//! The `BotEngine` owns the services, the wizard session store and the
//! handlers, and multiplexes four sources in one `select!` loop: inbound
//! chat events from the update source, domain events from the bus (turned
//! into broadcast notices), the notifier interval, and ctrl-c.

use crate::event_bus::{BotEvent, EventBus};
use crate::handlers::{DirectoryHandler, ResetHandler, WizardHandler};
use crate::menu::{self, ListMode};
use crate::notifier::DeadlineNotifier;
use crate::sessions::SessionStore;
use intake_config::Config;
use intake_storage::StoreService;
use intake_transport::TransportService;
use intake_types::{CallbackAction, CallbackQuery, ChatEvent, IncomingMessage, Markup};
use intake_updates::UpdatesService;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::mpsc;

/// Errors that can occur while the engine is running.
#[derive(Debug, Error)]
pub enum EngineError {
	#[error("Configuration error: {0}")]
	Config(String),
	#[error("Service error: {0}")]
	Service(String),
	#[error("Handler error: {0}")]
	Handler(String),
}

/// Main engine that routes chat events to the handlers.
pub struct BotEngine {
	/// Bot configuration.
	config: Config,
	/// Order store shared by the handlers and the notifier.
	store: Arc<StoreService>,
	/// Outbound transport.
	transport: Arc<TransportService>,
	/// Inbound update source.
	updates: Arc<UpdatesService>,
	/// Event bus feeding the broadcast-notice loop.
	event_bus: EventBus,
	/// Order-creation wizard.
	wizard: WizardHandler,
	/// Directory and editor.
	directory: DirectoryHandler,
	/// Admin reset flow.
	reset: ResetHandler,
	/// Deadline reminder sweep.
	notifier: DeadlineNotifier,
}

impl BotEngine {
	/// Creates a new engine around the given services.
	pub fn new(
		config: Config,
		store: Arc<StoreService>,
		transport: Arc<TransportService>,
		updates: Arc<UpdatesService>,
		event_bus: EventBus,
	) -> Self {
		let sessions = Arc::new(SessionStore::new());
		let admin_id = config.bot.admin_id.clone();

		let wizard = WizardHandler::new(
			store.clone(),
			transport.clone(),
			sessions,
			event_bus.clone(),
			admin_id.clone(),
		);
		let directory = DirectoryHandler::new(store.clone(), transport.clone(), event_bus.clone());
		let reset = ResetHandler::new(
			store.clone(),
			transport.clone(),
			event_bus.clone(),
			admin_id,
		);
		let notifier = DeadlineNotifier::new(
			store.clone(),
			transport.clone(),
			config.notifier.window_hours,
		);

		Self {
			config,
			store,
			transport,
			updates,
			event_bus,
			wizard,
			directory,
			reset,
			notifier,
		}
	}

	/// Main execution loop.
	///
	/// A failing handler is logged and the loop keeps serving; only a
	/// failure to start or stop the update source is fatal.
	pub async fn run(&self) -> Result<(), EngineError> {
		let (event_tx, mut event_rx) = mpsc::unbounded_channel();
		self.updates
			.start(event_tx)
			.await
			.map_err(|e| EngineError::Service(e.to_string()))?;

		let mut bus_receiver = self.event_bus.subscribe();
		let mut sweep = tokio::time::interval(Duration::from_secs(
			self.config.notifier.interval_seconds,
		));

		loop {
			tokio::select! {
				Some(event) = event_rx.recv() => {
					if let Err(e) = self.handle_event(event).await {
						tracing::error!(error = %e, "Failed to handle chat event");
					}
				}

				Ok(event) = bus_receiver.recv() => {
					self.publish_notice(event).await;
				}

				_ = sweep.tick() => {
					self.notifier.run_once(chrono::Local::now().naive_local()).await;
				}

				_ = tokio::signal::ctrl_c() => {
					tracing::info!("Shutdown signal received");
					break;
				}
			}
		}

		self.updates
			.stop()
			.await
			.map_err(|e| EngineError::Service(e.to_string()))?;
		Ok(())
	}

	/// Routes one inbound chat event.
	pub async fn handle_event(&self, event: ChatEvent) -> Result<(), EngineError> {
		match event {
			ChatEvent::Message(msg) => self.route_message(msg).await,
			ChatEvent::Callback(query) => self.route_callback(query).await,
		}
	}

	/// Message routing, in fixed precedence: commands, the wizard entry
	/// button, an active wizard session, then the remaining menu buttons.
	/// Anything unmatched is ignored.
	async fn route_message(&self, msg: IncomingMessage) -> Result<(), EngineError> {
		let Some(text) = msg.text().map(|t| t.trim().to_string()) else {
			// Photos only mean something to an active wizard session.
			self.wizard
				.handle_step(&msg)
				.await
				.map_err(|e| EngineError::Handler(e.to_string()))?;
			return Ok(());
		};

		match text.as_str() {
			"/chat_id" => {
				self.transport
					.send_message(msg.chat, &format!("Chat id: {}", msg.chat), None)
					.await
					.map_err(|e| EngineError::Service(e.to_string()))?;
				Ok(())
			},
			"/start" => self.send_greeting(&msg).await,
			menu::BTN_NEW_ORDER => self
				.wizard
				.start(&msg)
				.await
				.map_err(|e| EngineError::Handler(e.to_string())),
			_ => {
				if self
					.wizard
					.handle_step(&msg)
					.await
					.map_err(|e| EngineError::Handler(e.to_string()))?
				{
					return Ok(());
				}
				match text.as_str() {
					menu::BTN_ORDERS => self
						.directory
						.list(msg.chat, ListMode::View)
						.await
						.map_err(|e| EngineError::Handler(e.to_string())),
					menu::BTN_ORDER_STAGE => self.route_edit_listing(&msg).await,
					menu::BTN_RESET => self
						.reset
						.request(&msg)
						.await
						.map_err(|e| EngineError::Handler(e.to_string())),
					_ => Ok(()),
				}
			},
		}
	}

	/// The edit-mode listing is private-chat only.
	async fn route_edit_listing(&self, msg: &IncomingMessage) -> Result<(), EngineError> {
		if !msg.chat_kind.is_private() {
			self.transport
				.send_message(
					msg.chat,
					"Orders can only be edited in a private chat with the bot.",
					None,
				)
				.await
				.map_err(|e| EngineError::Service(e.to_string()))?;
			return Ok(());
		}
		self.directory
			.list(msg.chat, ListMode::Edit)
			.await
			.map_err(|e| EngineError::Handler(e.to_string()))
	}

	/// `/start`: greeting plus the role-appropriate main menu.
	async fn send_greeting(&self, msg: &IncomingMessage) -> Result<(), EngineError> {
		let keyboard = if msg.chat_kind.is_private() {
			menu::main_menu(msg.sender.to_string() == self.config.bot.admin_id)
		} else {
			menu::group_menu()
		};
		self.transport
			.send_message(
				msg.chat,
				"Hi! Use the menu below to manage orders.",
				Some(Markup::Reply(keyboard)),
			)
			.await
			.map_err(|e| EngineError::Service(e.to_string()))?;
		Ok(())
	}

	/// Decodes and dispatches a button press. Every press is acked, even
	/// when the payload fails to decode.
	async fn route_callback(&self, query: CallbackQuery) -> Result<(), EngineError> {
		if let Err(e) = self.transport.ack_callback(&query.id).await {
			tracing::warn!(error = %e, "Failed to acknowledge callback");
		}

		let action = match query.payload.parse::<CallbackAction>() {
			Ok(action) => action,
			Err(e) => {
				tracing::warn!(payload = %query.payload, error = %e, "Undecodable callback");
				return Ok(());
			},
		};

		let result = match action {
			CallbackAction::ViewOrder(id) => self.directory.view(&query, id).await,
			CallbackAction::EditOrder(id) => self.directory.open_edit_menu(&query, id).await,
			CallbackAction::SetStatus(id, status) => {
				self.directory.set_status(&query, id, status).await
			},
			CallbackAction::SetDue(id, days) => self.directory.set_due(&query, id, days).await,
			CallbackAction::DeleteConfirm(id) => self.directory.confirm_delete(&query, id).await,
			CallbackAction::DeleteExecute(id) => self.directory.execute_delete(&query, id).await,
			CallbackAction::ResetConfirm => {
				return self
					.reset
					.confirm(&query)
					.await
					.map_err(|e| EngineError::Handler(e.to_string()));
			},
			CallbackAction::ResetCancel => {
				return self
					.reset
					.cancel(&query)
					.await
					.map_err(|e| EngineError::Handler(e.to_string()));
			},
		};
		result.map_err(|e| EngineError::Handler(e.to_string()))
	}

	/// Turns a domain event into a best-effort broadcast notice.
	pub(crate) async fn publish_notice(&self, event: BotEvent) {
		let text = match event {
			BotEvent::OrderCreated {
				order_id,
				description,
			} => format!("New order #{}: {}", order_id, description),
			BotEvent::OrderDeleted { order_id } => format!("Order #{} was deleted.", order_id),
			BotEvent::StoreReset => "All orders were reset.".to_string(),
		};
		if let Err(e) = self.transport.broadcast(&text).await {
			tracing::warn!(error = %e, "Failed to deliver broadcast notice");
		}
	}

	/// Returns a reference to the event bus.
	pub fn event_bus(&self) -> &EventBus {
		&self.event_bus
	}

	/// Returns a reference to the configuration.
	pub fn config(&self) -> &Config {
		&self.config
	}

	/// Returns a reference to the order store.
	pub fn store(&self) -> &Arc<StoreService> {
		&self.store
	}
}
