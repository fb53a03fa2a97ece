//! Core engine for the order-intake bot.
//!
//! This crate ties the pluggable services together: it owns the wizard
//! session store, the three chat-event handlers (wizard, directory, admin
//! reset), the deadline notifier and the event bus, and drives them from a
//! single `select!` loop. The [`BotBuilder`] assembles an engine from the
//! configuration plus factory maps, mirroring how the binary wires
//! implementations in.

pub mod builder;
pub mod engine;
pub mod event_bus;
pub mod handlers;
pub mod menu;
pub mod notifier;
pub mod sessions;

#[cfg(test)]
pub(crate) mod test_support;

pub use builder::{BotBuilder, BotFactories, BuilderError};
pub use engine::{BotEngine, EngineError};
pub use event_bus::{BotEvent, EventBus};
