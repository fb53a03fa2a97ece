//! Event bus for decoupled notifications inside the engine.
//!
//! Handlers publish domain events after their store mutation commits; the
//! engine's run loop subscribes and turns them into best-effort broadcast
//! notices. Publishing never blocks and never fails the publishing handler:
//! a bus with no subscriber simply drops the event.

use intake_types::OrderId;
use tokio::sync::broadcast;

/// Events published by handlers after a committed mutation.
#[derive(Debug, Clone)]
pub enum BotEvent {
	/// A wizard draft was finalized into a persisted order.
	OrderCreated { order_id: OrderId, description: String },
	/// An order was removed through the edit menu.
	OrderDeleted { order_id: OrderId },
	/// The admin wiped the store.
	StoreReset,
}

/// Broadcast bus connecting handlers to the engine's notice loop.
#[derive(Debug, Clone)]
pub struct EventBus {
	sender: broadcast::Sender<BotEvent>,
}

impl EventBus {
	/// Creates a new event bus with the specified channel capacity.
	pub fn new(capacity: usize) -> Self {
		let (sender, _) = broadcast::channel(capacity);
		Self { sender }
	}

	/// Publishes an event to all subscribers.
	pub fn publish(&self, event: BotEvent) -> Result<(), broadcast::error::SendError<BotEvent>> {
		self.sender.send(event).map(|_| ())
	}

	/// Creates a new subscription to the event bus.
	pub fn subscribe(&self) -> broadcast::Receiver<BotEvent> {
		self.sender.subscribe()
	}
}

impl Default for EventBus {
	fn default() -> Self {
		Self::new(1000)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[tokio::test]
	async fn subscriber_receives_published_events() {
		let bus = EventBus::default();
		let mut rx = bus.subscribe();

		bus.publish(BotEvent::OrderCreated {
			order_id: OrderId(1),
			description: "cake".into(),
		})
		.unwrap();

		match rx.recv().await.unwrap() {
			BotEvent::OrderCreated { order_id, .. } => assert_eq!(order_id, OrderId(1)),
			other => panic!("unexpected event: {:?}", other),
		}
	}

	#[test]
	fn publish_without_subscribers_is_not_fatal() {
		let bus = EventBus::default();
		// No subscriber; the send error is discarded at call sites.
		assert!(bus.publish(BotEvent::StoreReset).is_err());
	}
}
