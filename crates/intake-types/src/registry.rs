//! Registry trait for self-registering implementations.
//!
//! Each pluggable module (storage, transport, updates) provides a Registry
//! struct implementing this trait, tying the name used in configuration
//! files to the factory function that builds the implementation.

/// Base trait for implementation registries.
pub trait ImplementationRegistry {
	/// The name used in configuration files to reference this implementation,
	/// for example "memory" for `storage.implementations.memory`.
	const NAME: &'static str;

	/// The factory function type this implementation provides.
	///
	/// Each module defines its own factory type, for example `StoreFactory`
	/// for storage implementations.
	type Factory;

	/// Get the factory function for this implementation.
	fn factory() -> Self::Factory;
}
