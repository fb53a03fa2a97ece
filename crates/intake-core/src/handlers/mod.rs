//! Event handlers wired into the engine's run loop.

pub mod directory;
pub mod reset;
pub mod wizard;

pub use directory::{DirectoryError, DirectoryHandler};
pub use reset::{ResetError, ResetHandler};
pub use wizard::{WizardError, WizardHandler};
