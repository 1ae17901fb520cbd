//! Account-creation event handling.

pub mod provisioner;
pub mod queue;

pub use provisioner::{ProfileProvisioner, ProvisionError};
pub use queue::{EventDispatcher, EventQueue};
