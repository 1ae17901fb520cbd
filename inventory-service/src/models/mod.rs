pub mod event;
pub mod inventory;
pub mod profile;

pub use event::UserCreatedEvent;
pub use inventory::{Card, Inventory};
pub use profile::{Profile, DEFAULT_DISPLAY_NAME};
