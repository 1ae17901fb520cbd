pub mod events;
pub mod health;
pub mod inventory;

pub use events::user_created;
pub use health::{health_check, metrics_endpoint};
pub use inventory::get_inventory;
