pub mod config;
pub mod countdown;
pub mod progress;
pub mod submission;
pub mod tab_switch;
pub mod types;

// Keep the public surface small and intentional.
pub use config::*;
pub use countdown::*;
pub use progress::*;
pub use submission::*;
pub use tab_switch::*;
pub use types::*;
