pub mod capture;
pub mod controller;
pub mod error;
pub mod events;
pub mod gate;
pub mod progress;
pub mod session;
pub mod traits;
