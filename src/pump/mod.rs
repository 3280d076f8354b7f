//! Connection pump
//!
//! Binds a traffic service to a live stream and runs it until the session's
//! quitter fires.

pub mod config;
pub mod driver;


pub use config::PumpConfig;
pub use driver::Pump;
