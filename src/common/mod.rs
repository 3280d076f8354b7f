//! Session-wide primitives shared by the pump, the services, and the
//! session driver

pub mod quitter;
pub mod signal;
pub mod stats;
pub mod test_utils;

pub use quitter::Quitter;
pub use signal::spawn_signal_watcher;
pub use stats::{Stats, StatsSnapshot};
pub use test_utils::spawn_tcp_session_server;
