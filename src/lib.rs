use thiserror::Error;

/// Error types for the nettest library
///
/// Only faults that happen before a session is running are reported as
/// errors. Once the pump is started every I/O failure, deadline expiry, or
/// pattern mismatch ends the session through its quitter instead.
#[derive(Error, Debug)]
pub enum NetTestError {
    /// I/O errors outside the pump (accept, endpoint lookup)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Failed to listen on the requested address
    #[error("Failed to listen on {address}: {source}")]
    Listen {
        address: String,
        #[source]
        source: std::io::Error,
    },

    /// Failed to connect to the requested address
    #[error("Failed to connect to {address}: {source}")]
    Connect {
        address: String,
        #[source]
        source: std::io::Error,
    },

    /// Quit was signalled before a connection was established
    #[error("Interrupted before a connection was established")]
    Interrupted,
}

impl NetTestError {
    /// Whether this error comes from invalid user input
    pub fn is_usage(&self) -> bool {
        matches!(self, NetTestError::Config(_))
    }
}

/// Result type for the nettest library
pub type Result<T> = std::result::Result<T, NetTestError>;

pub mod common;
pub mod network;
pub mod pump;
pub mod service;
pub mod session;

// Re-export main types for convenience
pub use common::{Quitter, Stats, StatsSnapshot};
pub use network::{Address, AddressFamily};
pub use pump::{Pump, PumpConfig};
pub use service::{EchoService, PatternConfig, PatternService, ServiceConfig, TrafficService};
pub use session::{Role, Session, SessionConfig};
