use crate::network::AddressFamily;
use crate::pump::PumpConfig;
use crate::service::ServiceConfig;
use crate::{NetTestError, Result};
use std::fmt;
use std::time::Duration;

/// Whether the session dials out or waits for a peer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    /// Connect to the address
    Client,
    /// Listen on the address and accept a single connection
    Server,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Client => f.write_str("client"),
            Role::Server => f.write_str("server"),
        }
    }
}

/// Fully resolved configuration of one session
///
/// # Examples
///
/// ```
/// use nettest::network::AddressFamily;
/// use nettest::service::ServiceConfig;
/// use nettest::session::{Role, SessionConfig};
/// use std::time::Duration;
///
/// let config = SessionConfig::new(
///     AddressFamily::Tcp,
///     "127.0.0.1:9000",
///     Role::Client,
///     ServiceConfig::Echo,
/// )
/// .with_timeout(Duration::from_secs(5))
/// .with_stats(true);
///
/// assert_eq!(config.buffer_size, 1024);
/// assert_eq!(config.interval, Duration::from_secs(15));
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Address family of the socket
    pub family: AddressFamily,
    /// Address to listen on or dial
    pub address: String,
    /// Client or server
    pub role: Role,
    /// Traffic service to run over the connection
    pub service: ServiceConfig,
    /// Size of the receive buffer in bytes
    pub buffer_size: usize,
    /// Per-read and per-write deadline, zero to disable
    pub timeout: Duration,
    /// Print final statistics on exit
    pub stats: bool,
    /// Interval between periodic statistics reports, zero to disable
    pub interval: Duration,
}

impl SessionConfig {
    /// Default interval between periodic reports
    pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(15);

    pub fn new(
        family: AddressFamily,
        address: impl Into<String>,
        role: Role,
        service: ServiceConfig,
    ) -> Self {
        Self {
            family,
            address: address.into(),
            role,
            service,
            buffer_size: 1024,
            timeout: Duration::ZERO,
            stats: false,
            interval: Self::DEFAULT_INTERVAL,
        }
    }

    /// Set the receive buffer size
    pub fn with_buffer_size(mut self, buffer_size: usize) -> Self {
        self.buffer_size = buffer_size;
        self
    }

    /// Set the per-operation deadline
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Print final statistics on exit
    pub fn with_stats(mut self, stats: bool) -> Self {
        self.stats = stats;
        self
    }

    /// Set the periodic report interval
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Rejects values that cannot run a session
    pub fn validate(&self) -> Result<()> {
        if self.address.is_empty() {
            return Err(NetTestError::Config("addr is required".to_string()));
        }
        if self.buffer_size == 0 {
            return Err(NetTestError::Config(
                "buffer size must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    /// Configuration for the connection pump
    pub fn pump_config(&self) -> PumpConfig {
        PumpConfig::default()
            .with_buffer_size(self.buffer_size)
            .with_timeout(self.timeout)
    }
}

/// Parses a duration such as `15s`, `1m30s`, `250ms`, or `0`
///
/// Any unit accepted by `humantime` works (`ns`, `us`, `ms`, `s`, `m`, `h`,
/// ...). A bare `0` needs no unit.
///
/// ```
/// use nettest::session::parse_duration;
/// use std::time::Duration;
///
/// assert_eq!(parse_duration("1m30s").unwrap(), Duration::from_secs(90));
/// assert_eq!(parse_duration("1s 500ms").unwrap(), Duration::from_millis(1500));
/// assert_eq!(parse_duration("0").unwrap(), Duration::ZERO);
/// assert!(parse_duration("10").is_err());
/// ```
pub fn parse_duration(input: &str) -> Result<Duration> {
    let text = input.trim();
    if text == "0" {
        return Ok(Duration::ZERO);
    }
    humantime::parse_duration(text)
        .map_err(|e| NetTestError::Config(format!("invalid duration {input:?}: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> SessionConfig {
        SessionConfig::new(AddressFamily::Tcp, ":8080", Role::Server, ServiceConfig::Echo)
    }

    #[test]
    fn test_defaults() {
        let config = config();
        assert_eq!(config.buffer_size, 1024);
        assert_eq!(config.timeout, Duration::ZERO);
        assert!(!config.stats);
        assert_eq!(config.interval, Duration::from_secs(15));
        assert_eq!(config.pump_config().deadline(), None);
    }

    #[test]
    fn test_zero_buffer_rejected() {
        let err = config().with_buffer_size(0).validate().unwrap_err();
        assert!(err.is_usage());
    }

    #[test]
    fn test_empty_address_rejected() {
        let mut config = config();
        config.address.clear();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_pump_config_follows_session() {
        let pump = config()
            .with_buffer_size(64)
            .with_timeout(Duration::from_millis(300))
            .pump_config();
        assert_eq!(pump.buffer_size, 64);
        assert_eq!(pump.deadline(), Some(Duration::from_millis(300)));
    }

    #[test]
    fn test_parse_duration_units() {
        assert_eq!(parse_duration("15s").unwrap(), Duration::from_secs(15));
        assert_eq!(parse_duration("250ms").unwrap(), Duration::from_millis(250));
        assert_eq!(parse_duration("2h").unwrap(), Duration::from_secs(7200));
        assert_eq!(parse_duration("1h2m3s").unwrap(), Duration::from_secs(3723));
        assert_eq!(parse_duration("500us").unwrap(), Duration::from_micros(500));
        assert_eq!(parse_duration("0s").unwrap(), Duration::ZERO);
    }

    #[test]
    fn test_parse_duration_rejects_garbage() {
        for input in ["", "s", "5x", "10", "-1s", "ms5"] {
            assert!(parse_duration(input).is_err(), "{input:?} should not parse");
        }
    }
}
