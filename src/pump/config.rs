use std::time::Duration;

/// Configuration for the read and write loops of a pump
///
/// # Examples
///
/// ```
/// use nettest::pump::PumpConfig;
/// use std::time::Duration;
///
/// let config = PumpConfig::default().with_timeout(Duration::from_secs(5));
/// assert_eq!(config.buffer_size, 1024);
/// assert_eq!(config.deadline(), Some(Duration::from_secs(5)));
/// assert_eq!(PumpConfig::default().deadline(), None);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PumpConfig {
    /// Size of the receive buffer in bytes
    pub buffer_size: usize,
    /// Deadline for each read and each write, zero to disable
    pub timeout: Duration,
}

impl Default for PumpConfig {
    fn default() -> Self {
        Self {
            buffer_size: 1024,
            timeout: Duration::ZERO,
        }
    }
}

impl PumpConfig {
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

    /// The per-operation deadline, if one is configured
    pub fn deadline(&self) -> Option<Duration> {
        (!self.timeout.is_zero()).then_some(self.timeout)
    }
}
