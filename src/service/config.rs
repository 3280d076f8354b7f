use super::{EchoService, PatternService, TrafficService};
use crate::common::{Quitter, Stats};
use crate::{NetTestError, Result};
use bytes::Bytes;
use std::sync::Arc;

/// Which traffic service a session runs
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServiceConfig {
    /// Reflect received bytes back to the peer
    Echo,
    /// Send and verify a growing repetition of a byte pattern
    Pattern(PatternConfig),
}

impl ServiceConfig {
    /// Short name used in logs and reports
    pub fn name(&self) -> &'static str {
        match self {
            ServiceConfig::Echo => "echo",
            ServiceConfig::Pattern(_) => "pattern",
        }
    }

    /// Whether reports include pattern lengths
    pub fn is_pattern(&self) -> bool {
        matches!(self, ServiceConfig::Pattern(_))
    }

    /// Builds the service bound to a session's quitter and statistics
    pub fn build(&self, quitter: Quitter, stats: Arc<Stats>) -> Arc<dyn TrafficService> {
        match self {
            ServiceConfig::Echo => Arc::new(EchoService::new(quitter)),
            ServiceConfig::Pattern(config) => {
                Arc::new(PatternService::new(config.clone(), quitter, stats))
            }
        }
    }
}

/// Pattern bytes and the range of frame lengths to exchange
///
/// # Examples
///
/// ```
/// use nettest::service::PatternConfig;
///
/// let config = PatternConfig::new("ab", 1, 4).unwrap();
/// assert_eq!(config.min_length(), 1);
///
/// let from_hex = PatternConfig::from_hex("6162", 1, 4).unwrap();
/// assert_eq!(from_hex, config);
///
/// assert!(PatternConfig::new("", 1, 4).is_err());
/// assert!(PatternConfig::new("ab", 5, 4).is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatternConfig {
    pattern: Bytes,
    min_length: usize,
    max_length: usize,
}

impl PatternConfig {
    /// Default first frame length
    pub const DEFAULT_MIN_LENGTH: usize = 1;
    /// Default last frame length
    pub const DEFAULT_MAX_LENGTH: usize = 1024;

    /// Creates a pattern configuration, rejecting an empty pattern or a
    /// minimum length above the maximum
    pub fn new(pattern: impl Into<Bytes>, min_length: usize, max_length: usize) -> Result<Self> {
        let pattern = pattern.into();
        if pattern.is_empty() {
            return Err(NetTestError::Config("pattern is empty".to_string()));
        }
        if min_length > max_length {
            return Err(NetTestError::Config(format!(
                "start length {min_length} is larger than end length {max_length}"
            )));
        }
        Ok(Self {
            pattern,
            min_length,
            max_length,
        })
    }

    /// Creates a pattern configuration from undelimited hex digits
    pub fn from_hex(pattern: &str, min_length: usize, max_length: usize) -> Result<Self> {
        let decoded = hex::decode(pattern)
            .map_err(|e| NetTestError::Config(format!("pattern is invalid: {e}")))?;
        Self::new(decoded, min_length, max_length)
    }

    pub fn pattern(&self) -> &Bytes {
        &self.pattern
    }

    pub fn min_length(&self) -> usize {
        self.min_length
    }

    pub fn max_length(&self) -> usize {
        self.max_length
    }
}
