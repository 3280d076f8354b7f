//! Traffic services that feed and drain a pumped connection
//!
//! A service has two sides. The pump's reader hands every received chunk to
//! [`TrafficService::consume`] and the pump's writer sends whatever
//! [`TrafficService::produce`] returns. At most one `consume` and one
//! `produce` call are in flight at a time, but the two sides run concurrently.

pub mod config;
pub mod echo;
pub mod pattern;

pub use config::{PatternConfig, ServiceConfig};
pub use echo::EchoService;
pub use pattern::{PatternService, frame};

use async_trait::async_trait;
use bytes::Bytes;

/// Common interface for the traffic generators driven by the pump
#[async_trait]
pub trait TrafficService: Send + Sync {
    /// Accepts bytes received from the peer
    async fn consume(&self, data: &[u8]);

    /// Returns the next chunk to send
    ///
    /// `None` means the service has nothing further to send, either because
    /// the session is quitting or because the service ran to completion.
    async fn produce(&self) -> Option<Bytes>;
}
