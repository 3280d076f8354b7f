use super::TrafficService;
use crate::common::Quitter;
use async_trait::async_trait;
use bytes::Bytes;
use tokio::sync::{Mutex, mpsc};
use tracing::trace;

/// Reflects every received chunk back to the peer
///
/// Received chunks pass through a single-slot channel, so at most one chunk
/// waits between the reader and the writer. A slow writer stalls the reader.
pub struct EchoService {
    forward: mpsc::Sender<Bytes>,
    backward: Mutex<mpsc::Receiver<Bytes>>,
    quitter: Quitter,
}

impl EchoService {
    pub fn new(quitter: Quitter) -> Self {
        let (forward, backward) = mpsc::channel(1);
        Self {
            forward,
            backward: Mutex::new(backward),
            quitter,
        }
    }
}

#[async_trait]
impl TrafficService for EchoService {
    async fn consume(&self, data: &[u8]) {
        let chunk = Bytes::copy_from_slice(data);
        tokio::select! {
            biased;
            _ = self.quitter.wait() => {
                trace!(size = data.len(), "Dropping chunk, session is quitting");
            }
            _ = self.forward.send(chunk) => {}
        }
    }

    async fn produce(&self) -> Option<Bytes> {
        let mut backward = self.backward.lock().await;
        tokio::select! {
            biased;
            _ = self.quitter.wait() => None,
            chunk = backward.recv() => chunk,
        }
    }
}
