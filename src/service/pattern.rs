use super::{PatternConfig, TrafficService};
use crate::common::{Quitter, Stats};
use async_trait::async_trait;
use bytes::{Bytes, BytesMut};
use std::sync::{Arc, Mutex};
use tracing::{debug, info, trace, warn};

/// Returns the first `length` bytes of the endless repetition of `pattern`
///
/// ```
/// use nettest::service::frame;
///
/// assert_eq!(&frame(b"ab", 5)[..], b"ababa");
/// assert!(frame(b"ab", 0).is_empty());
/// ```
pub fn frame(pattern: &[u8], length: usize) -> Bytes {
    let mut out = BytesMut::with_capacity(length);
    if pattern.is_empty() {
        return out.freeze();
    }
    let mut remaining = length;
    while remaining > 0 {
        let take = remaining.min(pattern.len());
        out.extend_from_slice(&pattern[..take]);
        remaining -= take;
    }
    out.freeze()
}

/// Verifier state: the next frame length to check and the bytes of a
/// partially received frame
#[derive(Debug)]
struct Verifier {
    expected: usize,
    cache: BytesMut,
}

/// Sends frames of increasing length and verifies that the peer sends the
/// same sequence back
///
/// Both directions start at the configured minimum length and grow by one
/// byte per frame up to the maximum. Verification failure and verification
/// completion both quit the session; the two outcomes are told apart by the
/// last verified length recorded in [`Stats`].
pub struct PatternService {
    config: PatternConfig,
    quitter: Quitter,
    stats: Arc<Stats>,
    next_out: Mutex<usize>,
    verifier: Mutex<Verifier>,
}

impl PatternService {
    pub fn new(config: PatternConfig, quitter: Quitter, stats: Arc<Stats>) -> Self {
        let min_length = config.min_length();
        Self {
            config,
            quitter,
            stats,
            next_out: Mutex::new(min_length),
            verifier: Mutex::new(Verifier {
                expected: min_length,
                cache: BytesMut::new(),
            }),
        }
    }

    /// Expected frame of the given length for this service's pattern
    pub fn frame(&self, length: usize) -> Bytes {
        frame(self.config.pattern(), length)
    }

    /// Checks received bytes against the expected frames
    ///
    /// Returns without verifying anything once the session is quitting.
    fn verify(&self, data: &[u8]) {
        let max_length = self.config.max_length();
        let Ok(mut verifier) = self.verifier.lock() else {
            self.quitter.quit();
            return;
        };

        if verifier.expected > max_length {
            self.quitter.quit();
            return;
        }
        if !self.quitter.active() {
            return;
        }

        trace!(size = data.len(), cached = verifier.cache.len(), "Verifying chunk");
        verifier.cache.extend_from_slice(data);

        while verifier.expected <= max_length && verifier.cache.len() >= verifier.expected {
            let length = verifier.expected;
            let candidate = verifier.cache.split_to(length);
            let expected = self.frame(length);
            trace!(
                length,
                received = %String::from_utf8_lossy(&candidate),
                expected = %String::from_utf8_lossy(&expected),
                "Comparing frame"
            );

            if candidate[..] != expected[..] {
                warn!(length, "Pattern mismatch");
                self.quitter.quit();
                return;
            }

            self.stats.set_pattern_length_in(length);
            verifier.expected += 1;
        }

        if verifier.expected > max_length {
            info!(length = max_length, "Pattern verified up to the end length");
            self.quitter.quit();
        }
    }

    /// Next frame to send, or `None` once the end length has been sent
    fn next_frame(&self) -> Option<Bytes> {
        if !self.quitter.active() {
            return None;
        }
        let mut next_out = self.next_out.lock().ok()?;
        if *next_out > self.config.max_length() {
            return None;
        }

        let length = *next_out;
        *next_out += 1;
        self.stats.set_pattern_length_out(length);
        if length == self.config.max_length() {
            debug!(length, "Sending final frame");
        }
        Some(self.frame(length))
    }
}

#[async_trait]
impl TrafficService for PatternService {
    async fn consume(&self, data: &[u8]) {
        self.verify(data);
    }

    async fn produce(&self) -> Option<Bytes> {
        self.next_frame()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service(
        pattern: &'static str,
        min: usize,
        max: usize,
    ) -> (PatternService, Quitter, Arc<Stats>) {
        let quitter = Quitter::new();
        let stats = Arc::new(Stats::new());
        let config = PatternConfig::new(pattern, min, max).unwrap();
        (
            PatternService::new(config, quitter.clone(), stats.clone()),
            quitter,
            stats,
        )
    }

    #[test]
    fn test_frame_truncates_last_repetition() {
        assert_eq!(&frame(b"abc", 7)[..], b"abcabca");
        assert_eq!(&frame(b"abc", 3)[..], b"abc");
        assert_eq!(&frame(b"abc", 2)[..], b"ab");
        assert_eq!(&frame(b"x", 4)[..], b"xxxx");
    }

    #[tokio::test]
    async fn test_produces_growing_frames_then_stops() {
        let (pattern, quitter, stats) = service("ab", 1, 4);

        let mut frames = Vec::new();
        while let Some(chunk) = pattern.produce().await {
            frames.push(chunk);
        }

        assert_eq!(frames, vec!["a", "ab", "aba", "abab"]);
        assert_eq!(stats.pattern_length_out(), 4);
        // Running out of frames is not a reason to quit
        assert!(quitter.active());
    }

    #[tokio::test]
    async fn test_produce_returns_nothing_after_quit() {
        let (pattern, quitter, _) = service("ab", 1, 4);
        quitter.quit();
        assert!(pattern.produce().await.is_none());
    }

    #[tokio::test]
    async fn test_verifies_full_sequence() {
        let (pattern, quitter, stats) = service("ab", 1, 4);

        for (chunk, verified) in [("a", 1), ("ab", 2), ("aba", 3)] {
            pattern.consume(chunk.as_bytes()).await;
            assert_eq!(stats.pattern_length_in(), verified);
            assert!(quitter.active());
        }

        pattern.consume(b"abab").await;
        assert_eq!(stats.pattern_length_in(), 4);
        assert!(!quitter.active());
    }

    #[tokio::test]
    async fn test_mismatch_stops_verification() {
        let (pattern, quitter, stats) = service("ab", 1, 4);

        pattern.consume(b"a").await;
        pattern.consume(b"ab").await;
        pattern.consume(b"abx").await;

        assert_eq!(stats.pattern_length_in(), 2);
        assert!(!quitter.active());

        // Nothing is verified after the mismatch
        pattern.consume(b"abab").await;
        assert_eq!(stats.pattern_length_in(), 2);
    }

    #[tokio::test]
    async fn test_resynchronizes_across_split_chunks() {
        let (pattern, quitter, stats) = service("xyz", 2, 6);
        let stream: Vec<u8> = (2..=6).flat_map(|len| frame(b"xyz", len).to_vec()).collect();

        // Chunks that never line up with frame boundaries
        for chunk in stream.chunks(4) {
            pattern.consume(chunk).await;
        }

        assert_eq!(stats.pattern_length_in(), 6);
        assert!(!quitter.active());
    }

    #[tokio::test]
    async fn test_coalesced_frames_in_one_chunk() {
        let (pattern, _, stats) = service("ab", 1, 10);
        pattern.consume(b"aababaabab").await;
        assert_eq!(stats.pattern_length_in(), 4);
    }

    #[tokio::test]
    async fn test_partial_frame_is_cached() {
        let (pattern, quitter, stats) = service("ab", 3, 5);

        pattern.consume(b"ab").await;
        assert_eq!(stats.pattern_length_in(), 0);
        assert_eq!(pattern.verifier.lock().unwrap().cache.len(), 2);

        pattern.consume(b"a").await;
        assert_eq!(stats.pattern_length_in(), 3);
        assert!(pattern.verifier.lock().unwrap().cache.is_empty());
        assert!(quitter.active());
    }

    #[tokio::test]
    async fn test_consume_after_completion_quits() {
        let quitter = Quitter::new();
        let stats = Arc::new(Stats::new());
        let config = PatternConfig::new("ab", 1, 1).unwrap();
        let pattern = PatternService::new(config, quitter.clone(), stats.clone());

        pattern.consume(b"a").await;
        assert!(!quitter.active());
        assert_eq!(stats.pattern_length_in(), 1);

        pattern.consume(b"a").await;
        assert_eq!(stats.pattern_length_in(), 1);
    }

    #[tokio::test]
    async fn test_produced_frames_verify_on_a_peer() {
        let (sender, _, _) = service("hello", 1, 32);
        let (receiver, quitter, stats) = service("hello", 1, 32);

        while let Some(chunk) = sender.produce().await {
            receiver.consume(&chunk).await;
        }

        assert_eq!(stats.pattern_length_in(), 32);
        assert!(!quitter.active());
    }
}
