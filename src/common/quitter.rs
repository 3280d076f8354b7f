use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio_util::sync::CancellationToken;

/// One-shot shutdown signal shared by every task of a session
///
/// A `Quitter` starts active and flips to quit exactly once. Clones share
/// the same state, so any clone may trigger the transition and every clone
/// observes it.
///
/// # Examples
///
/// ```
/// use nettest::common::Quitter;
///
/// # tokio_test::block_on(async {
/// let quitter = Quitter::new();
/// let observer = quitter.clone();
///
/// assert!(quitter.quit());
/// assert!(!quitter.quit());
///
/// observer.wait().await;
/// assert!(!observer.active());
/// # });
/// ```
#[derive(Debug, Clone, Default)]
pub struct Quitter {
    quit: Arc<AtomicBool>,
    token: CancellationToken,
}

impl Quitter {
    /// Creates a new, active quitter
    pub fn new() -> Self {
        Self::default()
    }

    /// Flips the quitter to quit and wakes every waiter
    ///
    /// Returns `true` for the single call that performed the transition and
    /// `false` for every other call.
    pub fn quit(&self) -> bool {
        if self.quit.swap(true, Ordering::AcqRel) {
            return false;
        }
        self.token.cancel();
        true
    }

    /// Returns whether quit has not been signalled yet
    pub fn active(&self) -> bool {
        !self.quit.load(Ordering::Acquire)
    }

    /// Resolves once quit has been signalled, immediately if it already was
    pub async fn wait(&self) {
        self.token.cancelled().await
    }
}
