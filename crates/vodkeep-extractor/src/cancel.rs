//! Cooperative cancellation primitive shared by the scheduler's active map
//! and the progress hook (spec §4.3, §5).

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// A one-shot flag a worker's progress hook polls on every callback. Setting
/// it does not interrupt anything by itself; the next hook invocation
/// observes it and raises [`crate::error::ExtractorError::PauseRequested`]
/// to unwind the extractor.
#[derive(Clone, Default)]
pub struct CancelSignal {
    flag: Arc<AtomicBool>,
}

impl CancelSignal {
    /// A fresh, unset signal.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation. Idempotent.
    pub fn set(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    /// Whether cancellation has been requested.
    #[must_use]
    pub fn is_set(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clone_shares_the_same_underlying_flag() {
        let signal = CancelSignal::new();
        let clone = signal.clone();
        assert!(!clone.is_set());
        signal.set();
        assert!(clone.is_set());
    }
}
