//! Progress-callback trait for transcript formatting events.
//!
//! Inject an [`Arc<dyn FormatProgressCallback>`] via
//! [`crate::config::FormatConfigBuilder::progress_callback`] to follow a
//! transcript through the pipeline: input loaded, each LLM attempt, the
//! formatted markup arriving, and the rendered document.
//!
//! # Example
//!
//! ```rust
//! use transcript_docx::{FormatConfig, FormatProgressCallback};
//! use std::sync::{Arc, atomic::{AtomicU32, Ordering}};
//!
//! struct AttemptCounter {
//!     attempts: AtomicU32,
//! }
//!
//! impl FormatProgressCallback for AttemptCounter {
//!     fn on_attempt_start(&self, attempt: u32, max_attempts: u32) {
//!         self.attempts.fetch_add(1, Ordering::SeqCst);
//!         eprintln!("LLM attempt {}/{}", attempt, max_attempts);
//!     }
//! }
//!
//! let counter = Arc::new(AttemptCounter { attempts: AtomicU32::new(0) });
//!
//! let config = FormatConfig::builder()
//!     .progress_callback(counter as Arc<dyn FormatProgressCallback>)
//!     .build()
//!     .unwrap();
//! ```

use std::sync::Arc;

/// Called by the formatting pipeline as a transcript moves through it.
///
/// Implementations must be `Send + Sync`: the same config (and callback) may
/// drive several transcripts on different tasks. All methods have default
/// no-op implementations so callers only override what they care about.
pub trait FormatProgressCallback: Send + Sync {
    /// The raw transcript has been loaded.
    ///
    /// # Arguments
    /// * `input_chars`: character count of the raw transcript
    fn on_format_start(&self, input_chars: usize) {
        let _ = input_chars;
    }

    /// An LLM request is about to be sent.
    ///
    /// # Arguments
    /// * `attempt`: 1-indexed attempt number
    /// * `max_attempts`: `max_retries + 1`
    fn on_attempt_start(&self, attempt: u32, max_attempts: u32) {
        let _ = (attempt, max_attempts);
    }

    /// An LLM attempt failed or timed out; another may follow.
    fn on_attempt_failed(&self, attempt: u32, error: &str) {
        let _ = (attempt, error);
    }

    /// Formatted markup was received (or taken as-is when preformatted).
    ///
    /// # Arguments
    /// * `markup_len`: byte length of the formatter output, before cleanup
    fn on_formatted(&self, markup_len: usize) {
        let _ = markup_len;
    }

    /// The document has been rendered.
    ///
    /// # Arguments
    /// * `blocks`: body block count
    /// * `warnings`: markup warnings raised while rendering
    fn on_format_complete(&self, blocks: usize, warnings: usize) {
        let _ = (blocks, warnings);
    }
}

/// A no-op implementation for callers that don't need progress events.
///
/// This is the default when no callback is configured.
pub struct NoopProgressCallback;

impl FormatProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::FormatConfig`].
pub type ProgressCallback = Arc<dyn FormatProgressCallback>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    #[derive(Default)]
    struct TrackingCallback {
        attempts: AtomicUsize,
        failures: Mutex<Vec<String>>,
        blocks: AtomicUsize,
    }

    impl FormatProgressCallback for TrackingCallback {
        fn on_attempt_start(&self, _attempt: u32, _max_attempts: u32) {
            self.attempts.fetch_add(1, Ordering::SeqCst);
        }

        fn on_attempt_failed(&self, _attempt: u32, error: &str) {
            self.failures.lock().unwrap().push(error.to_string());
        }

        fn on_format_complete(&self, blocks: usize, _warnings: usize) {
            self.blocks.store(blocks, Ordering::SeqCst);
        }
    }

    #[test]
    fn noop_callback_does_not_panic() {
        let cb = NoopProgressCallback;
        cb.on_format_start(1200);
        cb.on_attempt_start(1, 4);
        cb.on_attempt_failed(1, "rate limited");
        cb.on_formatted(900);
        cb.on_format_complete(12, 0);
    }

    #[test]
    fn tracking_callback_receives_events() {
        let tracker = TrackingCallback::default();
        tracker.on_attempt_start(1, 3);
        tracker.on_attempt_failed(1, "HTTP 529");
        tracker.on_attempt_start(2, 3);
        tracker.on_format_complete(17, 2);

        assert_eq!(tracker.attempts.load(Ordering::SeqCst), 2);
        assert_eq!(*tracker.failures.lock().unwrap(), vec!["HTTP 529".to_string()]);
        assert_eq!(tracker.blocks.load(Ordering::SeqCst), 17);
    }

    #[test]
    fn arc_dyn_callback_works() {
        let cb: ProgressCallback = Arc::new(NoopProgressCallback);
        cb.on_format_start(10);
        cb.on_formatted(5);
    }
}
