//! Progress-callback trait for per-module pipeline events.
//!
//! Inject an [`Arc<dyn PipelineProgressCallback>`] via
//! [`crate::config::PipelineConfigBuilder::progress_callback`] to receive
//! events as the batch driver works through documents and modules.
//!
//! The callback approach keeps the library ignorant of how the host reports
//! progress: the CLI draws a terminal progress bar, tests count events. The
//! trait is `Send + Sync` because builder work runs on tokio's blocking pool.
//!
//! # Example
//!
//! ```rust
//! use pdf2dataset::{PipelineConfig, PipelineProgressCallback};
//! use std::sync::{Arc, atomic::{AtomicUsize, Ordering}};
//!
//! struct SkipCounter {
//!     skipped: AtomicUsize,
//! }
//!
//! impl PipelineProgressCallback for SkipCounter {
//!     fn on_page_skipped(&self, module: &str, page: u32, reason: &str) {
//!         self.skipped.fetch_add(1, Ordering::SeqCst);
//!         eprintln!("{module}: page {page} skipped ({reason})");
//!     }
//! }
//!
//! let counter = Arc::new(SkipCounter { skipped: AtomicUsize::new(0) });
//!
//! let config = PipelineConfig::builder()
//!     .progress_callback(counter as Arc<dyn PipelineProgressCallback>)
//!     .build()
//!     .unwrap();
//! ```

use std::sync::Arc;

/// Called by the batch driver and the dataset builders.
///
/// All methods have default no-op implementations so callers only override
/// what they care about. "Module" here means one PDF during extraction and
/// one extracted-content bundle during dataset building.
pub trait PipelineProgressCallback: Send + Sync {
    /// Called once before the first module is processed.
    fn on_batch_start(&self, total_modules: usize) {
        let _ = total_modules;
    }

    /// Called before a module is processed.
    ///
    /// # Arguments
    /// * `module` — module name (PDF stem)
    /// * `index`  — 1-indexed position in the batch
    /// * `total`  — number of modules in the batch
    fn on_module_start(&self, module: &str, index: usize, total: usize) {
        let _ = (module, index, total);
    }

    /// Called when a page with text is dropped because no image resolved.
    fn on_page_skipped(&self, module: &str, page: u32, reason: &str) {
        let _ = (module, page, reason);
    }

    /// Called when a module finished; `items` is the number of records
    /// (building) or pages with text (extraction).
    fn on_module_complete(&self, module: &str, items: usize) {
        let _ = (module, items);
    }

    /// Called when a module failed fatally; the batch continues.
    fn on_module_error(&self, module: &str, error: &str) {
        let _ = (module, error);
    }

    /// Called once after all modules have been attempted.
    fn on_batch_complete(&self, total_modules: usize, success_count: usize) {
        let _ = (total_modules, success_count);
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgressCallback;

impl PipelineProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::PipelineConfig`].
pub type ProgressCallback = Arc<dyn PipelineProgressCallback>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct TrackingCallback {
        starts: AtomicUsize,
        skipped: AtomicUsize,
        completes: AtomicUsize,
        errors: AtomicUsize,
    }

    impl PipelineProgressCallback for TrackingCallback {
        fn on_module_start(&self, _module: &str, _index: usize, _total: usize) {
            self.starts.fetch_add(1, Ordering::SeqCst);
        }

        fn on_page_skipped(&self, _module: &str, _page: u32, _reason: &str) {
            self.skipped.fetch_add(1, Ordering::SeqCst);
        }

        fn on_module_complete(&self, _module: &str, _items: usize) {
            self.completes.fetch_add(1, Ordering::SeqCst);
        }

        fn on_module_error(&self, _module: &str, _error: &str) {
            self.errors.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn noop_callback_does_not_panic() {
        let cb = NoopProgressCallback;
        cb.on_batch_start(2);
        cb.on_module_start("week1", 1, 2);
        cb.on_page_skipped("week1", 4, "no image found");
        cb.on_module_complete("week1", 10);
        cb.on_module_error("week2", "text file missing");
        cb.on_batch_complete(2, 1);
    }

    #[test]
    fn tracking_callback_receives_events() {
        let tracker = TrackingCallback::default();

        tracker.on_module_start("a", 1, 2);
        tracker.on_page_skipped("a", 3, "no image found");
        tracker.on_module_complete("a", 5);
        tracker.on_module_start("b", 2, 2);
        tracker.on_module_error("b", "boom");

        assert_eq!(tracker.starts.load(Ordering::SeqCst), 2);
        assert_eq!(tracker.skipped.load(Ordering::SeqCst), 1);
        assert_eq!(tracker.completes.load(Ordering::SeqCst), 1);
        assert_eq!(tracker.errors.load(Ordering::SeqCst), 1);
    }
}
