//! A [`ProgressReporter`] that emits progress as tracing events.

use pipeline::ProgressReporter;
use tracing::info;

/// Reports progress as `info` events.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingProgress;

impl ProgressReporter for TracingProgress {
    fn set_progress(&self, fraction: f64, message: &str) {
        info!(
            percent = (fraction.clamp(0.0, 1.0) * 100.0).round() as u32,
            "{message}"
        );
    }
}
