use std::collections::BTreeMap;
use std::time::Instant;

/// Observer for batch orchestration: progress, stage timing and status.
///
/// Keeps the use cases free of any particular output mechanism. The CLI logs
/// through `log`, embedding hosts and tests plug in the null logger.
pub trait BatchLogger: Send {
    /// Report that file `current` of `total` has been processed.
    fn progress(&mut self, current: usize, total: usize);

    /// Record how long a named stage took for one file.
    fn timing(&mut self, stage: &str, duration_ms: f64);

    fn info(&mut self, message: &str);

    /// Emit an end-of-batch summary. Default: no-op.
    fn summary(&self) {}
}

/// Discards everything.
pub struct NullBatchLogger;

impl BatchLogger for NullBatchLogger {
    fn progress(&mut self, _current: usize, _total: usize) {}
    fn timing(&mut self, _stage: &str, _duration_ms: f64) {}
    fn info(&mut self, _message: &str) {}
}

/// Routes batch events to the `log` facade.
///
/// Progress lines are throttled to every `throttle` files; per-stage timings
/// are collected into a report emitted by [`BatchLogger::summary`].
pub struct LogBatchLogger {
    throttle: usize,
    timings: BTreeMap<String, Vec<f64>>,
    start_time: Instant,
    processed: usize,
}

impl LogBatchLogger {
    pub fn new(throttle: usize) -> Self {
        Self {
            throttle: throttle.max(1),
            timings: BTreeMap::new(),
            start_time: Instant::now(),
            processed: 0,
        }
    }

    /// Formatted timing report, or `None` before any stage was timed.
    pub fn summary_string(&self) -> Option<String> {
        if self.timings.is_empty() {
            return None;
        }

        let elapsed_ms = self.start_time.elapsed().as_secs_f64() * 1000.0;
        let mut lines = vec![format!(
            "Batch summary ({} files, {:.1}s total):",
            self.processed,
            elapsed_ms / 1000.0
        )];

        for (stage, durations) in &self.timings {
            let total_ms: f64 = durations.iter().sum();
            let avg_ms = total_ms / durations.len().max(1) as f64;
            lines.push(format!(
                "  {stage:10}: avg {avg_ms:7.1}ms  total {total_ms:8.0}ms  ({} calls)",
                durations.len()
            ));
        }

        if self.processed > 0 && elapsed_ms > 0.0 {
            let per_file = elapsed_ms / self.processed as f64;
            lines.push(format!("  Throughput: {per_file:.1}ms/file"));
        }

        Some(lines.join("\n"))
    }

    pub fn timings_for(&self, stage: &str) -> Option<&[f64]> {
        self.timings.get(stage).map(|v| v.as_slice())
    }
}

impl Default for LogBatchLogger {
    fn default() -> Self {
        Self::new(10)
    }
}

impl BatchLogger for LogBatchLogger {
    fn progress(&mut self, current: usize, total: usize) {
        self.processed = current;
        if total > 0 && (current % self.throttle == 0 || current == total) {
            log::info!("Classified {current}/{total} images");
        }
    }

    fn timing(&mut self, stage: &str, duration_ms: f64) {
        self.timings
            .entry(stage.to_string())
            .or_default()
            .push(duration_ms);
    }

    fn info(&mut self, message: &str) {
        log::info!("{message}");
    }

    fn summary(&self) {
        if let Some(text) = self.summary_string() {
            log::info!("\n\n{text}");
        }
    }
}
