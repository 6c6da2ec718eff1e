use std::collections::HashMap;
use std::time::Instant;

/// Observer for re-identification runs.
///
/// Executors report through this trait so the binary, tests and any
/// embedding application can each decide what to do with the events.
pub trait PipelineLogger: Send {
    fn progress(&mut self, current: usize, total: usize);

    /// How long a named stage took for one frame.
    fn timing(&mut self, stage: &str, duration_ms: f64);

    /// A per-frame sample, e.g. registry size or detections in the frame.
    fn metric(&mut self, name: &str, value: f64);

    fn info(&mut self, message: &str);

    fn summary(&self) {}
}

/// Discards everything.
pub struct NullPipelineLogger;

impl PipelineLogger for NullPipelineLogger {
    fn progress(&mut self, _current: usize, _total: usize) {}
    fn timing(&mut self, _stage: &str, _duration_ms: f64) {}
    fn metric(&mut self, _name: &str, _value: f64) {}
    fn info(&mut self, _message: &str) {}
}

/// Forwards to the `log` crate and keeps enough history for an end-of-run
/// summary: per-stage average and total time, per-metric average and last
/// value, and overall throughput in frames per second.
///
/// Progress lines are emitted every `throttle_frames` frames and on the last.
pub struct LogPipelineLogger {
    throttle_frames: usize,
    timings: HashMap<String, Vec<f64>>,
    metrics: HashMap<String, Vec<f64>>,
    start_time: Instant,
    frames_seen: usize,
    messages: Vec<String>,
}

impl LogPipelineLogger {
    pub fn new(throttle_frames: usize) -> Self {
        Self {
            throttle_frames: throttle_frames.max(1),
            timings: HashMap::new(),
            metrics: HashMap::new(),
            start_time: Instant::now(),
            frames_seen: 0,
            messages: Vec::new(),
        }
    }

    pub fn summary_string(&self) -> Option<String> {
        if self.timings.is_empty() && self.metrics.is_empty() {
            return None;
        }

        let elapsed_s = self.start_time.elapsed().as_secs_f64();
        let frames = self.frames_seen;
        let mut lines = vec![format!(
            "Re-identification summary ({frames} frames, {elapsed_s:.1}s):"
        )];

        let mut stages: Vec<_> = self.timings.iter().collect();
        stages.sort_by(|a, b| a.0.cmp(b.0));
        for (stage, durations) in stages {
            let total_ms: f64 = durations.iter().sum();
            let avg_ms = mean(durations);
            lines.push(format!(
                "  {stage:12}: avg {avg_ms:7.3}ms  total {total_ms:8.1}ms"
            ));
        }

        let mut metrics: Vec<_> = self.metrics.iter().collect();
        metrics.sort_by(|a, b| a.0.cmp(b.0));
        for (name, values) in metrics {
            let last = values.last().copied().unwrap_or(0.0);
            lines.push(format!("  {name}: avg {:.1}, last {last}", mean(values)));
        }

        if frames > 0 && elapsed_s > 0.0 {
            lines.push(format!("  Throughput: {:.1} fps", frames as f64 / elapsed_s));
        }

        Some(lines.join("\n"))
    }

    pub fn timings_for(&self, stage: &str) -> Option<&[f64]> {
        self.timings.get(stage).map(|v| v.as_slice())
    }

    pub fn metrics_for(&self, name: &str) -> Option<&[f64]> {
        self.metrics.get(name).map(|v| v.as_slice())
    }
}

impl Default for LogPipelineLogger {
    fn default() -> Self {
        Self::new(100)
    }
}

impl PipelineLogger for LogPipelineLogger {
    fn progress(&mut self, current: usize, total: usize) {
        self.frames_seen = current;
        if current % self.throttle_frames == 0 || current == total {
            if total > 0 {
                let pct = current as f64 / total as f64 * 100.0;
                log::info!("Identified {current}/{total} frames ({pct:.1}%)");
            } else {
                log::info!("Identified {current} frames");
            }
        }
    }

    fn timing(&mut self, stage: &str, duration_ms: f64) {
        self.timings
            .entry(stage.to_string())
            .or_default()
            .push(duration_ms);
    }

    fn metric(&mut self, name: &str, value: f64) {
        self.metrics.entry(name.to_string()).or_default().push(value);
    }

    fn info(&mut self, message: &str) {
        self.messages.push(message.to_string());
        log::info!("{message}");
    }

    fn summary(&self) {
        if let Some(text) = self.summary_string() {
            log::info!("\n{text}");
        }
    }
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        0.0
    } else {
        values.iter().sum::<f64>() / values.len() as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_null_logger_accepts_everything() {
        let mut logger = NullPipelineLogger;
        logger.progress(1, 10);
        logger.timing("identify", 1.0);
        logger.metric("registry_size", 3.0);
        logger.info("hello");
        logger.summary();
    }

    #[test]
    fn test_timings_recorded_per_stage() {
        let mut logger = LogPipelineLogger::new(10);
        logger.timing("identify", 2.0);
        logger.timing("identify", 4.0);
        logger.timing("write", 1.0);
        assert_eq!(logger.timings_for("identify"), Some(&[2.0, 4.0][..]));
        assert_eq!(logger.timings_for("write"), Some(&[1.0][..]));
        assert!(logger.timings_for("read").is_none());
    }

    #[test]
    fn test_metrics_recorded_in_order() {
        let mut logger = LogPipelineLogger::new(10);
        for size in [1.0, 2.0, 2.0, 5.0] {
            logger.metric("registry_size", size);
        }
        let values = logger.metrics_for("registry_size").unwrap();
        assert_eq!(values.len(), 4);
        assert_relative_eq!(mean(values), 2.5);
    }

    #[test]
    fn test_summary_reports_last_metric_value() {
        let mut logger = LogPipelineLogger::new(10);
        logger.metric("registry_size", 1.0);
        logger.metric("registry_size", 3.0);
        let summary = logger.summary_string().unwrap();
        assert!(summary.contains("registry_size: avg 2.0, last 3"));
    }

    #[test]
    fn test_summary_includes_stage_and_throughput() {
        let mut logger = LogPipelineLogger::new(10);
        logger.progress(50, 50);
        logger.timing("identify", 0.5);
        let summary = logger.summary_string().unwrap();
        assert!(summary.contains("Re-identification summary (50 frames"));
        assert!(summary.contains("identify"));
        assert!(summary.contains("fps"));
    }

    #[test]
    fn test_empty_summary_is_none() {
        assert!(LogPipelineLogger::new(10).summary_string().is_none());
    }

    #[test]
    fn test_progress_tracks_frames_seen() {
        let mut logger = LogPipelineLogger::new(3);
        for i in 1..=7 {
            logger.progress(i, 0);
        }
        assert_eq!(logger.frames_seen, 7);
    }

    #[test]
    fn test_info_kept_for_inspection() {
        let mut logger = LogPipelineLogger::default();
        logger.info("registry opened");
        assert_eq!(logger.messages, vec!["registry opened".to_string()]);
        assert_eq!(logger.throttle_frames, 100);
    }
}
