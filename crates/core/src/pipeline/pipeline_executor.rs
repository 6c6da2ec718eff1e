use std::path::Path;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use std::time::Instant;

use crate::annotation::domain::annotation_sink::AnnotationSink;
use crate::annotation::domain::identity_annotation::FrameAnnotations;
use crate::detection::domain::detection_source::{DetectionSource, SourceInfo};
use crate::pipeline::frame_identifier::FrameIdentifier;
use crate::pipeline::pipeline_logger::PipelineLogger;
use crate::shared::person_detection::FrameDetections;

pub type ProgressFn = Box<dyn Fn(usize, usize) -> bool + Send>;

/// Per-run settings shared by all executors.
pub struct PipelineConfig {
    /// `(frames_done, total_frames)`; returning `false` cancels the run.
    pub on_progress: Option<ProgressFn>,
    pub cancelled: Arc<AtomicBool>,
    pub logger: Box<dyn PipelineLogger>,
}

/// Totals for a finished (or cancelled) run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub frames: usize,
    pub detections: usize,
    pub identities: usize,
}

/// Runs `source → identify → sink` for one stream.
///
/// Implementations may read and write on other threads, but every call into
/// the `FrameIdentifier` happens on one thread in frame order.
pub trait PipelineExecutor: Send {
    fn execute(
        &self,
        source: Box<dyn DetectionSource>,
        sink: Box<dyn AnnotationSink>,
        identifier: &mut FrameIdentifier,
        info: &SourceInfo,
        output_path: &Path,
        config: PipelineConfig,
    ) -> Result<RunSummary, Box<dyn std::error::Error>>;
}

/// Resolves one frame and records its timing and metrics.
pub(crate) fn identify_frame(
    identifier: &mut FrameIdentifier,
    frame: FrameDetections,
    config: &mut PipelineConfig,
    summary: &mut RunSummary,
) -> Result<FrameAnnotations, Box<dyn std::error::Error>> {
    let started = Instant::now();
    let annotations = identifier.identify(frame)?;
    let elapsed_ms = started.elapsed().as_secs_f64() * 1000.0;

    for a in annotations.annotations.iter().filter(|a| a.new_identity) {
        log::debug!("Frame {}: new identity {}", annotations.frame, a.identity);
    }

    summary.frames += 1;
    summary.detections += annotations.annotations.len();
    summary.identities = identifier.registry().len();

    config.logger.timing("identify", elapsed_ms);
    config
        .logger
        .metric("detections", annotations.annotations.len() as f64);
    config
        .logger
        .metric("registry_size", summary.identities as f64);

    Ok(annotations)
}

/// Reports progress once a frame has been handed to the sink.
pub(crate) fn report_progress(
    config: &mut PipelineConfig,
    frames_done: usize,
    total_frames: usize,
) -> Result<(), Box<dyn std::error::Error>> {
    config.logger.progress(frames_done, total_frames);
    if let Some(ref callback) = config.on_progress {
        if !callback(frames_done, total_frames) {
            return Err("Cancelled".into());
        }
    }
    Ok(())
}
