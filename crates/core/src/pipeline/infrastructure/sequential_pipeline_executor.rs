use std::path::Path;
use std::sync::atomic::Ordering;

use crate::annotation::domain::annotation_sink::AnnotationSink;
use crate::detection::domain::detection_source::{DetectionSource, SourceInfo};
use crate::pipeline::frame_identifier::FrameIdentifier;
use crate::pipeline::pipeline_executor::{
    identify_frame, report_progress, PipelineConfig, PipelineExecutor, RunSummary,
};

/// Reads, identifies and writes each frame on the calling thread.
///
/// Mirrors the single per-frame callback of a camera SDK: one frame is
/// fully handled before the next one is pulled from the source.
pub struct SequentialPipelineExecutor;

impl SequentialPipelineExecutor {
    pub fn new() -> Self {
        Self
    }
}

impl Default for SequentialPipelineExecutor {
    fn default() -> Self {
        Self::new()
    }
}

impl PipelineExecutor for SequentialPipelineExecutor {
    fn execute(
        &self,
        mut source: Box<dyn DetectionSource>,
        mut sink: Box<dyn AnnotationSink>,
        identifier: &mut FrameIdentifier,
        info: &SourceInfo,
        output_path: &Path,
        mut config: PipelineConfig,
    ) -> Result<RunSummary, Box<dyn std::error::Error>> {
        sink.open(output_path)?;

        let mut summary = RunSummary::default();
        let result = run_loop(
            &mut *source,
            &mut *sink,
            identifier,
            info,
            &mut config,
            &mut summary,
        );

        source.close();
        let closed = sink.close();
        config.logger.summary();

        result?;
        closed?;
        Ok(summary)
    }
}

fn run_loop(
    source: &mut dyn DetectionSource,
    sink: &mut dyn AnnotationSink,
    identifier: &mut FrameIdentifier,
    info: &SourceInfo,
    config: &mut PipelineConfig,
    summary: &mut RunSummary,
) -> Result<(), Box<dyn std::error::Error>> {
    for frame in source.frames() {
        if config.cancelled.load(Ordering::Relaxed) {
            config.logger.info("Run cancelled");
            break;
        }
        let annotations = identify_frame(identifier, frame?, config, summary)?;
        sink.write(&annotations)?;
        report_progress(config, summary.frames, info.total_frames)?;
    }
    Ok(())
}
