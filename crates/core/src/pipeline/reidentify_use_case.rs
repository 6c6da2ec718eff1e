use std::path::Path;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use crate::annotation::domain::annotation_sink::AnnotationSink;
use crate::detection::domain::detection_source::DetectionSource;
use crate::pipeline::frame_identifier::FrameIdentifier;
use crate::pipeline::pipeline_logger::{NullPipelineLogger, PipelineLogger};

use super::pipeline_executor::{PipelineConfig, PipelineExecutor, ProgressFn, RunSummary};

/// Re-identifies every person in a detection stream and writes the
/// resulting identity annotations.
///
/// Single-use: `execute` consumes the source and sink. The identifier (and
/// with it the registry) is kept, so callers can inspect it afterwards.
pub struct ReidentifyUseCase {
    source: Option<Box<dyn DetectionSource>>,
    sink: Option<Box<dyn AnnotationSink>>,
    identifier: FrameIdentifier,
    executor: Box<dyn PipelineExecutor>,
    logger: Option<Box<dyn PipelineLogger>>,
    on_progress: Option<ProgressFn>,
    cancelled: Arc<AtomicBool>,
}

impl ReidentifyUseCase {
    pub fn new(
        source: Box<dyn DetectionSource>,
        sink: Box<dyn AnnotationSink>,
        identifier: FrameIdentifier,
        executor: Box<dyn PipelineExecutor>,
        logger: Option<Box<dyn PipelineLogger>>,
        on_progress: Option<ProgressFn>,
        cancelled: Option<Arc<AtomicBool>>,
    ) -> Self {
        Self {
            source: Some(source),
            sink: Some(sink),
            identifier,
            executor,
            logger,
            on_progress,
            cancelled: cancelled.unwrap_or_else(|| Arc::new(AtomicBool::new(false))),
        }
    }

    pub fn execute(
        &mut self,
        input_path: &Path,
        output_path: &Path,
    ) -> Result<RunSummary, Box<dyn std::error::Error>> {
        let mut source = self.source.take().ok_or("Pipeline already executed")?;
        let sink = self.sink.take().ok_or("Pipeline already executed")?;

        let info = source.open(input_path)?;
        log::info!(
            "Reading {} frames of detections from {}",
            info.total_frames,
            input_path.display()
        );

        let config = PipelineConfig {
            on_progress: self.on_progress.take(),
            cancelled: self.cancelled.clone(),
            logger: self
                .logger
                .take()
                .unwrap_or_else(|| Box::new(NullPipelineLogger)),
        };

        let summary = self.executor.execute(
            source,
            sink,
            &mut self.identifier,
            &info,
            output_path,
            config,
        )?;

        log::info!(
            "Resolved {} detections across {} frames to {} identities",
            summary.detections,
            summary.frames,
            summary.identities
        );
        Ok(summary)
    }

    pub fn identifier(&self) -> &FrameIdentifier {
        &self.identifier
    }

    pub fn cancel_flag(&self) -> Arc<AtomicBool> {
        self.cancelled.clone()
    }
}
