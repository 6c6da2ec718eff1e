use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;

use crossbeam_channel::{Receiver, Sender};

use crate::annotation::domain::annotation_sink::AnnotationSink;
use crate::annotation::domain::identity_annotation::FrameAnnotations;
use crate::detection::domain::detection_source::{DetectionSource, SourceInfo};
use crate::pipeline::frame_identifier::FrameIdentifier;
use crate::pipeline::pipeline_executor::{
    identify_frame, report_progress, PipelineConfig, PipelineExecutor, RunSummary,
};
use crate::shared::person_detection::FrameDetections;

const DEFAULT_CHANNEL_CAPACITY: usize = 16;

type SendError = Box<dyn std::error::Error + Send + Sync>;

/// Overlaps source decoding and sink I/O with identity resolution.
///
/// Layout: `reader → main [identify] → writer`
///
/// The registry is only touched on the calling thread, and both channels are
/// FIFO, so frames and the detections inside them are resolved in exactly
/// the order the source produced them.
pub struct ThreadedPipelineExecutor {
    channel_capacity: usize,
}

impl ThreadedPipelineExecutor {
    pub fn new() -> Self {
        Self {
            channel_capacity: DEFAULT_CHANNEL_CAPACITY,
        }
    }

    pub fn with_channel_capacity(channel_capacity: usize) -> Self {
        Self {
            channel_capacity: channel_capacity.max(1),
        }
    }
}

impl Default for ThreadedPipelineExecutor {
    fn default() -> Self {
        Self::new()
    }
}

impl PipelineExecutor for ThreadedPipelineExecutor {
    fn execute(
        &self,
        source: Box<dyn DetectionSource>,
        mut sink: Box<dyn AnnotationSink>,
        identifier: &mut FrameIdentifier,
        info: &SourceInfo,
        output_path: &Path,
        mut config: PipelineConfig,
    ) -> Result<RunSummary, Box<dyn std::error::Error>> {
        let cap = self.channel_capacity;

        sink.open(output_path)?;

        let (frame_tx, frame_rx) =
            crossbeam_channel::bounded::<Result<FrameDetections, SendError>>(cap);
        let (write_tx, write_rx) = crossbeam_channel::bounded::<FrameAnnotations>(cap);

        let reader_handle = spawn_reader(source, frame_tx, config.cancelled.clone());
        let writer_handle = spawn_writer(sink, write_rx);

        let mut summary = RunSummary::default();
        let main_error = run_main_loop(
            frame_rx,
            &write_tx,
            identifier,
            info.total_frames,
            &mut config,
            &mut summary,
        );

        drop(write_tx);

        let joined = join_threads(reader_handle, writer_handle, main_error);
        config.logger.summary();
        joined.map(|()| summary)
    }
}

fn spawn_reader(
    mut source: Box<dyn DetectionSource>,
    frame_tx: Sender<Result<FrameDetections, SendError>>,
    cancelled: Arc<AtomicBool>,
) -> JoinHandle<Box<dyn DetectionSource>> {
    std::thread::spawn(move || {
        for frame in source.frames() {
            if cancelled.load(Ordering::Relaxed) {
                break;
            }
            let mapped = frame.map_err(|e| -> SendError { e.to_string().into() });
            if frame_tx.send(mapped).is_err() {
                break;
            }
        }
        source
    })
}

fn spawn_writer(
    mut sink: Box<dyn AnnotationSink>,
    write_rx: Receiver<FrameAnnotations>,
) -> JoinHandle<Result<Box<dyn AnnotationSink>, SendError>> {
    std::thread::spawn(move || {
        for annotations in write_rx {
            sink.write(&annotations)
                .map_err(|e| -> SendError { e.to_string().into() })?;
        }
        Ok(sink)
    })
}

fn run_main_loop(
    frame_rx: Receiver<Result<FrameDetections, SendError>>,
    write_tx: &Sender<FrameAnnotations>,
    identifier: &mut FrameIdentifier,
    total_frames: usize,
    config: &mut PipelineConfig,
    summary: &mut RunSummary,
) -> Option<Box<dyn std::error::Error>> {
    for frame in frame_rx {
        if config.cancelled.load(Ordering::Relaxed) {
            config.logger.info("Run cancelled");
            break;
        }

        let frame = match frame {
            Ok(f) => f,
            Err(e) => return Some(e.to_string().into()),
        };

        let annotations = match identify_frame(identifier, frame, config, summary) {
            Ok(a) => a,
            Err(e) => return Some(e),
        };

        // A closed channel means the writer failed; joining it surfaces why.
        if write_tx.send(annotations).is_err() {
            break;
        }

        if let Err(e) = report_progress(config, summary.frames, total_frames) {
            return Some(e);
        }
    }
    None
}

/// Joins both worker threads, keeping the first error seen.
fn join_threads(
    reader_handle: JoinHandle<Box<dyn DetectionSource>>,
    writer_handle: JoinHandle<Result<Box<dyn AnnotationSink>, SendError>>,
    mut first_error: Option<Box<dyn std::error::Error>>,
) -> Result<(), Box<dyn std::error::Error>> {
    fn set_if_none(slot: &mut Option<Box<dyn std::error::Error>>, err: Box<dyn std::error::Error>) {
        if slot.is_none() {
            *slot = Some(err);
        }
    }

    match reader_handle.join() {
        Ok(mut source) => source.close(),
        Err(_) => set_if_none(&mut first_error, "Reader thread panicked".into()),
    }

    match writer_handle.join() {
        Ok(Ok(mut sink)) => {
            if let Err(e) = sink.close() {
                set_if_none(&mut first_error, e);
            }
        }
        Ok(Err(e)) => set_if_none(&mut first_error, e.to_string().into()),
        Err(_) => set_if_none(&mut first_error, "Writer thread panicked".into()),
    }

    match first_error {
        Some(e) => Err(e),
        None => Ok(()),
    }
}
