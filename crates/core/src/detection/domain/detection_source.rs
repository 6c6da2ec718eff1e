use std::path::{Path, PathBuf};

use crate::shared::person_detection::FrameDetections;

/// What a source knows about its stream before it is read.
#[derive(Clone, Debug, PartialEq)]
pub struct SourceInfo {
    pub total_frames: usize,
    pub path: Option<PathBuf>,
}

/// Yields per-frame person detections with their appearance embeddings.
///
/// Stands in for the camera + detector + embedder stage: implementations
/// decide where detections come from (live inference, a recorded dump),
/// the pipeline only sees `FrameDetections` in frame order.
pub trait DetectionSource: Send {
    fn open(&mut self, path: &Path) -> Result<SourceInfo, Box<dyn std::error::Error>>;

    fn frames(
        &mut self,
    ) -> Box<dyn Iterator<Item = Result<FrameDetections, Box<dyn std::error::Error>>> + '_>;

    fn close(&mut self);
}
