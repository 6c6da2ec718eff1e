use std::path::Path;

use crate::annotation::domain::identity_annotation::FrameAnnotations;

/// Consumes per-frame identity annotations (renderer, recorder, file).
pub trait AnnotationSink: Send {
    fn open(&mut self, path: &Path) -> Result<(), Box<dyn std::error::Error>>;

    fn write(&mut self, frame: &FrameAnnotations) -> Result<(), Box<dyn std::error::Error>>;

    /// Flushes anything buffered.
    fn close(&mut self) -> Result<(), Box<dyn std::error::Error>>;
}
