use thiserror::Error;

use crate::annotation::domain::identity_annotation::{FrameAnnotations, IdentityAnnotation};
use crate::annotation::domain::identity_palette::IdentityPalette;
use crate::identity::domain::embedding::{Embedding, InvalidEmbedding};
use crate::identity::domain::identity_registry::IdentityRegistry;
use crate::shared::person_detection::FrameDetections;

#[derive(Error, Debug)]
#[error("frame {frame}, detection {detection}: {source}")]
pub struct IdentifyError {
    pub frame: usize,
    pub detection: usize,
    #[source]
    pub source: InvalidEmbedding,
}

/// The per-frame step: resolves every detection of a frame to an identity
/// and attaches its display color and label.
///
/// Owns the registry and palette for the whole run. Detections are resolved
/// in the order given, so a person registered earlier in a frame is already
/// a candidate for the detections after it.
pub struct FrameIdentifier {
    registry: IdentityRegistry,
    palette: IdentityPalette,
}

impl FrameIdentifier {
    pub fn new(registry: IdentityRegistry, palette: IdentityPalette) -> Self {
        Self { registry, palette }
    }

    /// Fails on the first invalid embedding. Detections before it in the
    /// same frame have already been resolved and stay registered.
    pub fn identify(&mut self, frame: FrameDetections) -> Result<FrameAnnotations, IdentifyError> {
        let mut annotations = Vec::with_capacity(frame.detections.len());

        for (i, detection) in frame.detections.into_iter().enumerate() {
            let resolution = Embedding::new(detection.embedding)
                .and_then(|e| self.registry.resolve_detailed(e))
                .map_err(|source| IdentifyError {
                    frame: frame.frame,
                    detection: i,
                    source,
                })?;

            let identity = resolution.identity;
            annotations.push(IdentityAnnotation {
                bbox: detection.bbox,
                confidence: detection.confidence,
                identity,
                label: IdentityPalette::label_for(identity),
                color: self.palette.color_for(identity),
                new_identity: resolution.is_new(),
            });
        }

        Ok(FrameAnnotations {
            frame: frame.frame,
            annotations,
        })
    }

    pub fn registry(&self) -> &IdentityRegistry {
        &self.registry
    }

    pub fn palette(&self) -> &IdentityPalette {
        &self.palette
    }

    pub fn into_parts(self) -> (IdentityRegistry, IdentityPalette) {
        (self.registry, self.palette)
    }
}

impl Default for FrameIdentifier {
    fn default() -> Self {
        Self::new(IdentityRegistry::default(), IdentityPalette::new())
    }
}
