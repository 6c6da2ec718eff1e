use serde::{Deserialize, Serialize};

/// One detected person as handed over by the upstream detector/embedder.
///
/// `bbox` is `[x1, y1, x2, y2]` in whatever coordinate space the producer
/// uses; it is carried through to annotations uninterpreted.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PersonDetection {
    pub bbox: [f64; 4],
    #[serde(default)]
    pub confidence: f64,
    pub embedding: Vec<f32>,
}

/// All detections for a single processed frame, in detector order.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FrameDetections {
    pub frame: usize,
    #[serde(default)]
    pub detections: Vec<PersonDetection>,
}
