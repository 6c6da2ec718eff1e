use serde::{Deserialize, Serialize};

use crate::annotation::domain::identity_palette::Rgb;

/// What downstream rendering needs to draw one identified person.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct IdentityAnnotation {
    pub bbox: [f64; 4],
    pub confidence: f64,
    pub identity: usize,
    pub label: String,
    pub color: Rgb,
    /// True when this detection created the identity.
    pub new_identity: bool,
}

/// Annotations for one frame, in the same order as its detections.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct FrameAnnotations {
    pub frame: usize,
    pub annotations: Vec<IdentityAnnotation>,
}

impl FrameAnnotations {
    pub fn new_identities(&self) -> usize {
        self.annotations.iter().filter(|a| a.new_identity).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn annotation(identity: usize, new_identity: bool) -> IdentityAnnotation {
        IdentityAnnotation {
            bbox: [0.0, 0.0, 10.0, 20.0],
            confidence: 0.8,
            identity,
            label: format!("ID: {identity}"),
            color: [1, 2, 3],
            new_identity,
        }
    }

    #[test]
    fn test_new_identities_counts_registrations() {
        let frame = FrameAnnotations {
            frame: 0,
            annotations: vec![annotation(0, true), annotation(1, false), annotation(2, true)],
        };
        assert_eq!(frame.new_identities(), 2);
    }

    #[test]
    fn test_serializes_label_and_color() {
        let json = serde_json::to_string(&annotation(4, false)).unwrap();
        assert!(json.contains(r#""label":"ID: 4""#));
        assert!(json.contains(r#""color":[1,2,3]"#));
    }
}
