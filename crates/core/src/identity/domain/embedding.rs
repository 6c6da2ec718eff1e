use ndarray::Array1;
use thiserror::Error;

/// Why an embedding cannot take part in similarity matching.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum InvalidEmbedding {
    #[error("invalid embedding: vector is empty")]
    Empty,
    #[error("invalid embedding: component {position} is not finite")]
    NonFinite { position: usize },
    #[error("invalid embedding: vector has zero length (L2 norm is 0)")]
    ZeroNorm,
    #[error("invalid embedding: expected {expected} components, got {got}")]
    DimensionMismatch { expected: usize, got: usize },
}

/// An appearance feature vector for one detected person.
///
/// Components are widened to `f64` on construction and the L2 norm is
/// computed once, so every similarity against this vector is a single
/// dot product and a division. Immutable once built.
#[derive(Clone, Debug, PartialEq)]
pub struct Embedding {
    values: Array1<f64>,
    norm: f64,
}

impl Embedding {
    pub fn new(values: Vec<f32>) -> Result<Self, InvalidEmbedding> {
        if values.is_empty() {
            return Err(InvalidEmbedding::Empty);
        }
        if let Some(position) = values.iter().position(|v| !v.is_finite()) {
            return Err(InvalidEmbedding::NonFinite { position });
        }

        let values: Array1<f64> = values.into_iter().map(f64::from).collect();
        let norm = values.dot(&values).sqrt();
        if norm == 0.0 {
            return Err(InvalidEmbedding::ZeroNorm);
        }

        Ok(Self { values, norm })
    }

    pub fn dimension(&self) -> usize {
        self.values.len()
    }

    pub fn values(&self) -> &Array1<f64> {
        &self.values
    }

    pub fn norm(&self) -> f64 {
        self.norm
    }

    /// `dot(a, b) / (||a|| * ||b||)`, in `[-1, 1]`.
    ///
    /// Callers must ensure both vectors share a dimension.
    pub fn cosine_similarity(&self, other: &Embedding) -> f64 {
        debug_assert_eq!(self.dimension(), other.dimension());
        self.values.dot(&other.values) / (self.norm * other.norm)
    }
}
