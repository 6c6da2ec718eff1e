use crate::identity::domain::embedding::{Embedding, InvalidEmbedding};
use crate::shared::constants::{DEFAULT_MATCH_THRESHOLD, REGISTRY_GROWTH_WARNING};

/// How an embedding was resolved against the registry.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Outcome {
    /// An existing identity exceeded the threshold; its reference was replaced.
    Matched { similarity: f64 },
    /// No identity exceeded the threshold; a new one was appended.
    Registered,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Resolution {
    pub identity: usize,
    pub outcome: Outcome,
}

impl Resolution {
    pub fn is_new(&self) -> bool {
        self.outcome == Outcome::Registered
    }
}

/// Maps appearance embeddings to stable integer identities.
///
/// Holds one reference embedding per identity, indexed by creation order.
/// Indices are never reused or renumbered; the registry only grows.
///
/// Matching is greedy first-match: entries are scanned from index 0 upward
/// and the first whose cosine similarity strictly exceeds the threshold
/// wins, even when a later entry is closer. A match replaces the stored
/// reference with the newest observation.
///
/// There is no eviction. Every unmatched embedding becomes a permanent
/// identity that is compared against for the rest of the run, so the cost
/// of `resolve` grows linearly with the number of people ever seen.
pub struct IdentityRegistry {
    references: Vec<Embedding>,
    threshold: f64,
    dimension: Option<usize>,
}

impl IdentityRegistry {
    pub fn new(threshold: f64) -> Self {
        Self {
            references: Vec::new(),
            threshold,
            dimension: None,
        }
    }

    /// Returns the identity index for `embedding`, registering it if unseen.
    pub fn resolve(&mut self, embedding: Embedding) -> Result<usize, InvalidEmbedding> {
        self.resolve_detailed(embedding).map(|r| r.identity)
    }

    /// Like [`resolve`](Self::resolve), but also reports whether the identity
    /// was matched (and with what similarity) or newly registered.
    ///
    /// The first embedding ever registered fixes the registry's dimension.
    /// An embedding of any other length is rejected without touching state.
    pub fn resolve_detailed(&mut self, embedding: Embedding) -> Result<Resolution, InvalidEmbedding> {
        self.check_dimension(&embedding)?;

        let matched = self
            .references
            .iter()
            .enumerate()
            .map(|(i, reference)| (i, reference.cosine_similarity(&embedding)))
            .find(|&(_, similarity)| similarity > self.threshold);

        let resolution = match matched {
            Some((identity, similarity)) => {
                self.references[identity] = embedding;
                Resolution {
                    identity,
                    outcome: Outcome::Matched { similarity },
                }
            }
            None => {
                let identity = self.references.len();
                if self.dimension.is_none() {
                    self.dimension = Some(embedding.dimension());
                }
                self.references.push(embedding);
                self.warn_on_growth();
                Resolution {
                    identity,
                    outcome: Outcome::Registered,
                }
            }
        };

        Ok(resolution)
    }

    pub fn len(&self) -> usize {
        self.references.len()
    }

    pub fn is_empty(&self) -> bool {
        self.references.is_empty()
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Embedding length every entry must share, once the first is registered.
    pub fn dimension(&self) -> Option<usize> {
        self.dimension
    }

    /// Current reference embedding (the latest match) for `identity`.
    pub fn reference(&self, identity: usize) -> Option<&Embedding> {
        self.references.get(identity)
    }

    fn check_dimension(&self, embedding: &Embedding) -> Result<(), InvalidEmbedding> {
        match self.dimension {
            Some(expected) if expected != embedding.dimension() => {
                Err(InvalidEmbedding::DimensionMismatch {
                    expected,
                    got: embedding.dimension(),
                })
            }
            _ => Ok(()),
        }
    }

    fn warn_on_growth(&self) {
        let len = self.references.len();
        if len % REGISTRY_GROWTH_WARNING == 0 {
            log::warn!(
                "Identity registry holds {len} identities; each lookup now scans all of them"
            );
        }
    }
}

impl Default for IdentityRegistry {
    fn default() -> Self {
        Self::new(DEFAULT_MATCH_THRESHOLD)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rstest::rstest;

    fn emb(values: &[f32]) -> Embedding {
        Embedding::new(values.to_vec()).unwrap()
    }

    fn basis(dim: usize, axis: usize) -> Embedding {
        let mut v = vec![0.0; dim];
        v[axis] = 1.0;
        Embedding::new(v).unwrap()
    }

    #[test]
    fn test_default_threshold() {
        let registry = IdentityRegistry::default();
        assert_relative_eq!(registry.threshold(), 0.7);
        assert!(registry.is_empty());
        assert_eq!(registry.dimension(), None);
    }

    #[test]
    fn test_first_embedding_gets_index_zero() {
        let mut registry = IdentityRegistry::default();
        assert_eq!(registry.resolve(emb(&[0.2, 0.5, 0.1])).unwrap(), 0);
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.dimension(), Some(3));
    }

    #[test]
    fn test_same_embedding_rematches() {
        let mut registry = IdentityRegistry::default();
        registry.resolve(emb(&[1.0, 0.0])).unwrap();
        let e = emb(&[0.0, 1.0]);
        let first = registry.resolve(e.clone()).unwrap();
        let second = registry.resolve(e).unwrap();
        assert_eq!(first, 1);
        assert_eq!(second, 1);
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn test_first_match_wins_over_best_match() {
        let mut registry = IdentityRegistry::default();
        // Entries are 0.6 apart, so both are registered.
        assert_eq!(registry.resolve(emb(&[1.0, 0.0])).unwrap(), 0);
        assert_eq!(registry.resolve(emb(&[0.6, 0.8])).unwrap(), 1);

        // Query: 0.8 to entry 0, 0.96 to entry 1.
        let resolution = registry.resolve_detailed(emb(&[4.0, 3.0])).unwrap();
        assert_eq!(resolution.identity, 0);
        match resolution.outcome {
            Outcome::Matched { similarity } => assert_relative_eq!(similarity, 0.8, epsilon = 1e-12),
            Outcome::Registered => panic!("expected a match"),
        }
        assert_eq!(registry.len(), 2);
    }

    #[rstest]
    #[case(1)]
    #[case(4)]
    #[case(16)]
    fn test_dissimilar_embeddings_each_register(#[case] count: usize) {
        let mut registry = IdentityRegistry::default();
        for axis in 0..count {
            let resolution = registry.resolve_detailed(basis(count, axis)).unwrap();
            assert_eq!(resolution.identity, axis);
            assert!(resolution.is_new());
        }
        assert_eq!(registry.len(), count);
    }

    #[test]
    fn test_similarity_at_threshold_does_not_match() {
        let mut registry = IdentityRegistry::default();
        registry.resolve(emb(&[1.0, 0.0, 0.0, 0.0])).unwrap();
        // Exactly 0.7 to the first entry.
        let id = registry.resolve(emb(&[7.0, 5.0, 5.0, 1.0])).unwrap();
        assert_eq!(id, 1);
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn test_similarity_just_above_threshold_matches() {
        let mut registry = IdentityRegistry::default();
        registry.resolve(emb(&[1.0, 0.0, 0.0, 0.0])).unwrap();
        // ~0.705 to the first entry.
        let resolution = registry.resolve_detailed(emb(&[7.1, 5.0, 5.0, 1.0])).unwrap();
        assert_eq!(resolution.identity, 0);
        assert!(!resolution.is_new());
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_match_overwrites_reference() {
        let mut registry = IdentityRegistry::default();
        let a = emb(&[1.0, 0.0]);
        let b = emb(&[0.8, 0.6]);
        let c = emb(&[0.8, -0.6]);

        assert_eq!(registry.resolve(a).unwrap(), 0);
        assert_eq!(registry.resolve(b.clone()).unwrap(), 0);
        assert_eq!(registry.reference(0), Some(&b));

        // C is 0.8 to A but only 0.28 to B, which now represents identity 0.
        assert_eq!(registry.resolve(c).unwrap(), 1);
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn test_custom_threshold() {
        let mut registry = IdentityRegistry::new(0.9);
        registry.resolve(emb(&[1.0, 0.0])).unwrap();
        // 0.8 is above the default but below 0.9.
        assert_eq!(registry.resolve(emb(&[4.0, 3.0])).unwrap(), 1);
    }

    #[test]
    fn test_dimension_mismatch_rejected_without_mutation() {
        let mut registry = IdentityRegistry::default();
        registry.resolve(emb(&[1.0, 0.0, 0.0])).unwrap();
        let err = registry.resolve(emb(&[1.0, 0.0])).unwrap_err();
        assert_eq!(
            err,
            InvalidEmbedding::DimensionMismatch {
                expected: 3,
                got: 2
            }
        );
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.reference(0), Some(&emb(&[1.0, 0.0, 0.0])));
    }

    #[test]
    fn test_reference_out_of_range() {
        let registry = IdentityRegistry::default();
        assert!(registry.reference(0).is_none());
    }

    #[test]
    fn test_length_never_decreases() {
        let mut registry = IdentityRegistry::default();
        let inputs = [
            emb(&[1.0, 0.0, 0.0]),
            emb(&[0.0, 1.0, 0.0]),
            emb(&[0.9, 0.1, 0.0]),
            emb(&[0.0, 0.0, 1.0]),
            emb(&[0.0, 0.95, 0.05]),
        ];
        let mut previous = 0;
        for e in inputs {
            let id = registry.resolve(e).unwrap();
            assert!(id < registry.len());
            assert!(registry.len() >= previous);
            previous = registry.len();
        }
        assert_eq!(registry.len(), 3);
    }

    #[test]
    fn test_growth_past_warning_size_keeps_indices_dense() {
        let dim = REGISTRY_GROWTH_WARNING + 5;
        let mut registry = IdentityRegistry::default();
        for axis in 0..dim {
            assert_eq!(registry.resolve(basis(dim, axis)).unwrap(), axis);
        }
        assert_eq!(registry.len(), dim);
    }
}
