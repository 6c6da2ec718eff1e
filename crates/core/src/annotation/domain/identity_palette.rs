use std::collections::HashMap;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::shared::constants::LABEL_PREFIX;

pub type Rgb = [u8; 3];

/// Display color per identity, assigned lazily on first sight.
///
/// Colors are random but stable: once an identity has a color it keeps it
/// for the rest of the run.
pub struct IdentityPalette {
    colors: HashMap<usize, Rgb>,
    rng: StdRng,
}

impl IdentityPalette {
    pub fn new() -> Self {
        Self {
            colors: HashMap::new(),
            rng: StdRng::from_entropy(),
        }
    }

    /// Reproducible palette: the same seed yields the same color sequence.
    pub fn with_seed(seed: u64) -> Self {
        Self {
            colors: HashMap::new(),
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn color_for(&mut self, identity: usize) -> Rgb {
        let rng = &mut self.rng;
        *self
            .colors
            .entry(identity)
            .or_insert_with(|| [rng.gen(), rng.gen(), rng.gen()])
    }

    pub fn get(&self, identity: usize) -> Option<Rgb> {
        self.colors.get(&identity).copied()
    }

    pub fn len(&self) -> usize {
        self.colors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.colors.is_empty()
    }

    pub fn label_for(identity: usize) -> String {
        format!("{LABEL_PREFIX}{identity}")
    }
}

impl Default for IdentityPalette {
    fn default() -> Self {
        Self::new()
    }
}
