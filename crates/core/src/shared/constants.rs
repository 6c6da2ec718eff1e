/// Cosine similarity an entry must strictly exceed to count as the same person.
pub const DEFAULT_MATCH_THRESHOLD: f64 = 0.7;

/// Registry size at which (and at every multiple of which) growth is logged.
///
/// The registry never evicts, so every comparison scans all identities seen
/// so far.
pub const REGISTRY_GROWTH_WARNING: usize = 100;

pub const LABEL_PREFIX: &str = "ID: ";

pub const DETECTIONS_EXTENSIONS: &[&str] = &["jsonl", "ndjson"];

pub const RESULTS_ROOT: &str = "personReID_results";
pub const RESULTS_FILENAME: &str = "identities.jsonl";
