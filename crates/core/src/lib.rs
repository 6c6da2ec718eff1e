//! Live person re-identification over per-frame appearance embeddings.
//!
//! The [`identity`] module holds the matching core. Everything else moves
//! detections in and annotations out around it.

pub mod annotation;
pub mod detection;
pub mod identity;
pub mod pipeline;
pub mod shared;
