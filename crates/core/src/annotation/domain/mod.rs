pub mod annotation_sink;
pub mod identity_annotation;
pub mod identity_palette;
