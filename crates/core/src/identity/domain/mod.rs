pub mod embedding;
pub mod identity_registry;
