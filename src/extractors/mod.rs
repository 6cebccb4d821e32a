// src/extractors/mod.rs
pub mod flatten;
pub mod search;

// Re-export key extraction types for convenience
pub use flatten::{DocumentFlattener, FlattenedArtifact};
pub use search::search;
