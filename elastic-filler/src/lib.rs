//! # Elastic Filler
//!
//! Seeds a local search cluster with real documents taken from a remote one. For every
//! category of a fixed list, the documents matching the category are copied under their
//! remote id, so running the filler again overwrites instead of duplicating.
//!
//! ## Modules
//!
//! - [`config`]: Cluster settings read from the environment
//! - [`copier`]: Cross-cluster copy of phrase-query matches
//! - [`errors`]: Error types for the filler

pub mod config;
pub mod copier;
pub mod errors;

pub use config::FillerConfig;
pub use copier::{CategoryReport, CrossClusterCopier, FillReport};
pub use errors::FillerError;
