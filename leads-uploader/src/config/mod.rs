//! Configuration and dependency wiring for the uploader.

mod dependencies;
mod settings;

pub use dependencies::Dependencies;
pub use settings::UploaderConfig;
