//! Configuration module for envelope-crypto
//!
//! - Platform path resolution with an environment override
//! - Settings persistence

pub mod paths;
pub mod settings;

pub use paths::EnvelopePaths;
pub use settings::Settings;
