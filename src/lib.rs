//! Release pull request and release automation for multi-package
//! repositories driven by conventional commits.
pub mod analyzer;
pub mod cli;
pub mod codec;
pub mod command;
pub mod config;
pub mod error;
pub mod forge;
pub mod manifest;
pub mod orchestrator;
pub mod path_helpers;
pub mod plugin;
pub mod splitter;
pub mod updater;

pub use error::{MonoreleaseError, Result};
pub use orchestrator::Orchestrator;

#[cfg(test)]
pub mod test_helpers;
