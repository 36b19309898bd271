//! Subcommand implementations.
pub mod release;
pub mod release_pr;

mod common;
