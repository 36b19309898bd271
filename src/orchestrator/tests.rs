//! Tests for the orchestrator module.
//!
//! Test organization:
//! - `common`: Shared fixtures and a read only mock forge
//! - `pr_workflow`: Release pull request creation, update and closing
//! - `release_workflow`: Release creation from merged pull requests

mod common;
mod pr_workflow;
