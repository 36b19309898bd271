//! Interface for Git forge platforms (currently GitHub).
//!
//! Provides token-based authentication, release management, pull request
//! operations and repository information through a common trait.

/// Configuration and authentication for forge platforms.
pub mod config;

/// GitHub API client implementation for GitHub.com and Enterprise.
pub mod github;

/// Dry-run aware wrapper used by the orchestrator.
pub mod manager;

/// Request and response types shared by every forge.
pub mod request;

/// Common traits for forge platform abstraction.
pub mod traits;
