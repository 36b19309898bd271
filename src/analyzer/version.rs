//! Next version computation for a single package.
//!
//! Precedence, highest first: a `release-as` directive in a commit message,
//! the configured `release_as`, prerelease mode, the standard conventional
//! commit bump. Without a prior version the initial version is used.
use color_eyre::eyre::eyre;
use log::*;
use next_version::VersionUpdater;
use regex::Regex;
use semver::{Prerelease, Version};
use std::sync::LazyLock;

use crate::Result;

/// Default identifier attached in prerelease mode
pub const DEFAULT_PRERELEASE_TYPE: &str = "alpha";

static RELEASE_AS_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?im)^release-as:\s*v?(?<version>\S+)\s*$").unwrap()
});

static NUMBERED_PRERELEASE_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?<prefix>\D*)(?<number>\d+)$").unwrap()
});

/// Version bump rules for a package
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VersionPolicy {
    /// Breaking changes bump minor instead of major before 1.0.0
    pub bump_minor_pre_major: bool,
    /// Features bump patch instead of minor before 1.0.0
    pub bump_patch_for_minor_pre_major: bool,
    pub release_as: Option<Version>,
    pub prerelease: bool,
    pub prerelease_type: Option<String>,
    pub initial_version: Option<Version>,
}

impl VersionPolicy {
    fn prerelease_type(&self) -> &str {
        self.prerelease_type
            .as_deref()
            .unwrap_or(DEFAULT_PRERELEASE_TYPE)
    }
}

/// Outcome of [`resolve_version`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionResolution {
    pub version: Version,
    pub previous: Option<Version>,
    /// The version came from a `release-as` directive or config value
    pub forced: bool,
}

/// First valid `release-as` directive found, scanning messages in order.
/// Invalid versions are skipped with a warning.
pub fn release_as_directive<S: AsRef<str>>(
    messages: &[S],
) -> Option<Version> {
    for message in messages {
        for captures in RELEASE_AS_REGEX.captures_iter(message.as_ref()) {
            let raw = &captures["version"];
            match Version::parse(raw) {
                Ok(version) => return Some(version),
                Err(err) => {
                    warn!("ignoring invalid release-as directive {raw}: {err}")
                }
            }
        }
    }

    None
}

/// Computes the next version for a package given its prior version, the
/// raw commit messages attributed to it and its bump policy.
pub fn resolve_version<S: AsRef<str>>(
    prior: Option<&Version>,
    messages: &[S],
    policy: &VersionPolicy,
) -> Result<VersionResolution> {
    let previous = prior.cloned();

    if let Some(version) = release_as_directive(messages) {
        info!("using release-as directive from commit: {version}");
        return Ok(VersionResolution {
            version,
            previous,
            forced: true,
        });
    }

    if let Some(release_as) = &policy.release_as {
        info!("using configured release-as version: {release_as}");
        return Ok(VersionResolution {
            version: release_as.clone(),
            previous,
            forced: true,
        });
    }

    let version = match prior {
        None => initial_version(policy)?,
        Some(prior) if policy.prerelease => {
            next_prerelease(prior, messages, policy)?
        }
        Some(prior) if !prior.pre.is_empty() => {
            info!("graduating current prerelease, {prior}, to stable version");
            graduate_prerelease(prior)
        }
        Some(prior) => standard_bump(prior, messages, policy),
    };

    Ok(VersionResolution {
        version,
        previous,
        forced: false,
    })
}

fn initial_version(policy: &VersionPolicy) -> Result<Version> {
    let version = match &policy.initial_version {
        Some(version) => version.clone(),
        None if policy.bump_minor_pre_major => Version::new(0, 1, 0),
        None => Version::new(1, 0, 0),
    };

    if policy.prerelease && version.pre.is_empty() {
        return attach_prerelease(version, policy.prerelease_type());
    }

    Ok(version)
}

fn next_prerelease<S: AsRef<str>>(
    prior: &Version,
    messages: &[S],
    policy: &VersionPolicy,
) -> Result<Version> {
    let identifier = policy.prerelease_type();

    if prior.pre.is_empty() {
        debug!("starting new {identifier} prerelease from {prior}");
        let next = standard_bump(prior, messages, policy);
        return attach_prerelease(next, identifier);
    }

    if let Some(captures) =
        NUMBERED_PRERELEASE_REGEX.captures(prior.pre.as_str())
    {
        let prefix = &captures["prefix"];
        let digits = &captures["number"];

        // switching identifiers, e.g. alpha -> beta, restarts the count
        let same_identifier = policy.prerelease_type.is_none()
            || prefix.trim_end_matches(['.', '-']) == identifier;

        if same_identifier {
            let number = digits.parse::<u64>().map_err(|e| {
                eyre!("invalid prerelease number {digits}: {e}")
            })?;
            let width = digits.len();
            let next = format!("{prefix}{:0width$}", number + 1);

            let mut version = prior.clone();
            version.pre = Prerelease::new(&next)?;
            return Ok(version);
        }
    }

    debug!("prerelease {prior} does not match {identifier}: restarting count");
    attach_prerelease(graduate_prerelease(prior), identifier)
}

fn standard_bump<S: AsRef<str>>(
    prior: &Version,
    messages: &[S],
    policy: &VersionPolicy,
) -> Version {
    VersionUpdater::new()
        .with_breaking_always_increment_major(!policy.bump_minor_pre_major)
        .with_features_always_increment_minor(
            !policy.bump_patch_for_minor_pre_major,
        )
        .increment(prior, messages.iter().map(|m| m.as_ref()))
}

/// Appends `<identifier>1` to a stable version
pub fn attach_prerelease(
    mut version: Version,
    identifier: &str,
) -> Result<Version> {
    version.pre = Prerelease::new(&format!("{identifier}1"))?;
    Ok(version)
}

/// Drops the prerelease suffix without bumping
pub fn graduate_prerelease(version: &Version) -> Version {
    let mut graduated = version.clone();
    graduated.pre = Prerelease::EMPTY;
    graduated
}
