//! Pre-release versioning

use std::sync::LazyLock;

use liftoff_changelog::ClassifiedCommit;
use liftoff_core::{Result, Version, VersionError};
use regex::Regex;

use crate::default::DefaultVersioning;
use crate::traits::{apply_bump, VersioningStrategy};
use crate::types::VersionBump;

/// Identifier used when none is configured
const DEFAULT_PRERELEASE_TYPE: &str = "beta";

/// Numbered pre-release identifier such as `beta.1`, `rc-2` or `alpha3`
static NUMBERED_PRERELEASE_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?P<identifier>.*?)(?P<separator>[.-]?)(?P<number>\d+)$").expect("Invalid regex")
});

/// Moves through numbered pre-releases: `1.0.0-beta.1` becomes
/// `1.0.0-beta.2` for changes that fit inside the upcoming release, and
/// starts a new pre-release series when the change needs a larger bump.
#[derive(Debug, Clone, Default)]
pub struct PrereleaseVersioning {
    base: DefaultVersioning,
    prerelease_type: Option<String>,
}

impl PrereleaseVersioning {
    /// Create a prerelease strategy on top of the default classification
    pub fn new(base: DefaultVersioning) -> Self {
        Self {
            base,
            prerelease_type: None,
        }
    }

    /// Identifier for new pre-release series
    pub fn with_prerelease_type(mut self, prerelease_type: impl Into<String>) -> Self {
        self.prerelease_type = Some(prerelease_type.into());
        self
    }

    fn prerelease_type(&self) -> &str {
        self.prerelease_type
            .as_deref()
            .unwrap_or(DEFAULT_PRERELEASE_TYPE)
    }

    /// Next pre-release marker within the current series
    fn increment(current: &Version, pre: &str) -> Result<String> {
        let caps = NUMBERED_PRERELEASE_REGEX.captures(pre).ok_or_else(|| {
            VersionError::Parse(
                current.to_string(),
                format!("pre-release '{}' has no numeric counter", pre),
            )
        })?;
        let number: u64 = caps["number"]
            .parse()
            .map_err(|e: std::num::ParseIntError| {
                VersionError::Parse(current.to_string(), e.to_string())
            })?;
        Ok(format!(
            "{}{}{}",
            &caps["identifier"],
            &caps["separator"],
            number + 1
        ))
    }

    /// First marker of a new series, reusing the current identifier if any
    fn first_of_series(&self, pre: Option<&str>) -> String {
        let identifier = pre
            .and_then(|p| NUMBERED_PRERELEASE_REGEX.captures(p))
            .map(|caps| format!("{}{}", &caps["identifier"], &caps["separator"]))
            .filter(|prefix| !prefix.is_empty())
            .unwrap_or_else(|| format!("{}.", self.prerelease_type()));
        format!("{}1", identifier)
    }
}

impl VersioningStrategy for PrereleaseVersioning {
    fn name(&self) -> &'static str {
        "prerelease"
    }

    fn determine_release_type(
        &self,
        current: &Version,
        commits: &[ClassifiedCommit],
    ) -> Result<VersionBump> {
        let bump = self
            .base
            .demote(current, DefaultVersioning::classify(commits));

        let Some(pre) = current.pre_release.as_deref() else {
            let next = apply_bump(current, &bump).with_pre_release(self.first_of_series(None));
            return Ok(VersionBump::Custom(next));
        };

        // the upcoming release already covers this bump, stay in the series
        let in_series = match bump {
            VersionBump::Major => current.minor == 0 && current.patch == 0,
            VersionBump::Minor => current.patch == 0,
            _ => true,
        };

        let next = if in_series {
            current
                .clone()
                .with_pre_release(Self::increment(current, pre)?)
        } else {
            apply_bump(current, &bump).with_pre_release(self.first_of_series(Some(pre)))
        };
        Ok(VersionBump::Custom(next))
    }
}
