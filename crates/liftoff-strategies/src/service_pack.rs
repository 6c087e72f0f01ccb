//! Service pack versioning

use std::sync::LazyLock;

use liftoff_changelog::ClassifiedCommit;
use liftoff_core::{Result, Version, VersionError};
use regex::Regex;

use crate::traits::VersioningStrategy;
use crate::types::VersionBump;

static SERVICE_PACK_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^sp\.(?P<number>\d+)$").expect("Invalid regex"));

/// Releases service packs of the current version: `1.2.3` becomes
/// `1.2.3-sp.1`, then `1.2.3-sp.2`.
#[derive(Debug, Clone, Copy, Default)]
pub struct ServicePack;

impl VersioningStrategy for ServicePack {
    fn name(&self) -> &'static str {
        "service-pack"
    }

    fn determine_release_type(
        &self,
        current: &Version,
        _commits: &[ClassifiedCommit],
    ) -> Result<VersionBump> {
        let number = match current.pre_release.as_deref() {
            None => 1,
            Some(pre) => {
                let caps = SERVICE_PACK_REGEX.captures(pre).ok_or_else(|| {
                    VersionError::Parse(
                        current.to_string(),
                        format!("'{}' is not a service pack marker", pre),
                    )
                })?;
                caps["number"]
                    .parse::<u64>()
                    .map_err(|e| VersionError::Parse(current.to_string(), e.to_string()))?
                    + 1
            }
        };

        let next = current.clone().with_pre_release(format!("sp.{}", number));
        Ok(VersionBump::Custom(next))
    }
}
