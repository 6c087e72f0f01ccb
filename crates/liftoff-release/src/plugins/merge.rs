//! Collapse candidates into one pull request per merge group

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use liftoff_core::{Result, VersionsMap, ROOT_PROJECT_PATH};
use liftoff_git::BranchName;
use liftoff_updaters::{CompositeUpdater, Updater};
use tracing::{debug, info, instrument};

use super::{Plugin, PluginContext};
use crate::body::PullRequestBody;
use crate::candidate::{CandidateReleasePullRequest, ReleasePullRequest, Update};
use crate::title::PullRequestTitle;

/// Merges candidates sharing a merge group into a single candidate.
///
/// Candidates without a configured group form one group. A group with a
/// single candidate is passed through unchanged.
#[derive(Debug, Clone, Default)]
pub struct Merge {
    title_pattern: Option<String>,
}

impl Merge {
    /// Merge with the manifest's group title pattern
    pub fn new() -> Self {
        Self::default()
    }

    /// Merge with an explicit title pattern
    pub fn with_title_pattern(pattern: impl Into<String>) -> Self {
        Self {
            title_pattern: Some(pattern.into()),
        }
    }

    fn merge_group(
        &self,
        group: Option<String>,
        candidates: Vec<CandidateReleasePullRequest>,
        ctx: &PluginContext<'_>,
    ) -> CandidateReleasePullRequest {
        let target_branch = &ctx.manifest.target_branch;
        let pattern = self
            .title_pattern
            .as_deref()
            .unwrap_or_else(|| ctx.manifest.config.group_pull_request_title_pattern());

        let mut releases = Vec::new();
        let mut labels: Vec<String> = Vec::new();
        let mut released_versions = VersionsMap::new();
        let mut draft = true;
        // (path, first update of the path, updater stages)
        let mut by_path: Vec<(String, Update, Vec<Arc<dyn Updater>>)> = Vec::new();

        for candidate in candidates {
            let pull_request = candidate.pull_request;
            releases.extend(pull_request.body.releases);
            for label in pull_request.labels {
                if !labels.contains(&label) {
                    labels.push(label);
                }
            }
            released_versions.extend(candidate.released_versions);
            draft &= pull_request.draft;

            for update in pull_request.updates {
                match by_path.iter_mut().find(|(path, _, _)| *path == update.path) {
                    Some((_, merged, stages)) => {
                        merged.create_if_missing |= update.create_if_missing;
                        if merged.cached_file_contents.is_none() {
                            merged.cached_file_contents = update.cached_file_contents;
                        }
                        stages.push(update.updater);
                    }
                    None => {
                        let stages = vec![update.updater.clone()];
                        by_path.push((update.path.clone(), update, stages));
                    }
                }
            }
        }

        let updates = by_path
            .into_iter()
            .map(|(_, update, stages)| {
                if stages.len() == 1 {
                    update
                } else {
                    update.with_updater(Arc::new(CompositeUpdater::new(stages)))
                }
            })
            .collect();

        let head_ref_name = match &group {
            Some(group) => BranchName::of_group_target_branch(group.clone(), target_branch.clone()),
            None => BranchName::of_target_branch(target_branch.clone()),
        };
        let mut config = ctx.manifest.config.defaults.clone();
        config.group = group.clone();

        debug!(
            group = group.as_deref().unwrap_or_default(),
            releases = releases.len(),
            "merged release candidates"
        );

        CandidateReleasePullRequest {
            path: ROOT_PROJECT_PATH.to_string(),
            pull_request: ReleasePullRequest {
                title: PullRequestTitle::of_target_branch(target_branch, Some(pattern)),
                body: PullRequestBody::new(releases, true),
                updates,
                labels,
                head_ref_name,
                version: None,
                draft,
                group,
            },
            config,
            released_versions,
        }
    }
}

#[async_trait]
impl Plugin for Merge {
    fn name(&self) -> &'static str {
        "merge"
    }

    #[instrument(skip_all, fields(candidates = candidates.len()))]
    async fn run(
        &self,
        candidates: Vec<CandidateReleasePullRequest>,
        ctx: &PluginContext<'_>,
    ) -> Result<Vec<CandidateReleasePullRequest>> {
        if candidates.len() <= 1 {
            return Ok(candidates);
        }

        let mut order: Vec<Option<String>> = Vec::new();
        let mut groups: BTreeMap<Option<String>, Vec<CandidateReleasePullRequest>> =
            BTreeMap::new();
        for candidate in candidates {
            let group = candidate.config.group.clone();
            if !order.contains(&group) {
                order.push(group.clone());
            }
            groups.entry(group).or_default().push(candidate);
        }

        let mut merged = Vec::with_capacity(order.len());
        for group in order {
            let members = groups.remove(&group).unwrap_or_default();
            if members.len() == 1 {
                merged.extend(members);
            } else {
                merged.push(self.merge_group(group, members, ctx));
            }
        }

        info!(pull_requests = merged.len(), "merged release candidates");
        Ok(merged)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::manifest::test_support::context;
    use crate::body::ReleaseData;
    use liftoff_core::config::ReleaserConfig;
    use liftoff_core::Version;
    use liftoff_git::FileContents;
    use liftoff_updaters::{ChangelogUpdater, VersionTxt};

    fn candidate(path: &str, component: &str, version: Version, group: Option<&str>) -> CandidateReleasePullRequest {
        let notes = format!("## {}", version);
        let pull_request = ReleasePullRequest {
            title: PullRequestTitle::of_component_target_branch_version(
                Some(component),
                "main",
                version.clone(),
                None,
            ),
            body: PullRequestBody::new(
                vec![ReleaseData {
                    component: Some(component.to_string()),
                    version: Some(version.clone()),
                    notes: notes.clone(),
                }],
                true,
            ),
            updates: vec![
                Update::create_if_missing(
                    "CHANGELOG.md",
                    Arc::new(ChangelogUpdater::new(version.clone(), notes)),
                ),
                Update::new(format!("{}/version.txt", path), Arc::new(VersionTxt::new(version.clone()))),
            ],
            labels: vec!["autorelease: pending".to_string(), component.to_string()],
            head_ref_name: BranchName::of_component_target_branch(component, "main"),
            version: Some(version),
            draft: false,
            group: group.map(str::to_string),
        };
        let config = ReleaserConfig {
            group: group.map(str::to_string),
            ..Default::default()
        };
        CandidateReleasePullRequest::new(path, pull_request, config)
    }

    #[tokio::test]
    async fn test_single_candidate_passes_through() {
        let ctx = context();
        let plugin_ctx = ctx.plugin_context();
        let single = vec![candidate("a", "a", Version::new(1, 0, 0), None)];
        let result = Merge::new().run(single, &plugin_ctx).await.unwrap();
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].path, "a");
        assert_eq!(result[0].pull_request.title.to_string(), "chore(main): release a 1.0.0");
    }

    #[tokio::test]
    async fn test_merges_into_one_pull_request() {
        let ctx = context();
        let plugin_ctx = ctx.plugin_context();
        let mut first = candidate("a", "a", Version::new(1, 1, 0), None);
        first.pull_request.updates[0].cached_file_contents =
            Some(FileContents::from_content("# Changelog\n"));
        let second = candidate("b", "b", Version::new(2, 0, 1), None);

        let result = Merge::new().run(vec![first, second], &plugin_ctx).await.unwrap();
        assert_eq!(result.len(), 1);
        let merged = &result[0];
        assert_eq!(merged.path, ".");
        assert_eq!(merged.pull_request.version, None);
        assert_eq!(merged.pull_request.title.to_string(), "chore: release main");
        assert_eq!(merged.pull_request.head_ref_name.to_string(), "liftoff--branches--main");
        assert_eq!(merged.pull_request.labels, vec!["autorelease: pending", "a", "b"]);
        assert_eq!(merged.released_versions.len(), 2);

        let paths: Vec<&str> = merged.pull_request.updates.iter().map(|u| u.path.as_str()).collect();
        assert_eq!(paths, vec!["CHANGELOG.md", "a/version.txt", "b/version.txt"]);
        let changelog = &merged.pull_request.updates[0];
        assert_eq!(changelog.updater.name(), "composite");
        assert!(changelog.create_if_missing);
        assert!(changelog.cached_file_contents.is_some());

        let body = merged.pull_request.body.to_string();
        assert!(body.contains("<details><summary>a: 1.1.0</summary>"));
        assert!(body.contains("<details><summary>b: 2.0.1</summary>"));
    }

    #[tokio::test]
    async fn test_groups_are_merged_separately() {
        let ctx = context();
        let plugin_ctx = ctx.plugin_context();
        let candidates = vec![
            candidate("a", "a", Version::new(1, 0, 0), Some("web")),
            candidate("b", "b", Version::new(1, 0, 0), None),
            candidate("c", "c", Version::new(1, 0, 0), Some("web")),
        ];
        let result = Merge::new().run(candidates, &plugin_ctx).await.unwrap();
        assert_eq!(result.len(), 2);
        assert_eq!(
            result[0].pull_request.head_ref_name.to_string(),
            "liftoff--branches--main--groups--web"
        );
        assert_eq!(result[0].pull_request.body.releases.len(), 2);
        // the ungrouped candidate is alone in its group
        assert_eq!(result[1].path, "b");
    }
}
