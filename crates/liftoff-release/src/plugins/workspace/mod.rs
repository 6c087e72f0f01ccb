//! Workspace dependency propagation
//!
//! When a workspace package is released, every package depending on it
//! gets its manifest rewritten to the new version and a patch release of
//! its own, transitively. Ecosystems plug in through
//! [`WorkspaceEcosystem`]; the propagation itself is shared.

mod cargo;
mod graph;
mod node;

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use async_trait::async_trait;
use liftoff_core::config::WorkspacePluginOptions;
use liftoff_core::{ReleaseType, Result, Version, VersionsMap, ROOT_PROJECT_PATH};
use liftoff_git::FileContents;
use liftoff_strategies::{apply_bump, VersionBump};
use liftoff_updaters::{
    bump_requirement, merge_dependency_notes, CompositeUpdater, DependencyNotesUpdater, Updater,
};
use tracing::{debug, info, instrument, warn};

use super::{Merge, Plugin, PluginContext};
use crate::candidate::{CandidateReleasePullRequest, Update};
use crate::strategy::add_path;

pub use cargo::CargoWorkspace;
pub use graph::{DependencyGraph, PackageNode};
pub use node::NodeWorkspace;

/// First line of the dependency notes
const DEPENDENCY_NOTES_HEADER: &str = "* The following workspace dependencies were updated";

/// A dependency declared by a workspace package
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkspaceDependency {
    /// Manifest section declaring the dependency
    pub section: String,
    /// Package name of the dependency
    pub name: String,
    /// Declared version requirement, if any
    pub requirement: Option<String>,
}

/// A package of the workspace as read from its manifest
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkspacePackage {
    /// Package name
    pub name: String,
    /// Tracked path
    pub path: String,
    /// Version declared in the manifest
    pub version: Option<Version>,
    /// Declared dependencies, workspace and external alike
    pub dependencies: Vec<WorkspaceDependency>,
}

/// Ecosystem specifics of a workspace plugin
pub trait WorkspaceEcosystem: Send + Sync {
    /// Name of the plugin in configuration
    fn plugin_name(&self) -> &'static str;

    /// Release type of the packages this ecosystem handles
    fn release_type(&self) -> ReleaseType;

    /// Manifest file of a package, relative to its path
    fn manifest_file(&self) -> &'static str;

    /// Read a package from its manifest
    fn parse_package(&self, path: &str, content: &str) -> Result<WorkspacePackage>;

    /// Updater setting a package version and its workspace dependencies
    fn manifest_updater(&self, version: &Version, dependency_updates: VersionsMap)
        -> Arc<dyn Updater>;

    /// Updates of workspace-wide files at the repository root
    fn root_updates(&self, versions: &VersionsMap) -> Vec<Update>;
}

/// Propagates releases to dependent workspace packages
#[derive(Debug, Clone)]
pub struct WorkspacePlugin<E> {
    ecosystem: E,
    options: WorkspacePluginOptions,
}

impl<E: WorkspaceEcosystem> WorkspacePlugin<E> {
    /// Create the plugin
    pub fn new(ecosystem: E, options: WorkspacePluginOptions) -> Self {
        Self { ecosystem, options }
    }

    /// Load the manifests of every workspace package.
    ///
    /// Content cached on candidate updates is used before asking the
    /// hosting backend. Missing or unreadable manifests are skipped.
    async fn load_packages(
        &self,
        paths: &[&str],
        candidates: &[CandidateReleasePullRequest],
        ctx: &PluginContext<'_>,
    ) -> Result<(Vec<WorkspacePackage>, BTreeMap<String, FileContents>)> {
        let mut packages = Vec::new();
        let mut contents_by_file = BTreeMap::new();

        for path in paths {
            let file = add_path(path, self.ecosystem.manifest_file());
            let cached = candidates
                .iter()
                .flat_map(|c| c.pull_request.updates.iter())
                .find(|u| u.path == file)
                .and_then(|u| u.cached_file_contents.clone());
            let contents = match cached {
                Some(contents) => contents,
                None => match ctx
                    .hosting
                    .file_contents_on_branch(&file, &ctx.manifest.target_branch)
                    .await
                {
                    Ok(contents) => contents,
                    Err(e) if e.is_file_not_found() => {
                        warn!(path = %file, "workspace package manifest not found");
                        continue;
                    }
                    Err(e) => return Err(e),
                },
            };

            match self.ecosystem.parse_package(path, &contents.content) {
                Ok(package) => {
                    debug!(package = %package.name, path = %path, "loaded workspace package");
                    packages.push(package);
                    contents_by_file.insert(file, contents);
                }
                Err(e) => warn!(path = %file, error = %e, "skipping unreadable package manifest"),
            }
        }

        Ok((packages, contents_by_file))
    }

    /// A patch release for a package without commits of its own
    fn synthesize(
        &self,
        package: &WorkspacePackage,
        version: &Version,
        previous: Option<&Version>,
        ctx: &PluginContext<'_>,
    ) -> Option<CandidateReleasePullRequest> {
        let Some(strategy) = ctx.manifest.strategies.get(&package.path) else {
            warn!(package = %package.name, "no strategy for workspace package");
            return None;
        };
        let previous_tag = previous.map(|v| strategy.base().tag_for(v.clone()));
        let notes = strategy.render_notes(&[], version, previous_tag.as_ref());
        let versions_map = match strategy.versions_map(version, &[]) {
            Ok(versions_map) => versions_map,
            Err(e) => {
                warn!(package = %package.name, error = %e, "could not resolve versions");
                return None;
            }
        };
        let pull_request = strategy.compose_pull_request(version.clone(), versions_map, notes);
        Some(CandidateReleasePullRequest::new(
            package.path.clone(),
            pull_request,
            strategy.base().config.clone(),
        ))
    }

    /// Rebuild a candidate's updates with the new dependency versions
    fn update_candidate(
        &self,
        mut candidate: CandidateReleasePullRequest,
        package: &WorkspacePackage,
        version: &Version,
        dependency_updates: VersionsMap,
        notes: Option<&str>,
        contents: &BTreeMap<String, FileContents>,
    ) -> CandidateReleasePullRequest {
        let manifest_path = add_path(&package.path, self.ecosystem.manifest_file());
        let changelog_path = add_path(&package.path, candidate.config.changelog_path());

        let mut has_manifest = false;
        let mut updates: Vec<Update> = candidate
            .pull_request
            .updates
            .iter()
            .map(|update| {
                if update.path == manifest_path {
                    has_manifest = true;
                    let mut rebuilt = update.with_updater(
                        self.ecosystem
                            .manifest_updater(version, dependency_updates.clone()),
                    );
                    if rebuilt.cached_file_contents.is_none() {
                        rebuilt.cached_file_contents = contents.get(&manifest_path).cloned();
                    }
                    rebuilt
                } else if let Some(notes) = notes.filter(|_| update.path == changelog_path) {
                    update.with_updater(Arc::new(CompositeUpdater::new(vec![
                        update.updater.clone(),
                        Arc::new(DependencyNotesUpdater::new(version.clone(), notes)),
                    ])))
                } else {
                    update.clone()
                }
            })
            .collect();
        if !has_manifest {
            let mut update = Update::new(
                manifest_path.clone(),
                self.ecosystem.manifest_updater(version, dependency_updates),
            );
            update.cached_file_contents = contents.get(&manifest_path).cloned();
            updates.push(update);
        }
        candidate.pull_request.updates = updates;

        if let Some(notes) = notes {
            for release in &mut candidate.pull_request.body.releases {
                release.notes = merge_dependency_notes(&release.notes, notes);
            }
        }
        candidate
    }
}

/// Render the `### Dependencies` bullets of a package.
///
/// Returns `None` when no declared requirement changes.
fn dependency_notes(package: &WorkspacePackage, new_versions: &VersionsMap) -> Option<String> {
    let mut sections: Vec<(&str, Vec<String>)> = Vec::new();
    for dependency in &package.dependencies {
        let (Some(new_version), Some(requirement)) =
            (new_versions.get(&dependency.name), &dependency.requirement)
        else {
            continue;
        };
        let bumped = bump_requirement(requirement, new_version);
        if bumped == *requirement {
            continue;
        }
        let line = format!(
            "    * {} bumped from {} to {}",
            dependency.name, requirement, bumped
        );
        match sections.iter_mut().find(|(s, _)| *s == dependency.section) {
            Some((_, lines)) => lines.push(line),
            None => sections.push((dependency.section.as_str(), vec![line])),
        }
    }
    if sections.is_empty() {
        return None;
    }

    let mut notes = String::from(DEPENDENCY_NOTES_HEADER);
    for (section, lines) in sections {
        notes.push_str(&format!("\n  * {}\n{}", section, lines.join("\n")));
    }
    Some(notes)
}

#[async_trait]
impl<E: WorkspaceEcosystem> Plugin for WorkspacePlugin<E> {
    fn name(&self) -> &'static str {
        self.ecosystem.plugin_name()
    }

    #[instrument(skip_all, fields(plugin = self.ecosystem.plugin_name(), candidates = candidates.len()))]
    async fn run(
        &self,
        candidates: Vec<CandidateReleasePullRequest>,
        ctx: &PluginContext<'_>,
    ) -> Result<Vec<CandidateReleasePullRequest>> {
        let release_type = self.ecosystem.release_type();
        let (in_scope, mut out_of_scope): (Vec<_>, Vec<_>) = candidates
            .into_iter()
            .partition(|c| c.path != ROOT_PROJECT_PATH && c.config.release_type() == release_type);
        if in_scope.is_empty() && !self.options.update_all_packages {
            debug!("no workspace candidates");
            return Ok(out_of_scope);
        }

        let paths: Vec<&str> = ctx
            .manifest
            .strategies
            .iter()
            .filter(|(path, strategy)| {
                path.as_str() != ROOT_PROJECT_PATH
                    && strategy.base().config.release_type() == release_type
            })
            .map(|(path, _)| path.as_str())
            .collect();
        let (packages, contents) = self.load_packages(&paths, &in_scope, ctx).await?;
        let graph = DependencyGraph::build(&packages);
        let by_name: BTreeMap<&str, &WorkspacePackage> =
            packages.iter().map(|p| (p.name.as_str(), p)).collect();
        let by_path: BTreeMap<&str, &WorkspacePackage> =
            packages.iter().map(|p| (p.path.as_str(), p)).collect();

        let seeds: Vec<&str> = in_scope
            .iter()
            .filter_map(|c| by_path.get(c.path.as_str()).map(|p| p.name.as_str()))
            .collect();
        let update_set: BTreeSet<String> = if self.options.update_all_packages {
            graph.names().map(str::to_string).collect()
        } else if self.options.update_dependents {
            graph.affected(seeds.iter().copied())
        } else {
            seeds.iter().map(|s| s.to_string()).collect()
        };
        let order = graph.release_order(&update_set)?;

        let mut candidates_by_path: BTreeMap<String, CandidateReleasePullRequest> = in_scope
            .into_iter()
            .map(|c| (c.path.clone(), c))
            .collect();

        let mut previous_versions = VersionsMap::new();
        let mut new_versions = VersionsMap::new();
        for name in &order {
            let Some(package) = by_name.get(name.as_str()) else {
                continue;
            };
            let current = ctx
                .manifest
                .released_versions
                .get(&package.path)
                .or(package.version.as_ref())
                .cloned();
            if let Some(current) = &current {
                previous_versions.insert(name.clone(), current.clone());
            }

            match candidates_by_path.get(&package.path) {
                Some(candidate) => {
                    if let Some(version) = &candidate.pull_request.version {
                        new_versions.insert(name.clone(), version.clone());
                    }
                }
                None => match current {
                    Some(current) => {
                        let next = apply_bump(&current, &VersionBump::Patch);
                        debug!(package = %name, from = %current, to = %next, "bumping dependent");
                        new_versions.insert(name.clone(), next);
                    }
                    None => warn!(package = %name, "no current version, keeping package as is"),
                },
            }
        }

        let mut updated = Vec::with_capacity(order.len());
        for name in &order {
            let (Some(package), Some(version)) = (by_name.get(name.as_str()), new_versions.get(name))
            else {
                continue;
            };
            let dependency_updates: VersionsMap = package
                .dependencies
                .iter()
                .filter_map(|d| new_versions.get(&d.name).map(|v| (d.name.clone(), v.clone())))
                .collect();
            let notes = dependency_notes(package, &new_versions);

            let candidate = match candidates_by_path.remove(&package.path) {
                Some(candidate) => candidate,
                None => match self.synthesize(package, version, previous_versions.get(name), ctx) {
                    Some(candidate) => candidate,
                    None => continue,
                },
            };
            updated.push(self.update_candidate(
                candidate,
                package,
                version,
                dependency_updates,
                notes.as_deref(),
                &contents,
            ));
        }
        // candidates whose manifest could not be loaded
        updated.extend(candidates_by_path.into_values());

        if let Some(first) = updated.first_mut() {
            first
                .pull_request
                .updates
                .extend(self.ecosystem.root_updates(&new_versions));
        }

        info!(
            packages = packages.len(),
            releases = updated.len(),
            "propagated workspace releases"
        );

        let updated = if self.options.merge {
            Merge::new().run(updated, ctx).await?
        } else {
            updated
        };
        out_of_scope.extend(updated);
        Ok(out_of_scope)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn package(deps: &[(&str, &str, Option<&str>)]) -> WorkspacePackage {
        WorkspacePackage {
            name: "pkg-c".to_string(),
            path: "packages/c".to_string(),
            version: Some(Version::new(1, 0, 0)),
            dependencies: deps
                .iter()
                .map(|(section, name, requirement)| WorkspaceDependency {
                    section: section.to_string(),
                    name: name.to_string(),
                    requirement: requirement.map(str::to_string),
                })
                .collect(),
        }
    }

    #[test]
    fn test_dependency_notes() {
        let package = package(&[
            ("dependencies", "pkg-a", Some("^1.0.0")),
            ("dependencies", "lodash", Some("^4.0.0")),
            ("devDependencies", "pkg-b", Some("~2.0.0")),
            ("devDependencies", "pkg-d", Some("workspace:*")),
        ]);
        let mut versions = VersionsMap::new();
        versions.insert("pkg-a".to_string(), Version::new(1, 1, 0));
        versions.insert("pkg-b".to_string(), Version::new(2, 0, 1));
        versions.insert("pkg-d".to_string(), Version::new(3, 0, 1));

        assert_eq!(
            dependency_notes(&package, &versions).unwrap(),
            "* The following workspace dependencies were updated\n  * dependencies\n    * pkg-a bumped from ^1.0.0 to ^1.1.0\n  * devDependencies\n    * pkg-b bumped from ~2.0.0 to ~2.0.1"
        );
    }

    #[test]
    fn test_no_dependency_notes() {
        let package = package(&[("dependencies", "pkg-a", None)]);
        let mut versions = VersionsMap::new();
        versions.insert("pkg-a".to_string(), Version::new(1, 1, 0));
        assert_eq!(dependency_notes(&package, &versions), None);
    }
}
