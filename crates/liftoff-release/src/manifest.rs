//! Manifest orchestration
//!
//! A [`Manifest`] owns the hosting backend and an immutable
//! [`ManifestContext`] resolved once up front (configuration, released
//! versions and one strategy per tracked path). It drives both halves of
//! the release cycle: building and opening release pull requests, and
//! turning merged ones into tags and releases.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use chrono::NaiveDate;
use liftoff_core::config::{
    parse_manifest_config, parse_released_versions, validate_components, ManifestConfig,
    ReleasedVersions, DEFAULT_CONFIG_FILE, DEFAULT_MANIFEST_FILE,
};
use liftoff_core::{LiftoffError, Result, VersionsMap, ROOT_PROJECT_PATH};
use liftoff_git::{
    BranchName, Commit, FileChange, FileContents, Hosting, PullRequestRequest, ReleaseRequest,
    RepositoryInfo, TagName,
};
use liftoff_updaters::ReleasedVersionsJson;
use serde::Serialize;
use tokio::task::JoinSet;
use tracing::{debug, info, instrument, warn};

use crate::candidate::{CandidateRelease, CandidateReleasePullRequest, LatestRelease, Update};
use crate::plugins::{build_plugins, Merge, Plugin, PluginContext};
use crate::splitter::{filter_excluded, CommitSplitter};
use crate::strategy::{build_strategy, Strategy, StrategyOptions};

/// Configuration, released versions and strategies, resolved once
pub struct ManifestContext {
    /// Manifest configuration
    pub config: ManifestConfig,
    /// Last released version per tracked path
    pub released_versions: ReleasedVersions,
    /// Repository identity
    pub repository: RepositoryInfo,
    /// Branch releases are cut from
    pub target_branch: String,
    /// Release date used in notes
    pub date: NaiveDate,
    /// Strategy per tracked path
    pub strategies: BTreeMap<String, Arc<dyn Strategy>>,
    /// Tracked path per resolved component
    pub paths_by_component: BTreeMap<String, String>,
}

impl ManifestContext {
    /// Resolve the strategy of every tracked path.
    ///
    /// Without configured packages the repository root is the only
    /// tracked path. Fails when two paths resolve to the same component.
    #[instrument(skip_all, fields(target_branch = target_branch.unwrap_or_default()))]
    pub async fn build(
        hosting: &dyn Hosting,
        config: ManifestConfig,
        released_versions: ReleasedVersions,
        target_branch: Option<&str>,
        date: NaiveDate,
    ) -> Result<Self> {
        let repository = hosting.repository().clone();
        let target_branch = target_branch
            .map(str::to_string)
            .unwrap_or_else(|| repository.default_branch.clone());

        let mut paths: Vec<String> = config.packages.keys().cloned().collect();
        if paths.is_empty() {
            paths.push(ROOT_PROJECT_PATH.to_string());
        }

        let mut strategies = BTreeMap::new();
        for path in paths.iter().cloned() {
            let options = StrategyOptions {
                path: path.clone(),
                tracked_paths: paths.clone(),
                config: config.releaser_for(&path),
                target_branch: target_branch.clone(),
                repository: repository.clone(),
                labels: config.labels(),
                release_labels: config.release_labels(),
                group_title_pattern: config.group_pull_request_title_pattern().to_string(),
                date,
            };
            strategies.insert(path, build_strategy(hosting, options).await?);
        }

        validate_components(
            strategies
                .iter()
                .map(|(path, s)| (path.as_str(), s.component().unwrap_or_default())),
        )?;
        let paths_by_component = strategies
            .iter()
            .filter_map(|(path, s)| Some((s.component()?.to_string(), path.clone())))
            .collect();

        info!(paths = strategies.len(), %target_branch, "resolved manifest");
        Ok(Self {
            config,
            released_versions,
            repository,
            target_branch,
            date,
            strategies,
            paths_by_component,
        })
    }

    /// Strategy of a tracked path
    pub fn strategy(&self, path: &str) -> Option<&Arc<dyn Strategy>> {
        self.strategies.get(path)
    }

    /// Tracked path of a component
    pub fn path_for_component(&self, component: &str) -> Option<&str> {
        self.paths_by_component.get(component).map(String::as_str)
    }
}

/// A release pull request opened (or, in dry-run mode, prepared)
#[derive(Debug, Clone, Serialize)]
pub struct OpenedReleasePullRequest {
    /// Number assigned by the hosting backend, `None` in dry-run mode
    pub number: Option<u64>,
    /// Versions released per tracked path
    pub versions: VersionsMap,
    /// The submitted request
    pub request: PullRequestRequest,
}

/// A release created (or, in dry-run mode, prepared)
#[derive(Debug, Clone, Serialize)]
pub struct CreatedRelease {
    /// Tracked path
    pub path: String,
    /// Tag name
    pub tag: String,
    /// Tagged commit
    pub sha: String,
    /// Release name
    pub name: String,
    /// URL of the hosted release, when known
    pub url: Option<String>,
    /// Merged release pull request
    pub pull_request_number: u64,
    /// The tag existed already
    pub already_existed: bool,
}

impl CreatedRelease {
    fn new(release: &CandidateRelease, url: Option<String>, already_existed: bool) -> Self {
        Self {
            path: release.path.clone(),
            tag: release.tag.to_string(),
            sha: release.sha.clone(),
            name: release.name.clone(),
            url,
            pull_request_number: release.pull_request_number,
            already_existed,
        }
    }
}

/// Drives release pull requests and releases for a repository
pub struct Manifest {
    hosting: Arc<dyn Hosting>,
    context: Arc<ManifestContext>,
    plugins: Vec<Box<dyn Plugin>>,
    dry_run: bool,
}

impl Manifest {
    /// Resolve a manifest from explicit configuration, dated today
    pub async fn new(
        hosting: Arc<dyn Hosting>,
        config: ManifestConfig,
        released_versions: ReleasedVersions,
        target_branch: Option<&str>,
    ) -> Result<Self> {
        let date = chrono::Local::now().date_naive();
        let context = ManifestContext::build(
            hosting.as_ref(),
            config,
            released_versions,
            target_branch,
            date,
        )
        .await?;
        Ok(Self::from_context(hosting, context))
    }

    /// Load configuration and released versions from the target branch
    #[instrument(skip_all)]
    pub async fn from_hosting(hosting: Arc<dyn Hosting>, target_branch: Option<&str>) -> Result<Self> {
        let branch = target_branch
            .map(str::to_string)
            .unwrap_or_else(|| hosting.repository().default_branch.clone());

        let config_file = hosting
            .file_contents_on_branch(DEFAULT_CONFIG_FILE, &branch)
            .await?;
        let config = parse_manifest_config(&config_file.content)?;

        let released_versions =
            match fetch_optional(hosting.as_ref(), DEFAULT_MANIFEST_FILE, &branch).await? {
                Some(manifest) => parse_released_versions(&manifest.content)?,
                None => {
                    debug!(branch = %branch, "no manifest file, starting from scratch");
                    ReleasedVersions::new()
                }
            };

        Self::new(hosting, config, released_versions, Some(&branch)).await
    }

    /// Wrap an already resolved context; plugins come from its configuration
    pub fn from_context(hosting: Arc<dyn Hosting>, context: ManifestContext) -> Self {
        let plugins = build_plugins(&context.config.plugins);
        Self {
            hosting,
            context: Arc::new(context),
            plugins,
            dry_run: false,
        }
    }

    /// Replace the configured plugin stages
    pub fn with_plugins(mut self, plugins: Vec<Box<dyn Plugin>>) -> Self {
        self.plugins = plugins;
        self
    }

    /// Resolve everything but make no mutating hosting call
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Resolved context
    pub fn context(&self) -> &ManifestContext {
        &self.context
    }

    /// Check if this is a dry run
    pub fn is_dry_run(&self) -> bool {
        self.dry_run
    }

    /// Latest release of every tracked path.
    ///
    /// The version comes from the released-versions manifest; the release
    /// carrying its tag provides the commit. When no release carries the
    /// exact tag, the newest release of the component is used, and paths
    /// absent from the manifest take the newest release of their component
    /// as is.
    async fn latest_releases(&self) -> Result<BTreeMap<String, LatestRelease>> {
        let ctx = self.context.as_ref();
        let mut found: BTreeMap<String, LatestRelease> = BTreeMap::new();
        let mut settled: BTreeSet<&str> = BTreeSet::new();

        let mut releases = self.hosting.releases(ctx.config.release_search_depth());
        while let Some(release) = releases.next().await? {
            let Some(tag) = TagName::parse(&release.tag_name) else {
                warn!(tag = %release.tag_name, "skipping release with unparseable tag");
                continue;
            };

            for (path, strategy) in &ctx.strategies {
                let base = strategy.base();
                if settled.contains(path.as_str()) || tag.component.as_deref() != base.tag_component() {
                    continue;
                }
                match ctx.released_versions.get(path) {
                    Some(version) => {
                        let expected = base.tag_for(version.clone());
                        let exact = expected.to_string() == release.tag_name;
                        if exact || !found.contains_key(path) {
                            found.insert(
                                path.clone(),
                                LatestRelease {
                                    tag: expected,
                                    sha: release.sha.clone(),
                                    notes: release.notes.clone().filter(|_| exact),
                                },
                            );
                        }
                        if exact {
                            settled.insert(path.as_str());
                        }
                    }
                    None => {
                        found.insert(
                            path.clone(),
                            LatestRelease {
                                tag: tag.clone(),
                                sha: release.sha.clone(),
                                notes: release.notes.clone(),
                            },
                        );
                        settled.insert(path.as_str());
                    }
                }
            }

            if settled.len() == ctx.strategies.len() {
                break;
            }
        }

        for (path, strategy) in &ctx.strategies {
            if found.contains_key(path) {
                continue;
            }
            if let Some(version) = ctx.released_versions.get(path) {
                warn!(path = %path, %version, "no release found for released version");
                found.insert(
                    path.clone(),
                    LatestRelease {
                        tag: strategy.base().tag_for(version.clone()),
                        sha: ctx.config.last_release_sha.clone().unwrap_or_default(),
                        notes: None,
                    },
                );
            }
        }

        debug!(found = found.len(), "resolved latest releases");
        Ok(found)
    }

    /// Commits of every tracked path since its latest release.
    ///
    /// The history is walked once, up to the commit search depth, and
    /// stops early when every path's release commit has been seen.
    async fn commits_since(
        &self,
        latest: &BTreeMap<String, LatestRelease>,
    ) -> Result<BTreeMap<String, Vec<Commit>>> {
        let ctx = self.context.as_ref();
        let fallback = ctx
            .config
            .last_release_sha
            .as_deref()
            .or(ctx.config.bootstrap_sha.as_deref());
        let stops: BTreeMap<&str, Option<&str>> = ctx
            .strategies
            .keys()
            .map(|path| {
                let sha = latest
                    .get(path)
                    .map(|l| l.sha.as_str())
                    .filter(|sha| !sha.is_empty())
                    .or(fallback);
                (path.as_str(), sha)
            })
            .collect();

        let mut pending: BTreeSet<&str> = stops.values().flatten().copied().collect();
        let walk_all = stops.values().any(Option::is_none);

        let mut commits = Vec::new();
        let mut history = self
            .hosting
            .merge_commits(&ctx.target_branch, ctx.config.commit_search_depth());
        while let Some(commit) = history.next().await? {
            pending.remove(commit.sha.as_str());
            commits.push(commit);
            if !walk_all && pending.is_empty() {
                break;
            }
        }
        if !pending.is_empty() {
            warn!(
                missing = pending.len(),
                "release commits not found within the commit search depth"
            );
        }
        debug!(commits = commits.len(), "walked commit history");

        let nested: Vec<&str> = stops
            .keys()
            .copied()
            .filter(|path| *path != ROOT_PROJECT_PATH)
            .collect();
        let mut splitter = CommitSplitter::new(&nested);
        for path in &nested {
            if let Some(strategy) = ctx.strategies.get(*path) {
                splitter = splitter.with_exclude_paths(path, strategy.base().config.exclude_paths());
            }
        }

        let mut by_path = BTreeMap::new();
        for (path, stop) in &stops {
            let end = stop
                .and_then(|sha| commits.iter().position(|c| c.sha == sha))
                .unwrap_or(commits.len());
            let since = &commits[..end];
            let path_commits = if *path == ROOT_PROJECT_PATH {
                let excluded = ctx
                    .strategies
                    .get(*path)
                    .map(|s| s.base().config.exclude_paths().to_vec())
                    .unwrap_or_default();
                filter_excluded(since.to_vec(), &excluded)
            } else {
                splitter.split(since).remove(*path).unwrap_or_default()
            };
            debug!(path = %path, commits = path_commits.len(), "commits since last release");
            by_path.insert(path.to_string(), path_commits);
        }
        Ok(by_path)
    }

    /// Build the release pull requests without opening them
    #[instrument(skip_all, fields(target_branch = %self.context.target_branch))]
    pub async fn build_pull_requests(&self) -> Result<Vec<CandidateReleasePullRequest>> {
        let ctx = self.context.as_ref();
        info!(paths = ctx.strategies.len(), "building release pull requests");

        let latest = self.latest_releases().await?;
        let mut commits = self.commits_since(&latest).await?;

        let mut tasks = JoinSet::new();
        for (path, strategy) in &ctx.strategies {
            let strategy = Arc::clone(strategy);
            let hosting = Arc::clone(&self.hosting);
            let path_commits = commits.remove(path).unwrap_or_default();
            let latest = latest.get(path).cloned();
            let target_branch = ctx.target_branch.clone();
            let path = path.clone();
            tasks.spawn(async move {
                let candidate = build_candidate(
                    strategy.as_ref(),
                    hosting.as_ref(),
                    &path_commits,
                    latest.as_ref(),
                    &target_branch,
                )
                .await;
                (path, candidate)
            });
        }

        let mut built = BTreeMap::new();
        while let Some(joined) = tasks.join_next().await {
            let (path, candidate) = joined
                .map_err(|e| LiftoffError::other(format!("candidate task failed: {}", e)))?;
            if let Some(candidate) = candidate? {
                built.insert(path, candidate);
            }
        }
        let mut candidates: Vec<CandidateReleasePullRequest> = built.into_values().collect();
        info!(candidates = candidates.len(), "built release candidates");

        let plugin_ctx = PluginContext {
            hosting: self.hosting.as_ref(),
            manifest: ctx,
        };
        for plugin in &self.plugins {
            debug!(plugin = plugin.name(), "running plugin");
            candidates = plugin.run(candidates, &plugin_ctx).await?;
        }
        if !ctx.config.separate_pull_requests {
            candidates = Merge::new().run(candidates, &plugin_ctx).await?;
        }

        Ok(candidates.into_iter().map(with_manifest_update).collect())
    }

    /// Build and open the release pull requests
    #[instrument(skip_all, fields(dry_run = self.dry_run))]
    pub async fn create_pull_requests(&self) -> Result<Vec<OpenedReleasePullRequest>> {
        let target_branch = &self.context.target_branch;
        let mut opened = Vec::new();

        for candidate in self.build_pull_requests().await? {
            let changes = self.materialize(&candidate.pull_request.updates).await?;
            if changes.is_empty() {
                warn!(
                    title = %candidate.pull_request.title,
                    "release pull request changes no file, skipping"
                );
                continue;
            }
            let request = candidate.pull_request.to_request(changes);

            let number = if self.dry_run {
                info!(
                    title = %request.title,
                    branch = %request.head_branch,
                    files = request.changes.len(),
                    "dry run: would open pull request"
                );
                None
            } else {
                let number = self.hosting.open_pull_request(&request, target_branch).await?;
                info!(number, title = %request.title, "opened release pull request");
                Some(number)
            };

            opened.push(OpenedReleasePullRequest {
                number,
                versions: candidate.released_versions,
                request,
            });
        }

        Ok(opened)
    }

    /// Run the updates and keep the files whose content changes.
    ///
    /// Missing files are skipped unless the update may create them; a
    /// failing updater is logged and its file left alone.
    async fn materialize(&self, updates: &[Update]) -> Result<Vec<FileChange>> {
        let target_branch = &self.context.target_branch;
        let mut order: Vec<String> = Vec::new();
        let mut original: BTreeMap<String, Option<String>> = BTreeMap::new();
        let mut current: BTreeMap<String, String> = BTreeMap::new();

        for update in updates {
            let content = match current.get(&update.path) {
                Some(content) => Some(content.clone()),
                None => {
                    let fetched = match &update.cached_file_contents {
                        Some(cached) => Some(cached.content.clone()),
                        None => fetch_optional(self.hosting.as_ref(), &update.path, target_branch)
                            .await?
                            .map(|f| f.content),
                    };
                    original
                        .entry(update.path.clone())
                        .or_insert_with(|| fetched.clone());
                    fetched
                }
            };

            if content.is_none() && !update.create_if_missing {
                debug!(path = %update.path, "file does not exist, skipping");
                continue;
            }
            match update.updater.update_content(content.as_deref()) {
                Ok(updated) => {
                    if !order.contains(&update.path) {
                        order.push(update.path.clone());
                    }
                    current.insert(update.path.clone(), updated);
                }
                Err(e) => {
                    warn!(path = %update.path, updater = update.updater.name(), error = %e, "update failed");
                }
            }
        }

        Ok(order
            .into_iter()
            .filter_map(|path| {
                let content = current.remove(&path)?;
                let unchanged = original
                    .get(&path)
                    .and_then(Option::as_deref)
                    .is_some_and(|before| before == content);
                if unchanged {
                    debug!(path = %path, "content unchanged");
                    return None;
                }
                Some(FileChange { path, content })
            })
            .collect())
    }

    /// Releases of merged release pull requests still marked pending
    #[instrument(skip_all, fields(target_branch = %self.context.target_branch))]
    pub async fn build_releases(&self) -> Result<Vec<CandidateRelease>> {
        let ctx = self.context.as_ref();
        let labels = ctx.config.labels();
        let release_labels = ctx.config.release_labels();

        let mut releases = Vec::new();
        let mut merged = self
            .hosting
            .merged_pull_requests(&ctx.target_branch, ctx.config.release_search_depth());
        while let Some(pull_request) = merged.next().await? {
            let pending = pull_request.labels.iter().any(|l| labels.contains(l));
            let tagged = pull_request.labels.iter().any(|l| release_labels.contains(l));
            if !pending || tagged || BranchName::parse(&pull_request.head_branch).is_none() {
                continue;
            }
            debug!(number = pull_request.number, "inspecting merged release pull request");

            for strategy in ctx.strategies.values() {
                if let Some(release) = strategy.build_release(&pull_request)? {
                    releases.push(release);
                }
            }
        }

        info!(releases = releases.len(), "found releases to create");
        Ok(releases)
    }

    /// Create tags and releases for merged release pull requests.
    ///
    /// A tag that already exists counts as created.
    #[instrument(skip_all, fields(dry_run = self.dry_run))]
    pub async fn create_releases(&self) -> Result<Vec<CreatedRelease>> {
        let mut created = Vec::new();

        for release in self.build_releases().await? {
            let skip = self
                .context
                .strategy(&release.path)
                .is_some_and(|s| s.base().config.skip_github_release.unwrap_or(false));
            if skip {
                info!(tag = %release.tag, "skipping release creation");
                continue;
            }

            if self.dry_run {
                info!(tag = %release.tag, sha = %release.sha, "dry run: would create release");
                created.push(CreatedRelease::new(&release, None, false));
                continue;
            }

            let request = ReleaseRequest {
                tag_name: release.tag.to_string(),
                sha: release.sha.clone(),
                name: release.name.clone(),
                notes: release.notes.clone(),
                draft: release.draft,
                prerelease: release.prerelease,
            };
            match self.hosting.create_release(&request).await {
                Ok(hosted) => {
                    info!(tag = %request.tag_name, "created release");
                    created.push(CreatedRelease::new(&release, hosted.url, false));
                }
                Err(e) if e.is_already_exists() => {
                    warn!(tag = %request.tag_name, "release already exists");
                    created.push(CreatedRelease::new(&release, None, true));
                }
                Err(e) => return Err(e),
            }
        }

        Ok(created)
    }

    /// Next version of every tracked path that has something to release
    pub async fn next_versions(&self) -> Result<VersionsMap> {
        Ok(self
            .build_pull_requests()
            .await?
            .into_iter()
            .flat_map(|c| c.released_versions)
            .collect())
    }
}

async fn fetch_optional(
    hosting: &dyn Hosting,
    path: &str,
    branch: &str,
) -> Result<Option<FileContents>> {
    match hosting.file_contents_on_branch(path, branch).await {
        Ok(contents) => Ok(Some(contents)),
        Err(e) if e.is_file_not_found() => Ok(None),
        Err(e) => Err(e),
    }
}

/// Run one path's strategy and prefetch the files its updates touch
async fn build_candidate(
    strategy: &dyn Strategy,
    hosting: &dyn Hosting,
    commits: &[Commit],
    latest: Option<&LatestRelease>,
    target_branch: &str,
) -> Result<Option<CandidateReleasePullRequest>> {
    let Some(mut pull_request) = strategy.build_release_pull_request(commits, latest)? else {
        return Ok(None);
    };

    let mut updates = Vec::with_capacity(pull_request.updates.len());
    for update in pull_request.updates {
        let cached_file_contents = fetch_optional(hosting, &update.path, target_branch).await?;
        updates.push(Update {
            cached_file_contents,
            ..update
        });
    }
    pull_request.updates = updates;

    Ok(Some(CandidateReleasePullRequest::new(
        strategy.path(),
        pull_request,
        strategy.base().config.clone(),
    )))
}

/// Record the candidate's versions in the released-versions manifest
fn with_manifest_update(mut candidate: CandidateReleasePullRequest) -> CandidateReleasePullRequest {
    if !candidate.released_versions.is_empty() {
        candidate.pull_request.updates.push(Update::create_if_missing(
            DEFAULT_MANIFEST_FILE,
            Arc::new(ReleasedVersionsJson::new(candidate.released_versions.clone())),
        ));
    }
    candidate
}
