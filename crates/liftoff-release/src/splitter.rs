//! Attribution of commits to tracked paths

use std::collections::BTreeMap;

use liftoff_core::ROOT_PROJECT_PATH;
use liftoff_git::Commit;
use tracing::debug;

/// Splits commits between tracked paths by the files they touch.
///
/// A file belongs to the longest tracked path that contains it, so nested
/// packages do not leak commits into their parents. The root path is not
/// tracked here; callers give it every commit.
#[derive(Debug, Clone, Default)]
pub struct CommitSplitter {
    /// Tracked paths, longest first
    paths: Vec<String>,
    include_empty: bool,
    /// Repository-relative excluded directories per tracked path
    exclude_paths: BTreeMap<String, Vec<String>>,
}

impl CommitSplitter {
    /// Create a splitter for the given paths; the root path is ignored
    pub fn new<I, S>(paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut paths: Vec<String> = paths
            .into_iter()
            .map(|p| normalize(p.as_ref()))
            .filter(|p| !p.is_empty() && p != ROOT_PROJECT_PATH)
            .collect();
        paths.sort_by(|a, b| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));
        paths.dedup();

        Self {
            paths,
            include_empty: false,
            exclude_paths: BTreeMap::new(),
        }
    }

    /// Give every path an entry, and file-less commits to every path
    pub fn with_include_empty(mut self, include_empty: bool) -> Self {
        self.include_empty = include_empty;
        self
    }

    /// Exclude repository-relative directories from a tracked path
    pub fn with_exclude_paths<I, S>(mut self, path: &str, excluded: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let excluded: Vec<String> = excluded.into_iter().map(|p| normalize(p.as_ref())).collect();
        if !excluded.is_empty() {
            self.exclude_paths.insert(normalize(path), excluded);
        }
        self
    }

    /// Split commits by path, preserving commit order within each path
    pub fn split(&self, commits: &[Commit]) -> BTreeMap<String, Vec<Commit>> {
        let mut split: BTreeMap<String, Vec<Commit>> = BTreeMap::new();
        if self.include_empty {
            for path in &self.paths {
                split.entry(path.clone()).or_default();
            }
        }

        for commit in commits {
            if commit.files.is_empty() {
                if self.include_empty {
                    for path in &self.paths {
                        split.entry(path.clone()).or_default().push(commit.clone());
                    }
                }
                continue;
            }

            let mut owners: Vec<&str> = commit
                .files
                .iter()
                .filter_map(|file| self.owner_of(file))
                .collect();
            owners.sort_unstable();
            owners.dedup();

            for owner in owners {
                split.entry(owner.to_string()).or_default().push(commit.clone());
            }
        }

        debug!(
            commits = commits.len(),
            paths = split.len(),
            "split commits by path"
        );
        split
    }

    /// Tracked path a file is attributed to
    fn owner_of(&self, file: &str) -> Option<&str> {
        self.paths
            .iter()
            .find(|path| {
                contains(path, file) && !is_excluded(self.exclude_paths.get(path.as_str()), file)
            })
            .map(String::as_str)
    }
}

/// Keep commits that touch at least one file outside `excluded`.
///
/// Commits without files are kept.
pub fn filter_excluded(commits: Vec<Commit>, excluded: &[String]) -> Vec<Commit> {
    if excluded.is_empty() {
        return commits;
    }
    let excluded: Vec<String> = excluded.iter().map(|p| normalize(p)).collect();
    commits
        .into_iter()
        .filter(|commit| {
            commit.files.is_empty()
                || commit
                    .files
                    .iter()
                    .any(|file| !is_excluded(Some(&excluded), file))
        })
        .collect()
}

fn normalize(path: &str) -> String {
    path.trim_start_matches("./")
        .trim_start_matches('/')
        .trim_end_matches('/')
        .to_string()
}

fn contains(dir: &str, file: &str) -> bool {
    file.strip_prefix(dir)
        .is_some_and(|rest| rest.starts_with('/'))
}

fn is_excluded(excluded: Option<&Vec<String>>, file: &str) -> bool {
    excluded.is_some_and(|dirs| dirs.iter().any(|dir| contains(dir, file)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn commit(sha: &str, files: &[&str]) -> Commit {
        Commit::new(sha, format!("fix: change {}", sha)).with_files(files.iter().copied())
    }

    fn shas(commits: &[Commit]) -> Vec<&str> {
        commits.iter().map(|c| c.sha.as_str()).collect()
    }

    #[test]
    fn test_split_by_path() {
        let splitter = CommitSplitter::new(["packages/a", "packages/b", "."]);
        let split = splitter.split(&[
            commit("1", &["packages/a/index.js"]),
            commit("2", &["packages/b/index.js", "packages/a/README.md"]),
            commit("3", &["docs/guide.md"]),
        ]);

        assert_eq!(split.len(), 2);
        assert_eq!(shas(&split["packages/a"]), vec!["1", "2"]);
        assert_eq!(shas(&split["packages/b"]), vec!["2"]);
    }

    #[test]
    fn test_commit_counted_once_per_path() {
        let splitter = CommitSplitter::new(["pkg"]);
        let split = splitter.split(&[commit("1", &["pkg/a", "pkg/b", "pkg/c"])]);
        assert_eq!(split["pkg"].len(), 1);
    }

    #[test]
    fn test_prefix_needs_directory_boundary() {
        let splitter = CommitSplitter::new(["pkg"]);
        let split = splitter.split(&[commit("1", &["pkg-other/file"])]);
        assert!(split.is_empty());
    }

    #[test]
    fn test_nested_paths_use_longest_match() {
        let splitter = CommitSplitter::new(["packages", "packages/inner"]);
        let split = splitter.split(&[
            commit("1", &["packages/inner/src/lib.rs"]),
            commit("2", &["packages/outer.txt"]),
        ]);
        assert_eq!(shas(&split["packages"]), vec!["2"]);
        assert_eq!(shas(&split["packages/inner"]), vec!["1"]);
    }

    #[test]
    fn test_include_empty() {
        let commits = [commit("1", &["a/x"]), commit("2", &[])];

        let without = CommitSplitter::new(["a", "b"]).split(&commits);
        assert_eq!(without.keys().collect::<Vec<_>>(), vec!["a"]);
        assert_eq!(shas(&without["a"]), vec!["1"]);

        let with = CommitSplitter::new(["a", "b"])
            .with_include_empty(true)
            .split(&commits);
        assert_eq!(shas(&with["a"]), vec!["1", "2"]);
        assert_eq!(shas(&with["b"]), vec!["2"]);
    }

    #[test]
    fn test_exclude_paths() {
        let splitter = CommitSplitter::new(["pkg"]).with_exclude_paths("pkg", ["pkg/generated"]);
        let split = splitter.split(&[
            commit("1", &["pkg/generated/out.js"]),
            commit("2", &["pkg/generated/out.js", "pkg/src/main.js"]),
        ]);
        assert_eq!(shas(&split["pkg"]), vec!["2"]);
    }

    #[test]
    fn test_filter_excluded_for_root() {
        let commits = vec![commit("1", &["docs/a.md"]), commit("2", &["src/lib.rs"]), commit("3", &[])];
        let kept = filter_excluded(commits, &["docs".to_string()]);
        assert_eq!(shas(&kept), vec!["2", "3"]);
    }
}
