//! Commit conversion for the local backend

use git2::{Delta, DiffOptions, Repository};

use crate::types::Commit;

/// Convert a git2 commit, diffing it against its first parent
pub(crate) fn to_commit(
    repo: &Repository,
    commit: &git2::Commit<'_>,
) -> Result<Commit, git2::Error> {
    let message = commit
        .message()
        .map(str::to_string)
        .unwrap_or_else(|| String::from_utf8_lossy(commit.message_bytes()).into_owned());

    Ok(Commit::new(commit.id().to_string(), message.trim_end()).with_files(changed_files(repo, commit)?))
}

/// Repository-relative paths touched by a commit
///
/// Root commits are diffed against the empty tree.
pub(crate) fn changed_files(
    repo: &Repository,
    commit: &git2::Commit<'_>,
) -> Result<Vec<String>, git2::Error> {
    let tree = commit.tree()?;
    let parent_tree = match commit.parent(0) {
        Ok(parent) => Some(parent.tree()?),
        Err(_) => None,
    };

    let mut opts = DiffOptions::new();
    opts.include_typechange(true);
    let diff = repo.diff_tree_to_tree(parent_tree.as_ref(), Some(&tree), Some(&mut opts))?;

    let mut files = Vec::new();
    for delta in diff.deltas() {
        let file = match delta.status() {
            Delta::Deleted => delta.old_file(),
            _ => delta.new_file(),
        };
        if let Some(path) = file.path() {
            let path = path.to_string_lossy().replace('\\', "/");
            if !files.contains(&path) {
                files.push(path);
            }
        }
    }
    Ok(files)
}
