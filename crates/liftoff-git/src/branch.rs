//! Release branch naming

use std::fmt;

/// Namespace prefix of every release branch
const BRANCH_PREFIX: &str = "liftoff--branches--";

/// Separator introducing the component in a branch name
const COMPONENT_SEPARATOR: &str = "--components--";

/// Separator introducing the merge group in a branch name
const GROUP_SEPARATOR: &str = "--groups--";

/// Head branch name of a release pull request
///
/// `liftoff--branches--<target>` for merged pull requests,
/// `liftoff--branches--<target>--groups--<group>` for merged pull requests
/// of one merge group and
/// `liftoff--branches--<target>--components--<component>` for
/// per-component ones.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BranchName {
    /// Branch the pull request targets
    pub target_branch: String,
    /// Component, for per-component pull requests
    pub component: Option<String>,
    /// Merge group, for grouped pull requests
    pub group: Option<String>,
}

impl BranchName {
    /// Branch for a merged pull request against `target_branch`
    pub fn of_target_branch(target_branch: impl Into<String>) -> Self {
        Self {
            target_branch: target_branch.into(),
            component: None,
            group: None,
        }
    }

    /// Branch for a single component's pull request
    pub fn of_component_target_branch(
        component: impl Into<String>,
        target_branch: impl Into<String>,
    ) -> Self {
        Self {
            component: Some(component.into()).filter(|c: &String| !c.is_empty()),
            ..Self::of_target_branch(target_branch)
        }
    }

    /// Branch for the merged pull request of one merge group
    pub fn of_group_target_branch(
        group: impl Into<String>,
        target_branch: impl Into<String>,
    ) -> Self {
        Self {
            group: Some(group.into()).filter(|g: &String| !g.is_empty()),
            ..Self::of_target_branch(target_branch)
        }
    }

    /// Parse a branch name, returning `None` for branches outside the namespace
    pub fn parse(name: &str) -> Option<Self> {
        let rest = name.strip_prefix(BRANCH_PREFIX)?;
        if let Some((target, component)) = rest.split_once(COMPONENT_SEPARATOR) {
            return (!target.is_empty() && !component.is_empty())
                .then(|| Self::of_component_target_branch(component, target));
        }
        if let Some((target, group)) = rest.split_once(GROUP_SEPARATOR) {
            return (!target.is_empty() && !group.is_empty())
                .then(|| Self::of_group_target_branch(group, target));
        }
        (!rest.is_empty()).then(|| Self::of_target_branch(rest))
    }
}

impl fmt::Display for BranchName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", BRANCH_PREFIX, self.target_branch)?;
        if let Some(component) = &self.component {
            write!(f, "{}{}", COMPONENT_SEPARATOR, component)?;
        } else if let Some(group) = &self.group {
            write!(f, "{}{}", GROUP_SEPARATOR, group)?;
        }
        Ok(())
    }
}
