//! Dependency graph of workspace packages

use std::collections::{BTreeMap, BTreeSet, VecDeque};

use liftoff_core::{Result, WorkspaceError};

use super::WorkspacePackage;

/// A node in the dependency graph
#[derive(Debug, Clone)]
pub struct PackageNode {
    /// Package name
    pub name: String,
    /// Tracked path of the package
    pub path: String,
    /// Workspace packages this package depends on
    pub dependencies: BTreeSet<String>,
    /// Workspace packages that depend on this package
    pub dependents: BTreeSet<String>,
}

/// Dependency graph restricted to workspace packages.
///
/// Dependencies on packages outside the workspace are dropped when the
/// graph is built.
#[derive(Debug, Clone, Default)]
pub struct DependencyGraph {
    nodes: BTreeMap<String, PackageNode>,
}

impl DependencyGraph {
    /// Build a dependency graph from loaded packages
    pub fn build(packages: &[WorkspacePackage]) -> Self {
        let mut nodes: BTreeMap<String, PackageNode> = packages
            .iter()
            .map(|pkg| {
                (
                    pkg.name.clone(),
                    PackageNode {
                        name: pkg.name.clone(),
                        path: pkg.path.clone(),
                        dependencies: BTreeSet::new(),
                        dependents: BTreeSet::new(),
                    },
                )
            })
            .collect();

        for pkg in packages {
            for dep in &pkg.dependencies {
                if dep.name == pkg.name || !nodes.contains_key(&dep.name) {
                    continue;
                }
                if let Some(node) = nodes.get_mut(&pkg.name) {
                    node.dependencies.insert(dep.name.clone());
                }
                if let Some(dep_node) = nodes.get_mut(&dep.name) {
                    dep_node.dependents.insert(pkg.name.clone());
                }
            }
        }

        Self { nodes }
    }

    /// Get a package node
    pub fn get(&self, name: &str) -> Option<&PackageNode> {
        self.nodes.get(name)
    }

    /// Names of every package, sorted
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.nodes.keys().map(String::as_str)
    }

    /// Direct dependents of a package
    pub fn dependents(&self, name: &str) -> Option<&BTreeSet<String>> {
        self.nodes.get(name).map(|n| &n.dependents)
    }

    /// The given packages plus everything that transitively depends on them
    pub fn affected<'a, I>(&self, names: I) -> BTreeSet<String>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut affected = BTreeSet::new();
        let mut queue: VecDeque<&str> = names.into_iter().collect();

        while let Some(current) = queue.pop_front() {
            if !affected.insert(current.to_string()) {
                continue;
            }
            if let Some(node) = self.nodes.get(current) {
                queue.extend(
                    node.dependents
                        .iter()
                        .filter(|d| !affected.contains(*d))
                        .map(String::as_str),
                );
            }
        }

        affected
    }

    /// Order `subset` so that dependencies precede their dependents.
    ///
    /// Runs a post-order depth-first search over dependents and reverses
    /// it. Packages outside `subset` are walked through but not returned,
    /// so indirect orderings are kept. A cycle reachable from `subset`
    /// fails with [`WorkspaceError::Cycle`].
    pub fn release_order(&self, subset: &BTreeSet<String>) -> Result<Vec<String>> {
        let mut visited: BTreeSet<&str> = BTreeSet::new();
        let mut stack: Vec<&str> = Vec::new();
        let mut post_order: Vec<&str> = Vec::new();

        for name in subset {
            let Some((key, _)) = self.nodes.get_key_value(name) else {
                return Err(WorkspaceError::UnknownPackage(name.clone()).into());
            };
            self.visit(key, &mut visited, &mut stack, &mut post_order)?;
        }

        Ok(post_order
            .into_iter()
            .rev()
            .filter(|name| subset.contains(*name))
            .map(str::to_string)
            .collect())
    }

    fn visit<'a>(
        &'a self,
        name: &'a str,
        visited: &mut BTreeSet<&'a str>,
        stack: &mut Vec<&'a str>,
        post_order: &mut Vec<&'a str>,
    ) -> Result<()> {
        if let Some(start) = stack.iter().position(|n| *n == name) {
            let mut cycle: Vec<String> = stack[start..].iter().map(|n| n.to_string()).collect();
            cycle.push(name.to_string());
            return Err(WorkspaceError::Cycle(cycle).into());
        }
        if !visited.insert(name) {
            return Ok(());
        }

        stack.push(name);
        if let Some(node) = self.nodes.get(name) {
            for dependent in &node.dependents {
                self.visit(dependent, visited, stack, post_order)?;
            }
        }
        stack.pop();
        post_order.push(name);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plugins::workspace::WorkspaceDependency;
    use liftoff_core::LiftoffError;

    fn package(name: &str, deps: &[&str]) -> WorkspacePackage {
        WorkspacePackage {
            name: name.to_string(),
            path: format!("packages/{}", name),
            version: None,
            dependencies: deps
                .iter()
                .map(|dep| WorkspaceDependency {
                    section: "dependencies".to_string(),
                    name: dep.to_string(),
                    requirement: Some("^1.0.0".to_string()),
                })
                .collect(),
        }
    }

    fn create_packages() -> Vec<WorkspacePackage> {
        vec![
            package("cli", &["core", "utils"]),
            package("core", &["lodash"]),
            package("utils", &["core"]),
        ]
    }

    fn set(names: &[&str]) -> BTreeSet<String> {
        names.iter().map(|n| n.to_string()).collect()
    }

    #[test]
    fn test_build_graph() {
        let graph = DependencyGraph::build(&create_packages());
        assert_eq!(graph.names().collect::<Vec<_>>(), vec!["cli", "core", "utils"]);
        // external dependencies are dropped
        assert!(graph.get("core").unwrap().dependencies.is_empty());
        assert_eq!(graph.dependents("core").unwrap(), &set(&["cli", "utils"]));
    }

    #[test]
    fn test_affected_packages() {
        let graph = DependencyGraph::build(&create_packages());
        assert_eq!(graph.affected(["core"]), set(&["cli", "core", "utils"]));
        assert_eq!(graph.affected(["cli"]), set(&["cli"]));
    }

    #[test]
    fn test_release_order() {
        let graph = DependencyGraph::build(&create_packages());
        let order = graph.release_order(&set(&["cli", "core", "utils"])).unwrap();
        assert_eq!(order, vec!["core", "utils", "cli"]);
    }

    #[test]
    fn test_release_order_through_skipped_packages() {
        let packages = vec![
            package("a", &[]),
            package("b", &["a"]),
            package("c", &["b"]),
        ];
        let graph = DependencyGraph::build(&packages);
        let order = graph.release_order(&set(&["c", "a"])).unwrap();
        assert_eq!(order, vec!["a", "c"]);
    }

    #[test]
    fn test_cycle() {
        let packages = vec![package("a", &["b"]), package("b", &["a"])];
        let graph = DependencyGraph::build(&packages);
        let err = graph.release_order(&set(&["a"])).unwrap_err();
        assert!(matches!(
            err,
            LiftoffError::Workspace(WorkspaceError::Cycle(ref cycle)) if cycle.len() == 3
        ));
    }

    #[test]
    fn test_unknown_package() {
        let graph = DependencyGraph::build(&create_packages());
        assert!(graph.release_order(&set(&["nope"])).is_err());
    }
}
