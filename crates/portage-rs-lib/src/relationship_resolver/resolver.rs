//! The resolver ties the tree index, package definitions and installed versions together.

use std::collections::HashSet;
use std::sync::Arc;

use indexmap::IndexMap;
use petgraph::prelude::*;

use super::closure;
use super::dependency_graph::*;
use crate::error::{MetadataError, ResolveError};
use crate::install_db::InstalledPackages;
use crate::metadb::MetaDB;
use crate::metadb::package::*;
use crate::portage_tree::PortageTree;
use crate::version::PackageVersion;

/// A dependency as declared by a package, resolved to the version that would be built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectDependency {
	pub category: String,
	pub name: String,
	pub version: String,
	pub constraint: String,
}

/// Resolves packages of a [`PortageTree`] into dependency graphs and build orders.
///
/// Package definitions and graph nodes are cached for the lifetime of the resolver,
/// so a single resolver should be used for all packages of one request.
///
/// Create one with [`ResolverBuilder`](super::ResolverBuilder).
pub struct Resolver<'tree> {
	tree: &'tree PortageTree,
	installed: &'tree dyn InstalledPackages,
	metadb: MetaDB,
	dep_graph: DependencyGraph,
	/// `category/name` of packages left out of every closure.
	ignores: HashSet<String>,
	default_category: String,
}

impl<'tree> Resolver<'tree> {
	pub(super) fn new(tree: &'tree PortageTree, installed: &'tree dyn InstalledPackages, ignores: HashSet<String>, default_category: String) -> Self {
		Self {
			tree,
			installed,
			metadb: MetaDB::new(),
			dep_graph: DependencyGraph::default(),
			ignores,
			default_category,
		}
	}

	pub fn tree(&self) -> &'tree PortageTree {
		self.tree
	}

	pub fn graph(&self) -> &DependencyGraph {
		&self.dep_graph
	}

	pub fn metadb(&self) -> &MetaDB {
		&self.metadb
	}

	pub fn ignores(&self) -> &HashSet<String> {
		&self.ignores
	}

	pub fn default_category(&self) -> &str {
		&self.default_category
	}

	/* Package information */

	/// The definition of `category/name`, loaded on first use.
	pub fn package_info(&mut self, category: &str, name: &str) -> Result<Arc<PackageInfo>, MetadataError> {
		self.metadb.get_package(self.tree, category, name)
	}

	fn checked_info(&mut self, category: &str, name: &str) -> crate::Result<Arc<PackageInfo>> {
		self.tree.check_package(category, name)?;
		Ok(self.package_info(category, name)?)
	}

	pub fn default_target(&mut self, category: &str, name: &str) -> crate::Result<Option<String>> {
		Ok(self.checked_info(category, name)?.default_target().map(str::to_string))
	}

	pub fn all_targets(&mut self, category: &str, name: &str) -> crate::Result<IndexMap<String, String>> {
		Ok(self.checked_info(category, name)?.all_targets())
	}

	pub fn summary(&mut self, category: &str, name: &str) -> crate::Result<MetadataSummary> {
		Ok(self.checked_info(category, name)?.summary(category))
	}

	/// Whether `category/name` only exists to pull in dependencies. Unloadable definitions are not virtual.
	pub fn is_virtual_package(&mut self, category: &str, name: &str) -> bool {
		self.package_info(category, name).map_or(false, |info| info.kind == PackageKind::Virtual)
	}

	/// VCS targets of `category/name` that should be synced again before building.
	///
	/// # Errors
	/// - [`Resolve`](crate::Error::Resolve) when the package is not indexed.
	/// - [`Metadata`](crate::Error::Metadata) when its definition can't be loaded.
	pub fn updatable_targets(&mut self, category: &str, name: &str) -> crate::Result<Vec<String>> {
		let info = self.checked_info(category, name)?;
		Ok(info.vcs_targets
			.iter()
			.filter(|(label, locator)| !locator.is_empty() && info.is_version_controlled(label))
			.filter(|(_, locator)| crate::vcs::is_locator_updatable(locator))
			.map(|(label, _)| label.clone())
			.collect())
	}

	/// Every indexed package with a default target, paired with that target.
	///
	/// Packages whose definitions can't be loaded are skipped.
	pub fn installables(&mut self) -> Vec<DependencyPackage> {
		let tree = self.tree;
		let mut installables = Vec::new();
		for entry in tree.entries() {
			match self.package_info(&entry.category, entry.name()) {
				Ok(info) => {
					if let Some(target) = info.default_target() {
						installables.push(DependencyPackage::new(&entry.category, entry.name(), target));
					}
				},
				Err(e) => log::debug!("Not installable: {}", e),
			}
		}
		installables
	}

	/// The version `category/name` resolves to.
	///
	/// Starts from the default target and is replaced by any installed version comparing greater.
	///
	/// # Errors
	/// - [`Resolve`](crate::Error::Resolve) when the package is not indexed or has no version at all.
	/// - [`Metadata`](crate::Error::Metadata) when the definition can't be loaded and nothing is installed.
	pub fn newest_version(&mut self, category: &str, name: &str) -> crate::Result<String> {
		self.tree.check_package(category, name)?;
		let installed = self.installed.installed_versions(category, name);

		let mut newest = match self.package_info(category, name) {
			Ok(info) => info.default_target().map(str::to_string),
			Err(e) if installed.is_empty() => return Err(e.into()),
			Err(e) => {
				log::warn!("{}, falling back to installed versions", e);
				None
			},
		};

		for version in installed {
			newest = match newest {
				/* Equal versions keep the default target */
				Some(current) if PackageVersion::new(&version) <= PackageVersion::new(&current) => Some(current),
				_ => Some(version),
			};
		}

		log::trace!("Newest version of {}/{} is {:?}", category, name, newest);
		newest.ok_or_else(|| ResolveError::NoTarget { category: category.to_string(), package: name.to_string() }.into())
	}

	/// Direct dependencies of `category/name` with the versions they resolve to.
	///
	/// Dependencies that can't be resolved are logged and left out.
	pub fn direct_dependencies(&mut self, category: &str, name: &str, runtime_only: bool) -> crate::Result<Vec<DirectDependency>> {
		let info = self.checked_info(category, name)?;
		let mut dependencies = Vec::new();
		for (dependency, constraint) in info.dependency_constraints(runtime_only) {
			let key: PackageKey = match dependency.parse() {
				Ok(key) => key,
				Err(e) => {
					log::warn!("Skipping dependency of {}/{}: {}", category, name, e);
					continue;
				},
			};
			match self.newest_version(&key.category, &key.name) {
				Ok(version) => dependencies.push(DirectDependency {
					category: key.category,
					name: key.name,
					version,
					constraint: constraint.to_string(),
				}),
				Err(e) => log::warn!("Skipping dependency {} of {}/{}: {}", dependency, category, name, e),
			}
		}
		Ok(dependencies)
	}

	/* Graph building */

	/// Gets the node for `category/name` at `version`, reading its dependencies when `auto_expand` is set.
	///
	/// The node already known for `category/name` is reused when its version matches.
	/// A different version gets a node of its own, reused by later requests for that same version,
	/// but its dependencies still resolve to the known nodes.
	pub fn expand(&mut self, category: &str, name: &str, version: &str, auto_expand: bool) -> NodeIndex {
		let node = self.dep_graph.versioned_node(DependencyPackage::new(category, name, version));
		if auto_expand && !self.dep_graph.is_expanded(node) {
			self.read_children(node);
		}
		node
	}

	fn read_children(&mut self, node: NodeIndex) {
		/* Marked first so a dependency cycle back to this node stops here */
		self.dep_graph.set_expanded(node);
		let package = self.dep_graph.package(node).clone();
		log::debug!("Expanding {}", package);

		let info = match self.package_info(&package.category, &package.name) {
			Ok(info) => info,
			Err(e) => {
				log::warn!("{}, {} has no known dependencies", e, package);
				return;
			},
		};

		for (dependency, constraint) in info.runtime_dependency_entries() {
			if let Some(child) = self.dependency_child(&package, dependency) {
				self.dep_graph.add_child(node, child, DependencyKind::Runtime, constraint);
			}
		}
		for (dependency, constraint) in info.build_dependency_entries() {
			if let Some(child) = self.dependency_child(&package, dependency) {
				self.dep_graph.add_child(node, child, DependencyKind::Build, constraint);
			}
		}
	}

	/// Node for `dependency` as required by `parent`, `None` when it can't be resolved.
	fn dependency_child(&mut self, parent: &DependencyPackage, dependency: &str) -> Option<NodeIndex> {
		let key: PackageKey = match dependency.parse() {
			Ok(key) => key,
			Err(e) => {
				log::warn!("Skipping dependency of {}: {}", parent, e);
				return None;
			},
		};
		let version = match self.newest_version(&key.category, &key.name) {
			Ok(version) => version,
			Err(e) => {
				log::warn!("Skipping {} as a dependency of {}: {}", key, parent, e);
				return None;
			},
		};

		if let Some(i) = self.dep_graph.cached(&key.to_string()) {
			/* Nodes created by `expand(.., false)` are only read once something depends on them */
			if !self.dep_graph.is_expanded(i) {
				self.read_children(i);
			}
			return Some(i);
		}
		let child = self.dep_graph.add_node(DependencyPackage::new(key.category, key.name, version));
		self.read_children(child);
		Some(child)
	}

	/// Resolves a requested package to an expanded node.
	///
	/// A missing `category` is looked up from the name, a missing `version` is the newest version.
	///
	/// # Errors
	/// Any failure to find or load the requested package itself.
	pub fn resolve(&mut self, category: Option<&str>, name: &str, version: Option<&str>) -> crate::Result<NodeIndex> {
		let category = match category {
			Some(category) => category.to_string(),
			None => {
				let category = self.tree.resolve_category(name, &self.default_category)?;
				log::debug!("Found {} in category {}", name, category);
				category
			},
		};
		self.tree.check_package(&category, name)?;
		let version = match version {
			Some(version) => version.to_string(),
			None => self.newest_version(&category, name)?,
		};
		self.package_info(&category, name)?;

		log::info!("Resolving {}/{}-{}", category, name, version);
		Ok(self.expand(&category, name, &version, true))
	}

	/* Traversal */

	/// See [`closure::closure()`], using the resolver's ignore set.
	pub fn closure(&self, root: NodeIndex, dep_type: DependencyType, max_depth: Option<usize>) -> Vec<DependencyPackage> {
		closure::closure(&self.dep_graph, root, dep_type, &self.ignores, max_depth)
	}

	/// Resolves a package and merges its closure with `existing`.
	///
	/// `existing` and the result hold packages in reverse build order, dependants ahead of their dependencies.
	/// Packages added by this call come first, and anything already in `existing` is neither repeated nor explored.
	///
	/// # Errors
	/// See [`resolve()`](Self::resolve()).
	pub fn accumulate(
		&mut self,
		existing: &[DependencyPackage],
		category: Option<&str>,
		name: &str,
		version: Option<&str>,
		dep_type: DependencyType,
		max_depth: Option<usize>,
	) -> crate::Result<Vec<DependencyPackage>> {
		let root = self.resolve(category, name, version)?;
		let mut output: Vec<DependencyPackage> = existing.iter().rev().cloned().collect();
		closure::closure_into(&self.dep_graph, root, dep_type, &self.ignores, max_depth, &mut output);
		output.reverse();
		Ok(output)
	}
}

#[cfg(test)]
mod tests {
	use std::path::Path;

	use super::*;
	use crate::install_db::{InstallDb, NothingInstalled};
	use crate::relationship_resolver::ResolverBuilder;

	fn write_package(root: &Path, category: &str, name: &str, json: &str) {
		let dir = root.join(category).join(name);
		std::fs::create_dir_all(&dir).unwrap();
		std::fs::write(dir.join(format!("{}.json", name)), json).unwrap();
	}

	/// `net/app` needs `lib/core` at runtime and `lib/buildtool` to build, both need `lib/base`.
	fn sample_tree() -> (tempfile::TempDir, PortageTree) {
		let dir = tempfile::tempdir().unwrap();
		write_package(dir.path(), "net", "app", r#"{
			"targets": { "1.0": "https://example.org/app-1.0.tar.xz" },
			"runtime_dependencies": { "lib/core": "default" },
			"build_dependencies": { "lib/buildtool": "default" }
		}"#);
		write_package(dir.path(), "lib", "core", r#"{
			"targets": { "0.9": "core-0.9.tar.xz", "2.0": "core-2.0.tar.xz" },
			"dependencies": { "lib/base": "default" }
		}"#);
		write_package(dir.path(), "lib", "buildtool", r#"{
			"targets": { "4.0": "buildtool-4.0.tar.xz" },
			"runtime_dependencies": { "lib/base": "default" }
		}"#);
		write_package(dir.path(), "lib", "base", r#"{ "targets": { "3.0": "base-3.0.tar.xz" } }"#);
		let tree = PortageTree::scan([dir.path()]).unwrap();
		(dir, tree)
	}

	fn names(packages: &[DependencyPackage]) -> Vec<String> {
		packages.iter().map(DependencyPackage::key_string).collect()
	}

	#[test]
	fn expansion_reads_both_dependency_lists() {
		let (_dir, tree) = sample_tree();
		let mut resolver = ResolverBuilder::new(&tree).build();
		let app = resolver.resolve(Some("net"), "app", None).unwrap();

		assert_eq!(resolver.graph().package(app), &DependencyPackage::new("net", "app", "1.0"));
		let runtime = resolver.graph().children(app, DependencyKind::Runtime);
		assert_eq!(runtime.len(), 1);
		assert_eq!(resolver.graph().package(runtime[0]).version, "2.0");

		/* lib/base is shared by both branches */
		assert_eq!(resolver.graph().node_count(), 4);
		assert_eq!(names(&resolver.closure(app, DependencyType::Both, None)), vec!["lib/base", "lib/core", "lib/buildtool", "net/app"]);
	}

	#[test]
	fn first_expansion_wins() {
		let (_dir, tree) = sample_tree();
		let mut resolver = ResolverBuilder::new(&tree).build();
		let old_core = resolver.expand("lib", "core", "0.9", true);
		let app = resolver.resolve(Some("net"), "app", None).unwrap();

		/* net/app would pick 2.0 but the 0.9 node already exists */
		let core = resolver.graph().children(app, DependencyKind::Runtime)[0];
		assert_eq!(core, old_core);
		assert_eq!(resolver.graph().package(core).version, "0.9");

		/* Asking for another version directly gets a separate node */
		let new_core = resolver.expand("lib", "core", "2.0", true);
		assert_ne!(new_core, old_core);
		assert_eq!(resolver.graph().cached("lib/core"), Some(old_core));
	}

	#[test]
	fn unexpanded_nodes_are_read_when_depended_on() {
		let (_dir, tree) = sample_tree();
		let mut resolver = ResolverBuilder::new(&tree).build();
		let core = resolver.expand("lib", "core", "2.0", false);
		assert!(!resolver.graph().is_expanded(core));

		let app = resolver.resolve(Some("net"), "app", None).unwrap();
		assert!(resolver.graph().is_expanded(core));
		assert_eq!(names(&resolver.closure(app, DependencyType::Runtime, None)), vec!["lib/base", "lib/core", "net/app"]);
	}

	#[test]
	fn repeated_version_requests_reuse_their_node() {
		let (_dir, tree) = sample_tree();
		let mut resolver = ResolverBuilder::new(&tree).build();
		resolver.resolve(Some("lib"), "core", None).unwrap();
		assert_eq!(resolver.graph().node_count(), 2);

		let old_core = resolver.resolve(Some("lib"), "core", Some("0.9")).unwrap();
		for _ in 0..5 {
			assert_eq!(resolver.resolve(Some("lib"), "core", Some("0.9")).unwrap(), old_core);
		}
		assert_eq!(resolver.graph().node_count(), 3);
		assert_eq!(names(&resolver.closure(old_core, DependencyType::Both, None)), vec!["lib/base", "lib/core"]);
	}

	#[test]
	fn declared_cycles_resolve_to_the_node_in_progress() {
		let (dir, _) = sample_tree();
		write_package(dir.path(), "a", "x", r#"{
			"default_target": "1.0",
			"runtime_dependencies": { "b/y": "default" }
		}"#);
		write_package(dir.path(), "b", "y", r#"{
			"default_target": "1.0",
			"build_dependencies": { "a/x": "default" }
		}"#);
		let tree = PortageTree::scan([dir.path()]).unwrap();
		let mut resolver = ResolverBuilder::new(&tree).build();

		let x = resolver.resolve(Some("a"), "x", None).unwrap();
		assert_eq!(resolver.graph().node_count(), 2);
		assert!(resolver.graph().has_cycle());
		let y = resolver.graph().children(x, DependencyKind::Runtime)[0];
		assert_eq!(resolver.graph().children(y, DependencyKind::Build), vec![x]);
		assert_eq!(names(&resolver.closure(x, DependencyType::Both, None)), vec!["b/y", "a/x"]);
		assert_eq!(names(&resolver.closure(x, DependencyType::Runtime, None)), vec!["b/y", "a/x"]);
	}

	#[test]
	fn installed_versions_can_win() {
		let (_dir, tree) = sample_tree();
		let mut db = InstallDb::default();
		db.add_installed("lib", "core", "2.1");
		db.add_installed("lib", "base", "1.0");

		let mut resolver = ResolverBuilder::new(&tree).installed(&db).build();
		assert_eq!(resolver.newest_version("lib", "core").unwrap(), "2.1");
		assert_eq!(resolver.newest_version("lib", "base").unwrap(), "3.0");
		assert!(matches!(
			resolver.newest_version("lib", "nope"),
			Err(crate::Error::Resolve(ResolveError::UnknownPackage { .. }))
		));
	}

	#[test]
	fn unresolvable_dependencies_are_dropped() {
		let (dir, _) = sample_tree();
		write_package(dir.path(), "net", "client", r#"{
			"targets": { "1.0": "client-1.0.tar.xz" },
			"runtime_dependencies": { "gone/away": "default", "lib/missing": "default", "not-a-key": "default", "lib/base": "default" }
		}"#);
		let tree = PortageTree::scan([dir.path()]).unwrap();
		let mut resolver = ResolverBuilder::new(&tree).build();

		let client = resolver.resolve(Some("net"), "client", None).unwrap();
		assert_eq!(names(&resolver.closure(client, DependencyType::Runtime, None)), vec!["lib/base", "net/client"]);
	}

	#[test]
	fn requested_package_errors_are_fatal() {
		let (dir, _) = sample_tree();
		std::fs::create_dir_all(dir.path().join("lib").join("empty")).unwrap();
		let tree = PortageTree::scan([dir.path()]).unwrap();
		let mut resolver = ResolverBuilder::new(&tree).build();

		assert!(matches!(resolver.resolve(Some("nope"), "app", None), Err(crate::Error::Resolve(ResolveError::UnknownCategory { .. }))));
		assert!(matches!(resolver.resolve(None, "missing", None), Err(crate::Error::Resolve(ResolveError::EmptyCategory { .. }))));
		assert!(matches!(resolver.resolve(Some("lib"), "empty", None), Err(crate::Error::Metadata(_))));
		assert!(matches!(resolver.resolve(Some("lib"), "empty", Some("1.0")), Err(crate::Error::Metadata(_))));
	}

	#[test]
	fn bare_names_find_their_category() {
		let (_dir, tree) = sample_tree();
		let mut resolver = ResolverBuilder::new(&tree).build();
		let core = resolver.resolve(None, "core", None).unwrap();
		assert_eq!(resolver.graph().package(core).category, "lib");
	}

	#[test]
	fn direct_dependencies_carry_constraints() {
		let (_dir, tree) = sample_tree();
		let mut resolver = ResolverBuilder::new(&tree).installed(&NothingInstalled).build();

		let deps = resolver.direct_dependencies("net", "app", false).unwrap();
		assert_eq!(deps, vec![
			DirectDependency { category: "lib".into(), name: "core".into(), version: "2.0".into(), constraint: "default".into() },
			DirectDependency { category: "lib".into(), name: "buildtool".into(), version: "4.0".into(), constraint: "default".into() },
		]);
		assert_eq!(resolver.direct_dependencies("net", "app", true).unwrap().len(), 1);
	}

	#[test]
	fn installables_list_default_targets() {
		let (_dir, tree) = sample_tree();
		let mut resolver = ResolverBuilder::new(&tree).build();
		let installables: Vec<String> = resolver.installables().iter().map(ToString::to_string).collect();
		assert_eq!(installables, vec!["lib/base-3.0", "lib/buildtool-4.0", "lib/core-2.0", "net/app-1.0"]);
	}

	#[test]
	fn updatable_targets_follow_vcs_policy() {
		let (dir, _) = sample_tree();
		write_package(dir.path(), "kdesupport", "strigi", r#"{
			"vcs_targets": {
				"gitHEAD": "[git]kde:strigi",
				"patched": "[git]kde:strigi|stable-patched",
				"0.7.8": "[git]kde:strigi||v0.7.8",
				"4.4": "tags/kdesupport-for-4.4/strigi",
				"svnHEAD": "trunk/kdesupport/strigi",
				"hg": "[hg]https://example.org/strigi",
				"empty": "",
				"0.7.5": "[git]kde:strigi"
			},
			"targets": { "0.7.5": "strigi-0.7.5.tar.bz2" }
		}"#);
		let tree = PortageTree::scan([dir.path()]).unwrap();
		let mut resolver = ResolverBuilder::new(&tree).build();

		assert_eq!(resolver.updatable_targets("kdesupport", "strigi").unwrap(), vec!["gitHEAD", "svnHEAD", "hg"]);
		assert!(resolver.updatable_targets("net", "app").unwrap().is_empty());
	}
}
