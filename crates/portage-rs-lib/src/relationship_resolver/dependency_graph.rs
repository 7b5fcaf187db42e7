//! Module for only DependencyGraph functions not related to the overall resolving process.

use std::collections::HashMap;

use petgraph::prelude::*;
use serde::{Serialize, Deserialize};

use crate::metadb::package::PackageKey;

/// A package pinned to the version it resolved to.
///
/// Two packages are equal when category, name and version all match,
/// but only category and name take part in the hash.
#[derive(Debug, Clone, Eq, Serialize, Deserialize)]
pub struct DependencyPackage {
	pub category: String,
	pub name: String,
	pub version: String,
}

impl DependencyPackage {
	pub fn new(category: impl Into<String>, name: impl Into<String>, version: impl Into<String>) -> Self {
		Self { category: category.into(), name: name.into(), version: version.into() }
	}

	pub fn key(&self) -> PackageKey {
		PackageKey::new(&self.category, &self.name)
	}

	/// `category/name`, the form used by caches and ignore lists.
	pub fn key_string(&self) -> String {
		format!("{}/{}", self.category, self.name)
	}
}

impl std::hash::Hash for DependencyPackage {
	fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
		self.category.hash(state);
		self.name.hash(state);
	}
}

impl PartialEq for DependencyPackage {
	fn eq(&self, other: &Self) -> bool {
		self.category == other.category && self.name == other.name && self.version == other.version
	}
}

impl std::fmt::Display for DependencyPackage {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		write!(f, "{}/{}-{}", self.category, self.name, self.version)
	}
}

/// Which declared dependency list an edge came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DependencyKind {
	Runtime,
	Build,
}

/// Which edges a traversal follows.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DependencyType {
	Runtime,
	Buildtime,
	/// Runtime edges followed by build edges.
	#[default] Both,
}

impl std::str::FromStr for DependencyType {
	type Err = crate::Error;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s {
			"runtime" => Ok(DependencyType::Runtime),
			"buildtime" => Ok(DependencyType::Buildtime),
			"both" => Ok(DependencyType::Both),
			_ => Err(crate::Error::Parse(format!("unknown dependency type \"{}\", expected runtime, buildtime or both", s))),
		}
	}
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeData {
	pub package: DependencyPackage,
	/// Set once the node's dependencies have been (or are being) read.
	pub expanded: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EdgeData {
	pub kind: DependencyKind,
	/// Constraint label as written in the package definition, usually `default`.
	pub constraint: String,
}

/// Every package expanded so far and the dependency edges between them.
///
/// Nodes are shared between all expansions. The first node created for a `category/name`
/// is the one every later dependency on that name resolves to, whatever version it carries.
/// Nodes requested at any other version are kept apart, one per `category/name-version`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DependencyGraph {
	pub graph: DiGraph<NodeData, EdgeData>,
	cache: HashMap<String, NodeIndex>,
	/// Nodes whose version differs from the shared node of their name, keyed by `category/name-version`.
	#[serde(default)]
	detached: HashMap<String, NodeIndex>,
}

impl DependencyGraph {
	/// The shared node for `category/name`, if one was created.
	pub fn cached(&self, key: &str) -> Option<NodeIndex> {
		self.cache.get(key).copied()
	}

	/// Adds an unexpanded node.
	///
	/// The node becomes the shared node for its name unless one already exists,
	/// in which case the new node is only reachable through the returned index.
	pub(super) fn add_node(&mut self, package: DependencyPackage) -> NodeIndex {
		let key = package.key_string();
		let i = self.graph.add_node(NodeData { package, expanded: false });
		self.cache.entry(key).or_insert(i);
		i
	}

	/// The node for `package` at exactly its version, creating it when there is none yet.
	pub(super) fn versioned_node(&mut self, package: DependencyPackage) -> NodeIndex {
		if let Some(i) = self.cached(&package.key_string()) {
			if self.package(i).version == package.version {
				return i;
			}
		}
		let detached_key = package.to_string();
		if let Some(i) = self.detached.get(&detached_key) {
			return *i;
		}
		let i = self.add_node(package);
		if self.cached(&self.package(i).key_string()) != Some(i) {
			self.detached.insert(detached_key, i);
		}
		i
	}

	pub(super) fn add_child(&mut self, parent: NodeIndex, child: NodeIndex, kind: DependencyKind, constraint: &str) {
		log::trace!("Edge {} -> {} ({:?})", self.graph[parent].package, self.graph[child].package, kind);
		self.graph.add_edge(parent, child, EdgeData { kind, constraint: constraint.to_string() });
	}

	pub fn package(&self, i: NodeIndex) -> &DependencyPackage {
		&self.graph[i].package
	}

	pub fn is_expanded(&self, i: NodeIndex) -> bool {
		self.graph[i].expanded
	}

	pub(super) fn set_expanded(&mut self, i: NodeIndex) {
		self.graph[i].expanded = true;
	}

	/// Children of `src` reached through edges of `kind`, in declaration order.
	pub fn children(&self, src: NodeIndex, kind: DependencyKind) -> Vec<NodeIndex> {
		let mut children: Vec<NodeIndex> = self.graph
			.edges_directed(src, Outgoing)
			.filter(|e| e.weight().kind == kind)
			.map(|e| e.target())
			.collect();
		/* petgraph lists outgoing edges newest first */
		children.reverse();
		children
	}

	/// Runtime and/or build children as selected by `dep_type`. Runtime children come first.
	pub fn children_of_type(&self, src: NodeIndex, dep_type: DependencyType) -> Vec<NodeIndex> {
		match dep_type {
			DependencyType::Runtime => self.children(src, DependencyKind::Runtime),
			DependencyType::Buildtime => self.children(src, DependencyKind::Build),
			DependencyType::Both => {
				let mut children = self.children(src, DependencyKind::Runtime);
				children.extend(self.children(src, DependencyKind::Build));
				children
			},
		}
	}

	/// Packages with an edge to `target`.
	pub fn dependants(&self, target: NodeIndex) -> Vec<&DependencyPackage> {
		let mut dependants: Vec<&DependencyPackage> = self.graph
			.neighbors_directed(target, Incoming)
			.map(|i| self.package(i))
			.collect();
		dependants.sort_by(|a, b| a.key().cmp(&b.key()));
		dependants.dedup_by(|a, b| a.key() == b.key());
		dependants
	}

	/// Whether any declared dependencies form a cycle.
	pub fn has_cycle(&self) -> bool {
		petgraph::algo::is_cyclic_directed(&self.graph)
	}

	pub fn node_count(&self) -> usize {
		self.graph.node_count()
	}
}
