//! Flattening a package's dependency tree into build order.

use std::collections::HashSet;

use petgraph::prelude::*;

use super::dependency_graph::*;

/// Every dependency of `root` followed by `root` itself, dependencies always ahead of their dependants.
///
/// - `dep_type` selects which edges are followed.
/// - Packages in `ignores` (as `category/name`) are left out together with anything only reachable through them.
/// - With `max_depth` set, only that many levels below `root` are explored. `Some(0)` yields just `root`.
///
/// Each `category/name` appears at most once.
pub fn closure(graph: &DependencyGraph, root: NodeIndex, dep_type: DependencyType, ignores: &HashSet<String>, max_depth: Option<usize>) -> Vec<DependencyPackage> {
	let mut output = Vec::new();
	closure_into(graph, root, dep_type, ignores, max_depth, &mut output);
	output
}

/// Like [`closure()`] but appends to `output`.
///
/// Packages already in `output` are neither added again nor explored.
pub fn closure_into(graph: &DependencyGraph, root: NodeIndex, dep_type: DependencyType, ignores: &HashSet<String>, max_depth: Option<usize>, output: &mut Vec<DependencyPackage>) {
	let emitted = output.iter().map(DependencyPackage::key_string).collect();
	let mut traversal = Traversal {
		graph,
		dep_type,
		ignores,
		max_depth,
		visited: HashSet::new(),
		emitted,
		output,
	};
	traversal.visit(root, 0);
}

struct Traversal<'a> {
	graph: &'a DependencyGraph,
	dep_type: DependencyType,
	ignores: &'a HashSet<String>,
	max_depth: Option<usize>,
	/// Nodes entered by this traversal, including those still in progress.
	visited: HashSet<NodeIndex>,
	emitted: HashSet<String>,
	output: &'a mut Vec<DependencyPackage>,
}

impl Traversal<'_> {
	fn visit(&mut self, node: NodeIndex, depth: usize) {
		/* Marked on entry so a cycle back to this node stops here */
		self.visited.insert(node);

		for child in self.graph.children_of_type(node, self.dep_type) {
			let key = self.graph.package(child).key_string();
			if self.visited.contains(&child) || self.emitted.contains(&key) || self.ignores.contains(&key) {
				continue;
			}
			match self.max_depth {
				None => self.visit(child, depth + 1),
				Some(max) if depth < max => self.visit(child, depth + 1),
				Some(_) => {},
			}
		}

		let package = self.graph.package(node);
		let key = package.key_string();
		if !self.emitted.contains(&key) && !self.ignores.contains(&key) {
			self.emitted.insert(key);
			self.output.push(package.clone());
		}
	}
}
