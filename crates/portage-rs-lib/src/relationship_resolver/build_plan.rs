use super::Resolver;
use super::dependency_graph::{DependencyPackage, DependencyType};

/// Build order for several requested packages, resolved one at a time.
#[derive(Debug, Clone, Default)]
pub struct BuildPlan {
	dep_type: DependencyType,
	max_depth: Option<usize>,
	/// Reverse build order, see [`Resolver::accumulate()`].
	accumulated: Vec<DependencyPackage>,
}

impl BuildPlan {
	pub fn new(dep_type: DependencyType, max_depth: Option<usize>) -> Self {
		Self { dep_type, max_depth, accumulated: Vec::new() }
	}

	/// Adds a package and everything it needs that the plan doesn't already have.
	///
	/// # Errors
	/// See [`Resolver::resolve()`]. The plan is left unchanged on error.
	pub fn add_package(&mut self, resolver: &mut Resolver, category: Option<&str>, name: &str, version: Option<&str>) -> crate::Result<()> {
		self.accumulated = resolver.accumulate(&self.accumulated, category, name, version, self.dep_type, self.max_depth)?;
		Ok(())
	}

	/// Packages as accumulated, latest request first.
	pub fn accumulated(&self) -> &[DependencyPackage] {
		&self.accumulated
	}

	/// Packages in the order they have to be built.
	pub fn build_order(&self) -> Vec<DependencyPackage> {
		self.accumulated.iter().rev().cloned().collect()
	}

	pub fn len(&self) -> usize {
		self.accumulated.len()
	}

	pub fn is_empty(&self) -> bool {
		self.accumulated.is_empty()
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::portage_tree::PortageTree;
	use crate::relationship_resolver::ResolverBuilder;

	fn write_package(root: &std::path::Path, category: &str, name: &str, json: &str) {
		let dir = root.join(category).join(name);
		std::fs::create_dir_all(&dir).unwrap();
		std::fs::write(dir.join(format!("{}.json", name)), json).unwrap();
	}

	/// `net/app` -> `lib/core` -> `lib/base` and `net/tool` -> `lib/base`, `lib/extra`.
	fn sample_tree() -> (tempfile::TempDir, PortageTree) {
		let dir = tempfile::tempdir().unwrap();
		write_package(dir.path(), "net", "app", r#"{ "default_target": "1", "runtime_dependencies": { "lib/core": "default" } }"#);
		write_package(dir.path(), "net", "tool", r#"{ "default_target": "1", "runtime_dependencies": { "lib/base": "default", "lib/extra": "default" } }"#);
		write_package(dir.path(), "lib", "core", r#"{ "default_target": "1", "runtime_dependencies": { "lib/base": "default" } }"#);
		write_package(dir.path(), "lib", "base", r#"{ "default_target": "1" }"#);
		write_package(dir.path(), "lib", "extra", r#"{ "default_target": "1" }"#);
		let tree = PortageTree::scan([dir.path()]).unwrap();
		(dir, tree)
	}

	fn names(packages: &[DependencyPackage]) -> Vec<String> {
		packages.iter().map(DependencyPackage::key_string).collect()
	}

	#[test]
	fn single_request_is_reversed_closure() {
		let (_dir, tree) = sample_tree();
		let mut resolver = ResolverBuilder::new(&tree).build();
		let mut plan = BuildPlan::new(DependencyType::Runtime, None);
		plan.add_package(&mut resolver, Some("net"), "app", None).unwrap();

		assert_eq!(names(plan.accumulated()), vec!["net/app", "lib/core", "lib/base"]);
		assert_eq!(names(&plan.build_order()), vec!["lib/base", "lib/core", "net/app"]);
	}

	#[test]
	fn later_requests_go_ahead_of_earlier_ones() {
		let (_dir, tree) = sample_tree();
		let mut resolver = ResolverBuilder::new(&tree).build();
		let mut plan = BuildPlan::new(DependencyType::Runtime, None);
		plan.add_package(&mut resolver, Some("net"), "app", None).unwrap();
		plan.add_package(&mut resolver, Some("net"), "tool", None).unwrap();

		/* lib/base is already planned so only lib/extra comes with net/tool */
		assert_eq!(names(plan.accumulated()), vec!["net/tool", "lib/extra", "net/app", "lib/core", "lib/base"]);
		assert_eq!(names(&plan.build_order()), vec!["lib/base", "lib/core", "net/app", "lib/extra", "net/tool"]);
	}

	#[test]
	fn repeated_request_adds_nothing() {
		let (_dir, tree) = sample_tree();
		let mut resolver = ResolverBuilder::new(&tree).build();
		let mut plan = BuildPlan::new(DependencyType::Both, None);
		plan.add_package(&mut resolver, Some("net"), "app", None).unwrap();
		plan.add_package(&mut resolver, None, "app", None).unwrap();
		assert_eq!(plan.len(), 3);
	}

	#[test]
	fn failed_request_keeps_plan() {
		let (_dir, tree) = sample_tree();
		let mut resolver = ResolverBuilder::new(&tree).build();
		let mut plan = BuildPlan::new(DependencyType::Both, None);
		plan.add_package(&mut resolver, Some("lib"), "core", None).unwrap();
		assert!(plan.add_package(&mut resolver, Some("lib"), "nope", None).is_err());
		assert_eq!(names(&plan.build_order()), vec!["lib/base", "lib/core"]);
	}
}
