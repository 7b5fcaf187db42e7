//! Various types associated with packages.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::version::PackageVersion;

/// Identity of a package inside the tree, written `category/name`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PackageKey {
	pub category: String,
	pub name: String,
}

impl PackageKey {
	pub fn new(category: impl Into<String>, name: impl Into<String>) -> Self {
		Self { category: category.into(), name: name.into() }
	}
}

impl std::fmt::Display for PackageKey {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		write!(f, "{}/{}", self.category, self.name)
	}
}

impl std::str::FromStr for PackageKey {
	type Err = crate::Error;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s.split_once('/') {
			Some((category, name)) if !category.is_empty() && !name.is_empty() && !name.contains('/') => {
				Ok(PackageKey::new(category, name))
			},
			_ => Err(crate::Error::Parse(format!("\"{}\" is not of the form category/name", s))),
		}
	}
}

/// How a package is produced.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PackageKind {
	/// Built from source.
	#[default] Source,
	/// Prebuilt archive, unpacked as is.
	Binary,
	/// Has no content of its own, only dependencies.
	Virtual,
}

/// Flags used when packaging.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PackageOptions {
	/// Whether the compiler name is part of the produced package name.
	pub with_compiler: bool,
}

impl Default for PackageOptions {
	fn default() -> Self {
		Self { with_compiler: true }
	}
}

/// A package definition file.
///
/// Maps keep the order they are written in, which is the order dependencies are expanded in.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PackageInfo {
	pub kind: PackageKind,
	/// Target label to archive locator.
	pub targets: IndexMap<String, String>,
	/// Target label to version control locator.
	pub vcs_targets: IndexMap<String, String>,
	pub default_target: Option<String>,
	/// `category/name` to constraint label.
	pub runtime_dependencies: IndexMap<String, String>,
	pub build_dependencies: IndexMap<String, String>,
	/// Needed both at build time and at runtime.
	pub dependencies: IndexMap<String, String>,
	pub short_description: String,
	pub description: String,
	pub homepage: String,
	pub options: PackageOptions,
}

/// Descriptive fields of a package, for listings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MetadataSummary {
	pub category: String,
	pub short_description: Option<String>,
	pub description: Option<String>,
	pub homepage: Option<String>,
	pub with_compiler: bool,
}

impl PackageInfo {
	/// The target used when none is requested.
	///
	/// Falls back to the newest archive target and then to the first VCS target.
	pub fn default_target(&self) -> Option<&str> {
		if let Some(t) = &self.default_target {
			return Some(t.as_str());
		}
		self.targets
			.keys()
			.max_by(|a, b| PackageVersion::new(a).cmp(&PackageVersion::new(b)))
			.or_else(|| self.vcs_targets.keys().next())
			.map(String::as_str)
	}

	/// Every target, VCS targets first. Archive targets replace VCS targets of the same label.
	pub fn all_targets(&self) -> IndexMap<String, String> {
		let mut all = self.vcs_targets.clone();
		for (label, locator) in &self.targets {
			all.insert(label.clone(), locator.clone());
		}
		all
	}

	pub fn is_version_controlled(&self, target: &str) -> bool {
		self.vcs_targets.contains_key(target) && !self.targets.contains_key(target)
	}

	pub fn vcs_locator(&self, target: &str) -> Option<&str> {
		if self.is_version_controlled(target) {
			self.vcs_targets.get(target).map(String::as_str)
		} else {
			None
		}
	}

	/// Runtime dependency names followed by any common dependency not already listed.
	pub fn runtime_dependency_names(&self) -> Vec<&str> {
		self.runtime_dependency_entries().into_iter().map(|(name, _)| name).collect()
	}

	/// Build dependency names followed by any common dependency not already listed.
	pub fn build_dependency_names(&self) -> Vec<&str> {
		self.build_dependency_entries().into_iter().map(|(name, _)| name).collect()
	}

	/// Like [`runtime_dependency_names()`](Self::runtime_dependency_names()) paired with constraints.
	pub fn runtime_dependency_entries(&self) -> Vec<(&str, &str)> {
		merge_entries(&self.runtime_dependencies, &self.dependencies)
	}

	pub fn build_dependency_entries(&self) -> Vec<(&str, &str)> {
		merge_entries(&self.build_dependencies, &self.dependencies)
	}

	/// Every declared dependency with its constraint. Build dependencies are skipped when `runtime_only`.
	pub fn dependency_constraints(&self, runtime_only: bool) -> IndexMap<&str, &str> {
		let mut all = IndexMap::new();
		for (name, constraint) in &self.dependencies {
			all.insert(name.as_str(), constraint.as_str());
		}
		for (name, constraint) in &self.runtime_dependencies {
			all.insert(name.as_str(), constraint.as_str());
		}
		if !runtime_only {
			for (name, constraint) in &self.build_dependencies {
				all.insert(name.as_str(), constraint.as_str());
			}
		}
		all
	}

	/// A package with a single, empty VCS target has nothing to update from.
	pub fn is_updateable(&self) -> bool {
		if self.vcs_targets.len() == 1 && self.vcs_targets.values().all(|l| l.is_empty()) {
			return false;
		}
		!self.vcs_targets.is_empty()
	}

	pub fn summary(&self, category: &str) -> MetadataSummary {
		fn non_empty(s: &str) -> Option<String> {
			if s.is_empty() { None } else { Some(s.to_string()) }
		}
		MetadataSummary {
			category: category.to_string(),
			short_description: non_empty(&self.short_description),
			description: non_empty(&self.description),
			homepage: non_empty(&self.homepage),
			with_compiler: self.options.with_compiler,
		}
	}
}

fn merge_entries<'a>(first: &'a IndexMap<String, String>, common: &'a IndexMap<String, String>) -> Vec<(&'a str, &'a str)> {
	let mut entries: Vec<(&str, &str)> = first.iter().map(|(n, c)| (n.as_str(), c.as_str())).collect();
	for (name, constraint) in common {
		if !first.contains_key(name) {
			entries.push((name.as_str(), constraint.as_str()));
		}
	}
	entries
}
