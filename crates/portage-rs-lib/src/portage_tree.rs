//! # Portage tree index
//!
//! A portage tree is a directory laid out as `<root>/<category>/<package>/[<subpackage>/]`.
//! Several roots can be merged into a single index, earlier roots taking priority when a path
//! exists in more than one of them.
//!
//! Each level may contain a `dont_build.txt` listing names at the level below which should not
//! be built by default. Excluded packages stay in the index, only their [`PackageEntry::enabled`]
//! flag is cleared.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::{Path, PathBuf};

use crate::error::ResolveError;
use crate::metadb::package::PackageKey;

/// Name of the per-directory exclusion list.
pub const DONT_BUILD_FILE: &str = "dont_build.txt";

/// Extension of package definition files.
pub const DEFINITION_EXTENSION: &str = "json";

/// Directories never treated as categories, packages or subpackages.
const IGNORED_DIRS: [&str; 5] = [".svn", "CVS", ".hg", ".git", "__pycache__"];

/// A package or subpackage found while scanning.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageEntry {
	pub category: String,
	pub package: String,
	/// Set when this entry is a subpackage nested inside `package`.
	pub subpackage: Option<String>,
	/// `false` when the category, package or subpackage is listed in a `dont_build.txt`.
	pub enabled: bool,
	/// The root this entry was first indexed from.
	pub root: PathBuf,
}

impl PackageEntry {
	/// The name the entry is addressed by inside its category.
	pub fn name(&self) -> &str {
		self.subpackage.as_deref().unwrap_or(&self.package)
	}

	pub fn key(&self) -> PackageKey {
		PackageKey::new(&self.category, self.name())
	}
}

#[derive(Debug, Default, Clone)]
pub struct PortageTree {
	categories: BTreeMap<String, Vec<PackageEntry>>,
	/// Subpackage name to the `category/package` strings owning a subpackage of that name.
	subpackages: HashMap<String, Vec<String>>,
	roots: Vec<PathBuf>,
	/// Categories contributed by each root.
	root_categories: HashMap<PathBuf, Vec<String>>,
}

impl PortageTree {
	/// Indexes every root in order.
	///
	/// Roots that do not exist are skipped.
	///
	/// # Errors
	/// - [`IO`](crate::Error::IO) when an existing directory or exclusion list can't be read.
	pub fn scan(roots: impl IntoIterator<Item = impl Into<PathBuf>>) -> crate::Result<Self> {
		let mut tree = PortageTree::default();
		for root in roots {
			tree.add_portage_dir(root)?;
		}
		log::debug!("Indexed {} categories from {} root(s)", tree.categories.len(), tree.roots.len());
		Ok(tree)
	}

	/// Adds the categories, packages and subpackages of `directory` to the index.
	pub fn add_portage_dir(&mut self, directory: impl Into<PathBuf>) -> crate::Result<()> {
		let directory = directory.into();
		if !self.roots.contains(&directory) {
			self.roots.push(directory.clone());
		}
		if !directory.is_dir() {
			log::debug!("Portage root {} does not exist, skipping", directory.display());
			return Ok(());
		}

		log::debug!("Scanning portage root {}", directory.display());

		let dont_build_categories = read_dont_build_list(&directory)?;
		let mut contributed = Vec::<String>::new();

		for category in list_subdirectories(&directory)? {
			let category_dir = directory.join(&category);
			let dont_build_packages = read_dont_build_list(&category_dir)?;
			let category_disabled = dont_build_categories.contains(&category);

			contributed.push(category.clone());
			let mut entries = self.categories.remove(&category).unwrap_or_default();

			for package in list_subdirectories(&category_dir)? {
				let package_dir = category_dir.join(&package);
				let package_disabled = category_disabled || dont_build_packages.contains(&package);

				if !entries.iter().any(|e| e.name() == package) {
					log::trace!("Indexed package {}/{}", category, package);
					entries.push(PackageEntry {
						category: category.clone(),
						package: package.clone(),
						subpackage: None,
						enabled: !package_disabled,
						root: directory.clone(),
					});
				}

				let dont_build_subpackages = read_dont_build_list(&package_dir)?;
				for subpackage in list_subdirectories(&package_dir)? {
					let owner = format!("{}/{}", category, package);
					let owners = self.subpackages.entry(subpackage.clone()).or_default();
					if !owners.contains(&owner) {
						owners.push(owner);
					}

					if !entries.iter().any(|e| e.name() == subpackage) {
						log::trace!("Indexed subpackage {}/{}/{}", category, package, subpackage);
						entries.push(PackageEntry {
							category: category.clone(),
							package: package.clone(),
							enabled: !package_disabled && !dont_build_subpackages.contains(&subpackage),
							subpackage: Some(subpackage),
							root: directory.clone(),
						});
					}
				}
			}

			self.categories.insert(category, entries);
		}

		self.root_categories.insert(directory, contributed);
		Ok(())
	}

	/* Lookups */

	pub fn roots(&self) -> &[PathBuf] {
		&self.roots
	}

	pub fn categories(&self) -> impl Iterator<Item = &str> {
		self.categories.keys().map(String::as_str)
	}

	/// Categories found in `root` during scanning, `None` if the root was never scanned.
	pub fn categories_in_root(&self, root: impl AsRef<Path>) -> Option<&[String]> {
		self.root_categories.get(root.as_ref()).map(Vec::as_slice)
	}

	pub fn is_category(&self, category: &str) -> bool {
		self.categories.contains_key(category)
	}

	pub fn is_package(&self, category: &str, name: &str) -> bool {
		self.entry(category, name).is_some()
	}

	pub fn entry(&self, category: &str, name: &str) -> Option<&PackageEntry> {
		self.categories.get(category)?.iter().find(|e| e.name() == name)
	}

	/// Every entry in every category, categories in sorted order.
	pub fn entries(&self) -> impl Iterator<Item = &PackageEntry> {
		self.categories.values().flatten()
	}

	/// Names of all packages in `category`, disabled ones included. `None` when the category is not indexed.
	pub fn all_packages(&self, category: &str) -> Option<Vec<&str>> {
		self.categories.get(category).map(|entries| entries.iter().map(PackageEntry::name).collect())
	}

	/// Names of the packages in `category` selected for default builds, leaving out those listed in a `dont_build.txt`.
	pub fn enabled_packages(&self, category: &str) -> Option<Vec<&str>> {
		self.categories
			.get(category)
			.map(|entries| entries.iter().filter(|e| e.enabled).map(PackageEntry::name).collect())
	}

	/// Splits `name` into `(package, Some(subpackage))` if it is a subpackage in `category`.
	pub fn resolve_subpackage(&self, category: &str, name: &str) -> (String, Option<String>) {
		if let Some(owners) = self.subpackages.get(name) {
			for owner in owners {
				if let Some((owner_category, package)) = owner.split_once('/') {
					if owner_category == category {
						return (package.to_string(), Some(name.to_string()));
					}
				}
			}
		}
		(name.to_string(), None)
	}

	/// The first category, in sorted order, containing `name`.
	pub fn category_of(&self, name: &str) -> Option<&str> {
		self.categories_of(name).into_iter().next()
	}

	pub fn categories_of(&self, name: &str) -> Vec<&str> {
		self.categories
			.iter()
			.filter(|(_, entries)| entries.iter().any(|e| e.name() == name))
			.map(|(category, _)| category.as_str())
			.collect()
	}

	/* Paths */

	fn fallback_root(&self) -> PathBuf {
		self.roots.first().cloned().unwrap_or_default()
	}

	/// First root in which `category` exists.
	pub fn root_for_category(&self, category: &str) -> PathBuf {
		self.roots
			.iter()
			.find(|root| root.join(category).is_dir())
			.cloned()
			.unwrap_or_else(|| self.fallback_root())
	}

	/// First root in which the package (or subpackage) directory exists.
	pub fn root_for_package(&self, category: &str, name: &str) -> PathBuf {
		let relative = self.relative_package_dir(category, name);
		self.roots
			.iter()
			.find(|root| root.join(&relative).is_dir())
			.cloned()
			.unwrap_or_else(|| self.fallback_root())
	}

	fn relative_package_dir(&self, category: &str, name: &str) -> PathBuf {
		match self.resolve_subpackage(category, name) {
			(package, Some(subpackage)) => Path::new(category).join(package).join(subpackage),
			(package, None) => Path::new(category).join(package),
		}
	}

	pub fn package_dir(&self, category: &str, name: &str) -> PathBuf {
		self.root_for_package(category, name).join(self.relative_package_dir(category, name))
	}

	/// Path of the definition file for `category/name`.
	pub fn package_file(&self, category: &str, name: &str) -> PathBuf {
		self.package_dir(category, name).join(format!("{}.{}", name, DEFINITION_EXTENSION))
	}

	/// Expands a user supplied package spec into concrete keys.
	///
	/// - `category` expands to every enabled package in the category.
	/// - `name` prefers `default_category`, then the only category containing it.
	/// - `category/name` must exist as given.
	///
	/// # Errors
	/// - [`Resolve`](crate::Error::Resolve) when the spec can't be matched to a package.
	/// - [`Parse`](crate::Error::Parse) when the spec has more than one `/`.
	pub fn package_categories(&self, spec: &str, default_category: &str) -> crate::Result<Vec<PackageKey>> {
		log::debug!("Looking up categories for {}", spec);
		let parts: Vec<&str> = spec.split('/').collect();
		match parts.as_slice() {
			[name] => {
				if let Some(packages) = self.enabled_packages(name) {
					return Ok(packages.into_iter().map(|p| PackageKey::new(*name, p)).collect());
				}
				let category = self.resolve_category(name, default_category)?;
				Ok(vec![PackageKey::new(category, *name)])
			},
			[category, name] => {
				self.check_package(category, name)?;
				Ok(vec![PackageKey::new(*category, *name)])
			},
			_ => Err(crate::Error::Parse(format!("unknown package name {}", spec))),
		}
	}

	/// Picks the category for a bare package name.
	///
	/// `default_category` wins when it contains `name`, otherwise the name must be in exactly one category.
	pub fn resolve_category(&self, name: &str, default_category: &str) -> Result<String, ResolveError> {
		if self.is_package(default_category, name) {
			return Ok(default_category.to_string());
		}
		match self.categories_of(name).as_slice() {
			[] => Err(ResolveError::EmptyCategory { package: name.to_string() }),
			[category] => Ok(category.to_string()),
			categories => Err(ResolveError::AmbiguousName {
				name: name.to_string(),
				categories: categories.iter().map(|c| c.to_string()).collect(),
			}),
		}
	}

	/// Checks `category/name` is indexed.
	pub fn check_package(&self, category: &str, name: &str) -> Result<(), ResolveError> {
		if !self.is_category(category) {
			return Err(ResolveError::UnknownCategory { category: category.to_string(), package: name.to_string() });
		}
		if !self.is_package(category, name) {
			return Err(ResolveError::UnknownPackage { category: category.to_string(), package: name.to_string() });
		}
		Ok(())
	}
}

/// Reads the `dont_build.txt` in `dir`. A missing file is an empty list.
///
/// Blank lines and lines starting with `#` are skipped.
pub fn read_dont_build_list(dir: &Path) -> crate::Result<HashSet<String>> {
	let path = dir.join(DONT_BUILD_FILE);
	if !path.is_file() {
		return Ok(HashSet::new());
	}
	let contents = std::fs::read_to_string(&path)?;
	Ok(contents
		.lines()
		.map(str::trim)
		.filter(|line| !line.is_empty() && !line.starts_with('#'))
		.map(str::to_string)
		.collect())
}

/// Names of the directories directly inside `dir`, sorted, excluding VCS and cache directories.
fn list_subdirectories(dir: &Path) -> crate::Result<Vec<String>> {
	let mut names = Vec::new();
	for entry in walkdir::WalkDir::new(dir).min_depth(1).max_depth(1).follow_links(true).sort_by_file_name() {
		let entry = match entry {
			Ok(entry) => entry,
			/* Failing to read `dir` itself is an error, a broken entry inside it is skipped */
			Err(e) if e.depth() == 0 => return Err(std::io::Error::from(e).into()),
			Err(e) => {
				log::warn!("Skipping unreadable entry in {}: {}", dir.display(), e);
				continue;
			},
		};
		if !entry.file_type().is_dir() {
			continue;
		}
		let Some(name) = entry.file_name().to_str() else {
			log::warn!("Skipping non UTF-8 directory {}", entry.path().display());
			continue;
		};
		if IGNORED_DIRS.contains(&name) {
			continue;
		}
		names.push(name.to_string());
	}
	Ok(names)
}
