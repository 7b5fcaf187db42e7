//! # Package definitions
//!
//! Package definitions are JSON documents stored next to the package in the portage tree,
//! see [`PortageTree::package_file()`].
//!
//! Definitions are loaded lazily and kept for the lifetime of the [`MetaDB`], so each file is
//! parsed at most once no matter how many packages depend on it.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::error::{MetadataError, MetadataErrorReason};
use crate::portage_tree::PortageTree;

pub mod package;
use package::PackageInfo;

#[derive(Debug, Default)]
pub struct MetaDB {
	packages: HashMap<PathBuf, Arc<PackageInfo>>,
}

impl MetaDB {
	pub fn new() -> Self {
		Self::default()
	}

	/// Gets the definition of `category/name`, reading it from the tree on first use.
	///
	/// Subpackages are read from their own directory inside the owning package.
	///
	/// # Errors
	/// A [`MetadataError`] when the definition file is missing or malformed. Failures are not cached.
	pub fn get_package(&mut self, tree: &PortageTree, category: &str, name: &str) -> Result<Arc<PackageInfo>, MetadataError> {
		let path = tree.package_file(category, name);
		if let Some(info) = self.packages.get(&path) {
			log::trace!("Definition cache hit for {}/{}", category, name);
			return Ok(Arc::clone(info));
		}

		log::debug!("Reading definition {}", path.display());
		let info = Arc::new(read_package_file(&path).map_err(|reason| MetadataError {
			category: category.to_string(),
			package: name.to_string(),
			reason,
		})?);
		self.packages.insert(path, Arc::clone(&info));
		Ok(info)
	}

	/// Number of definitions currently cached.
	pub fn len(&self) -> usize {
		self.packages.len()
	}

	pub fn is_empty(&self) -> bool {
		self.packages.is_empty()
	}
}

/// Reads a single definition file.
pub fn read_package_file(path: &Path) -> Result<PackageInfo, MetadataErrorReason> {
	if !path.is_file() {
		return Err(MetadataErrorReason::Missing(path.to_path_buf()));
	}
	let file = std::fs::File::open(path)?;
	Ok(serde_json::from_reader(std::io::BufReader::new(file))?)
}
