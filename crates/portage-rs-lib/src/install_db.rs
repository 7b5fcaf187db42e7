//! Record of packages installed on the system.

use std::path::Path;

use serde::{Deserialize, Serialize};

/// Source of the versions currently installed for a package.
pub trait InstalledPackages {
	fn installed_versions(&self, category: &str, package: &str) -> Vec<String>;
}

/// For a system where nothing has been installed yet.
#[derive(Debug, Default, Clone, Copy)]
pub struct NothingInstalled;

impl InstalledPackages for NothingInstalled {
	fn installed_versions(&self, _category: &str, _package: &str) -> Vec<String> {
		Vec::new()
	}
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstalledPackage {
	pub category: String,
	pub package: String,
	pub version: String,
}

/// An install database stored as a JSON file.
///
/// Changes are only persisted by [`save_to_disk()`](InstallDb::save_to_disk()).
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct InstallDb {
	installed: Vec<InstalledPackage>,
}

impl InstallDb {
	/// Loads the database at `path`. A missing file is an empty database.
	///
	/// # Errors
	/// - [`IO`](crate::Error::IO) when reading the file.
	/// - [`SerdeJSON`](crate::Error::SerdeJSON) when deserializing the file.
	pub fn load_from_disk(path: impl AsRef<Path>) -> crate::Result<Self> {
		let path = path.as_ref();
		if !path.exists() {
			log::debug!("No install database at {}, starting empty", path.display());
			return Ok(Self::default());
		}
		let file = std::fs::File::open(path)?;
		Ok(serde_json::from_reader(std::io::BufReader::new(file))?)
	}

	pub fn save_to_disk(&self, path: impl AsRef<Path>) -> crate::Result<()> {
		let path = path.as_ref();
		if let Some(parent) = path.parent() {
			std::fs::create_dir_all(parent)?;
		}
		let file = std::fs::File::create(path)?;
		serde_json::to_writer_pretty(file, self)?;
		Ok(())
	}

	/// Records `version` of `category/package` as installed. Recording the same version twice has no effect.
	pub fn add_installed(&mut self, category: &str, package: &str, version: &str) {
		if self.is_installed(category, package, Some(version)) {
			return;
		}
		log::trace!("Marking {}/{}-{} installed", category, package, version);
		self.installed.push(InstalledPackage {
			category: category.to_string(),
			package: package.to_string(),
			version: version.to_string(),
		});
	}

	/// Removes a version of a package, or every version when `version` is `None`.
	pub fn remove_installed(&mut self, category: &str, package: &str, version: Option<&str>) {
		log::trace!("Removing {}/{} from install database", category, package);
		self.installed.retain(|p| !Self::matches(p, category, package, version));
	}

	pub fn is_installed(&self, category: &str, package: &str, version: Option<&str>) -> bool {
		self.installed.iter().any(|p| Self::matches(p, category, package, version))
	}

	pub fn installed(&self) -> &[InstalledPackage] {
		&self.installed
	}

	fn matches(p: &InstalledPackage, category: &str, package: &str, version: Option<&str>) -> bool {
		p.category == category && p.package == package && version.map_or(true, |v| p.version == v)
	}
}

impl InstalledPackages for InstallDb {
	fn installed_versions(&self, category: &str, package: &str) -> Vec<String> {
		self.installed
			.iter()
			.filter(|p| p.category == category && p.package == package)
			.map(|p| p.version.clone())
			.collect()
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn tracks_versions() {
		let mut db = InstallDb::default();
		db.add_installed("win32libs", "zlib", "1.2.5");
		db.add_installed("win32libs", "zlib", "1.2.8");
		db.add_installed("win32libs", "zlib", "1.2.8");
		assert_eq!(db.installed_versions("win32libs", "zlib"), vec!["1.2.5", "1.2.8"]);

		db.remove_installed("win32libs", "zlib", Some("1.2.5"));
		assert_eq!(db.installed_versions("win32libs", "zlib"), vec!["1.2.8"]);
		db.remove_installed("win32libs", "zlib", None);
		assert!(!db.is_installed("win32libs", "zlib", None));
	}

	#[test]
	fn persists() {
		let dir = tempfile::tempdir().unwrap();
		let path = dir.path().join("db").join("installed.json");
		assert!(InstallDb::load_from_disk(&path).unwrap().installed().is_empty());

		let mut db = InstallDb::default();
		db.add_installed("libs", "qtbase", "5.9.1");
		db.save_to_disk(&path).unwrap();

		let loaded = InstallDb::load_from_disk(&path).unwrap();
		assert!(loaded.is_installed("libs", "qtbase", Some("5.9.1")));
	}
}
