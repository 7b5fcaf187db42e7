//! Resolver configuration.
//!
//! The configuration is a small JSON document. Any field left out takes its default value.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Separator used by the environment variable forms of list settings.
const LIST_SEPARATOR: char = ';';

pub const DEFAULT_CATEGORY: &str = "kde";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
	/// Portage roots in search order.
	portage_roots: Vec<PathBuf>,
	/// `category/package` strings excluded from dependency resolution.
	package_ignores: Vec<String>,
	/// Category preferred when a bare package name is found in several categories.
	default_category: String,
	data_dir: PathBuf,
}

impl Default for Config {
	fn default() -> Self {
		Self {
			portage_roots: Vec::new(),
			package_ignores: Vec::new(),
			default_category: DEFAULT_CATEGORY.to_string(),
			data_dir: {
				#[cfg(target_os = "windows")]
				let path = std::env::var("APPDATA").map(PathBuf::from).unwrap_or_else(|_| PathBuf::from("."));

				#[cfg(not(target_os = "windows"))]
				let path = if let Ok(e) = std::env::var("XDG_DATA_HOME") {
					PathBuf::from(e)
				} else if let Ok(home) = std::env::var("HOME") {
					PathBuf::from(home).join(".local/share")
				} else {
					PathBuf::from(".")
				};

				path.join("portage-rs")
			},
		}
	}
}

impl Config {
	/// Reads a config file.
	///
	/// # Errors
	/// - [`IO`](crate::Error::IO) when opening or reading from the file.
	/// - [`SerdeJSON`](crate::Error::SerdeJSON) when deserializing the file.
	pub fn load_from_disk(path: impl AsRef<Path>) -> crate::Result<Self> {
		let file = std::fs::File::open(path.as_ref())?;
		let config: Config = serde_json::from_reader(std::io::BufReader::new(file))?;
		log::debug!("Loaded config from {}", path.as_ref().display());
		Ok(config)
	}

	/// Writes the config to `path`, creating parent directories as needed.
	pub fn save_to_disk(&self, path: impl AsRef<Path>) -> crate::Result<()> {
		let path = path.as_ref();
		if let Some(parent) = path.parent() {
			std::fs::create_dir_all(parent)?;
		}
		let file = std::fs::File::create(path)?;
		serde_json::to_writer_pretty(file, self)?;
		Ok(())
	}

	/// Overrides settings from `PORTAGE_RS_ROOTS`, `PORTAGE_RS_IGNORES` and `PORTAGE_RS_DEFAULT_CATEGORY`.
	pub fn apply_environment(&mut self) {
		if let Ok(roots) = std::env::var("PORTAGE_RS_ROOTS") {
			self.portage_roots = split_list(&roots).map(PathBuf::from).collect();
		}
		if let Ok(ignores) = std::env::var("PORTAGE_RS_IGNORES") {
			self.package_ignores = split_list(&ignores).map(str::to_string).collect();
		}
		if let Ok(category) = std::env::var("PORTAGE_RS_DEFAULT_CATEGORY") {
			self.default_category = category;
		}
	}

	/// Configured roots, or `<data_dir>/portage` when none are set.
	pub fn portage_roots(&self) -> Vec<PathBuf> {
		if self.portage_roots.is_empty() {
			vec![self.data_dir.join("portage")]
		} else {
			self.portage_roots.clone()
		}
	}

	pub fn set_portage_roots(&mut self, roots: impl IntoIterator<Item = PathBuf>) {
		self.portage_roots = roots.into_iter().collect();
	}

	pub fn ignores(&self) -> HashSet<String> {
		self.package_ignores.iter().cloned().collect()
	}

	pub fn add_ignore(&mut self, key: impl Into<String>) {
		self.package_ignores.push(key.into());
	}

	pub fn default_category(&self) -> &str {
		&self.default_category
	}

	pub fn set_default_category(&mut self, category: impl Into<String>) {
		self.default_category = category.into();
	}

	pub fn data_dir(&self) -> &Path {
		&self.data_dir
	}

	pub fn set_data_dir(&mut self, data_dir: PathBuf) {
		self.data_dir = data_dir;
	}

	/// Location of the installed package database.
	pub fn install_db_path(&self) -> PathBuf {
		self.data_dir.join("installed.json")
	}
}

fn split_list(s: &str) -> impl Iterator<Item = &str> {
	s.split(LIST_SEPARATOR).map(str::trim).filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn default_root_is_under_data_dir() {
		let mut config = Config::default();
		config.set_data_dir(PathBuf::from("/tmp/portage-rs-data"));
		assert_eq!(config.portage_roots(), vec![PathBuf::from("/tmp/portage-rs-data/portage")]);
	}

	#[test]
	fn missing_fields_take_defaults() {
		let config: Config = serde_json::from_str(r#"{ "package_ignores": ["dev-util/perl"] }"#).unwrap();
		assert_eq!(config.default_category(), "kde");
		assert!(config.ignores().contains("dev-util/perl"));
	}

	#[test]
	fn round_trips_through_disk() {
		let dir = tempfile::tempdir().unwrap();
		let path = dir.path().join("nested").join("config.json");

		let mut config = Config::default();
		config.set_portage_roots(vec![PathBuf::from("/a"), PathBuf::from("/b")]);
		config.add_ignore("win32libs/zlib");
		config.save_to_disk(&path).unwrap();

		assert_eq!(Config::load_from_disk(&path).unwrap(), config);
	}

	#[test]
	fn list_settings_skip_blank_entries() {
		assert_eq!(split_list(" a/b ;; c/d;").collect::<Vec<_>>(), vec!["a/b", "c/d"]);
	}
}
