//! Various helper functions for testing
//!
//! functions in this module should use results and not use any panics to avoid confusion in callers

use std::path::{Path, PathBuf};

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("IO error: {0}")]
	IO(#[from] std::io::Error),
	#[error("copy error: {0}")]
	Copy(#[from] fs_extra::error::Error),
	#[error("JSON error: {0}")]
	SerdeJSON(#[from] serde_json::Error),
	#[error("portage-rs error: {0}")]
	Portage(#[from] portage_rs::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

/// A throwaway portage root, removed when dropped.
pub struct PortageFixture {
	dir: tempfile::TempDir,
}

impl PortageFixture {
	/// Creates an empty root.
	pub fn empty() -> Result<Self> {
		Ok(Self { dir: tempfile::tempdir()? })
	}

	/// Creates a root holding a copy of the tree at `source`.
	pub fn copy_from(source: impl AsRef<Path>) -> Result<Self> {
		let fixture = Self::empty()?;
		let mut options = fs_extra::dir::CopyOptions::new();
		options.content_only = true;
		fs_extra::dir::copy(source, fixture.root(), &options)?;
		Ok(fixture)
	}

	pub fn root(&self) -> &Path {
		self.dir.path()
	}

	/// Writes `<category>/<name>/<name>.json`.
	pub fn add_package(&self, category: &str, name: &str, definition: &str) -> Result<PathBuf> {
		let dir = self.root().join(category).join(name);
		write_definition(&dir, name, definition)
	}

	/// Like [`add_package()`](Self::add_package()) from a typed definition.
	pub fn add_package_info(&self, category: &str, name: &str, info: &portage_rs::PackageInfo) -> Result<PathBuf> {
		self.add_package(category, name, &serde_json::to_string_pretty(info)?)
	}

	/// Writes `<category>/<package>/<subpackage>/<subpackage>.json`.
	pub fn add_subpackage(&self, category: &str, package: &str, subpackage: &str, definition: &str) -> Result<PathBuf> {
		let dir = self.root().join(category).join(package).join(subpackage);
		write_definition(&dir, subpackage, definition)
	}

	/// Writes a `dont_build.txt` into `relative_dir` listing `names`.
	pub fn dont_build(&self, relative_dir: impl AsRef<Path>, names: &[&str]) -> Result<()> {
		let dir = self.root().join(relative_dir);
		std::fs::create_dir_all(&dir)?;
		let mut contents = names.join("\n");
		contents.push('\n');
		std::fs::write(dir.join(portage_rs::portage_tree::DONT_BUILD_FILE), contents)?;
		Ok(())
	}

	/// Indexes the fixture as the only root.
	pub fn tree(&self) -> Result<portage_rs::PortageTree> {
		Ok(portage_rs::PortageTree::scan([self.root()])?)
	}
}

fn write_definition(dir: &Path, name: &str, definition: &str) -> Result<PathBuf> {
	std::fs::create_dir_all(dir)?;
	let path = dir.join(format!("{}.{}", name, portage_rs::portage_tree::DEFINITION_EXTENSION));
	std::fs::write(&path, definition)?;
	Ok(path)
}
