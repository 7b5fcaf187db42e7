//! Library error type.

pub type Result<T> = std::result::Result<T, Error>;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
	#[error("IO error: {0}")]
	IO(#[from] std::io::Error),
	#[error("JSON error: {0}")]
	SerdeJSON(#[from] serde_json::Error),
	#[error("parsing error: {0}")]
	Parse(String),
	#[error("resolve error: {0}")]
	Resolve(#[from] ResolveError),
	#[error("metadata error: {0}")]
	Metadata(#[from] MetadataError),
}

/// Failures looking a name up in the [`PortageTree`](crate::PortageTree).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolveError {
	#[error("could not find category {category} for package {package}")]
	UnknownCategory { category: String, package: String },
	#[error("could not find package {package} in category {category}")]
	UnknownPackage { category: String, package: String },
	/// A bare package name exists in several categories and none of them is the default.
	#[error("package name {name} is ambiguous, found in {categories:?}")]
	AmbiguousName { name: String, categories: Vec<String> },
	/// A bare package name that no category contains.
	#[error("no category contains package {package}")]
	EmptyCategory { package: String },
	/// The package is indexed but neither its definition nor the install database gives a version.
	#[error("package {category}/{package} has no target to build")]
	NoTarget { category: String, package: String },
}

impl ResolveError {
	/// The `category/package` pair the error refers to, when there is one.
	pub fn key(&self) -> Option<String> {
		match self {
			ResolveError::UnknownCategory { category, package }
			| ResolveError::UnknownPackage { category, package }
			| ResolveError::NoTarget { category, package } => Some(format!("{}/{}", category, package)),
			ResolveError::AmbiguousName { .. } | ResolveError::EmptyCategory { .. } => None,
		}
	}
}

/// A package definition that could not be loaded.
#[derive(Debug, Error)]
#[error("failed to load definition of {category}/{package}: {reason}")]
pub struct MetadataError {
	pub category: String,
	pub package: String,
	pub reason: MetadataErrorReason,
}

#[derive(Debug, Error)]
pub enum MetadataErrorReason {
	#[error("definition file {0} not found")]
	Missing(std::path::PathBuf),
	#[error("IO error: {0}")]
	IO(#[from] std::io::Error),
	#[error("malformed definition: {0}")]
	Malformed(#[from] serde_json::Error),
}
