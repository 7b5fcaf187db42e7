pub mod error;
pub use error::Result;
pub use error::Error;
pub use error::{ResolveError, MetadataError};

pub mod config;
pub use config::Config;

pub mod version;
pub mod vcs;

pub mod portage_tree;
pub use portage_tree::PortageTree;

pub mod metadb;
pub use metadb::MetaDB;
pub use metadb::package::{PackageInfo, PackageKey};

pub mod install_db;
pub use install_db::{InstallDb, InstalledPackages};

pub mod relationship_resolver;
