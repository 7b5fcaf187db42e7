use std::collections::HashSet;

use super::Resolver;
use crate::config::{Config, DEFAULT_CATEGORY};
use crate::install_db::{InstalledPackages, NothingInstalled};
use crate::portage_tree::PortageTree;

static NOTHING_INSTALLED: NothingInstalled = NothingInstalled;

pub struct ResolverBuilder<'tree> {
	tree: &'tree PortageTree,
	installed: &'tree dyn InstalledPackages,
	ignores: HashSet<String>,
	default_category: String,
}

impl<'tree> ResolverBuilder<'tree> {
	pub fn new(tree: &'tree PortageTree) -> Self {
		Self {
			tree,
			installed: &NOTHING_INSTALLED,
			ignores: Default::default(),
			default_category: DEFAULT_CATEGORY.to_string(),
		}
	}

	/// Versions already installed, which take part in picking the newest version.
	pub fn installed(mut self, installed: &'tree dyn InstalledPackages) -> Self {
		self.installed = installed;
		self
	}

	/// Adds `category/name` strings to leave out of closures.
	pub fn ignores(mut self, ignores: impl IntoIterator<Item = impl Into<String>>) -> Self {
		self.ignores.extend(ignores.into_iter().map(Into::into));
		self
	}

	pub fn default_category(mut self, category: impl Into<String>) -> Self {
		self.default_category = category.into();
		self
	}

	/// Takes the ignore list and default category from `config`.
	pub fn config(self, config: &Config) -> Self {
		self.ignores(config.ignores()).default_category(config.default_category())
	}

	pub fn build(self) -> Resolver<'tree> {
		log::debug!("Building resolver with {} ignored package(s)", self.ignores.len());
		Resolver::new(self.tree, self.installed, self.ignores, self.default_category)
	}
}
