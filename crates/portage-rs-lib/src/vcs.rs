//! Version control locators used by VCS targets.
//!
//! Locators are written the way package definitions declare them:
//! - `[git]kde:strigi|branch|tag` or any `git://` / `*.git` URL.
//! - `[hg]https://...`.
//! - `:pserver:...` for CVS.
//! - `svn://`, `http(s)://` or a repository relative path such as `trunk/KDE/kdelibs` or
//!   `tags/kdesupport-for-4.4/strigi` for Subversion.

use std::sync::OnceLock;

use regex::Regex;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VcsKind {
	Git,
	Svn,
	Hg,
	Cvs,
	/// Not recognisable as any supported system, also used for empty locators.
	Unknown,
}

impl std::fmt::Display for VcsKind {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		let s = match self {
			VcsKind::Git => "git",
			VcsKind::Svn => "svn",
			VcsKind::Hg => "hg",
			VcsKind::Cvs => "cvs",
			VcsKind::Unknown => "unknown",
		};
		f.write_str(s)
	}
}

pub fn vcs_kind(locator: &str) -> VcsKind {
	let locator = locator.trim();
	if locator.is_empty() {
		VcsKind::Unknown
	} else if locator.starts_with("[git]") || locator.starts_with("git://") || locator.ends_with(".git") {
		VcsKind::Git
	} else if locator.starts_with("[hg]") {
		VcsKind::Hg
	} else if locator.contains("pserver:") {
		VcsKind::Cvs
	} else if locator.starts_with("svn:") || locator.starts_with("svn+ssh:") || locator.starts_with("http:") || locator.starts_with("https:") {
		VcsKind::Svn
	} else if !locator.contains("://") {
		VcsKind::Svn
	} else {
		VcsKind::Unknown
	}
}

/// A git locator split into its parts. Missing parts are empty.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GitLocator {
	pub url: String,
	pub branch: String,
	pub tag: String,
}

/// Splits `[git]url|branch|tag` into its parts.
pub fn split_git_locator(locator: &str) -> GitLocator {
	static PATTERN: OnceLock<Regex> = OnceLock::new();
	let pattern = PATTERN.get_or_init(|| {
		Regex::new(r"^(?:\[git\])?(?P<url>[^|]*)(?:\|(?P<branch>[^|]*))?(?:\|(?P<tag>.*))?$")
			.expect("git locator pattern is valid")
	});

	match pattern.captures(locator.trim()) {
		Some(caps) => {
			let part = |name: &str| caps.name(name).map(|m| m.as_str().to_string()).unwrap_or_default();
			GitLocator { url: part("url"), branch: part("branch"), tag: part("tag") }
		},
		None => GitLocator { url: locator.to_string(), ..Default::default() },
	}
}

/// Whether a target checked out from `locator` can change upstream and so needs re-syncing.
///
/// - Subversion tags are immutable.
/// - Git targets pinned to a tag or tracking a locally patched (`*-patched`) branch are left alone.
/// - Every other recognised system is always considered updatable.
/// - A locator of no recognised system ([`VcsKind::Unknown`], empty locators included) is never updatable,
///   it can't be synced by any supported tool.
pub fn is_locator_updatable(locator: &str) -> bool {
	match vcs_kind(locator) {
		VcsKind::Svn => !locator.starts_with("tags/") && !locator.contains("/tags/"),
		VcsKind::Git => {
			let git = split_git_locator(locator);
			git.tag.is_empty() && !git.branch.ends_with("-patched")
		},
		VcsKind::Hg | VcsKind::Cvs => true,
		VcsKind::Unknown => false,
	}
}
