//! Total ordering over target version strings.

use std::cmp::Ordering;

/// A target label compared as a version, e.g. `0.7.8`, `1:2.0`, `4.4` or `gitHEAD`.
///
/// Versions are split into an optional numeric epoch (`epoch:version`) and the remaining
/// string, which is compared in alternating text and numeric runs.
#[derive(Debug, Clone, Eq)]
pub struct PackageVersion {
	epoch: u32,
	version: String,
}

impl PackageVersion {
	pub fn new(version: &str) -> Self {
		match version.split_once(':') {
			Some((epoch, rest)) if !epoch.is_empty() && epoch.chars().all(|c| c.is_ascii_digit()) => {
				PackageVersion {
					epoch: epoch.parse().unwrap_or(u32::MAX),
					version: rest.to_string(),
				}
			},
			/* Anything else is part of the version, URLs included */
			_ => PackageVersion { epoch: 0, version: version.to_string() },
		}
	}

	pub fn as_str(&self) -> &str {
		&self.version
	}
}

impl From<&str> for PackageVersion {
	fn from(value: &str) -> Self {
		Self::new(value)
	}
}

impl PartialEq for PackageVersion {
	fn eq(&self, other: &Self) -> bool {
		self.cmp(other) == Ordering::Equal
	}
}

impl std::hash::Hash for PackageVersion {
	fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
		self.epoch.hash(state);
		for run in Runs::new(&self.version) {
			match run {
				Run::Text(t) => t.hash(state),
				Run::Number(n) => n.trim_start_matches('0').hash(state),
			}
		}
	}
}

impl Ord for PackageVersion {
	fn cmp(&self, other: &Self) -> Ordering {
		match self.epoch.cmp(&other.epoch) {
			Ordering::Equal => {},
			ord => return ord,
		}

		let mut lhs = Runs::new(&self.version);
		let mut rhs = Runs::new(&other.version);
		loop {
			match (lhs.next(), rhs.next()) {
				(None, None) => return Ordering::Equal,
				/* The longer version is the newer one, `1.2` < `1.2.3` */
				(None, Some(_)) => return Ordering::Less,
				(Some(_), None) => return Ordering::Greater,
				(Some(l), Some(r)) => match l.cmp(&r) {
					Ordering::Equal => {},
					ord => return ord,
				},
			}
		}
	}
}

impl PartialOrd for PackageVersion {
	fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
		Some(self.cmp(other))
	}
}

impl std::fmt::Display for PackageVersion {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		if self.epoch == 0 {
			write!(f, "{}", self.version)
		} else {
			write!(f, "{}:{}", self.epoch, self.version)
		}
	}
}

/// Compares two version strings.
pub fn compare_versions(lhs: &str, rhs: &str) -> Ordering {
	PackageVersion::new(lhs).cmp(&PackageVersion::new(rhs))
}

#[derive(Debug, PartialEq, Eq)]
enum Run<'a> {
	Text(&'a str),
	Number(&'a str),
}

impl Ord for Run<'_> {
	fn cmp(&self, other: &Self) -> Ordering {
		match (self, other) {
			(Run::Number(l), Run::Number(r)) => {
				/* Compared without parsing so arbitrarily long numbers work */
				let l = l.trim_start_matches('0');
				let r = r.trim_start_matches('0');
				l.len().cmp(&r.len()).then_with(|| l.cmp(r))
			},
			(Run::Text(l), Run::Text(r)) => l.cmp(r),
			/* `1.0` > `v1.0` */
			(Run::Number(_), Run::Text(_)) => Ordering::Greater,
			(Run::Text(_), Run::Number(_)) => Ordering::Less,
		}
	}
}

impl PartialOrd for Run<'_> {
	fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
		Some(self.cmp(other))
	}
}

/// Splits a version into runs of digits and runs of anything else.
struct Runs<'a> {
	rest: &'a str,
}

impl<'a> Runs<'a> {
	fn new(s: &'a str) -> Self {
		Runs { rest: s }
	}
}

impl<'a> Iterator for Runs<'a> {
	type Item = Run<'a>;

	fn next(&mut self) -> Option<Self::Item> {
		let first = self.rest.chars().next()?;
		let numeric = first.is_ascii_digit();
		let split = self.rest
			.find(|c: char| c.is_ascii_digit() != numeric)
			.unwrap_or(self.rest.len());
		let (run, rest) = self.rest.split_at(split);
		self.rest = rest;
		Some(if numeric { Run::Number(run) } else { Run::Text(run) })
	}
}
