use portage_rs::{PackageKey, PortageTree};
use portage_rs_test_utils::PortageFixture;

fn fixture() -> PortageFixture {
	PortageFixture::copy_from(concat!(env!("CARGO_MANIFEST_DIR"), "/test-data/portage")).expect("failed to copy test tree")
}

#[test]
fn dont_build_keeps_package_indexed() {
	let fixture = fixture();
	let tree = fixture.tree().expect("failed to scan tree");

	assert!(tree.is_package("net", "broken"));
	assert!(!tree.entry("net", "broken").unwrap().enabled);
	assert!(tree.entry("net", "app").unwrap().enabled);
}

#[test]
fn exclusion_lists_at_every_level() {
	let fixture = fixture();
	fixture.dont_build("", &["virtual"]).unwrap();
	fixture.dont_build("kde/pim", &["kalarm"]).unwrap();
	let tree = fixture.tree().expect("failed to scan tree");

	assert!(!tree.entry("virtual", "bin-base").unwrap().enabled);
	assert!(!tree.entry("kde", "kalarm").unwrap().enabled);
	assert!(tree.entry("kde", "pim").unwrap().enabled);
}

#[test]
fn later_roots_only_add() {
	let base = fixture();
	let overlay = PortageFixture::empty().unwrap();
	overlay.add_package("lib", "core", r#"{ "default_target": "9.9" }"#).unwrap();
	overlay.add_package("lib", "extra", r#"{ "default_target": "1.0" }"#).unwrap();

	let tree = PortageTree::scan([base.root(), overlay.root()]).expect("failed to scan tree");
	assert_eq!(tree.all_packages("lib"), Some(vec!["base", "buildtool", "core", "extra"]));
	assert_eq!(tree.entry("lib", "core").unwrap().root, base.root());
	assert_eq!(tree.package_file("lib", "extra"), overlay.root().join("lib").join("extra").join("extra.json"));
	assert_eq!(tree.package_file("lib", "core"), base.root().join("lib").join("core").join("core.json"));
}

#[test]
fn package_specs() {
	let fixture = fixture();
	let tree = fixture.tree().expect("failed to scan tree");

	assert_eq!(tree.package_categories("app", "kde").unwrap(), vec![PackageKey::new("net", "app")]);
	assert_eq!(tree.package_categories("kalarm", "kde").unwrap(), vec![PackageKey::new("kde", "kalarm")]);
	assert_eq!(tree.package_categories("kde", "kde").unwrap(), vec![PackageKey::new("kde", "pim"), PackageKey::new("kde", "kalarm")]);
	/* net/broken is in net/dont_build.txt */
	assert_eq!(tree.package_categories("net", "kde").unwrap(), vec![PackageKey::new("net", "app"), PackageKey::new("net", "client")]);
	assert_eq!(tree.resolve_subpackage("kde", "kalarm"), ("pim".to_string(), Some("kalarm".to_string())));
	assert_eq!(tree.category_of("zlib"), Some("win32libs"));
}
