use portage_rs::relationship_resolver::*;
use portage_rs::{Config, InstallDb, PortageTree};

fn main() {
	let mut opts;

	/* Parse console input */
	let parsed_options = {
		let args: Vec<String> = std::env::args().collect();

		opts = getopts::Options::new();
		opts.optflag( "h", "help",       "Show help");
		opts.optflag( "v", "verbose",    "Increased vebosity");
		opts.optopt(  "c", "config",     "Config file to use", "FILE");
		opts.optopt(  "t", "type",       "Dependencies to follow for deps: runtime, buildtime or both", "TYPE");
		opts.optopt(  "d", "depth",      "Maximum dependency depth for deps", "N");
		opts.parsing_style(getopts::ParsingStyle::FloatingFrees);

		let parsed_options = match opts.parse(&args[1..]) {
			Ok(m)  => { m }
			Err(e) => { println!("Unable to parse options: {}", e); return }
		};

		if parsed_options.opt_present("h") {
			eprintln!("{}", opts.usage("Usage: portage-rs [options] (deps|targets|updatable|installables) [package...]"));
			return;
		}

		parsed_options
	};

	let mut logger = env_logger::Builder::from_default_env();
	if parsed_options.opt_present("v") {
		logger.filter_level(log::LevelFilter::Debug);
	}
	logger.init();

	let mut config = match parsed_options.opt_str("c") {
		Some(path) => match Config::load_from_disk(&path) {
			Ok(config) => config,
			Err(e) => { log::error!("Failed to read config file {}: {}", path, e); return },
		},
		None => Config::default(),
	};
	config.apply_environment();

	if let Err(e) = run(&config, &parsed_options) {
		log::error!("{}", e);
		std::process::exit(1);
	}
}

fn run(config: &Config, options: &getopts::Matches) -> Result<(), Error> {
	let Some(command) = options.free.first() else {
		return Err(Error::MissingArgument("command"));
	};
	let packages = &options.free[1..];

	let tree = PortageTree::scan(config.portage_roots())?;
	let installed = InstallDb::load_from_disk(config.install_db_path())?;
	let mut resolver = ResolverBuilder::new(&tree)
		.installed(&installed)
		.config(config)
		.build();

	match command.as_str() {
		"deps" => {
			let dep_type = match options.opt_str("t") {
				Some(t) => t.parse()?,
				None => DependencyType::Both,
			};
			let max_depth = match options.opt_str("d") {
				Some(d) => Some(d.parse::<usize>().map_err(|_| Error::InvalidArgument("depth", d))?),
				None => None,
			};
			if packages.is_empty() {
				return Err(Error::MissingArgument("package"));
			}

			let mut plan = BuildPlan::new(dep_type, max_depth);
			for spec in packages {
				for key in tree.package_categories(spec, config.default_category())? {
					plan.add_package(&mut resolver, Some(key.category.as_str()), &key.name, None)?;
				}
			}
			for package in plan.build_order() {
				println!("{}/{}-{}", package.category, package.name, package.version);
			}
		},
		"targets" => {
			for spec in packages {
				for key in tree.package_categories(spec, config.default_category())? {
					let default = resolver.default_target(&key.category, &key.name)?;
					let mut labels: Vec<String> = resolver.all_targets(&key.category, &key.name)?.into_keys().collect();
					labels.sort();
					println!("{}:", key);
					for label in labels {
						let marker = if default.as_deref() == Some(label.as_str()) { "*" } else { " " };
						println!("{} {}", marker, label);
					}
				}
			}
		},
		"updatable" => {
			for spec in packages {
				for key in tree.package_categories(spec, config.default_category())? {
					for target in resolver.updatable_targets(&key.category, &key.name)? {
						println!("{} {}", key, target);
					}
				}
			}
		},
		"installables" => {
			println!("{:<20} {:<30} {}", "Category", "Package", "Version");
			for package in resolver.installables() {
				println!("{:<20} {:<30} {}", package.category, package.name, package.version);
			}
		},
		_ => return Err(Error::UnknownCommand(command.clone())),
	}

	Ok(())
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("portage-rs error: {0}")]
	PortageRs(#[from] portage_rs::Error),
	#[error("missing argument: {0}")]
	MissingArgument(&'static str),
	#[error("invalid {0}: {1}")]
	InvalidArgument(&'static str, String),
	#[error("unknown command {0}")]
	UnknownCommand(String),
}
