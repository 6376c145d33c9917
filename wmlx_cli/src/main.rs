use std::path::Path;
use std::path::PathBuf;
use std::process;

use clap::Parser;
use owo_colors::OwoColorize;
use tracing::debug;
use tracing_subscriber::EnvFilter;
use wmlx_cli::Commands;
use wmlx_cli::OutputFormat;
use wmlx_cli::WmlxCli;
use wmlx_cli::render_json;
use wmlx_cli::render_pot;
use wmlx_core::AnyResult;
use wmlx_core::ScanDiagnostic;
use wmlx_core::Severity;
use wmlx_core::WmlxConfig;
use wmlx_core::WmlxError;
use wmlx_core::WmlxResult;
use wmlx_core::project::Extraction;
use wmlx_core::project::ScanOptions;
use wmlx_core::project::collect_files;
use wmlx_core::project::extract_files;
use wmlx_core::project::relative_file_key;

/// Environment variable holding the `tracing` filter directives.
const LOG_ENV: &str = "WMLX_LOG";

static USE_COLOR: std::sync::atomic::AtomicBool = std::sync::atomic::AtomicBool::new(true);

fn color_enabled() -> bool {
	USE_COLOR.load(std::sync::atomic::Ordering::Relaxed)
}

/// Apply ANSI color codes only when color is enabled.
macro_rules! colored {
	($text:expr,red) => {
		if color_enabled() {
			format!("{}", $text.red())
		} else {
			format!("{}", $text)
		}
	};
	($text:expr,yellow) => {
		if color_enabled() {
			format!("{}", $text.yellow())
		} else {
			format!("{}", $text)
		}
	};
	($text:expr,bold) => {
		if color_enabled() {
			format!("{}", $text.bold())
		} else {
			format!("{}", $text)
		}
	};
}

fn main() {
	let args = WmlxCli::parse();

	// Respect NO_COLOR env var, --no-color and terminals without color.
	let use_color = !args.no_color
		&& std::env::var_os("NO_COLOR").is_none()
		&& supports_color::on(supports_color::Stream::Stderr).is_some();
	if !use_color {
		USE_COLOR.store(false, std::sync::atomic::Ordering::Relaxed);
	}

	init_tracing(args.verbose, use_color);

	// Install miette's fancy handler for rich error diagnostics.
	miette::set_hook(Box::new(move |_| {
		Box::new(
			miette::MietteHandlerOpts::new()
				.color(use_color)
				.unicode(use_color)
				.build(),
		)
	}))
	.ok();

	let result = match &args.command {
		Some(Commands::Extract {
			files,
			domain,
			initial_domain,
			output,
			format,
			package_version,
			warn_all,
		}) => {
			run_extract(&args, &ExtractArgs {
				files,
				domain: domain.as_deref(),
				initial_domain: initial_domain.as_deref(),
				output: output.as_deref(),
				format: *format,
				package_version: package_version.as_deref(),
				warn_all: *warn_all,
			})
		}
		Some(Commands::Check { files }) => run_check(&args, files),
		Some(Commands::Files) => run_files(&args),
		None => {
			eprintln!("No subcommand specified. Run `wmlxgettext --help` for usage.");
			process::exit(2);
		}
	};

	match result {
		Ok(true) => {}
		Ok(false) => process::exit(1),
		Err(e) => {
			// Try to render through miette for rich diagnostics with help text
			// and error codes.
			match e.downcast::<WmlxError>() {
				Ok(wmlx_err) => {
					let report: miette::Report = (*wmlx_err).into();
					eprintln!("{report:?}");
				}
				Err(e) => {
					eprintln!("{} {e}", colored!("error:", red));
				}
			}
			process::exit(2);
		}
	}
}

/// Log to stderr, filtered by `WMLX_LOG`. `--verbose` lowers the default
/// level from `warn` to `debug`.
fn init_tracing(verbose: bool, use_color: bool) {
	let default_level = if verbose { "debug" } else { "warn" };
	let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(default_level));

	tracing_subscriber::fmt()
		.with_env_filter(filter)
		.with_writer(std::io::stderr)
		.with_ansi(use_color)
		.with_target(false)
		.try_init()
		.ok();
}

fn resolve_root(args: &WmlxCli) -> PathBuf {
	args.path
		.clone()
		.unwrap_or_else(|| std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")))
}

fn load_config(args: &WmlxCli, root: &Path) -> WmlxResult<Option<WmlxConfig>> {
	match &args.config {
		Some(path) => WmlxConfig::load_from(path).map(Some),
		None => WmlxConfig::load(root),
	}
}

fn scan_options(args: &WmlxCli, root: &Path) -> WmlxResult<ScanOptions> {
	let config = load_config(args, root)?;
	if let Some(path) = args.config.clone().or_else(|| WmlxConfig::resolve_path(root)) {
		debug!(path = %path.display(), "using config");
	}
	Ok(ScanOptions::from_config(config.as_ref()))
}

/// Scan the explicitly given files, or everything discovered below `root`.
fn scan(root: &Path, files: &[PathBuf], options: &ScanOptions) -> WmlxResult<Extraction> {
	let files = if files.is_empty() {
		collect_files(root, options)?
	} else {
		files
			.iter()
			.map(|file| {
				if file.is_relative() {
					root.join(file)
				} else {
					file.clone()
				}
			})
			.collect()
	};

	extract_files(root, &files, options)
}

fn print_diagnostics(diagnostics: &[ScanDiagnostic]) {
	for diagnostic in diagnostics {
		let severity = match diagnostic.severity {
			Severity::Warning => colored!("warning:", yellow),
			Severity::Error => colored!("error:", red),
		};
		eprintln!(
			"{}:{}: {severity} {}",
			diagnostic.file,
			diagnostic.line,
			diagnostic.message()
		);
	}
}

fn summary(extraction: &Extraction) -> String {
	let errors = extraction
		.diagnostics
		.iter()
		.filter(|diagnostic| diagnostic.is_error())
		.count();
	let warnings = extraction.diagnostics.len() - errors;

	format!(
		"Scanned {} {}: {errors} {}, {warnings} {}.",
		extraction.files.len(),
		plural(extraction.files.len(), "file", "files"),
		plural(errors, "error", "errors"),
		plural(warnings, "warning", "warnings"),
	)
}

fn plural<'a>(count: usize, one: &'a str, many: &'a str) -> &'a str {
	if count == 1 { one } else { many }
}

struct ExtractArgs<'a> {
	files: &'a [PathBuf],
	domain: Option<&'a str>,
	initial_domain: Option<&'a str>,
	output: Option<&'a Path>,
	format: OutputFormat,
	package_version: Option<&'a str>,
	warn_all: bool,
}

fn run_extract(args: &WmlxCli, extract: &ExtractArgs<'_>) -> AnyResult<bool> {
	let root = resolve_root(args);
	let mut options = scan_options(args, &root)?;
	if let Some(initial_domain) = extract.initial_domain {
		options.scanner.initial_domain = initial_domain.to_string();
	}
	options.scanner.warn_all |= extract.warn_all;

	let extraction = scan(&root, extract.files, &options)?;
	print_diagnostics(&extraction.diagnostics);

	if let Some(domain) = extract.domain {
		if extraction.catalog.domain(domain).is_none() {
			return Err(WmlxError::UnknownDomain(domain.to_string()).into());
		}
	}

	let rendered = match extract.format {
		OutputFormat::Pot => {
			let domain = extract.domain.unwrap_or(&options.scanner.initial_domain);
			render_pot(
				domain,
				extraction.catalog.domain(domain),
				extract.package_version,
			)
		}
		OutputFormat::Json => render_json(&extraction.catalog, extract.domain)?,
	};

	match extract.output {
		Some(path) => {
			std::fs::write(path, rendered)?;
			eprintln!("{}", summary(&extraction));
			eprintln!("Wrote {}", path.display());
		}
		None => {
			print!("{rendered}");
			eprintln!("{}", summary(&extraction));
		}
	}

	Ok(!extraction.has_errors())
}

fn run_check(args: &WmlxCli, files: &[PathBuf]) -> AnyResult<bool> {
	let root = resolve_root(args);
	let options = scan_options(args, &root)?;
	let extraction = scan(&root, files, &options)?;

	print_diagnostics(&extraction.diagnostics);

	if extraction.has_errors() {
		eprintln!("{}", colored!("Check failed.", bold));
		eprintln!("{}", summary(&extraction));
		return Ok(false);
	}

	println!("{}", summary(&extraction));
	Ok(true)
}

fn run_files(args: &WmlxCli) -> AnyResult<bool> {
	let root = resolve_root(args);
	let options = scan_options(args, &root)?;

	for file in collect_files(&root, &options)? {
		println!("{}", relative_file_key(&root, &file));
	}

	Ok(true)
}
