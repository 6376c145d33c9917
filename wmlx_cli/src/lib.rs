use std::path::PathBuf;

use clap::Parser;
use clap::Subcommand;
use clap::ValueEnum;

pub use crate::pot::*;

mod pot;

#[derive(Parser)]
#[command(
	author,
	version,
	about = "Extract translatable strings from WML files into gettext templates.",
	long_about = "wmlxgettext scans WML configuration files and collects every string marked \
	              for translation with `_`, grouped by `#textdomain`.\n\nEach string keeps the \
	              file and line it came from plus the enclosing tag and its `id`, `speaker` and \
	              similar attributes, so translators know where it is shown.\n\nQuick start:\n  \
	              wmlxgettext files    List the files that would be scanned\n  wmlxgettext \
	              check    Report unbalanced tags and other problems\n  wmlxgettext extract  \
	              Write a .pot template for one text domain"
)]
pub struct WmlxCli {
	#[command(subcommand)]
	pub command: Option<Commands>,

	/// Path to the project root directory.
	#[arg(long, short, global = true)]
	pub path: Option<PathBuf>,

	/// Enable verbose output.
	#[arg(long, short, global = true, default_value_t = false)]
	pub verbose: bool,

	/// Disable colored output.
	#[arg(long, global = true, default_value_t = false)]
	pub no_color: bool,

	/// Read configuration from this file instead of discovering
	/// `wmlxgettext.toml` in the project root.
	#[arg(long, global = true)]
	pub config: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
	/// Extract translatable strings and write a catalog.
	///
	/// Scans the given files, or every file matched by the `[scan] include`
	/// patterns below the project root, and writes the strings of one text
	/// domain as a gettext template. Diagnostics are printed to stderr. Exits
	/// with a non-zero status code when a structural error was found, after
	/// the catalog has been written.
	Extract {
		/// Files to scan, relative to the project root. When omitted, files
		/// are discovered from the configuration.
		files: Vec<PathBuf>,

		/// Text domain to write. Defaults to the initial domain.
		#[arg(long, short)]
		domain: Option<String>,

		/// Domain active at the start of every file, overriding the
		/// configuration.
		#[arg(long)]
		initial_domain: Option<String>,

		/// Write the catalog to this file instead of stdout.
		#[arg(long, short)]
		output: Option<PathBuf>,

		/// Output format. `pot` writes one domain as a gettext template,
		/// `json` writes every domain with full metadata.
		#[arg(long, value_enum, default_value_t = OutputFormat::Pot)]
		format: OutputFormat,

		/// Version placed in the `Project-Id-Version` header.
		#[arg(long)]
		package_version: Option<String>,

		/// Report optional warnings such as empty translatable strings.
		#[arg(long, default_value_t = false)]
		warn_all: bool,
	},
	/// Scan files and report diagnostics without writing a catalog.
	///
	/// Exits with a non-zero status code if any file has a mismatched or
	/// unexpected closing tag. Warnings such as unclosed tags at the end of a
	/// file are printed but do not fail the check.
	Check {
		/// Files to scan, relative to the project root. When omitted, files
		/// are discovered from the configuration.
		files: Vec<PathBuf>,
	},
	/// List the files that would be scanned, in scan order.
	Files,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
	/// Gettext template for a single text domain.
	Pot,
	/// JSON object of every domain, including untranslatable strings.
	Json,
}
