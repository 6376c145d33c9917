use std::path::Path;
use std::path::PathBuf;

use serde::Deserialize;

use crate::WmlxError;
use crate::WmlxResult;

/// Default maximum file size in bytes (10 MB).
pub const DEFAULT_MAX_FILE_SIZE: u64 = 10 * 1024 * 1024;

/// Domain assumed at the top of every file until `#textdomain` says
/// otherwise.
pub const DEFAULT_DOMAIN: &str = "wesnoth";

/// Attribute keys whose values describe the enclosing tag to translators.
pub const DEFAULT_CONTEXT_KEYS: [&str; 7] = [
	"id",
	"speaker",
	"role",
	"description",
	"condition",
	"type",
	"race",
];

/// Tags whose body is code rather than WML.
pub const DEFAULT_RAW_TAGS: [&str; 1] = ["lua"];

/// Files scanned when no `include` patterns are configured.
pub const DEFAULT_INCLUDE_PATTERNS: [&str; 1] = ["**/*.cfg"];

/// Supported config file locations in discovery order (highest precedence
/// first).
pub const CONFIG_FILE_CANDIDATES: [&str; 3] = [
	"wmlxgettext.toml",
	".wmlxgettext.toml",
	".config/wmlxgettext.toml",
];

/// Configuration loaded from a `wmlxgettext.toml` file.
///
/// ```toml
/// initial_domain = "wesnoth-units"
/// warn_all = true
/// max_file_size = 1048576
/// disable_gitignore = false
///
/// [scan]
/// include = ["data/**/*.cfg"]
/// context_keys = ["id", "speaker", "role"]
/// raw_tags = ["lua"]
///
/// [exclude]
/// patterns = ["build/", "*.generated.cfg"]
/// ```
#[derive(Debug, Deserialize)]
pub struct WmlxConfig {
	/// Domain active at the start of each file.
	#[serde(default = "default_domain")]
	pub initial_domain: String,
	/// Report optional warnings such as empty translatable strings.
	#[serde(default)]
	pub warn_all: bool,
	/// What to scan and how to read it.
	#[serde(default)]
	pub scan: ScanConfig,
	/// Exclusion configuration using gitignore-style patterns.
	#[serde(default)]
	pub exclude: ExcludeConfig,
	/// Maximum file size in bytes to scan. Defaults to 10 MB.
	#[serde(default = "default_max_file_size")]
	pub max_file_size: u64,
	/// When true, `.gitignore` files are not used for filtering.
	#[serde(default)]
	pub disable_gitignore: bool,
}

impl Default for WmlxConfig {
	fn default() -> Self {
		Self {
			initial_domain: default_domain(),
			warn_all: false,
			scan: ScanConfig::default(),
			exclude: ExcludeConfig::default(),
			max_file_size: DEFAULT_MAX_FILE_SIZE,
			disable_gitignore: false,
		}
	}
}

/// The `[scan]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct ScanConfig {
	/// Glob patterns, relative to the project root, selecting files to scan.
	#[serde(default = "default_include")]
	pub include: Vec<String>,
	/// Attribute keys recorded as context for translators.
	#[serde(default = "default_context_keys")]
	pub context_keys: Vec<String>,
	/// Tags whose contents are not scanned as WML.
	#[serde(default = "default_raw_tags")]
	pub raw_tags: Vec<String>,
}

impl Default for ScanConfig {
	fn default() -> Self {
		Self {
			include: default_include(),
			context_keys: default_context_keys(),
			raw_tags: default_raw_tags(),
		}
	}
}

/// The `[exclude]` section.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ExcludeConfig {
	/// Gitignore-style patterns for files and directories to skip.
	#[serde(default)]
	pub patterns: Vec<String>,
}

fn default_domain() -> String {
	DEFAULT_DOMAIN.to_string()
}

fn default_max_file_size() -> u64 {
	DEFAULT_MAX_FILE_SIZE
}

fn default_include() -> Vec<String> {
	DEFAULT_INCLUDE_PATTERNS.iter().map(ToString::to_string).collect()
}

fn default_context_keys() -> Vec<String> {
	DEFAULT_CONTEXT_KEYS.iter().map(ToString::to_string).collect()
}

fn default_raw_tags() -> Vec<String> {
	DEFAULT_RAW_TAGS.iter().map(ToString::to_string).collect()
}

impl WmlxConfig {
	/// Resolve the config path from known discovery candidates.
	#[must_use]
	pub fn resolve_path(root: &Path) -> Option<PathBuf> {
		CONFIG_FILE_CANDIDATES
			.iter()
			.map(|candidate| root.join(candidate))
			.find(|path| path.is_file())
	}

	/// Load the config from the first discovered config file at `root`.
	/// Returns `None` if no candidate exists.
	pub fn load(root: &Path) -> WmlxResult<Option<WmlxConfig>> {
		let Some(config_path) = Self::resolve_path(root) else {
			return Ok(None);
		};

		Self::load_from(&config_path).map(Some)
	}

	/// Load the config from an explicit path.
	pub fn load_from(path: &Path) -> WmlxResult<WmlxConfig> {
		let content = std::fs::read_to_string(path)?;
		toml::from_str(&content).map_err(|e| WmlxError::ConfigParse(e.to_string()))
	}
}
