use std::collections::HashSet;
use std::path::Path;
use std::path::PathBuf;

use globset::Glob;
use globset::GlobSet;
use globset::GlobSetBuilder;
use ignore::gitignore::Gitignore;
use ignore::gitignore::GitignoreBuilder;
use tracing::debug;
use tracing::info;
use tracing::warn;

use crate::WmlxError;
use crate::WmlxResult;
use crate::catalog::Catalog;
use crate::config::CONFIG_FILE_CANDIDATES;
use crate::config::DEFAULT_INCLUDE_PATTERNS;
use crate::config::DEFAULT_MAX_FILE_SIZE;
use crate::config::WmlxConfig;
use crate::diagnostics::DiagnosticKind;
use crate::diagnostics::ScanDiagnostic;
use crate::scanner::Scanner;
use crate::scanner::ScannerOptions;

/// Options for discovering and scanning the files of a project.
///
/// Use [`ScanOptions::default()`] for sensible defaults or
/// [`ScanOptions::from_config`] to construct from a [`WmlxConfig`].
#[derive(Debug, Clone)]
pub struct ScanOptions {
	/// Options handed to the line scanner.
	pub scanner: ScannerOptions,
	/// Glob patterns, relative to the root, selecting files to scan.
	pub include_set: GlobSet,
	/// Gitignore-style patterns to exclude from scanning.
	pub exclude_patterns: Vec<String>,
	/// Maximum file size to scan in bytes.
	pub max_file_size: u64,
	/// Whether to disable `.gitignore` integration.
	pub disable_gitignore: bool,
}

impl Default for ScanOptions {
	fn default() -> Self {
		let include_patterns: Vec<String> =
			DEFAULT_INCLUDE_PATTERNS.iter().map(ToString::to_string).collect();

		Self {
			scanner: ScannerOptions::default(),
			include_set: build_glob_set(&include_patterns),
			exclude_patterns: Vec::new(),
			max_file_size: DEFAULT_MAX_FILE_SIZE,
			disable_gitignore: false,
		}
	}
}

impl ScanOptions {
	/// Construct [`ScanOptions`] from a [`WmlxConfig`].
	pub fn from_config(config: Option<&WmlxConfig>) -> Self {
		let Some(config) = config else {
			return Self::default();
		};

		Self {
			scanner: ScannerOptions::from_config(Some(config)),
			include_set: build_glob_set(&config.scan.include),
			exclude_patterns: config.exclude.patterns.clone(),
			max_file_size: config.max_file_size,
			disable_gitignore: config.disable_gitignore,
		}
	}
}

/// Everything a corpus run produced.
#[derive(Debug, Default)]
pub struct Extraction {
	pub catalog: Catalog,
	/// Diagnostics in file order.
	pub diagnostics: Vec<ScanDiagnostic>,
	/// File references of the scanned files, in scan order.
	pub files: Vec<String>,
}

impl Extraction {
	pub fn has_errors(&self) -> bool {
		self.diagnostics.iter().any(ScanDiagnostic::is_error)
	}
}

/// Discover and scan every matching file below `root`, using the project's
/// config file when one exists.
pub fn extract_project(root: &Path) -> WmlxResult<Extraction> {
	let config = WmlxConfig::load(root)?;
	let options = ScanOptions::from_config(config.as_ref());
	extract_project_with_options(root, &options)
}

/// Discover and scan every matching file below `root`.
pub fn extract_project_with_options(root: &Path, options: &ScanOptions) -> WmlxResult<Extraction> {
	let files = collect_files(root, options)?;
	extract_files(root, &files, options)
}

/// Scan `files` in order into one catalog. File references are reported
/// relative to `root`.
///
/// A structural error stops the scan of its file and is recorded as an
/// error diagnostic; the next file is scanned normally. Failing to read a
/// file at all is returned as an error.
pub fn extract_files(root: &Path, files: &[PathBuf], options: &ScanOptions) -> WmlxResult<Extraction> {
	let mut scanner = Scanner::new(options.scanner.clone())?;
	let mut extraction = Extraction::default();

	for (file_no, path) in files.iter().enumerate() {
		let file = relative_file_key(root, path);

		let metadata = std::fs::metadata(path)?;
		if metadata.len() > options.max_file_size {
			return Err(WmlxError::FileTooLarge {
				path: file,
				size: metadata.len(),
				limit: options.max_file_size,
			});
		}

		let raw_content = match std::fs::read_to_string(path) {
			Ok(content) => content,
			Err(error) if error.kind() == std::io::ErrorKind::InvalidData => {
				warn!(file = %file, "skipping file that is not valid UTF-8");
				extraction.diagnostics.push(ScanDiagnostic::error(
					&file,
					0,
					DiagnosticKind::Io {
						reason: error.to_string(),
					},
				));
				extraction.files.push(file);
				continue;
			}
			Err(error) => return Err(error.into()),
		};
		let content = normalize_line_endings(&raw_content);

		info!(file = %file, "extracting strings");
		let result = scanner.scan_content(&mut extraction.catalog, &file, file_no, &content);
		extraction.diagnostics.extend(scanner.take_diagnostics());

		match result {
			Ok(()) => {}
			Err(WmlxError::Structural(diagnostic)) => {
				warn!(file = %file, "stopped scanning file: {}", diagnostic.message());
				extraction.diagnostics.push(*diagnostic);
			}
			Err(error) => return Err(error),
		}

		extraction.files.push(file);
	}

	Ok(extraction)
}

/// Normalize CRLF line endings to LF.
pub fn normalize_line_endings(content: &str) -> String {
	if content.contains('\r') {
		content.replace("\r\n", "\n").replace('\r', "\n")
	} else {
		content.to_string()
	}
}

/// The reference used for `file` in locations and diagnostics.
pub fn relative_file_key(root: &Path, file: &Path) -> String {
	file.strip_prefix(root)
		.unwrap_or(file)
		.to_string_lossy()
		.replace('\\', "/")
}

/// Build a `GlobSet` from a list of glob pattern strings.
fn build_glob_set(patterns: &[String]) -> GlobSet {
	let mut builder = GlobSetBuilder::new();
	for pattern in patterns {
		match Glob::new(pattern) {
			Ok(glob) => {
				builder.add(glob);
			}
			Err(error) => warn!(pattern, "ignoring invalid include pattern: {error}"),
		}
	}
	builder.build().unwrap_or_else(|_| GlobSet::empty())
}

/// Build a `Gitignore` matcher from exclude patterns specified in
/// `wmlxgettext.toml` `[exclude]`. These follow `.gitignore` syntax and are
/// applied on top of any `.gitignore` rules.
fn build_exclude_matcher(root: &Path, patterns: &[String]) -> WmlxResult<Gitignore> {
	let mut builder = GitignoreBuilder::new(root);
	for pattern in patterns {
		builder
			.add_line(None, pattern)
			.map_err(|e| WmlxError::InvalidPattern {
				pattern: pattern.clone(),
				reason: e.to_string(),
			})?;
	}
	builder.build().map_err(|e| WmlxError::InvalidPattern {
		pattern: patterns.join(", "),
		reason: e.to_string(),
	})
}

/// Build a `Gitignore` matcher from the project's `.gitignore` file (if any).
fn build_gitignore(root: &Path) -> Gitignore {
	let mut builder = GitignoreBuilder::new(root);
	let gitignore_path = root.join(".gitignore");
	if gitignore_path.exists() {
		let _ = builder.add(gitignore_path);
	}
	builder.build().unwrap_or_else(|_| Gitignore::empty())
}

/// Collect every file below `root` matching the include set, sorted by path
/// so that the scan order is deterministic.
///
/// When `disable_gitignore` is false (the default), files matched by the
/// project's `.gitignore` are skipped. Exclude patterns always apply.
pub fn collect_files(root: &Path, options: &ScanOptions) -> WmlxResult<Vec<PathBuf>> {
	let mut files = Vec::new();
	let mut visited_dirs = HashSet::new();

	let gitignore = if options.disable_gitignore {
		Gitignore::empty()
	} else {
		build_gitignore(root)
	};
	let custom_exclude = build_exclude_matcher(root, &options.exclude_patterns)?;

	let walker = Walker {
		root,
		include_set: &options.include_set,
		gitignore: &gitignore,
		custom_exclude: &custom_exclude,
	};
	walker.walk(root, true, &mut files, &mut visited_dirs)?;

	files.sort();
	debug!(count = files.len(), "collected files");
	Ok(files)
}

fn is_ignored_directory_name(name: &str) -> bool {
	name.starts_with('.') || name == "target"
}

fn has_project_config(dir: &Path) -> bool {
	CONFIG_FILE_CANDIDATES
		.iter()
		.any(|candidate| dir.join(candidate).is_file())
}

struct Walker<'a> {
	root: &'a Path,
	include_set: &'a GlobSet,
	gitignore: &'a Gitignore,
	custom_exclude: &'a Gitignore,
}

impl Walker<'_> {
	fn walk(
		&self,
		dir: &Path,
		is_root: bool,
		files: &mut Vec<PathBuf>,
		visited_dirs: &mut HashSet<PathBuf>,
	) -> WmlxResult<()> {
		if !dir.is_dir() {
			return Ok(());
		}

		// Detect symlink cycles by tracking canonical paths.
		let canonical = dir.canonicalize().unwrap_or_else(|_| dir.to_path_buf());
		if !visited_dirs.insert(canonical) {
			return Err(WmlxError::SymlinkCycle {
				path: dir.display().to_string(),
			});
		}

		for entry in std::fs::read_dir(dir)? {
			let path = entry?.path();

			if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
				if is_ignored_directory_name(name) {
					continue;
				}
			}

			let is_dir = path.is_dir();

			if self.gitignore.matched(&path, is_dir).is_ignore()
				|| self.custom_exclude.matched(&path, is_dir).is_ignore()
			{
				continue;
			}

			if is_dir {
				// A nested config file marks a separate project.
				if !is_root && has_project_config(&path) {
					continue;
				}
				self.walk(&path, false, files, visited_dirs)?;
			} else if self.is_included(&path) {
				files.push(path);
			}
		}

		Ok(())
	}

	fn is_included(&self, path: &Path) -> bool {
		path.strip_prefix(self.root)
			.is_ok_and(|relative| self.include_set.is_match(relative))
	}
}
