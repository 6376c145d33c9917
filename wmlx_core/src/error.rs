use miette::Diagnostic;
use thiserror::Error;

use crate::ScanDiagnostic;

#[derive(Debug, Diagnostic, Error)]
#[non_exhaustive]
pub enum WmlxError {
	#[error(transparent)]
	#[diagnostic(code(wmlx::io_error))]
	Io(#[from] std::io::Error),

	#[error("failed to parse config file: {0}")]
	#[diagnostic(
		code(wmlx::config_parse),
		help("check that wmlxgettext.toml is valid TOML with [scan] and/or [exclude] sections")
	)]
	ConfigParse(String),

	#[error("{0}")]
	#[diagnostic(
		code(wmlx::structural),
		help("check that every `[tag]` is closed by a matching `[/tag]` in the same file")
	)]
	Structural(Box<ScanDiagnostic>),

	#[error("file too large: `{path}` is {size} bytes (limit: {limit} bytes)")]
	#[diagnostic(
		code(wmlx::file_too_large),
		help("increase `max_file_size` in wmlxgettext.toml or exclude this file")
	)]
	FileTooLarge { path: String, size: u64, limit: u64 },

	#[error("symlink cycle detected at: `{path}`")]
	#[diagnostic(
		code(wmlx::symlink_cycle),
		help("remove the circular symlink or exclude this path")
	)]
	SymlinkCycle { path: String },

	#[error("invalid pattern `{pattern}`: {reason}")]
	#[diagnostic(code(wmlx::invalid_pattern))]
	InvalidPattern { pattern: String, reason: String },

	#[error("no strings were extracted for domain `{0}`")]
	#[diagnostic(
		code(wmlx::unknown_domain),
		help("check the `#textdomain` directives of the scanned files or pass a different --domain")
	)]
	UnknownDomain(String),
}

pub type WmlxResult<T> = Result<T, WmlxError>;
pub type AnyError = Box<dyn std::error::Error>;
pub type AnyEmptyResult = Result<(), AnyError>;
pub type AnyResult<T> = Result<T, AnyError>;
