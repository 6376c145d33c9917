use std::fmt::Display;

use serde::Deserialize;
use serde::Serialize;

use crate::WmlxError;

/// How much a diagnostic affects the scan of its file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
	/// Recorded; the file keeps being scanned.
	Warning,
	/// The rest of the file was not scanned.
	Error,
}

impl Display for Severity {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			Self::Warning => write!(f, "warning"),
			Self::Error => write!(f, "error"),
		}
	}
}

/// The kind of diagnostic produced while scanning.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[non_exhaustive]
pub enum DiagnosticKind {
	/// `[/found]` closed a scope opened as `[expected]`.
	MismatchedClosingTag { expected: String, found: String },
	/// `[/found]` appeared while no tag was open.
	UnexpectedClosingTag { found: String },
	/// The file ended while `[name]` was still open.
	UnclosedTag { name: String },
	/// The file ended inside a string literal.
	UnterminatedString,
	/// The file ended inside a `<<` block of a raw tag.
	UnterminatedEmbeddedCode,
	/// `_ ""` was found.
	EmptyTranslatableString,
	/// The file could not be read.
	Io { reason: String },
}

/// A diagnostic with its `file:line` locator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanDiagnostic {
	pub file: String,
	/// 1-indexed line number.
	pub line: usize,
	pub severity: Severity,
	pub kind: DiagnosticKind,
}

impl ScanDiagnostic {
	pub fn warning(file: impl Into<String>, line: usize, kind: DiagnosticKind) -> Self {
		Self {
			file: file.into(),
			line,
			severity: Severity::Warning,
			kind,
		}
	}

	pub fn error(file: impl Into<String>, line: usize, kind: DiagnosticKind) -> Self {
		Self {
			file: file.into(),
			line,
			severity: Severity::Error,
			kind,
		}
	}

	pub fn is_error(&self) -> bool {
		self.severity == Severity::Error
	}

	/// Human-readable message for this diagnostic.
	pub fn message(&self) -> String {
		match &self.kind {
			DiagnosticKind::MismatchedClosingTag { expected, found } => {
				format!("closing tag `[/{found}]` does not match open tag `[{expected}]`")
			}
			DiagnosticKind::UnexpectedClosingTag { found } => {
				format!("closing tag `[/{found}]` has no open tag")
			}
			DiagnosticKind::UnclosedTag { name } => {
				format!("end of file reached with `[{name}]` still open")
			}
			DiagnosticKind::UnterminatedString => {
				"end of file reached inside a string literal".to_string()
			}
			DiagnosticKind::UnterminatedEmbeddedCode => {
				"end of file reached inside an embedded `<<` code block".to_string()
			}
			DiagnosticKind::EmptyTranslatableString => {
				"found an empty translatable string".to_string()
			}
			DiagnosticKind::Io { reason } => format!("cannot read file: {reason}"),
		}
	}

	/// Convert into the error raised to the caller of the scanner.
	pub(crate) fn into_error(mut self) -> WmlxError {
		self.severity = Severity::Error;
		WmlxError::Structural(Box::new(self))
	}
}

impl Display for ScanDiagnostic {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		write!(
			f,
			"{}:{}: {}: {}",
			self.file,
			self.line,
			self.severity,
			self.message()
		)
	}
}
