//! The line scanner: a fallback chain of anchored patterns applied to the
//! unconsumed remainder of each line.
//!
//! Every [`State`] owns one pattern. When the pattern matches, the state's
//! handler may consume a prefix of the line, update the scan session and
//! name the next state. When it does not match, the state's fallback is
//! tried on the same remainder. A line ends when a handler says so; the
//! chain always ends in [`State::EndOfLineFinal`], which matches anything.

use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;
use tracing::trace;

use crate::WmlxError;
use crate::WmlxResult;
use crate::assembler::PendingAnnotations;
use crate::assembler::PendingString;
use crate::assembler::StringAssembler;
use crate::catalog::Catalog;
use crate::catalog::ContextInfo;
use crate::config::DEFAULT_CONTEXT_KEYS;
use crate::config::DEFAULT_DOMAIN;
use crate::config::DEFAULT_RAW_TAGS;
use crate::config::WmlxConfig;
use crate::diagnostics::DiagnosticKind;
use crate::diagnostics::ScanDiagnostic;
use crate::embedded::EmbeddedGrammar;
use crate::embedded::Handoff;
use crate::embedded::OpaqueCodeBlock;
use crate::scope::TagScopeStack;

static BLANK: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\s*$").unwrap());

static DOMAIN_DIRECTIVE: LazyLock<Regex> =
	LazyLock::new(|| Regex::new(r"^\s*#textdomain\s+(\S+)").unwrap());

static PO_DIRECTIVE: LazyLock<Regex> = LazyLock::new(|| {
	Regex::new(r"^\s*#\s*(wmlxgettext|po-override|po)\s*:\s?(.*)$").unwrap()
});

static PLAIN_COMMENT: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\s*#").unwrap());

/// A tag, optionally preceded by code that neither opens a string, comment
/// or other tag nor runs into the bracket (so `$list[1]` is not a tag).
static TAG_BOUNDARY: LazyLock<Regex> = LazyLock::new(|| {
	Regex::new(r##"^(?:[^"#\[]*?[\s}\]])?\[\s*([/+-]?)\s*([A-Za-z_][A-Za-z0-9_]*)\s*\]"##).unwrap()
});

static STRING_OPEN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r##"^([^"#]*)""##).unwrap());

static EMBEDDED_MARKER: LazyLock<Regex> = LazyLock::new(|| Regex::new(r##"^[^"#]*?<<"##).unwrap());

/// Options for a [`Scanner`].
#[derive(Debug, Clone)]
pub struct ScannerOptions {
	/// Domain active at the start of every file.
	pub initial_domain: String,
	/// Attribute keys recorded as [`ContextInfo`].
	pub context_keys: Vec<String>,
	/// Tags whose body is not scanned as WML.
	pub raw_tags: Vec<String>,
	/// Report optional warnings.
	pub warn_all: bool,
}

impl Default for ScannerOptions {
	fn default() -> Self {
		Self {
			initial_domain: DEFAULT_DOMAIN.to_string(),
			context_keys: DEFAULT_CONTEXT_KEYS.iter().map(ToString::to_string).collect(),
			raw_tags: DEFAULT_RAW_TAGS.iter().map(ToString::to_string).collect(),
			warn_all: false,
		}
	}
}

impl ScannerOptions {
	pub fn from_config(config: Option<&WmlxConfig>) -> Self {
		let Some(config) = config else {
			return Self::default();
		};

		Self {
			initial_domain: config.initial_domain.clone(),
			context_keys: config.scan.context_keys.clone(),
			raw_tags: config.scan.raw_tags.clone(),
			warn_all: config.warn_all,
		}
	}
}

/// Scanner states, in fallback order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
	/// Blank remainder.
	Idle,
	/// `#textdomain name`.
	CheckDomain,
	/// `#wmlxgettext:`, `# po:` and `# po-override:`.
	CheckPoDirective,
	/// Any other comment.
	PlainComment,
	/// `[tag]`, `[+tag]`, `[-tag]` or `[/tag]`.
	TagBoundary,
	/// `key = value` for a whitelisted key.
	AttributeAssign,
	/// An opening quote, with or without the `_` marker.
	StringOpen,
	/// The rest of a literal that started on an earlier line.
	StringContinue,
	/// `<<` inside a raw tag.
	EmbeddedCodeMarker,
	/// Anything.
	EndOfLineFinal,
}

impl State {
	/// The state tried on the same remainder when this one does not match.
	pub fn fallback(self) -> State {
		match self {
			Self::Idle => Self::CheckDomain,
			Self::CheckDomain => Self::CheckPoDirective,
			Self::CheckPoDirective => Self::PlainComment,
			Self::PlainComment => Self::TagBoundary,
			Self::TagBoundary => Self::AttributeAssign,
			Self::AttributeAssign => Self::StringOpen,
			Self::StringOpen => Self::EmbeddedCodeMarker,
			Self::StringContinue => Self::StringContinue,
			Self::EmbeddedCodeMarker | Self::EndOfLineFinal => Self::EndOfLineFinal,
		}
	}
}

/// Result of running one state against the remainder.
enum Transition<'a> {
	Next(State, &'a str),
	EndLine,
}

/// One scan session. Feed it files with [`Scanner::new_file`],
/// [`Scanner::process_line`] and [`Scanner::close_file`]; everything except
/// the catalog and the collected diagnostics is reset per file.
pub struct Scanner {
	options: ScannerOptions,
	attribute: Option<Regex>,
	domain: String,
	scopes: TagScopeStack,
	assembler: StringAssembler,
	annotations: PendingAnnotations,
	/// Whitelisted key of the assignment whose quoted value is being read.
	pending_key: Option<String>,
	embedded: Box<dyn EmbeddedGrammar>,
	/// Line of the `<<` whose block currently holds control.
	embedded_line: Option<usize>,
	diagnostics: Vec<ScanDiagnostic>,
}

impl Scanner {
	pub fn new(options: ScannerOptions) -> WmlxResult<Self> {
		Self::with_embedded(options, Box::new(OpaqueCodeBlock))
	}

	/// Create a scanner that hands `<<` blocks of raw tags to `embedded`.
	pub fn with_embedded(
		options: ScannerOptions,
		embedded: Box<dyn EmbeddedGrammar>,
	) -> WmlxResult<Self> {
		let attribute = build_attribute_pattern(&options.context_keys)?;
		let domain = options.initial_domain.clone();

		Ok(Self {
			options,
			attribute,
			domain,
			scopes: TagScopeStack::default(),
			assembler: StringAssembler::default(),
			annotations: PendingAnnotations::default(),
			pending_key: None,
			embedded,
			embedded_line: None,
			diagnostics: Vec::new(),
		})
	}

	/// Reset all per-file state before scanning `file`.
	pub fn new_file(&mut self, file: &str, file_no: usize) {
		debug!(file, file_no, "scanning file");
		self.domain.clone_from(&self.options.initial_domain);
		self.scopes.new_file(file, file_no);
		self.assembler.reset();
		self.annotations.clear();
		self.pending_key = None;
		self.embedded.reset();
		self.embedded_line = None;
	}

	/// The domain that a literal opened now would belong to.
	pub fn current_domain(&self) -> &str {
		&self.domain
	}

	/// Number of tags currently open.
	pub fn depth(&self) -> usize {
		self.scopes.depth()
	}

	pub fn diagnostics(&self) -> &[ScanDiagnostic] {
		&self.diagnostics
	}

	pub fn take_diagnostics(&mut self) -> Vec<ScanDiagnostic> {
		std::mem::take(&mut self.diagnostics)
	}

	/// Scan one line. An error means a deferred structural problem was
	/// raised; the caller should stop scanning this file.
	pub fn process_line(&mut self, catalog: &mut Catalog, text: &str, line: usize) -> WmlxResult<()> {
		let text = text.trim_end_matches(['\n', '\r']);
		let mut rest = text;

		let mut state = if self.embedded_line.is_some() {
			match self.embedded.resume(text, line) {
				Handoff::Continue => return Ok(()),
				Handoff::Return(offset) => {
					self.embedded_line = None;
					rest = &text[offset..];
					State::Idle
				}
			}
		} else if self.assembler.is_open() {
			State::StringContinue
		} else {
			State::Idle
		};

		loop {
			match self.step(catalog, state, rest, line)? {
				Transition::Next(next, remaining) => {
					state = next;
					rest = remaining;
				}
				Transition::EndLine => return Ok(()),
			}
		}
	}

	/// Finish the current file: flush an unterminated literal, force-close
	/// open tags and merge everything left into `catalog`.
	pub fn close_file(&mut self, catalog: &mut Catalog) -> WmlxResult<()> {
		if let Some(pending) = self.assembler.take() {
			self.diagnostics.push(ScanDiagnostic::warning(
				self.scopes.file(),
				pending.line,
				DiagnosticKind::UnterminatedString,
			));
			self.file_string(pending);
		}

		if let Some(line) = self.embedded_line.take() {
			self.diagnostics.push(ScanDiagnostic::warning(
				self.scopes.file(),
				line,
				DiagnosticKind::UnterminatedEmbeddedCode,
			));
		}

		self.pending_key = None;
		self.annotations.clear();
		self.scopes.end_of_file(catalog, &mut self.diagnostics)
	}

	/// Drop the current file's unmerged state after an error.
	pub fn abandon_file(&mut self) {
		let file = self.scopes.file().to_string();
		debug!(file = %file, "abandoning file");
		self.new_file(&file, 0);
	}

	/// Scan a whole file. On a raised error the rest of the file is skipped
	/// and its unmerged state dropped before the error is returned.
	pub fn scan_content(
		&mut self,
		catalog: &mut Catalog,
		file: &str,
		file_no: usize,
		content: &str,
	) -> WmlxResult<()> {
		self.new_file(file, file_no);

		for (index, text) in content.lines().enumerate() {
			if let Err(error) = self.process_line(catalog, text, index + 1) {
				self.abandon_file();
				return Err(error);
			}
		}

		self.close_file(catalog)
	}

	/// The fallback for `state`, accounting for raw scopes whose bodies skip
	/// attribute and string handling.
	fn fallback(&self, state: State) -> State {
		if state == State::TagBoundary && self.scopes.in_raw_scope() {
			State::EmbeddedCodeMarker
		} else {
			state.fallback()
		}
	}

	fn step<'a>(
		&mut self,
		catalog: &mut Catalog,
		state: State,
		rest: &'a str,
		line: usize,
	) -> WmlxResult<Transition<'a>> {
		let transition = match state {
			State::Idle => self.idle(rest),
			State::CheckDomain => self.check_domain(rest, line),
			State::CheckPoDirective => self.check_po_directive(rest),
			State::PlainComment => PLAIN_COMMENT.is_match(rest).then_some(Transition::EndLine),
			State::TagBoundary => self.tag_boundary(catalog, rest, line)?,
			State::AttributeAssign => self.attribute_assign(rest),
			State::StringOpen => self.string_open(rest, line),
			State::StringContinue => Some(self.string_continue(rest, line)),
			State::EmbeddedCodeMarker => self.embedded_code_marker(rest, line),
			State::EndOfLineFinal => {
				self.flush_pending();
				Some(Transition::EndLine)
			}
		};

		match transition {
			Some(transition) => {
				trace!(line, ?state, "matched");
				Ok(transition)
			}
			None => Ok(Transition::Next(self.fallback(state), rest)),
		}
	}

	fn idle<'a>(&mut self, rest: &'a str) -> Option<Transition<'a>> {
		if !BLANK.is_match(rest) {
			return None;
		}

		self.flush_pending();
		Some(Transition::EndLine)
	}

	fn check_domain<'a>(&mut self, rest: &'a str, line: usize) -> Option<Transition<'a>> {
		let captures = DOMAIN_DIRECTIVE.captures(rest)?;
		let domain = &captures[1];
		debug!(file = %self.scopes.file(), line, domain, "switching text domain");
		self.domain = domain.to_string();

		Some(Transition::EndLine)
	}

	fn check_po_directive<'a>(&mut self, rest: &'a str) -> Option<Transition<'a>> {
		let captures = PO_DIRECTIVE.captures(rest)?;
		let body = captures.get(2).map_or("", |m| m.as_str());

		match &captures[1] {
			"wmlxgettext" => {
				let start = captures.get(2).map_or(rest.len(), |m| m.start());
				return Some(Transition::Next(State::Idle, &rest[start..]));
			}
			"po-override" => self.annotations.overrides.push(body.trim().to_string()),
			_ => self.annotations.added.push(body.trim().to_string()),
		}

		Some(Transition::EndLine)
	}

	fn tag_boundary<'a>(
		&mut self,
		catalog: &mut Catalog,
		rest: &'a str,
		line: usize,
	) -> WmlxResult<Option<Transition<'a>>> {
		let Some(captures) = TAG_BOUNDARY.captures(rest) else {
			return Ok(None);
		};
		let end = captures.get(0).map_or(0, |m| m.end());
		let name = &captures[2];

		if &captures[1] == "/" {
			debug!(line, tag = name, "closing tag");
			self.scopes.close(catalog, name, line)?;
		} else {
			debug!(line, tag = name, "opening tag");
			let auto_extract = !self.options.raw_tags.iter().any(|raw| raw == name);
			self.scopes.open(name, auto_extract, line);
			self.annotations.clear();
		}

		Ok(Some(Transition::Next(State::Idle, &rest[end..])))
	}

	fn attribute_assign<'a>(&mut self, rest: &'a str) -> Option<Transition<'a>> {
		let captures = self.attribute.as_ref()?.captures(rest)?;
		let key = captures[1].to_string();
		let value = captures.get(2)?;

		if STRING_OPEN.is_match(value.as_str()) {
			self.pending_key = Some(key);
			return Some(Transition::Next(State::StringOpen, &rest[value.start()..]));
		}

		let value = value.as_str();
		let value = value.split_once('#').map_or(value, |(before, _)| before).trim();
		self.scopes.add_context_info(ContextInfo::new(key, value));

		Some(Transition::EndLine)
	}

	fn string_open<'a>(&mut self, rest: &'a str, line: usize) -> Option<Transition<'a>> {
		let key = self.pending_key.take();
		let captures = STRING_OPEN.captures(rest)?;
		let translatable = has_translatable_marker(&captures[1]);
		let after = &rest[captures.get(0).map_or(0, |m| m.end())..];

		let domain = self.domain.clone();
		self.assembler.open(line, translatable, &domain, key);

		Some(self.string_continue(after, line))
	}

	fn string_continue<'a>(&mut self, rest: &'a str, line: usize) -> Transition<'a> {
		if !self.assembler.is_open() {
			return Transition::Next(State::Idle, rest);
		}

		match self.assembler.add_line(rest, line) {
			Some(offset) => {
				self.flush_pending();
				Transition::Next(State::Idle, &rest[offset..])
			}
			None => Transition::EndLine,
		}
	}

	fn embedded_code_marker<'a>(&mut self, rest: &'a str, line: usize) -> Option<Transition<'a>> {
		if !self.scopes.in_raw_scope() {
			return None;
		}

		let marker = EMBEDDED_MARKER.find(rest)?;
		let after = &rest[marker.end()..];
		trace!(line, "entering embedded code");

		match self.embedded.enter(after, line) {
			Handoff::Continue => {
				self.embedded_line = Some(line);
				Some(Transition::EndLine)
			}
			Handoff::Return(offset) => Some(Transition::Next(State::Idle, &after[offset..])),
		}
	}

	/// Convert the literal held by the assembler, if any, into a sentence or
	/// context info.
	fn flush_pending(&mut self) {
		if let Some(pending) = self.assembler.take() {
			self.file_string(pending);
		}
	}

	fn file_string(&mut self, pending: PendingString) {
		if !pending.translatable {
			if let Some(key) = &pending.key {
				self.scopes
					.add_context_info(ContextInfo::new(key.clone(), pending.text));
				return;
			}
		}

		let sentence = pending.store(&mut self.annotations);

		if self.options.warn_all && sentence.translatable && sentence.text.is_empty() {
			self.diagnostics.push(ScanDiagnostic::warning(
				self.scopes.file(),
				sentence.line,
				DiagnosticKind::EmptyTranslatableString,
			));
		}

		self.scopes.add_sentence(sentence);
	}
}

/// Whether the text before an opening quote ends in a standalone `_`.
fn has_translatable_marker(prefix: &str) -> bool {
	let Some(before) = prefix.trim_end().strip_suffix('_') else {
		return false;
	};

	!before
		.chars()
		.next_back()
		.is_some_and(|c| c.is_alphanumeric() || c == '_')
}

fn build_attribute_pattern(keys: &[String]) -> WmlxResult<Option<Regex>> {
	if keys.is_empty() {
		return Ok(None);
	}

	let alternatives = keys
		.iter()
		.map(|key| regex::escape(key))
		.collect::<Vec<_>>()
		.join("|");
	let pattern = format!(r"^\s*({alternatives})\s*=\s*(.*)$");

	Regex::new(&pattern)
		.map(Some)
		.map_err(|e| WmlxError::InvalidPattern {
			pattern,
			reason: e.to_string(),
		})
}
