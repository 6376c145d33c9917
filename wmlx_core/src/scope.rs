use tracing::debug;

use crate::WmlxResult;
use crate::catalog::Catalog;
use crate::catalog::ContextInfo;
use crate::catalog::Sentence;
use crate::diagnostics::DiagnosticKind;
use crate::diagnostics::ScanDiagnostic;

/// One open tag, or the file-level root when `name` is empty.
#[derive(Debug, Default)]
pub(crate) struct Scope {
	pub name: String,
	/// False for raw tags whose body is not scanned as ordinary WML.
	pub auto_extract: bool,
	/// Line of the opening tag.
	pub line: usize,
	pub sentences: Vec<Sentence>,
	pub infos: Vec<ContextInfo>,
}

impl Scope {
	fn root() -> Self {
		Self {
			auto_extract: true,
			..Self::default()
		}
	}

	/// The note attached to every sentence of this scope, e.g.
	/// `[message]: speaker=Delfador`.
	fn context_note(&self) -> Option<String> {
		let infos = self
			.infos
			.iter()
			.map(ToString::to_string)
			.collect::<Vec<_>>()
			.join(", ");

		match (self.name.is_empty(), infos.is_empty()) {
			(true, true) => None,
			(true, false) => Some(infos),
			(false, true) => Some(format!("[{}]", self.name)),
			(false, false) => Some(format!("[{}]: {infos}", self.name)),
		}
	}
}

/// Tracks tag nesting for one file and files each closed scope's sentences
/// into the catalog.
#[derive(Debug)]
pub(crate) struct TagScopeStack {
	file: String,
	file_no: usize,
	root: Scope,
	stack: Vec<Scope>,
	/// First structural problem seen, raised at the next merge that has
	/// sentences to file.
	deferred: Option<ScanDiagnostic>,
}

impl Default for TagScopeStack {
	fn default() -> Self {
		Self {
			file: String::new(),
			file_no: 0,
			root: Scope::root(),
			stack: Vec::new(),
			deferred: None,
		}
	}
}

impl TagScopeStack {
	/// Drop all state of the previous file.
	pub fn new_file(&mut self, file: &str, file_no: usize) {
		*self = Self {
			file: file.to_string(),
			file_no,
			..Self::default()
		};
	}

	pub fn file(&self) -> &str {
		&self.file
	}

	pub fn depth(&self) -> usize {
		self.stack.len()
	}

	pub fn innermost(&self) -> &Scope {
		self.stack.last().unwrap_or(&self.root)
	}

	fn innermost_mut(&mut self) -> &mut Scope {
		self.stack.last_mut().unwrap_or(&mut self.root)
	}

	/// Whether the innermost scope is a raw tag.
	pub fn in_raw_scope(&self) -> bool {
		!self.innermost().auto_extract
	}

	pub fn open(&mut self, name: &str, auto_extract: bool, line: usize) {
		self.stack.push(Scope {
			name: name.to_string(),
			auto_extract,
			line,
			sentences: Vec::new(),
			infos: Vec::new(),
		});
	}

	/// Pop the innermost scope for `[/name]` and merge its sentences.
	pub fn close(&mut self, catalog: &mut Catalog, name: &str, line: usize) -> WmlxResult<()> {
		let Some(scope) = self.stack.pop() else {
			self.defer(ScanDiagnostic::error(
				&self.file,
				line,
				DiagnosticKind::UnexpectedClosingTag {
					found: name.to_string(),
				},
			));
			return Ok(());
		};

		if scope.name != name {
			self.defer(ScanDiagnostic::error(
				&self.file,
				line,
				DiagnosticKind::MismatchedClosingTag {
					expected: scope.name.clone(),
					found: name.to_string(),
				},
			));
		}

		self.merge_scope(catalog, scope)
	}

	pub fn add_sentence(&mut self, sentence: Sentence) {
		self.innermost_mut().sentences.push(sentence);
	}

	pub fn add_context_info(&mut self, info: ContextInfo) {
		self.innermost_mut().infos.push(info);
	}

	/// Force-close every open scope innermost first, then flush the root.
	/// One `UnclosedTag` warning is pushed per scope that was still open.
	pub fn end_of_file(
		&mut self,
		catalog: &mut Catalog,
		diagnostics: &mut Vec<ScanDiagnostic>,
	) -> WmlxResult<()> {
		let mut raised = None;

		while let Some(scope) = self.stack.pop() {
			diagnostics.push(ScanDiagnostic::warning(
				&self.file,
				scope.line,
				DiagnosticKind::UnclosedTag {
					name: scope.name.clone(),
				},
			));

			if let Err(error) = self.merge_scope(catalog, scope) {
				raised.get_or_insert(error);
			}
		}

		let root = std::mem::replace(&mut self.root, Scope::root());
		if let Err(error) = self.merge_scope(catalog, root) {
			raised.get_or_insert(error);
		}

		if let Some(diagnostic) = self.deferred.take() {
			raised.get_or_insert(diagnostic.into_error());
		}

		match raised {
			Some(error) => Err(error),
			None => Ok(()),
		}
	}

	fn defer(&mut self, diagnostic: ScanDiagnostic) {
		debug!(
			file = %self.file,
			line = diagnostic.line,
			"deferring structural diagnostic: {}",
			diagnostic.message()
		);
		if self.deferred.is_none() {
			self.deferred = Some(diagnostic);
		}
	}

	fn merge_scope(&mut self, catalog: &mut Catalog, scope: Scope) -> WmlxResult<()> {
		if scope.sentences.is_empty() {
			return Ok(());
		}

		let context = scope.context_note();
		for sentence in scope.sentences {
			catalog.merge(sentence, self.file_no, &self.file, context.clone());
		}

		match self.deferred.take() {
			Some(diagnostic) => Err(diagnostic.into_error()),
			None => Ok(()),
		}
	}
}
