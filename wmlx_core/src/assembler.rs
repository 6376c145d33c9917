use std::borrow::Cow;
use std::mem;

use logos::Logos;

use crate::catalog::Sentence;

/// Pieces of a string literal fragment. `""` is the WML escape for a literal
/// quote and wins over a lone `"` by longest match.
#[derive(Logos, Debug, PartialEq)]
enum StringPiece {
	#[token("\"\"")]
	EscapedQuote,
	#[token("\"")]
	Quote,
	#[regex(r#"[^"]+"#)]
	Text,
}

/// Collapse every `""` escape into a literal `"`. Text without escapes is
/// returned borrowed, so normalizing already-normalized text is a no-op.
pub fn normalize_quotes(text: &str) -> Cow<'_, str> {
	if text.contains("\"\"") {
		Cow::Owned(text.replace("\"\"", "\""))
	} else {
		Cow::Borrowed(text)
	}
}

/// `# po:` and `# po-override:` annotations waiting for the next sentence.
#[derive(Debug, Default, Clone)]
pub(crate) struct PendingAnnotations {
	pub added: Vec<String>,
	pub overrides: Vec<String>,
}

impl PendingAnnotations {
	pub fn clear(&mut self) {
		self.added.clear();
		self.overrides.clear();
	}
}

/// The in-flight literal while its closing quote has not been seen.
#[derive(Debug)]
pub(crate) struct PendingString {
	pub line: usize,
	pub translatable: bool,
	pub domain: String,
	/// Whitelisted attribute key the literal was assigned to.
	pub key: Option<String>,
	pub text: String,
	pub continuation_lines: Vec<usize>,
	fragments: usize,
}

impl PendingString {
	/// Finalize into a [`Sentence`], draining the pending annotations.
	pub fn store(self, annotations: &mut PendingAnnotations) -> Sentence {
		Sentence {
			text: self.text,
			translatable: self.translatable,
			multiline: !self.continuation_lines.is_empty(),
			line: self.line,
			continuation_lines: self.continuation_lines,
			domain: self.domain,
			added_comments: mem::take(&mut annotations.added),
			override_comments: mem::take(&mut annotations.overrides),
		}
	}
}

/// Reconstructs one string literal from the line fragments it spans.
#[derive(Debug, Default)]
pub(crate) struct StringAssembler {
	pending: Option<PendingString>,
}

impl StringAssembler {
	/// Begin accumulating a literal whose opening quote is on `line`.
	pub fn open(&mut self, line: usize, translatable: bool, domain: &str, key: Option<String>) {
		debug_assert!(self.pending.is_none(), "a string literal is already open");
		self.pending = Some(PendingString {
			line,
			translatable,
			domain: domain.to_string(),
			key,
			text: String::new(),
			continuation_lines: Vec::new(),
			fragments: 0,
		});
	}

	pub fn is_open(&self) -> bool {
		self.pending.is_some()
	}

	/// Byte offset of the first unescaped closing quote in `fragment`.
	pub fn is_closed(fragment: &str) -> Option<usize> {
		StringPiece::lexer(fragment)
			.spanned()
			.find(|(piece, _)| *piece == Ok(StringPiece::Quote))
			.map(|(_, span)| span.start)
	}

	/// Append `fragment`, which starts right after the opening quote or at
	/// the start of a continuation line. Returns the offset just past the
	/// closing quote when the literal ends inside `fragment`.
	pub fn add_line(&mut self, fragment: &str, line: usize) -> Option<usize> {
		let pending = self.pending.as_mut()?;

		if pending.fragments > 0 {
			pending.text.push('\n');
			pending.continuation_lines.push(line);
		}
		pending.fragments += 1;

		let close = Self::is_closed(fragment);
		let body = &fragment[..close.unwrap_or(fragment.len())];
		pending.text.push_str(&normalize_quotes(body));

		close.map(|offset| offset + 1)
	}

	/// Remove the literal from the assembler, closed or not.
	pub fn take(&mut self) -> Option<PendingString> {
		self.pending.take()
	}

	pub fn reset(&mut self) {
		self.pending = None;
	}
}
