//! Hand-off boundary for the scripting sub-language embedded in raw tags.
//!
//! When the scanner meets `<<` inside a raw tag such as `[lua]`, it stops
//! applying WML rules and hands each following line to an
//! [`EmbeddedGrammar`] until the grammar gives control back.

/// What the embedded grammar did with the text it was handed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Handoff {
	/// The embedded block continues past the end of this text.
	Continue,
	/// The embedded block ended; WML scanning resumes at this byte offset of
	/// the text that was passed in.
	Return(usize),
}

pub trait EmbeddedGrammar {
	/// Called with the remainder of the line right after the `<<` marker.
	fn enter(&mut self, rest: &str, line: usize) -> Handoff;
	/// Called with each whole line while the embedded block is open.
	fn resume(&mut self, text: &str, line: usize) -> Handoff;
	/// Forget any state when a new file begins.
	fn reset(&mut self) {}
}

/// Treats the embedded block as opaque text ending at the first `>>`.
#[derive(Debug, Default, Clone, Copy)]
pub struct OpaqueCodeBlock;

impl OpaqueCodeBlock {
	fn find_close(text: &str) -> Handoff {
		match text.find(">>") {
			Some(offset) => Handoff::Return(offset + 2),
			None => Handoff::Continue,
		}
	}
}

impl EmbeddedGrammar for OpaqueCodeBlock {
	fn enter(&mut self, rest: &str, _line: usize) -> Handoff {
		Self::find_close(rest)
	}

	fn resume(&mut self, text: &str, _line: usize) -> Handoff {
		Self::find_close(text)
	}
}
