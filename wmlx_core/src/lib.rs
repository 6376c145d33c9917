//! `wmlx_core` extracts translatable strings from WML, the bracketed-tag
//! configuration language, so they can be merged into gettext catalogs.
//!
//! ## Processing Pipeline
//!
//! ```text
//! File driver (discovers files, brackets each scan)
//!   → Line scanner (fallback chain of patterns per line)
//!   → String assembler (rebuilds multi-line literals, un-escapes `""`)
//!   → Tag-scope stack (nesting, context info, deferred structural errors)
//!   → Catalog (entries deduplicated per domain and text)
//! ```
//!
//! ## Modules
//!
//! - [`config`]: Configuration loading from `wmlxgettext.toml`.
//! - [`project`]: File discovery and the per-file scan loop.
//! - [`embedded`]: The hand-off boundary for code blocks inside raw tags.
//!
//! ## Key Types
//!
//! - [`Scanner`]: One scan session; reset for every file.
//! - [`Catalog`]: Domain name to [`CatalogEntry`] records.
//! - [`ScanDiagnostic`]: A warning or error with its `file:line` locator.
//! - [`WmlxConfig`]: Configuration loaded from `wmlxgettext.toml`.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::path::Path;
//!
//! use wmlx_core::project::extract_project;
//!
//! let extraction = extract_project(Path::new("data")).unwrap();
//! for diagnostic in &extraction.diagnostics {
//!     eprintln!("{diagnostic}");
//! }
//!
//! if let Some(entries) = extraction.catalog.domain("wesnoth-units") {
//!     for entry in entries.translatable() {
//!         println!("{}", entry.text);
//!     }
//! }
//! ```

pub use assembler::normalize_quotes;
pub use catalog::*;
pub use config::*;
pub use diagnostics::*;
pub use error::*;
pub use scanner::*;

mod assembler;
mod catalog;
pub mod config;
mod diagnostics;
pub mod embedded;
#[allow(unused_assignments)]
mod error;
pub mod project;
mod scanner;
mod scope;

#[cfg(test)]
mod __tests;
