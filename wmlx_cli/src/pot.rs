//! Catalog serialization.

use wmlx_core::Catalog;
use wmlx_core::CatalogEntry;
use wmlx_core::DomainCatalog;

/// Render the translatable entries of one domain as a gettext template.
///
/// Entries are ordered by their first translatable occurrence in scan
/// order, and only translatable occurrences are cited. Override comments
/// replace the tag context notes of an entry; added comments follow either.
pub fn render_pot(domain: &str, entries: Option<&DomainCatalog>, package_version: Option<&str>) -> String {
	let mut output = render_header(domain, package_version);

	let mut entries: Vec<&CatalogEntry> = entries
		.map(|entries| entries.translatable().collect())
		.unwrap_or_default();
	entries.sort_by_cached_key(|entry| entry.translatable_locations().min().cloned());

	for entry in entries {
		output.push('\n');
		output.push_str(&render_entry(entry));
	}

	output
}

fn render_header(domain: &str, package_version: Option<&str>) -> String {
	let project = match package_version {
		Some(version) => format!("{domain} {version}"),
		None => domain.to_string(),
	};

	format!(
		"# Translation template for the {domain} text domain.\n#, fuzzy\nmsgid \"\"\nmsgstr \
		 \"\"\n\"Project-Id-Version: {}\\n\"\n\"Report-Msgid-Bugs-To: \\n\"\n\"MIME-Version: \
		 1.0\\n\"\n\"Content-Type: text/plain; charset=UTF-8\\n\"\n\"Content-Transfer-Encoding: \
		 8bit\\n\"\n",
		escape(&project)
	)
}

fn render_entry(entry: &CatalogEntry) -> String {
	let mut output = String::new();

	let notes = if entry.override_comments.is_empty() {
		&entry.contexts
	} else {
		&entry.override_comments
	};
	for segment in notes
		.iter()
		.chain(&entry.added_comments)
		.flat_map(|comment| comment.split('\n'))
	{
		output.push_str(&format!("#. {segment}\n"));
	}

	let mut locations: Vec<_> = entry.translatable_locations().collect();
	locations.sort();
	if !locations.is_empty() {
		let references = locations
			.iter()
			.map(ToString::to_string)
			.collect::<Vec<_>>()
			.join(" ");
		output.push_str(&format!("#: {references}\n"));
	}

	output.push_str(&render_msgid(&entry.text));
	output.push_str("msgstr \"\"\n");
	output
}

/// `msgid` in single-line form, or in multi-line form with one quoted
/// segment per source line when the text contains newlines.
fn render_msgid(text: &str) -> String {
	if !text.contains('\n') {
		return format!("msgid \"{}\"\n", escape(text));
	}

	let mut output = String::from("msgid \"\"\n");
	let mut lines = text.split('\n').peekable();
	while let Some(line) = lines.next() {
		let newline = if lines.peek().is_some() { "\\n" } else { "" };
		if line.is_empty() && newline.is_empty() {
			break;
		}
		output.push_str(&format!("\"{}{newline}\"\n", escape(line)));
	}
	output
}

/// Escape text for a PO string literal.
pub fn escape(text: &str) -> String {
	let mut escaped = String::with_capacity(text.len());
	for c in text.chars() {
		match c {
			'\\' => escaped.push_str("\\\\"),
			'"' => escaped.push_str("\\\""),
			'\t' => escaped.push_str("\\t"),
			'\n' => escaped.push_str("\\n"),
			_ => escaped.push(c),
		}
	}
	escaped
}

/// Render the catalog as pretty-printed JSON, optionally limited to one
/// domain.
pub fn render_json(catalog: &Catalog, domain: Option<&str>) -> serde_json::Result<String> {
	let Some(domain) = domain else {
		return serde_json::to_string_pretty(catalog);
	};

	let mut selected = serde_json::Map::new();
	if let Some(entries) = catalog.domain(domain) {
		selected.insert(domain.to_string(), serde_json::to_value(entries)?);
	}
	serde_json::to_string_pretty(&selected)
}
