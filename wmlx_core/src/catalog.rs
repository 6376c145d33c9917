use std::collections::BTreeMap;
use std::fmt::Display;

use derive_more::Deref;
use derive_more::DerefMut;
use indexmap::IndexMap;
use serde::Deserialize;
use serde::Serialize;

/// A whitelisted `key=value` attribute recorded inside a tag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContextInfo {
	pub key: String,
	pub value: String,
}

impl ContextInfo {
	pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
		Self {
			key: key.into(),
			value: value.into(),
		}
	}
}

impl Display for ContextInfo {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		write!(f, "{}={}", self.key, self.value)
	}
}

/// One string literal as it appears in the source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sentence {
	/// Literal text with `""` escapes already collapsed.
	pub text: String,
	/// Whether the literal carried the `_` marker.
	pub translatable: bool,
	/// Whether the literal spanned more than one line.
	pub multiline: bool,
	/// 1-indexed line of the opening quote.
	pub line: usize,
	/// Lines the literal continued onto, in order.
	pub continuation_lines: Vec<usize>,
	/// Domain active when the opening quote was seen.
	pub domain: String,
	/// `# po:` annotations pending when the literal was stored.
	pub added_comments: Vec<String>,
	/// `# po-override:` annotations pending when the literal was stored.
	pub override_comments: Vec<String>,
}

/// A source reference for a catalog entry.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Location {
	/// Position of the file in the driver's scan order.
	pub file_no: usize,
	/// File path as reported to translators.
	pub file: String,
	/// 1-indexed line number.
	pub line: usize,
	/// Further lines a multi-line literal spanned at this occurrence.
	#[serde(default, skip_serializing_if = "Vec::is_empty")]
	pub continuation_lines: Vec<usize>,
	/// Whether this occurrence carried the `_` marker.
	pub translatable: bool,
}

impl Display for Location {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		write!(f, "{}:{}", self.file, self.line)
	}
}

/// The deduplicated record for one sentence text within one domain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogEntry {
	pub text: String,
	pub translatable: bool,
	/// Whether any occurrence spanned more than one line.
	pub multiline: bool,
	/// Every occurrence of the text, in merge order, without duplicates.
	pub locations: Vec<Location>,
	/// Tag context notes such as `[unit]: id=Wolf`.
	pub contexts: Vec<String>,
	pub added_comments: Vec<String>,
	pub override_comments: Vec<String>,
}

impl CatalogEntry {
	fn new(text: String) -> Self {
		Self {
			text,
			translatable: false,
			multiline: false,
			locations: Vec::new(),
			contexts: Vec::new(),
			added_comments: Vec::new(),
			override_comments: Vec::new(),
		}
	}

	/// Occurrences that carried the `_` marker.
	pub fn translatable_locations(&self) -> impl Iterator<Item = &Location> {
		self.locations.iter().filter(|location| location.translatable)
	}

	/// Merge another occurrence of the same text into this entry.
	fn absorb(&mut self, other: CatalogEntry) {
		self.translatable |= other.translatable;
		self.multiline |= other.multiline;
		extend_unique(&mut self.locations, other.locations);
		extend_unique(&mut self.contexts, other.contexts);
		extend_unique(&mut self.added_comments, other.added_comments);
		extend_unique(&mut self.override_comments, other.override_comments);
	}
}

fn extend_unique<T: PartialEq>(target: &mut Vec<T>, items: impl IntoIterator<Item = T>) {
	for item in items {
		if !target.contains(&item) {
			target.push(item);
		}
	}
}

/// Entries of a single domain keyed by normalized text, in first-seen order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, Deref, DerefMut)]
#[serde(transparent)]
pub struct DomainCatalog(
	#[deref]
	#[deref_mut]
	IndexMap<String, CatalogEntry>,
);

impl DomainCatalog {
	/// Iterate only the entries that carry the translatable marker.
	pub fn translatable(&self) -> impl Iterator<Item = &CatalogEntry> {
		self.0.values().filter(|entry| entry.translatable)
	}
}

/// The extraction result: domain name to its entries.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Catalog {
	domains: BTreeMap<String, DomainCatalog>,
}

impl Catalog {
	pub fn new() -> Self {
		Self::default()
	}

	/// File a sentence found in `file` under `(sentence.domain,
	/// sentence.text)`, merging with any earlier occurrence of the exact same
	/// text.
	pub fn merge(&mut self, sentence: Sentence, file_no: usize, file: &str, context: Option<String>) {
		let Sentence {
			text,
			translatable,
			multiline,
			line,
			continuation_lines,
			domain,
			added_comments,
			override_comments,
		} = sentence;

		let location = Location {
			file_no,
			file: file.to_string(),
			line,
			continuation_lines,
			translatable,
		};
		let entry = CatalogEntry {
			text: text.clone(),
			translatable,
			multiline,
			locations: vec![location],
			contexts: context.into_iter().collect(),
			added_comments,
			override_comments,
		};

		self.insert_entry(domain, entry);
	}

	fn insert_entry(&mut self, domain: String, entry: CatalogEntry) {
		self.domains
			.entry(domain)
			.or_default()
			.entry(entry.text.clone())
			.or_insert_with(|| CatalogEntry::new(entry.text.clone()))
			.absorb(entry);
	}

	/// Merge every entry of `other` into this catalog. The result does not
	/// depend on which catalog absorbs which, apart from entry order.
	pub fn absorb(&mut self, other: Catalog) {
		for (domain, entries) in other.domains {
			for (_, entry) in entries.0 {
				self.insert_entry(domain.clone(), entry);
			}
		}
	}

	pub fn domain(&self, name: &str) -> Option<&DomainCatalog> {
		self.domains.get(name)
	}

	pub fn get(&self, domain: &str, text: &str) -> Option<&CatalogEntry> {
		self.domains.get(domain).and_then(|entries| entries.get(text))
	}

	/// Names of every domain that received at least one sentence.
	pub fn domain_names(&self) -> impl Iterator<Item = &str> {
		self.domains.keys().map(String::as_str)
	}

	pub fn domains(&self) -> impl Iterator<Item = (&str, &DomainCatalog)> {
		self.domains.iter().map(|(name, entries)| (name.as_str(), entries))
	}

	pub fn is_empty(&self) -> bool {
		self.domains.values().all(|entries| entries.is_empty())
	}

	/// Total number of entries across all domains.
	pub fn len(&self) -> usize {
		self.domains.values().map(|entries| entries.len()).sum()
	}
}
