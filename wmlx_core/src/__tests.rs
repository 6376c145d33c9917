use std::borrow::Cow;
use std::path::Path;

use rstest::rstest;
use similar_asserts::assert_eq;
use tracing_test::traced_test;

use super::*;
use crate::embedded::EmbeddedGrammar;
use crate::embedded::Handoff;
use crate::project::ScanOptions;
use crate::project::collect_files;
use crate::project::extract_project;
use crate::project::extract_project_with_options;

const FILE: &str = "test.cfg";

struct Scan {
	catalog: Catalog,
	diagnostics: Vec<ScanDiagnostic>,
	result: WmlxResult<()>,
}

fn scan_with(input: &str, options: ScannerOptions) -> Scan {
	let mut scanner = Scanner::new(options).expect("default patterns compile");
	let mut catalog = Catalog::new();
	let result = scanner.scan_content(&mut catalog, FILE, 0, input);

	Scan {
		catalog,
		diagnostics: scanner.take_diagnostics(),
		result,
	}
}

fn scan(input: &str) -> Scan {
	scan_with(input, ScannerOptions::default())
}

fn entry<'a>(catalog: &'a Catalog, text: &str) -> &'a CatalogEntry {
	catalog
		.get(DEFAULT_DOMAIN, text)
		.unwrap_or_else(|| panic!("no entry for {text:?} in {catalog:#?}"))
}

/// A single-line translatable occurrence.
fn location(file_no: usize, file: &str, line: usize) -> Location {
	Location {
		file_no,
		file: file.to_string(),
		line,
		continuation_lines: vec![],
		translatable: true,
	}
}

fn structural_kind(result: WmlxResult<()>) -> DiagnosticKind {
	match result {
		Err(WmlxError::Structural(diagnostic)) => {
			assert_eq!(diagnostic.severity, Severity::Error);
			diagnostic.kind
		}
		other => panic!("expected a structural error, got {other:?}"),
	}
}

#[test]
fn description_of_unit_is_extracted_with_context() {
	let scan = scan("[unit]\nid=Wolf\ndescription= _\"A fierce beast\"\n[/unit]\n");

	assert!(scan.result.is_ok());
	assert!(scan.diagnostics.is_empty());

	let entry = entry(&scan.catalog, "A fierce beast");
	assert!(entry.translatable);
	assert_eq!(entry.locations, vec![location(0, FILE, 3)]);
	assert_eq!(entry.contexts, vec!["[unit]: id=Wolf".to_string()]);
	assert_eq!(scan.catalog.len(), 1);
}

#[test]
fn unclosed_tag_still_flushes_multiline_string() {
	let scan = scan("[unit]\nname=\"Multi\nline\"\n");

	assert!(scan.result.is_ok());
	assert_eq!(
		scan.diagnostics,
		vec![ScanDiagnostic::warning(
			FILE,
			1,
			DiagnosticKind::UnclosedTag {
				name: "unit".to_string()
			}
		)]
	);

	let entry = entry(&scan.catalog, "Multi\nline");
	assert!(!entry.translatable);
	assert!(entry.multiline);
	assert_eq!(entry.locations, vec![Location {
		continuation_lines: vec![3],
		translatable: false,
		..location(0, FILE, 2)
	}]);
}

#[test]
fn identical_strings_in_two_files_share_one_entry() -> WmlxResult<()> {
	let mut scanner = Scanner::new(ScannerOptions::default())?;
	let mut catalog = Catalog::new();

	scanner.scan_content(&mut catalog, "a.cfg", 0, "[unit]\nname= _ \"Bat\"\n[/unit]\n")?;
	scanner.scan_content(&mut catalog, "b.cfg", 1, "\n[unit]\n\nname= _ \"Bat\"\n[/unit]\n")?;

	let entry = entry(&catalog, "Bat");
	assert_eq!(
		entry.locations,
		vec![location(0, "a.cfg", 2), location(1, "b.cfg", 4)]
	);
	assert_eq!(catalog.domain(DEFAULT_DOMAIN).map(|d| d.len()), Some(1));

	Ok(())
}

#[test]
fn merging_the_same_text_twice_keeps_one_entry() {
	let scan = scan("name=_\"Hello\"\n[message]\nmessage=_\"Hello\"\n[/message]\n");

	assert_eq!(scan.catalog.len(), 1);
	let entry = entry(&scan.catalog, "Hello");
	assert_eq!(
		entry.locations,
		vec![location(0, FILE, 3), location(0, FILE, 1)]
	);
	assert_eq!(entry.contexts, vec!["[message]".to_string()]);
}

#[test]
fn context_info_does_not_leak_past_its_tag() {
	let scan = scan("[side]\nid=player\n[/side]\nname=_\"Outside\"\n");

	assert!(entry(&scan.catalog, "Outside").contexts.is_empty());
}

#[test]
fn nested_scope_starts_without_context_info() {
	let scan = scan(
		"[scenario]\nid=intro\n[message]\nmessage=_\"Inner\"\n[/message]\nname=_\"Outer\"\n[/\
		 scenario]\n",
	);

	assert_eq!(entry(&scan.catalog, "Inner").contexts, vec![
		"[message]".to_string()
	]);
	assert_eq!(entry(&scan.catalog, "Outer").contexts, vec![
		"[scenario]: id=intro".to_string()
	]);
}

#[test]
fn context_info_after_the_sentence_is_attached() {
	let scan = scan("[message]\nmessage= _ \"Hello there\"\nspeaker=Delfador\n[/message]\n");

	assert_eq!(entry(&scan.catalog, "Hello there").contexts, vec![
		"[message]: speaker=Delfador".to_string()
	]);
}

#[test]
fn quoted_context_value_becomes_context_info() {
	let scan = scan("[unit]\nid=\"Wolf Rider\" # the id\nname= _ \"Wolf Rider\"\n[/unit]\n");

	let entry = entry(&scan.catalog, "Wolf Rider");
	assert!(entry.translatable);
	assert_eq!(entry.contexts, vec!["[unit]: id=Wolf Rider".to_string()]);
	assert_eq!(entry.locations.len(), 1);
}

#[test]
fn unquoted_context_value_drops_trailing_comment() {
	let scan = scan("[unit]\ntype=Elvish Archer # level 1\nname=_\"Archer\"\n[/unit]\n");

	assert_eq!(entry(&scan.catalog, "Archer").contexts, vec![
		"[unit]: type=Elvish Archer".to_string()
	]);
}

#[test]
fn sentence_keeps_domain_of_its_opening_line() {
	let scan = scan(
		"#textdomain wesnoth-lib\nname=_\"first\n#textdomain wesnoth-help\nsecond\"\n#textdomain \
		 wesnoth-help\nname=_\"third\"\n",
	);

	let catalog = &scan.catalog;
	let first = catalog
		.get("wesnoth-lib", "first\n#textdomain wesnoth-help\nsecond")
		.expect("multi-line entry");
	assert!(first.translatable);
	assert!(catalog.get("wesnoth-help", "third").is_some());
	assert!(catalog.get("wesnoth-lib", "third").is_none());
	assert_eq!(
		catalog.domain_names().collect::<Vec<_>>(),
		vec!["wesnoth-help", "wesnoth-lib"]
	);
}

#[test]
fn domain_resets_for_every_file() -> WmlxResult<()> {
	let mut scanner = Scanner::new(ScannerOptions::default())?;
	let mut catalog = Catalog::new();

	scanner.scan_content(&mut catalog, "a.cfg", 0, "#textdomain wesnoth-lib\n")?;
	assert_eq!(scanner.current_domain(), "wesnoth-lib");
	scanner.scan_content(&mut catalog, "b.cfg", 1, "name=_\"Default\"\n")?;

	assert!(catalog.get(DEFAULT_DOMAIN, "Default").is_some());

	Ok(())
}

#[rstest]
#[case::escaped_quotes("name=_\"say \"\"hi\"\"\"\n", "say \"hi\"")]
#[case::escape_at_start("name=_\"\"\"quoted\"\" word\"\n", "\"quoted\" word")]
#[case::empty("name=_\"\"\n", "")]
#[case::tag_inside_string("name=_\"see [unit] docs\"\n", "see [unit] docs")]
#[case::comment_inside_string("name=_\"#1 hero\"\n", "#1 hero")]
fn string_literal_text(#[case] input: &str, #[case] expected: &str) {
	let scan = scan(input);

	assert!(scan.diagnostics.is_empty());
	assert!(entry(&scan.catalog, expected).translatable);
}

#[test]
fn escaped_quote_across_lines() {
	let scan = scan("text=_\"He said \"\"go\nnow\"\" and left\"\n");

	assert!(entry(&scan.catalog, "He said \"go\nnow\" and left").translatable);
}

#[rstest]
#[case::closed("abc\" rest", Some(3))]
#[case::escaped_then_closed("a\"\"b\"", Some(4))]
#[case::only_escapes("\"\"x\"\"", None)]
#[case::open("no quote", None)]
fn closing_quote_offset(#[case] fragment: &str, #[case] expected: Option<usize>) {
	assert_eq!(crate::assembler::StringAssembler::is_closed(fragment), expected);
}

#[test]
fn normalize_quotes_is_idempotent() {
	let once = normalize_quotes("say \"\"hi\"\"");
	assert_eq!(once, "say \"hi\"");

	let twice = normalize_quotes(&once);
	assert!(matches!(twice, Cow::Borrowed(_)));
	assert_eq!(twice, once);
}

#[rstest]
#[case::glued("name=_\"x\"\n", true)]
#[case::spaced("name= _ \"x\"\n", true)]
#[case::leading("_ \"x\"\n", true)]
#[case::plain("name=\"x\"\n", false)]
#[case::identifier_suffix("name=foo_\"x\"\n", false)]
fn translatable_marker(#[case] input: &str, #[case] translatable: bool) {
	let scan = scan(input);

	assert_eq!(entry(&scan.catalog, "x").translatable, translatable);
}

#[test]
fn unclosed_tags_warn_innermost_first() {
	let scan = scan("[campaign]\n[scenario]\n[message]\nmessage=_\"Deep\"\n");

	assert!(scan.result.is_ok());
	let names: Vec<_> = scan
		.diagnostics
		.iter()
		.map(|diagnostic| match &diagnostic.kind {
			DiagnosticKind::UnclosedTag { name } => name.as_str(),
			other => panic!("unexpected diagnostic {other:?}"),
		})
		.collect();
	assert_eq!(names, vec!["message", "scenario", "campaign"]);
	assert!(scan.diagnostics.iter().all(|d| d.severity == Severity::Warning));

	assert_eq!(entry(&scan.catalog, "Deep").contexts, vec![
		"[message]".to_string()
	]);
}

#[test]
fn unclosed_tag_warnings_render_with_locator() {
	let scan = scan("[a]\n[b]\n");
	let rendered = scan
		.diagnostics
		.iter()
		.map(ToString::to_string)
		.collect::<Vec<_>>()
		.join("\n");

	insta::assert_snapshot!(rendered, @r"
	test.cfg:2: warning: end of file reached with `[b]` still open
	test.cfg:1: warning: end of file reached with `[a]` still open
	");
}

#[test]
fn mismatched_close_is_raised_when_its_scope_is_merged() {
	let scan = scan("[unit]\nname=_\"Wolf\"\n[/side]\n[unit]\nname=_\"Never seen\"\n[/unit]\n");

	assert_eq!(
		structural_kind(scan.result),
		DiagnosticKind::MismatchedClosingTag {
			expected: "unit".to_string(),
			found: "side".to_string(),
		}
	);
	assert!(entry(&scan.catalog, "Wolf").translatable);
	assert!(scan.catalog.get(DEFAULT_DOMAIN, "Never seen").is_none());
}

#[test]
fn mismatched_close_is_deferred_until_a_sentence_is_merged() {
	let scan = scan("[unit]\n[/side]\n[era]\n[/era]\nname=_\"Later\"\n");

	assert_eq!(
		structural_kind(scan.result),
		DiagnosticKind::MismatchedClosingTag {
			expected: "unit".to_string(),
			found: "side".to_string(),
		}
	);
	assert!(entry(&scan.catalog, "Later").translatable);
}

#[test]
fn stray_close_without_sentences_is_raised_at_end_of_file() {
	let scan = scan("[/unit]\n");

	assert_eq!(
		structural_kind(scan.result),
		DiagnosticKind::UnexpectedClosingTag {
			found: "unit".to_string(),
		}
	);
	assert!(scan.catalog.is_empty());
}

#[test]
fn scanner_recovers_for_the_next_file_after_an_error() -> WmlxResult<()> {
	let mut scanner = Scanner::new(ScannerOptions::default())?;
	let mut catalog = Catalog::new();

	let result = scanner.scan_content(&mut catalog, "bad.cfg", 0, "[a]\nx=_\"one\"\n[/b]\n[c]\n");
	assert!(result.is_err());
	assert_eq!(scanner.depth(), 0);

	scanner.scan_content(&mut catalog, "good.cfg", 1, "[c]\nx=_\"two\"\n[/c]\n")?;
	assert!(scanner.diagnostics().is_empty());
	assert_eq!(entry(&catalog, "two").locations, vec![location(1, "good.cfg", 2)]);

	Ok(())
}

#[test]
fn po_annotations_apply_to_the_next_sentence_only() {
	let scan = scan(
		"# po: Shown on the title screen\n# po-override: The hero's name\nname=_\"Konrad\"\nname=_\"\
		 Delfador\"\n",
	);

	let konrad = entry(&scan.catalog, "Konrad");
	assert_eq!(konrad.added_comments, vec![
		"Shown on the title screen".to_string()
	]);
	assert_eq!(konrad.override_comments, vec!["The hero's name".to_string()]);

	let delfador = entry(&scan.catalog, "Delfador");
	assert!(delfador.added_comments.is_empty());
	assert!(delfador.override_comments.is_empty());
}

#[test]
fn po_annotations_are_cleared_by_an_opening_tag() {
	let scan = scan("#po: stale\n[unit]\nname=_\"Fresh\"\n[/unit]\n");

	assert!(entry(&scan.catalog, "Fresh").added_comments.is_empty());
}

#[test]
fn annotations_from_several_occurrences_are_merged() {
	let scan = scan("# po: first\nname=_\"Same\"\n# po: second\nname=_\"Same\"\n# po: first\nname=_\"Same\"\n");

	assert_eq!(entry(&scan.catalog, "Same").added_comments, vec![
		"first".to_string(),
		"second".to_string()
	]);
}

#[test]
fn inline_code_directive_is_scanned_as_wml() {
	let scan = scan("#wmlxgettext: [unit]\nname=_\"Hidden unit\"\n#wmlxgettext: [/unit]\n");

	assert!(scan.result.is_ok());
	assert!(scan.diagnostics.is_empty());
	assert_eq!(entry(&scan.catalog, "Hidden unit").contexts, vec![
		"[unit]".to_string()
	]);
}

#[rstest]
#[case::whole_line("# [unit]\n")]
#[case::after_code("{MACRO} # [/unit]\n")]
#[case::preprocessor("#define UNIT_FOO\n#enddef\n#ifdef HARD\n#endif\n")]
fn comments_do_not_open_tags(#[case] input: &str) {
	let scan = scan(input);

	assert!(scan.result.is_ok());
	assert!(scan.diagnostics.is_empty());
}

#[test]
fn trailing_comment_is_ignored() {
	let scan = scan("name=_\"Real\" # \"not a string\"\n");

	assert_eq!(scan.catalog.len(), 1);
	assert!(entry(&scan.catalog, "Real").translatable);
}

#[rstest]
#[case::macro_prefix("{UNIT_MACRO}[unit]\nname=_\"x\"\n[/unit]\n")]
#[case::same_line("[unit][/unit]\nname=_\"x\"\n")]
#[case::amendment("[+unit]\nname=_\"x\"\n[/unit]\n")]
#[case::array_index("[unit]\nvariable=$units[1].name\nname=_\"x\"\n[/unit]\n")]
#[case::spaced("[ unit ]\nname=_\"x\"\n[ / unit ]\n")]
fn tag_boundaries(#[case] input: &str) {
	let scan = scan(input);

	assert!(scan.result.is_ok(), "{:?}", scan.result);
	assert!(scan.diagnostics.is_empty(), "{:?}", scan.diagnostics);
	assert!(entry(&scan.catalog, "x").translatable);
}

#[test]
fn two_closing_tags_on_one_line_close_both_scopes() {
	let scan = scan("[event]\n[message]\nmessage=_\"Go\"\n[/message][/event]\nname=_\"After\"\n");

	assert!(scan.result.is_ok(), "{:?}", scan.result);
	assert!(scan.diagnostics.is_empty());
	assert_eq!(entry(&scan.catalog, "Go").contexts, vec!["[message]".to_string()]);
	assert!(entry(&scan.catalog, "After").contexts.is_empty());
}

#[test]
fn two_opening_tags_on_one_line_nest() {
	let scan = scan("[event][message]\nspeaker=Li'sar\nmessage=_\"Halt\"\n[/message]\n[/event]\n");

	assert!(scan.result.is_ok(), "{:?}", scan.result);
	assert!(scan.diagnostics.is_empty());
	assert_eq!(entry(&scan.catalog, "Halt").contexts, vec![
		"[message]: speaker=Li'sar".to_string()
	]);
}

#[test]
fn unclosed_tags_opened_on_one_line_are_both_reported() {
	let scan = scan("{PLACE} [side] [unit]\n");

	let names: Vec<_> = scan
		.diagnostics
		.iter()
		.map(|diagnostic| diagnostic.kind.clone())
		.collect();
	assert_eq!(names, vec![
		DiagnosticKind::UnclosedTag {
			name: "unit".to_string()
		},
		DiagnosticKind::UnclosedTag {
			name: "side".to_string()
		},
	]);
}

#[test]
fn quote_in_trailing_comment_keeps_unquoted_context_value() {
	let scan = scan("[unit]\nid=Wolf # was \"Dog\"\nname=_\"Wolf\"\n[/unit]\n");

	assert!(scan.diagnostics.is_empty());
	assert_eq!(entry(&scan.catalog, "Wolf").contexts, vec![
		"[unit]: id=Wolf".to_string()
	]);
}

#[test]
fn quoted_context_value_may_contain_a_hash() {
	let scan = scan("[unit]\nid=\"#1 Wolf\"\nname=_\"Wolf\"\n[/unit]\n");

	assert_eq!(entry(&scan.catalog, "Wolf").contexts, vec![
		"[unit]: id=#1 Wolf".to_string()
	]);
}

#[test]
fn raw_tag_body_is_not_scanned() {
	let scan = scan(
		"[lua]\ncode = <<\n  local s = _ \"not WML\"\n  [unit]\n>>\nname=_\"skipped\"\n[/lua]\nname=_\"\
		 after\"\n",
	);

	assert!(scan.result.is_ok());
	assert!(scan.diagnostics.is_empty());
	assert_eq!(scan.catalog.len(), 1);
	assert!(entry(&scan.catalog, "after").translatable);
}

#[test]
fn embedded_block_on_one_line_returns_to_wml() {
	let scan = scan("[lua]\ncode = << wesnoth.message(\"hi\") >> [/lua]\nname=_\"after\"\n");

	assert!(scan.result.is_ok());
	assert!(scan.diagnostics.is_empty());
	assert!(entry(&scan.catalog, "after").translatable);
}

#[test]
fn raw_string_outside_raw_tag_is_plain_text() {
	let scan = scan("[event]\nname=_\"Event\"\n[/event]\n");

	assert!(scan.result.is_ok());
	assert_eq!(scan.catalog.len(), 1);
}

#[derive(Default)]
struct CountingGrammar {
	lines: Vec<usize>,
}

impl EmbeddedGrammar for CountingGrammar {
	fn enter(&mut self, _rest: &str, line: usize) -> Handoff {
		self.lines.push(line);
		Handoff::Continue
	}

	fn resume(&mut self, text: &str, line: usize) -> Handoff {
		self.lines.push(line);
		match text.find("END") {
			Some(offset) => Handoff::Return(offset + 3),
			None => Handoff::Continue,
		}
	}
}

#[test]
fn custom_embedded_grammar_receives_the_block() -> WmlxResult<()> {
	let mut scanner =
		Scanner::with_embedded(ScannerOptions::default(), Box::new(CountingGrammar::default()))?;
	let mut catalog = Catalog::new();

	scanner.scan_content(
		&mut catalog,
		FILE,
		0,
		"[lua]\ncode=<<\nprint(1)\nEND [/lua]\nname=_\"x\"\n",
	)?;

	assert!(scanner.diagnostics().is_empty());
	assert!(entry(&catalog, "x").translatable);

	Ok(())
}

#[test]
fn unterminated_embedded_block_is_reported() {
	let scan = scan("[lua]\ncode = <<\n  wesnoth.fire(\"x\")\n");

	assert!(scan.result.is_ok());
	assert_eq!(scan.diagnostics, vec![
		ScanDiagnostic::warning(FILE, 2, DiagnosticKind::UnterminatedEmbeddedCode),
		ScanDiagnostic::warning(
			FILE,
			1,
			DiagnosticKind::UnclosedTag {
				name: "lua".to_string()
			}
		),
	]);
}

#[test]
fn unterminated_string_is_reported_and_kept() {
	let scan = scan("[unit]\nname=_\"never closed\n[/unit]\n");

	assert_eq!(scan.diagnostics, vec![
		ScanDiagnostic::warning(FILE, 2, DiagnosticKind::UnterminatedString),
		ScanDiagnostic::warning(
			FILE,
			1,
			DiagnosticKind::UnclosedTag {
				name: "unit".to_string()
			}
		),
	]);
	assert!(entry(&scan.catalog, "never closed\n[/unit]").translatable);
}

#[rstest]
#[case::default(false, 0)]
#[case::warn_all(true, 1)]
fn empty_translatable_string_warning(#[case] warn_all: bool, #[case] expected: usize) {
	let options = ScannerOptions {
		warn_all,
		..ScannerOptions::default()
	};
	let scan = scan_with("name=_\"\"\n", options);

	assert_eq!(scan.diagnostics.len(), expected);
}

#[test]
fn custom_context_keys_and_raw_tags() {
	let options = ScannerOptions {
		initial_domain: "my-addon".to_string(),
		context_keys: vec!["name".to_string()],
		raw_tags: vec!["code".to_string()],
		warn_all: false,
	};
	let scan = scan_with(
		"[side]\nname=Blue\nid=ignored\ndescription=_\"Side\"\n[/side]\n[code]\nx=_\"no\"\n[/code]\n",
		options,
	);

	let entry = scan.catalog.get("my-addon", "Side").expect("entry");
	assert_eq!(entry.contexts, vec!["[side]: name=Blue".to_string()]);
	assert!(scan.catalog.get("my-addon", "no").is_none());
}

#[test]
fn catalog_merge_is_commutative() {
	let sentence = |text: &str, line: usize| Sentence {
		text: text.to_string(),
		translatable: true,
		multiline: false,
		line,
		continuation_lines: vec![],
		domain: DEFAULT_DOMAIN.to_string(),
		added_comments: vec![],
		override_comments: vec![],
	};

	let mut left = Catalog::new();
	left.merge(sentence("Hello", 1), 0, "a.cfg", Some("[a]".to_string()));
	let mut right = Catalog::new();
	right.merge(sentence("Hello", 7), 1, "b.cfg", Some("[b]".to_string()));

	let mut left_first = left.clone();
	left_first.absorb(right.clone());
	let mut right_first = right;
	right_first.absorb(left);

	let mut a = entry(&left_first, "Hello").locations.clone();
	let mut b = entry(&right_first, "Hello").locations.clone();
	a.sort();
	b.sort();
	assert_eq!(a, b);
	assert_eq!(entry(&left_first, "Hello").contexts.len(), 2);
}

#[test]
fn translatable_flag_wins_on_merge() {
	let scan = scan("image=\"Wolf\"\nname=_\"Wolf\"\n");

	let entry = entry(&scan.catalog, "Wolf");
	assert!(entry.translatable);
	assert_eq!(entry.locations.len(), 2);
	assert_eq!(
		entry.translatable_locations().collect::<Vec<_>>(),
		vec![&location(0, FILE, 2)]
	);
	assert_eq!(
		scan.catalog
			.domain(DEFAULT_DOMAIN)
			.map(|d| d.translatable().count()),
		Some(1)
	);
}

#[test]
#[traced_test]
fn domain_switch_is_logged() {
	let _ = scan("#textdomain wesnoth-lib\n");

	assert!(logs_contain("switching text domain"));
}

#[test]
fn crlf_input_is_normalized_by_the_driver() {
	assert_eq!(
		project::normalize_line_endings("a\r\nb\rc"),
		"a\nb\nc".to_string()
	);
}

fn write_file(root: &Path, relative: &str, content: &str) -> std::io::Result<()> {
	let path = root.join(relative);
	if let Some(parent) = path.parent() {
		std::fs::create_dir_all(parent)?;
	}
	std::fs::write(path, content)
}

#[test]
fn collect_files_respects_include_and_gitignore() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	let root = tmp.path();

	write_file(root, "units/wolf.cfg", "")?;
	write_file(root, "units/bat.cfg", "")?;
	write_file(root, "readme.md", "")?;
	write_file(root, "build/generated.cfg", "")?;
	write_file(root, ".hidden/secret.cfg", "")?;
	write_file(root, ".gitignore", "build/\n")?;

	let files = collect_files(root, &ScanOptions::default())?;
	let relative: Vec<_> = files
		.iter()
		.map(|file| project::relative_file_key(root, file))
		.collect();

	assert_eq!(relative, vec!["units/bat.cfg", "units/wolf.cfg"]);

	Ok(())
}

#[test]
fn extract_project_uses_config_and_recovers_from_bad_files() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	let root = tmp.path();

	write_file(
		root,
		"wmlxgettext.toml",
		"initial_domain = \"wesnoth-units\"\n\n[scan]\ninclude = [\"**/*.wml\"]\n",
	)?;
	write_file(root, "a_bad.wml", "[unit]\nname=_\"Broken\"\n[/side]\nname=_\"Lost\"\n")?;
	write_file(root, "b_good.wml", "[unit]\nid=Bat\nname=_\"Vampire Bat\"\n[/unit]\n")?;
	write_file(root, "ignored.cfg", "name=_\"Not included\"\n")?;

	let extraction = extract_project(root)?;

	assert_eq!(extraction.files, vec!["a_bad.wml", "b_good.wml"]);
	assert!(extraction.has_errors());
	assert_eq!(extraction.diagnostics.len(), 1);
	assert_eq!(extraction.diagnostics[0].file, "a_bad.wml");
	assert_eq!(extraction.diagnostics[0].line, 3);

	let catalog = &extraction.catalog;
	assert!(catalog.get("wesnoth-units", "Broken").is_some());
	assert!(catalog.get("wesnoth-units", "Lost").is_none());
	assert!(catalog.get("wesnoth-units", "Not included").is_none());
	let bat = catalog.get("wesnoth-units", "Vampire Bat").expect("entry");
	assert_eq!(bat.locations, vec![location(1, "b_good.wml", 3)]);
	assert_eq!(bat.contexts, vec!["[unit]: id=Bat".to_string()]);

	Ok(())
}

#[test]
fn oversized_files_are_rejected() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	write_file(tmp.path(), "big.cfg", "name=_\"Too big\"\n")?;

	let options = ScanOptions {
		max_file_size: 4,
		..ScanOptions::default()
	};
	let result = extract_project_with_options(tmp.path(), &options);

	assert!(matches!(result, Err(WmlxError::FileTooLarge { .. })));

	Ok(())
}

#[test]
fn config_defaults_apply_to_missing_sections() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	write_file(tmp.path(), ".wmlxgettext.toml", "warn_all = true\n")?;

	let config = WmlxConfig::load(tmp.path())?.expect("config discovered");
	assert!(config.warn_all);
	assert_eq!(config.initial_domain, DEFAULT_DOMAIN);
	assert_eq!(config.scan.raw_tags, vec!["lua".to_string()]);
	assert_eq!(config.max_file_size, DEFAULT_MAX_FILE_SIZE);

	let options = ScannerOptions::from_config(Some(&config));
	assert!(options.warn_all);
	assert_eq!(options.context_keys.len(), DEFAULT_CONTEXT_KEYS.len());

	Ok(())
}

#[test]
fn invalid_config_is_a_parse_error() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	write_file(tmp.path(), "wmlxgettext.toml", "initial_domain = [\n")?;

	let result = WmlxConfig::load(tmp.path());
	assert!(matches!(result, Err(WmlxError::ConfigParse(_))));

	Ok(())
}
