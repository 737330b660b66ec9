mod common;

use std::collections::BTreeSet;
use std::fs;

use common::test_helpers::{CatalogFixture, book_ids, catalog_xml};
use library_sort::{
    Catalog, Output, SortError, VerbosityLevel, Verification, VerifyError, sort, sort_catalog,
    verify, verify_catalog,
};

/// Books with shared keys, missing paths and interleaved non-book children.
/// `ord` records each book's input position.
const MIXED_CATALOG: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<library version="20110515">
  <book id="wiki-en" path="wikipedia/en.zim" ord="0" title="Wikipedia"/>
  <book id="gutenberg" ord="1"/>
  <!-- mirrors -->
  <book id="wiki-fr" path="wikipedia/fr.zim" ord="2"/>
  <book id="dup-path-1" path="shared/a.zim" ord="3" size="10"/>
  <meta name="generator">kiwix-manage</meta>
  <book id="ted" path="ted/talks.zim" ord="4">TED talks</book>
  <book id="dup-path-2" path="shared/a.zim" ord="5" size="20"/>
  <book id="stack" ord="6"/>
  <book id="arch" path="" ord="7"/>
</library>
"#;

fn quiet() -> Output {
    Output::with_options(VerbosityLevel::Quiet, false)
}

fn sorted_catalog(fixture: &CatalogFixture) -> Catalog {
    Catalog::parse(&fixture.output_text()).expect("Sorted output should parse")
}

#[test]
fn test_paths_are_non_decreasing() {
    let fixture = CatalogFixture::with_input(MIXED_CATALOG);
    sort_catalog(&fixture.input, &fixture.output).unwrap();

    let paths: Vec<String> = sorted_catalog(&fixture)
        .books()
        .filter_map(|book| book.path().map(str::to_string))
        .collect();
    assert!(paths.windows(2).all(|pair| pair[0] <= pair[1]), "{:?}", paths);
}

#[test]
fn test_equal_keys_keep_input_order() {
    let fixture = CatalogFixture::with_input(MIXED_CATALOG);
    sort_catalog(&fixture.input, &fixture.output).unwrap();

    let catalog = sorted_catalog(&fixture);
    let books: Vec<_> = catalog.books().collect();
    for pair in books.windows(2) {
        if pair[0].sort_key() == pair[1].sort_key() {
            let first: u32 = pair[0].attribute("ord").unwrap().parse().unwrap();
            let second: u32 = pair[1].attribute("ord").unwrap().parse().unwrap();
            assert!(first < second, "stability broken between {:?} and {:?}", pair[0], pair[1]);
        }
    }
}

#[test]
fn test_missing_path_sorts_first() {
    let fixture = CatalogFixture::with_input(MIXED_CATALOG);
    sort_catalog(&fixture.input, &fixture.output).unwrap();

    assert_eq!(
        book_ids(&fixture.output),
        vec![
            "gutenberg",
            "stack",
            "arch",
            "dup-path-1",
            "dup-path-2",
            "ted",
            "wiki-en",
            "wiki-fr",
        ]
    );
}

#[test]
fn test_books_and_attributes_preserved() {
    let fixture = CatalogFixture::with_input(MIXED_CATALOG);
    let summary = sort_catalog(&fixture.input, &fixture.output).unwrap();
    assert_eq!(summary.books, 8);
    assert_eq!(summary.others, 2);
    assert_eq!(summary.missing_path, 2);

    let attribute_sets = |catalog: &Catalog| -> BTreeSet<Vec<(String, String)>> {
        catalog.books().map(|book| book.attributes().to_vec()).collect()
    };
    let before = Catalog::parse(MIXED_CATALOG).unwrap();
    let after = sorted_catalog(&fixture);
    assert_eq!(attribute_sets(&before), attribute_sets(&after));
    assert_eq!(after.book_count(), before.book_count());

    let text = fixture.output_text();
    assert!(text.contains(">TED talks</book>"));
    assert!(text.contains(r#"<meta name="generator">kiwix-manage</meta>"#));
    assert!(text.contains("<!-- mirrors -->"));
}

#[test]
fn test_non_book_children_precede_books() {
    let fixture = CatalogFixture::with_input(MIXED_CATALOG);
    sort_catalog(&fixture.input, &fixture.output).unwrap();

    let text = fixture.output_text();
    let comment = text.find("<!-- mirrors -->").unwrap();
    let meta = text.find("<meta ").unwrap();
    let first_book = text.find("<book ").unwrap();
    assert!(comment < meta && meta < first_book);
}

#[test]
fn test_sorting_is_idempotent() {
    let fixture = CatalogFixture::with_input(MIXED_CATALOG);
    sort_catalog(&fixture.input, &fixture.output).unwrap();

    let resorted = fixture.path("library_resorted.xml");
    sort_catalog(&fixture.output, &resorted).unwrap();
    assert_eq!(book_ids(&fixture.output), book_ids(&resorted));

    match verify_catalog(&fixture.output, &resorted).unwrap() {
        Verification::Checked { scan, report } => {
            assert!(!scan.has_duplicates());
            assert!(report.is_success());
            assert_eq!(report.verified, 8);
        }
        Verification::NoIds => panic!("Expected ids in sorted catalog"),
    }
}

#[test]
fn test_scenario_a_orders_by_path() {
    let fixture = CatalogFixture::with_input(&catalog_xml(&[
        ("b", Some("z/2.txt")),
        ("a", Some("y/1.txt")),
    ]));

    assert!(sort(&fixture.input, &fixture.output, &quiet()));
    assert_eq!(book_ids(&fixture.output), vec!["a", "b"]);
}

#[test]
fn test_scenario_b_duplicate_ids_still_verify() {
    let fixture = CatalogFixture::with_input(&catalog_xml(&[
        ("x", Some("2")),
        ("y", Some("1")),
        ("x", Some("3")),
    ]));
    sort_catalog(&fixture.input, &fixture.output).unwrap();

    match verify_catalog(&fixture.input, &fixture.output).unwrap() {
        Verification::Checked { scan, report } => {
            assert!(scan.has_duplicates());
            assert_eq!(scan.duplicates.len(), 1);
            assert_eq!(scan.duplicates[0].id, "x");
            assert_eq!(scan.duplicates[0].count, 2);
            assert!(report.is_success());
            assert_eq!(report.verified, 2);

            let warning = Output::with_options(VerbosityLevel::Normal, false).format_input_scan(&scan);
            assert!(warning.contains("Duplicate book IDs"));
            assert!(warning.contains("ID: x, Count: 2"));
        }
        Verification::NoIds => panic!("Expected ids in catalog"),
    }
}

#[test]
fn test_scenario_c_missing_path_first_and_verified() {
    let fixture = CatalogFixture::with_input(&catalog_xml(&[
        ("with-path", Some("a/1.zim")),
        ("no-path", None),
    ]));
    sort_catalog(&fixture.input, &fixture.output).unwrap();

    assert_eq!(book_ids(&fixture.output), vec!["no-path", "with-path"]);
    match verify_catalog(&fixture.input, &fixture.output).unwrap() {
        Verification::Checked { report, .. } => assert!(report.is_success()),
        Verification::NoIds => panic!("Expected ids in catalog"),
    }
}

#[test]
fn test_scenario_d_missing_input() {
    let fixture = CatalogFixture::new();

    let result = sort_catalog(&fixture.input, &fixture.output);
    assert!(matches!(result, Err(SortError::NotFound { .. })));
    assert!(!sort(&fixture.input, &fixture.output, &quiet()));
    assert!(!fixture.output.exists());
}

#[test]
fn test_scenario_e_output_removed_before_verify() {
    let fixture = CatalogFixture::with_input(&catalog_xml(&[("a", Some("1"))]));
    assert!(sort(&fixture.input, &fixture.output, &quiet()));
    fs::remove_file(&fixture.output).unwrap();

    match verify_catalog(&fixture.input, &fixture.output) {
        Err(VerifyError::NotFound { path }) => assert_eq!(path, fixture.output),
        other => panic!("Expected NotFound for the output, got {:?}", other),
    }

    // Reporting variant swallows the failure
    verify(&fixture.input, &fixture.output, &quiet());
}

#[test]
fn test_malformed_input_reports_parse_error() {
    let fixture = CatalogFixture::with_input("<library><book id=\"a\" path=\"1\"></library>");

    match sort_catalog(&fixture.input, &fixture.output) {
        Err(SortError::Parse { path, .. }) => assert_eq!(path, fixture.input),
        other => panic!("Expected a parse error, got {:?}", other),
    }

    let line = Output::with_options(VerbosityLevel::Normal, false).format_sort_error(
        &sort_catalog(&fixture.input, &fixture.output).unwrap_err(),
    );
    assert!(line.starts_with("❌ Error parsing XML file"));
    assert!(!fixture.output.exists());
}

#[test]
fn test_single_quoted_ids_are_found_after_sorting() {
    let fixture = CatalogFixture::with_input(
        "<library><book id=\"plain\" path=\"b\"/><book path='a' id='quoted'/></library>",
    );
    sort_catalog(&fixture.input, &fixture.output).unwrap();

    let text = fixture.output_text();
    assert!(text.contains(r#"<book path="a" id="quoted"/>"#));
    assert!(text.find(r#"id="quoted""#).unwrap() < text.find(r#"id="plain""#).unwrap());
}

#[test]
fn test_empty_catalog_has_no_ids() {
    let fixture = CatalogFixture::with_input("<library>\n</library>\n");
    assert!(sort(&fixture.input, &fixture.output, &quiet()));

    assert_eq!(
        verify_catalog(&fixture.input, &fixture.output).unwrap(),
        Verification::NoIds
    );
}
