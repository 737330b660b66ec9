#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

use library_sort::Catalog;

/// A scratch directory holding one input/output catalog pair
pub struct CatalogFixture {
    pub dir: TempDir,
    pub input: PathBuf,
    pub output: PathBuf,
}

impl CatalogFixture {
    pub fn new() -> Self {
        let dir = TempDir::new().expect("Failed to create temp dir");
        let input = dir.path().join("library.xml");
        let output = dir.path().join("library_sorted.xml");
        Self { dir, input, output }
    }

    pub fn with_input(content: &str) -> Self {
        let fixture = Self::new();
        fs::write(&fixture.input, content).expect("Failed to write input catalog");
        fixture
    }

    pub fn path(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    pub fn output_text(&self) -> String {
        fs::read_to_string(&self.output).expect("Failed to read output catalog")
    }
}

/// Build a catalog document from `(id, path)` pairs
pub fn catalog_xml(books: &[(&str, Option<&str>)]) -> String {
    let mut xml = String::from("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<library version=\"20110515\">\n");
    for (id, path) in books {
        match path {
            Some(path) => xml.push_str(&format!("  <book id=\"{}\" path=\"{}\"/>\n", id, path)),
            None => xml.push_str(&format!("  <book id=\"{}\"/>\n", id)),
        }
    }
    xml.push_str("</library>\n");
    xml
}

/// Ids of the direct-child books of the catalog at `path`, in document order
pub fn book_ids(path: &Path) -> Vec<String> {
    let content = fs::read_to_string(path).expect("Failed to read catalog");
    let catalog = Catalog::parse(&content).expect("Catalog should parse");
    catalog
        .books()
        .map(|book| book.id().unwrap_or_default().to_string())
        .collect()
}
