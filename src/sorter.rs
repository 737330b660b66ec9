use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::catalog::Catalog;
use crate::error::{SortError, SortResult};
use crate::output::Output;

/// What a successful sort did
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortSummary {
    pub input: PathBuf,
    pub output: PathBuf,
    /// Direct-child books written in sorted order
    pub books: usize,
    /// Non-book children left in front of the books
    pub others: usize,
    /// Books sorted under the empty key
    pub missing_path: usize,
}

fn read_catalog(path: &Path) -> SortResult<String> {
    fs::read_to_string(path).map_err(|e| match e.kind() {
        io::ErrorKind::NotFound => SortError::NotFound {
            path: path.to_path_buf(),
        },
        _ => SortError::Io(e),
    })
}

/// Sort the catalog at `input` by book path and write it to `output`.
///
/// The output file is only touched once the input has been parsed and
/// re-serialized in memory.
pub fn sort_catalog(input: impl AsRef<Path>, output: impl AsRef<Path>) -> SortResult<SortSummary> {
    let (input, output) = (input.as_ref(), output.as_ref());

    let content = read_catalog(input)?;
    let mut catalog = Catalog::parse(&content).map_err(|source| SortError::Parse {
        path: input.to_path_buf(),
        source,
    })?;
    debug!(
        root = %catalog.root_name(),
        books = catalog.book_count(),
        others = catalog.other_count(),
        "Parsed catalog"
    );

    catalog.sort_books_by_path();
    let xml = catalog.to_xml().map_err(SortError::Serialize)?;
    fs::write(output, xml)?;

    Ok(SortSummary {
        input: input.to_path_buf(),
        output: output.to_path_buf(),
        books: catalog.book_count(),
        others: catalog.other_count(),
        missing_path: catalog.books_without_path(),
    })
}

/// Sort and report the outcome. Returns whether the sorted file was written.
pub fn sort(input: impl AsRef<Path>, output: impl AsRef<Path>, reporter: &Output) -> bool {
    let (input, output) = (input.as_ref(), output.as_ref());

    match sort_catalog(input, output) {
        Ok(summary) => {
            info!(
                input = %input.display(),
                output = %output.display(),
                books = summary.books,
                "Catalog sorted"
            );
            reporter.report_sort_success(&summary);
            true
        }
        Err(e) => {
            info!(input = %input.display(), error = %e, "Sorting failed");
            reporter.report_sort_error(&e);
            false
        }
    }
}
