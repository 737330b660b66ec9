//! Text-level verification of a sorted catalog.
//!
//! Ids are pulled from the raw input with a regular expression and looked up in
//! the raw output by substring search. Nothing here touches the XML parser used
//! by the sorter, so the two checks stay independent.

use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use regex::Regex;
use tracing::{debug, info};

use crate::error::{VerifyError, VerifyResult};
use crate::output::Output;

/// Cached regex for `book id="..."` extraction
static BOOK_ID_REGEX: OnceLock<Regex> = OnceLock::new();

fn get_book_id_regex() -> &'static Regex {
    BOOK_ID_REGEX.get_or_init(|| {
        Regex::new(r#"book id="([^"]+)""#).expect("Failed to compile book id regex")
    })
}

/// An id that occurs more than once in the input
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DuplicateId {
    pub id: String,
    pub count: usize,
}

/// Ids found in the input file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputScan {
    pub input: PathBuf,
    /// Every match, in document order, duplicates included
    pub ids: Vec<String>,
    /// Distinct ids in first-occurrence order
    pub unique: Vec<String>,
    /// Ids seen more than once, in first-occurrence order
    pub duplicates: Vec<DuplicateId>,
}

impl InputScan {
    pub fn from_text(input: impl Into<PathBuf>, text: &str) -> Self {
        let ids = extract_book_ids(text);
        let unique = unique_ids(&ids);
        let duplicates = find_duplicates(&ids);
        Self {
            input: input.into(),
            ids,
            unique,
            duplicates,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn has_duplicates(&self) -> bool {
        self.ids.len() > self.unique.len()
    }
}

/// Outcome of checking the output file against the input ids
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerificationReport {
    pub output: PathBuf,
    /// Number of unique ids looked up
    pub verified: usize,
    pub missing: Vec<String>,
}

impl VerificationReport {
    pub fn is_success(&self) -> bool {
        self.missing.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verification {
    /// The input carried no `book id="..."` at all; the output was not read
    NoIds,
    Checked {
        scan: InputScan,
        report: VerificationReport,
    },
}

pub fn extract_book_ids(text: &str) -> Vec<String> {
    get_book_id_regex()
        .captures_iter(text)
        .map(|caps| caps[1].to_owned())
        .collect()
}

pub fn unique_ids(ids: &[String]) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut unique = Vec::new();
    for id in ids {
        if seen.insert(id.as_str()) {
            unique.push(id.clone());
        }
    }
    unique
}

pub fn find_duplicates(ids: &[String]) -> Vec<DuplicateId> {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for id in ids {
        *counts.entry(id.as_str()).or_default() += 1;
    }

    unique_ids(ids)
        .into_iter()
        .filter_map(|id| {
            let count = counts.get(id.as_str()).copied().unwrap_or(0);
            (count > 1).then_some(DuplicateId { id, count })
        })
        .collect()
}

/// Unique ids with no `id="<value>"` anywhere in `output_text`
pub fn find_missing(unique: &[String], output_text: &str) -> Vec<String> {
    unique
        .iter()
        .filter(|id| !output_text.contains(&format!(r#"id="{}""#, id)))
        .cloned()
        .collect()
}

fn read_text(path: &Path) -> VerifyResult<String> {
    fs::read_to_string(path).map_err(|e| VerifyError::from_io(path, e))
}

pub fn scan_input(input: &Path) -> VerifyResult<InputScan> {
    let text = read_text(input)?;
    Ok(InputScan::from_text(input, &text))
}

pub fn check_output(scan: &InputScan, output: &Path) -> VerifyResult<VerificationReport> {
    let text = read_text(output)?;
    Ok(VerificationReport {
        output: output.to_path_buf(),
        verified: scan.unique.len(),
        missing: find_missing(&scan.unique, &text),
    })
}

/// Verify without printing anything
pub fn verify_catalog(input: impl AsRef<Path>, output: impl AsRef<Path>) -> VerifyResult<Verification> {
    verify_catalog_with(input.as_ref(), output.as_ref(), |_| {})
}

/// Scan the input, hand the scan to `on_scan` before the output is read, then
/// check the output. `on_scan` is skipped when the input has no ids.
fn verify_catalog_with(
    input: &Path,
    output: &Path,
    mut on_scan: impl FnMut(&InputScan),
) -> VerifyResult<Verification> {
    let scan = scan_input(input)?;
    if scan.is_empty() {
        return Ok(Verification::NoIds);
    }
    on_scan(&scan);
    let report = check_output(&scan, output)?;
    Ok(Verification::Checked { scan, report })
}

/// Verify that every input id survives in the output, reporting as it goes.
/// Failures are reported, never returned.
pub fn verify(input: impl AsRef<Path>, output: impl AsRef<Path>, reporter: &Output) {
    let (input, output) = (input.as_ref(), output.as_ref());
    reporter.report_verification_start();

    let result = verify_catalog_with(input, output, |scan| {
        debug!(
            total = scan.ids.len(),
            unique = scan.unique.len(),
            duplicates = scan.duplicates.len(),
            "Scanned input ids"
        );
        reporter.report_input_scan(scan);
    });

    match result {
        Ok(Verification::NoIds) => reporter.report_no_ids(),
        Ok(Verification::Checked { report, .. }) => {
            if !report.is_success() {
                info!(missing = report.missing.len(), "Book ids missing from output");
            }
            reporter.report_verification(&report);
        }
        Err(e) => {
            info!(error = %e, "Verification aborted");
            reporter.report_verify_error(&e);
        }
    }
}
