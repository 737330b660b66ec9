//! Console Output and Reporting
//!
//! Human-readable status lines for the sorter and verifier. Every message is
//! built by a `format_*` method and printed by the matching `report_*` method.

use serde::{Deserialize, Serialize};

use crate::config::OutputConfig;
use crate::error::{SortError, VerifyError};
use crate::sorter::SortSummary;
use crate::verifier::{InputScan, VerificationReport};

const SUCCESS: &str = "✅";
const WARNING: &str = "⚠️";
const FAILURE: &str = "❌";

/// Verbosity levels for output
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub enum VerbosityLevel {
    /// Only show warnings and errors
    Quiet,
    /// Show standard information
    #[default]
    Normal,
    /// Show detailed information
    Verbose,
}

/// Simple output formatter for human-readable results
pub struct Output {
    verbosity: VerbosityLevel,
    show_colors: bool,
}

impl Output {
    pub fn new(verbosity: VerbosityLevel) -> Self {
        Self {
            verbosity,
            show_colors: atty::is(atty::Stream::Stdout),
        }
    }

    pub fn with_options(verbosity: VerbosityLevel, show_colors: bool) -> Self {
        Self {
            verbosity,
            show_colors,
        }
    }

    pub fn from_config(config: &OutputConfig) -> Self {
        let mut output = Self::new(config.verbosity());
        output.show_colors = output.show_colors && config.color;
        output
    }

    fn colorize(&self, text: &str, color: &str) -> String {
        if self.show_colors {
            format!("\x1b[{}m{}\x1b[0m", color, text)
        } else {
            text.to_string()
        }
    }

    fn success(&self, text: &str) -> String {
        format!("{} {}", SUCCESS, self.colorize(text, "32"))
    }

    fn warning(&self, text: &str) -> String {
        format!("{} {}", WARNING, self.colorize(text, "33"))
    }

    fn failure(&self, text: &str) -> String {
        format!("{} {}", FAILURE, self.colorize(text, "31"))
    }

    fn emit(&self, text: String) {
        if self.verbosity > VerbosityLevel::Quiet {
            println!("{}", text);
        }
    }

    fn emit_always(&self, text: String) {
        println!("{}", text);
    }

    pub fn format_sort_success(&self, summary: &SortSummary) -> String {
        let mut output = self.success(&format!(
            "Successfully sorted '{}' and saved to '{}'",
            summary.input.display(),
            summary.output.display()
        ));

        if self.verbosity >= VerbosityLevel::Verbose {
            output.push_str(&format!(
                "\n   Books sorted: {}, other children kept: {}, books without path: {}",
                summary.books, summary.others, summary.missing_path
            ));
        }
        output
    }

    pub fn format_sort_error(&self, error: &SortError) -> String {
        match error {
            SortError::NotFound { path } => self.failure(&format!(
                "Error: The input file '{}' was not found.",
                path.display()
            )),
            SortError::Parse { path, source } => self.failure(&format!(
                "Error parsing XML file '{}': {}",
                path.display(),
                source
            )),
            SortError::Io(_) | SortError::Serialize(_) => self.failure(&format!(
                "An unexpected error occurred during sorting: {}",
                error
            )),
        }
    }

    pub fn format_verification_start(&self) -> String {
        "\n--- Starting Verification ---".to_string()
    }

    pub fn format_no_ids(&self) -> String {
        self.warning("Warning: No book IDs found in the input file.")
    }

    pub fn format_input_scan(&self, scan: &InputScan) -> String {
        let mut output = String::new();

        if scan.has_duplicates() {
            output.push_str(&self.warning(&format!(
                "Warning: Duplicate book IDs were found in '{}'.",
                scan.input.display()
            )));
            output.push_str("\n   Duplicate IDs and their counts:");
            for duplicate in &scan.duplicates {
                output.push_str(&format!(
                    "\n     - ID: {}, Count: {}",
                    duplicate.id, duplicate.count
                ));
            }
            output.push('\n');
        }

        output.push_str(&format!(
            "Found {} unique book IDs in '{}'.",
            scan.unique.len(),
            scan.input.display()
        ));
        output
    }

    pub fn format_verification(&self, report: &VerificationReport) -> String {
        if report.is_success() {
            return self.success(&format!(
                "Verification successful: All {} unique book IDs are present in '{}'.",
                report.verified,
                report.output.display()
            ));
        }

        let mut output = self.failure(&format!(
            "Verification FAILED: {} book ID(s) are missing from the output file.",
            report.missing.len()
        ));
        output.push_str("\nMissing IDs:");
        for id in &report.missing {
            output.push_str(&format!("\n  - {}", id));
        }
        output
    }

    pub fn format_verify_error(&self, error: &VerifyError) -> String {
        match error {
            VerifyError::NotFound { path } => self.failure(&format!(
                "Error: Could not find a file for verification: {}",
                path.display()
            )),
            VerifyError::Read { .. } => self.failure(&format!(
                "An unexpected error occurred during verification: {}",
                error
            )),
        }
    }

    pub fn report_sort_success(&self, summary: &SortSummary) {
        self.emit(self.format_sort_success(summary));
    }

    pub fn report_sort_error(&self, error: &SortError) {
        self.emit_always(self.format_sort_error(error));
    }

    pub fn report_verification_start(&self) {
        self.emit(self.format_verification_start());
    }

    pub fn report_no_ids(&self) {
        self.emit_always(self.format_no_ids());
    }

    pub fn report_input_scan(&self, scan: &InputScan) {
        if scan.has_duplicates() || self.verbosity > VerbosityLevel::Quiet {
            self.emit_always(self.format_input_scan(scan));
        }
    }

    pub fn report_verification(&self, report: &VerificationReport) {
        if report.is_success() {
            self.emit(self.format_verification(report));
        } else {
            self.emit_always(self.format_verification(report));
        }
    }

    pub fn report_verify_error(&self, error: &VerifyError) {
        self.emit_always(self.format_verify_error(error));
    }
}
