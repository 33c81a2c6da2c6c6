//! # Error Types
//!
//! This module defines the error and diagnostic types for the chart decoder.
//!
//! Problems fall into two groups:
//! - [`ChartError`] - fatal conditions that abort a decoding run (missing sections,
//!   missing resolution or tempo, out-of-order lifecycle calls)
//! - [`Diagnostic`] - recoverable problems with a single line. The offending record is
//!   skipped, decoding continues, and the diagnostic is handed back to the caller.
//!
//! ## Usage
//! ```rust
//! use chartread::{ChartError, Decoder};
//!
//! let text = "[Song]\n{\n  Resolution = 192\n}\n[ExpertSingle]\n{\n  0 = N 0 0\n}\n";
//! let mut decoder = Decoder::load(text, "ExpertSingle").unwrap();
//!
//! match decoder.decode() {
//!     Ok(chart) => println!("{} notes", chart.notes.len()),
//!     Err(ChartError::MissingSyncTrack) => eprintln!("chart has no tempo map"),
//!     Err(e) => eprintln!("Error: {}", e),
//! }
//! ```

use serde::Serialize;
use std::fmt;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ChartError {
    /// A section that a stage needs is absent from the document.
    ///
    /// # Example
    /// ```
    /// # use chartread::ChartError;
    /// let err = ChartError::SectionNotFound { name: "Song".to_string() };
    /// assert_eq!(err.to_string(), "Section [Song] not found in chart");
    /// ```
    #[error("Section [{name}] not found in chart")]
    SectionNotFound { name: String },

    /// The instrument/difficulty track requested by the caller is absent.
    #[error("Track [{name}] not found in chart")]
    TrackNotFound { name: String },

    /// `Resolution` is absent from `[Song]`, is not an integer, or is zero.
    #[error("Chart has no resolution: [Song] must define an integer Resolution greater than 0")]
    MissingResolution,

    /// There is no `[SyncTrack]`, or it declares no tempo.
    #[error("Chart has no tempo map: [SyncTrack] must declare at least one tempo (B) event")]
    MissingSyncTrack,

    /// The tempo map does not start at tick 0, so earlier ticks have no tempo.
    ///
    /// # Example
    /// ```
    /// # use chartread::ChartError;
    /// let err = ChartError::MissingInitialTempo { first_tick: 768 };
    /// assert_eq!(
    ///     err.to_string(),
    ///     "Chart has no tempo at tick 0 (first tempo change is at tick 768)"
    /// );
    /// ```
    #[error("Chart has no tempo at tick 0 (first tempo change is at tick {first_tick})")]
    MissingInitialTempo { first_tick: u32 },

    /// A decoder stage was invoked out of order or more than once.
    #[error("Cannot {operation} while decoder is {state}")]
    InvalidStateTransition {
        operation: &'static str,
        state: &'static str,
    },

    /// `[Song]` metadata could not be interpreted.
    #[error("Invalid song metadata: {0}")]
    Metadata(String),
}

/// What kind of recoverable problem a [`Diagnostic`] describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum DiagnosticKind {
    /// A line inside a section is not a `key = value` pair.
    MalformedLine,
    /// An event type this decoder does not interpret.
    UnrecognizedEventType,
    /// A recognized event with operands that cannot be used.
    InvalidValue,
}

impl fmt::Display for DiagnosticKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DiagnosticKind::MalformedLine => f.write_str("malformed line"),
            DiagnosticKind::UnrecognizedEventType => f.write_str("unrecognized event type"),
            DiagnosticKind::InvalidValue => f.write_str("invalid value"),
        }
    }
}

/// A skipped record, kept for the caller to inspect.
///
/// `line` is the 1-based line number in the document with line endings normalized.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Diagnostic {
    pub section: String,
    pub line: usize,
    pub kind: DiagnosticKind,
    pub message: String,
}

impl Diagnostic {
    pub fn new(section: &str, line: usize, kind: DiagnosticKind, message: impl Into<String>) -> Self {
        let diagnostic = Self {
            section: section.to_string(),
            line,
            kind,
            message: message.into(),
        };
        log::warn!("{}", diagnostic);
        diagnostic
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] line {}: {}: {}",
            self.section, self.line, self.kind, self.message
        )
    }
}
