//! TLog Parser Library
//!
//! Extracts selected telemetry parameters from Mission Planner telemetry logs
//! rendered as comma-separated text, and writes them to a reduced CSV file.
//!
//! # Features
//!
//! - **`csv`** (default): Enable CSV export and the interactive session
//! - **`cli`** (default): Build the command-line interface binary
//! - **`serde`**: Enable serialization/deserialization of types
//! - **`json`**: Save and load selections as JSON presets
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use tlog_parser::{export_to_csv, locate_catalog, ExportOptions, SelectionSet, ToggleTarget};
//! use std::path::Path;
//!
//! let (_, catalog) = locate_catalog(None).unwrap();
//! let mut selection = SelectionSet::new();
//! selection
//!     .toggle_add(&catalog, &ToggleTarget::parse("GPS_RAW_INT").unwrap())
//!     .unwrap();
//!
//! let report = export_to_csv(
//!     Path::new("flight.csv"),
//!     &catalog,
//!     &selection,
//!     &ExportOptions::default(),
//! )
//! .unwrap();
//! println!("Wrote {} rows to {}", report.rows_written, report.output_path.display());
//! ```
//!
//! # Log format
//!
//! Each line of a telemetry log starts with a timestamp, followed by
//! `name,value` token pairs at arbitrary positions. A parameter's value is the
//! field right after the first token equal to its name; a parameter absent
//! from a line is written as `0`.

pub mod error;
#[cfg(feature = "csv")]
pub mod export;
pub mod parser;
#[cfg(feature = "csv")]
pub mod session;
pub mod types;

// Re-export everything from modules for convenience
pub use error::{Result, TlogError};
#[cfg(feature = "csv")]
#[allow(ambiguous_glob_reexports)]
pub use export::*;
#[allow(ambiguous_glob_reexports)]
pub use parser::*;
#[cfg(feature = "csv")]
pub use session::Session;
#[allow(ambiguous_glob_reexports)]
pub use types::*;
