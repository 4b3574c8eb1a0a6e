//! CSV export of selected telemetry parameters
//!
//! The source log is read one line at a time and each line produces exactly
//! one output row. Output goes to a temporary file in the destination
//! directory which is only moved into place once the whole pass succeeds.

use crate::error::{Result, TlogError};
use crate::parser::{ExtractionPlan, MatchMode, MissingValue};
use crate::types::{Catalog, LogRow, SelectionSet};
use std::fs::File;
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Suffix appended to the source file stem for the default output name
pub const DEFAULT_OUTPUT_SUFFIX: &str = "_parsed.csv";

/// Export options for controlling the extraction pass
#[derive(Debug, Clone, Default)]
pub struct ExportOptions {
    /// Explicit destination; `None` uses `<stem>_parsed.csv` next to the source
    pub output_path: Option<PathBuf>,
    pub match_mode: MatchMode,
    pub missing_value: MissingValue,
}

/// Outcome of a successful export
#[derive(Debug)]
pub struct ExportReport {
    pub output_path: PathBuf,
    pub header: Vec<String>,
    pub rows_written: usize,
    /// Set when the explicit destination could not be used
    pub fallback: Option<TlogError>,
}

/// Check that the source log carries a `.csv` extension (case-insensitive)
pub fn validate_source_path(path: &Path) -> Result<()> {
    let valid_extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.eq_ignore_ascii_case("csv"))
        .unwrap_or(false);

    if valid_extension {
        Ok(())
    } else {
        Err(TlogError::BadFileExtension(path.to_path_buf()))
    }
}

/// `<source_stem>_parsed.csv` in the source's directory
pub fn default_output_path(source: &Path) -> PathBuf {
    let base_name = source
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("tlog");

    let output_dir = source.parent().unwrap_or(Path::new("."));
    output_dir.join(format!("{base_name}{DEFAULT_OUTPUT_SUFFIX}"))
}

/// Pick the destination path.
///
/// An explicit path whose directory does not exist falls back to the default
/// name; the returned error describes why. A bare file name lives in the
/// working directory, which always exists.
pub fn resolve_output_path(source: &Path, explicit: Option<&Path>) -> (PathBuf, Option<TlogError>) {
    let Some(path) = explicit else {
        return (default_output_path(source), None);
    };

    let dir = match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    };

    if dir.is_dir() {
        (path.to_path_buf(), None)
    } else {
        (
            default_output_path(source),
            Some(TlogError::MissingDestinationDirectory(dir.to_path_buf())),
        )
    }
}

/// Run the extraction pass from `reader` into `writer`.
///
/// Writes the header, then one row per input line. `source` only names the
/// input in errors. Returns the number of data rows written.
pub fn extract_rows<R: BufRead, W: Write>(
    mut reader: R,
    writer: W,
    plan: &mut ExtractionPlan,
    source: &Path,
) -> Result<usize> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    csv_writer.write_record(plan.header())?;

    let mut buffer = Vec::new();
    let mut rows = 0;
    loop {
        buffer.clear();
        if reader.read_until(b'\n', &mut buffer)? == 0 {
            break;
        }

        let line = std::str::from_utf8(&buffer).map_err(|e| TlogError::UnreadableEncoding {
            path: source.to_path_buf(),
            line: rows + 1,
            source: e,
        })?;

        let output = plan.extract(&LogRow::split(line));
        csv_writer.write_record(output.record())?;
        rows += 1;
    }

    csv_writer.flush()?;
    Ok(rows)
}

/// Staged files are created owner-only; give new outputs the usual
/// `rw-r--r--` mode before they are moved into place
#[cfg(unix)]
fn set_default_permissions(file: &File) -> std::io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    file.set_permissions(std::fs::Permissions::from_mode(0o644))
}

#[cfg(not(unix))]
fn set_default_permissions(_file: &File) -> std::io::Result<()> {
    Ok(())
}

/// Export the selected parameters of a telemetry log to CSV
pub fn export_to_csv(
    source: &Path,
    catalog: &Catalog,
    selection: &SelectionSet,
    options: &ExportOptions,
) -> Result<ExportReport> {
    validate_source_path(source)?;

    let (output_path, fallback) = resolve_output_path(source, options.output_path.as_deref());
    if let Some(reason) = &fallback {
        warn!(
            "{reason}; writing to {} instead",
            output_path.display()
        );
    }

    let mut plan = ExtractionPlan::new(
        catalog,
        selection,
        options.match_mode,
        options.missing_value,
    );
    let header = plan.header();

    debug!(
        source = %source.display(),
        output = %output_path.display(),
        columns = header.len(),
        "Starting extraction"
    );

    let input = File::open(source)?;
    let output_dir = match output_path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    };
    let mut staging = tempfile::Builder::new()
        .prefix(".tlog_parser")
        .suffix(".tmp")
        .tempfile_in(output_dir)?;

    let rows_written = extract_rows(
        BufReader::new(input),
        staging.as_file_mut(),
        &mut plan,
        source,
    )?;

    match std::fs::metadata(&output_path) {
        Ok(existing) => staging.as_file().set_permissions(existing.permissions())?,
        Err(_) => set_default_permissions(staging.as_file())?,
    }
    staging
        .persist(&output_path)
        .map_err(|e| TlogError::Io(e.error))?;

    info!(
        rows = rows_written,
        output = %output_path.display(),
        "Extraction finished"
    );

    Ok(ExportReport {
        output_path,
        header,
        rows_written,
        fallback,
    })
}
