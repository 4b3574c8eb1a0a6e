//! Line-oriented interactive session
//!
//! Drives catalog browsing, selection toggles and exports from text commands
//! read from any `BufRead`. Errors are printed and the session keeps going.

use crate::error::{Result, TlogError};
use crate::export::{export_to_csv, ExportOptions};
use crate::parser::{MatchMode, MissingValue};
use crate::types::{Catalog, SelectionSet, ToggleTarget};
use std::io::{BufRead, Write};
use std::path::PathBuf;
use tracing::debug;

const HELP: &str = "\
Commands:
  open PATH            choose the telemetry log (.csv)
  save PATH            set the output file (default: <log>_parsed.csv)
  groups               list parameter groups
  list [GROUP]         list parameters, optionally for one group
  add TARGET           select GROUP or GROUP.member
  remove TARGET        deselect GROUP or GROUP.member
  selected             show the current selection
  clear                deselect everything
  mode anywhere|gated  how parameter names are matched on a line
  missing zero|hold    value written when a parameter is absent
  parse                export the selected parameters
  store PATH           save the selection as a JSON preset (json feature)
  load PATH            replace the selection from a JSON preset (json feature)
  help                 show this text
  quit                 leave the session";

/// Interactive state: the catalog, the selection being built and the paths
/// chosen so far
pub struct Session<'a> {
    catalog: &'a Catalog,
    selection: SelectionSet,
    log_file: Option<PathBuf>,
    options: ExportOptions,
}

impl<'a> Session<'a> {
    pub fn new(catalog: &'a Catalog) -> Self {
        Self {
            catalog,
            selection: SelectionSet::new(),
            log_file: None,
            options: ExportOptions::default(),
        }
    }

    /// Start from an existing selection and options (e.g. from CLI flags)
    pub fn with_state(
        catalog: &'a Catalog,
        selection: SelectionSet,
        log_file: Option<PathBuf>,
        options: ExportOptions,
    ) -> Self {
        Self {
            catalog,
            selection,
            log_file,
            options,
        }
    }

    pub fn selection(&self) -> &SelectionSet {
        &self.selection
    }

    /// Read commands until `quit` or end of input
    pub fn run<R: BufRead, W: Write>(&mut self, mut input: R, out: &mut W) -> Result<()> {
        writeln!(out, "Type 'help' for a list of commands.")?;
        write!(out, "> ")?;
        out.flush()?;

        let mut buffer = Vec::new();
        loop {
            buffer.clear();
            if input.read_until(b'\n', &mut buffer)? == 0 {
                break;
            }

            match std::str::from_utf8(&buffer) {
                Ok(line) => {
                    let line = line.trim();
                    if line == "quit" || line == "exit" {
                        break;
                    }
                    if !line.is_empty() {
                        if let Err(e) = self.execute(line, out) {
                            writeln!(out, "Error: {e}")?;
                        }
                    }
                }
                Err(e) => writeln!(out, "Error: command is not valid UTF-8: {e}")?,
            }
            write!(out, "> ")?;
            out.flush()?;
        }

        writeln!(out)?;
        Ok(())
    }

    /// Execute a single command line
    pub fn execute<W: Write>(&mut self, line: &str, out: &mut W) -> Result<()> {
        let (command, argument) = match line.split_once(char::is_whitespace) {
            Some((command, rest)) => (command, rest.trim()),
            None => (line, ""),
        };
        debug!(command, argument, "Session command");

        match command {
            "help" => writeln!(out, "{HELP}")?,
            "open" => {
                let path = PathBuf::from(required(argument, "open PATH")?);
                crate::export::validate_source_path(&path)?;
                writeln!(out, "Log file: {}", path.display())?;
                self.log_file = Some(path);
            }
            "save" => {
                let path = PathBuf::from(required(argument, "save PATH")?);
                writeln!(out, "Output file: {}", path.display())?;
                self.options.output_path = Some(path);
            }
            "groups" => {
                for name in self.catalog.group_names() {
                    writeln!(out, "{name}")?;
                }
            }
            "list" => self.list(argument, out)?,
            "add" => {
                let target = ToggleTarget::parse(argument)?;
                let changed = self.selection.toggle_add(self.catalog, &target)?;
                writeln!(out, "{} {target}", if changed { "Added" } else { "Unchanged:" })?;
            }
            "remove" => {
                let target = ToggleTarget::parse(argument)?;
                let changed = self.selection.toggle_remove(self.catalog, &target)?;
                writeln!(out, "{} {target}", if changed { "Removed" } else { "Unchanged:" })?;
            }
            "selected" => {
                if self.selection.is_empty() {
                    writeln!(out, "(nothing selected)")?;
                }
                for (group, members) in self.selection.iter() {
                    writeln!(out, "{group}")?;
                    for member in members {
                        writeln!(out, "  {member}")?;
                    }
                }
            }
            "clear" => {
                self.selection.clear();
                writeln!(out, "Selection cleared")?;
            }
            "mode" => {
                self.options.match_mode = match argument {
                    "anywhere" => MatchMode::Anywhere,
                    "gated" => MatchMode::GroupGated,
                    _ => return Err(usage("mode anywhere|gated")),
                };
                writeln!(out, "Match mode: {:?}", self.options.match_mode)?;
            }
            "missing" => {
                self.options.missing_value = match argument {
                    "zero" => MissingValue::Zero,
                    "hold" => MissingValue::HoldLast,
                    _ => return Err(usage("missing zero|hold")),
                };
                writeln!(out, "Missing values: {:?}", self.options.missing_value)?;
            }
            "parse" => {
                let Some(log_file) = &self.log_file else {
                    return Err(usage("open PATH before parse"));
                };
                let report =
                    export_to_csv(log_file, self.catalog, &self.selection, &self.options)?;
                if let Some(reason) = &report.fallback {
                    writeln!(out, "Warning: {reason}")?;
                }
                writeln!(
                    out,
                    "Finished! {} rows written to {}",
                    report.rows_written,
                    report.output_path.display()
                )?;
            }
            #[cfg(feature = "json")]
            "store" => {
                let path = required(argument, "store PATH")?;
                std::fs::write(path, self.selection.to_json()?)?;
                writeln!(out, "Selection stored in {path}")?;
            }
            #[cfg(feature = "json")]
            "load" => {
                let path = required(argument, "load PATH")?;
                let json = std::fs::read_to_string(path)?;
                self.selection = SelectionSet::from_json(self.catalog, &json)?;
                writeln!(out, "Loaded {} parameters", self.selection.len())?;
            }
            _ => {
                return Err(TlogError::InvalidCommand(format!(
                    "unknown command '{command}' (try 'help')"
                )))
            }
        }
        Ok(())
    }

    fn list<W: Write>(&self, group: &str, out: &mut W) -> Result<()> {
        if group.is_empty() {
            for run in self.catalog.groups() {
                writeln!(out, "{}", run.name)?;
                for member in &run.members {
                    let mark = if self.selection.contains(&run.name, member) { "*" } else { " " };
                    writeln!(out, " {mark} {member}")?;
                }
            }
            return Ok(());
        }

        if !self.catalog.has_group(group) {
            return Err(TlogError::UnknownGroup(group.to_string()));
        }
        for member in self.catalog.members_of(group) {
            let mark = if self.selection.contains(group, member) { "*" } else { " " };
            writeln!(out, " {mark} {member}")?;
        }
        Ok(())
    }
}

fn required<'s>(argument: &'s str, form: &str) -> Result<&'s str> {
    if argument.is_empty() {
        Err(usage(form))
    } else {
        Ok(argument)
    }
}

fn usage(form: &str) -> TlogError {
    TlogError::InvalidCommand(format!("usage: {form}"))
}
