use anyhow::{Context, Result};
use clap::{Arg, Command};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tlog_parser::{
    export_to_csv, locate_catalog, validate_source_path, Catalog, ExportOptions, MatchMode,
    MissingValue, SelectionSet, Session, ToggleTarget,
};
use tracing_subscriber::EnvFilter;

fn build_command() -> Command {
    Command::new("TLog Parser")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Extract selected parameters from Mission Planner telemetry CSV logs into a reduced CSV.")
        .arg(
            Arg::new("file")
                .help("Telemetry log to parse (.csv, case-insensitive)")
                .required(false)
                .index(1),
        )
        .arg(
            Arg::new("catalog")
                .long("catalog")
                .help("Parameter definition file (default: tlog_params.txt next to the executable, then in the working directory)")
                .value_name("FILE"),
        )
        .arg(
            Arg::new("select")
                .long("select")
                .short('s')
                .help("Select a whole group (GROUP) or one parameter (GROUP.member). Repeatable")
                .value_name("TARGET")
                .action(clap::ArgAction::Append),
        )
        .arg(
            Arg::new("deselect")
                .long("deselect")
                .help("Deselect a group or parameter after all --select options are applied. Repeatable")
                .value_name("TARGET")
                .action(clap::ArgAction::Append),
        )
        .arg(
            Arg::new("selection-file")
                .long("selection-file")
                .help("Load the selection from a JSON preset (requires the json feature)")
                .value_name("FILE"),
        )
        .arg(
            Arg::new("output")
                .long("output")
                .short('o')
                .help("Output CSV file (default: <log>_parsed.csv next to the log)")
                .value_name("FILE"),
        )
        .arg(
            Arg::new("group-gated")
                .long("group-gated")
                .help("Only read a group's parameters from lines that carry the group name")
                .action(clap::ArgAction::SetTrue),
        )
        .arg(
            Arg::new("hold-last")
                .long("hold-last")
                .help("Repeat the last seen value when a parameter is missing from a line (default: 0)")
                .action(clap::ArgAction::SetTrue),
        )
        .arg(
            Arg::new("list-params")
                .long("list-params")
                .help("List the parameter catalog and exit")
                .action(clap::ArgAction::SetTrue),
        )
        .arg(
            Arg::new("interactive")
                .long("interactive")
                .short('i')
                .help("Start an interactive session to pick parameters and parse")
                .action(clap::ArgAction::SetTrue),
        )
        .arg(
            Arg::new("debug")
                .long("debug")
                .help("Enable debug output")
                .action(clap::ArgAction::SetTrue),
        )
}

/// Priority: RUST_LOG > --debug > warn
fn init_logging(debug: bool) {
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else if debug {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("warn")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .compact()
        .init();
}

fn main() {
    if let Err(e) = run() {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let matches = build_command().get_matches();
    init_logging(matches.get_flag("debug"));

    let catalog_arg = matches.get_one::<String>("catalog").map(PathBuf::from);
    let (catalog_path, catalog) = locate_catalog(catalog_arg.as_deref())
        .context("Failed to load the parameter catalog")?;
    tracing::debug!(
        path = %catalog_path.display(),
        entries = catalog.len(),
        "Catalog loaded"
    );

    if matches.get_flag("list-params") {
        print_catalog(&catalog)?;
        return Ok(());
    }

    let selection = build_selection(&matches, &catalog)?;
    let options = ExportOptions {
        output_path: matches.get_one::<String>("output").map(PathBuf::from),
        match_mode: if matches.get_flag("group-gated") {
            MatchMode::GroupGated
        } else {
            MatchMode::Anywhere
        },
        missing_value: if matches.get_flag("hold-last") {
            MissingValue::HoldLast
        } else {
            MissingValue::Zero
        },
    };
    let log_file = matches.get_one::<String>("file").map(PathBuf::from);

    if matches.get_flag("interactive") {
        if let Some(path) = &log_file {
            validate_source_path(path)?;
        }
        let mut session = Session::with_state(&catalog, selection, log_file, options);
        let stdin = io::stdin();
        let mut stdout = io::stdout();
        session.run(stdin.lock(), &mut stdout)?;
        return Ok(());
    }

    let Some(log_file) = log_file else {
        build_command().print_help()?;
        println!();
        std::process::exit(1);
    };

    if selection.is_empty() {
        eprintln!("Warning: no parameters selected; only timestamps will be exported");
    }

    export_log(&log_file, &catalog, &selection, &options)
}

fn build_selection(matches: &clap::ArgMatches, catalog: &Catalog) -> Result<SelectionSet> {
    let mut selection = load_preset(matches.get_one::<String>("selection-file"), catalog)?;

    for target in matches.get_many::<String>("select").into_iter().flatten() {
        let parsed = ToggleTarget::parse(target)?;
        selection
            .toggle_add(catalog, &parsed)
            .with_context(|| format!("Cannot select '{target}'"))?;
    }
    for target in matches.get_many::<String>("deselect").into_iter().flatten() {
        let parsed = ToggleTarget::parse(target)?;
        selection
            .toggle_remove(catalog, &parsed)
            .with_context(|| format!("Cannot deselect '{target}'"))?;
    }

    Ok(selection)
}

#[cfg(feature = "json")]
fn load_preset(path: Option<&String>, catalog: &Catalog) -> Result<SelectionSet> {
    match path {
        Some(path) => {
            let json = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read selection file: {path}"))?;
            Ok(SelectionSet::from_json(catalog, &json)
                .with_context(|| format!("Invalid selection file: {path}"))?)
        }
        None => Ok(SelectionSet::new()),
    }
}

#[cfg(not(feature = "json"))]
fn load_preset(path: Option<&String>, _catalog: &Catalog) -> Result<SelectionSet> {
    if path.is_some() {
        anyhow::bail!("--selection-file requires the json feature");
    }
    Ok(SelectionSet::new())
}

fn export_log(
    log_file: &Path,
    catalog: &Catalog,
    selection: &SelectionSet,
    options: &ExportOptions,
) -> Result<()> {
    let filename = log_file
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("unknown");
    println!("Processing: {filename}");

    let report = export_to_csv(log_file, catalog, selection, options)
        .with_context(|| format!("Failed to parse {filename}"))?;

    println!(
        "Exported {} rows ({} columns) to: {}",
        report.rows_written,
        report.header.len(),
        report.output_path.display()
    );
    Ok(())
}

fn print_catalog(catalog: &Catalog) -> Result<()> {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    for run in catalog.groups() {
        writeln!(out, "{}", run.name)?;
        for member in &run.members {
            writeln!(out, "    {member}")?;
        }
    }
    Ok(())
}
