use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use tempfile::TempDir;

/// Integration tests for the command-line binary and its CSV output

const CATALOG: &str = "\
roll.ATTITUDE
pitch.ATTITUDE
yaw_.ATTITUDE
lat.__GPS_RAW_INT
lon.GPS_RAW_INT
alt.GPS_RAW_INT
groundspeed.VFR_HUD
alt.VFR_HUD
";

const LOG: &str = "\
2024-06-01 10:00:00.000,mavpackettype,ATTITUDE,roll,0.01,pitch,-0.02,yaw,1.57
2024-06-01 10:00:00.100,mavpackettype,GPS_RAW_INT,lat,-353632621,lon,1491652374,alt,584070
2024-06-01 10:00:00.200,mavpackettype,VFR_HUD,groundspeed,12.5,alt,584.1
2024-06-01 10:00:00.300,mavpackettype,ATTITUDE,roll,0.02,pitch,-0.01,yaw,1.58
";

fn setup() -> (TempDir, PathBuf, PathBuf) {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let catalog = temp_dir.path().join("tlog_params.txt");
    fs::write(&catalog, CATALOG).expect("Failed to write catalog");
    let log = temp_dir.path().join("flight.csv");
    fs::write(&log, LOG).expect("Failed to write log");
    (temp_dir, catalog, log)
}

fn run_parser(catalog: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_tlog_parser"))
        .arg("--catalog")
        .arg(catalog)
        .args(args)
        .output()
        .expect("Failed to run tlog_parser")
}

#[test]
fn test_csv_field_count_consistency() {
    let (_temp_dir, catalog, log) = setup();
    let output = run_parser(
        &catalog,
        &["--select", "ATTITUDE", "--select", "GPS_RAW_INT.lat", log.to_str().unwrap()],
    );

    assert!(
        output.status.success(),
        "Parser failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );

    let csv_path = log.with_file_name("flight_parsed.csv");
    let csv_content = fs::read_to_string(&csv_path).expect("Failed to read generated CSV file");
    let lines: Vec<&str> = csv_content.lines().collect();
    assert_eq!(lines.len(), 5, "Header plus one row per log line");

    let header_fields = lines[0].split(',').count();
    assert_eq!(
        lines[0],
        "Timestamp,ATTITUDE.roll,ATTITUDE.pitch,ATTITUDE.yaw,GPS_RAW_INT.lat"
    );

    for (i, line) in lines.iter().enumerate().skip(1) {
        let field_count = line.split(',').count();
        assert_eq!(
            field_count,
            header_fields,
            "Row {} has {} fields, but header has {} fields. Row content: {}",
            i + 1,
            field_count,
            header_fields,
            line
        );
    }

    assert_eq!(lines[1], "2024-06-01 10:00:00.000,0.01,-0.02,1.57,0");
    assert_eq!(lines[2], "2024-06-01 10:00:00.100,0,0,0,-353632621");
}

#[test]
fn test_shared_member_names_with_group_gating() {
    let (temp_dir, catalog, log) = setup();
    let out = temp_dir.path().join("alt.csv");
    let output = run_parser(
        &catalog,
        &[
            "--select",
            "GPS_RAW_INT.alt",
            "--select",
            "VFR_HUD.alt",
            "--group-gated",
            "--output",
            out.to_str().unwrap(),
            log.to_str().unwrap(),
        ],
    );
    assert!(
        output.status.success(),
        "Parser failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );

    let csv_content = fs::read_to_string(&out).expect("Failed to read generated CSV file");
    let lines: Vec<&str> = csv_content.lines().collect();
    assert_eq!(lines[0], "Timestamp,GPS_RAW_INT.alt,VFR_HUD.alt");
    assert_eq!(lines[2], "2024-06-01 10:00:00.100,584070,0");
    assert_eq!(lines[3], "2024-06-01 10:00:00.200,0,584.1");
}

#[test]
fn test_deselect_after_select() {
    let (_temp_dir, catalog, log) = setup();
    let output = run_parser(
        &catalog,
        &[
            "--select",
            "ATTITUDE",
            "--deselect",
            "ATTITUDE.yaw",
            log.to_str().unwrap(),
        ],
    );
    assert!(output.status.success());

    let csv_content = fs::read_to_string(log.with_file_name("flight_parsed.csv"))
        .expect("Failed to read generated CSV file");
    assert!(csv_content.starts_with("Timestamp,ATTITUDE.roll,ATTITUDE.pitch\n"));
}

#[test]
fn test_unknown_parameter_fails() {
    let (_temp_dir, catalog, log) = setup();
    let output = run_parser(&catalog, &["--select", "ATTITUDE.heading", log.to_str().unwrap()]);

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("Unknown parameter: ATTITUDE.heading"),
        "stderr: {stderr}"
    );
}

#[test]
fn test_bad_extension_fails() {
    let (temp_dir, catalog, _log) = setup();
    let bin = temp_dir.path().join("flight.tlog");
    fs::write(&bin, "1,roll,2\n").expect("Failed to write log");

    let output = run_parser(&catalog, &["--select", "ATTITUDE", bin.to_str().unwrap()]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("Not a CSV file"));
}

#[test]
fn test_list_params() {
    let (_temp_dir, catalog, _log) = setup();
    let output = run_parser(&catalog, &["--list-params"]);
    assert!(output.status.success());

    let stdout = String::from_utf8_lossy(&output.stdout);
    let lines: Vec<&str> = stdout.lines().collect();
    assert_eq!(lines[0], "ATTITUDE");
    assert_eq!(lines[3], "    yaw");
    assert_eq!(lines[4], "GPS_RAW_INT");
    assert!(stdout.contains("VFR_HUD\n    groundspeed\n    alt\n"));
}

#[test]
fn test_interactive_session() {
    use std::io::Write;
    use std::process::Stdio;

    let (temp_dir, catalog, log) = setup();
    let mut child = Command::new(env!("CARGO_BIN_EXE_tlog_parser"))
        .arg("--catalog")
        .arg(&catalog)
        .arg("--interactive")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("Failed to spawn tlog_parser");

    let script = format!(
        "open {}\nadd VFR_HUD\nremove VFR_HUD.alt\nadd NOPE\nparse\nquit\n",
        log.display()
    );
    child
        .stdin
        .take()
        .expect("stdin")
        .write_all(script.as_bytes())
        .expect("Failed to write script");
    let output = child.wait_with_output().expect("Failed to wait for session");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Error: Unknown parameter group: NOPE"));
    assert!(stdout.contains("Finished! 4 rows written"));

    let csv_content = fs::read_to_string(temp_dir.path().join("flight_parsed.csv"))
        .expect("Failed to read generated CSV file");
    assert!(csv_content.starts_with("Timestamp,VFR_HUD.groundspeed\n"));
}

#[test]
fn test_missing_output_directory_warns_once() {
    let (temp_dir, catalog, log) = setup();
    let target = temp_dir.path().join("missing").join("out.csv");
    let output = run_parser(
        &catalog,
        &["--select", "ATTITUDE", "--output", target.to_str().unwrap(), log.to_str().unwrap()],
    );

    assert!(output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert_eq!(
        stderr.matches("Destination directory does not exist").count(),
        1,
        "stderr: {stderr}"
    );
    assert!(log.with_file_name("flight_parsed.csv").exists());
    assert!(!target.exists());
}
