use crate::error::{Result, TlogError};
use crate::types::{Catalog, ParameterEntry};
use std::path::{Path, PathBuf};
use tracing::debug;

/// File name of the parameter definition file
pub const CATALOG_FILE_NAME: &str = "tlog_params.txt";

/// Parse a `member.group` definition file
///
/// Trailing underscores on the member and leading underscores on the group
/// mark group boundaries in the file and are stripped. Blank lines are ignored.
pub fn parse_catalog(text: &str) -> Result<Catalog> {
    let mut catalog = Catalog::new();

    for (index, raw) in text.lines().enumerate() {
        let line = raw.trim();
        if line.is_empty() {
            continue;
        }

        let malformed = || TlogError::MalformedCatalogEntry {
            line: index + 1,
            content: line.to_string(),
        };

        let mut parts = line.split('.');
        let (Some(member), Some(group), None) = (parts.next(), parts.next(), parts.next()) else {
            return Err(malformed());
        };

        let member = member.trim().trim_end_matches('_');
        let group = group.trim().trim_start_matches('_');
        if member.is_empty() || group.is_empty() {
            return Err(malformed());
        }

        catalog.push(ParameterEntry::new(group, member));
    }

    debug!(entries = catalog.len(), "Parsed parameter catalog");
    Ok(catalog)
}

/// Read and parse a definition file
pub fn load_catalog(path: &Path) -> Result<Catalog> {
    let text = std::fs::read_to_string(path)?;
    parse_catalog(&text)
}

/// Places the definition file is looked for: next to the executable, then
/// the working directory
pub fn catalog_search_paths() -> Vec<PathBuf> {
    let mut paths = Vec::new();
    if let Some(dir) = std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(Path::to_path_buf))
    {
        paths.push(dir.join(CATALOG_FILE_NAME));
    }
    paths.push(PathBuf::from(CATALOG_FILE_NAME));
    paths
}

/// Load the catalog from an explicit path, or from the first well-known
/// location that exists
pub fn locate_catalog(explicit: Option<&Path>) -> Result<(PathBuf, Catalog)> {
    if let Some(path) = explicit {
        return Ok((path.to_path_buf(), load_catalog(path)?));
    }

    let candidates = catalog_search_paths();
    for candidate in &candidates {
        if candidate.is_file() {
            debug!(path = %candidate.display(), "Using parameter catalog");
            return Ok((candidate.clone(), load_catalog(candidate)?));
        }
    }

    let searched: Vec<String> = candidates.iter().map(|p| p.display().to_string()).collect();
    Err(TlogError::Io(std::io::Error::new(
        std::io::ErrorKind::NotFound,
        format!(
            "parameter catalog not found (searched: {})",
            searched.join(", ")
        ),
    )))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_strips_boundary_underscores() {
        let catalog = parse_catalog("roll.ATTITUDE\npitch_._ATTITUDE\n\nlat.__GPS_RAW_INT\n").unwrap();
        let groups = catalog.groups();
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].name, "ATTITUDE");
        assert_eq!(groups[0].members, vec!["roll", "pitch"]);
        assert_eq!(groups[1].name, "GPS_RAW_INT");
        assert_eq!(groups[1].members, vec!["lat"]);
    }

    #[test]
    fn test_malformed_entries() {
        for bad in ["roll", "a.b.c", ".ATTITUDE", "roll.", "___.___"] {
            let err = parse_catalog(&format!("yaw.ATTITUDE\n{bad}\n")).unwrap_err();
            match err {
                TlogError::MalformedCatalogEntry { line, .. } => assert_eq!(line, 2),
                other => panic!("unexpected error for {bad:?}: {other}"),
            }
        }
    }

    #[test]
    fn test_definition_text_round_trip() {
        let text = "roll_.ATTITUDE\npitch.ATTITUDE\nlat.__GPS_RAW_INT\nyaw.ATTITUDE\n";
        let catalog = parse_catalog(text).unwrap();
        let reparsed = parse_catalog(&catalog.to_definition_text()).unwrap();
        assert_eq!(reparsed.groups(), catalog.groups());
    }

    #[test]
    fn test_bundled_catalog_parses() {
        let catalog = parse_catalog(include_str!("../../tlog_params.txt")).unwrap();
        let names = catalog.group_names();
        assert_eq!(names.len(), 11);
        assert_eq!(names[0], "HEARTBEAT");
        assert_eq!(catalog.groups().len(), names.len());
        assert!(catalog.contains("VFR_HUD", "groundspeed"));
        assert!(catalog.contains("HEARTBEAT", "mavlink_version"));
    }

    #[test]
    fn test_explicit_missing_catalog_is_io_error() {
        let err = locate_catalog(Some(Path::new("/nonexistent/tlog_params.txt"))).unwrap_err();
        assert!(matches!(err, TlogError::Io(_)));
    }
}
