use crate::error::{Result, TlogError};
use crate::types::Catalog;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

#[cfg(feature = "serde")]
use serde::Serialize;

/// What a toggle acts on: one parameter or a whole group
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToggleTarget {
    Group(String),
    Member { group: String, member: String },
}

impl ToggleTarget {
    /// Parse `GROUP` or `GROUP.member`
    pub fn parse(text: &str) -> Result<Self> {
        let text = text.trim();
        match text.split_once('.') {
            Some((group, member)) => {
                if group.is_empty() || member.is_empty() || member.contains('.') {
                    return Err(TlogError::InvalidTarget(text.to_string()));
                }
                Ok(ToggleTarget::Member {
                    group: group.to_string(),
                    member: member.to_string(),
                })
            }
            None if text.is_empty() => Err(TlogError::InvalidTarget(text.to_string())),
            None => Ok(ToggleTarget::Group(text.to_string())),
        }
    }
}

impl fmt::Display for ToggleTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ToggleTarget::Group(group) => write!(f, "{}", group),
            ToggleTarget::Member { group, member } => write!(f, "{}.{}", group, member),
        }
    }
}

/// Parameters chosen for export, keyed by group.
///
/// Mutation goes through [`SelectionSet::toggle_add`] and
/// [`SelectionSet::toggle_remove`], which check every member against the
/// catalog. A group key never maps to an empty set.
///
/// Only `Serialize` is derived. Presets are read back through
/// [`SelectionSet::from_json`], which needs the catalog to validate them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct SelectionSet {
    groups: BTreeMap<String, BTreeSet<String>>,
}

impl SelectionSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a member, or replace a group's selection with all of its members.
    ///
    /// Returns whether the selection changed.
    pub fn toggle_add(&mut self, catalog: &Catalog, target: &ToggleTarget) -> Result<bool> {
        match target {
            ToggleTarget::Member { group, member } => {
                if !catalog.contains(group, member) {
                    return Err(unknown(catalog, group, member));
                }
                Ok(self
                    .groups
                    .entry(group.clone())
                    .or_default()
                    .insert(member.clone()))
            }
            ToggleTarget::Group(group) => {
                let members: BTreeSet<String> = catalog
                    .members_of(group)
                    .into_iter()
                    .map(str::to_string)
                    .collect();
                if members.is_empty() {
                    return Err(TlogError::UnknownGroup(group.clone()));
                }
                let previous = self.groups.insert(group.clone(), members);
                Ok(previous.as_ref() != self.groups.get(group))
            }
        }
    }

    /// Remove a member, or a whole group key with all of its members.
    ///
    /// Returns whether the selection changed.
    pub fn toggle_remove(&mut self, catalog: &Catalog, target: &ToggleTarget) -> Result<bool> {
        match target {
            ToggleTarget::Member { group, member } => {
                if !catalog.contains(group, member) {
                    return Err(unknown(catalog, group, member));
                }
                let Some(members) = self.groups.get_mut(group) else {
                    return Ok(false);
                };
                let removed = members.remove(member);
                if members.is_empty() {
                    self.groups.remove(group);
                }
                Ok(removed)
            }
            ToggleTarget::Group(group) => {
                if !catalog.has_group(group) {
                    return Err(TlogError::UnknownGroup(group.clone()));
                }
                Ok(self.groups.remove(group).is_some())
            }
        }
    }

    pub fn clear(&mut self) {
        self.groups.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Number of selected parameters across all groups
    pub fn len(&self) -> usize {
        self.groups.values().map(BTreeSet::len).sum()
    }

    pub fn contains(&self, group: &str, member: &str) -> bool {
        self.groups
            .get(group)
            .is_some_and(|members| members.contains(member))
    }

    pub fn members(&self, group: &str) -> Option<&BTreeSet<String>> {
        self.groups.get(group)
    }

    /// Selected groups and their members, ordered by name
    pub fn iter(&self) -> impl Iterator<Item = (&String, &BTreeSet<String>)> {
        self.groups.iter()
    }

    /// Serialize the selection as a JSON preset
    #[cfg(feature = "json")]
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(&self.groups)?)
    }

    /// Load a JSON preset, replaying every entry through `toggle_add` so the
    /// result only holds catalog members.
    #[cfg(feature = "json")]
    pub fn from_json(catalog: &Catalog, json: &str) -> Result<Self> {
        let raw: BTreeMap<String, BTreeSet<String>> = serde_json::from_str(json)?;
        let mut selection = SelectionSet::new();
        for (group, members) in raw {
            for member in members {
                selection.toggle_add(catalog, &ToggleTarget::Member {
                    group: group.clone(),
                    member,
                })?;
            }
        }
        Ok(selection)
    }
}

fn unknown(catalog: &Catalog, group: &str, member: &str) -> TlogError {
    if catalog.has_group(group) {
        TlogError::UnknownParameter {
            group: group.to_string(),
            member: member.to_string(),
        }
    } else {
        TlogError::UnknownGroup(group.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ParameterEntry;

    fn catalog() -> Catalog {
        Catalog::from_entries(vec![
            ParameterEntry::new("GPS", "ALT"),
            ParameterEntry::new("GPS", "LAT"),
            ParameterEntry::new("GPS", "LON"),
            ParameterEntry::new("HUD", "SPD"),
        ])
    }

    fn member(group: &str, member: &str) -> ToggleTarget {
        ToggleTarget::Member {
            group: group.to_string(),
            member: member.to_string(),
        }
    }

    #[test]
    fn test_parse_targets() {
        assert_eq!(
            ToggleTarget::parse("GPS").unwrap(),
            ToggleTarget::Group("GPS".to_string())
        );
        assert_eq!(ToggleTarget::parse(" GPS.ALT ").unwrap(), member("GPS", "ALT"));
        assert!(ToggleTarget::parse("").is_err());
        assert!(ToggleTarget::parse(".ALT").is_err());
        assert!(ToggleTarget::parse("GPS.").is_err());
        assert!(ToggleTarget::parse("A.B.C").is_err());
    }

    #[test]
    fn test_add_member_is_idempotent() {
        let catalog = catalog();
        let mut once = SelectionSet::new();
        assert!(once.toggle_add(&catalog, &member("GPS", "ALT")).unwrap());

        let mut twice = once.clone();
        assert!(!twice.toggle_add(&catalog, &member("GPS", "ALT")).unwrap());
        assert_eq!(once, twice);
        assert_eq!(once.len(), 1);
    }

    #[test]
    fn test_group_add_then_remove_is_empty() {
        let catalog = catalog();
        let mut selection = SelectionSet::new();
        let gps = ToggleTarget::Group("GPS".to_string());

        selection.toggle_add(&catalog, &gps).unwrap();
        assert_eq!(selection.len(), 3);
        selection.toggle_remove(&catalog, &gps).unwrap();
        assert!(selection.is_empty());
    }

    #[test]
    fn test_group_add_replaces_partial_selection() {
        let catalog = catalog();
        let mut selection = SelectionSet::new();
        let gps = ToggleTarget::Group("GPS".to_string());

        selection.toggle_add(&catalog, &member("GPS", "LAT")).unwrap();
        assert!(selection.toggle_add(&catalog, &gps).unwrap());
        assert_eq!(selection.members("GPS").unwrap().len(), 3);

        // second group toggle re-adds the same full set
        assert!(!selection.toggle_add(&catalog, &gps).unwrap());
        assert_eq!(selection.len(), 3);
    }

    #[test]
    fn test_removing_last_member_drops_group_key() {
        let catalog = catalog();
        let mut selection = SelectionSet::new();
        selection.toggle_add(&catalog, &member("HUD", "SPD")).unwrap();
        selection.toggle_add(&catalog, &member("GPS", "ALT")).unwrap();

        assert!(selection.toggle_remove(&catalog, &member("HUD", "SPD")).unwrap());
        assert!(selection.members("HUD").is_none());
        assert!(selection.contains("GPS", "ALT"));

        // not selected: no change
        assert!(!selection.toggle_remove(&catalog, &member("HUD", "SPD")).unwrap());
    }

    #[test]
    fn test_rejects_members_outside_catalog() {
        let catalog = catalog();
        let mut selection = SelectionSet::new();

        let err = selection
            .toggle_add(&catalog, &member("GPS", "SPD"))
            .unwrap_err();
        assert!(matches!(err, TlogError::UnknownParameter { .. }));

        let err = selection
            .toggle_add(&catalog, &ToggleTarget::Group("BARO".to_string()))
            .unwrap_err();
        assert!(matches!(err, TlogError::UnknownGroup(_)));
        assert!(selection.is_empty());
    }

    #[cfg(feature = "json")]
    #[test]
    fn test_json_preset_is_validated() {
        let catalog = catalog();
        let mut selection = SelectionSet::new();
        selection
            .toggle_add(&catalog, &ToggleTarget::Group("GPS".to_string()))
            .unwrap();

        let json = selection.to_json().unwrap();
        assert_eq!(SelectionSet::from_json(&catalog, &json).unwrap(), selection);

        let bad = r#"{"GPS": ["ALT", "HEADING"]}"#;
        assert!(SelectionSet::from_json(&catalog, bad).is_err());
    }
}
