#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A single known telemetry parameter
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ParameterEntry {
    pub group: String,
    pub member: String,
}

impl ParameterEntry {
    pub fn new(group: impl Into<String>, member: impl Into<String>) -> Self {
        Self {
            group: group.into(),
            member: member.into(),
        }
    }

    /// Output column name, `group.member`
    pub fn column_name(&self) -> String {
        format!("{}.{}", self.group, self.member)
    }
}

/// A contiguous run of catalog entries sharing one group name
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct GroupRun {
    pub name: String,
    pub members: Vec<String>,
}

/// Ordered list of known parameters, in definition file order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Catalog {
    entries: Vec<ParameterEntry>,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_entries(entries: Vec<ParameterEntry>) -> Self {
        Self { entries }
    }

    pub fn push(&mut self, entry: ParameterEntry) {
        self.entries.push(entry);
    }

    pub fn entries(&self) -> &[ParameterEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Group the entries into contiguous runs.
    ///
    /// A group name that reappears after another group opens a new run, the
    /// same way the definition file reads top to bottom.
    pub fn groups(&self) -> Vec<GroupRun> {
        let mut runs: Vec<GroupRun> = Vec::new();
        for entry in &self.entries {
            match runs.last_mut() {
                Some(run) if run.name == entry.group => run.members.push(entry.member.clone()),
                _ => runs.push(GroupRun {
                    name: entry.group.clone(),
                    members: vec![entry.member.clone()],
                }),
            }
        }
        runs
    }

    /// Distinct group names in order of first appearance
    pub fn group_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = Vec::new();
        for entry in &self.entries {
            if !names.contains(&entry.group.as_str()) {
                names.push(&entry.group);
            }
        }
        names
    }

    pub fn has_group(&self, group: &str) -> bool {
        self.entries.iter().any(|e| e.group == group)
    }

    pub fn contains(&self, group: &str, member: &str) -> bool {
        self.entries
            .iter()
            .any(|e| e.group == group && e.member == member)
    }

    /// Every member of `group` across all of its runs, in catalog order
    pub fn members_of(&self, group: &str) -> Vec<&str> {
        let mut members: Vec<&str> = Vec::new();
        for entry in self.entries.iter().filter(|e| e.group == group) {
            if !members.contains(&entry.member.as_str()) {
                members.push(&entry.member);
            }
        }
        members
    }

    /// Serialize back to the `member.group` definition format
    pub fn to_definition_text(&self) -> String {
        let mut text = String::new();
        for entry in &self.entries {
            text.push_str(&entry.member);
            text.push('.');
            text.push_str(&entry.group);
            text.push('\n');
        }
        text
    }
}
