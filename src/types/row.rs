#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Fields of one telemetry log line, split on `,`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogRow<'a> {
    fields: Vec<&'a str>,
}

impl<'a> LogRow<'a> {
    /// Split a line, dropping its `\n` or `\r\n` terminator first
    pub fn split(line: &'a str) -> Self {
        let line = line
            .strip_suffix('\n')
            .map(|l| l.strip_suffix('\r').unwrap_or(l))
            .unwrap_or(line);
        Self {
            fields: line.split(',').collect(),
        }
    }

    /// Field 0 of every line
    pub fn timestamp(&self) -> &'a str {
        self.fields.first().copied().unwrap_or("")
    }

    pub fn fields(&self) -> &[&'a str] {
        &self.fields
    }

    /// Value token following the first `name` token after the timestamp.
    ///
    /// A name in the last position has no value and counts as absent.
    pub fn value_of(&self, name: &str) -> Option<&'a str> {
        let position = self.fields.iter().skip(1).position(|field| *field == name)? + 1;
        self.fields.get(position + 1).copied()
    }

    /// Whether `token` appears as a field after the timestamp
    pub fn has_token(&self, token: &str) -> bool {
        self.fields.iter().skip(1).any(|field| *field == token)
    }
}

/// One extracted row: the timestamp and one value per selected column
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct OutputRow {
    pub timestamp: String,
    pub values: Vec<String>,
}

impl OutputRow {
    /// Values in header order, timestamp first
    pub fn record(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.timestamp.as_str()).chain(self.values.iter().map(String::as_str))
    }
}
