//! Learning record store.
//!
//! Named sections of keyed rows, each row an ordered list of integer or
//! string values. Rows carry a logical "last used" stamp so a section can be
//! truncated to its most recently used entries. Mutations are buffered as
//! [`RecordOp`]s and appended to a write-ahead log on [`RecordStore::flush`];
//! a periodic checkpoint rewrites the snapshot and truncates the log.

mod persistence;
#[cfg(test)]
mod tests;
mod wal;

pub use wal::RecordWal;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

const MAGIC: &[u8; 4] = b"HKLR";
const VERSION: u8 = 1;

/// Core literal → literal the user preferred instead.
pub const INDEPPAIR: &str = "INDEPPAIR";
/// Reading prefix → longer reading that a resize swallowed it into.
pub const EXPANDPAIR: &str = "EXPANDPAIR";
/// Joined reading → segment count then (length, literal) per segment.
pub const OCHAIRE: &str = "OCHAIRE";
/// Segment reading → recently committed literals, newest first.
pub const CAND_HISTORY: &str = "CAND_HISTORY";
/// Suffix reading → literal chosen for it.
pub const SUFFIX_HISTORY: &str = "SUFFIX_HISTORY";
/// Word id (hex) → ids of words committed next to it.
pub const WORD_RELATION: &str = "WORD_RELATION";
/// Reading → (timestamp, literal) pairs.
pub const PREDICTION: &str = "PREDICTION";

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Value {
    #[default]
    Empty,
    Int(i64),
    Text(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Row {
    values: Vec<Value>,
    last_used: u64,
}

impl Row {
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn values(&self) -> &[Value] {
        &self.values
    }

    pub fn last_used(&self) -> u64 {
        self.last_used
    }

    pub fn int(&self, n: usize) -> Option<i64> {
        match self.values.get(n) {
            Some(Value::Int(v)) => Some(*v),
            _ => None,
        }
    }

    pub fn text(&self, n: usize) -> Option<&str> {
        match self.values.get(n) {
            Some(Value::Text(s)) => Some(s),
            _ => None,
        }
    }

    fn slot(&mut self, n: usize) -> &mut Value {
        if self.values.len() <= n {
            self.values.resize(n + 1, Value::Empty);
        }
        &mut self.values[n]
    }

    pub fn set_int(&mut self, n: usize, v: i64) {
        *self.slot(n) = Value::Int(v);
    }

    pub fn set_text(&mut self, n: usize, s: &str) {
        *self.slot(n) = Value::Text(s.to_string());
    }

    pub fn push_text(&mut self, s: &str) {
        self.values.push(Value::Text(s.to_string()));
    }

    pub fn truncate(&mut self, len: usize) {
        self.values.truncate(len);
    }

    /// Iterate over the string values.
    pub fn texts(&self) -> impl Iterator<Item = &str> {
        self.values.iter().filter_map(|v| match v {
            Value::Text(s) => Some(s.as_str()),
            _ => None,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Section {
    rows: BTreeMap<String, Row>,
}

impl Section {
    pub fn row(&self, key: &str) -> Option<&Row> {
        self.rows.get(key)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Row)> {
        self.rows.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Row whose key is the longest prefix of `text`, at most `max_len` chars.
    pub fn longest_prefix(&self, text: &[char], max_len: usize) -> Option<(String, &Row)> {
        (1..=text.len().min(max_len)).rev().find_map(|len| {
            let key: String = text[..len].iter().collect();
            self.rows.get(&key).map(|row| (key, row))
        })
    }

    /// Rows whose key starts with `prefix`, in key order.
    pub fn with_prefix<'a>(&'a self, prefix: &'a str) -> impl Iterator<Item = (&'a str, &'a Row)> {
        self.rows
            .range(prefix.to_string()..)
            .take_while(move |(k, _)| k.starts_with(prefix))
            .map(|(k, v)| (k.as_str(), v))
    }
}

/// One logged mutation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum RecordOp {
    SetRow {
        section: String,
        key: String,
        row: Row,
    },
    RemoveRow {
        section: String,
        key: String,
    },
    ReleaseSection {
        section: String,
    },
}

#[derive(Debug, Default)]
pub struct RecordStore {
    sections: BTreeMap<String, Section>,
    clock: u64,
    pending: Vec<RecordOp>,
    wal: Option<RecordWal>,
}

impl RecordStore {
    /// Empty, memory-only store.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn section(&self, name: &str) -> Option<&Section> {
        self.sections.get(name)
    }

    pub fn section_names(&self) -> impl Iterator<Item = &str> {
        self.sections.keys().map(String::as_str)
    }

    pub fn row(&self, section: &str, key: &str) -> Option<&Row> {
        self.sections.get(section)?.row(key)
    }

    /// Modify (creating if needed) a row and mark it most recently used.
    pub fn update_row<F>(&mut self, section: &str, key: &str, f: F)
    where
        F: FnOnce(&mut Row),
    {
        self.clock += 1;
        let row = self
            .sections
            .entry(section.to_string())
            .or_default()
            .rows
            .entry(key.to_string())
            .or_default();
        f(row);
        row.last_used = self.clock;
        let row = row.clone();
        self.pending.push(RecordOp::SetRow {
            section: section.to_string(),
            key: key.to_string(),
            row,
        });
    }

    /// Mark an existing row used. Returns false when it does not exist.
    pub fn touch(&mut self, section: &str, key: &str) -> bool {
        if self.row(section, key).is_none() {
            return false;
        }
        self.update_row(section, key, |_| {});
        true
    }

    pub fn remove_row(&mut self, section: &str, key: &str) -> bool {
        let removed = self
            .sections
            .get_mut(section)
            .and_then(|s| s.rows.remove(key))
            .is_some();
        if removed {
            self.pending.push(RecordOp::RemoveRow {
                section: section.to_string(),
                key: key.to_string(),
            });
        }
        removed
    }

    pub fn release_section(&mut self, section: &str) {
        if self.sections.remove(section).is_some() {
            self.pending.push(RecordOp::ReleaseSection {
                section: section.to_string(),
            });
        }
    }

    /// Keep only the `keep` most recently used rows of a section.
    pub fn truncate_section(&mut self, section: &str, keep: usize) {
        let Some(sec) = self.sections.get(section) else {
            return;
        };
        if sec.rows.len() <= keep {
            return;
        }
        let mut by_age: Vec<(&String, u64)> =
            sec.rows.iter().map(|(k, r)| (k, r.last_used)).collect();
        by_age.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
        let stale: Vec<String> = by_age[keep..].iter().map(|(k, _)| (*k).clone()).collect();
        for key in stale {
            self.remove_row(section, &key);
        }
    }

    /// Mutations not yet written to the log.
    pub fn pending(&self) -> &[RecordOp] {
        &self.pending
    }

    fn apply(&mut self, op: RecordOp) {
        match op {
            RecordOp::SetRow { section, key, row } => {
                self.clock = self.clock.max(row.last_used);
                self.sections.entry(section).or_default().rows.insert(key, row);
            }
            RecordOp::RemoveRow { section, key } => {
                if let Some(s) = self.sections.get_mut(&section) {
                    s.rows.remove(&key);
                }
            }
            RecordOp::ReleaseSection { section } => {
                self.sections.remove(&section);
            }
        }
    }
}
