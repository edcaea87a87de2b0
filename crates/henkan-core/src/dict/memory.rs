use std::collections::{BTreeMap, BTreeSet};
use std::fs::{self, File};
use std::path::Path;

use memmap2::Mmap;
use serde::{Deserialize, Serialize};

use super::{
    check_header, word_id, write_header, CompoundEntry, DictEntry, DictError, Dictionary,
    SeqEntry,
};
use crate::pos::WordType;

const MAGIC: &[u8; 4] = b"HKDX";
const VERSION: u8 = 1;

/// In-memory dictionary keyed by reading.
///
/// Entries under one reading are kept ordered by descending frequency so
/// that candidate enumeration naturally visits common words first.
#[derive(Debug, Default, Clone)]
pub struct MemoryDictionary {
    readings: BTreeMap<String, SeqEntry>,
    reverse: BTreeMap<String, SeqEntry>,
    weak: BTreeSet<String>,
    relations: BTreeSet<(u32, u32)>,
}

/// Flat serialization format for bincode.
#[derive(Serialize, Deserialize)]
struct DictData {
    readings: Vec<(String, SeqEntry)>,
    weak: Vec<String>,
    relations: Vec<(u32, u32)>,
}

fn insert_sorted(entries: &mut Vec<DictEntry>, entry: DictEntry) {
    if let Some(i) = entries
        .iter()
        .position(|e| e.surface == entry.surface && e.wtype == entry.wtype)
    {
        let existing = entries.remove(i);
        let merged = DictEntry {
            freq: existing.freq.max(entry.freq),
            ..existing
        };
        return insert_sorted(entries, merged);
    }
    let at = entries.partition_point(|e| e.freq >= entry.freq);
    entries.insert(at, entry);
}

impl MemoryDictionary {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_entries(
        words: impl IntoIterator<Item = (String, String, WordType, i32)>,
    ) -> Self {
        let mut dict = Self::new();
        for (reading, surface, wtype, freq) in words {
            dict.insert_word(&reading, &surface, wtype, freq);
        }
        dict
    }

    /// Add a word; a duplicate (same literal and type) keeps the higher frequency.
    pub fn insert_word(&mut self, reading: &str, surface: &str, wtype: WordType, freq: i32) {
        let id = word_id(reading, surface);
        insert_sorted(
            &mut self.readings.entry(reading.to_string()).or_default().entries,
            DictEntry {
                surface: surface.to_string(),
                wtype,
                freq,
                id,
            },
        );
        insert_sorted(
            &mut self.reverse.entry(surface.to_string()).or_default().entries,
            DictEntry {
                surface: reading.to_string(),
                wtype,
                freq,
                id,
            },
        );
    }

    pub fn insert_compound(&mut self, reading: &str, compound: CompoundEntry) {
        let se = self.readings.entry(reading.to_string()).or_default();
        let at = se.compounds.partition_point(|c| c.freq >= compound.freq);
        se.compounds.insert(at, compound);
    }

    pub fn mark_weak(&mut self, reading: &str) {
        self.weak.insert(reading.to_string());
    }

    pub fn add_relation(&mut self, from: u32, to: u32) {
        self.relations.insert((from, to));
    }

    fn rebuild_reverse(&mut self) {
        self.reverse.clear();
        for (reading, se) in &self.readings {
            for e in &se.entries {
                insert_sorted(
                    &mut self.reverse.entry(e.surface.clone()).or_default().entries,
                    DictEntry {
                        surface: reading.clone(),
                        ..e.clone()
                    },
                );
            }
        }
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>, DictError> {
        let data = DictData {
            readings: self
                .readings
                .iter()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
            weak: self.weak.iter().cloned().collect(),
            relations: self.relations.iter().copied().collect(),
        };
        let payload = bincode::serialize(&data).map_err(DictError::Serialize)?;
        Ok(write_header(MAGIC, VERSION, &payload))
    }

    pub fn from_bytes(data: &[u8]) -> Result<Self, DictError> {
        let payload = check_header(data, MAGIC, VERSION)?;
        let data: DictData = bincode::deserialize(payload).map_err(DictError::Deserialize)?;
        let mut dict = Self {
            readings: data.readings.into_iter().collect(),
            reverse: BTreeMap::new(),
            weak: data.weak.into_iter().collect(),
            relations: data.relations.into_iter().collect(),
        };
        dict.rebuild_reverse();
        Ok(dict)
    }

    /// Open a dictionary file through a read-only mapping.
    pub fn open(path: &Path) -> Result<Self, DictError> {
        let file = File::open(path)?;
        // SAFETY: The file is opened read-only and the mapping is immutable.
        // The Mmap is dropped after deserialization completes below.
        let mmap = unsafe { Mmap::map(&file)? };
        Self::from_bytes(&mmap)
    }

    pub fn save(&self, path: &Path) -> Result<(), DictError> {
        Ok(fs::write(path, self.to_bytes()?)?)
    }

    /// Iterate over all `(reading, entries)` pairs in reading order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &SeqEntry)> {
        self.readings.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Returns (reading_count, entry_count, compound_count).
    pub fn stats(&self) -> (usize, usize, usize) {
        let readings = self.readings.len();
        let entries = self.readings.values().map(|v| v.entries.len()).sum();
        let compounds = self.readings.values().map(|v| v.compounds.len()).sum();
        (readings, entries, compounds)
    }
}

impl Dictionary for MemoryDictionary {
    fn lookup(&self, reading: &str) -> Option<&SeqEntry> {
        self.readings.get(reading)
    }

    fn lookup_reverse(&self, surface: &str) -> Option<&SeqEntry> {
        self.reverse.get(surface)
    }

    fn is_weak(&self, reading: &str) -> bool {
        self.weak.contains(reading)
    }

    fn check_relation(&self, from: u32, to: u32) -> bool {
        self.relations.contains(&(from, to))
    }
}
