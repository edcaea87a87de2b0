//! Dictionary storage and lookups.
//!
//! `MemoryDictionary` stores reading → [`SeqEntry`] mappings together with
//! the reverse (literal → reading) index, weak-reading flags and the static
//! word-relation set. `CorpusIndex` answers context co-occurrence queries.

mod corpus;
mod entry;
mod memory;
mod text_io;

pub use corpus::CorpusIndex;
pub use entry::{CompoundEntry, CompoundSegment, DictEntry, SeqEntry};
pub use memory::MemoryDictionary;
pub use text_io::parse_dictionary_text;

use std::io;

/// Unified error type for the binary and text formats owned by this crate.
///
/// Covers the dictionary (HKDX), corpus index (HKCP), feature model (HKFM),
/// learning store (HKLR) and the text sources they are compiled from.
#[derive(Debug, thiserror::Error)]
pub enum DictError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("invalid header (too short)")]
    InvalidHeader,

    #[error("invalid magic bytes")]
    InvalidMagic,

    #[error("unsupported version: {0}")]
    UnsupportedVersion(u8),

    #[error("serialization error: {0}")]
    Serialize(bincode::Error),

    #[error("deserialization error: {0}")]
    Deserialize(bincode::Error),

    #[error("parse error: {0}")]
    Parse(String),
}

/// Lookup direction: reading → literal, or literal → reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Direction {
    #[default]
    Forward,
    Reverse,
}

pub trait Dictionary: Send + Sync {
    fn lookup(&self, reading: &str) -> Option<&SeqEntry>;

    /// Entries whose literal is `surface`, with the reading as their surface.
    fn lookup_reverse(&self, _surface: &str) -> Option<&SeqEntry> {
        None
    }

    /// Readings flagged as weak words.
    fn is_weak(&self, _reading: &str) -> bool {
        false
    }

    /// Static word relation between two word ids.
    fn check_relation(&self, _from: u32, _to: u32) -> bool {
        false
    }

    fn lookup_in(&self, key: &str, dir: Direction) -> Option<&SeqEntry> {
        match dir {
            Direction::Forward => self.lookup(key),
            Direction::Reverse => self.lookup_reverse(key),
        }
    }
}

/// Stable 32-bit id of a (reading, literal) pair (FNV-1a).
pub fn word_id(reading: &str, surface: &str) -> u32 {
    let mut h: u32 = 0x811c_9dc5;
    for b in reading.bytes().chain([0u8]).chain(surface.bytes()) {
        h ^= b as u32;
        h = h.wrapping_mul(0x0100_0193);
    }
    h
}

/// Read the `magic + version` header shared by every binary file here.
pub(crate) fn check_header<'a>(
    data: &'a [u8],
    magic: &[u8; 4],
    version: u8,
) -> Result<&'a [u8], DictError> {
    if data.len() < 5 {
        return Err(DictError::InvalidHeader);
    }
    if &data[..4] != magic {
        return Err(DictError::InvalidMagic);
    }
    if data[4] != version {
        return Err(DictError::UnsupportedVersion(data[4]));
    }
    Ok(&data[5..])
}

pub(crate) fn write_header(magic: &[u8; 4], version: u8, payload: &[u8]) -> Vec<u8> {
    let mut buf = Vec::with_capacity(5 + payload.len());
    buf.extend_from_slice(magic);
    buf.push(version);
    buf.extend_from_slice(payload);
    buf
}
