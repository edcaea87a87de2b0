//! Example-sentence index for context re-ranking.
//!
//! Every word of every sentence becomes one element carrying its (masked)
//! word id. Elements with the same id are chained through `next_idx`, and
//! an open-addressed bucket table maps an id to the first element of its
//! chain.

use std::fs::{self, File};
use std::path::Path;

use memmap2::Mmap;
use serde::{Deserialize, Serialize};

use super::{check_header, word_id, write_header, DictError};

const MAGIC: &[u8; 4] = b"HKCP";
const VERSION: u8 = 1;

const BUCKET_SIZE: usize = 8192;
const MAX_COLLISION: usize = 8;
const MAX_CHAIN: usize = 100;
const KEY_MASK: u32 = 0x0fff_ffff;
/// How far to each side an occurrence's context reaches.
const CONTEXT_SPAN: usize = 2;

const ELM_BOS: u8 = 1;
const ELM_WORD_BORDER: u8 = 1 << 1;

#[derive(Debug, Clone, Serialize, Deserialize)]
struct Element {
    val: u32,
    next_idx: Option<u32>,
    flags: u8,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct Bucket {
    key: Option<u32>,
    first_idx: Option<u32>,
    last_idx: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorpusIndex {
    elements: Vec<Element>,
    buckets: Vec<Bucket>,
    /// Ids dropped at build time because every probe slot was taken.
    collisions: usize,
}

impl CorpusIndex {
    /// Build from sentences given as word-id sequences.
    pub fn build<I, S>(sentences: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<[u32]>,
    {
        let mut elements = Vec::new();
        for sentence in sentences {
            for (i, &id) in sentence.as_ref().iter().enumerate() {
                let mut flags = ELM_WORD_BORDER;
                if i == 0 {
                    flags |= ELM_BOS;
                }
                elements.push(Element {
                    val: id & KEY_MASK,
                    next_idx: None,
                    flags,
                });
            }
        }
        let mut index = CorpusIndex {
            elements,
            buckets: vec![Bucket::default(); BUCKET_SIZE],
            collisions: 0,
        };
        index.link();
        index
    }

    /// Parse sentences, one per line, as whitespace-separated `reading=literal` words.
    pub fn parse_text(text: &str) -> Result<Self, DictError> {
        let mut sentences = Vec::new();
        for (lineno, raw) in text.lines().enumerate() {
            let line = raw.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let mut ids = Vec::new();
            for word in line.split_whitespace() {
                let (reading, surface) = word.split_once('=').ok_or_else(|| {
                    DictError::Parse(format!("line {}: expected reading=literal: {word}", lineno + 1))
                })?;
                ids.push(word_id(reading, surface));
            }
            sentences.push(ids);
        }
        Ok(Self::build(sentences))
    }

    fn link(&mut self) {
        for i in 0..self.elements.len() {
            let val = self.elements[i].val;
            let Some(b) = self.claim_bucket(val) else {
                self.collisions += 1;
                continue;
            };
            let idx = i as u32;
            match self.buckets[b].last_idx {
                None => self.buckets[b].first_idx = Some(idx),
                Some(last) => self.elements[last as usize].next_idx = Some(idx),
            }
            self.buckets[b].last_idx = Some(idx);
        }
    }

    fn claim_bucket(&mut self, val: u32) -> Option<usize> {
        let n = self.buckets.len();
        let mut h = val as usize % n;
        for _ in 0..MAX_COLLISION {
            match self.buckets[h].key {
                Some(k) if k == val => return Some(h),
                None => {
                    self.buckets[h].key = Some(val);
                    return Some(h);
                }
                _ => h = (h + 1) % n,
            }
        }
        None
    }

    fn find_bucket(&self, val: u32) -> Option<&Bucket> {
        let n = self.buckets.len();
        if n == 0 {
            return None;
        }
        let mut h = val as usize % n;
        for _ in 0..MAX_COLLISION {
            let bucket = &self.buckets[h];
            match bucket.key {
                Some(k) if k == val => return Some(bucket),
                None => return None,
                _ => h = (h + 1) % n,
            }
        }
        None
    }

    /// Element indices where `id` occurs, at most `MAX_CHAIN` of them.
    pub fn occurrences(&self, id: u32) -> Vec<usize> {
        let mut out = Vec::new();
        let Some(bucket) = self.find_bucket(id & KEY_MASK) else {
            return out;
        };
        let mut cur = bucket.first_idx;
        while let Some(idx) = cur {
            if out.len() >= MAX_CHAIN {
                break;
            }
            out.push(idx as usize);
            cur = self.elements.get(idx as usize).and_then(|e| e.next_idx);
        }
        out
    }

    /// Ids within `CONTEXT_SPAN` words of element `idx`, bounded by its sentence.
    fn neighbors(&self, idx: usize) -> Vec<u32> {
        let mut out = Vec::with_capacity(CONTEXT_SPAN * 2);
        let mut i = idx;
        for _ in 0..CONTEXT_SPAN {
            if i == 0 || self.elements[i].flags & ELM_BOS != 0 {
                break;
            }
            i -= 1;
            out.push(self.elements[i].val);
        }
        for j in idx + 1..(idx + 1 + CONTEXT_SPAN).min(self.elements.len()) {
            if self.elements[j].flags & ELM_BOS != 0 {
                break;
            }
            out.push(self.elements[j].val);
        }
        out
    }

    /// Does `id` appear somewhere whose neighbors overlap `context` by half or more?
    pub fn is_similar(&self, id: u32, context: &[u32]) -> bool {
        if context.is_empty() {
            return false;
        }
        let context: Vec<u32> = context.iter().map(|c| c & KEY_MASK).collect();
        self.occurrences(id).into_iter().any(|idx| {
            let near = self.neighbors(idx);
            let hits = context.iter().filter(|c| near.contains(c)).count();
            hits * 2 >= context.len()
        })
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    pub fn collisions(&self) -> usize {
        self.collisions
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>, DictError> {
        let payload = bincode::serialize(self).map_err(DictError::Serialize)?;
        Ok(write_header(MAGIC, VERSION, &payload))
    }

    pub fn from_bytes(data: &[u8]) -> Result<Self, DictError> {
        let payload = check_header(data, MAGIC, VERSION)?;
        bincode::deserialize(payload).map_err(DictError::Deserialize)
    }

    pub fn open(path: &Path) -> Result<Self, DictError> {
        let file = File::open(path)?;
        // SAFETY: The file is opened read-only and the mapping is immutable.
        let mmap = unsafe { Mmap::map(&file)? };
        Self::from_bytes(&mmap)
    }

    pub fn save(&self, path: &Path) -> Result<(), DictError> {
        Ok(fs::write(path, self.to_bytes()?)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chains_link_every_occurrence() {
        let index = CorpusIndex::build([vec![1, 2, 3], vec![4, 2, 5]]);
        assert_eq!(index.len(), 6);
        assert_eq!(index.occurrences(2), vec![1, 4]);
        assert!(index.occurrences(99).is_empty());
    }

    #[test]
    fn similarity_stops_at_sentence_bounds() {
        let index = CorpusIndex::build([vec![10, 20, 30], vec![40, 50, 60]]);
        // 30 is followed by 40 only across a sentence boundary
        assert!(!index.is_similar(30, &[40]));
        assert!(index.is_similar(20, &[10, 30]));
        assert!(index.is_similar(20, &[10, 99]));
        assert!(!index.is_similar(20, &[98, 99, 97]));
        assert!(!index.is_similar(20, &[]));
    }

    #[test]
    fn colliding_ids_stay_reachable() {
        let n = BUCKET_SIZE as u32;
        let ids: Vec<u32> = (0..MAX_COLLISION as u32).map(|k| 5 + k * n).collect();
        let index = CorpusIndex::build([ids.clone()]);
        assert_eq!(index.collisions(), 0);
        for (i, &id) in ids.iter().enumerate() {
            assert_eq!(index.occurrences(id), vec![i], "id {id}");
        }

        // One more id than there are probe slots is dropped and counted.
        let overflow = 5 + MAX_COLLISION as u32 * n;
        let index = CorpusIndex::build([ids.iter().copied().chain([overflow]).collect::<Vec<_>>()]);
        assert_eq!(index.collisions(), 1);
        assert!(index.occurrences(overflow).is_empty());
    }

    #[test]
    fn chain_is_capped() {
        let sentences: Vec<Vec<u32>> = (0..150).map(|_| vec![7]).collect();
        let index = CorpusIndex::build(sentences);
        assert_eq!(index.occurrences(7).len(), MAX_CHAIN);
    }

    #[test]
    fn text_and_binary_round_trip() {
        let index = CorpusIndex::parse_text("きょう=今日 は=は てんき=天気\n").unwrap();
        let bytes = index.to_bytes().unwrap();
        let loaded = CorpusIndex::from_bytes(&bytes).unwrap();
        let kyou = word_id("きょう", "今日");
        let tenki = word_id("てんき", "天気");
        assert!(loaded.is_similar(kyou, &[tenki]));
        assert!(CorpusIndex::parse_text("bad").is_err());
    }
}
