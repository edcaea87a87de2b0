use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{RecordStore, RecordWal, Row, Section, MAGIC, VERSION};
use crate::dict::{check_header, write_header, DictError};

/// Flat serialization format for bincode.
#[derive(Serialize, Deserialize)]
struct RecordData {
    clock: u64,
    sections: Vec<(String, Vec<(String, Row)>)>,
}

impl RecordStore {
    /// Serialize to bytes (HKLR format).
    pub fn to_bytes(&self) -> Result<Vec<u8>, DictError> {
        let data = RecordData {
            clock: self.clock,
            sections: self
                .sections
                .iter()
                .map(|(name, sec)| {
                    let rows = sec.rows.iter().map(|(k, r)| (k.clone(), r.clone())).collect();
                    (name.clone(), rows)
                })
                .collect(),
        };
        let body = bincode::serialize(&data).map_err(DictError::Serialize)?;
        Ok(write_header(MAGIC, VERSION, &body))
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, DictError> {
        let body = check_header(bytes, MAGIC, VERSION)?;
        let data: RecordData = bincode::deserialize(body).map_err(DictError::Deserialize)?;
        let sections: BTreeMap<String, Section> = data
            .sections
            .into_iter()
            .map(|(name, rows)| {
                (
                    name,
                    Section {
                        rows: rows.into_iter().collect(),
                    },
                )
            })
            .collect();
        Ok(Self {
            sections,
            clock: data.clock,
            ..Self::default()
        })
    }

    /// Atomic write: write to .tmp then rename.
    pub fn save(&self, path: &Path) -> Result<(), DictError> {
        let bytes = self.to_bytes()?;
        let tmp = path.with_extension("tmp");
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&tmp, &bytes)?;
        fs::rename(&tmp, path)?;
        Ok(())
    }

    /// Open a snapshot and replay its log. A missing snapshot is an empty
    /// store; later flushes go to the log next to `path`.
    pub fn open(path: &Path) -> Result<Self, DictError> {
        let mut store = match fs::read(path) {
            Ok(bytes) => Self::from_bytes(&bytes)?,
            Err(e) if e.kind() == io::ErrorKind::NotFound => Self::new(),
            Err(e) => return Err(e.into()),
        };
        let mut wal = RecordWal::new(path);
        let frames = wal.replay(&mut store)?;
        debug!(frames, sections = store.sections.len(), "record store opened");
        store.wal = Some(wal);
        Ok(store)
    }

    /// Append pending mutations to the log, checkpointing when it grows long.
    /// A memory-only store just drops them.
    pub fn flush(&mut self) -> Result<(), DictError> {
        let ops = std::mem::take(&mut self.pending);
        let Some(wal) = self.wal.as_mut() else {
            return Ok(());
        };
        wal.append(&ops)?;
        if wal.needs_compact() {
            self.checkpoint()?;
        }
        Ok(())
    }

    /// Write a full snapshot and empty the log.
    pub fn checkpoint(&mut self) -> Result<(), DictError> {
        let Some(path) = self.wal.as_ref().map(|w| w.snapshot_path().to_path_buf()) else {
            return Ok(());
        };
        self.save(&path)?;
        if let Some(wal) = self.wal.as_mut() {
            wal.truncate_wal()?;
        }
        Ok(())
    }
}
