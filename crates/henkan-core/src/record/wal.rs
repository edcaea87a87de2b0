//! Write-ahead log for the record store.
//!
//! Each flush appends one frame holding the mutations made since the
//! previous flush. Frames are `u32` length + `u32` CRC32 + bincode payload;
//! replay stops at the first truncated or corrupt frame.

use std::ffi::OsString;
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::warn;

use super::{RecordOp, RecordStore};

const COMPACT_THRESHOLD: usize = 200;

#[derive(Serialize, Deserialize)]
struct WalFrame {
    ops: Vec<RecordOp>,
}

#[derive(Debug)]
pub struct RecordWal {
    snapshot_path: PathBuf,
    wal_path: PathBuf,
    file: Option<File>,
    frame_count: usize,
}

fn read_u32(data: &[u8], at: usize) -> Option<u32> {
    let bytes: [u8; 4] = data.get(at..at + 4)?.try_into().ok()?;
    Some(u32::from_le_bytes(bytes))
}

impl RecordWal {
    /// Log handle for `snapshot_path`; the log lives at `<snapshot>.wal`.
    pub fn new(snapshot_path: &Path) -> Self {
        let mut name = OsString::from(snapshot_path.as_os_str());
        name.push(".wal");
        Self {
            snapshot_path: snapshot_path.to_path_buf(),
            wal_path: PathBuf::from(name),
            file: None,
            frame_count: 0,
        }
    }

    /// Replay every intact frame into `store`. Returns the number of frames.
    pub fn replay(&mut self, store: &mut RecordStore) -> io::Result<usize> {
        let data = match fs::read(&self.wal_path) {
            Ok(d) => d,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                self.frame_count = 0;
                return Ok(0);
            }
            Err(e) => return Err(e),
        };

        let mut count = 0;
        let mut pos = 0;
        while let (Some(length), Some(expected_crc)) = (read_u32(&data, pos), read_u32(&data, pos + 4)) {
            let length = length as usize;
            let Some(payload) = data.get(pos + 8..pos + 8 + length) else {
                warn!(offset = pos, "truncated record log frame");
                break;
            };
            if length == 0 || crc32fast::hash(payload) != expected_crc {
                warn!(offset = pos, "corrupt record log frame");
                break;
            }
            match bincode::deserialize::<WalFrame>(payload) {
                Ok(frame) => {
                    for op in frame.ops {
                        store.apply(op);
                    }
                    count += 1;
                }
                Err(_) => break,
            }
            pos += 8 + length;
        }

        self.frame_count = count;
        Ok(count)
    }

    pub fn append(&mut self, ops: &[RecordOp]) -> io::Result<()> {
        if ops.is_empty() {
            return Ok(());
        }
        let frame = WalFrame { ops: ops.to_vec() };
        let payload = bincode::serialize(&frame).map_err(io::Error::other)?;
        let length = payload.len() as u32;
        let crc = crc32fast::hash(&payload);

        let file = self.open_file()?;
        file.write_all(&length.to_le_bytes())?;
        file.write_all(&crc.to_le_bytes())?;
        file.write_all(&payload)?;

        self.frame_count += 1;
        Ok(())
    }

    fn open_file(&mut self) -> io::Result<&mut File> {
        if self.file.is_none() {
            if let Some(parent) = self.wal_path.parent() {
                fs::create_dir_all(parent)?;
            }
            let f = OpenOptions::new()
                .create(true)
                .append(true)
                .open(&self.wal_path)?;
            self.file = Some(f);
        }
        self.file
            .as_mut()
            .ok_or_else(|| io::Error::other("record log is not open"))
    }

    pub fn needs_compact(&self) -> bool {
        self.frame_count >= COMPACT_THRESHOLD
    }

    /// Empty the log. Call after a snapshot has been written.
    pub fn truncate_wal(&mut self) -> io::Result<()> {
        self.file = None;
        File::create(&self.wal_path)?;
        self.frame_count = 0;
        Ok(())
    }

    pub fn frame_count(&self) -> usize {
        self.frame_count
    }

    pub fn snapshot_path(&self) -> &Path {
        &self.snapshot_path
    }

    pub fn wal_path(&self) -> &Path {
        &self.wal_path
    }
}
