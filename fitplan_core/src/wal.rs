//! Write-Ahead Log (WAL) for consultation history.
//!
//! Consultations are appended to a JSONL (JSON Lines) file with file
//! locking so several processes can record at once.

use crate::{ConsultationRecord, Result};
use fs2::FileExt;
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

/// Where recorded consultations go
pub trait ConsultationSink {
    fn append(&mut self, record: &ConsultationRecord) -> Result<()>;
}

/// JSONL-based consultation sink with file locking
pub struct JsonlSink {
    path: PathBuf,
}

impl JsonlSink {
    /// Create a new JSONL sink for the given path
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn ensure_parent_dir(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        Ok(())
    }
}

impl ConsultationSink for JsonlSink {
    fn append(&mut self, record: &ConsultationRecord) -> Result<()> {
        self.ensure_parent_dir()?;

        let mut file = OpenOptions::new()
            .create(true)
            .read(true)
            .append(true)
            .open(&self.path)?;

        file.lock_exclusive()?;

        // A crash mid-write can leave a partial last line; start on a fresh one
        let needs_newline = if file.metadata()?.len() > 0 {
            let mut last = [0u8; 1];
            file.seek(SeekFrom::End(-1))?;
            file.read_exact(&mut last)?;
            last[0] != b'\n'
        } else {
            false
        };

        let mut writer = std::io::BufWriter::new(&file);
        if needs_newline {
            writer.write_all(b"\n")?;
        }
        let line = serde_json::to_string(record)?;
        writer.write_all(line.as_bytes())?;
        writer.write_all(b"\n")?;
        writer.flush()?;

        file.unlock()?;

        tracing::debug!("Appended consultation {} to WAL", record.id);
        Ok(())
    }
}

/// Read all consultations from a WAL file
///
/// Lines that fail to parse are logged and skipped.
pub fn read_records(path: &Path) -> Result<Vec<ConsultationRecord>> {
    if !path.exists() {
        return Ok(Vec::new());
    }

    let file = File::open(path)?;
    file.lock_shared()?;

    let reader = BufReader::new(&file);
    let mut records = Vec::new();

    for (line_num, line_result) in reader.lines().enumerate() {
        let line = line_result?;
        if line.trim().is_empty() {
            continue;
        }

        match serde_json::from_str::<ConsultationRecord>(&line) {
            Ok(record) => records.push(record),
            Err(e) => {
                tracing::warn!("Failed to parse consultation at line {}: {}", line_num + 1, e);
            }
        }
    }

    file.unlock()?;
    tracing::debug!("Read {} consultations from WAL", records.len());
    Ok(records)
}
