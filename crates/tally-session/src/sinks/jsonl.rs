use std::fs::OpenOptions;
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tracing::{debug, warn};

use crate::error::SinkError;
use crate::sink::{Settlement, SettlementSink};

/// Appends each settlement as one JSON object per line.
pub struct JsonLinesSink {
    path: PathBuf,
}

impl JsonLinesSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read back every settlement in the file.
    ///
    /// A record cut short by an interrupted write is skipped with a warning.
    /// Any other malformed line is an error.
    pub async fn read_all(&self) -> Result<Vec<Settlement>, SinkError> {
        let text = match tokio::fs::read_to_string(&self.path).await {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut settlements = Vec::new();
        for (index, line) in text.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str(line) {
                Ok(settlement) => settlements.push(settlement),
                Err(e) if e.is_eof() => warn!(
                    path = %self.path.display(),
                    line = index + 1,
                    "skipping truncated settlement record"
                ),
                Err(e) => {
                    return Err(SinkError::Serialization(format!("line {}: {e}", index + 1)))
                }
            }
        }
        Ok(settlements)
    }
}

/// Append `line` in a single write, first terminating any torn record the
/// file ends with.
fn append_record(path: &Path, line: &[u8]) -> std::io::Result<()> {
    let mut file = OpenOptions::new()
        .create(true)
        .read(true)
        .append(true)
        .open(path)?;

    let mut record = Vec::with_capacity(line.len() + 1);
    let len = file.metadata()?.len();
    if len > 0 {
        let mut last = [0u8; 1];
        file.seek(SeekFrom::Start(len - 1))?;
        file.read_exact(&mut last)?;
        if last[0] != b'\n' {
            record.push(b'\n');
        }
    }
    record.extend_from_slice(line);
    file.write_all(&record)?;
    file.sync_data()
}

#[async_trait]
impl SettlementSink for JsonLinesSink {
    async fn submit(&self, settlement: &Settlement) -> Result<(), SinkError> {
        let mut line =
            serde_json::to_vec(settlement).map_err(|e| SinkError::Serialization(e.to_string()))?;
        line.push(b'\n');
        let bytes = line.len();

        // Runs to completion on the blocking pool even if the caller stops
        // waiting, so an abandoned submit never leaves half a record.
        let path = self.path.clone();
        tokio::task::spawn_blocking(move || append_record(&path, &line))
            .await
            .map_err(|e| SinkError::Unavailable(e.to_string()))??;

        debug!(
            path = %self.path.display(),
            session = %settlement.session_id,
            bytes,
            "settlement appended"
        );
        Ok(())
    }
}
