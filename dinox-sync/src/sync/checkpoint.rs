use std::fmt;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use time::format_description::BorrowedFormatItem;
use time::macros::{datetime, format_description};
use time::{OffsetDateTime, PrimitiveDateTime};

const TIMESTAMP_FORMAT: &[BorrowedFormatItem<'static>] =
    format_description!("[year]-[month]-[day] [hour]:[minute]:[second]");

#[derive(Debug, Error)]
pub enum CheckpointError {
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("checkpoint file is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("stored sync time {value:?} is malformed (run with --reset to start over): {source}")]
    Malformed {
        value: String,
        #[source]
        source: time::error::Parse,
    },
    #[error("failed to format sync time: {0}")]
    Format(#[from] time::error::Format),
}

/// Boundary between notes already mirrored and notes still to fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Checkpoint(PrimitiveDateTime);

impl Checkpoint {
    /// "No prior sync": import everything and ignore deletions.
    pub const SENTINEL: Checkpoint = Checkpoint(datetime!(1900-01-01 0:00));

    pub fn new(at: PrimitiveDateTime) -> Self {
        Self(at)
    }

    /// Wall-clock reading with the offset and sub-second part dropped, the
    /// way the service compares sync times.
    pub fn from_offset(at: OffsetDateTime) -> Self {
        let at = at.replace_nanosecond(0).unwrap_or(at);
        Self(PrimitiveDateTime::new(at.date(), at.time()))
    }

    /// Parses `YYYY-MM-DD HH:MM:SS`; an empty value means no prior sync.
    pub fn parse(value: &str) -> Result<Self, CheckpointError> {
        let value = value.trim();
        if value.is_empty() {
            return Ok(Self::SENTINEL);
        }
        PrimitiveDateTime::parse(value, TIMESTAMP_FORMAT)
            .map(Self)
            .map_err(|source| CheckpointError::Malformed {
                value: value.to_string(),
                source,
            })
    }

    pub fn is_sentinel(&self) -> bool {
        *self == Self::SENTINEL
    }

    pub fn as_datetime(&self) -> PrimitiveDateTime {
        self.0
    }

    pub fn format(&self) -> Result<String, CheckpointError> {
        Ok(self.0.format(TIMESTAMP_FORMAT)?)
    }
}

impl fmt::Display for Checkpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = self.format().map_err(|_| fmt::Error)?;
        f.write_str(&text)
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct CheckpointFile {
    #[serde(rename = "dinox_last_sync_time", default)]
    last_sync_time: String,
}

/// Single-key JSON file holding the last successful sync time.
#[derive(Debug, Clone)]
pub struct CheckpointStore {
    path: PathBuf,
}

impl CheckpointStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// `<data_dir>/dinox-sync/data.json`
    pub fn default_path() -> Option<PathBuf> {
        dirs::data_dir().map(|dir| dir.join("dinox-sync").join("data.json"))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub async fn load(&self) -> Result<Checkpoint, CheckpointError> {
        let contents = match tokio::fs::read_to_string(&self.path).await {
            Ok(contents) => contents,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(Checkpoint::SENTINEL),
            Err(source) => {
                return Err(CheckpointError::Io {
                    path: self.path.clone(),
                    source,
                });
            }
        };
        if contents.trim().is_empty() {
            return Ok(Checkpoint::SENTINEL);
        }
        let file: CheckpointFile = serde_json::from_str(&contents)?;
        Checkpoint::parse(&file.last_sync_time)
    }

    /// Overwrites the stored value via `<path>.tmp` and a rename.
    pub async fn save(&self, checkpoint: Checkpoint) -> Result<(), CheckpointError> {
        if let Some(dir) = self.path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(dir)
                .await
                .map_err(|source| self.io_err(dir, source))?;
        }
        let json = serde_json::to_string(&CheckpointFile {
            last_sync_time: checkpoint.format()?,
        })?;
        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, json)
            .await
            .map_err(|source| self.io_err(&tmp, source))?;
        tokio::fs::rename(&tmp, &self.path)
            .await
            .map_err(|source| self.io_err(&self.path, source))?;
        Ok(())
    }

    pub async fn reset(&self) -> Result<(), CheckpointError> {
        self.save(Checkpoint::SENTINEL).await
    }

    fn io_err(&self, path: &Path, source: io::Error) -> CheckpointError {
        CheckpointError::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}
