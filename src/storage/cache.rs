use std::{
    fs,
    io::{BufWriter, ErrorKind, Write},
    path::{Path, PathBuf},
};

use chrono::{DateTime, Utc};
use log::info;
use tempfile::NamedTempFile;

use crate::models::StakePool;

use super::{CacheError, CacheSnapshot};

pub const SNAPSHOT_FILE: &str = "pools.json";

/// Flat-file cache holding the latest ingestion snapshot.
///
/// The pool list and its timestamp live in one file that is replaced by
/// rename, so readers see either the previous snapshot or the new one.
#[derive(Debug, Clone)]
pub struct FileCache {
    dir: PathBuf,
}

impl FileCache {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        FileCache { dir: dir.into() }
    }

    pub fn snapshot_path(&self) -> PathBuf {
        self.dir.join(SNAPSHOT_FILE)
    }

    pub fn write(
        &self,
        pools: Vec<StakePool>,
        last_update: DateTime<Utc>,
    ) -> Result<CacheSnapshot, CacheError> {
        fs::create_dir_all(&self.dir)?;
        let snapshot = CacheSnapshot { pools, last_update };

        let tmp = NamedTempFile::new_in(&self.dir)?;
        {
            let mut writer = BufWriter::new(tmp.as_file());
            serde_json::to_writer(&mut writer, &snapshot)
                .map_err(|e| CacheError::Io(e.into()))?;
            writer.flush()?;
        }
        tmp.as_file().sync_all()?;
        tmp.persist(self.snapshot_path())
            .map_err(|e| CacheError::Io(e.error))?;

        info!(
            "Wrote {} pools to {}",
            snapshot.total_pools(),
            self.snapshot_path().display()
        );
        Ok(snapshot)
    }

    pub fn read(&self) -> Result<CacheSnapshot, CacheError> {
        read_snapshot(&self.snapshot_path())
    }
}

fn read_snapshot(path: &Path) -> Result<CacheSnapshot, CacheError> {
    let raw = match fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(e) if e.kind() == ErrorKind::NotFound => return Err(CacheError::Unavailable),
        Err(e) => return Err(e.into()),
    };
    Ok(serde_json::from_str(&raw)?)
}
