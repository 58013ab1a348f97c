// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! On-disk checkpoint store: one file per checkpoint under a configured
//! directory, written crash-safely via a temp-file-then-rename.

use crate::error::StorageError;
use crate::persister::{CheckpointRecord, Persister};
use corral_core::{Pid, RuntimeConfig};
use corral_persistence::Bundle;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Filesystem-backed [`Persister`].
///
/// Filename is `"{pid}"` or `"{pid}.{tag}"` with the configured suffix
/// appended (e.g. `corral_core::RuntimeConfig::checkpoint_suffix`, default
/// `"checkpoint"`), optionally zstd-compressed when
/// [`RuntimeConfig::compact_storage`] is set. Filenames are the only
/// externally observable naming contract.
pub struct FilePersister {
    dir: PathBuf,
    suffix: String,
    compact: bool,
}

impl FilePersister {
    pub fn new(config: &RuntimeConfig) -> Result<Self, StorageError> {
        fs::create_dir_all(&config.checkpoint_dir).map_err(StorageError::DirIo)?;
        Ok(Self {
            dir: config.checkpoint_dir.clone(),
            suffix: config.checkpoint_suffix.clone(),
            compact: config.compact_storage,
        })
    }

    fn extension(&self) -> String {
        if self.compact {
            format!("{}.zst", self.suffix)
        } else {
            self.suffix.clone()
        }
    }

    fn path_for(&self, pid: Pid, tag: Option<&str>) -> PathBuf {
        let stem = match tag {
            Some(tag) => format!("{pid}.{tag}"),
            None => pid.to_string(),
        };
        self.dir.join(format!("{stem}.{}", self.extension()))
    }

    /// Parse `"{pid}[.{tag}].{suffix}[.zst]"` back into a record. Returns
    /// `None` for filenames that don't match this persister's suffix.
    fn parse_filename(&self, name: &str) -> Option<CheckpointRecord> {
        let ext = self.extension();
        let stem = name.strip_suffix(&format!(".{ext}"))?;
        match stem.split_once('.') {
            Some((pid_str, tag)) => {
                let pid: Pid = pid_str.parse().ok()?;
                Some(CheckpointRecord { pid, tag: Some(tag.to_string()) })
            }
            None => {
                let pid: Pid = stem.parse().ok()?;
                Some(CheckpointRecord { pid, tag: None })
            }
        }
    }

    fn write_atomically(&self, path: &Path, bytes: &[u8]) -> Result<(), std::io::Error> {
        let tmp_path = path.with_extension(format!(
            "{}.tmp",
            path.extension().and_then(|e| e.to_str()).unwrap_or("part")
        ));
        let mut file = fs::File::create(&tmp_path)?;
        file.write_all(bytes)?;
        file.sync_all()?;
        fs::rename(&tmp_path, path)?;
        Ok(())
    }

    fn encode(&self, bundle: &Bundle) -> Result<Vec<u8>, StorageError> {
        let json = serde_json::to_vec(bundle)?;
        if self.compact {
            zstd::encode_all(json.as_slice(), 0).map_err(StorageError::Compression)
        } else {
            Ok(json)
        }
    }

    fn decode(&self, bytes: &[u8]) -> Result<Bundle, StorageError> {
        if self.compact {
            let json = zstd::decode_all(bytes).map_err(StorageError::Compression)?;
            Ok(serde_json::from_slice(&json)?)
        } else {
            Ok(serde_json::from_slice(bytes)?)
        }
    }
}

impl Persister for FilePersister {
    fn save_checkpoint(
        &self,
        pid: Pid,
        tag: Option<&str>,
        bundle: &Bundle,
    ) -> Result<(), StorageError> {
        let path = self.path_for(pid, tag);
        let bytes = self.encode(bundle)?;
        self.write_atomically(&path, &bytes).map_err(|source| StorageError::Io { pid, source })?;
        tracing::debug!(%pid, ?tag, path = %path.display(), "checkpoint saved");
        Ok(())
    }

    fn load_checkpoint(&self, pid: Pid, tag: Option<&str>) -> Result<Bundle, StorageError> {
        let path = self.path_for(pid, tag);
        let bytes = fs::read(&path).map_err(|source| {
            if source.kind() == std::io::ErrorKind::NotFound {
                StorageError::NotFound { pid, tag: tag.map(str::to_string) }
            } else {
                StorageError::Io { pid, source }
            }
        })?;
        self.decode(&bytes)
    }

    fn get_checkpoints(&self) -> Result<Vec<CheckpointRecord>, StorageError> {
        let mut records = Vec::new();
        for entry in fs::read_dir(&self.dir).map_err(StorageError::DirIo)? {
            let entry = entry.map_err(StorageError::DirIo)?;
            if let Some(name) = entry.file_name().to_str() {
                if let Some(record) = self.parse_filename(name) {
                    records.push(record);
                }
            }
        }
        Ok(records)
    }

    fn get_process_checkpoints(&self, pid: Pid) -> Result<Vec<CheckpointRecord>, StorageError> {
        Ok(self.get_checkpoints()?.into_iter().filter(|r| r.pid == pid).collect())
    }

    fn delete_checkpoint(&self, pid: Pid, tag: Option<&str>) -> Result<(), StorageError> {
        let path = self.path_for(pid, tag);
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(source) => Err(StorageError::Io { pid, source }),
        }
    }

    fn delete_process_checkpoints(&self, pid: Pid) -> Result<(), StorageError> {
        for record in self.get_process_checkpoints(pid)? {
            self.delete_checkpoint(record.pid, record.tag.as_deref())?;
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "file_persister_tests.rs"]
mod tests;
