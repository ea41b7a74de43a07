//! One stage collection persisted as a JSON array in its own file.
//!
//! Формат: `<stage_dir>/<R::FILE>`, pretty JSON (отступ 2 пробела).
//! Запись атомарная через tmp+rename. Файлы не блокируются: два процесса на
//! одном стейдже = last writer wins.

use anyhow::{Context, Result};
use log::debug;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::marker::PhantomData;
use std::path::{Path, PathBuf};

use super::records::StageRecord;
use crate::error::XploadError;

/// Result of `StageFile::load`: records plus whether the file was present.
#[derive(Debug)]
pub struct StageLoad<R> {
    pub records: Vec<R>,
    pub existed: bool,
}

#[derive(Debug, Clone)]
pub struct StageFile<R> {
    path: PathBuf,
    _kind: PhantomData<R>,
}

impl<R: StageRecord> StageFile<R> {
    pub fn new(stage_dir: &Path) -> Self {
        Self {
            path: stage_dir.join(R::FILE),
            _kind: PhantomData,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    /// Read the collection. A missing file is an empty collection and the
    /// stage directory is created so a later save succeeds.
    pub fn load(&self) -> Result<StageLoad<R>> {
        if !self.path.exists() {
            if let Some(dir) = self.path.parent() {
                fs::create_dir_all(dir).with_context(|| format!("create {}", dir.display()))?;
            }
            return Ok(StageLoad {
                records: Vec::new(),
                existed: false,
            });
        }

        let bytes = fs::read(&self.path).with_context(|| format!("read {}", self.path.display()))?;
        let records: Vec<R> = serde_json::from_slice(&bytes).map_err(|e| self.corrupt(e.to_string()))?;

        // два разных ключа не могут совпасть, иначе стейдж испорчен вручную
        for (i, r) in records.iter().enumerate() {
            let key = r.key();
            if records[..i].iter().any(|o| o.key() == key) {
                return Err(self.corrupt(format!(
                    "Only one entry for {} can be staged",
                    r.key_label()
                )));
            }
        }

        Ok(StageLoad {
            records,
            existed: true,
        })
    }

    /// Insert or merge `record` by key and persist the whole collection.
    /// The updated record moves to the end; unrelated records keep their order.
    pub fn upsert(&self, record: R) -> Result<()> {
        let mut records = self.load()?.records;
        let key = record.key();

        let merged = match records.iter().position(|r| r.key() == key) {
            Some(idx) => R::merge(records.remove(idx), record),
            None => record,
        };
        debug!("stage {}: upsert {}", R::KIND, merged.key_label());
        records.push(merged);

        self.save(&records)
    }

    /// Remove the backing file. Missing file is fine.
    pub fn clear(&self) -> Result<()> {
        if self.path.exists() {
            fs::remove_file(&self.path)
                .with_context(|| format!("remove {}", self.path.display()))?;
        }
        Ok(())
    }

    fn save(&self, records: &[R]) -> Result<()> {
        let dir = self
            .path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));
        fs::create_dir_all(&dir).with_context(|| format!("create {}", dir.display()))?;
        let tmp = self.path.with_extension("json.tmp");

        let data = serde_json::to_vec_pretty(records)
            .with_context(|| format!("serialize {} stage", R::KIND))?;
        {
            let mut f = OpenOptions::new()
                .create(true)
                .truncate(true)
                .write(true)
                .open(&tmp)
                .with_context(|| format!("open {}", tmp.display()))?;
            f.write_all(&data)?;
            f.flush()?;
        }
        fs::rename(&tmp, &self.path)
            .with_context(|| format!("rename {} -> {}", tmp.display(), self.path.display()))?;
        Ok(())
    }

    fn corrupt(&self, reason: String) -> anyhow::Error {
        XploadError::CorruptStage {
            kind: R::KIND,
            path: self.path.clone(),
            reason,
        }
        .into()
    }
}
