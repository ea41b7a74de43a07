//! stage: local, uncommitted changes awaiting `push`.
//!
//! Состав:
//! - records: StagedTag / StagedPil / StagedPayloadEntry и правила слияния.
//! - file: StageFile<R>, JSON-массив записей одного вида в отдельном файле.
//!
//! Layout (relative to the working directory by default):
//!   .xpload/tags.json  -> [StagedTag]
//!   .xpload/pils.json  -> [StagedPil]
//!
//! Each file is created lazily on the first `add` of its kind and removed
//! only after all of its records were pushed.

pub mod file;
pub mod records;

pub use file::{StageFile, StageLoad};
pub use records::{StageRecord, StagedPayloadEntry, StagedPil, StagedTag};

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

use crate::consts::STAGE_DIR;

pub struct Stage {
    dir: PathBuf,
    pub tags: StageFile<StagedTag>,
    pub pils: StageFile<StagedPil>,
}

impl Stage {
    /// Stage rooted at an explicit directory (the `.xpload` dir itself).
    pub fn open(dir: &Path) -> Self {
        Self {
            dir: dir.to_path_buf(),
            tags: StageFile::new(dir),
            pils: StageFile::new(dir),
        }
    }

    /// `<cwd>/.xpload`.
    pub fn in_cwd() -> Result<Self> {
        let cwd = std::env::current_dir().context("resolve current directory")?;
        Ok(Self::open(&cwd.join(STAGE_DIR)))
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Nothing staged of either kind.
    pub fn is_empty(&self) -> bool {
        !self.tags.exists() && !self.pils.exists()
    }

    pub fn add_tag(&self, tag: StagedTag) -> Result<()> {
        self.tags.upsert(tag)
    }

    pub fn add_pil(&self, tag: &str, domain: &str, entry: StagedPayloadEntry) -> Result<()> {
        self.pils.upsert(StagedPil::new(tag, domain, entry)?)
    }
}
