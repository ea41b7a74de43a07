//! payload: content-addressed copy of payload files into the prefix tree.
//!
//! Раскладка: `<prefix>/<domain>/<digest>_<basename>`, где prefix: первый
//! записываемый корень из конфигурации (см. `prefix::select_writable`).
//!
//! Повторное копирование того же содержимого в тот же domain+prefix даёт тот же
//! путь и просто перезаписывает файл теми же байтами.
//! После копирования файл читается заново и сверяется по дайджесту.

use anyhow::{Context, Result};
use log::debug;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::XploadError;
use crate::hash::{content_hash, destination_name, HashKind};
use crate::prefix::select_writable;

/// Byte-level copy used by `PayloadStore`.
pub trait FileCopier {
    fn copy(&self, src: &Path, dst: &Path) -> Result<()>;
}

/// `std::fs::copy`.
#[derive(Debug, Default, Clone, Copy)]
pub struct FsCopier;

impl FileCopier for FsCopier {
    fn copy(&self, src: &Path, dst: &Path) -> Result<()> {
        fs::copy(src, dst)
            .with_context(|| format!("copy {} -> {}", src.display(), dst.display()))?;
        Ok(())
    }
}

pub struct PayloadStore<C: FileCopier = FsCopier> {
    prefixes: Vec<PathBuf>,
    hash_kind: HashKind,
    copier: C,
}

impl PayloadStore<FsCopier> {
    pub fn new(prefixes: Vec<PathBuf>, hash_kind: HashKind) -> Self {
        Self::with_copier(prefixes, hash_kind, FsCopier)
    }
}

impl<C: FileCopier> PayloadStore<C> {
    pub fn with_copier(prefixes: Vec<PathBuf>, hash_kind: HashKind, copier: C) -> Self {
        Self {
            prefixes,
            hash_kind,
            copier,
        }
    }

    /// Copy `source` under `<prefix>/<domain>/`. With `dry_run` only the
    /// destination is computed and nothing is written.
    pub fn copy(&self, source: &Path, domain: &str, dry_run: bool) -> Result<PathBuf> {
        if !source.exists() {
            return Err(XploadError::SourceNotFound(source.to_path_buf()).into());
        }

        let prefix = select_writable(&self.prefixes)?;

        let digest = content_hash(self.hash_kind, source)?;
        let name = destination_name(source, &digest)?;
        let destination = prefix.join(domain).join(name);

        if dry_run {
            debug!(
                "payload: dry run {} -> {}",
                source.display(),
                destination.display()
            );
            return Ok(destination);
        }

        if let Some(parent) = destination.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("create {}", parent.display()))?;
        }
        self.copier.copy(source, &destination)?;

        let written = content_hash(self.hash_kind, &destination)?;
        if written != digest {
            return Err(XploadError::CopyIntegrityError {
                destination,
                expected: digest,
                actual: written,
            }
            .into());
        }

        debug!(
            "payload: copied {} -> {}",
            source.display(),
            destination.display()
        );
        Ok(destination)
    }

    /// First `<prefix>/<payload_name>` that exists.
    pub fn locate(&self, payload_name: &str) -> Option<PathBuf> {
        self.prefixes
            .iter()
            .map(|p| p.join(payload_name))
            .find(|p| p.exists())
    }
}
