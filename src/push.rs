//! push: commit the stage to the catalog.
//!
//! Порядок:
//! 1. Загрузить оба стейджа (CorruptStage до любых изменений).
//! 2. Локальный preflight PIL: каждый payload через `copy(dry_run=true)`
//!    (файл существует, есть записываемый prefix). Ошибка здесь = ноль
//!    записей на диск, ноль запросов к каталогу, оба файла стейджа целы.
//! 3. Теги: create_and_link_tag для каждого; стейдж тегов удаляется только
//!    если все прошли.
//! 4. PIL dry run: если каталог умеет, `create_and_link_pil(dry_run=true)`
//!    с путями назначения из preflight (повторно payload'ы не хешируются).
//!    Иначе проверка остаётся только локальной, из шага 2.
//! 5. PIL real run: копирование + create_and_link_pil, затем удаление стейджа.
//!
//! This is a best-effort approximation of all-or-nothing, not a transaction:
//! if the real pass fails after some payloads were copied and linked, the PIL
//! stage stays on disk but the prefix tree and the catalog are partially
//! updated and need manual reconciliation. Tag creation has no rollback.
//!
//! Nothing is locked; concurrent pushes from the same stage directory or into
//! the same prefix tree are undefined.

use anyhow::{Context, Result};
use log::{debug, info, warn};
use std::path::{Path, PathBuf};

use crate::error::XploadError;
use crate::payload::{FileCopier, PayloadStore};
use crate::remote::{PilSubmission, Remote};
use crate::stage::{Stage, StagedPayloadEntry, StagedPil, StagedTag};

/// Counts of what a push submitted.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct PushReport {
    pub tags: usize,
    pub payloads: usize,
}

pub struct PushCoordinator<'a, R: Remote, C: FileCopier> {
    stage: &'a Stage,
    store: &'a PayloadStore<C>,
    remote: &'a R,
}

impl<'a, R: Remote, C: FileCopier> PushCoordinator<'a, R, C> {
    pub fn new(stage: &'a Stage, store: &'a PayloadStore<C>, remote: &'a R) -> Self {
        Self {
            stage,
            store,
            remote,
        }
    }

    /// Push everything that is staged. Fails with `NothingStaged` when neither
    /// stage file exists.
    pub fn push(&self) -> Result<PushReport> {
        if self.stage.is_empty() {
            return Err(XploadError::NothingStaged.into());
        }

        let tags = if self.stage.tags.exists() {
            Some(self.stage.tags.load()?.records)
        } else {
            None
        };
        let pils = if self.stage.pils.exists() {
            Some(self.stage.pils.load()?.records)
        } else {
            None
        };

        let planned = match &pils {
            Some(pils) => {
                debug!("push: local preflight of {} pil(s)", pils.len());
                Some(self.plan(pils)?)
            }
            None => None,
        };

        let mut report = PushReport::default();
        if let Some(tags) = &tags {
            report.tags = self.push_tags(tags)?;
        }
        if let (Some(pils), Some(planned)) = (&pils, &planned) {
            report.payloads = self.link_pils(pils, planned)?;
        }
        Ok(report)
    }

    /// Submit all staged tags, then clear the tag stage.
    pub fn push_tags(&self, tags: &[StagedTag]) -> Result<usize> {
        for tag in tags {
            let created = self
                .remote
                .create_and_link_tag(tag)
                .with_context(|| format!("create tag {}", tag.name))?;
            info!("Creating tag {}... {}", tag.name, created);
        }
        self.stage.tags.clear()?;
        Ok(tags.len())
    }

    /// Destination of every staged payload, in stage order. Nothing is written.
    fn plan(&self, pils: &[StagedPil]) -> Result<Vec<PathBuf>> {
        entries(pils)
            .map(|(pil, entry)| -> Result<PathBuf> {
                let destination = self.store.copy(Path::new(&entry.path), &pil.domain, true)?;
                debug!("Copying payload file {}...", destination.display());
                Ok(destination)
            })
            .collect()
    }

    /// Dry-run pass over `planned`, real pass, then clear the PIL stage.
    fn link_pils(&self, pils: &[StagedPil], planned: &[PathBuf]) -> Result<usize> {
        if self.remote.supports_dry_run() {
            debug!("push: pil dry run");
            for ((pil, entry), destination) in entries(pils).zip(planned) {
                self.submit(pil, entry, destination, true)?;
            }
        } else {
            warn!("catalog does not validate pil requests in dry-run mode; dry run checks local payloads and prefixes only");
        }

        debug!("push: pil real run");
        let mut n = 0;
        for (pil, entry) in entries(pils) {
            let destination = self.store.copy(Path::new(&entry.path), &pil.domain, false)?;
            info!("Copying payload file {}...", destination.display());
            self.submit(pil, entry, &destination, false)?;
            n += 1;
        }

        self.stage.pils.clear()?;
        Ok(n)
    }

    fn submit(
        &self,
        pil: &StagedPil,
        entry: &StagedPayloadEntry,
        destination: &Path,
        dry_run: bool,
    ) -> Result<String> {
        let payload = destination
            .file_name()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        let submission = PilSubmission {
            tag: pil.tag.clone(),
            domain: pil.domain.clone(),
            payload,
            start: entry.start,
            end: entry.end,
        };
        self.remote
            .create_and_link_pil(&submission, dry_run)
            .with_context(|| {
                format!(
                    "link payload {} to {}/{}",
                    submission.payload, pil.tag, pil.domain
                )
            })
    }
}

/// (pil, entry) pairs in stage order.
fn entries(pils: &[StagedPil]) -> impl Iterator<Item = (&StagedPil, &StagedPayloadEntry)> {
    pils.iter()
        .flat_map(|pil| pil.payloads.iter().map(move |entry| (pil, entry)))
}
