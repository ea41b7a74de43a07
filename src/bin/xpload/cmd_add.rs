use anyhow::Result;
use log::info;
use std::path::PathBuf;

use xpload::stage::{Stage, StagedPayloadEntry, StagedTag};

pub fn exec_tag(name: String, tag_type: String, status: String, domains: Vec<String>) -> Result<()> {
    let stage = Stage::in_cwd()?;
    let tag = StagedTag::new(&name, &tag_type, &status, &domains)?;
    stage.add_tag(tag)?;
    info!(
        "staged tag '{}' (type={}, status={}, domains={:?}) in {}",
        name,
        tag_type,
        status,
        domains,
        stage.tags.path().display()
    );
    Ok(())
}

pub fn exec_pil(tag: String, domain: String, payload: PathBuf, start: u64, end: Option<u64>) -> Result<()> {
    let stage = Stage::in_cwd()?;
    let entry = StagedPayloadEntry::new(payload.to_string_lossy(), start, end)?;
    stage.add_pil(&tag, &domain, entry)?;
    info!(
        "staged payload {} for '{}'/'{}' [{}, {}) in {}",
        payload.display(),
        tag,
        domain,
        start,
        end.map(|e| e.to_string()).unwrap_or_else(|| "inf".to_string()),
        stage.pils.path().display()
    );
    Ok(())
}
