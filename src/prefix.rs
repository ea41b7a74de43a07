//! Selection of the payload storage root.
//!
//! A prefix qualifies if it exists, is a directory and this process has both
//! write and execute (search) permission on it. Mode bits alone do not answer
//! that for a shared root owned by another account, so the check creates an
//! empty marker file in the directory and removes it again. That succeeds
//! exactly when the effective uid/gid may create entries there.
//! The first qualifying prefix in the configured order wins.

use anyhow::Result;
use log::debug;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use crate::error::XploadError;

static NEXT_CHECK: AtomicU64 = AtomicU64::new(0);

fn check_file_name() -> String {
    let t = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos())
        .unwrap_or(0);
    let id = NEXT_CHECK.fetch_add(1, Ordering::Relaxed);
    format!(".xpload-write-check-{}-{}-{}", std::process::id(), t, id)
}

/// Is this prefix usable as a payload root by the current process?
pub fn is_writable_prefix(prefix: &Path) -> bool {
    if !prefix.is_dir() {
        return false;
    }

    let marker = prefix.join(check_file_name());
    match fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(&marker)
    {
        Ok(f) => {
            drop(f);
            if let Err(e) = fs::remove_file(&marker) {
                // создать смогли, удалить нет: такой prefix не годится
                debug!("prefix {}: cannot remove {}: {}", prefix.display(), marker.display(), e);
                return false;
            }
            true
        }
        Err(e) => {
            debug!("prefix {}: {}", prefix.display(), e);
            false
        }
    }
}

/// First writable prefix from `prefixes`, or `NoWritablePrefix` with the full
/// candidate list.
pub fn select_writable(prefixes: &[PathBuf]) -> Result<PathBuf> {
    for p in prefixes {
        if is_writable_prefix(p) {
            return Ok(p.clone());
        }
        debug!("prefix {} is not writable, skipping", p.display());
    }
    Err(XploadError::NoWritablePrefix {
        candidates: prefixes.to_vec(),
    }
    .into())
}
