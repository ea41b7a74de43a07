//! Staged record kinds and their key/merge rules.
//!
//! - StagedTag: key = name; re-adding replaces the whole record.
//! - StagedPil: key = (tag, domain); re-adding merges payload lists, an entry
//!   with the same (start, end) replaces the old one regardless of its path.

use anyhow::Result;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::consts::{PILS_FILE, TAGS_FILE};
use crate::error::{StageKind, XploadError};

/// A record kind that lives in its own stage file.
pub trait StageRecord: Serialize + DeserializeOwned {
    const KIND: StageKind;
    const FILE: &'static str;

    type Key: PartialEq;

    fn key(&self) -> Self::Key;

    /// Human-readable key for diagnostics.
    fn key_label(&self) -> String;

    /// Combine an already staged record with an incoming one of the same key.
    fn merge(existing: Self, incoming: Self) -> Self;
}

fn non_empty(value: &str, field: &'static str) -> Result<String> {
    let v = value.trim();
    if v.is_empty() {
        return Err(XploadError::InvalidRecord { field }.into());
    }
    Ok(v.to_string())
}

// ---------------------- tags ----------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StagedTag {
    pub name: String,
    #[serde(rename = "type")]
    pub tag_type: String,
    pub status: String,
    /// Deduplicated; order carries no meaning.
    pub domains: Vec<String>,
}

impl StagedTag {
    pub fn new<I, S>(name: &str, tag_type: &str, status: &str, domains: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut uniq: Vec<String> = Vec::new();
        for d in domains {
            let d = non_empty(d.as_ref(), "domain")?;
            if !uniq.contains(&d) {
                uniq.push(d);
            }
        }
        Ok(Self {
            name: non_empty(name, "tag name")?,
            tag_type: non_empty(tag_type, "tag type")?,
            status: non_empty(status, "tag status")?,
            domains: uniq,
        })
    }
}

impl StageRecord for StagedTag {
    const KIND: StageKind = StageKind::Tags;
    const FILE: &'static str = TAGS_FILE;

    type Key = String;

    fn key(&self) -> String {
        self.name.clone()
    }

    fn key_label(&self) -> String {
        format!("\"{}\"", self.name)
    }

    // Полная замена, поля не сливаются.
    fn merge(_existing: Self, incoming: Self) -> Self {
        incoming
    }
}

// ---------------------- payload interval lists ----------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StagedPayloadEntry {
    /// Local payload file as given at staging time.
    pub path: String,
    pub start: u64,
    /// Open-ended when absent (written as `null`).
    pub end: Option<u64>,
}

impl StagedPayloadEntry {
    pub fn new(path: impl Into<String>, start: u64, end: Option<u64>) -> Result<Self> {
        if let Some(end) = end {
            if end <= start {
                return Err(XploadError::InvalidInterval { start, end }.into());
            }
        }
        let path = path.into();
        non_empty(&path, "payload path")?;
        Ok(Self { path, start, end })
    }

    pub fn interval(&self) -> (u64, Option<u64>) {
        (self.start, self.end)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StagedPil {
    pub tag: String,
    pub domain: String,
    pub payloads: Vec<StagedPayloadEntry>,
}

impl StagedPil {
    pub fn new(tag: &str, domain: &str, entry: StagedPayloadEntry) -> Result<Self> {
        Ok(Self {
            tag: non_empty(tag, "tag")?,
            domain: non_empty(domain, "domain")?,
            payloads: vec![entry],
        })
    }
}

impl StageRecord for StagedPil {
    const KIND: StageKind = StageKind::Pils;
    const FILE: &'static str = PILS_FILE;

    type Key = (String, String);

    fn key(&self) -> (String, String) {
        (self.tag.clone(), self.domain.clone())
    }

    fn key_label(&self) -> String {
        format!("'{}' and '{}'", self.tag, self.domain)
    }

    fn merge(existing: Self, incoming: Self) -> Self {
        let mut payloads = existing.payloads;
        for entry in incoming.payloads {
            // равенство только по (start, end), path не учитывается
            payloads.retain(|p| p.interval() != entry.interval());
            payloads.push(entry);
        }
        Self {
            tag: incoming.tag,
            domain: incoming.domain,
            payloads,
        }
    }
}
