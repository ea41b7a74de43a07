//! remote: the conditions catalog as seen by this client.
//!
//! Состав:
//! - Remote: трейт для create/link вызовов, которыми пользуется `push`.
//! - http: HttpRemote: блокирующий HTTP-клиент (reqwest::blocking).
//! - типизированные ответы каталога (Entry, PayloadIovEntry): ответ
//!   проверяется на границе, а не при печати.

pub mod http;

pub use http::HttpRemote;

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::stage::StagedTag;

/// Create/link calls issued by `push`.
pub trait Remote {
    /// Create the tag (with its type and status) and link it to its domains.
    /// Returns the created tag's name or id.
    fn create_and_link_tag(&self, tag: &StagedTag) -> Result<String>;

    /// Register one payload interval. With `dry_run` the catalog is asked to
    /// validate without persisting; only called that way when
    /// `supports_dry_run()` is true.
    fn create_and_link_pil(&self, pil: &PilSubmission, dry_run: bool) -> Result<String>;

    /// Whether the catalog honours `dry_run` on PIL requests.
    fn supports_dry_run(&self) -> bool {
        false
    }
}

/// One payload interval ready for submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PilSubmission {
    pub tag: String,
    pub domain: String,
    /// Content-addressed file name in the prefix tree (`<digest>_<basename>`).
    pub payload: String,
    pub start: u64,
    pub end: Option<u64>,
}

/// Generic catalog entry: `{id, name?, ...}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entry {
    pub id: i64,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl Entry {
    /// `name` if present, else `id`.
    pub fn label(&self) -> String {
        match &self.name {
            Some(n) => n.clone(),
            None => self.id.to_string(),
        }
    }
}

/// Element of the `payloadiovs` response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PayloadIovEntry {
    #[serde(default)]
    pub name: Option<String>,
    pub payload_type: String,
    #[serde(default)]
    pub payload_iov: Vec<PayloadIov>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PayloadIov {
    pub payload_url: String,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// Listable catalog components.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum Component {
    Tags,
    TagTypes,
    TagStatuses,
    Domains,
    DomainLists,
    Payloads,
}

impl Component {
    pub fn endpoint(self) -> &'static str {
        match self {
            Component::Tags => "gt",
            Component::TagTypes => "gttype",
            Component::TagStatuses => "gtstatus",
            Component::Domains => "pt",
            Component::DomainLists => "pl",
            Component::Payloads => "piov",
        }
    }
}

impl fmt::Display for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Component::Tags => "tags",
            Component::TagTypes => "tag_types",
            Component::TagStatuses => "tag_statuses",
            Component::Domains => "domains",
            Component::DomainLists => "domain_lists",
            Component::Payloads => "payloads",
        };
        write!(f, "{s}")
    }
}
