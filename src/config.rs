//! Catalog connection and payload storage configuration.
//!
//! Goals:
//! - One explicit value handed to every component constructor instead of an
//!   ambient "current database" global.
//! - Keep the on-disk format of existing config files:
//!   `{"host": "...", "port": "...", "apiroot": "...", "apiver": "...", "path": "..." | [...]}`.
//!   Unknown fields are ignored.
//!
//! Lookup (`XploadConfig::resolve`):
//! - a name containing '.' or '/' is a path and is read as is;
//! - otherwise the file is `<name>.json` (or `<$XPLOAD_CONFIG>.json`, default
//!   `prod.json`), looked up in `$XPLOAD_CONFIG_DIR` if set, else in the
//!   search path `.`, `config`.
//!
//! Optional fields (new in this revision):
//! - hash: "md5" | "sha256" (default md5): content addressing digest.
//! - remote_dry_run: bool (default false): the catalog validates `pil`
//!   requests carrying `dry_run: true` without persisting them.
//! - timeout_secs: HTTP request timeout (default 30).

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use crate::consts::{
    CONFIG_SEARCH_PATHS, DEFAULT_CONFIG_NAME, DEFAULT_TIMEOUT_SECS, ENV_CONFIG_DIR, ENV_CONFIG_NAME,
};
use crate::error::XploadError;
use crate::hash::HashKind;

/// `path` may be a single prefix or an ordered list of them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Prefixes {
    One(String),
    Many(Vec<String>),
}

impl Prefixes {
    pub fn to_paths(&self) -> Vec<PathBuf> {
        match self {
            Prefixes::One(p) => vec![PathBuf::from(p)],
            Prefixes::Many(ps) => ps.iter().map(PathBuf::from).collect(),
        }
    }
}

/// Port is a string in existing configs; a bare number is accepted too.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
enum Port {
    Text(String),
    Number(u16),
}

fn port_to_string<'de, D: serde::Deserializer<'de>>(d: D) -> std::result::Result<String, D::Error> {
    Ok(match Port::deserialize(d)? {
        Port::Text(s) => s,
        Port::Number(n) => n.to_string(),
    })
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct XploadConfig {
    /// Absolute path of the file this config was read from (`cfgf`).
    #[serde(skip_deserializing, rename = "cfgf")]
    pub source: Option<PathBuf>,

    pub host: String,
    #[serde(deserialize_with = "port_to_string")]
    pub port: String,
    pub apiroot: String,
    #[serde(default)]
    pub apiver: String,
    pub path: Prefixes,

    #[serde(default)]
    pub hash: HashKind,
    #[serde(default)]
    pub remote_dry_run: bool,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl XploadConfig {
    /// Config with no backing file (tests, embedding).
    pub fn new(host: &str, port: &str, apiroot: &str, prefixes: Vec<PathBuf>) -> Self {
        Self {
            source: None,
            host: host.to_string(),
            port: port.to_string(),
            apiroot: apiroot.to_string(),
            apiver: String::new(),
            path: Prefixes::Many(
                prefixes
                    .iter()
                    .map(|p| p.to_string_lossy().into_owned())
                    .collect(),
            ),
            hash: HashKind::default(),
            remote_dry_run: false,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }

    /// Read a config file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let bytes = fs::read(path).with_context(|| format!("read config {}", path.display()))?;
        let mut cfg: XploadConfig =
            serde_json::from_slice(&bytes).map_err(|e| XploadError::InvalidConfig {
                path: path.to_path_buf(),
                reason: e.to_string(),
            })?;
        cfg.source = Some(fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf()));
        Ok(cfg)
    }

    /// Resolve a config by user-supplied name (may be empty) using the
    /// process environment.
    pub fn resolve(name: &str) -> Result<Self> {
        let env_dir = std::env::var(ENV_CONFIG_DIR).ok();
        let env_name = std::env::var(ENV_CONFIG_NAME).ok();
        Self::resolve_with(name, env_dir.as_deref(), env_name.as_deref())
    }

    /// Same as `resolve` with the environment passed in explicitly.
    pub fn resolve_with(name: &str, env_dir: Option<&str>, env_name: Option<&str>) -> Result<Self> {
        if name.contains('.') || name.contains('/') {
            return Self::from_file(Path::new(name));
        }

        let search_paths: Vec<String> = match env_dir.map(|d| d.trim_end_matches('/')) {
            Some(d) if !d.is_empty() => vec![d.to_string()],
            _ => CONFIG_SEARCH_PATHS.iter().map(|s| s.to_string()).collect(),
        };

        let file = if !name.is_empty() {
            format!("{name}.json")
        } else {
            format!(
                "{}.json",
                env_name.filter(|s| !s.is_empty()).unwrap_or(DEFAULT_CONFIG_NAME)
            )
        };

        for dir in &search_paths {
            let candidate = Path::new(dir).join(&file);
            if candidate.is_file() {
                return Self::from_file(&candidate);
            }
        }

        Err(XploadError::ConfigNotFound { file, search_paths }.into())
    }

    /// `http://host:port/apiroot`
    pub fn url(&self) -> String {
        format!("http://{}:{}{}", self.host, self.port, self.apiroot)
    }

    /// Ordered candidate payload roots.
    pub fn prefixes(&self) -> Vec<PathBuf> {
        self.path.to_paths()
    }

    /// Config as a JSON tree, walked by `fields` (numeric fields index
    /// arrays). Walking stops at the first field that does not resolve.
    pub fn lookup(&self, fields: &[String]) -> Result<serde_json::Value> {
        let mut node = serde_json::to_value(self).context("serialize config")?;
        for f in fields {
            let next = match f.parse::<usize>() {
                Ok(ix) => node.get(ix).cloned(),
                Err(_) => node.get(f.as_str()).cloned(),
            };
            match next {
                Some(v) => node = v,
                None => break,
            }
        }
        Ok(node)
    }

    // Fluent setters (builder-style).

    pub fn with_prefixes(mut self, prefixes: Vec<PathBuf>) -> Self {
        self.path = Prefixes::Many(
            prefixes
                .iter()
                .map(|p| p.to_string_lossy().into_owned())
                .collect(),
        );
        self
    }

    pub fn with_hash(mut self, kind: HashKind) -> Self {
        self.hash = kind;
        self
    }

    pub fn with_remote_dry_run(mut self, on: bool) -> Self {
        self.remote_dry_run = on;
        self
    }

    pub fn with_timeout_secs(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }
}

impl fmt::Display for XploadConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "XploadConfig {{ \
             cfgf: {}, \
             url: {}, \
             apiver: {}, \
             path: [{}], \
             hash: {}, \
             remote_dry_run: {}, \
             timeout_secs: {} \
             }}",
            self.source
                .as_ref()
                .map(|p| p.display().to_string())
                .unwrap_or_else(|| "none".to_string()),
            self.url(),
            self.apiver,
            self.prefixes()
                .iter()
                .map(|p| p.display().to_string())
                .collect::<Vec<_>>()
                .join(", "),
            self.hash,
            self.remote_dry_run,
            self.timeout_secs,
        )
    }
}
