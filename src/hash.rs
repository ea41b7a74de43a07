//! Content addressing for payload files.
//!
//! Goals:
//! - Destination name is a pure function of file bytes + original basename:
//!   `<digest_hex>_<basename>`.
//! - The digest algorithm is explicit (`HashKind`) and the same kind is used
//!   when a payload is written and when the copy is verified.
//! - Default is MD5 so names match payloads already registered by earlier
//!   releases of the tool; SHA-256 is available via config (`"hash": "sha256"`).

use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use crate::consts::HASH_BUF_SIZE;

/// Digest algorithm used for content addressing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HashKind {
    /// 128-bit MD5, hex = 32 chars.
    #[default]
    Md5,
    /// SHA-256, hex = 64 chars.
    Sha256,
}

impl HashKind {
    /// Length of the hex digest produced by this kind.
    pub fn hex_len(self) -> usize {
        match self {
            HashKind::Md5 => 32,
            HashKind::Sha256 => 64,
        }
    }
}

impl fmt::Display for HashKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HashKind::Md5 => write!(f, "md5"),
            HashKind::Sha256 => write!(f, "sha256"),
        }
    }
}

enum Hasher {
    Md5(md5::Context),
    Sha256(Sha256),
}

impl Hasher {
    fn new(kind: HashKind) -> Self {
        match kind {
            HashKind::Md5 => Hasher::Md5(md5::Context::new()),
            HashKind::Sha256 => Hasher::Sha256(Sha256::new()),
        }
    }

    fn update(&mut self, bytes: &[u8]) {
        match self {
            Hasher::Md5(ctx) => ctx.consume(bytes),
            Hasher::Sha256(h) => h.update(bytes),
        }
    }

    fn finish_hex(self) -> String {
        match self {
            Hasher::Md5(ctx) => format!("{:x}", ctx.compute()),
            Hasher::Sha256(h) => hex_encode(&h.finalize()),
        }
    }
}

/// Digest of an in-memory buffer.
pub fn digest_bytes(kind: HashKind, bytes: &[u8]) -> String {
    let mut h = Hasher::new(kind);
    h.update(bytes);
    h.finish_hex()
}

/// Digest of a file's content (streamed, the file is not loaded whole).
pub fn content_hash(kind: HashKind, path: &Path) -> Result<String> {
    let mut f = File::open(path).with_context(|| format!("open {}", path.display()))?;
    let mut h = Hasher::new(kind);
    let mut buf = vec![0u8; HASH_BUF_SIZE];
    loop {
        let n = f
            .read(&mut buf)
            .with_context(|| format!("read {}", path.display()))?;
        if n == 0 {
            break;
        }
        h.update(&buf[..n]);
    }
    Ok(h.finish_hex())
}

/// `<digest_hex>_<basename>` for a payload file.
pub fn destination_name(path: &Path, digest_hex: &str) -> Result<String> {
    let base = path
        .file_name()
        .and_then(|s| s.to_str())
        .ok_or_else(|| anyhow!("payload path has no usable file name: {}", path.display()))?;
    Ok(format!("{digest_hex}_{base}"))
}

fn hex_encode(bytes: &[u8]) -> String {
    const HEX: &[u8; 16] = b"0123456789abcdef";
    let mut out = String::with_capacity(bytes.len() * 2);
    for &b in bytes {
        out.push(HEX[(b >> 4) as usize] as char);
        out.push(HEX[(b & 0x0f) as usize] as char);
    }
    out
}
