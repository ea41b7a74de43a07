use anyhow::{Context, Result};
use std::path::PathBuf;

use xpload::error::{classify, XploadError};
use xpload::consts::{EXIT_CONFIG, EXIT_OSFILE};

pub fn non_empty(value: &str) -> Result<String, String> {
    let v = value.trim();
    if v.is_empty() {
        return Err("Must provide a non-empty string".to_string());
    }
    Ok(v.to_string())
}

pub fn existing_file(value: &str) -> Result<PathBuf, String> {
    let p = PathBuf::from(value);
    if !p.exists() {
        return Err("File not found".to_string());
    }
    Ok(p)
}

/// JSON with 4-space indentation (`--dump`).
pub fn dump_json<T: serde::Serialize>(value: &T) -> Result<String> {
    let mut out = Vec::new();
    let fmt = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut ser = serde_json::Serializer::with_formatter(&mut out, fmt);
    value.serialize(&mut ser).context("serialize response")?;
    String::from_utf8(out).context("response is not utf-8")
}

pub fn exit_code(err: &anyhow::Error) -> i32 {
    match classify(err) {
        Some(XploadError::ConfigNotFound { .. }) | Some(XploadError::InvalidConfig { .. }) => {
            EXIT_CONFIG
        }
        _ => EXIT_OSFILE,
    }
}
