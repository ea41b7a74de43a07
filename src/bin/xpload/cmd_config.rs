use anyhow::{Context, Result};

use xpload::config::XploadConfig;

pub fn exec(config: &str, fields: Vec<String>) -> Result<()> {
    let cfg = XploadConfig::resolve(config)?;
    log::debug!("{cfg}");
    let value = cfg.lookup(&fields)?;
    match value {
        serde_json::Value::String(s) => println!("{s}"),
        other => println!(
            "{}",
            serde_json::to_string_pretty(&other).context("serialize config")?
        ),
    }
    Ok(())
}
