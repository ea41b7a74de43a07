use anyhow::{anyhow, Result};

use xpload::config::XploadConfig;
use xpload::payload::PayloadStore;
use xpload::remote::{HttpRemote, PayloadIovEntry};

use super::util::dump_json;

pub fn exec(config: &str, tag: String, domain: Option<String>, start: u64, dump: bool) -> Result<()> {
    let cfg = XploadConfig::resolve(config)?;
    let remote = HttpRemote::new(&cfg)?;

    let entries: Vec<PayloadIovEntry> = match remote.fetch_payloads(&tag, domain.as_deref(), start) {
        Ok(v) => v,
        Err(e) => {
            println!("Error: Something went wrong while looking for tag {tag} and start time {start}: {e:#}");
            Vec::new()
        }
    };

    if dump {
        println!("{}", dump_json(&entries)?);
        return Ok(());
    }

    let store = PayloadStore::new(cfg.prefixes(), cfg.hash);
    let paths: Vec<String> = entries
        .iter()
        .flat_map(|e| e.payload_iov.iter())
        .filter_map(|iov| store.locate(&iov.payload_url))
        .map(|p| p.display().to_string())
        .collect();

    if paths.is_empty() {
        return Err(anyhow!("No payload file was found in any prefix"));
    }
    println!("{}", paths.join("\n"));
    Ok(())
}
