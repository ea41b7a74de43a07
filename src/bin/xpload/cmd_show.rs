use anyhow::Result;

use xpload::config::XploadConfig;
use xpload::remote::{Component, Entry, HttpRemote};

use super::util::dump_json;

pub fn exec(config: &str, component: Component, id: Option<i64>, dump: bool) -> Result<()> {
    let cfg = XploadConfig::resolve(config)?;
    let remote = HttpRemote::new(&cfg)?;

    // read-only запрос: ошибка печатается, результат считается пустым
    let entries: Vec<Entry> = match remote.fetch_entries(component, id) {
        Ok(v) => v,
        Err(e) => {
            let details = match id {
                Some(id) => format!(" ({component} may not contain entry with id={id})"),
                None => String::new(),
            };
            println!("Error: {e:#}{details}");
            Vec::new()
        }
    };

    if dump {
        println!("{}", dump_json(&entries)?);
    } else {
        for e in &entries {
            println!("{}", e.label());
        }
    }
    Ok(())
}
