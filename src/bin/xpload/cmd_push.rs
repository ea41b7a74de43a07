use anyhow::Result;

use xpload::config::XploadConfig;
use xpload::error::XploadError;
use xpload::payload::PayloadStore;
use xpload::push::PushCoordinator;
use xpload::remote::HttpRemote;
use xpload::stage::Stage;

pub fn exec(config: &str) -> Result<()> {
    let stage = Stage::in_cwd()?;
    // пустой стейдж: ошибка ещё до чтения конфига
    if stage.is_empty() {
        return Err(XploadError::NothingStaged.into());
    }

    let cfg = XploadConfig::resolve(config)?;
    let store = PayloadStore::new(cfg.prefixes(), cfg.hash);
    let remote = HttpRemote::new(&cfg)?;

    let report = PushCoordinator::new(&stage, &store, &remote).push()?;
    println!(
        "OK push: {} tag(s), {} payload(s)",
        report.tags, report.payloads
    );
    Ok(())
}
