use std::fs;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use anyhow::Result;

use xpload::consts::STAGE_DIR;
use xpload::stage::{Stage, StagedPayloadEntry, StagedTag};

static NEXT_ID: AtomicU64 = AtomicU64::new(1);

fn unique_root(prefix: &str) -> PathBuf {
    let pid = std::process::id();
    let t = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos();
    let id = NEXT_ID.fetch_add(1, Ordering::Relaxed);
    let base = std::env::temp_dir();
    base.join(format!("xptest-stage-{prefix}-{pid}-{t}-{id}"))
}

#[test]
fn same_tag_name_twice_keeps_latest_status() -> Result<()> {
    let stage = Stage::open(&unique_root("tag-status").join(STAGE_DIR));

    stage.add_tag(StagedTag::new("calib_v1", "online", "unlocked", ["ecal"])?)?;
    stage.add_tag(StagedTag::new("calib_v1", "online", "locked", ["ecal"])?)?;

    let tags = stage.tags.load()?.records;
    assert_eq!(tags.len(), 1, "exactly one staged tag per name");
    assert_eq!(tags[0].status, "locked");
    Ok(())
}

#[test]
fn same_interval_replaces_payload_path() -> Result<()> {
    let stage = Stage::open(&unique_root("pil-replace").join(STAGE_DIR));

    stage.add_pil("T", "D", StagedPayloadEntry::new("A", 0, Some(10))?)?;
    stage.add_pil("T", "D", StagedPayloadEntry::new("B", 0, Some(10))?)?;

    let pils = stage.pils.load()?.records;
    assert_eq!(pils.len(), 1);
    assert_eq!(pils[0].payloads.len(), 1);
    assert_eq!(pils[0].payloads[0].path, "B");
    Ok(())
}

#[test]
fn adjacent_intervals_coexist() -> Result<()> {
    let stage = Stage::open(&unique_root("pil-coexist").join(STAGE_DIR));

    stage.add_pil("T", "D", StagedPayloadEntry::new("A", 0, Some(10))?)?;
    stage.add_pil("T", "D", StagedPayloadEntry::new("B", 10, Some(20))?)?;

    let pils = stage.pils.load()?.records;
    assert_eq!(pils.len(), 1);
    let intervals: Vec<_> = pils[0].payloads.iter().map(|p| p.interval()).collect();
    assert_eq!(intervals, vec![(0, Some(10)), (10, Some(20))]);
    Ok(())
}

#[test]
fn different_domains_are_separate_pils() -> Result<()> {
    let stage = Stage::open(&unique_root("pil-domains").join(STAGE_DIR));

    stage.add_pil("T", "ecal", StagedPayloadEntry::new("A", 0, None)?)?;
    stage.add_pil("T", "hcal", StagedPayloadEntry::new("B", 0, None)?)?;
    stage.add_pil("U", "ecal", StagedPayloadEntry::new("C", 0, None)?)?;

    let pils = stage.pils.load()?.records;
    assert_eq!(pils.len(), 3);
    Ok(())
}

#[test]
fn tag_stage_keeps_domains_as_set() -> Result<()> {
    let stage = Stage::open(&unique_root("tag-domains").join(STAGE_DIR));
    stage.add_tag(StagedTag::new("calib_v1", "online", "unlocked", ["ecal", "hcal", "hcal"])?)?;

    let raw: serde_json::Value = serde_json::from_slice(&fs::read(stage.tags.path())?)?;
    let arr = raw.as_array().expect("stage is a JSON array");
    assert_eq!(arr.len(), 1);
    let mut domains: Vec<String> = arr[0]["domains"]
        .as_array()
        .expect("domains array")
        .iter()
        .map(|d| d.as_str().unwrap_or_default().to_string())
        .collect();
    domains.sort();
    assert_eq!(domains, vec!["ecal".to_string(), "hcal".to_string()]);
    Ok(())
}

#[test]
fn stage_written_by_earlier_release_is_readable() -> Result<()> {
    let dir = unique_root("compat").join(STAGE_DIR);
    fs::create_dir_all(&dir)?;
    let stage = Stage::open(&dir);

    // формат, который писала предыдущая версия инструмента
    fs::write(
        stage.pils.path(),
        r#"[
  {
    "tag": "T",
    "domain": "D",
    "payloads": [
      {
        "path": "a.bin",
        "start": 5,
        "end": null
      }
    ]
  }
]"#,
    )?;
    fs::write(
        stage.tags.path(),
        r#"[{"name": "T", "type": "online", "status": "unlocked", "domains": ["D"]}]"#,
    )?;

    let pils = stage.pils.load()?;
    assert!(pils.existed);
    assert_eq!(pils.records[0].payloads[0].interval(), (5, None));
    let tags = stage.tags.load()?.records;
    assert_eq!(tags[0].tag_type, "online");
    Ok(())
}

#[test]
fn randomized_adds_keep_stage_invariants() -> Result<()> {
    let stage = Stage::open(&unique_root("rand").join(STAGE_DIR));
    let mut rng = oorandom::Rand32::new(0x5eed);

    // ожидаемое состояние: (tag, domain, start, end) -> последний path
    let mut expected: Vec<((String, String, u64, Option<u64>), String)> = Vec::new();

    for i in 0..200 {
        let tag = format!("Tag_{}", rng.rand_range(0..3));
        let domain = format!("Domain_{}", rng.rand_range(0..3));
        let start = rng.rand_range(0..5) as u64 * 10;
        let end = if rng.rand_range(0..2) == 0 {
            None
        } else {
            Some(start + 10)
        };
        let path = format!("Payload_{i}");

        stage.add_pil(&tag, &domain, StagedPayloadEntry::new(path.clone(), start, end)?)?;

        let key = (tag, domain, start, end);
        match expected.iter_mut().find(|(k, _)| *k == key) {
            Some((_, p)) => *p = path,
            None => expected.push((key, path)),
        }
    }

    let pils = stage.pils.load()?.records;

    // не более одного PIL на (tag, domain)
    for (i, a) in pils.iter().enumerate() {
        for b in &pils[i + 1..] {
            assert!(a.tag != b.tag || a.domain != b.domain);
        }
        // не более одной записи на (start, end)
        for (j, x) in a.payloads.iter().enumerate() {
            for y in &a.payloads[j + 1..] {
                assert_ne!(x.interval(), y.interval());
            }
        }
    }

    let total: usize = pils.iter().map(|p| p.payloads.len()).sum();
    assert_eq!(total, expected.len());
    for ((tag, domain, start, end), path) in &expected {
        let pil = pils
            .iter()
            .find(|p| &p.tag == tag && &p.domain == domain)
            .expect("pil staged");
        let entry = pil
            .payloads
            .iter()
            .find(|e| e.interval() == (*start, *end))
            .expect("entry staged");
        assert_eq!(&entry.path, path, "last add wins");
    }
    Ok(())
}
