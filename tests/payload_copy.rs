use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use anyhow::Result;

use xpload::error::{classify, XploadError};
use xpload::hash::{content_hash, digest_bytes, HashKind};
use xpload::payload::{FileCopier, PayloadStore};

static NEXT_ID: AtomicU64 = AtomicU64::new(1);

fn unique_root(prefix: &str) -> PathBuf {
    let pid = std::process::id();
    let t = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos();
    let id = NEXT_ID.fetch_add(1, Ordering::Relaxed);
    let base = std::env::temp_dir();
    base.join(format!("xptest-payload-{prefix}-{pid}-{t}-{id}"))
}

/// Пишет только половину файла: имитация обрезанной копии.
struct TruncatingCopier;

impl FileCopier for TruncatingCopier {
    fn copy(&self, src: &Path, dst: &Path) -> Result<()> {
        let bytes = fs::read(src)?;
        fs::write(dst, &bytes[..bytes.len() / 2])?;
        Ok(())
    }
}

#[test]
fn copy_places_file_under_prefix_domain() -> Result<()> {
    let root = unique_root("layout");
    let prefix = root.join("prefix");
    fs::create_dir_all(&prefix)?;
    let src = root.join("calib.root");
    fs::write(&src, b"calibration constants")?;

    let store = PayloadStore::new(vec![prefix.clone()], HashKind::Md5);
    let dst = store.copy(&src, "ecal", false)?;

    let digest = digest_bytes(HashKind::Md5, b"calibration constants");
    assert_eq!(dst, prefix.join("ecal").join(format!("{digest}_calib.root")));
    assert_eq!(fs::read(&dst)?, b"calibration constants");
    Ok(())
}

#[test]
fn same_content_same_basename_is_idempotent() -> Result<()> {
    let root = unique_root("idempotent");
    let prefix = root.join("prefix");
    fs::create_dir_all(&prefix)?;
    fs::create_dir_all(root.join("a"))?;
    fs::create_dir_all(root.join("b"))?;
    let src1 = root.join("a").join("geom.dat");
    let src2 = root.join("b").join("geom.dat");
    fs::write(&src1, b"same bytes")?;
    fs::write(&src2, b"same bytes")?;

    let store = PayloadStore::new(vec![prefix.clone()], HashKind::Md5);
    let d1 = store.copy(&src1, "hcal", false)?;
    let d2 = store.copy(&src2, "hcal", false)?;

    assert_eq!(d1, d2);
    assert_eq!(fs::read(&d2)?, b"same bytes");
    assert_eq!(fs::read_dir(prefix.join("hcal"))?.count(), 1);
    Ok(())
}

#[test]
fn same_content_different_basenames_are_distinct() -> Result<()> {
    let root = unique_root("basenames");
    let prefix = root.join("prefix");
    fs::create_dir_all(&prefix)?;
    let src1 = root.join("one.dat");
    let src2 = root.join("two.dat");
    fs::write(&src1, b"identical")?;
    fs::write(&src2, b"identical")?;

    let store = PayloadStore::new(vec![prefix.clone()], HashKind::Md5);
    let d1 = store.copy(&src1, "d", false)?;
    let d2 = store.copy(&src2, "d", false)?;

    assert_ne!(d1, d2);
    assert_eq!(fs::read(&d1)?, fs::read(&d2)?);
    Ok(())
}

#[test]
fn sha256_names_use_sha256_digest() -> Result<()> {
    let root = unique_root("sha");
    let prefix = root.join("prefix");
    fs::create_dir_all(&prefix)?;
    let src = root.join("x.bin");
    fs::write(&src, b"payload")?;

    let store = PayloadStore::new(vec![prefix], HashKind::Sha256);
    let dst = store.copy(&src, "d", true)?;
    let name = dst.file_name().and_then(|s| s.to_str()).unwrap_or_default().to_string();
    assert_eq!(name, format!("{}_x.bin", content_hash(HashKind::Sha256, &src)?));
    Ok(())
}

#[test]
fn truncated_copy_is_integrity_error() -> Result<()> {
    let root = unique_root("integrity");
    let prefix = root.join("prefix");
    fs::create_dir_all(&prefix)?;
    let src = root.join("big.dat");
    fs::write(&src, vec![7u8; 4096])?;

    let store = PayloadStore::with_copier(vec![prefix], HashKind::Md5, TruncatingCopier);
    let err = store.copy(&src, "d", false).unwrap_err();
    assert!(matches!(
        classify(&err),
        Some(XploadError::CopyIntegrityError { .. })
    ));
    Ok(())
}

#[test]
fn missing_source_is_source_not_found() -> Result<()> {
    let root = unique_root("missing");
    let prefix = root.join("prefix");
    fs::create_dir_all(&prefix)?;

    let store = PayloadStore::new(vec![prefix], HashKind::Md5);
    let err = store.copy(&root.join("nope.dat"), "d", true).unwrap_err();
    assert!(matches!(classify(&err), Some(XploadError::SourceNotFound(_))));
    Ok(())
}

#[test]
fn no_existing_prefix_is_no_writable_prefix() -> Result<()> {
    let root = unique_root("noprefix");
    fs::create_dir_all(&root)?;
    let src = root.join("x.dat");
    fs::write(&src, b"x")?;

    let store = PayloadStore::new(vec![root.join("p1"), root.join("p2")], HashKind::Md5);
    let err = store.copy(&src, "d", true).unwrap_err();
    match classify(&err) {
        Some(XploadError::NoWritablePrefix { candidates }) => assert_eq!(candidates.len(), 2),
        other => panic!("unexpected error: {other:?}"),
    }
    Ok(())
}

#[test]
fn later_prefix_used_when_first_is_missing() -> Result<()> {
    let root = unique_root("fallback");
    let second = root.join("second");
    fs::create_dir_all(&second)?;
    let src = root.join("x.dat");
    fs::write(&src, b"x")?;

    let store = PayloadStore::new(vec![root.join("first"), second.clone()], HashKind::Md5);
    let dst = store.copy(&src, "d", false)?;
    assert!(dst.starts_with(&second));
    assert!(dst.exists());
    Ok(())
}

/// Effective uid (Linux, из /proc/self/status).
#[cfg(target_os = "linux")]
fn effective_uid() -> Option<u32> {
    let status = fs::read_to_string("/proc/self/status").ok()?;
    let line = status.lines().find(|l| l.starts_with("Uid:"))?;
    line.split_whitespace().nth(2)?.parse().ok()
}

#[cfg(target_os = "linux")]
#[test]
fn dry_run_and_real_copy_agree_on_unwritable_first_prefix() -> Result<()> {
    use std::os::unix::fs::PermissionsExt;
    // root пишет куда угодно: проверять нечего
    if effective_uid() == Some(0) {
        return Ok(());
    }
    let root = unique_root("locked");
    let locked = root.join("locked");
    let open = root.join("open");
    fs::create_dir_all(&locked)?;
    fs::create_dir_all(&open)?;
    // r-x: каталог существует, но писать в него нельзя
    fs::set_permissions(&locked, fs::Permissions::from_mode(0o555))?;
    let src = root.join("src.dat");
    fs::write(&src, b"conditions")?;

    let store = PayloadStore::new(vec![locked.clone(), open.clone()], HashKind::Md5);
    let planned = store.copy(&src, "ecal", true)?;
    let written = store.copy(&src, "ecal", false)?;

    fs::set_permissions(&locked, fs::Permissions::from_mode(0o755))?;
    assert!(planned.starts_with(&open));
    assert_eq!(planned, written);
    assert!(written.exists());
    Ok(())
}
