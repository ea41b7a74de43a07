//! Общие константы (stage layout, config lookup, remote endpoints, exit codes).

// -------- Stage --------
// Каталог стейджа относительно текущего рабочего каталога.
pub const STAGE_DIR: &str = ".xpload";
pub const TAGS_FILE: &str = "tags.json";
pub const PILS_FILE: &str = "pils.json";

// -------- Config --------
pub const ENV_CONFIG_DIR: &str = "XPLOAD_CONFIG_DIR";
pub const ENV_CONFIG_NAME: &str = "XPLOAD_CONFIG";
pub const DEFAULT_CONFIG_NAME: &str = "prod";
pub const CONFIG_SEARCH_PATHS: &[&str] = &[".", "config"];
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

// -------- Remote endpoints --------
pub const POST_ENDPOINTS: &[&str] = &["gttype", "gtstatus", "gt", "pt", "pl", "piov", "pil", "tag"];
pub const PUT_ENDPOINTS: &[&str] = &["pl_attach", "piov_attach", "gt_change_status"];
pub const PAYLOAD_IOVS_ENDPOINT: &str = "payloadiovs";

// -------- Add defaults --------
pub const DEFAULT_TAG_TYPE: &str = "online";
pub const DEFAULT_TAG_STATUS: &str = "unlocked";

// -------- Payload copy --------
pub const HASH_BUF_SIZE: usize = 64 * 1024;

// -------- Exit codes (sysexits.h) --------
pub const EXIT_OSFILE: i32 = 72;
pub const EXIT_CONFIG: i32 = 78;
