// Базовые модули
pub mod consts;
pub mod error;
pub mod config;

// Content addressing + prefix tree
pub mod hash;
pub mod prefix;
pub mod payload;

// Локальный стейдж и push
pub mod stage;  // src/stage/{mod,records,file}.rs
pub mod push;

// Каталог (HTTP)
pub mod remote; // src/remote/{mod,http}.rs

// Удобные реэкспорты
pub use config::XploadConfig;
pub use error::{classify, StageKind, XploadError};
pub use hash::HashKind;
pub use payload::{FileCopier, FsCopier, PayloadStore};
pub use push::{PushCoordinator, PushReport};
pub use remote::{HttpRemote, PilSubmission, Remote};
pub use stage::{Stage, StagedPayloadEntry, StagedPil, StagedTag};
