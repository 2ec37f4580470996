//! StorageKey - key prefix + 生成された discriminator
//!
//! key の形式は batch をまたいで安定している必要があります（下流が parse するため）。

use serde::{Deserialize, Serialize};
use std::fmt;

use super::ids::BatchId;

/// KeyContext は key 生成に使う batch 単位の情報
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyContext {
    pub batch_id: BatchId,
}

/// 生成された storage key（destination の path からの相対）
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StorageKey(String);

impl StorageKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for StorageKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for StorageKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
