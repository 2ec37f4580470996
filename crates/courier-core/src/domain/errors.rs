//! Errors - storage 書き込みエラーと分類
//!
//! config 検証のエラーは `app::config` にあります。ここで扱うのは
//! StorageClient が 1 回の put ごとに返すエラーだけです。

use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// StorageErrorKind は書き込みエラーの運用分類
///
/// - Transient: 一時的なエラー（caller が retry してよい）
/// - Rejected: その object に対して恒久的（retry しても同じ結果）
/// - DestinationUnavailable: 宛先そのものが使えない（残りの書き込みを中止する）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StorageErrorKind {
    Transient,
    Rejected,
    DestinationUnavailable,
}

/// StorageError は 1 block の書き込み失敗
///
/// report に載せるため `Clone + Serialize` です。`source` は診断用で、
/// JSON には `kind` と `message` だけが出ます。
#[derive(Debug, Clone, Serialize)]
pub struct StorageError {
    kind: StorageErrorKind,
    message: String,
    #[serde(skip)]
    source: Option<Arc<dyn std::error::Error + Send + Sync>>,
}

impl StorageError {
    pub fn new(kind: StorageErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            source: None,
        }
    }

    pub fn transient(message: impl Into<String>) -> Self {
        Self::new(StorageErrorKind::Transient, message)
    }

    pub fn rejected(message: impl Into<String>) -> Self {
        Self::new(StorageErrorKind::Rejected, message)
    }

    pub fn destination_unavailable(message: impl Into<String>) -> Self {
        Self::new(StorageErrorKind::DestinationUnavailable, message)
    }

    pub fn with_source<E>(mut self, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        self.source = Some(Arc::new(source));
        self
    }

    pub fn kind(&self) -> StorageErrorKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// 宛先が使えない場合は true。writer はこれを見て残りの書き込みを中止する。
    pub fn is_fatal(&self) -> bool {
        self.kind == StorageErrorKind::DestinationUnavailable
    }
}

impl PartialEq for StorageError {
    fn eq(&self, other: &Self) -> bool {
        self.kind == other.kind && self.message == other.message
    }
}

impl std::fmt::Display for StorageError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "storage error (kind: {:?}): {}", self.kind, self.message)
    }
}

impl std::error::Error for StorageError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_deref()
            .map(|e| e as &(dyn std::error::Error + 'static))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn only_destination_unavailable_is_fatal() {
        assert!(!StorageError::transient("x").is_fatal());
        assert!(!StorageError::rejected("x").is_fatal());
        assert!(StorageError::destination_unavailable("x").is_fatal());
    }

    #[test]
    fn source_is_exposed() {
        let io = std::io::Error::other("disk on fire");
        let err = StorageError::transient("write failed").with_source(io);
        let source = err.source().unwrap();
        assert_eq!(source.to_string(), "disk on fire");
    }

    #[test]
    fn serializes_kind_and_message_only() {
        let err = StorageError::rejected("too big").with_source(std::io::Error::other("inner"));
        let v = serde_json::to_value(&err).unwrap();
        assert_eq!(v, serde_json::json!({"kind": "rejected", "message": "too big"}));
    }
}
