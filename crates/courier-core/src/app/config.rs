//! ForwarderConfig - forwarder の静的な設定と検証
//!
//! # Fail-fast 設計
//! - 設定は forwarder の構築時に 1 回だけ検証する
//! - 検証は最初の失敗で止まらず、すべての問題を 1 つの `ValidationErrors` にまとめて返す
//! - 検証に通った設定だけが `Forwarder` になる（以降は immutable）

use serde::Deserialize;
use std::fmt;
use std::sync::Arc;

use crate::domain::{Destination, DestinationError, Framing, OversizePolicy};
use crate::ports::{EventSink, StorageClient};

/// 4.5 GiB
pub const DEFAULT_SIZE_LIMIT: i64 = 4_831_838_208;

pub const DEFAULT_MAX_CONCURRENCY: usize = 4;

/// ForwarderConfig は process wiring 側から 1 回だけ渡される設定
///
/// plain なフィールドは JSON から読めます（capability は skip）。
///
/// ```ignore
/// let config: ForwarderConfig = serde_json::from_str(r#"{
///     "destination_uri": "s3://bucket/prefix",
///     "key_prefix": "logs/",
///     "size_limit": 1048576
/// }"#)?;
/// ```
#[derive(Clone, Deserialize)]
#[serde(default)]
pub struct ForwarderConfig {
    /// `s3://bucket/optional/path`
    pub destination_uri: String,

    /// 生成される全 key の先頭に付く
    pub key_prefix: String,

    /// 1 block の最大バイト数
    pub size_limit: i64,

    /// 同時に in-flight にする書き込みの上限
    pub max_concurrency: usize,

    pub oversize_policy: OversizePolicy,

    pub framing: Framing,

    #[serde(skip)]
    pub storage_client: Option<Arc<dyn StorageClient>>,

    #[serde(skip)]
    pub event_sink: Option<Arc<dyn EventSink>>,
}

impl Default for ForwarderConfig {
    fn default() -> Self {
        Self {
            destination_uri: String::new(),
            key_prefix: String::new(),
            size_limit: DEFAULT_SIZE_LIMIT,
            max_concurrency: DEFAULT_MAX_CONCURRENCY,
            oversize_policy: OversizePolicy::default(),
            framing: Framing::default(),
            storage_client: None,
            event_sink: None,
        }
    }
}

impl fmt::Debug for ForwarderConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ForwarderConfig")
            .field("destination_uri", &self.destination_uri)
            .field("key_prefix", &self.key_prefix)
            .field("size_limit", &self.size_limit)
            .field("max_concurrency", &self.max_concurrency)
            .field("oversize_policy", &self.oversize_policy)
            .field("framing", &self.framing)
            .field("storage_client", &self.storage_client.as_ref().map(|_| "<storage client>"))
            .field("event_sink", &self.event_sink.as_ref().map(|_| "<event sink>"))
            .finish()
    }
}

/// ConfigErrorKind は ConfigError の種類だけを表す（比較・検索用）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConfigErrorKind {
    InvalidDestination,
    NonPositiveSizeLimit,
    MissingStorageClient,
    ZeroConcurrency,
}

/// ConfigError は 1 つの検証項目の失敗
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid destination URI: {0}")]
    InvalidDestination(#[source] DestinationError),

    #[error("SizeLimit must be a positive value, got: {0}")]
    NonPositiveSizeLimit(i64),

    #[error("missing storage client")]
    MissingStorageClient,

    #[error("max_concurrency must be at least 1")]
    ZeroConcurrency,
}

impl ConfigError {
    pub fn kind(&self) -> ConfigErrorKind {
        match self {
            ConfigError::InvalidDestination(_) => ConfigErrorKind::InvalidDestination,
            ConfigError::NonPositiveSizeLimit(_) => ConfigErrorKind::NonPositiveSizeLimit,
            ConfigError::MissingStorageClient => ConfigErrorKind::MissingStorageClient,
            ConfigError::ZeroConcurrency => ConfigErrorKind::ZeroConcurrency,
        }
    }
}

/// ValidationErrors は失敗したすべての検証項目（検査した順）
///
/// Display は各メッセージを改行で連結します。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationErrors {
    errors: Vec<ConfigError>,
}

impl ValidationErrors {
    pub fn iter(&self) -> std::slice::Iter<'_, ConfigError> {
        self.errors.iter()
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    /// 指定した種類のエラーを含むか
    pub fn contains(&self, kind: ConfigErrorKind) -> bool {
        self.errors.iter().any(|e| e.kind() == kind)
    }

    pub fn kinds(&self) -> Vec<ConfigErrorKind> {
        self.errors.iter().map(ConfigError::kind).collect()
    }

    pub fn into_inner(self) -> Vec<ConfigError> {
        self.errors
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, err) in self.errors.iter().enumerate() {
            if i > 0 {
                f.write_str("\n")?;
            }
            write!(f, "{err}")?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationErrors {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self.errors.as_slice() {
            [only] => Some(only),
            _ => None,
        }
    }
}

impl<'a> IntoIterator for &'a ValidationErrors {
    type Item = &'a ConfigError;
    type IntoIter = std::slice::Iter<'a, ConfigError>;

    fn into_iter(self) -> Self::IntoIter {
        self.errors.iter()
    }
}

/// 検証済みの設定。`Forwarder` が所有する。
#[derive(Clone)]
pub(crate) struct ValidatedConfig {
    pub destination: Destination,
    pub key_prefix: String,
    pub size_limit: u64,
    pub max_concurrency: usize,
    pub oversize_policy: OversizePolicy,
    pub framing: Framing,
    pub storage_client: Arc<dyn StorageClient>,
    pub event_sink: Option<Arc<dyn EventSink>>,
}

impl ForwarderConfig {
    /// すべての項目を独立に検査する
    ///
    /// 入力を変更しない純粋関数なので、何度呼んでも同じ結果になる。
    pub fn validate(&self) -> Result<(), ValidationErrors> {
        self.check().map(|_| ())
    }

    pub(crate) fn check(&self) -> Result<ValidatedConfig, ValidationErrors> {
        let mut errors = Vec::new();

        let destination = match Destination::parse(&self.destination_uri) {
            Ok(destination) => Some(destination),
            Err(e) => {
                errors.push(ConfigError::InvalidDestination(e));
                None
            }
        };

        if self.size_limit <= 0 {
            errors.push(ConfigError::NonPositiveSizeLimit(self.size_limit));
        }

        if self.storage_client.is_none() {
            errors.push(ConfigError::MissingStorageClient);
        }

        if self.max_concurrency == 0 {
            errors.push(ConfigError::ZeroConcurrency);
        }

        match (destination, &self.storage_client) {
            (Some(destination), Some(storage_client)) if errors.is_empty() => Ok(ValidatedConfig {
                destination,
                key_prefix: self.key_prefix.clone(),
                size_limit: self.size_limit as u64,
                max_concurrency: self.max_concurrency,
                oversize_policy: self.oversize_policy,
                framing: self.framing,
                storage_client: storage_client.clone(),
                event_sink: self.event_sink.clone(),
            }),
            _ => Err(ValidationErrors { errors }),
        }
    }
}
