//! ForwarderBuilder - forwarder の構築とワイヤリング
//!
//! # 学習ポイント
//! - Builder パターンの実装
//! - 起動時検証（Fail-fast 設計）
//! - 開発体験の改善（すべての設定エラーを一度に返す）

use std::sync::Arc;

use super::config::{ForwarderConfig, ValidationErrors};
use super::forwarder::Forwarder;
use crate::domain::{Framing, OversizePolicy};
use crate::ports::{EventSink, IdGenerator, KeyGenerator, StorageClient};

/// ForwarderBuilder は Forwarder を構築
///
/// # 使用例
/// ```ignore
/// let forwarder = ForwarderBuilder::new()
///     .destination("s3://bucket/prefix")
///     .key_prefix("logs/")
///     .size_limit(16 * 1024 * 1024)
///     .storage_client(client)
///     .build()?;
/// ```
///
/// # Fail-fast 設計
/// - build() 時に ForwarderConfig::validate と同じ検査をする
/// - 不足があれば ValidationErrors を返し、Forwarder は作られない
#[derive(Default)]
pub struct ForwarderBuilder {
    config: ForwarderConfig,
    key_generator: Option<Arc<dyn KeyGenerator>>,
    id_generator: Option<Arc<dyn IdGenerator>>,
}

impl ForwarderBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// 既存の設定（JSON から読んだものなど）から始める
    pub fn config(mut self, config: ForwarderConfig) -> Self {
        self.config = config;
        self
    }

    pub fn destination(mut self, destination_uri: impl Into<String>) -> Self {
        self.config.destination_uri = destination_uri.into();
        self
    }

    pub fn key_prefix(mut self, key_prefix: impl Into<String>) -> Self {
        self.config.key_prefix = key_prefix.into();
        self
    }

    pub fn size_limit(mut self, size_limit: i64) -> Self {
        self.config.size_limit = size_limit;
        self
    }

    pub fn max_concurrency(mut self, max_concurrency: usize) -> Self {
        self.config.max_concurrency = max_concurrency;
        self
    }

    pub fn oversize_policy(mut self, oversize_policy: OversizePolicy) -> Self {
        self.config.oversize_policy = oversize_policy;
        self
    }

    pub fn framing(mut self, framing: Framing) -> Self {
        self.config.framing = framing;
        self
    }

    pub fn storage_client<S: StorageClient + 'static>(self, storage_client: S) -> Self {
        self.storage_client_arc(Arc::new(storage_client))
    }

    pub fn storage_client_arc(mut self, storage_client: Arc<dyn StorageClient>) -> Self {
        self.config.storage_client = Some(storage_client);
        self
    }

    pub fn event_sink<E: EventSink + 'static>(self, event_sink: E) -> Self {
        self.event_sink_arc(Arc::new(event_sink))
    }

    pub fn event_sink_arc(mut self, event_sink: Arc<dyn EventSink>) -> Self {
        self.config.event_sink = Some(event_sink);
        self
    }

    pub fn key_generator<K: KeyGenerator + 'static>(mut self, key_generator: K) -> Self {
        self.key_generator = Some(Arc::new(key_generator));
        self
    }

    pub fn id_generator<I: IdGenerator + 'static>(mut self, id_generator: I) -> Self {
        self.id_generator = Some(Arc::new(id_generator));
        self
    }

    /// 設定を検証して Forwarder を生成
    pub fn build(self) -> Result<Forwarder, ValidationErrors> {
        let validated = self.config.check()?;
        Ok(Forwarder::from_parts(validated, self.key_generator, self.id_generator))
    }
}
