//! Forwarder - 1 回の forwarding 呼び出しを組み立てる
//!
//! # フロー
//! 1. Serializer で messages → block の列
//! 2. KeyGenerator で block ごとに key を割り当て
//! 3. Writer で書き込み、ForwardReport を返す
//!
//! 呼び出し間で共有する可変状態はありません（設定は検証後 immutable）。

use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use super::builder::ForwarderBuilder;
use super::config::{ForwarderConfig, ValidatedConfig, ValidationErrors};
use super::serializer::{SerializeError, Serializer};
use super::writer::Writer;
use crate::domain::{
    BatchId, Destination, ForwardEvent, ForwardReport, KeyContext, Message, PayloadBlock, StorageKey,
};
use crate::impls::{NoopEventSink, SequentialKeyGenerator};
use crate::ports::{EventSink, IdGenerator, KeyGenerator, SystemClock, UlidGenerator};

/// ForwardError は forwarding 呼び出し全体が失敗した場合のエラー
///
/// storage の書き込みエラーはここには来ません（ForwardReport に記録される）。
#[derive(Debug, thiserror::Error)]
pub enum ForwardError {
    #[error(transparent)]
    Serialize(#[from] SerializeError),
}

/// Forwarder は検証済みの設定を持ち、何度でも forward を呼べる
pub struct Forwarder {
    config: ValidatedConfig,
    serializer: Serializer,
    writer: Writer,
    key_generator: Arc<dyn KeyGenerator>,
    id_generator: Arc<dyn IdGenerator>,
    event_sink: Arc<dyn EventSink>,
}

impl Forwarder {
    /// 設定を検証して Forwarder を作る
    ///
    /// key / id の生成器はデフォルト（SequentialKeyGenerator, UlidGenerator）。
    pub fn new(config: ForwarderConfig) -> Result<Self, ValidationErrors> {
        Self::builder().config(config).build()
    }

    pub fn builder() -> ForwarderBuilder {
        ForwarderBuilder::new()
    }

    pub(crate) fn from_parts(
        config: ValidatedConfig,
        key_generator: Option<Arc<dyn KeyGenerator>>,
        id_generator: Option<Arc<dyn IdGenerator>>,
    ) -> Self {
        let event_sink: Arc<dyn EventSink> = config
            .event_sink
            .clone()
            .unwrap_or_else(|| Arc::new(NoopEventSink));
        let serializer = Serializer::new(config.size_limit)
            .with_framing(config.framing)
            .with_oversize_policy(config.oversize_policy);
        let writer = Writer::new(
            config.storage_client.clone(),
            event_sink.clone(),
            config.max_concurrency,
        );

        Self {
            serializer,
            writer,
            key_generator: key_generator.unwrap_or_else(|| Arc::new(SequentialKeyGenerator)),
            id_generator: id_generator.unwrap_or_else(|| Arc::new(UlidGenerator::new(SystemClock))),
            event_sink,
            config,
        }
    }

    pub fn destination(&self) -> &Destination {
        &self.config.destination
    }

    pub fn key_prefix(&self) -> &str {
        &self.config.key_prefix
    }

    pub fn size_limit(&self) -> u64 {
        self.config.size_limit
    }

    /// 新しい batch ID を払い出す
    pub fn next_batch_id(&self) -> BatchId {
        self.id_generator.generate_batch_id()
    }

    /// 書き込みはせず、messages を block にするだけ
    pub fn serialize(&self, messages: &[Message]) -> Result<Vec<PayloadBlock>, SerializeError> {
        self.serializer.serialize(messages)
    }

    /// block ごとの key（block 順）
    pub fn keys_for(&self, batch_id: BatchId, blocks: &[PayloadBlock]) -> Vec<StorageKey> {
        let context = KeyContext { batch_id };
        blocks
            .iter()
            .map(|block| {
                self.key_generator
                    .next_key(&self.config.key_prefix, block.index, &context)
            })
            .collect()
    }

    /// 新しい batch ID で forward する
    pub async fn forward(
        &self,
        messages: &[Message],
        cancel: &CancellationToken,
    ) -> Result<ForwardReport, ForwardError> {
        self.forward_batch(self.next_batch_id(), messages, cancel).await
    }

    /// batch ID を指定して forward する
    ///
    /// 同じ batch ID・同じ messages で呼び直すと同じ key に上書きされるので、
    /// 失敗した呼び出しの idempotent な retry に使える。
    pub async fn forward_batch(
        &self,
        batch_id: BatchId,
        messages: &[Message],
        cancel: &CancellationToken,
    ) -> Result<ForwardReport, ForwardError> {
        let blocks = self.serializer.serialize(messages)?;

        self.event_sink.emit(&ForwardEvent::BatchSerialized {
            batch_id,
            messages: messages.len(),
            blocks: blocks.len(),
            bytes: blocks.iter().map(|b| b.len() as u64).sum(),
        });
        for block in blocks.iter().filter(|b| b.oversize) {
            self.event_sink.emit(&ForwardEvent::OversizeIsolated {
                batch_id,
                block: block.index,
                message: block.first_message,
                bytes: block.len() as u64,
                size_limit: self.config.size_limit,
            });
        }

        let keys = self.keys_for(batch_id, &blocks);
        let entries: Vec<(PayloadBlock, StorageKey)> = blocks.into_iter().zip(keys).collect();

        Ok(self
            .writer
            .write(batch_id, &entries, &self.config.destination, cancel)
            .await)
    }
}
