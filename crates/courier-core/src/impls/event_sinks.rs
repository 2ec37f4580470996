//! EventSink の実装
//!
//! - **NoopEventSink**: 何もしない（logger が渡されなかったときのデフォルト）
//! - **TracingEventSink**: `tracing` の構造化ログに変換する
//! - **MemoryEventSink**: 受け取ったイベントを保持する（テスト用）

use std::sync::Mutex;
use tracing::{debug, error, info, warn};

use crate::domain::{ForwardEvent, ForwardStatus};
use crate::ports::EventSink;

#[derive(Debug, Clone, Copy, Default)]
pub struct NoopEventSink;

impl EventSink for NoopEventSink {
    fn emit(&self, _event: &ForwardEvent) {}
}

/// TracingEventSink は ForwardEvent を tracing のイベントにする
///
/// 失敗は warn、中止は error、それ以外は debug/info。
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingEventSink;

impl EventSink for TracingEventSink {
    fn emit(&self, event: &ForwardEvent) {
        match event {
            ForwardEvent::BatchSerialized {
                batch_id,
                messages,
                blocks,
                bytes,
            } => debug!(%batch_id, messages, blocks, bytes, "Serialized batch."),
            ForwardEvent::OversizeIsolated {
                batch_id,
                block,
                message,
                bytes,
                size_limit,
            } => warn!(%batch_id, block, message, bytes, size_limit, "Isolated oversize message in its own block."),
            ForwardEvent::BlockWritten {
                batch_id,
                block,
                key,
                bytes,
            } => debug!(%batch_id, block, %key, bytes, "Wrote block."),
            ForwardEvent::BlockFailed {
                batch_id,
                block,
                key,
                error,
            } => warn!(%batch_id, block, %key, %error, "Failed to write block."),
            ForwardEvent::WritesAborted {
                batch_id,
                block,
                error,
                not_attempted,
            } => error!(%batch_id, block, %error, not_attempted, "Destination unavailable, abandoning remaining writes."),
            ForwardEvent::Cancelled {
                batch_id,
                not_attempted,
            } => warn!(%batch_id, not_attempted, "Forwarding cancelled."),
            ForwardEvent::BatchCompleted {
                batch_id,
                status,
                written,
                failed,
                not_attempted,
            } => {
                if *status == ForwardStatus::Complete {
                    info!(%batch_id, ?status, written, "Forwarded batch.");
                } else {
                    warn!(%batch_id, ?status, written, failed, not_attempted, "Forwarded batch with failures.");
                }
            }
        }
    }
}

/// MemoryEventSink は受け取ったイベントを順に保持する
#[derive(Debug, Default)]
pub struct MemoryEventSink {
    events: Mutex<Vec<ForwardEvent>>,
}

impl MemoryEventSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<ForwardEvent> {
        match self.events.lock() {
            Ok(events) => events.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

impl EventSink for MemoryEventSink {
    fn emit(&self, event: &ForwardEvent) {
        let mut events = match self.events.lock() {
            Ok(events) => events,
            Err(poisoned) => poisoned.into_inner(),
        };
        events.push(event.clone());
    }
}
