//! Events - forwarding 中に発生するドメインイベント
//!
//! EventSink に渡されます。挙動には影響せず、観測のためだけに使います。

use super::errors::StorageError;
use super::ids::BatchId;
use super::key::StorageKey;
use super::report::ForwardStatus;

/// ForwardEvent は 1 回の forwarding 呼び出しの中で起きたこと
#[derive(Debug, Clone, PartialEq)]
pub enum ForwardEvent {
    /// messages を block に詰め終わった
    BatchSerialized {
        batch_id: BatchId,
        messages: usize,
        blocks: usize,
        bytes: u64,
    },

    /// size limit を超える message を単独 block にした（Isolate policy）
    OversizeIsolated {
        batch_id: BatchId,
        block: usize,
        message: usize,
        bytes: u64,
        size_limit: u64,
    },

    BlockWritten {
        batch_id: BatchId,
        block: usize,
        key: StorageKey,
        bytes: u64,
    },

    BlockFailed {
        batch_id: BatchId,
        block: usize,
        key: StorageKey,
        error: StorageError,
    },

    /// 致命的なエラーで残りの書き込みを中止した
    WritesAborted {
        batch_id: BatchId,
        block: usize,
        error: StorageError,
        not_attempted: usize,
    },

    /// cancellation を観測した
    Cancelled {
        batch_id: BatchId,
        not_attempted: usize,
    },

    BatchCompleted {
        batch_id: BatchId,
        status: ForwardStatus,
        written: usize,
        failed: usize,
        not_attempted: usize,
    },
}

impl ForwardEvent {
    pub fn batch_id(&self) -> BatchId {
        match self {
            ForwardEvent::BatchSerialized { batch_id, .. }
            | ForwardEvent::OversizeIsolated { batch_id, .. }
            | ForwardEvent::BlockWritten { batch_id, .. }
            | ForwardEvent::BlockFailed { batch_id, .. }
            | ForwardEvent::WritesAborted { batch_id, .. }
            | ForwardEvent::Cancelled { batch_id, .. }
            | ForwardEvent::BatchCompleted { batch_id, .. } => *batch_id,
        }
    }
}
