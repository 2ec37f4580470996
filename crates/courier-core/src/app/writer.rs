//! Writer - block を storage client 経由で書き込み、結果を集約する
//!
//! # フロー
//! 1. 上限 `max_concurrency` まで put を in-flight にする（block 順に開始）
//! 2. 完了した put の結果を block ごとに記録する（失敗しても他の block は続ける）
//! 3. cancellation を観測したら、新しい put は開始しない
//! 4. 致命的なエラー（宛先が使えない）を受けたら、新しい put は開始しない
//!    （未開始の block が残っていなくても report は Aborted になる）
//! 5. 開始しなかった block は NotAttempted として report に載せる
//!
//! in-flight の put は cancellation・中止のどちらでも最後まで待ち、その実際の結果を記録します。
//! retry はしません（storage client 側の責務）。

use futures::StreamExt;
use futures::stream::FuturesUnordered;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use crate::domain::{
    BatchId, BlockOutcome, BlockStatus, Destination, ForwardEvent, ForwardReport, NotAttemptedReason,
    PayloadBlock, StorageError, StorageKey,
};
use crate::ports::{EventSink, StorageClient};

#[derive(Clone)]
pub struct Writer {
    storage_client: Arc<dyn StorageClient>,
    event_sink: Arc<dyn EventSink>,
    max_concurrency: usize,
}

impl Writer {
    pub fn new(
        storage_client: Arc<dyn StorageClient>,
        event_sink: Arc<dyn EventSink>,
        max_concurrency: usize,
    ) -> Self {
        Self {
            storage_client,
            event_sink,
            max_concurrency: max_concurrency.max(1),
        }
    }

    /// block と key の組を書き込み、block ごとの結果をまとめた report を返す
    pub async fn write(
        &self,
        batch_id: BatchId,
        entries: &[(PayloadBlock, StorageKey)],
        destination: &Destination,
        cancel: &CancellationToken,
    ) -> ForwardReport {
        let client: &dyn StorageClient = self.storage_client.as_ref();
        let mut statuses: Vec<Option<BlockStatus>> = vec![None; entries.len()];
        let mut pending = entries.iter().enumerate();
        let mut in_flight = FuturesUnordered::new();
        let mut halted: Option<NotAttemptedReason> = None;
        let mut fatal: Option<(usize, StorageError)> = None;

        loop {
            // 未開始の block が残っているときだけ cancellation を halt として扱う
            while halted.is_none() && in_flight.len() < self.max_concurrency && pending.len() > 0 {
                if cancel.is_cancelled() {
                    halted = Some(NotAttemptedReason::Cancelled);
                    break;
                }
                let Some((index, (block, key))) = pending.next() else {
                    break;
                };
                let payload = block.bytes.clone();
                in_flight.push(async move {
                    let result = client.put(destination, key.as_str(), payload).await;
                    (index, result)
                });
            }

            let Some((index, result)) = in_flight.next().await else {
                break;
            };

            let (block, key) = &entries[index];
            match result {
                Ok(()) => {
                    self.event_sink.emit(&ForwardEvent::BlockWritten {
                        batch_id,
                        block: index,
                        key: key.clone(),
                        bytes: block.len() as u64,
                    });
                    statuses[index] = Some(BlockStatus::Written);
                }
                Err(error) => {
                    if error.is_fatal() && fatal.is_none() {
                        halted = Some(NotAttemptedReason::Aborted);
                        fatal = Some((index, error.clone()));
                    }
                    self.event_sink.emit(&ForwardEvent::BlockFailed {
                        batch_id,
                        block: index,
                        key: key.clone(),
                        error: error.clone(),
                    });
                    statuses[index] = Some(BlockStatus::Failed(error));
                }
            }
        }

        let not_attempted = statuses.iter().filter(|s| s.is_none()).count();
        match (&fatal, halted) {
            (Some((block, error)), _) => self.event_sink.emit(&ForwardEvent::WritesAborted {
                batch_id,
                block: *block,
                error: error.clone(),
                not_attempted,
            }),
            (None, Some(NotAttemptedReason::Cancelled)) => self.event_sink.emit(&ForwardEvent::Cancelled {
                batch_id,
                not_attempted,
            }),
            _ => {}
        }

        let reason = halted.unwrap_or(NotAttemptedReason::Cancelled);
        let outcomes = entries
            .iter()
            .zip(statuses)
            .map(|((block, key), status)| BlockOutcome {
                index: block.index,
                key: key.clone(),
                bytes: block.len() as u64,
                message_count: block.message_count,
                oversize: block.oversize,
                status: status.unwrap_or(BlockStatus::NotAttempted(reason)),
            })
            .collect();
        let report = ForwardReport::new(batch_id, outcomes, fatal.is_some());

        self.event_sink.emit(&ForwardEvent::BatchCompleted {
            batch_id,
            status: report.status,
            written: report.written().count(),
            failed: report.failed().count(),
            not_attempted: report.not_attempted().count(),
        });
        report
    }
}
