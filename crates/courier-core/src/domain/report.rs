//! Report - 1 回の forwarding 呼び出しの結果
//!
//! 成功・部分成功・失敗はこの report だけで判断します。
//! storage エラーは forwarder の `Err` にはならず、block ごとにここへ記録されるので、
//! 1 つの block の失敗が他の block の結果を隠すことはありません。

use serde::Serialize;

use super::errors::StorageError;
use super::ids::BatchId;
use super::key::StorageKey;

/// block を書き込まなかった理由
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NotAttemptedReason {
    /// この block を開始する前に caller が cancel した
    Cancelled,

    /// 先行する書き込みが致命的なエラーを受けた
    Aborted,
}

/// 1 block の結果
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", content = "detail", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BlockStatus {
    Written,
    Failed(StorageError),
    NotAttempted(NotAttemptedReason),
}

/// report の 1 エントリ
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BlockOutcome {
    pub index: usize,
    pub key: StorageKey,
    pub bytes: u64,
    pub message_count: usize,

    /// size limit を超える message 単体の block なら true
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub oversize: bool,

    #[serde(flatten)]
    pub status: BlockStatus,
}

impl BlockOutcome {
    pub fn is_written(&self) -> bool {
        matches!(self.status, BlockStatus::Written)
    }

    pub fn error(&self) -> Option<&StorageError> {
        match &self.status {
            BlockStatus::Failed(e) => Some(e),
            _ => None,
        }
    }
}

/// 呼び出し全体の分類
///
/// - `COMPLETE`: 全 block を書き込んだ（空の batch も含む）
/// - `PARTIAL`: 一部は書き込み、一部は失敗（中止はなし）
/// - `FAILED`: 1 つも書き込めず、試した block はすべて失敗
/// - `ABORTED`: 致命的なエラーを受けた（未開始の block が残ったかどうかに関係なく）
/// - `CANCELLED`: 全 block を開始する前に caller が cancel した
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ForwardStatus {
    Complete,
    Partial,
    Failed,
    Aborted,
    Cancelled,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ForwardReport {
    pub batch_id: BatchId,
    pub status: ForwardStatus,

    /// 書き込みの完了順にかかわらず block index 順
    pub outcomes: Vec<BlockOutcome>,
}

impl ForwardReport {
    /// outcomes から status を決めて report を作る
    ///
    /// `aborted` は致命的なエラーを返した書き込みがあったときに writer が立てる。
    /// abort は cancel より優先する。
    pub fn new(batch_id: BatchId, mut outcomes: Vec<BlockOutcome>, aborted: bool) -> Self {
        outcomes.sort_by_key(|o| o.index);
        let status = Self::classify(&outcomes, aborted);
        Self {
            batch_id,
            status,
            outcomes,
        }
    }

    fn classify(outcomes: &[BlockOutcome], aborted: bool) -> ForwardStatus {
        let reason = |r: NotAttemptedReason| {
            outcomes
                .iter()
                .any(|o| o.status == BlockStatus::NotAttempted(r))
        };
        if aborted || reason(NotAttemptedReason::Aborted) {
            return ForwardStatus::Aborted;
        }
        if reason(NotAttemptedReason::Cancelled) {
            return ForwardStatus::Cancelled;
        }

        let written = outcomes.iter().filter(|o| o.is_written()).count();
        if written == outcomes.len() {
            ForwardStatus::Complete
        } else if written == 0 {
            ForwardStatus::Failed
        } else {
            ForwardStatus::Partial
        }
    }

    pub fn is_complete(&self) -> bool {
        self.status == ForwardStatus::Complete
    }

    pub fn written(&self) -> impl Iterator<Item = &BlockOutcome> {
        self.outcomes.iter().filter(|o| o.is_written())
    }

    pub fn failed(&self) -> impl Iterator<Item = &BlockOutcome> {
        self.outcomes
            .iter()
            .filter(|o| matches!(o.status, BlockStatus::Failed(_)))
    }

    pub fn not_attempted(&self) -> impl Iterator<Item = &BlockOutcome> {
        self.outcomes
            .iter()
            .filter(|o| matches!(o.status, BlockStatus::NotAttempted(_)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use ulid::Ulid;

    fn outcome(index: usize, status: BlockStatus) -> BlockOutcome {
        BlockOutcome {
            index,
            key: StorageKey::new(format!("k/{index}")),
            bytes: 10,
            message_count: 1,
            oversize: false,
            status,
        }
    }

    fn written() -> BlockStatus {
        BlockStatus::Written
    }

    fn failed() -> BlockStatus {
        BlockStatus::Failed(StorageError::transient("boom"))
    }

    fn fatal() -> BlockStatus {
        BlockStatus::Failed(StorageError::destination_unavailable("NoSuchBucket"))
    }

    fn skipped(reason: NotAttemptedReason) -> BlockStatus {
        BlockStatus::NotAttempted(reason)
    }

    #[rstest]
    #[case(vec![], ForwardStatus::Complete)]
    #[case(vec![written(), written()], ForwardStatus::Complete)]
    #[case(vec![written(), failed()], ForwardStatus::Partial)]
    #[case(vec![failed(), failed()], ForwardStatus::Failed)]
    #[case(vec![written(), failed(), skipped(NotAttemptedReason::Aborted)], ForwardStatus::Aborted)]
    #[case(vec![written(), skipped(NotAttemptedReason::Cancelled)], ForwardStatus::Cancelled)]
    #[case(
        vec![skipped(NotAttemptedReason::Cancelled), skipped(NotAttemptedReason::Aborted)],
        ForwardStatus::Aborted
    )]
    fn status_is_derived_from_outcomes(#[case] statuses: Vec<BlockStatus>, #[case] expected: ForwardStatus) {
        let outcomes = statuses
            .into_iter()
            .enumerate()
            .map(|(i, s)| outcome(i, s))
            .collect();
        let report = ForwardReport::new(BatchId::from_ulid(Ulid::new()), outcomes, false);
        assert_eq!(report.status, expected);
    }

    #[rstest]
    #[case(vec![fatal()])]
    #[case(vec![written(), fatal(), written()])]
    #[case(vec![fatal(), skipped(NotAttemptedReason::Cancelled)])]
    fn fatal_error_is_aborted_even_without_skipped_blocks(#[case] statuses: Vec<BlockStatus>) {
        let outcomes = statuses
            .into_iter()
            .enumerate()
            .map(|(i, s)| outcome(i, s))
            .collect();
        let report = ForwardReport::new(BatchId::from_ulid(Ulid::new()), outcomes, true);
        assert_eq!(report.status, ForwardStatus::Aborted);
    }

    #[test]
    fn outcomes_are_sorted_by_index() {
        let report = ForwardReport::new(
            BatchId::from_ulid(Ulid::new()),
            vec![outcome(2, written()), outcome(0, written()), outcome(1, failed())],
            false,
        );
        let indices: Vec<_> = report.outcomes.iter().map(|o| o.index).collect();
        assert_eq!(indices, vec![0, 1, 2]);
        assert_eq!(report.written().count(), 2);
        assert_eq!(report.failed().count(), 1);
        assert_eq!(report.not_attempted().count(), 0);
    }

    #[test]
    fn report_serializes_status_names() {
        let report = ForwardReport::new(
            BatchId::from_ulid(Ulid::new()),
            vec![outcome(0, written()), outcome(1, failed())],
            false,
        );
        let v = serde_json::to_value(&report).unwrap();
        assert_eq!(v["status"], "PARTIAL");
        assert_eq!(v["outcomes"][0]["status"], "WRITTEN");
        assert_eq!(v["outcomes"][1]["status"], "FAILED");
        assert_eq!(v["outcomes"][1]["detail"]["kind"], "transient");
        assert_eq!(v["outcomes"][1]["key"], "k/1");
    }
}
