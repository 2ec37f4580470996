//! PayloadBlock - 1 object として書き込む単位と framing

use bytes::Bytes;
use serde::{Deserialize, Serialize};

/// Framing は block 内での message の並べ方
///
/// size limit と比較するのは framing 込みのサイズ（payload + 終端文字）。
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Framing {
    /// 区切りなしで payload を連結
    Raw,

    /// 各 payload の後に `\n`
    #[default]
    NewlineDelimited,
}

impl Framing {
    pub fn terminator(&self) -> &'static [u8] {
        match self {
            Framing::Raw => b"",
            Framing::NewlineDelimited => b"\n",
        }
    }

    /// framing 後の 1 message のサイズ
    pub fn framed_len(&self, payload_len: usize) -> u64 {
        (payload_len + self.terminator().len()) as u64
    }
}

/// 単体で size limit を超える message の扱い
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OversizePolicy {
    /// serialize を失敗させる（何も書き込まない）
    #[default]
    Reject,

    /// その message だけの block を作り、oversize フラグを立てる
    Isolate,
}

/// PayloadBlock は size limit 以下に詰めた message 列（1 object になる）
///
/// `oversize` でない限り `bytes.len() <= size_limit`。
/// `oversize` が立つのは [`OversizePolicy::Isolate`] のときだけ。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PayloadBlock {
    /// batch 内での位置（0 始まり）
    pub index: usize,

    /// この block に入っている最初の message の index（入力 slice 上）
    pub first_message: usize,

    pub message_count: usize,

    pub bytes: Bytes,

    pub oversize: bool,
}

impl PayloadBlock {
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// この block が運ぶ message の index 範囲
    pub fn message_range(&self) -> std::ops::Range<usize> {
        self.first_message..self.first_message + self.message_count
    }
}
