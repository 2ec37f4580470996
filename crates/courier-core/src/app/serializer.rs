//! Serializer - messages を size limit 以下の block に詰める
//!
//! # 方針
//! - message の順序は block 内でも block 間でも保つ
//! - 1 message を複数 block に分割しない
//! - 先頭から貪欲に詰める（順序を保つ分割の中では block 数が最小になる）
//! - I/O なし、純粋なメモリ上の変換

use bytes::BytesMut;
use std::ops::Range;

use crate::domain::{Framing, Message, OversizePolicy, PayloadBlock};

/// 単体で size limit を超える message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OversizeMessage {
    /// 入力 slice 内の index
    pub index: usize,

    /// framing 込みのバイト数
    pub size: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SerializeError {
    #[error("{} message(s) exceed the size limit of {size_limit} bytes", .messages.len())]
    OversizeMessages {
        size_limit: u64,
        messages: Vec<OversizeMessage>,
    },
}

/// Serializer は forwarder ごとに 1 つ、設定から作られる
#[derive(Debug, Clone, Copy)]
pub struct Serializer {
    size_limit: u64,
    framing: Framing,
    oversize_policy: OversizePolicy,
}

/// 詰め方の計画（1 block 分）
struct Plan {
    messages: Range<usize>,
    size: usize,
    oversize: bool,
}

impl Serializer {
    pub fn new(size_limit: u64) -> Self {
        Self {
            size_limit,
            framing: Framing::default(),
            oversize_policy: OversizePolicy::default(),
        }
    }

    pub fn with_framing(mut self, framing: Framing) -> Self {
        self.framing = framing;
        self
    }

    pub fn with_oversize_policy(mut self, oversize_policy: OversizePolicy) -> Self {
        self.oversize_policy = oversize_policy;
        self
    }

    pub fn size_limit(&self) -> u64 {
        self.size_limit
    }

    /// messages を block の列にする
    ///
    /// `OversizePolicy::Reject` の場合、limit を超える message が 1 つでもあれば
    /// それらをすべて列挙したエラーを返し、block は作らない。
    pub fn serialize(&self, messages: &[Message]) -> Result<Vec<PayloadBlock>, SerializeError> {
        if self.oversize_policy == OversizePolicy::Reject {
            let oversize: Vec<OversizeMessage> = messages
                .iter()
                .enumerate()
                .map(|(index, m)| OversizeMessage {
                    index,
                    size: self.framing.framed_len(m.len()),
                })
                .filter(|m| m.size > self.size_limit)
                .collect();
            if !oversize.is_empty() {
                return Err(SerializeError::OversizeMessages {
                    size_limit: self.size_limit,
                    messages: oversize,
                });
            }
        }

        Ok(self
            .plan(messages)
            .into_iter()
            .enumerate()
            .map(|(index, plan)| self.assemble(index, plan, messages))
            .collect())
    }

    fn plan(&self, messages: &[Message]) -> Vec<Plan> {
        let mut plans = Vec::new();
        let mut start = 0;
        let mut size: u64 = 0;

        for (i, message) in messages.iter().enumerate() {
            let framed = self.framing.framed_len(message.len());

            if framed > self.size_limit {
                // Isolate: 直前までを閉じて、この message だけの block を作る
                if i > start {
                    plans.push(Plan {
                        messages: start..i,
                        size: size as usize,
                        oversize: false,
                    });
                }
                plans.push(Plan {
                    messages: i..i + 1,
                    size: framed as usize,
                    oversize: true,
                });
                start = i + 1;
                size = 0;
                continue;
            }

            if i > start && size + framed > self.size_limit {
                plans.push(Plan {
                    messages: start..i,
                    size: size as usize,
                    oversize: false,
                });
                start = i;
                size = 0;
            }
            size += framed;
        }

        if messages.len() > start {
            plans.push(Plan {
                messages: start..messages.len(),
                size: size as usize,
                oversize: false,
            });
        }
        plans
    }

    fn assemble(&self, index: usize, plan: Plan, messages: &[Message]) -> PayloadBlock {
        let terminator = self.framing.terminator();
        let mut buf = BytesMut::with_capacity(plan.size);
        for message in &messages[plan.messages.clone()] {
            buf.extend_from_slice(&message.payload);
            buf.extend_from_slice(terminator);
        }

        PayloadBlock {
            index,
            first_message: plan.messages.start,
            message_count: plan.messages.len(),
            bytes: buf.freeze(),
            oversize: plan.oversize,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn msgs(payloads: &[&'static str]) -> Vec<Message> {
        payloads.iter().map(|p| Message::from(*p)).collect()
    }

    fn raw(limit: u64) -> Serializer {
        Serializer::new(limit).with_framing(Framing::Raw)
    }

    #[test]
    fn empty_input_yields_no_blocks() {
        assert!(raw(10).serialize(&[]).unwrap().is_empty());
    }

    #[test]
    fn small_messages_fit_in_one_block() {
        let blocks = Serializer::new(1024).serialize(&msgs(&["a", "bb", "ccc"])).unwrap();
        assert_eq!(blocks.len(), 1);
        assert_eq!(&blocks[0].bytes[..], b"a\nbb\nccc\n");
        assert_eq!(blocks[0].message_count, 3);
        assert!(!blocks[0].oversize);
    }

    #[test]
    fn terminator_counts_toward_limit() {
        // "abcd\n" は 5 bytes、2 つで 10 bytes
        let blocks = Serializer::new(9).serialize(&msgs(&["abcd", "efgh"])).unwrap();
        assert_eq!(blocks.len(), 2);
        assert_eq!(&blocks[0].bytes[..], b"abcd\n");
        assert_eq!(&blocks[1].bytes[..], b"efgh\n");

        let blocks = Serializer::new(10).serialize(&msgs(&["abcd", "efgh"])).unwrap();
        assert_eq!(blocks.len(), 1);
    }

    #[test]
    fn exact_fit_stays_in_block() {
        let blocks = raw(6).serialize(&msgs(&["abc", "def", "g"])).unwrap();
        assert_eq!(blocks.len(), 2);
        assert_eq!(blocks[0].message_range(), 0..2);
        assert_eq!(blocks[1].message_range(), 2..3);
        assert_eq!(blocks[1].index, 1);
    }

    #[test]
    fn reject_lists_every_oversize_message() {
        let err = raw(3)
            .serialize(&msgs(&["ok", "toolong", "ok", "waytoolong"]))
            .unwrap_err();
        let SerializeError::OversizeMessages { size_limit, messages } = err;
        assert_eq!(size_limit, 3);
        assert_eq!(
            messages,
            vec![
                OversizeMessage { index: 1, size: 7 },
                OversizeMessage { index: 3, size: 10 },
            ]
        );
    }

    #[test]
    fn isolate_puts_oversize_message_alone() {
        let blocks = raw(4)
            .with_oversize_policy(OversizePolicy::Isolate)
            .serialize(&msgs(&["a", "b", "toolong", "c"]))
            .unwrap();

        let shape: Vec<_> = blocks
            .iter()
            .map(|b| (b.message_range(), b.oversize))
            .collect();
        assert_eq!(shape, vec![(0..2, false), (2..3, true), (3..4, false)]);
        assert_eq!(&blocks[1].bytes[..], b"toolong");
    }

    #[test]
    fn isolate_at_start_and_end() {
        let blocks = raw(2)
            .with_oversize_policy(OversizePolicy::Isolate)
            .serialize(&msgs(&["xxx", "yyy"]))
            .unwrap();
        assert_eq!(blocks.len(), 2);
        assert!(blocks.iter().all(|b| b.oversize && b.message_count == 1));
    }

    fn payloads(max_len: usize) -> impl Strategy<Value = Vec<Vec<u8>>> {
        prop::collection::vec(prop::collection::vec(any::<u8>(), 0..=max_len), 0..40)
    }

    proptest! {
        #[test]
        fn total_within_limit_is_one_block(input in payloads(16)) {
            let total: usize = input.iter().map(Vec::len).sum();
            let limit = (total as u64).max(1);
            let messages: Vec<Message> = input.iter().cloned().map(Message::from).collect();

            let blocks = raw(limit).serialize(&messages).unwrap();
            if messages.is_empty() {
                prop_assert!(blocks.is_empty());
            } else {
                prop_assert_eq!(blocks.len(), 1);
                prop_assert_eq!(blocks[0].bytes.to_vec(), input.concat());
            }
        }

        #[test]
        fn blocks_respect_limit_and_preserve_order(input in payloads(16), limit in 17u64..64) {
            let messages: Vec<Message> = input.iter().cloned().map(Message::from).collect();
            let framing = Framing::NewlineDelimited;
            let blocks = Serializer::new(limit).with_framing(framing).serialize(&messages).unwrap();

            let mut next = 0;
            let mut joined = Vec::new();
            for (i, block) in blocks.iter().enumerate() {
                prop_assert_eq!(block.index, i);
                prop_assert!(block.len() as u64 <= limit);
                prop_assert!(block.message_count > 0);
                prop_assert_eq!(block.first_message, next);
                next += block.message_count;
                joined.extend_from_slice(&block.bytes);
            }
            prop_assert_eq!(next, messages.len());

            let expected: Vec<u8> = input.iter().flat_map(|p| p.iter().copied().chain([b'\n'])).collect();
            prop_assert_eq!(joined, expected);

            let total: u64 = messages.iter().map(|m| framing.framed_len(m.len())).sum();
            if total > limit {
                prop_assert!(blocks.len() >= 2);
            }
        }

        #[test]
        fn adjacent_blocks_could_not_be_merged(input in payloads(16), limit in 17u64..64) {
            // 貪欲に詰めているので、次の block の先頭 message は前の block に入らない
            let messages: Vec<Message> = input.iter().cloned().map(Message::from).collect();
            let blocks = Serializer::new(limit).serialize(&messages).unwrap();
            for pair in blocks.windows(2) {
                let head = &messages[pair[1].first_message];
                prop_assert!(pair[0].len() as u64 + Framing::NewlineDelimited.framed_len(head.len()) > limit);
            }
        }
    }
}
