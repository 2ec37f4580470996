//! SequentialKeyGenerator - `<prefix><batch_id>/<block_index:020>`
//!
//! - batch_id は ULID なので batch をまたいで時刻順にソートされる
//! - block_index は 20 桁ゼロ埋め（`u64::MAX` の桁数）なので、
//!   どの index でも batch 内では辞書順 = message 順になる
//! - 同じ (prefix, index, batch_id) なら同じ key → batch_id を再利用すれば idempotent retry

use crate::domain::{KeyContext, StorageKey};
use crate::ports::KeyGenerator;

/// block index のゼロ埋め桁数
pub const BLOCK_INDEX_WIDTH: usize = 20;

#[derive(Debug, Clone, Copy, Default)]
pub struct SequentialKeyGenerator;

impl KeyGenerator for SequentialKeyGenerator {
    fn next_key(&self, prefix: &str, block_index: usize, context: &KeyContext) -> StorageKey {
        StorageKey::new(format!(
            "{prefix}{}/{block_index:0width$}",
            context.batch_id,
            width = BLOCK_INDEX_WIDTH
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::BatchId;
    use std::collections::HashSet;
    use ulid::Ulid;

    fn ctx() -> KeyContext {
        KeyContext {
            batch_id: BatchId::from_ulid(Ulid::new()),
        }
    }

    #[test]
    fn key_starts_with_prefix() {
        let context = ctx();
        let key = SequentialKeyGenerator.next_key("logs/", 7, &context);
        assert_eq!(key.as_str(), format!("logs/{}/00000000000000000007", context.batch_id));
    }

    #[test]
    fn keys_are_unique_and_ordered_within_batch() {
        let context = ctx();
        let keys: Vec<_> = (0..1500)
            .map(|i| SequentialKeyGenerator.next_key("p", i, &context))
            .collect();

        let unique: HashSet<_> = keys.iter().collect();
        assert_eq!(unique.len(), keys.len());

        let mut sorted = keys.clone();
        sorted.sort();
        assert_eq!(sorted, keys);
    }

    #[test]
    fn index_order_holds_past_a_million_blocks() {
        let context = ctx();
        let a = SequentialKeyGenerator.next_key("p/", 999_999, &context);
        let b = SequentialKeyGenerator.next_key("p/", 1_000_000, &context);
        let c = SequentialKeyGenerator.next_key("p/", usize::MAX, &context);
        assert!(a < b);
        assert!(b < c);
        assert_eq!(c.as_str().rsplit('/').next().map(str::len), Some(BLOCK_INDEX_WIDTH));
    }

    #[test]
    fn same_inputs_same_key() {
        let context = ctx();
        assert_eq!(
            SequentialKeyGenerator.next_key("p", 3, &context),
            SequentialKeyGenerator.next_key("p", 3, &context)
        );
    }

    #[test]
    fn later_batches_sort_after_earlier_ones() {
        let first = ctx();
        std::thread::sleep(std::time::Duration::from_millis(2));
        let second = ctx();

        let a = SequentialKeyGenerator.next_key("p/", 999, &first);
        let b = SequentialKeyGenerator.next_key("p/", 0, &second);
        assert!(a < b);
    }
}
