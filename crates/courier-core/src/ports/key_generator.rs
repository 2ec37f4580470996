//! KeyGenerator port - block ごとの storage key を決める

use crate::domain::{KeyContext, StorageKey};

/// KeyGenerator は block に key を割り当てる
///
/// # 契約
/// - 同じ batch 内の block 同士で key が衝突しない
/// - 同じ入力 (prefix, block_index, context) なら同じ key（idempotent retry のため）
/// - 副作用なし
pub trait KeyGenerator: Send + Sync {
    fn next_key(&self, prefix: &str, block_index: usize, context: &KeyContext) -> StorageKey;
}
