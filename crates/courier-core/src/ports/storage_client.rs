//! StorageClient port - object storage への書き込み
//!
//! forwarder はこの trait 越しにしか storage に触れません。
//! wire protocol・認証・client 内部の retry は実装側の責務です。
//!
//! # 実装
//! - **InMemoryStorageClient**: テスト用（fault injection 付き）
//! - **LocalDirStorageClient**: 開発用（`s3://bucket/path` をディレクトリに写す）

use async_trait::async_trait;
use bytes::Bytes;

use crate::domain::{Destination, StorageError};

/// StorageClient は 1 object を書き込む
///
/// # 設計原則
/// - 1 回の put = 1 block。成功か失敗かを呼び出しごとに返す
/// - 同一 key への put は上書き
/// - 1 invocation の中で複数の block から同時に呼ばれる（`Send + Sync` 必須）
#[async_trait]
pub trait StorageClient: Send + Sync {
    /// `key` は destination の path からの相対 key（`Destination::object_path` で結合する）
    async fn put(&self, destination: &Destination, key: &str, payload: Bytes) -> Result<(), StorageError>;
}
