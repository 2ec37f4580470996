//! InMemoryStorageClient - テスト・開発用の storage client
//!
//! # 学習ポイント
//! - `tokio::sync::Mutex` による async からの排他制御
//! - 呼び出し回数をキーにした fault injection

use async_trait::async_trait;
use bytes::Bytes;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio::sync::Mutex;

use crate::domain::{Destination, StorageError};
use crate::ports::StorageClient;

/// InMemoryStorageClient は (bucket, object path) → bytes を保持する
///
/// # Fault injection
/// `fail_on_call(n, err)` で n 回目（1 始まり）の put を失敗させられます。
/// 失敗した put は何も保存しません。
///
/// # 使用例
/// ```ignore
/// let client = InMemoryStorageClient::new();
/// client.fail_on_call(2, StorageError::transient("503")).await;
/// ```
#[derive(Clone, Default)]
pub struct InMemoryStorageClient {
    objects: Arc<Mutex<BTreeMap<(String, String), Bytes>>>,
    faults: Arc<Mutex<HashMap<usize, StorageError>>>,
    calls: Arc<AtomicUsize>,
    latency: Option<Duration>,
}

impl InMemoryStorageClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// 各 put の前に sleep する（並行書き込みの観察用）
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// `call`（1 始まり）回目の put を `error` で失敗させる
    pub async fn fail_on_call(&self, call: usize, error: StorageError) {
        self.faults.lock().await.insert(call, error);
    }

    /// これまでに受けた put の回数（失敗を含む）
    pub fn put_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub async fn get(&self, bucket: &str, path: &str) -> Option<Bytes> {
        self.objects
            .lock()
            .await
            .get(&(bucket.to_string(), path.to_string()))
            .cloned()
    }

    /// 保存済みの object path（bucket ごと、辞書順）
    pub async fn paths(&self, bucket: &str) -> Vec<String> {
        self.objects
            .lock()
            .await
            .keys()
            .filter(|(b, _)| b == bucket)
            .map(|(_, p)| p.clone())
            .collect()
    }

    pub async fn len(&self) -> usize {
        self.objects.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.objects.lock().await.is_empty()
    }
}

#[async_trait]
impl StorageClient for InMemoryStorageClient {
    async fn put(&self, destination: &Destination, key: &str, payload: Bytes) -> Result<(), StorageError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;

        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }

        if let Some(error) = self.faults.lock().await.remove(&call) {
            return Err(error);
        }

        let path = destination.object_path(key);
        self.objects
            .lock()
            .await
            .insert((destination.bucket().to_string(), path), payload);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dest() -> Destination {
        Destination::parse("s3://bucket/prefix").unwrap()
    }

    #[tokio::test]
    async fn put_then_get() {
        let client = InMemoryStorageClient::new();
        client.put(&dest(), "a", Bytes::from_static(b"hello")).await.unwrap();

        assert_eq!(client.get("bucket", "prefix/a").await, Some(Bytes::from_static(b"hello")));
        assert_eq!(client.put_count(), 1);
        assert_eq!(client.paths("bucket").await, vec!["prefix/a".to_string()]);
    }

    #[tokio::test]
    async fn put_overwrites_same_key() {
        let client = InMemoryStorageClient::new();
        client.put(&dest(), "a", Bytes::from_static(b"1")).await.unwrap();
        client.put(&dest(), "a", Bytes::from_static(b"2")).await.unwrap();

        assert_eq!(client.len().await, 1);
        assert_eq!(client.get("bucket", "prefix/a").await, Some(Bytes::from_static(b"2")));
    }

    #[tokio::test]
    async fn injected_fault_fires_once() {
        let client = InMemoryStorageClient::new();
        client.fail_on_call(1, StorageError::transient("503")).await;

        let err = client.put(&dest(), "a", Bytes::from_static(b"x")).await.unwrap_err();
        assert_eq!(err.message(), "503");
        assert!(client.is_empty().await);

        client.put(&dest(), "a", Bytes::from_static(b"x")).await.unwrap();
        assert_eq!(client.put_count(), 2);
        assert_eq!(client.len().await, 1);
    }
}
