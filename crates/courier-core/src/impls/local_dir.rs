//! LocalDirStorageClient - `s3://bucket/path` をローカルディレクトリに写す
//!
//! 開発・CLI 用です。`root/<bucket>/<path>/<key>` に書き込みます。

use async_trait::async_trait;
use bytes::Bytes;
use std::path::{Component, Path, PathBuf};
use tokio::fs;
use tracing::{debug, instrument};

use crate::domain::{Destination, StorageError};
use crate::ports::StorageClient;

/// ローカルファイルシステムを使う [`StorageClient`]
///
/// 親ディレクトリは `put` 時に作成します。root 自体は存在している必要があり、
/// root が無い場合は致命的なエラー（DestinationUnavailable）を返します。
#[derive(Debug, Clone)]
pub struct LocalDirStorageClient {
    root: PathBuf,
}

impl LocalDirStorageClient {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// object のファイルパス。root の外に出る path は拒否する。
    pub fn object_file(&self, destination: &Destination, key: &str) -> Result<PathBuf, StorageError> {
        let relative = PathBuf::from(destination.bucket()).join(destination.object_path(key));
        let escapes = relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_)));
        if escapes {
            return Err(StorageError::rejected(format!(
                "object path {} is not a plain relative path",
                relative.display()
            )));
        }
        Ok(self.root.join(relative))
    }
}

#[async_trait]
impl StorageClient for LocalDirStorageClient {
    #[instrument(skip(self, payload), fields(destination = %destination, key = %key, size = payload.len()))]
    async fn put(&self, destination: &Destination, key: &str, payload: Bytes) -> Result<(), StorageError> {
        match fs::metadata(&self.root).await {
            Ok(meta) if meta.is_dir() => {}
            Ok(_) => {
                return Err(StorageError::destination_unavailable(format!(
                    "{} is not a directory",
                    self.root.display()
                )));
            }
            Err(e) => {
                return Err(StorageError::destination_unavailable(format!(
                    "root {} is not accessible",
                    self.root.display()
                ))
                .with_source(e));
            }
        }

        let path = self.object_file(destination, key)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await.map_err(|e| {
                StorageError::transient(format!("failed to create {}", parent.display())).with_source(e)
            })?;
        }
        fs::write(&path, &payload)
            .await
            .map_err(|e| StorageError::transient(format!("failed to write {}", path.display())).with_source(e))?;

        debug!(path = %path.display(), "object written");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::StorageErrorKind;

    #[tokio::test]
    async fn writes_under_bucket_and_path() {
        let dir = tempfile::tempdir().unwrap();
        let client = LocalDirStorageClient::new(dir.path());
        let dest = Destination::parse("s3://bucket/prefix").unwrap();

        client.put(&dest, "logs/0", Bytes::from_static(b"hi\n")).await.unwrap();

        let written = std::fs::read(dir.path().join("bucket/prefix/logs/0")).unwrap();
        assert_eq!(written, b"hi\n");
    }

    #[tokio::test]
    async fn missing_root_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let client = LocalDirStorageClient::new(dir.path().join("nope"));
        let dest = Destination::parse("s3://bucket").unwrap();

        let err = client.put(&dest, "k", Bytes::new()).await.unwrap_err();
        assert_eq!(err.kind(), StorageErrorKind::DestinationUnavailable);
        assert!(err.is_fatal());
    }

    #[tokio::test]
    async fn parent_dir_keys_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let client = LocalDirStorageClient::new(dir.path());
        let dest = Destination::parse("s3://bucket").unwrap();

        let err = client.put(&dest, "../escape", Bytes::new()).await.unwrap_err();
        assert_eq!(err.kind(), StorageErrorKind::Rejected);
    }
}
