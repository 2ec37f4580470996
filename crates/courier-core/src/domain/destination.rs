//! Destination - 書き込み先の object storage の場所
//!
//! `s3://bucket/optional/path` の形式だけを受け付けます。
//! 他の scheme は設定エラーであって、実行時の retry 対象ではありません。

use percent_encoding::percent_decode_str;
use serde::Serialize;
use std::fmt;
use url::Url;

/// 受け付ける唯一の scheme
pub const DESTINATION_SCHEME: &str = "s3";

/// destination URI を受け付けなかった理由
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DestinationError {
    #[error("{0:?}")]
    Empty(String),

    #[error("{0}")]
    Unparsable(#[from] url::ParseError),

    #[error("scheme must be \"s3\"")]
    UnsupportedScheme(String),

    #[error("missing bucket in {0:?}")]
    MissingBucket(String),

    #[error("path of {0:?} is not valid UTF-8")]
    NonUtf8Path(String),
}

/// Destination は検証済みの書き込み先
///
/// - `bucket`: URI の host 部分（空は不可）
/// - `path`: percent-decode して先頭・末尾の `/` を除いた path（空でもよい）
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Destination {
    #[serde(serialize_with = "serialize_url")]
    uri: Url,
    bucket: String,
    path: String,
}

fn serialize_url<S: serde::Serializer>(url: &Url, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_str(url.as_str())
}

impl Destination {
    /// URI を parse して Destination を作る
    pub fn parse(raw: &str) -> Result<Self, DestinationError> {
        if raw.is_empty() {
            return Err(DestinationError::Empty(raw.to_string()));
        }

        let uri = Url::parse(raw)?;
        if uri.scheme() != DESTINATION_SCHEME {
            return Err(DestinationError::UnsupportedScheme(uri.scheme().to_string()));
        }

        let bucket = match uri.host_str() {
            Some(host) if !host.is_empty() => host.to_string(),
            _ => return Err(DestinationError::MissingBucket(raw.to_string())),
        };
        // Url は path を percent-encode して保持するので、key に使う前に戻す
        let path = percent_decode_str(uri.path())
            .decode_utf8()
            .map_err(|_| DestinationError::NonUtf8Path(raw.to_string()))?
            .trim_matches('/')
            .to_string();

        Ok(Self { uri, bucket, path })
    }

    pub fn uri(&self) -> &Url {
        &self.uri
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    /// URI の path prefix（`/` なし）。空の場合は bucket 直下。
    pub fn path(&self) -> &str {
        &self.path
    }

    /// bucket 内での object path を組み立てる
    ///
    /// `s3://bucket/a/b` + `k` → `a/b/k`、`s3://bucket` + `k` → `k`
    pub fn object_path(&self, key: &str) -> String {
        if self.path.is_empty() {
            key.to_string()
        } else {
            format!("{}/{}", self.path, key)
        }
    }
}

impl fmt::Display for Destination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.uri.as_str())
    }
}
