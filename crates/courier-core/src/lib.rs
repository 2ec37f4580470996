//! courier-core
//!
//! Bounded forwarding pipeline: messages を size limit 以下の object に詰めて、
//! 衝突しない key で object storage（`s3://`）に書き込みます。
//!
//! # モジュール構成
//! - **domain**: ドメインモデル（ids, message, block, key, destination, report, errors, events）
//! - **ports**: 抽象化レイヤー（StorageClient, EventSink, KeyGenerator, Clock, IdGenerator）
//! - **app**: アプリケーションロジック（config, serializer, writer, forwarder, builder）
//! - **impls**: 実装（InMemoryStorageClient, LocalDirStorageClient, TracingEventSink など）
//!
//! # 使用例
//! ```ignore
//! let forwarder = Forwarder::builder()
//!     .destination("s3://bucket/prefix")
//!     .key_prefix("logs/")
//!     .size_limit(16 * 1024 * 1024)
//!     .storage_client(client)
//!     .event_sink(TracingEventSink)
//!     .build()?;
//!
//! let report = forwarder.forward(&messages, &CancellationToken::new()).await?;
//! ```

pub mod domain;
pub mod ports;
pub mod app;
pub mod impls;

pub use app::{ForwardError, Forwarder, ForwarderBuilder, ForwarderConfig, ValidationErrors};
pub use domain::{ForwardReport, ForwardStatus, Message};

pub use tokio_util::sync::CancellationToken;
