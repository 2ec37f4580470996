//! Impls - ports の実装
//!
//! # 含まれる実装
//! - **InMemoryStorageClient**: テスト用の storage client（fault injection 付き）
//! - **LocalDirStorageClient**: 開発用、ローカルディレクトリへの書き込み
//! - **NoopEventSink / TracingEventSink / MemoryEventSink**: EventSink
//! - **SequentialKeyGenerator**: デフォルトの KeyGenerator
//!
//! S3 への実書き込みは `StorageClient` を実装する別クレートに置く想定です。

pub mod inmem_storage;
pub mod local_dir;
pub mod event_sinks;
pub mod sequential_keys;

pub use self::inmem_storage::InMemoryStorageClient;
pub use self::local_dir::LocalDirStorageClient;
pub use self::event_sinks::{MemoryEventSink, NoopEventSink, TracingEventSink};
pub use self::sequential_keys::SequentialKeyGenerator;
