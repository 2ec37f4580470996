//! App - アプリケーション層
//!
//! ports を組み合わせて forwarding パイプラインを実装します。
//!
//! # 主要コンポーネント
//! - **ForwarderConfig**: 設定と検証（すべての失敗をまとめて返す）
//! - **Serializer**: messages → size limit 以下の block
//! - **Writer**: block の書き込みと結果の集約
//! - **Forwarder / ForwarderBuilder**: 上記のワイヤリング

pub mod config;
pub mod serializer;
pub mod writer;
pub mod forwarder;
pub mod builder;

// 主要な型を再エクスポート
pub use self::config::{
    ConfigError, ConfigErrorKind, ForwarderConfig, ValidationErrors, DEFAULT_MAX_CONCURRENCY, DEFAULT_SIZE_LIMIT,
};
pub use self::serializer::{OversizeMessage, SerializeError, Serializer};
pub use self::writer::Writer;
pub use self::forwarder::{ForwardError, Forwarder};
pub use self::builder::ForwarderBuilder;
