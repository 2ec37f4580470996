//! Ports - 抽象化レイヤー
//!
//! このモジュールは Hexagonal Architecture の「ポート」を定義します。
//! 各 trait は外部システム（object storage, logger, 時計など）への
//! インターフェースを提供し、実装の詳細を隠蔽します。

pub mod storage_client;
pub mod event_sink;
pub mod key_generator;
pub mod clock;
pub mod id_generator;

// 主要な trait を再エクスポート
pub use self::storage_client::StorageClient;
pub use self::event_sink::EventSink;
pub use self::key_generator::KeyGenerator;
pub use self::clock::{Clock, SystemClock, FixedClock};
pub use self::id_generator::{IdGenerator, UlidGenerator};
