//! EventSink port - 診断イベントの記録
//!
//! logger は optional な capability です。EventSink がなくても forwarding の挙動は変わらず、
//! 観測できる情報が減るだけです。
//!
//! # 実装
//! - NoopEventSink: 何もしない（デフォルト）
//! - TracingEventSink: `tracing` に構造化ログとして流す
//! - MemoryEventSink: テスト用に記録する

use crate::domain::ForwardEvent;

/// EventSink はドメインイベントを受け取る
///
/// forwarding の途中で同期的に呼ばれるので、ブロックしないこと。
pub trait EventSink: Send + Sync {
    fn emit(&self, event: &ForwardEvent);
}
