//! Message - forwarder に渡される入力の単位
//!
//! forwarder は message を読むだけで、変更も ack もしません（ack は caller の責務）。

use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// payload に付随する任意の metadata
///
/// storage には書き込まない（診断用）。
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub arrived_at: Option<DateTime<Utc>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
}

/// Message は forwarder から見て不透明な入力データ
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub payload: Bytes,
    pub metadata: MessageMetadata,
}

impl Message {
    pub fn new(payload: impl Into<Bytes>) -> Self {
        Self {
            payload: payload.into(),
            metadata: MessageMetadata::default(),
        }
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.metadata.source = Some(source.into());
        self
    }

    pub fn with_arrived_at(mut self, arrived_at: DateTime<Utc>) -> Self {
        self.metadata.arrived_at = Some(arrived_at);
        self
    }

    pub fn len(&self) -> usize {
        self.payload.len()
    }

    pub fn is_empty(&self) -> bool {
        self.payload.is_empty()
    }
}

impl From<&'static str> for Message {
    fn from(s: &'static str) -> Self {
        Self::new(Bytes::from_static(s.as_bytes()))
    }
}

impl From<Vec<u8>> for Message {
    fn from(v: Vec<u8>) -> Self {
        Self::new(v)
    }
}

impl From<String> for Message {
    fn from(s: String) -> Self {
        Self::new(s.into_bytes())
    }
}
