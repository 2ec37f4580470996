//! Domain - ドメインモデル（ids, message, block, key, destination, report, errors, events）
//!
//! ここには I/O を持たない plain なデータ型だけを置きます。

pub mod ids;
pub mod message;
pub mod block;
pub mod key;
pub mod destination;
pub mod report;
pub mod errors;
pub mod events;

pub use ids::BatchId;
pub use message::{Message, MessageMetadata};
pub use block::{Framing, OversizePolicy, PayloadBlock};
pub use key::{KeyContext, StorageKey};
pub use destination::{Destination, DestinationError, DESTINATION_SCHEME};
pub use report::{BlockOutcome, BlockStatus, ForwardReport, ForwardStatus, NotAttemptedReason};
pub use errors::{StorageError, StorageErrorKind};
pub use events::ForwardEvent;
