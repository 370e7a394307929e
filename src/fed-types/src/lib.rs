//! Core data model shared by the producer and consumer processes.
//!
//! Every type here is an immutable value: snapshots own their children by
//! value, and children reference their parent only by id, never by pointer.
//! This avoids the cyclic producer/product/consumer graph that the policy
//! service's JSON representation suggests.

pub mod cursor;
pub mod file;
pub mod ids;
pub mod job;
pub mod policy;
pub mod record;
pub mod token;

pub use cursor::{Cursor, CursorKey};
pub use file::{total_chunks, Chunk, FileTransfer, SourceKind};
pub use ids::{JobId, PeerId, ProductId};
pub use job::{JobSpec, StreamJob};
pub use policy::{
    AttributeRequirement, ConfigKind, ConfigSnapshot, Consumer, Peer, Producer, Product,
    Subscription,
};
pub use record::Record;
pub use token::BearerToken;
