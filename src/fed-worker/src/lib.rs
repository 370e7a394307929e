//! Consumer-side stream worker (`spec.md §4.6`).

pub mod client_worker;
pub mod cursor_store;
pub mod publisher;

pub use client_worker::{ClientWorker, WorkerOutcome};
pub use cursor_store::{CursorStore, InMemoryCursorStore};
pub use publisher::{LocalPublisher, RecordingPublisher};
