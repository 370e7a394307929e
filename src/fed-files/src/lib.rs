//! Resumable file chunk streaming (`spec.md §4.7`, `§4.8`).

pub mod assembler;
pub mod storage;
pub mod streamer;

pub use assembler::FileAssembler;
pub use storage::{provider_for, LocalStorageProvider, StorageProvider};
pub use streamer::FileStreamer;
