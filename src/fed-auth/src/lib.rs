//! Identity-provider token acquisition and verification (`spec.md §4.2`).

pub mod claims;
pub mod client;
pub mod refresher;

pub use claims::{extract_client_id, Claims};
pub use client::{TokenClient, TokenClientConfig};
pub use refresher::spawn_refresher;
