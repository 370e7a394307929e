//! Producer-side stream dispatcher (`spec.md §4.5`): inbound auth
//! pipeline, attribute filter, and the `Federator` service implementation.

pub mod auth;
pub mod authorise;
pub mod dispatcher;
pub mod encoder;
pub mod filter;
pub mod source;

pub use auth::AuthInterceptor;
pub use authorise::AuthorisationInterceptor;
pub use dispatcher::{Dispatcher, DispatcherConfig};
pub use encoder::BatchEncoder;
pub use filter::AttributeFilter;
pub use source::{EventSource, FileSource, InMemoryFileSource, InMemorySource, ReadOutcome};
