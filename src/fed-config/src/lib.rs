//! Configuration cache (`spec.md §4.1`) and the explicit startup `Config`
//! value (`spec.md §9`).

pub mod cache;
pub mod settings;

pub use cache::{CacheKind, CacheStats, ConfigCache};
pub use settings::{
    ClientSettings, DispatcherSettings, FederatorConfig, FileSettings, FilterSettings,
    IdpSettings, JobSettings, ResilienceSettings, RetrySettings, StorageProviderKind,
};
