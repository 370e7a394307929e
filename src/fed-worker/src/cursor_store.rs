//! `CursorStore` (`spec.md §1`, `§3`): the external key→integer map
//! tracking delivered positions. Out of scope to implement for real (it's
//! an external collaborator service); this is the seam plus an in-memory
//! adapter used by workers under test.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;

use fed_ore::FederatorError;
use fed_types::{Cursor, CursorKey};

#[async_trait]
pub trait CursorStore: Send + Sync {
    async fn load(&self, key: &CursorKey) -> Result<Cursor, FederatorError>;

    /// Persists `cursor`. Never called with a value behind the last
    /// persisted one for the same key (`spec.md §3` invariant); the worker
    /// enforces this, not the store.
    async fn store(&self, key: &CursorKey, cursor: Cursor) -> Result<(), FederatorError>;
}

#[derive(Default)]
pub struct InMemoryCursorStore {
    cursors: Mutex<HashMap<CursorKey, Cursor>>,
}

#[async_trait]
impl CursorStore for InMemoryCursorStore {
    async fn load(&self, key: &CursorKey) -> Result<Cursor, FederatorError> {
        Ok(self
            .cursors
            .lock()
            .unwrap()
            .get(key)
            .copied()
            .unwrap_or(Cursor::START))
    }

    async fn store(&self, key: &CursorKey, cursor: Cursor) -> Result<(), FederatorError> {
        self.cursors.lock().unwrap().insert(key.clone(), cursor);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fed_types::PeerId;

    #[tokio::test]
    async fn unset_cursor_loads_as_start() {
        let store = InMemoryCursorStore::default();
        let key = CursorKey {
            peer_id: PeerId::from("peer-a"),
            topic: "orders".into(),
        };
        assert_eq!(store.load(&key).await.unwrap(), Cursor::START);
    }

    #[tokio::test]
    async fn store_then_load_roundtrips() {
        let store = InMemoryCursorStore::default();
        let key = CursorKey {
            peer_id: PeerId::from("peer-a"),
            topic: "orders".into(),
        };
        store.store(&key, Cursor::new(42).unwrap()).await.unwrap();
        assert_eq!(store.load(&key).await.unwrap().offset(), 42);
    }
}
