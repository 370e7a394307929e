//! `LocalPublisher` (`spec.md §1`): the consumer's local event bus, an
//! external collaborator. An in-memory recorder stands in for tests.

use async_trait::async_trait;
use tokio::sync::Mutex;

use fed_ore::FederatorError;
use fed_types::Record;

#[async_trait]
pub trait LocalPublisher: Send + Sync {
    async fn publish(&self, record: &Record) -> Result<(), FederatorError>;
}

#[derive(Default)]
pub struct RecordingPublisher {
    published: Mutex<Vec<Record>>,
}

impl RecordingPublisher {
    pub async fn published(&self) -> Vec<Record> {
        self.published.lock().await.clone()
    }
}

#[async_trait]
impl LocalPublisher for RecordingPublisher {
    async fn publish(&self, record: &Record) -> Result<(), FederatorError> {
        self.published.lock().await.push(record.clone());
        Ok(())
    }
}
