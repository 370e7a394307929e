//! Task-spawn helpers that guarantee cleanup on drop, matching the
//! per-replica task pattern the corpus uses for isolated connection loops.

use std::future::Future;

use tokio::task::JoinHandle;

/// A [`JoinHandle`] that aborts its task when dropped, so a `StreamJob`'s
/// task is guaranteed to stop the moment the scheduler drops its handle
/// (`spec.md §4.4` delete step).
#[derive(Debug)]
pub struct AbortOnDropHandle<T>(JoinHandle<T>);

impl<T> Drop for AbortOnDropHandle<T> {
    fn drop(&mut self) {
        self.0.abort();
    }
}

impl<T> std::ops::Deref for AbortOnDropHandle<T> {
    type Target = JoinHandle<T>;
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

pub trait JoinHandleExt<T> {
    fn abort_on_drop(self) -> AbortOnDropHandle<T>;
}

impl<T> JoinHandleExt<T> for JoinHandle<T> {
    fn abort_on_drop(self) -> AbortOnDropHandle<T> {
        AbortOnDropHandle(self)
    }
}

/// Spawns `future` with a tracing-visible task name, matching
/// `mz_ore::task::spawn`'s signature of taking a name thunk rather than a
/// literal, so the name can be built from the job id.
pub fn spawn<Fut>(name: impl FnOnce() -> String, future: Fut) -> JoinHandle<Fut::Output>
where
    Fut: Future + Send + 'static,
    Fut::Output: Send + 'static,
{
    let name = name();
    tracing::debug!(task = %name, "spawning task");
    tokio::spawn(future)
}
