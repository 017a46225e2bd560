use async_trait::async_trait;
use bytes::Bytes;

/// Opaque identity for an attached [`Watcher`], used only to find the
/// right entry on detach.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct WatcherId(pub u64);

/// A board-catalog subscriber interested only in closed-post summaries
/// of a thread, never the full mutation stream a [`crate::Client`]
/// receives. Deliver-and-forget: a watcher is free to drop a message or
/// itself at any time.
#[async_trait]
pub trait Watcher: Send + Sync {
    fn id(&self) -> WatcherId;
    async fn send(&self, bytes: Bytes);
}
