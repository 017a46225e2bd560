use async_trait::async_trait;
use bytes::Bytes;

/// Opaque identity for an attached [`Client`], used only to find the
/// right entry on detach.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ClientId(pub u64);

/// Transport-side handle for a directly-attached subscriber of a
/// thread. The Feed never performs socket I/O itself; everything it
/// knows about a client is this capability set.
///
/// `send` must be safe to call concurrently and must never block the
/// Feed loop — a real transport implementation buffers internally or
/// drops-and-disconnects a client that can't keep up, rather than
/// letting a slow sink stall the whole Feed.
#[async_trait]
pub trait Client: Send + Sync {
    fn id(&self) -> ClientId;
    fn ip(&self) -> &str;
    async fn send(&self, bytes: Bytes);
}
