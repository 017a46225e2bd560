use async_trait::async_trait;
use imageboard_protocol::ThreadSnapshot;
use imageboard_std::errors::StoreError;

/// The persistence collaborator a [`crate::registry::FeedRegistry`]
/// reads from exactly once per Feed, before that Feed's loop starts.
/// Per-mutation writers (inserting a post, closing it, recording a
/// moderation flag) are the producer's responsibility and happen
/// outside this trait entirely — they are called before the in-memory
/// event is submitted to the Feed, never by the Feed itself.
#[async_trait]
pub trait PersistenceStore: Send + Sync {
    async fn get_thread(&self, thread_id: u64) -> Result<ThreadSnapshot, StoreError>;
}
