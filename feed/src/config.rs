use std::time::Duration;

/// Process-wide engine configuration, fixed at startup and passed by
/// value into [`crate::registry::FeedRegistry::new`]. Loading this from
/// CLI flags or environment variables is the embedding server's job.
#[derive(Clone, Debug)]
pub struct EngineConfig {
    /// How often a Feed flushes its buffered frames to attached clients.
    pub tick_interval: Duration,
    /// TTL the persistence collaborator applies to image upload tokens.
    /// The engine itself never reads this value; it only carries it
    /// through so a single config struct can be threaded into both.
    pub image_token_ttl: Duration,
    /// Soft cap on a single flushed batch's size, in bytes.
    pub max_batch_bytes: Option<usize>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            tick_interval: Duration::from_millis(100),
            image_token_ttl: Duration::from_secs(60),
            max_batch_bytes: None,
        }
    }
}
