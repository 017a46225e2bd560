use crate::client::{Client, ClientId};
use crate::config::EngineConfig;
use crate::feed::{Feed, FeedHandle};
use crate::store::PersistenceStore;
use imageboard_std::errors::FeedError;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::{mpsc, Mutex};

struct RegistryEntry {
    handle: FeedHandle,
    /// Distinguishes the Feed this entry was created for from a Feed
    /// that has since terminated and been replaced — see the reaper
    /// loop below.
    generation: u64,
}

type Entries = Arc<Mutex<HashMap<u64, RegistryEntry>>>;

/// Process-wide mapping from thread id to its live [Feed]. `subscribe`
/// is the only entry point that creates Feeds. Creation is
/// double-checked rather than serialized under the map's mutex: the
/// lock is only ever held for a plain map read or write, never across
/// an `attach`, a persistence-store load, or a Feed spawn, so a slow
/// load for one thread-id can't stall `subscribe` calls for any other.
pub struct FeedRegistry {
    entries: Entries,
    store: Arc<dyn PersistenceStore>,
    config: EngineConfig,
    next_generation: AtomicU64,
    reaper_tx: mpsc::UnboundedSender<(u64, u64)>,
}

impl FeedRegistry {
    pub fn new(store: Arc<dyn PersistenceStore>, config: EngineConfig) -> Self {
        let entries: Entries = Arc::new(Mutex::new(HashMap::new()));
        let (reaper_tx, reaper_rx) = mpsc::unbounded_channel();

        tokio::spawn(reap(entries.clone(), reaper_rx));

        Self {
            entries,
            store,
            config,
            next_generation: AtomicU64::new(0),
            reaper_tx,
        }
    }

    /// Attaches `client` to thread `thread_id`'s Feed, lazily creating
    /// it from the persistence store on first subscription. Fails with
    /// `ErrLoadThread` if that initial load fails; no Feed is
    /// registered in that case.
    ///
    /// Genuinely double-checked: the map lock is released before any
    /// await (the existing-entry `attach` call, the persistence
    /// store's `get_thread`, the new Feed's spawn) and re-acquired only
    /// to read or write the map itself, so a slow load for one
    /// thread-id never blocks `subscribe`/`unsubscribe`/`get` calls for
    /// every other thread-id.
    pub async fn subscribe(
        &self,
        thread_id: u64,
        client: Arc<dyn Client>,
    ) -> Result<FeedHandle, FeedError> {
        loop {
            let existing = {
                let entries = self.entries.lock().await;
                entries
                    .get(&thread_id)
                    .map(|entry| (entry.handle.clone(), entry.generation))
            };

            if let Some((handle, generation)) = existing {
                match handle.attach(client.clone()).await {
                    Ok(()) => return Ok(handle),
                    Err(FeedError::Gone(_)) => {
                        // Lost a race with teardown: the reaper hasn't
                        // removed the stale entry yet. Clear it
                        // ourselves, but only if it's still the same
                        // stale entry — another task may already have
                        // replaced it with a fresh Feed.
                        let mut entries = self.entries.lock().await;
                        if let std::collections::hash_map::Entry::Occupied(occupied) =
                            entries.entry(thread_id)
                        {
                            if occupied.get().generation == generation {
                                occupied.remove();
                            }
                        }
                        continue;
                    }
                    Err(e) => return Err(e),
                }
            }

            // No entry yet: load the snapshot and spawn a Feed entirely
            // outside the lock.
            let generation = self.next_generation.fetch_add(1, Ordering::Relaxed);
            let handle = Feed::spawn(
                thread_id,
                generation,
                self.store.clone(),
                &self.config,
                self.reaper_tx.clone(),
            )
            .await?;

            // Re-check: another task may have won the race and already
            // inserted its own Feed for this thread-id while this one
            // was loading.
            let mut entries = self.entries.lock().await;
            if let Some(entry) = entries.get(&thread_id) {
                let winner = entry.handle.clone();
                drop(entries);

                // This Feed lost the race. `handle` is its only sender;
                // dropping it closes the channel, so the loser's loop
                // observes a closed channel and returns on its next
                // `select!` with nothing ever having attached to it.
                drop(handle);

                match winner.attach(client.clone()).await {
                    Ok(()) => return Ok(winner),
                    Err(FeedError::Gone(_)) => continue,
                    Err(e) => return Err(e),
                }
            }

            entries.insert(
                thread_id,
                RegistryEntry {
                    handle: handle.clone(),
                    generation,
                },
            );
            drop(entries);

            // A Feed is created with zero clients; this subscribe's
            // client must still be attached to actually receive
            // anything.
            handle.attach(client).await?;
            return Ok(handle);
        }
    }

    pub async fn unsubscribe(&self, thread_id: u64, client_id: ClientId) {
        let handle = {
            let entries = self.entries.lock().await;
            entries.get(&thread_id).map(|e| e.handle.clone())
        };

        if let Some(handle) = handle {
            // A `Gone` error here just means the Feed beat us to
            // terminating; nothing further to do.
            let _ = handle.detach(client_id).await;
        }
    }

    pub async fn get(&self, thread_id: u64) -> Option<FeedHandle> {
        self.entries
            .lock()
            .await
            .get(&thread_id)
            .map(|e| e.handle.clone())
    }
}

/// Drains terminated-Feed notifications and removes the matching
/// registry entry, but only if its generation still matches — a fresh
/// `subscribe` racing a teardown may already have inserted a new Feed
/// under the same thread id by the time this runs.
async fn reap(entries: Entries, mut rx: mpsc::UnboundedReceiver<(u64, u64)>) {
    while let Some((thread_id, generation)) = rx.recv().await {
        let mut entries = entries.lock().await;
        if let std::collections::hash_map::Entry::Occupied(entry) = entries.entry(thread_id) {
            if entry.get().generation == generation {
                entry.remove();
            }
        }
    }
}
