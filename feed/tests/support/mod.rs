use async_trait::async_trait;
use bytes::Bytes;
use imageboard_feed::{Client, ClientId, PersistenceStore, Watcher, WatcherId};
use imageboard_protocol::ThreadSnapshot;
use imageboard_std::errors::StoreError;
use std::collections::HashMap;
use std::sync::Mutex;

/// Installs a test-scoped `env_logger` so `log::{error,info}` calls in
/// `imageboard-feed`'s actor loop surface in `cargo test -- --nocapture`
/// output. Safe to call from every test; only the first call in a
/// process wins, the rest are no-ops.
pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// An in-memory [`PersistenceStore`] double. Threads are seeded via
/// [`InMemoryStore::seed`] before a test subscribes to them.
#[derive(Default)]
pub struct InMemoryStore {
    threads: Mutex<HashMap<u64, ThreadSnapshot>>,
}

impl InMemoryStore {
    pub fn seed(&self, snapshot: ThreadSnapshot) {
        self.threads
            .lock()
            .unwrap()
            .insert(snapshot.thread_id, snapshot);
    }
}

#[async_trait]
impl PersistenceStore for InMemoryStore {
    async fn get_thread(&self, thread_id: u64) -> Result<ThreadSnapshot, StoreError> {
        self.threads
            .lock()
            .unwrap()
            .get(&thread_id)
            .cloned()
            .ok_or(StoreError::NotFound(thread_id))
    }
}

/// An in-memory [`Client`] double that records every frame it receives,
/// in order, for assertions.
pub struct TestClient {
    id: ClientId,
    ip: String,
    received: Mutex<Vec<Bytes>>,
}

impl TestClient {
    pub fn new(id: u64, ip: impl Into<String>) -> Self {
        Self {
            id: ClientId(id),
            ip: ip.into(),
            received: Mutex::new(Vec::new()),
        }
    }

    pub fn received(&self) -> Vec<Bytes> {
        self.received.lock().unwrap().clone()
    }
}

#[async_trait]
impl Client for TestClient {
    fn id(&self) -> ClientId {
        self.id
    }

    fn ip(&self) -> &str {
        &self.ip
    }

    async fn send(&self, bytes: Bytes) {
        self.received.lock().unwrap().push(bytes);
    }
}

/// An in-memory [`Watcher`] double, mirroring [`TestClient`].
pub struct TestWatcher {
    id: WatcherId,
    received: Mutex<Vec<Bytes>>,
}

impl TestWatcher {
    pub fn new(id: u64) -> Self {
        Self {
            id: WatcherId(id),
            received: Mutex::new(Vec::new()),
        }
    }

    pub fn received(&self) -> Vec<Bytes> {
        self.received.lock().unwrap().clone()
    }
}

#[async_trait]
impl Watcher for TestWatcher {
    fn id(&self) -> WatcherId {
        self.id
    }

    async fn send(&self, bytes: Bytes) {
        self.received.lock().unwrap().push(bytes);
    }
}
