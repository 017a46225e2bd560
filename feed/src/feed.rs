use crate::buffer::MessageBuffer;
use crate::cache::ThreadCache;
use crate::client::{Client, ClientId};
use crate::config::EngineConfig;
use crate::store::PersistenceStore;
use crate::ticker::Ticker;
use crate::watcher::{Watcher, WatcherId};
use bytes::Bytes;
use imageboard_protocol::frame::{encode, encode_closed_post_summary};
use imageboard_protocol::{ClosedPostSummary, Command, Frame, Image, Link, Post};
use imageboard_std::errors::FeedError;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::mpsc;

/// Large enough to absorb a burst of producer events without forcing
/// every `send` to await a free slot, small enough that a genuinely
/// stuck Feed still applies backpressure rather than buffering
/// unboundedly.
const FEED_CHANNEL_CAPACITY: usize = 100;

/// The four simple post-targeted mutations that carry no payload beyond
/// the post id.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PostMessageKind {
    SpoilerImage,
    Ban,
    DeletePost,
    DeleteImage,
}

enum FeedCommand {
    Attach(Arc<dyn Client>),
    Detach(ClientId),
    AttachWatcher(Arc<dyn Watcher>),
    DetachWatcher(WatcherId),
    Send(Bytes),
    InsertPost {
        post: Post,
        frame: Option<Bytes>,
    },
    ClosePost {
        id: u64,
        links: Vec<Link>,
        commands: Vec<Command>,
        frame: Bytes,
    },
    SetOpenBody {
        id: u64,
        body: String,
        frame: Bytes,
    },
    InsertImage {
        id: u64,
        image: Image,
        frame: Bytes,
    },
    PostMessage {
        kind: PostMessageKind,
        id: u64,
        frame: Bytes,
    },
}

/// A cheaply-cloneable sender half of a running [Feed]. All producer
/// calls are async and resolve once the command is accepted onto the
/// Feed's channel — under saturation that means briefly awaiting a free
/// slot, never a silent drop. A closed channel (the Feed has just
/// terminated) surfaces as [`FeedError::Gone`].
#[derive(Clone)]
pub struct FeedHandle {
    thread_id: u64,
    tx: mpsc::Sender<FeedCommand>,
}

impl FeedHandle {
    pub fn thread_id(&self) -> u64 {
        self.thread_id
    }

    async fn submit(&self, cmd: FeedCommand) -> Result<(), FeedError> {
        self.tx
            .send(cmd)
            .await
            .map_err(|_| FeedError::Gone(self.thread_id))
    }

    /// Adds `client`. The Feed sends it a sync frame directly (not via
    /// the next tick's batch) and recomputes the broadcast IP count.
    pub async fn attach(&self, client: Arc<dyn Client>) -> Result<(), FeedError> {
        self.submit(FeedCommand::Attach(client)).await
    }

    pub async fn detach(&self, id: ClientId) -> Result<(), FeedError> {
        self.submit(FeedCommand::Detach(id)).await
    }

    pub async fn attach_watcher(&self, watcher: Arc<dyn Watcher>) -> Result<(), FeedError> {
        self.submit(FeedCommand::AttachWatcher(watcher)).await
    }

    pub async fn detach_watcher(&self, id: WatcherId) -> Result<(), FeedError> {
        self.submit(FeedCommand::DetachWatcher(id)).await
    }

    pub async fn send(&self, frame: Bytes) -> Result<(), FeedError> {
        self.submit(FeedCommand::Send(frame)).await
    }

    /// `frame` is `None` when reclaiming an already-open post after a
    /// client reconnect — the cache still needs the post, but nothing
    /// new should be broadcast for it.
    pub async fn insert_post(&self, post: Post, frame: Option<Bytes>) -> Result<(), FeedError> {
        self.submit(FeedCommand::InsertPost { post, frame }).await
    }

    pub async fn close_post(
        &self,
        id: u64,
        links: Vec<Link>,
        commands: Vec<Command>,
        frame: Bytes,
    ) -> Result<(), FeedError> {
        self.submit(FeedCommand::ClosePost {
            id,
            links,
            commands,
            frame,
        })
        .await
    }

    pub async fn set_open_body(&self, id: u64, body: String, frame: Bytes) -> Result<(), FeedError> {
        self.submit(FeedCommand::SetOpenBody { id, body, frame }).await
    }

    pub async fn insert_image(&self, id: u64, image: Image, frame: Bytes) -> Result<(), FeedError> {
        self.submit(FeedCommand::InsertImage { id, image, frame }).await
    }

    pub async fn post_message(
        &self,
        kind: PostMessageKind,
        id: u64,
        frame: Bytes,
    ) -> Result<(), FeedError> {
        self.submit(FeedCommand::PostMessage { kind, id, frame }).await
    }
}

/// The single-writer actor owning one thread's live state. Only ever
/// constructed through [`Feed::spawn`], which loads the initial
/// snapshot and starts the loop task; callers interact with the
/// returned [`FeedHandle`].
pub struct Feed {
    thread_id: u64,
    cache: ThreadCache,
    buffer: MessageBuffer,
    ticker: Ticker,
    max_batch_bytes: Option<usize>,
    clients: HashMap<ClientId, Arc<dyn Client>>,
    watchers: HashMap<WatcherId, Arc<dyn Watcher>>,
    rx: mpsc::Receiver<FeedCommand>,
}

impl Feed {
    /// Loads `thread_id`'s snapshot from `store` and spawns the Feed's
    /// loop task. `generation` is sent back over `terminated` once the
    /// loop returns, so a registry can tell an entry it just created
    /// apart from the one it is currently tearing down.
    pub async fn spawn(
        thread_id: u64,
        generation: u64,
        store: Arc<dyn PersistenceStore>,
        config: &EngineConfig,
        terminated: mpsc::UnboundedSender<(u64, u64)>,
    ) -> Result<FeedHandle, FeedError> {
        let snapshot = store
            .get_thread(thread_id)
            .await
            .map_err(|e| FeedError::LoadThread(thread_id, e))?;

        let (tx, rx) = mpsc::channel(FEED_CHANNEL_CAPACITY);

        let feed = Feed {
            thread_id,
            cache: ThreadCache::new(snapshot),
            buffer: MessageBuffer::new(),
            ticker: Ticker::new(config.tick_interval),
            max_batch_bytes: config.max_batch_bytes,
            clients: HashMap::new(),
            watchers: HashMap::new(),
            rx,
        };

        tokio::spawn(async move {
            feed.run().await;
            let _ = terminated.send((thread_id, generation));
        });

        Ok(FeedHandle { thread_id, tx })
    }

    async fn run(mut self) {
        loop {
            tokio::select! {
                cmd = self.rx.recv() => {
                    match cmd {
                        Some(cmd) => {
                            if self.apply(cmd).await {
                                return;
                            }
                        }
                        None => return,
                    }
                }
                _ = self.ticker.tick(), if !self.ticker.is_paused() => {
                    // The configured soft cap bounds one tick's write: a
                    // batch that exceeds it is split on frame boundaries
                    // across consecutive ticks rather than held back or
                    // sliced mid-frame. The ticker only pauses once the
                    // buffer is fully drained.
                    match self.buffer.flush_capped(self.max_batch_bytes) {
                        Some(bytes) => {
                            for client in self.clients.values() {
                                client.send(bytes.clone()).await;
                            }
                            if self.buffer.is_empty() {
                                self.ticker.pause();
                            }
                        }
                        None => self.ticker.pause(),
                    }
                }
            }
        }
    }

    /// Resumes the ticker, then appends `frame` to the buffer. Every
    /// event that produces broadcast output goes through this so the
    /// ticker never stays paused past the event that should wake it.
    fn buffer_message(&mut self, frame: Bytes) {
        self.ticker.start();
        self.buffer.write(frame);
    }

    async fn send_ip_count(&mut self) {
        let ips: std::collections::HashSet<&str> =
            self.clients.values().map(|c| c.ip()).collect();

        match encode(&Frame::SyncCount(ips.len() as u32)) {
            Ok(bytes) => self.buffer_message(bytes),
            Err(e) => log::error!("failed to encode IP count frame for thread {}: {e}", self.thread_id),
        }
    }

    /// Applies one command to the cache/buffer/membership state.
    /// Returns `true` when the Feed should terminate (its client set
    /// just became empty).
    async fn apply(&mut self, cmd: FeedCommand) -> bool {
        match cmd {
            FeedCommand::Attach(client) => {
                self.clients.insert(client.id(), client.clone());

                match encode(&self.cache.gen_sync_message()) {
                    Ok(bytes) => client.send(bytes).await,
                    Err(e) => log::error!(
                        "failed to encode sync frame for thread {}: {e}",
                        self.thread_id
                    ),
                }

                self.send_ip_count().await;
                false
            }
            FeedCommand::Detach(id) => {
                self.clients.remove(&id);
                if self.clients.is_empty() {
                    true
                } else {
                    self.send_ip_count().await;
                    false
                }
            }
            FeedCommand::AttachWatcher(watcher) => {
                self.watchers.insert(watcher.id(), watcher);
                false
            }
            FeedCommand::DetachWatcher(id) => {
                self.watchers.remove(&id);
                false
            }
            FeedCommand::Send(frame) => {
                self.buffer_message(frame);
                false
            }
            FeedCommand::InsertPost { post, frame } => {
                self.cache.insert_post(post);
                // `frame` is `None` when reclaiming an already-open post
                // (see `FeedHandle::insert_post`); nothing should be
                // broadcast, so the ticker must not be woken for it.
                if let Some(frame) = frame {
                    self.buffer_message(frame);
                }
                false
            }
            FeedCommand::ClosePost {
                id,
                links,
                commands,
                frame,
            } => {
                self.notify_watchers_of_close(id, links, commands).await;
                self.buffer_message(frame);
                false
            }
            FeedCommand::SetOpenBody { id, body, frame } => {
                self.cache.set_body(id, body);
                self.buffer_message(frame);
                false
            }
            FeedCommand::InsertImage { id, image, frame } => {
                self.cache.insert_image(id, image);
                self.buffer_message(frame);
                false
            }
            FeedCommand::PostMessage { kind, id, frame } => {
                match kind {
                    PostMessageKind::SpoilerImage => self.cache.spoiler(id),
                    PostMessageKind::Ban => self.cache.ban(id),
                    PostMessageKind::DeletePost => self.cache.delete(id),
                    PostMessageKind::DeleteImage => self.cache.delete_image(id),
                }
                self.buffer_message(frame);
                false
            }
        }
    }

    /// Closes the post in the cache, then — if any watchers are
    /// attached — projects a reduced [`ClosedPostSummary`] and delivers
    /// it synchronously, before the next tick's batch. Encode failures
    /// are logged and otherwise ignored; the main broadcast always
    /// still happens via the caller's buffered `frame`.
    async fn notify_watchers_of_close(&mut self, id: u64, links: Vec<Link>, commands: Vec<Command>) {
        if self.watchers.is_empty() {
            self.cache.close_post(id, links, commands);
            return;
        }

        let summary_links = links.clone();
        let summary_commands = commands.clone();
        self.cache.close_post(id, links, commands);

        let Some(post) = self.cache.get_post(id) else {
            return;
        };
        let summary = ClosedPostSummary::from_post(post, summary_links, summary_commands);

        match encode_closed_post_summary(&summary) {
            Ok(bytes) => {
                for watcher in self.watchers.values() {
                    watcher.send(bytes.clone()).await;
                }
            }
            Err(e) => log::error!(
                "failed to encode closed-post summary for thread {}: {e}",
                self.thread_id
            ),
        }
    }
}
