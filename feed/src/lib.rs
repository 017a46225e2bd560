pub mod buffer;
pub mod cache;
pub mod client;
pub mod config;
pub mod feed;
pub mod registry;
pub mod store;
pub mod ticker;
pub mod watcher;

pub use buffer::MessageBuffer;
pub use client::{Client, ClientId};
pub use config::EngineConfig;
pub use feed::{Feed, FeedHandle, PostMessageKind};
pub use registry::FeedRegistry;
pub use store::PersistenceStore;
pub use ticker::Ticker;
pub use watcher::{Watcher, WatcherId};
