//! Shared data model observed and mutated by the feed engine.
//!
//! These types mirror the JSON shape an imageboard thread exposes to
//! clients, expressed as plain, bincode-friendly Rust structs since this
//! crate only ever serializes them onto the engine's own wire frames.

use bytes::Bytes;
use serde::{Deserialize, Serialize};

/// A `(target post id, target post's OP id)` pair, used for both the
/// forward `links` a post declares and the `backlinks` it accumulates.
pub type Link = (u64, u64);

/// Hash-command variants a post may carry once closed. Set once at
/// close time; never edited afterwards.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum Command {
    Dice(Vec<u16>),
    Flip(bool),
    EightBall(String),
    SyncWatch(Bytes),
    Pyu(i64),
    Pcount(i64),
}

/// Immutable image identity plus the small per-post overlay
/// (`name`, `spoiler`) that can change after the image is attached.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Image {
    pub sha1: String,
    pub md5: String,
    pub file_type: String,
    pub thumb_type: String,
    pub dims: [u16; 4],
    pub size: u64,
    pub length: u32,
    pub title: String,
    pub artist: String,
    pub apng: bool,
    pub audio: bool,
    pub video: bool,
    /// Per-post overlay: the file name as uploaded with this post.
    pub name: String,
    /// Per-post overlay: monotonic true-latching spoiler flag.
    pub spoiler: bool,
}

/// A mutable post record, either the thread's OP or a reply.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Post {
    pub id: u64,
    pub time: i64,
    pub body: String,
    pub editing: bool,
    pub banned: bool,
    pub deleted: bool,
    pub name: Option<String>,
    pub trip: Option<String>,
    pub auth: Option<String>,
    pub links: Vec<Link>,
    pub backlinks: Vec<Link>,
    pub commands: Vec<Command>,
    pub image: Option<Image>,
}

impl Post {
    /// A freshly opened post: `editing` starts true, every monotonic
    /// flag starts false, no image or commands yet.
    pub fn open(id: u64, time: i64, body: impl Into<String>) -> Self {
        Self {
            id,
            time,
            body: body.into(),
            editing: true,
            banned: false,
            deleted: false,
            name: None,
            trip: None,
            auth: None,
            links: Vec::new(),
            backlinks: Vec::new(),
            commands: Vec::new(),
            image: None,
        }
    }
}

/// The reduced projection of a closed post delivered to catalog
/// [Watcher](crate::Watcher)s — never the full [Post], so body text and
/// image data never leak to board-catalog subscribers.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ClosedPostSummary {
    pub id: u64,
    pub links: Vec<Link>,
    pub commands: Vec<Command>,
    pub name: Option<String>,
    pub trip: Option<String>,
    pub auth: Option<String>,
}

impl ClosedPostSummary {
    pub fn from_post(post: &Post, links: Vec<Link>, commands: Vec<Command>) -> Self {
        Self {
            id: post.id,
            links,
            commands,
            name: post.name.clone(),
            trip: post.trip.clone(),
            auth: post.auth.clone(),
        }
    }
}

/// The authoritative in-memory snapshot of one thread, and the payload
/// embedded in a sync frame for newly-attached clients.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ThreadSnapshot {
    pub thread_id: u64,
    pub op: Post,
    /// Replies, in insertion order. The OP is *not* duplicated here.
    pub posts: Vec<Post>,
    pub subject: String,
    pub board: String,
    pub locked: bool,
    pub archived: bool,
    pub sticky: bool,
    pub post_ctr: u32,
    pub image_ctr: u32,
    pub reply_time: i64,
    pub bump_time: i64,
    pub log_ctr: u64,
}

impl ThreadSnapshot {
    pub fn new(thread_id: u64, op: Post, board: impl Into<String>) -> Self {
        Self {
            thread_id,
            op,
            posts: Vec::new(),
            subject: String::new(),
            board: board.into(),
            locked: false,
            archived: false,
            sticky: false,
            post_ctr: 1,
            image_ctr: 0,
            reply_time: 0,
            bump_time: 0,
            log_ctr: 0,
        }
    }
}
