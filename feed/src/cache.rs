use imageboard_protocol::{Command, Frame, Image, Link, Post, ThreadSnapshot};

/// Owns the authoritative in-memory copy of one thread. Only ever
/// touched from its Feed's loop — see `feed.rs`.
///
/// Mutators mirror `feed.go`'s inline `f.cache.posts[id] = p` updates
/// but as dedicated methods, one per event kind the Feed accepts. Every
/// mutator is a silent no-op on an unknown post id: the cache is only
/// authoritative for posts it has already seen, and producers may
/// legitimately race with eviction or not-yet-loaded state.
pub struct ThreadCache {
    snapshot: ThreadSnapshot,
}

impl ThreadCache {
    pub fn new(snapshot: ThreadSnapshot) -> Self {
        Self { snapshot }
    }

    fn get_post_mut(&mut self, id: u64) -> Option<&mut Post> {
        if self.snapshot.op.id == id {
            Some(&mut self.snapshot.op)
        } else {
            self.snapshot.posts.iter_mut().find(|p| p.id == id)
        }
    }

    pub fn get_post(&self, id: u64) -> Option<&Post> {
        if self.snapshot.op.id == id {
            Some(&self.snapshot.op)
        } else {
            self.snapshot.posts.iter().find(|p| p.id == id)
        }
    }

    /// Produces a complete, self-consistent snapshot frame suitable for
    /// a newly-attached client. Must reflect every post and every
    /// monotonic flag currently true (spec invariant 2).
    pub fn gen_sync_message(&self) -> Frame {
        Frame::SyncSnapshot(self.snapshot.clone())
    }

    /// Inserts a new post, or overwrites an existing entry for the same
    /// id. `post_ctr` only advances for a genuinely new id, matching its
    /// "number of posts ever inserted" invariant.
    pub fn insert_post(&mut self, post: Post) {
        if post.id == self.snapshot.op.id {
            self.snapshot.op = post;
        } else if let Some(existing) = self.snapshot.posts.iter_mut().find(|p| p.id == post.id) {
            *existing = post;
        } else {
            self.snapshot.posts.push(post);
            self.snapshot.post_ctr += 1;
        }

        self.snapshot.log_ctr += 1;
    }

    pub fn close_post(&mut self, id: u64, links: Vec<Link>, commands: Vec<Command>) {
        if let Some(post) = self.get_post_mut(id) {
            post.editing = false;
            post.links = links;
            post.commands = commands;
            self.snapshot.log_ctr += 1;
        }
    }

    pub fn set_body(&mut self, id: u64, body: String) {
        if let Some(post) = self.get_post_mut(id) {
            post.body = body;
            self.snapshot.log_ctr += 1;
        }
    }

    pub fn insert_image(&mut self, id: u64, image: Image) {
        let ctr_bump = {
            let Some(post) = self.get_post_mut(id) else {
                return;
            };
            let was_unset = post.image.is_none();
            post.image = Some(image);
            was_unset
        };

        if ctr_bump {
            self.snapshot.image_ctr += 1;
        }
        self.snapshot.log_ctr += 1;
    }

    /// Monotonic: a post's image spoiler flag only ever flips to true.
    pub fn spoiler(&mut self, id: u64) {
        if let Some(post) = self.get_post_mut(id) {
            if let Some(image) = post.image.as_mut() {
                image.spoiler = true;
            }
            self.snapshot.log_ctr += 1;
        }
    }

    /// Monotonic: never reset to false by this cache.
    pub fn ban(&mut self, id: u64) {
        if let Some(post) = self.get_post_mut(id) {
            post.banned = true;
            self.snapshot.log_ctr += 1;
        }
    }

    /// Monotonic: never reset to false by this cache. Undeletion is not
    /// a supported transition.
    pub fn delete(&mut self, id: u64) {
        if let Some(post) = self.get_post_mut(id) {
            post.deleted = true;
            self.snapshot.log_ctr += 1;
        }
    }

    pub fn delete_image(&mut self, id: u64) {
        if let Some(post) = self.get_post_mut(id) {
            post.image = None;
            self.snapshot.log_ctr += 1;
        }
    }
}
