pub mod frame;
pub mod model;

pub use frame::{decode, decode_closed_post_summary, encode, encode_closed_post_summary, Frame};
pub use model::{ClosedPostSummary, Command, Image, Link, Post, ThreadSnapshot};
