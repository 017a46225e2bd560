use crate::model::{ClosedPostSummary, Command, Image, Link, Post, ThreadSnapshot};
use bytes::{Buf, BufMut, Bytes, BytesMut};
use imageboard_std::errors::ProtocolError;
use serde::{Deserialize, Serialize};

const SYNC_COUNT: u8 = 0x0;
const SYNC_SNAPSHOT: u8 = 0x1;
const INSERT_POST: u8 = 0x2;
const CLOSE_POST: u8 = 0x3;
const SET_BODY: u8 = 0x4;
const INSERT_IMAGE: u8 = 0x5;
const SPOILER_IMAGE: u8 = 0x6;
const DELETE_POST: u8 = 0x7;
const BAN_POST: u8 = 0x8;
const DELETE_IMAGE: u8 = 0x9;

/// The closed set of message kinds a Feed may emit, plus the internal
/// `SyncSnapshot` kind used only for a fresh client's first frame — it
/// is never broadcast into a tick's batch.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum Frame {
    SyncCount(u32),
    SyncSnapshot(ThreadSnapshot),
    InsertPost(Post),
    ClosePost {
        id: u64,
        links: Vec<Link>,
        commands: Vec<Command>,
    },
    SetBody {
        id: u64,
        body: String,
    },
    InsertImage {
        id: u64,
        image: Image,
    },
    SpoilerImage {
        id: u64,
    },
    DeletePost {
        id: u64,
    },
    BanPost {
        id: u64,
    },
    DeleteImage {
        id: u64,
    },
}

impl Frame {
    fn tag(&self) -> u8 {
        match self {
            Self::SyncCount(_) => SYNC_COUNT,
            Self::SyncSnapshot(_) => SYNC_SNAPSHOT,
            Self::InsertPost(_) => INSERT_POST,
            Self::ClosePost { .. } => CLOSE_POST,
            Self::SetBody { .. } => SET_BODY,
            Self::InsertImage { .. } => INSERT_IMAGE,
            Self::SpoilerImage { .. } => SPOILER_IMAGE,
            Self::DeletePost { .. } => DELETE_POST,
            Self::BanPost { .. } => BAN_POST,
            Self::DeleteImage { .. } => DELETE_IMAGE,
        }
    }
}

/// Encodes a [Frame] into a standalone, length-prefixed wire frame:
/// `[u32 LE length][u8 tag][bincode payload]`. `length` covers the tag
/// byte and the payload, so a reader only needs the frame's start to
/// know exactly where it ends — which is what lets a message buffer
/// concatenate frames into a batch that is itself a valid concatenation.
///
/// Pure and stateless. Producers typically call this once and hand the
/// resulting `Bytes` to a Feed alongside the structured event, so the
/// Feed's loop never re-encodes on its hot path.
pub fn encode(frame: &Frame) -> Result<Bytes, ProtocolError> {
    let payload = bincode::serialize(frame).map_err(ProtocolError::SerdeError)?;

    let mut buf = BytesMut::with_capacity(4 + 1 + payload.len());
    buf.put_u32_le((1 + payload.len()) as u32);
    buf.put_u8(frame.tag());
    buf.extend_from_slice(&payload);

    Ok(buf.freeze())
}

/// Decodes a single length-prefixed wire frame back into a [Frame],
/// consuming it from the front of `src`.
pub fn decode(src: &mut Bytes) -> Result<Frame, ProtocolError> {
    let length = src.get_u32_le() as usize;
    let mut body = src.split_to(length);
    let _tag = body.get_u8();
    bincode::deserialize(&body).map_err(ProtocolError::SerdeError)
}

/// Encodes the reduced closed-post projection delivered to a Watcher.
/// Not length-prefixed the way broadcast frames are — watchers receive
/// one projection per close, not a concatenated batch.
pub fn encode_closed_post_summary(summary: &ClosedPostSummary) -> Result<Bytes, ProtocolError> {
    bincode::serialize(summary)
        .map(Bytes::from)
        .map_err(ProtocolError::SerdeError)
}

pub fn decode_closed_post_summary(bytes: &[u8]) -> Result<ClosedPostSummary, ProtocolError> {
    bincode::deserialize(bytes).map_err(ProtocolError::SerdeError)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_each_frame_kind() {
        let frames = vec![
            Frame::SyncCount(3),
            Frame::ClosePost {
                id: 100,
                links: vec![(200, 42)],
                commands: vec![Command::Flip(true)],
            },
            Frame::SetBody {
                id: 100,
                body: "hi".into(),
            },
            Frame::SpoilerImage { id: 7 },
            Frame::DeletePost { id: 7 },
            Frame::BanPost { id: 7 },
            Frame::DeleteImage { id: 7 },
        ];

        for frame in frames {
            let mut encoded = encode(&frame).unwrap();
            let decoded = decode(&mut encoded).unwrap();
            assert_eq!(frame, decoded);
            assert!(encoded.is_empty(), "decode should consume the whole frame");
        }
    }

    #[test]
    fn batch_of_frames_decodes_in_order() {
        let f1 = Frame::SetBody {
            id: 1,
            body: "a".into(),
        };
        let f2 = Frame::SetBody {
            id: 1,
            body: "ab".into(),
        };

        let mut batch = BytesMut::new();
        batch.extend_from_slice(&encode(&f1).unwrap());
        batch.extend_from_slice(&encode(&f2).unwrap());
        let mut batch = batch.freeze();

        assert_eq!(decode(&mut batch).unwrap(), f1);
        assert_eq!(decode(&mut batch).unwrap(), f2);
        assert!(batch.is_empty());
    }
}
