use thiserror::Error;

pub type Result<T, E = BoardError> = std::result::Result<T, E>;

#[derive(Error, Debug)]
pub enum ProtocolError {
    #[error("Unknown frame tag: {0}")]
    UnknownFrameTag(u8),

    #[error("Failed to serialize/deserialize frame payload.")]
    SerdeError(#[source] bincode::Error),
}

#[derive(Error, Debug)]
pub enum EncodeError {
    #[error("Failed to encode frame for message kind {0}.")]
    Failed(&'static str, #[source] ProtocolError),
}

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Thread {0} was not found in the persistence store.")]
    NotFound(u64),

    #[error("Persistence store failed to load thread {0}.")]
    LoadFailed(u64, #[source] anyhow::Error),
}

#[derive(Error, Debug)]
pub enum FeedError {
    #[error("Feed for thread {0} has already terminated.")]
    Gone(u64),

    #[error("Failed to load initial snapshot for thread {0}.")]
    LoadThread(u64, #[source] StoreError),
}

#[derive(Error, Debug)]
pub enum BoardError {
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    #[error(transparent)]
    Encode(#[from] EncodeError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Feed(#[from] FeedError),
}
