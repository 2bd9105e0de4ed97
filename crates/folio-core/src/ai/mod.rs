//! Chat backend seam and the HTTP streaming client

pub mod decoder;
pub mod remote;

pub use decoder::Utf8Decoder;
pub use remote::RemoteChatClient;

use futures_util::future::BoxFuture;
use futures_util::stream::BoxStream;

use crate::error::Result;

/// Raw body chunks in arrival order
pub type ChunkStream = BoxStream<'static, Result<Vec<u8>>>;

/// Something that turns a user message into a streamed reply
pub trait ChatBackend: Send + Sync {
    /// Send `message` and resolve once the reply body starts streaming.
    ///
    /// A non-success status must resolve to an error rather than a stream.
    fn open(&self, message: &str) -> BoxFuture<'static, Result<ChunkStream>>;
}
