//! Result type for [`BucketClient::get_object`](super::BucketClient::get_object).

use std::fmt;

use bytes::Bytes;
use futures::TryStreamExt;
use futures::stream::BoxStream;
use object_store::ObjectMeta;

use crate::types::Error;

/// Headers and body of a retrieved object.
///
/// The body is streamed; nothing is buffered until the caller reads it.
pub struct GetOutput {
    /// MIME content-type, if the backend provides one.
    pub content_type: Option<String>,
    /// Content-encoding (e.g. `gzip`), if the backend provides one.
    pub content_encoding: Option<String>,
    /// Object metadata (size, etag, last_modified, location).
    pub meta: ObjectMeta,
    /// Raw byte stream of the object body.
    pub body: BoxStream<'static, Result<Bytes, Error>>,
}

impl GetOutput {
    /// Size of the object in bytes.
    pub fn size(&self) -> u64 {
        self.meta.size
    }

    /// Drains the body into a single buffer.
    pub async fn bytes(self) -> Result<Bytes, Error> {
        let chunks: Vec<Bytes> = self.body.try_collect().await?;
        Ok(match chunks.len() {
            1 => chunks.into_iter().next().unwrap_or_default(),
            _ => Bytes::from(chunks.concat()),
        })
    }
}

impl fmt::Debug for GetOutput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GetOutput")
            .field("content_type", &self.content_type)
            .field("content_encoding", &self.content_encoding)
            .field("meta", &self.meta)
            .finish_non_exhaustive()
    }
}
