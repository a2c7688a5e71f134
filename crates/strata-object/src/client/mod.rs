//! Bucket client backed by [`object_store::ObjectStore`].
//!
//! [`BucketClient`] is the seam the connector talks through. [`ObjectStoreClient`]
//! implements it over any `object_store` backend and emulates S3 `ListObjectsV2`
//! paging: entries come in key order, rolled up on the delimiter, and the
//! continuation token is the last key handed out. The token is passed to the
//! backend as a listing offset and each call reads at most one page past it.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use futures::TryStreamExt;
use object_store::path::Path;
use object_store::{Attribute, ObjectStore};

use crate::TRACING_TARGET;
use crate::types::Error;

mod get_output;
mod list_page;

pub use get_output::GetOutput;
pub use list_page::{ListPage, ListRequest, ListedObject};

/// The two store calls the connector issues.
///
/// Implementations perform exactly one round trip per call and never retry.
#[async_trait::async_trait]
pub trait BucketClient: fmt::Debug + Send + Sync + 'static {
    /// Fetches one page of keys.
    async fn list_objects(&self, request: &ListRequest) -> Result<ListPage, Error>;

    /// Opens the object stored at `key` in `bucket`.
    async fn get_object(&self, bucket: &str, key: &str) -> Result<GetOutput, Error>;
}

/// Cloneable handle to an [`ObjectStore`] backend bound to one bucket.
#[derive(Clone, Debug)]
pub struct ObjectStoreClient {
    store: Arc<dyn ObjectStore>,
    bucket: String,
}

enum Entry {
    Prefix,
    Object(u64),
}

impl ObjectStoreClient {
    /// Wrap a concrete [`ObjectStore`] implementation serving `bucket`.
    pub fn new(bucket: impl Into<String>, store: impl ObjectStore) -> Self {
        Self {
            store: Arc::new(store),
            bucket: bucket.into(),
        }
    }

    /// Name of the bucket this client serves.
    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    /// The underlying store.
    pub fn store(&self) -> &Arc<dyn ObjectStore> {
        &self.store
    }

    fn check_bucket(&self, bucket: &str) -> Result<(), Error> {
        if bucket == self.bucket {
            Ok(())
        } else {
            Err(Error::bucket_mismatch(bucket, &self.bucket))
        }
    }

    /// Collects the entries of one page under `prefix`, rolled up on
    /// `delimiter`, in key order.
    ///
    /// Listing resumes after `start_after` and stops once `limit` entries
    /// are gathered. Backends must list in key order, as S3 and `InMemory` do.
    async fn entries(
        &self,
        prefix: &str,
        delimiter: &str,
        start_after: Option<&str>,
        limit: usize,
    ) -> Result<BTreeMap<String, Entry>, Error> {
        // object_store lists whole path segments, so start from the last
        // complete segment of the prefix and filter the rest by string prefix.
        let base = prefix
            .rfind('/')
            .map(|pos| &prefix[..pos])
            .filter(|base| !base.is_empty())
            .map(Path::from);

        let mut metas = match start_after {
            Some(token) => self.store.list_with_offset(base.as_ref(), &Path::from(token)),
            None => self.store.list(base.as_ref()),
        };

        let mut entries = BTreeMap::new();
        while let Some(meta) = metas.try_next().await.map_err(from_object_store)? {
            let key = meta.location.as_ref();
            let Some(rest) = key.strip_prefix(prefix) else {
                continue;
            };

            let rolled_up = if delimiter.is_empty() {
                None
            } else {
                rest.find(delimiter)
            };
            let (entry_key, entry) = match rolled_up {
                Some(pos) => (&key[..prefix.len() + pos + delimiter.len()], Entry::Prefix),
                None => (key, Entry::Object(meta.size)),
            };

            // The offset path drops a trailing delimiter, so entries rolling
            // up into the token itself come back and are skipped here.
            if start_after.is_some_and(|token| entry_key <= token) {
                continue;
            }

            if !entries.contains_key(entry_key) {
                if entries.len() == limit {
                    break;
                }
                entries.insert(entry_key.to_string(), entry);
            }
        }

        Ok(entries)
    }
}

#[async_trait::async_trait]
impl BucketClient for ObjectStoreClient {
    #[tracing::instrument(
        name = "object.list_objects",
        skip(self, request),
        fields(prefix = %request.prefix, max_keys = request.max_keys)
    )]
    async fn list_objects(&self, request: &ListRequest) -> Result<ListPage, Error> {
        self.check_bucket(&request.bucket)?;
        let max_keys = request.max_keys.max(1) as usize;
        let entries = self
            .entries(
                &request.prefix,
                &request.delimiter,
                request.continuation_token.as_deref(),
                max_keys + 1,
            )
            .await?;
        let page = paginate(entries, max_keys);

        tracing::debug!(
            target: TRACING_TARGET,
            contents = page.contents.as_ref().map_or(0, Vec::len),
            common_prefixes = page.common_prefixes.as_ref().map_or(0, Vec::len),
            is_truncated = page.is_truncated,
            "Listed page"
        );

        Ok(page)
    }

    #[tracing::instrument(name = "object.get_object", skip(self), fields(bucket, key))]
    async fn get_object(&self, bucket: &str, key: &str) -> Result<GetOutput, Error> {
        self.check_bucket(bucket)?;
        let path = Path::from(key);
        let result = self.store.get(&path).await.map_err(from_object_store)?;

        let content_type = result
            .attributes
            .get(&Attribute::ContentType)
            .map(|v| v.to_string());
        let content_encoding = result
            .attributes
            .get(&Attribute::ContentEncoding)
            .map(|v| v.to_string());
        let meta = result.meta.clone();
        let body = Box::pin(result.into_stream().map_err(from_object_store));

        Ok(GetOutput {
            content_type,
            content_encoding,
            meta,
            body,
        })
    }
}

/// Cuts one page out of the sorted entries; one entry past `max_keys`
/// marks the page as truncated.
fn paginate(entries: BTreeMap<String, Entry>, max_keys: usize) -> ListPage {
    let is_truncated = entries.len() > max_keys;

    let mut contents = Vec::new();
    let mut common_prefixes = Vec::new();
    let mut last_key = None;
    for (key, entry) in entries.into_iter().take(max_keys) {
        match entry {
            Entry::Prefix => common_prefixes.push(key.clone()),
            Entry::Object(size) => contents.push(ListedObject {
                key: key.clone(),
                size,
            }),
        }
        last_key = Some(key);
    }

    ListPage {
        contents: (!contents.is_empty()).then_some(contents),
        common_prefixes: (!common_prefixes.is_empty()).then_some(common_prefixes),
        is_truncated,
        next_continuation_token: last_key.filter(|_| is_truncated),
    }
}

/// Convert an [`object_store::Error`] into a crate [`Error`].
fn from_object_store(err: object_store::Error) -> Error {
    let retryable = !matches!(
        err,
        object_store::Error::NotFound { .. }
            | object_store::Error::PermissionDenied { .. }
            | object_store::Error::Unauthenticated { .. }
            | object_store::Error::InvalidPath { .. }
            | object_store::Error::NotSupported { .. }
    );
    Error::request(err.to_string(), "object-store", retryable).with_source(err)
}
