//! Request and response shapes for [`BucketClient::list_objects`](super::BucketClient::list_objects).

use serde::{Deserialize, Serialize};

/// Parameters of one listing call, mirroring S3 `ListObjectsV2`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListRequest {
    /// Bucket to list.
    pub bucket: String,
    /// Only keys starting with this string are returned.
    pub prefix: String,
    /// Keys whose remainder after `prefix` contains the delimiter are rolled
    /// up into a common prefix. An empty delimiter disables the roll-up.
    pub delimiter: String,
    /// Maximum number of entries (objects plus common prefixes) per page.
    pub max_keys: u32,
    /// Token returned by the previous truncated page.
    pub continuation_token: Option<String>,
}

impl ListRequest {
    /// Creates a request for the first page under `prefix`.
    pub fn new(bucket: impl Into<String>, prefix: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            prefix: prefix.into(),
            delimiter: "/".to_string(),
            max_keys: 1000,
            continuation_token: None,
        }
    }

    /// Sets the key delimiter.
    pub fn with_delimiter(mut self, delimiter: impl Into<String>) -> Self {
        self.delimiter = delimiter.into();
        self
    }

    /// Sets the page size.
    pub fn with_max_keys(mut self, max_keys: u32) -> Self {
        self.max_keys = max_keys;
        self
    }

    /// Continues a truncated listing.
    pub fn with_continuation_token(mut self, token: Option<String>) -> Self {
        self.continuation_token = token;
        self
    }
}

/// A single object entry of a listing page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListedObject {
    /// Full object key.
    pub key: String,
    /// Object size in bytes.
    pub size: u64,
}

/// One page of a listing.
///
/// As with S3, a collection with no entries is reported as absent rather
/// than empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListPage {
    /// Objects directly under the prefix.
    pub contents: Option<Vec<ListedObject>>,
    /// Rolled-up key prefixes, each ending with the delimiter.
    pub common_prefixes: Option<Vec<String>>,
    /// Whether more entries remain after this page.
    pub is_truncated: bool,
    /// Token for the next page; set only when truncated.
    pub next_continuation_token: Option<String>,
}
