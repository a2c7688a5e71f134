//! Scripted store clients for unit tests.

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use object_store::memory::InMemory;
use object_store::path::Path;
use object_store::{ObjectStore, PutPayload};
use strata_object::client::{
    BucketClient, GetOutput, ListPage, ListRequest, ListedObject, ObjectStoreClient,
};
use strata_object::types::Error;

pub(crate) const BUCKET: &str = "test-bucket";

/// Serves pre-built pages keyed by the continuation token of the request.
#[derive(Debug, Default)]
pub(crate) struct ScriptedClient {
    pages: HashMap<Option<String>, ListPage>,
    requests: Mutex<Vec<ListRequest>>,
}

impl ScriptedClient {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn with_page(mut self, token: Option<&str>, page: ListPage) -> Self {
        self.pages.insert(token.map(str::to_string), page);
        self
    }

    /// Splits `keys` (all non-empty objects) into pages of `page_size`
    /// chained by tokens `t1`, `t2`, ...
    pub(crate) fn paged_files(keys: &[&str], page_size: usize) -> Self {
        let chunks: Vec<_> = keys.chunks(page_size).collect();
        let mut client = Self::new();
        for (index, chunk) in chunks.iter().enumerate() {
            let token = (index > 0).then(|| format!("t{index}"));
            let next = (index + 1 < chunks.len()).then(|| format!("t{}", index + 1));
            let entries: Vec<_> = chunk.iter().map(|key| (*key, 1)).collect();
            client = client.with_page(token.as_deref(), file_page(&entries, next.as_deref()));
        }
        client
    }

    pub(crate) fn calls(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub(crate) fn requests(&self) -> Vec<ListRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl BucketClient for ScriptedClient {
    async fn list_objects(&self, request: &ListRequest) -> Result<ListPage, Error> {
        self.requests.lock().unwrap().push(request.clone());
        self.pages
            .get(&request.continuation_token)
            .cloned()
            .ok_or_else(|| Error::request("no page scripted for token", "scripted", true))
    }

    async fn get_object(&self, _bucket: &str, key: &str) -> Result<GetOutput, Error> {
        Err(Error::request(format!("get '{key}' not scripted"), "scripted", false))
    }
}

/// Delegates to an [`ObjectStoreClient`] and counts listing calls.
#[derive(Debug)]
pub(crate) struct CountingClient {
    inner: ObjectStoreClient,
    list_calls: AtomicUsize,
}

impl CountingClient {
    pub(crate) fn list_calls(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl BucketClient for CountingClient {
    async fn list_objects(&self, request: &ListRequest) -> Result<ListPage, Error> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        self.inner.list_objects(request).await
    }

    async fn get_object(&self, bucket: &str, key: &str) -> Result<GetOutput, Error> {
        self.inner.get_object(bucket, key).await
    }
}

/// An in-memory bucket holding `objects` as `(key, body)`.
pub(crate) async fn in_memory(objects: &[(&str, &str)]) -> CountingClient {
    let store = InMemory::new();
    for (key, body) in objects {
        store
            .put(&Path::from(*key), PutPayload::from(body.to_string()))
            .await
            .unwrap();
    }
    CountingClient {
        inner: ObjectStoreClient::new(BUCKET, store),
        list_calls: AtomicUsize::new(0),
    }
}

pub(crate) fn file_page(entries: &[(&str, u64)], next: Option<&str>) -> ListPage {
    ListPage {
        contents: Some(
            entries
                .iter()
                .map(|(key, size)| ListedObject {
                    key: key.to_string(),
                    size: *size,
                })
                .collect(),
        ),
        common_prefixes: None,
        is_truncated: next.is_some(),
        next_continuation_token: next.map(str::to_string),
    }
}

pub(crate) fn dir_page(prefixes: &[&str], next: Option<&str>) -> ListPage {
    ListPage {
        contents: None,
        common_prefixes: Some(prefixes.iter().map(|p| p.to_string()).collect()),
        is_truncated: next.is_some(),
        next_continuation_token: next.map(str::to_string),
    }
}

pub(crate) fn reader_options(value: serde_json::Value) -> crate::ReaderOptions {
    match value {
        serde_json::Value::Object(map) => map,
        other => panic!("not an object: {other}"),
    }
}
