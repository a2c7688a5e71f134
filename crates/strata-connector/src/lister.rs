//! Paged listing of an asset's keys.

use std::collections::VecDeque;
use std::sync::Arc;

use futures::StreamExt;
use futures::stream::{self, BoxStream};
use strata_object::client::{BucketClient, ListPage, ListRequest};

use crate::TRACING_TARGET;
use crate::config::AssetConfig;
use crate::cursor::ListingCursor;
use crate::error::{Error, Result};

/// Lazily listed keys of one asset.
pub type KeyStream<'a> = BoxStream<'a, Result<String>>;

/// Keys surviving one listing call, in store order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListedPage {
    /// Keys (file mode) or common prefixes (directory mode) that passed the
    /// size and regex filters.
    pub keys: Vec<String>,
    /// Whether the store has more entries after this page.
    pub is_truncated: bool,
    /// Token of the next page; set only when truncated.
    pub next_continuation_token: Option<String>,
}

/// Issues listing calls for assets of one bucket.
#[derive(Debug, Clone)]
pub struct ObjectLister {
    client: Arc<dyn BucketClient>,
    bucket: String,
}

enum Boundary {
    Start,
    Continue(String),
    Exhausted,
}

struct Pass<'a> {
    lister: &'a ObjectLister,
    asset: &'a AssetConfig,
    cursor: &'a mut ListingCursor,
    buffered: VecDeque<String>,
    boundary: Boundary,
}

impl<'a> Pass<'a> {
    async fn next_key(mut self) -> Result<Option<(String, Self)>> {
        loop {
            if let Some(key) = self.buffered.pop_front() {
                return Ok(Some((key, self)));
            }

            let token = match std::mem::replace(&mut self.boundary, Boundary::Exhausted) {
                Boundary::Start => self.cursor.continuation_token().map(str::to_string),
                Boundary::Continue(token) => {
                    self.cursor.advance(token.clone());
                    Some(token)
                }
                Boundary::Exhausted => {
                    self.cursor.complete();
                    return Ok(None);
                }
            };

            let page = self.lister.list_page(self.asset, token.as_deref()).await?;
            if let Some(next) = page.next_continuation_token {
                self.boundary = Boundary::Continue(next);
            }
            self.buffered = page.keys.into();
        }
    }
}

impl ObjectLister {
    pub fn new(client: Arc<dyn BucketClient>, bucket: impl Into<String>) -> Self {
        Self {
            client,
            bucket: bucket.into(),
        }
    }

    pub fn client(&self) -> &Arc<dyn BucketClient> {
        &self.client
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    /// Fetches one page of `asset` and filters it.
    ///
    /// Directory assets take the page's common prefixes, file assets its
    /// non-empty objects; either collection missing is a
    /// [`Error::ListingShape`]. Surviving keys are then matched against the
    /// asset's `regex_filter`, keeping store order.
    #[tracing::instrument(
        name = "connector.list_page",
        skip_all,
        fields(asset = %asset.name(), continuation_token)
    )]
    pub async fn list_page(
        &self,
        asset: &AssetConfig,
        continuation_token: Option<&str>,
    ) -> Result<ListedPage> {
        let request = ListRequest::new(&self.bucket, asset.prefix())
            .with_delimiter(asset.delimiter())
            .with_max_keys(asset.max_keys())
            .with_continuation_token(continuation_token.map(str::to_string));

        tracing::debug!(
            target: TRACING_TARGET,
            bucket = %request.bucket,
            prefix = %request.prefix,
            delimiter = %request.delimiter,
            max_keys = request.max_keys,
            continuation_token = ?request.continuation_token,
            "Fetching objects"
        );

        let ListPage {
            contents,
            common_prefixes,
            is_truncated,
            next_continuation_token,
        } = self.client.list_objects(&request).await?;

        let keys: Vec<String> = if asset.directory_assets() {
            let Some(prefixes) = common_prefixes else {
                return Err(Error::listing_shape(
                    asset,
                    "directory assets require common prefixes in the listing",
                    contents.map(|objects| objects.into_iter().map(|o| o.key).collect()),
                ));
            };
            prefixes
        } else {
            let Some(objects) = contents else {
                return Err(Error::listing_shape(
                    asset,
                    "file assets require contents in the listing",
                    common_prefixes,
                ));
            };
            // Zero-size objects are folder markers.
            objects
                .into_iter()
                .filter(|object| object.size > 0)
                .map(|object| object.key)
                .collect()
        };

        if is_truncated && next_continuation_token.is_none() {
            return Err(Error::listing_shape(
                asset,
                "truncated listing without a continuation token",
                None,
            ));
        }

        let keys = keys.into_iter().filter(|key| asset.matches(key)).collect();

        Ok(ListedPage {
            keys,
            is_truncated,
            next_continuation_token: next_continuation_token.filter(|_| is_truncated),
        })
    }

    /// Streams every key of `asset`, fetching pages as the consumer pulls.
    ///
    /// The pass starts from `cursor`'s token when one is present. The cursor
    /// moves to the next page's token once the current page is drained and
    /// is cleared after the last page. A failed call leaves it untouched.
    pub fn keys<'a>(&'a self, asset: &'a AssetConfig, cursor: &'a mut ListingCursor) -> KeyStream<'a> {
        let pass = Pass {
            lister: self,
            asset,
            cursor,
            buffered: VecDeque::new(),
            boundary: Boundary::Start,
        };

        stream::try_unfold(pass, Pass::next_key).boxed()
    }
}

#[cfg(test)]
mod tests {
    use futures::TryStreamExt;

    use super::*;
    use crate::config::{AssetOptions, ConnectorConfig};
    use crate::testing::{BUCKET, ScriptedClient, dir_page, file_page};

    fn asset(options: AssetOptions) -> AssetConfig {
        AssetConfig::resolve("asset", &options, &ConnectorConfig::new(BUCKET)).unwrap()
    }

    fn lister(client: &Arc<ScriptedClient>) -> ObjectLister {
        ObjectLister::new(client.clone(), BUCKET)
    }

    #[tokio::test]
    async fn pages_are_concatenated_and_cursor_cleared() {
        let client = Arc::new(
            ScriptedClient::new()
                .with_page(None, file_page(&[("a", 1), ("b", 1)], Some("t1")))
                .with_page(Some("t1"), file_page(&[("c", 1)], None)),
        );
        let lister = lister(&client);
        let asset = asset(AssetOptions::new(""));
        let mut cursor = ListingCursor::new();

        let keys: Vec<String> = lister.keys(&asset, &mut cursor).try_collect().await.unwrap();

        assert_eq!(keys, vec!["a", "b", "c"]);
        assert!(!cursor.is_resuming());
        let requests = client.requests();
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[1].continuation_token.as_deref(), Some("t1"));
    }

    #[tokio::test]
    async fn zero_size_objects_are_dropped() {
        let client = Arc::new(
            ScriptedClient::new().with_page(None, file_page(&[("a", 0), ("b", 10)], None)),
        );
        let page = lister(&client)
            .list_page(&asset(AssetOptions::new("")), None)
            .await
            .unwrap();

        assert_eq!(page.keys, vec!["b"]);
        assert!(!page.is_truncated);
    }

    #[tokio::test]
    async fn directory_mode_returns_common_prefixes() {
        let client = Arc::new(ScriptedClient::new().with_page(None, dir_page(&["x/", "y/"], None)));
        let page = lister(&client)
            .list_page(&asset(AssetOptions::new("").with_directory_assets(true)), None)
            .await
            .unwrap();

        assert_eq!(page.keys, vec!["x/", "y/"]);
    }

    #[tokio::test]
    async fn directory_mode_requires_common_prefixes() {
        let client = Arc::new(ScriptedClient::new().with_page(None, file_page(&[("x/a", 3)], None)));
        let err = lister(&client)
            .list_page(&asset(AssetOptions::new("").with_directory_assets(true)), None)
            .await
            .unwrap_err();

        match err {
            Error::ListingShape { partial, asset, .. } => {
                assert_eq!(partial, Some(vec!["x/a".to_string()]));
                assert!(asset.directory_assets());
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn file_mode_requires_contents() {
        let client = Arc::new(ScriptedClient::new().with_page(None, dir_page(&["x/"], None)));
        let err = lister(&client)
            .list_page(&asset(AssetOptions::new("")), None)
            .await
            .unwrap_err();

        match err {
            Error::ListingShape { partial, .. } => assert_eq!(partial, Some(vec!["x/".to_string()])),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn regex_filter_keeps_store_order() {
        let client = Arc::new(
            ScriptedClient::new()
                .with_page(None, file_page(&[("z.csv", 1), ("a.json", 1)], Some("t1")))
                .with_page(Some("t1"), file_page(&[("m.csv", 1), ("b.csv", 1)], None)),
        );
        let lister = lister(&client);
        let asset = asset(AssetOptions::new("").with_regex_filter(r".*\.csv$"));
        let mut cursor = ListingCursor::new();

        let keys: Vec<String> = lister.keys(&asset, &mut cursor).try_collect().await.unwrap();

        assert_eq!(keys, vec!["z.csv", "m.csv", "b.csv"]);
    }

    #[tokio::test]
    async fn request_carries_asset_settings() {
        let client = Arc::new(ScriptedClient::new().with_page(None, file_page(&[("logs/a", 1)], None)));
        let asset = asset(AssetOptions::new("logs/").with_delimiter("|").with_max_keys(7));

        lister(&client).list_page(&asset, None).await.unwrap();

        let request = &client.requests()[0];
        assert_eq!(request.bucket, BUCKET);
        assert_eq!(request.prefix, "logs/");
        assert_eq!(request.delimiter, "|");
        assert_eq!(request.max_keys, 7);
        assert!(request.continuation_token.is_none());
    }

    #[tokio::test]
    async fn truncated_page_without_token_is_rejected() {
        let mut page = file_page(&[("a", 1)], None);
        page.is_truncated = true;
        let client = Arc::new(ScriptedClient::new().with_page(None, page));

        let err = lister(&client)
            .list_page(&asset(AssetOptions::new("")), None)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::ListingShape { .. }));
    }

    #[tokio::test]
    async fn failed_call_leaves_cursor_in_place() {
        // Page "t1" is not scripted, so the second call fails.
        let client = Arc::new(
            ScriptedClient::new().with_page(None, file_page(&[("a", 1)], Some("t1"))),
        );
        let lister = lister(&client);
        let asset = asset(AssetOptions::new(""));
        let mut cursor = ListingCursor::new();

        let result: Result<Vec<String>> = lister.keys(&asset, &mut cursor).try_collect().await;

        assert!(result.unwrap_err().is_retryable());
        assert_eq!(cursor.continuation_token(), Some("t1"));
    }
}
