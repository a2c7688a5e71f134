//! The data connector facade.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt;
use std::sync::Arc;

use futures::TryStreamExt;
use strata_object::client::{BucketClient, GetOutput};
use strata_object::providers::{Client, S3Credentials, S3Provider};

use crate::TRACING_TARGET;
use crate::config::{AssetConfig, AssetKind, ConnectorConfig, ReaderOptions};
use crate::cursor::ListingCursor;
use crate::descriptor::{BatchDescriptor, BatchDescriptorBuilder, BatchOverrides, ObjectUri};
use crate::error::{Error, Result};
use crate::fetcher::ObjectFetcher;
use crate::iterator::{AssetIterator, BatchStream};
use crate::lister::ObjectLister;
use crate::partition::{PartitionId, PartitionResolver};
use crate::request::{BatchRequest, PartitionIdsRequest};

/// Result of [`DataConnector::build_batch`].
pub enum BatchOutput<'a> {
    /// The descriptor of the requested partition.
    Single(BatchDescriptor),
    /// Every batch of the asset, produced lazily.
    Stream(BatchStream<'a>),
}

impl<'a> BatchOutput<'a> {
    pub fn into_single(self) -> Option<BatchDescriptor> {
        match self {
            Self::Single(descriptor) => Some(descriptor),
            Self::Stream(_) => None,
        }
    }

    pub fn into_stream(self) -> Option<BatchStream<'a>> {
        match self {
            Self::Single(_) => None,
            Self::Stream(stream) => Some(stream),
        }
    }
}

impl fmt::Debug for BatchOutput<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Single(descriptor) => f.debug_tuple("Single").field(descriptor).finish(),
            Self::Stream(_) => f.debug_tuple("Stream").finish_non_exhaustive(),
        }
    }
}

/// Registry of named assets in one bucket.
///
/// Each asset owns a [`ListingCursor`] that lazy batch streams resume from.
/// Streams take `&mut self`, so passes over the same connector never
/// interleave; clone the connector to list concurrently. Fetch objects while a
/// stream is open through a handle taken from [`fetcher`](Self::fetcher).
#[derive(Debug, Clone)]
pub struct DataConnector {
    name: String,
    lister: ObjectLister,
    resolver: PartitionResolver,
    builder: BatchDescriptorBuilder,
    fetcher: ObjectFetcher,
    assets: BTreeMap<String, AssetConfig>,
    cursors: HashMap<String, ListingCursor>,
}

impl DataConnector {
    /// Registers the configured assets over `client`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfig`] if the configuration does not validate.
    pub fn new(config: &ConnectorConfig, client: Arc<dyn BucketClient>) -> Result<Self> {
        let assets = config.resolve_assets()?;
        let cursors = assets
            .keys()
            .map(|name| (name.clone(), ListingCursor::new()))
            .collect();

        tracing::info!(
            target: TRACING_TARGET,
            connector = %config.name,
            bucket = %config.bucket,
            assets = assets.len(),
            "Data connector initialized"
        );

        Ok(Self {
            name: config.name.clone(),
            fetcher: ObjectFetcher::new(client.clone()),
            lister: ObjectLister::new(client, &config.bucket),
            resolver: PartitionResolver::new(),
            builder: BatchDescriptorBuilder::from_config(config),
            assets,
            cursors,
        })
    }

    /// Builds an S3 client from `credentials` and registers the configured assets.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ClientUnavailable`] if the client cannot be built, and
    /// [`Error::InvalidConfig`] if the credentials name another bucket.
    pub async fn connect(config: &ConnectorConfig, credentials: &S3Credentials) -> Result<Self> {
        if credentials.bucket != config.bucket {
            return Err(Error::invalid_config(format!(
                "credentials are for bucket '{}' but the connector reads '{}'",
                credentials.bucket, config.bucket
            )));
        }

        let provider = S3Provider::connect(credentials)
            .await
            .map_err(|e| Error::ClientUnavailable {
                reason: e.to_string(),
                source: Some(e),
            })?;

        Self::new(config, Arc::new(provider.into_inner()))
    }

    /// Replaces the partition resolver, e.g. to pin the sentinel clock.
    pub fn with_resolver(mut self, resolver: PartitionResolver) -> Self {
        self.resolver = resolver;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn bucket(&self) -> &str {
        self.lister.bucket()
    }

    pub fn reader_method(&self) -> Option<&str> {
        self.builder.reader_method()
    }

    pub fn reader_options(&self) -> &ReaderOptions {
        self.builder.reader_options()
    }

    pub fn asset(&self, asset_name: &str) -> Option<&AssetConfig> {
        self.assets.get(asset_name)
    }

    /// Current listing position of an asset.
    pub fn cursor(&self, asset_name: &str) -> Option<&ListingCursor> {
        self.cursors.get(asset_name)
    }

    /// Makes the next pass over the asset start from the beginning.
    pub fn reset_cursor(&mut self, asset_name: &str) {
        if let Some(cursor) = self.cursors.get_mut(asset_name) {
            cursor.reset();
        }
    }

    /// Names and kinds of every registered asset.
    pub fn list_asset_names(&self) -> BTreeSet<(String, AssetKind)> {
        self.assets
            .iter()
            .map(|(name, asset)| (name.clone(), asset.kind()))
            .collect()
    }

    /// Partition ids of every surviving key, in listing order.
    ///
    /// Always a full pass from the first page; the asset's stored cursor is
    /// neither read nor moved. Not deduplicated: repeated ids, sentinel ids
    /// included, are all kept.
    #[tracing::instrument(name = "connector.list_partition_ids", skip(self), fields(connector = %self.name))]
    pub async fn list_partition_ids(&self, asset_name: &str) -> Result<Vec<PartitionId>> {
        let asset = self
            .assets
            .get(asset_name)
            .ok_or_else(|| Error::unknown_asset(BatchRequest::new(asset_name)))?;
        let mut cursor = ListingCursor::new();

        self.iterator(asset)
            .partitions(&mut cursor)
            .map_ok(|(_, id)| id)
            .try_collect()
            .await
    }

    /// Same as [`list_partition_ids`](Self::list_partition_ids), accepting the
    /// legacy `generator_asset` field.
    pub async fn list_partition_ids_for(
        &self,
        request: PartitionIdsRequest,
    ) -> Result<Vec<PartitionId>> {
        let asset_name = request.into_asset_name()?;
        self.list_partition_ids(&asset_name).await
    }

    /// Builds the descriptor of one partition, or a stream of every batch of
    /// the asset when the request names no partition.
    ///
    /// Addressing a partition scans the whole asset: it fails with
    /// [`Error::NoMatchingPartition`] when no key resolves to the id and with
    /// [`Error::AmbiguousPartition`] when several do.
    pub async fn build_batch(&mut self, request: BatchRequest) -> Result<BatchOutput<'_>> {
        let Some(asset_name) = request.data_asset_name.clone() else {
            return Err(Error::MissingAssetName {
                request: Box::new(request),
            });
        };
        if !self.assets.contains_key(&asset_name) {
            return Err(Error::unknown_asset(request));
        }

        let BatchRequest {
            partition_id,
            overrides,
            ..
        } = request;

        match partition_id.filter(|id| !id.is_empty()) {
            Some(id) => {
                let descriptor = self
                    .find_partition(&asset_name, PartitionId::from(id), &overrides)
                    .await?;
                Ok(BatchOutput::Single(descriptor))
            }
            None => self.iter_batches(&asset_name, overrides).map(BatchOutput::Stream),
        }
    }

    /// Lazily produces a descriptor for every surviving key of the asset,
    /// resuming from the asset's cursor.
    pub fn iter_batches(
        &mut self,
        asset_name: &str,
        overrides: BatchOverrides,
    ) -> Result<BatchStream<'_>> {
        let Self {
            lister,
            resolver,
            builder,
            assets,
            cursors,
            ..
        } = self;

        let asset = assets.get(asset_name).ok_or_else(|| {
            let request = BatchRequest {
                data_asset_name: Some(asset_name.to_string()),
                partition_id: None,
                overrides: overrides.clone(),
            };
            Error::unknown_asset(request)
        })?;
        let cursor = cursors.entry(asset_name.to_string()).or_default();

        tracing::debug!(
            target: TRACING_TARGET,
            asset = asset_name,
            resuming = cursor.is_resuming(),
            "Beginning asset iteration"
        );

        Ok(AssetIterator::new(lister, resolver, builder, asset).batches(cursor, overrides))
    }

    #[tracing::instrument(name = "connector.find_partition", skip(self, overrides))]
    async fn find_partition(
        &self,
        asset_name: &str,
        partition_id: PartitionId,
        overrides: &BatchOverrides,
    ) -> Result<BatchDescriptor> {
        let asset = self
            .assets
            .get(asset_name)
            .ok_or_else(|| Error::unknown_asset(BatchRequest::new(asset_name)))?;
        let mut cursor = ListingCursor::new();

        let keys: Vec<String> = self
            .iterator(asset)
            .partitions(&mut cursor)
            .try_filter_map(|(key, id)| {
                let matched = (id == partition_id).then_some(key);
                futures::future::ready(Ok(matched))
            })
            .try_collect()
            .await?;

        match keys.as_slice() {
            [] => Err(Error::NoMatchingPartition {
                asset_name: asset_name.to_string(),
                partition_id,
            }),
            [key] => Ok(self.builder.build(key, asset, overrides)),
            _ => Err(Error::AmbiguousPartition {
                asset_name: asset_name.to_string(),
                partition_id,
                keys,
            }),
        }
    }

    /// Handle for fetching objects independently of the connector borrow.
    pub fn fetcher(&self) -> ObjectFetcher {
        self.fetcher.clone()
    }

    /// Opens the object a descriptor points at.
    ///
    /// See [`ObjectFetcher::fetch`].
    pub async fn fetch_object(&self, descriptor: &BatchDescriptor) -> Result<(ObjectUri, GetOutput)> {
        self.fetcher.fetch(descriptor).await
    }

    fn iterator<'a>(&'a self, asset: &'a AssetConfig) -> AssetIterator<'a> {
        AssetIterator::new(&self.lister, &self.resolver, &self.builder, asset)
    }
}
