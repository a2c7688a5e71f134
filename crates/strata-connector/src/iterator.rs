//! Lazy per-asset sequences of descriptors and partition ids.

use futures::stream::BoxStream;
use futures::{StreamExt, TryStreamExt};

use crate::config::AssetConfig;
use crate::cursor::ListingCursor;
use crate::descriptor::{BatchDescriptor, BatchDescriptorBuilder, BatchOverrides};
use crate::error::Result;
use crate::lister::ObjectLister;
use crate::partition::{PartitionId, PartitionResolver};

/// Lazily produced batch descriptors of one asset.
pub type BatchStream<'a> = BoxStream<'a, Result<BatchDescriptor>>;

/// Lazily resolved `(key, partition id)` pairs of one asset.
pub type PartitionStream<'a> = BoxStream<'a, Result<(String, PartitionId)>>;

/// Composes the lister with the resolver and the descriptor builder for one
/// asset.
///
/// Streams pull pages only as they are consumed and keep store order. They
/// resume from the cursor they are given; reset it to start over.
#[derive(Debug, Clone, Copy)]
pub struct AssetIterator<'a> {
    lister: &'a ObjectLister,
    resolver: &'a PartitionResolver,
    builder: &'a BatchDescriptorBuilder,
    asset: &'a AssetConfig,
}

impl<'a> AssetIterator<'a> {
    pub fn new(
        lister: &'a ObjectLister,
        resolver: &'a PartitionResolver,
        builder: &'a BatchDescriptorBuilder,
        asset: &'a AssetConfig,
    ) -> Self {
        Self {
            lister,
            resolver,
            builder,
            asset,
        }
    }

    /// One descriptor per surviving key.
    pub fn batches(self, cursor: &'a mut ListingCursor, overrides: BatchOverrides) -> BatchStream<'a> {
        let Self { builder, asset, .. } = self;
        self.lister
            .keys(asset, cursor)
            .map_ok(move |key| builder.build(&key, asset, &overrides))
            .boxed()
    }

    /// Every surviving key with its resolved partition id.
    pub fn partitions(self, cursor: &'a mut ListingCursor) -> PartitionStream<'a> {
        let Self { resolver, asset, .. } = self;
        self.lister
            .keys(asset, cursor)
            .map_ok(move |key| {
                let id = resolver.resolve(&key, asset);
                (key, id)
            })
            .boxed()
    }
}
