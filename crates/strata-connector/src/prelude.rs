//! Convenience re-exports.

pub use strata_object::client::{BucketClient, GetOutput};
pub use strata_object::providers::S3Credentials;

pub use crate::{
    AssetConfig, AssetKind, AssetOptions, BatchDescriptor, BatchOutput, BatchOverrides,
    BatchRequest, ConnectorConfig, DataConnector, Error, ListingCursor, ObjectFetcher,
    PartitionId, PartitionIdsRequest, ReaderOptions, Result,
};
