#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![doc = include_str!("../README.md")]

mod config;
mod connector;
mod cursor;
mod descriptor;
mod error;
mod fetcher;
mod iterator;
mod lister;
mod partition;
mod request;

#[cfg(test)]
mod testing;

#[doc(hidden)]
pub mod prelude;

pub use config::{AssetConfig, AssetKind, AssetOptions, ConnectorConfig, ReaderOptions};
pub use connector::{BatchOutput, DataConnector};
pub use cursor::ListingCursor;
pub use descriptor::{BatchDescriptor, BatchDescriptorBuilder, BatchOverrides, ObjectUri};
pub use error::{Error, Result};
pub use fetcher::ObjectFetcher;
pub use iterator::{AssetIterator, BatchStream, PartitionStream};
pub use lister::{KeyStream, ListedPage, ObjectLister};
pub use partition::{NO_MATCH_GROUP_SUFFIX, PartitionId, PartitionResolver, UNMATCHED_SUFFIX};
pub use request::{BatchRequest, PartitionIdsRequest};

/// Tracing target for connector operations.
pub const TRACING_TARGET: &str = "strata_connector";
