//! Request payloads accepted at the connector boundary.

use serde::{Deserialize, Serialize};

use crate::TRACING_TARGET;
use crate::config::ReaderOptions;
use crate::descriptor::BatchOverrides;
use crate::error::{Error, Result};

/// A request for one batch (partition id given) or all batches of an asset.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BatchRequest {
    /// Asset to read. Required; kept optional so payloads lacking it can be
    /// reported back to the caller.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_asset_name: Option<String>,

    /// Partition to address. Omitted means every batch of the asset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub partition_id: Option<String>,

    /// Call-level overrides.
    #[serde(flatten)]
    pub overrides: BatchOverrides,
}

impl BatchRequest {
    /// A request for every batch of `asset_name`.
    pub fn new(asset_name: impl Into<String>) -> Self {
        Self {
            data_asset_name: Some(asset_name.into()),
            ..Default::default()
        }
    }

    pub fn with_partition_id(mut self, partition_id: impl Into<String>) -> Self {
        self.partition_id = Some(partition_id.into());
        self
    }

    pub fn with_reader_method(mut self, reader_method: impl Into<String>) -> Self {
        self.overrides.reader_method = Some(reader_method.into());
        self
    }

    pub fn with_reader_options(mut self, reader_options: ReaderOptions) -> Self {
        self.overrides.reader_options = reader_options;
        self
    }

    pub fn with_limit(mut self, limit: u64) -> Self {
        self.overrides.limit = Some(limit);
        self
    }
}

/// A request for the partition ids of an asset.
///
/// `generator_asset` is the legacy name of `data_asset_name`; it is still
/// accepted with a deprecation warning.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartitionIdsRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_asset_name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub generator_asset: Option<String>,
}

impl PartitionIdsRequest {
    pub fn new(asset_name: impl Into<String>) -> Self {
        Self {
            data_asset_name: Some(asset_name.into()),
            generator_asset: None,
        }
    }

    /// The asset name the request refers to.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidRequest`] unless exactly one of the two
    /// fields is set.
    pub fn into_asset_name(self) -> Result<String> {
        match (self.data_asset_name, self.generator_asset) {
            (Some(name), None) => Ok(name),
            (None, Some(name)) => {
                tracing::warn!(
                    target: TRACING_TARGET,
                    generator_asset = %name,
                    "The 'generator_asset' argument is deprecated and renamed to 'data_asset_name'"
                );
                Ok(name)
            }
            _ => Err(Error::invalid_request(
                "provide either generator_asset or data_asset_name",
            )),
        }
    }
}
