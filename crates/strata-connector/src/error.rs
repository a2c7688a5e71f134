//! Error types for connector operations.

use crate::config::AssetConfig;
use crate::partition::PartitionId;
use crate::request::BatchRequest;

/// Result type for all connector operations.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Errors surfaced by the connector.
///
/// Every failure reaches the immediate caller with its context attached.
/// Partition ids synthesized after a regex miss are not errors.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The requested asset is not registered.
    #[error("unknown asset '{asset_name}'")]
    UnknownAsset {
        asset_name: String,
        request: Box<BatchRequest>,
    },

    /// A batch request did not name an asset.
    #[error("unable to build batch: no asset name provided")]
    MissingAssetName { request: Box<BatchRequest> },

    /// The store response lacks the collection the asset's listing mode needs.
    ///
    /// `partial` holds the keys of whichever collection was present.
    #[error("listing for asset '{}' has an unexpected shape: {reason}", .asset.name())]
    ListingShape {
        asset: Box<AssetConfig>,
        reason: String,
        partial: Option<Vec<String>>,
    },

    /// No key of the asset resolved to the requested partition id.
    #[error("unable to identify partition '{partition_id}' for asset '{asset_name}'")]
    NoMatchingPartition {
        asset_name: String,
        partition_id: PartitionId,
    },

    /// More than one key resolved to the requested partition id.
    #[error(
        "partition '{partition_id}' of asset '{asset_name}' is ambiguous: {} keys match",
        .keys.len()
    )]
    AmbiguousPartition {
        asset_name: String,
        partition_id: PartitionId,
        keys: Vec<String>,
    },

    /// The object-store client could not be constructed.
    #[error("object store client unavailable: {reason}")]
    ClientUnavailable {
        reason: String,
        #[source]
        source: Option<strata_object::types::Error>,
    },

    /// Connector or asset configuration is invalid.
    #[error("invalid configuration: {reason}")]
    InvalidConfig { reason: String },

    /// A request is malformed beyond a missing asset name.
    #[error("invalid request: {reason}")]
    InvalidRequest { reason: String },

    /// An object URI could not be split into scheme, bucket and key.
    #[error("invalid object uri '{uri}': {reason}")]
    InvalidUri { uri: String, reason: String },

    /// A store call failed.
    #[error(transparent)]
    Store(#[from] strata_object::types::Error),
}

impl Error {
    /// Create an unknown asset error carrying the attempted request.
    pub fn unknown_asset(request: BatchRequest) -> Self {
        Self::UnknownAsset {
            asset_name: request.data_asset_name.clone().unwrap_or_default(),
            request: Box::new(request),
        }
    }

    /// Create a listing shape error for `asset`.
    pub fn listing_shape(
        asset: &AssetConfig,
        reason: impl Into<String>,
        partial: Option<Vec<String>>,
    ) -> Self {
        Self::ListingShape {
            asset: Box::new(asset.clone()),
            reason: reason.into(),
            partial,
        }
    }

    /// Create an invalid configuration error.
    pub fn invalid_config(reason: impl Into<String>) -> Self {
        Self::InvalidConfig {
            reason: reason.into(),
        }
    }

    /// Create an invalid request error.
    pub fn invalid_request(reason: impl Into<String>) -> Self {
        Self::InvalidRequest {
            reason: reason.into(),
        }
    }

    /// Create an invalid URI error.
    pub fn invalid_uri(uri: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidUri {
            uri: uri.into(),
            reason: reason.into(),
        }
    }

    /// Whether a caller-side retry could succeed.
    ///
    /// Only store failures flagged retryable by the client qualify.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Store(err) => err.is_retryable(),
            _ => false,
        }
    }
}
