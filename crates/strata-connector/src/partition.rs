//! Partition id derivation.

use derive_more::{Deref, Display, From, Into};
use jiff::Timestamp;
use serde::{Deserialize, Serialize};

use crate::TRACING_TARGET;
use crate::config::AssetConfig;

/// Suffix of ids synthesized when `partition_regex` does not match a key.
pub const UNMATCHED_SUFFIX: &str = "__unmatched";

/// Suffix of ids synthesized when the configured capture group is missing.
pub const NO_MATCH_GROUP_SUFFIX: &str = "__no_match_group";

/// Compact, sortable UTC timestamp prefixing synthesized ids.
const SENTINEL_TIMESTAMP_FORMAT: &str = "%Y%m%dT%H%M%S.%6fZ";

/// Identifier of a partition within an asset.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[derive(Deref, Display, From, Into, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PartitionId(String);

impl PartitionId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether the id was synthesized after a regex miss.
    ///
    /// Such ids embed the time they were produced and are not stable across
    /// calls.
    pub fn is_sentinel(&self) -> bool {
        self.0.ends_with(UNMATCHED_SUFFIX) || self.0.ends_with(NO_MATCH_GROUP_SUFFIX)
    }

    fn sentinel(at: Timestamp, suffix: &str) -> Self {
        Self(format!("{}{suffix}", at.strftime(SENTINEL_TIMESTAMP_FORMAT)))
    }
}

impl From<&str> for PartitionId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl AsRef<str> for PartitionId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl PartialEq<str> for PartitionId {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for PartitionId {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

/// Maps object keys to partition ids.
///
/// With a `partition_regex`, the configured capture group is the id; a key
/// the regex misses, or whose group is absent, gets a timestamped sentinel id
/// and a warning instead of an error. Without one, the id is the key with the
/// asset prefix stripped.
#[derive(Debug, Clone, Copy)]
pub struct PartitionResolver {
    clock: fn() -> Timestamp,
}

impl Default for PartitionResolver {
    fn default() -> Self {
        Self {
            clock: Timestamp::now,
        }
    }
}

impl PartitionResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// A resolver stamping sentinel ids with `clock` instead of the wall clock.
    pub fn with_clock(clock: fn() -> Timestamp) -> Self {
        Self { clock }
    }

    pub fn resolve(&self, key: &str, asset: &AssetConfig) -> PartitionId {
        let Some(regex) = asset.partition_regex() else {
            let id = key.strip_prefix(asset.prefix()).unwrap_or(key);
            return PartitionId::from(id);
        };

        let Some(captures) = regex.captures(key) else {
            tracing::warn!(
                target: TRACING_TARGET,
                asset = %asset.name(),
                key,
                "No match found for key"
            );
            return PartitionId::sentinel((self.clock)(), UNMATCHED_SUFFIX);
        };

        match captures.get(asset.match_group_id()) {
            Some(group) => PartitionId::from(group.as_str()),
            None => {
                tracing::warn!(
                    target: TRACING_TARGET,
                    asset = %asset.name(),
                    key,
                    match_group_id = asset.match_group_id(),
                    "No match group in key"
                );
                PartitionId::sentinel((self.clock)(), NO_MATCH_GROUP_SUFFIX)
            }
        }
    }
}
