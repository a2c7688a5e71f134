//! Batch descriptors and the layered option merge that produces them.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::config::{AssetConfig, ConnectorConfig, ReaderOptions};
use crate::error::{Error, Result};

/// Self-contained description of how to fetch and read one batch.
///
/// Serializes as
/// `{"data_asset_name": .., "s3": "<scheme>://<bucket>/<key>", "reader_method": ..,
/// "reader_options": {..}, "limit": ..}` with `limit` omitted when unset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchDescriptor {
    #[serde(rename = "data_asset_name")]
    pub asset_name: String,
    #[serde(rename = "s3")]
    pub object_uri: String,
    pub reader_method: Option<String>,
    pub reader_options: ReaderOptions,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<u64>,
}

impl BatchDescriptor {
    /// Splits `object_uri` into scheme, bucket and key.
    pub fn parse_uri(&self) -> Result<ObjectUri> {
        self.object_uri.parse()
    }
}

/// Call-level layer of a batch request.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BatchOverrides {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reader_method: Option<String>,
    #[serde(default, skip_serializing_if = "ReaderOptions::is_empty")]
    pub reader_options: ReaderOptions,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<u64>,
}

/// `<scheme>://<bucket>/<key>` split into its parts.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ObjectUri {
    scheme: String,
    bucket: String,
    key: String,
}

impl ObjectUri {
    pub fn new(
        scheme: impl Into<String>,
        bucket: impl Into<String>,
        key: impl Into<String>,
    ) -> Self {
        Self {
            scheme: scheme.into(),
            bucket: bucket.into(),
            key: key.into(),
        }
    }

    pub fn scheme(&self) -> &str {
        &self.scheme
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    pub fn key(&self) -> &str {
        &self.key
    }
}

impl fmt::Display for ObjectUri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}://{}/{}", self.scheme, self.bucket, self.key)
    }
}

impl FromStr for ObjectUri {
    type Err = Error;

    /// Everything after the bucket is the key, verbatim: object keys may
    /// contain `?`, `#` and characters a URL parser would escape.
    fn from_str(uri: &str) -> Result<Self> {
        let (scheme, rest) = uri
            .split_once("://")
            .ok_or_else(|| Error::invalid_uri(uri, "missing scheme separator"))?;
        let (bucket, key) = rest
            .split_once('/')
            .ok_or_else(|| Error::invalid_uri(uri, "missing key"))?;

        if scheme.is_empty() {
            return Err(Error::invalid_uri(uri, "empty scheme"));
        }
        if bucket.is_empty() {
            return Err(Error::invalid_uri(uri, "empty bucket"));
        }
        if key.is_empty() {
            return Err(Error::invalid_uri(uri, "empty key"));
        }

        Ok(Self::new(scheme, bucket, key))
    }
}

/// Builds descriptors from the connector layer, an asset layer and a call layer.
#[derive(Debug, Clone)]
pub struct BatchDescriptorBuilder {
    scheme: String,
    bucket: String,
    reader_method: Option<String>,
    reader_options: ReaderOptions,
}

impl BatchDescriptorBuilder {
    pub fn from_config(config: &ConnectorConfig) -> Self {
        Self {
            scheme: config.scheme.clone(),
            bucket: config.bucket.clone(),
            reader_method: config.reader_method.clone(),
            reader_options: config.reader_options.clone(),
        }
    }

    pub fn reader_method(&self) -> Option<&str> {
        self.reader_method.as_deref()
    }

    pub fn reader_options(&self) -> &ReaderOptions {
        &self.reader_options
    }

    pub fn object_uri(&self, key: &str) -> ObjectUri {
        ObjectUri::new(&self.scheme, &self.bucket, key)
    }

    /// Builds the descriptor of `key`.
    ///
    /// Reader options merge shallowly, connector then asset then call, each
    /// layer replacing whole top-level entries. The reader method is the
    /// first non-empty of call, asset and connector. A zero limit is dropped.
    pub fn build(&self, key: &str, asset: &AssetConfig, overrides: &BatchOverrides) -> BatchDescriptor {
        let mut reader_options = self.reader_options.clone();
        reader_options.extend(asset.reader_options().clone());
        reader_options.extend(overrides.reader_options.clone());

        let reader_method = [
            overrides.reader_method.as_deref(),
            asset.reader_method(),
            self.reader_method.as_deref(),
        ]
        .into_iter()
        .flatten()
        .find(|method| !method.is_empty())
        .map(str::to_string);

        BatchDescriptor {
            asset_name: asset.name().to_string(),
            object_uri: self.object_uri(key).to_string(),
            reader_method,
            reader_options,
            limit: overrides.limit.filter(|limit| *limit > 0),
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::config::AssetOptions;
    use crate::testing::reader_options;

    fn builder_and_asset(
        connector: ConnectorConfig,
        options: AssetOptions,
    ) -> (BatchDescriptorBuilder, AssetConfig) {
        let asset = AssetConfig::resolve("logs", &options, &connector).unwrap();
        (BatchDescriptorBuilder::from_config(&connector), asset)
    }

    #[test]
    fn asset_reader_options_override_connector() {
        let (builder, asset) = builder_and_asset(
            ConnectorConfig::new("bucket").with_reader_options(reader_options(json!({ "sep": "," }))),
            AssetOptions::new("logs/").with_reader_options(reader_options(json!({ "sep": "~" }))),
        );

        let descriptor = builder.build("logs/2020.csv", &asset, &BatchOverrides::default());

        assert_eq!(descriptor.reader_options["sep"], json!("~"));
        assert_eq!(descriptor.object_uri, "s3a://bucket/logs/2020.csv");
        assert_eq!(descriptor.asset_name, "logs");
    }

    #[test]
    fn call_layer_wins_and_merge_is_shallow() {
        let (builder, asset) = builder_and_asset(
            ConnectorConfig::new("bucket").with_reader_options(reader_options(json!({
                "sep": ",",
                "header": 0,
                "dtype": { "a": "int", "b": "str" }
            }))),
            AssetOptions::new("").with_reader_options(reader_options(json!({ "sep": "~" }))),
        );
        let overrides = BatchOverrides {
            reader_options: reader_options(json!({ "sep": "|", "dtype": { "a": "float" } })),
            ..Default::default()
        };

        let descriptor = builder.build("k", &asset, &overrides);

        assert_eq!(
            serde_json::Value::Object(descriptor.reader_options),
            json!({ "sep": "|", "header": 0, "dtype": { "a": "float" } })
        );
        assert_eq!(builder.reader_options()["sep"], json!(","));
    }

    #[test]
    fn reader_method_precedence() {
        let connector = ConnectorConfig::new("bucket").with_reader_method("csv");

        let (builder, plain) = builder_and_asset(connector.clone(), AssetOptions::new(""));
        let no_overrides = BatchOverrides::default();
        assert_eq!(builder.build("k", &plain, &no_overrides).reader_method.as_deref(), Some("csv"));

        let (builder, parquet) =
            builder_and_asset(connector, AssetOptions::new("").with_reader_method("parquet"));
        assert_eq!(
            builder.build("k", &parquet, &no_overrides).reader_method.as_deref(),
            Some("parquet")
        );

        let json_call = BatchOverrides {
            reader_method: Some("json".to_string()),
            ..Default::default()
        };
        assert_eq!(builder.build("k", &parquet, &json_call).reader_method.as_deref(), Some("json"));

        let empty_call = BatchOverrides {
            reader_method: Some(String::new()),
            ..Default::default()
        };
        assert_eq!(
            builder.build("k", &parquet, &empty_call).reader_method.as_deref(),
            Some("parquet")
        );
    }

    #[test]
    fn zero_limit_is_omitted() {
        let (builder, asset) = builder_and_asset(ConnectorConfig::new("bucket"), AssetOptions::new(""));
        let overrides = BatchOverrides {
            limit: Some(0),
            ..Default::default()
        };

        let descriptor = builder.build("k", &asset, &overrides);
        assert!(descriptor.limit.is_none());

        let value = serde_json::to_value(&descriptor).unwrap();
        assert_eq!(
            value,
            json!({
                "data_asset_name": "logs",
                "s3": "s3a://bucket/k",
                "reader_method": null,
                "reader_options": {}
            })
        );
    }

    #[test]
    fn limit_is_serialized_when_set() {
        let (builder, asset) = builder_and_asset(ConnectorConfig::new("bucket"), AssetOptions::new(""));
        let overrides = BatchOverrides {
            limit: Some(10),
            ..Default::default()
        };

        let value = serde_json::to_value(builder.build("k", &asset, &overrides)).unwrap();
        assert_eq!(value["limit"], json!(10));
    }

    #[test]
    fn object_uri_round_trips_through_descriptor() {
        let (builder, asset) = builder_and_asset(
            ConnectorConfig::new("bucket").with_scheme("s3"),
            AssetOptions::new(""),
        );
        let descriptor = builder.build("dir/file name?.csv", &asset, &BatchOverrides::default());

        let uri = descriptor.parse_uri().unwrap();
        assert_eq!(uri.scheme(), "s3");
        assert_eq!(uri.bucket(), "bucket");
        assert_eq!(uri.key(), "dir/file name?.csv");
    }

    #[test]
    fn malformed_uris_are_rejected() {
        for uri in ["bucket/key", "s3a://bucket", "s3a:///key", "://bucket/key", "s3a://bucket/"] {
            let err = uri.parse::<ObjectUri>().unwrap_err();
            assert!(matches!(err, Error::InvalidUri { .. }), "{uri}");
        }
    }
}
