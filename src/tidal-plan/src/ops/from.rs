//! Logical storage read.

use serde::{Deserialize, Serialize};

use common_error::{TidalError, TidalResult};

/// Arguments of a storage read as given by the query.
///
/// Exactly one of `bucket` and `bucket_id` must be set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FromOpSpec {
    /// Bucket name, `database` or `database/retention-policy`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bucket: Option<String>,
    /// Bucket identifier.
    #[serde(default, rename = "bucketID", skip_serializing_if = "Option::is_none")]
    pub bucket_id: Option<String>,
}

impl FromOpSpec {
    /// Validate read arguments. Empty strings count as absent.
    pub fn from_args(bucket: Option<String>, bucket_id: Option<String>) -> TidalResult<Self> {
        let bucket = bucket.filter(|b| !b.is_empty());
        let bucket_id = bucket_id.filter(|b| !b.is_empty());

        match (&bucket, &bucket_id) {
            (None, None) => Err(TidalError::invalid_config(
                "must specify one of bucket or bucketID",
            )),
            (Some(_), Some(_)) => Err(TidalError::invalid_config(
                "must specify only one of bucket or bucketID",
            )),
            _ => Ok(Self { bucket, bucket_id }),
        }
    }

    /// Convert into the logical procedure spec.
    pub fn to_procedure(&self) -> TidalResult<FromSpec> {
        let bucket = match (&self.bucket, &self.bucket_id) {
            (Some(name), None) => BucketRef::Name(name.clone()),
            (None, Some(id)) => BucketRef::Id(id.clone()),
            _ => {
                return Err(TidalError::invalid_config(
                    "must specify exactly one of bucket or bucketID",
                ));
            }
        };
        Ok(FromSpec { bucket })
    }
}

/// Reference to a bucket, by name or by id.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum BucketRef {
    /// Bucket name.
    Name(String),
    /// Bucket identifier.
    Id(String),
}

impl BucketRef {
    /// The name or id, whichever is set.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Name(s) | Self::Id(s) => s,
        }
    }
}

impl std::fmt::Display for BucketRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Logical storage read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FromSpec {
    /// Bucket to read.
    pub bucket: BucketRef,
}

impl FromSpec {
    /// Read the named bucket.
    pub fn bucket(name: impl Into<String>) -> Self {
        Self {
            bucket: BucketRef::Name(name.into()),
        }
    }

    /// Read the bucket with the given id.
    pub fn bucket_id(id: impl Into<String>) -> Self {
        Self {
            bucket: BucketRef::Id(id.into()),
        }
    }
}
