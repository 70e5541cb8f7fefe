//! Object storage interface for extraction outputs (MinIO/S3 compatible).

use bytes::Bytes;
use object_store::{aws::AmazonS3Builder, memory::InMemory, path::Path, ObjectStore};
use serde::{Deserialize, Serialize};
use std::{env, sync::Arc};
use tracing::{debug, instrument};

use hrrr_common::{HrrrError, HrrrResult};

/// Configuration for object storage connection.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ObjectStorageConfig {
    /// S3/MinIO endpoint URL
    pub endpoint: String,
    /// Bucket name
    pub bucket: String,
    /// Access key ID
    pub access_key_id: String,
    /// Secret access key
    pub secret_access_key: String,
    /// AWS region (use "us-east-1" for MinIO)
    pub region: String,
    /// Allow HTTP (for local MinIO)
    pub allow_http: bool,
}

impl Default for ObjectStorageConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://minio:9000".to_string(),
            bucket: "hrrr-extract".to_string(),
            access_key_id: "minioadmin".to_string(),
            secret_access_key: "minioadmin".to_string(),
            region: "us-east-1".to_string(),
            allow_http: true,
        }
    }
}

impl ObjectStorageConfig {
    /// Override fields from `S3_*` environment variables when set.
    pub fn apply_env(&mut self) {
        if let Ok(v) = env::var("S3_ENDPOINT") {
            self.endpoint = v;
        }
        if let Ok(v) = env::var("S3_BUCKET") {
            self.bucket = v;
        }
        if let Ok(v) = env::var("S3_ACCESS_KEY") {
            self.access_key_id = v;
        }
        if let Ok(v) = env::var("S3_SECRET_KEY") {
            self.secret_access_key = v;
        }
        if let Ok(v) = env::var("S3_REGION") {
            self.region = v;
        }
        if let Ok(v) = env::var("S3_ALLOW_HTTP") {
            self.allow_http = v.parse().unwrap_or(self.allow_http);
        }
    }
}

/// Object storage client for extraction outputs.
pub struct ObjectStorage {
    store: Arc<dyn ObjectStore>,
    bucket: String,
}

impl ObjectStorage {
    /// Create a new object storage client from config.
    pub fn new(config: &ObjectStorageConfig) -> HrrrResult<Self> {
        let mut builder = AmazonS3Builder::new()
            .with_endpoint(&config.endpoint)
            .with_bucket_name(&config.bucket)
            .with_access_key_id(&config.access_key_id)
            .with_secret_access_key(&config.secret_access_key)
            .with_region(&config.region);

        if config.allow_http {
            builder = builder.with_allow_http(true);
        }

        let store = builder
            .build()
            .map_err(|e| HrrrError::StorageError(format!("Failed to create S3 client: {}", e)))?;

        Ok(Self {
            store: Arc::new(store),
            bucket: config.bucket.clone(),
        })
    }

    /// In-process store, used for dry runs and tests.
    pub fn in_memory() -> Self {
        Self {
            store: Arc::new(InMemory::new()),
            bucket: "memory".to_string(),
        }
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    /// Write bytes to a path in the bucket.
    #[instrument(skip(self, data), fields(bucket = %self.bucket, path = %path))]
    pub async fn put(&self, path: &str, data: Bytes) -> HrrrResult<()> {
        let location = Path::from(path);
        debug!(size = data.len(), "Writing object");

        self.store
            .put(&location, data.into())
            .await
            .map_err(|e| HrrrError::StorageError(format!("Failed to write {}: {}", path, e)))?;

        Ok(())
    }

    /// Read bytes from a path.
    #[instrument(skip(self), fields(bucket = %self.bucket, path = %path))]
    pub async fn get(&self, path: &str) -> HrrrResult<Bytes> {
        let location = Path::from(path);

        let result = self
            .store
            .get(&location)
            .await
            .map_err(|e| HrrrError::StorageError(format!("Failed to read {}: {}", path, e)))?;

        let bytes = result
            .bytes()
            .await
            .map_err(|e| HrrrError::StorageError(format!("Failed to read bytes: {}", e)))?;

        debug!(size = bytes.len(), "Read object");
        Ok(bytes)
    }

    /// Check if an object exists.
    pub async fn exists(&self, path: &str) -> HrrrResult<bool> {
        let location = Path::from(path);

        match self.store.head(&location).await {
            Ok(_) => Ok(true),
            Err(object_store::Error::NotFound { .. }) => Ok(false),
            Err(e) => Err(HrrrError::StorageError(format!(
                "Failed to check {}: {}",
                path, e
            ))),
        }
    }

    /// List object keys under a prefix.
    pub async fn list(&self, prefix: &str) -> HrrrResult<Vec<String>> {
        use futures::TryStreamExt;

        let prefix_path = Path::from(prefix);
        let mut paths = Vec::new();

        let mut stream = self.store.list(Some(&prefix_path));
        while let Some(meta) = stream
            .try_next()
            .await
            .map_err(|e| HrrrError::StorageError(format!("List failed: {}", e)))?
        {
            paths.push(meta.location.to_string());
        }

        Ok(paths)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_put_get_roundtrip() {
        let storage = ObjectStorage::in_memory();
        storage
            .put("CSV/hrrr.20240115/conus/hrrr.t12z.f00.csv", Bytes::from_static(b"a,b\n"))
            .await
            .unwrap();

        let data = storage
            .get("CSV/hrrr.20240115/conus/hrrr.t12z.f00.csv")
            .await
            .unwrap();
        assert_eq!(&data[..], b"a,b\n");
    }

    #[tokio::test]
    async fn test_exists_and_list() {
        let storage = ObjectStorage::in_memory();
        assert!(!storage.exists("CSV/x.csv").await.unwrap());

        storage.put("CSV/a/x.csv", Bytes::new()).await.unwrap();
        storage.put("CSV/b/y.csv", Bytes::new()).await.unwrap();
        storage.put("other/z.csv", Bytes::new()).await.unwrap();

        assert!(storage.exists("CSV/a/x.csv").await.unwrap());
        let mut keys = storage.list("CSV").await.unwrap();
        keys.sort();
        assert_eq!(keys, vec!["CSV/a/x.csv", "CSV/b/y.csv"]);
    }

    #[tokio::test]
    async fn test_missing_object_is_storage_error() {
        let storage = ObjectStorage::in_memory();
        let err = storage.get("nope").await.unwrap_err();
        assert!(err.is_storage());
    }
}
