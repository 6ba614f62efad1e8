// src/media/mod.rs

//! Media store seam: turns stored object paths into expiring signed URLs.

use std::time::Duration;

use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_credential_types::Credentials;
use aws_sdk_s3::{Client, presigning::PresigningConfig};

use crate::config::S3Config;

#[async_trait]
pub trait MediaStore: Send + Sync {
    /// Returns `None` when the path is blank or the store cannot sign it.
    async fn create_signed_url(&self, bucket: &str, path: &str, ttl: Duration) -> Option<String>;
}

/// S3-compatible media store using presigned GET requests.
#[derive(Debug, Clone)]
pub struct S3MediaStore {
    client: Client,
}

impl S3MediaStore {
    pub async fn from_config(s3: &S3Config) -> Option<Self> {
        if !s3.is_configured() {
            return None;
        }

        let creds = Credentials::new(
            s3.access_key.clone(),
            s3.secret_key.clone(),
            None,
            None,
            "mastery-static",
        );

        let mut loader = aws_config::defaults(BehaviorVersion::latest())
            .region(aws_config::Region::new(s3.region.clone()))
            .credentials_provider(creds);
        if !s3.endpoint.is_empty() {
            loader = loader.endpoint_url(s3.endpoint.clone());
        }
        let config = loader.load().await;

        Some(Self {
            client: Client::new(&config),
        })
    }
}

#[async_trait]
impl MediaStore for S3MediaStore {
    async fn create_signed_url(&self, bucket: &str, path: &str, ttl: Duration) -> Option<String> {
        let key = path.trim().trim_start_matches('/');
        if key.is_empty() {
            return None;
        }

        let presigning = match PresigningConfig::expires_in(ttl) {
            Ok(cfg) => cfg,
            Err(e) => {
                tracing::warn!(error = %e, "Invalid signed URL lifetime");
                return None;
            }
        };

        match self
            .client
            .get_object()
            .bucket(bucket)
            .key(key)
            .presigned(presigning)
            .await
        {
            Ok(presigned) => Some(presigned.uri().to_string()),
            Err(e) => {
                tracing::warn!(error = %e, key, "Failed to sign media URL");
                None
            }
        }
    }
}

/// Used when no bucket is configured: every path resolves to no media.
#[derive(Debug, Clone, Copy, Default)]
pub struct DisabledMediaStore;

#[async_trait]
impl MediaStore for DisabledMediaStore {
    async fn create_signed_url(&self, _bucket: &str, _path: &str, _ttl: Duration) -> Option<String> {
        None
    }
}
