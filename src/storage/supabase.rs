// ABOUTME: Supabase Storage client uploading objects to a bucket over its REST API
// ABOUTME: Sends x-upsert false so existing objects are never replaced
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Karetek Health

use std::time::Duration;

use async_trait::async_trait;
use karetek_core::errors::{AppError, AppResult};
use reqwest::{Client, StatusCode};
use tracing::{debug, error, instrument};

use super::{validate_key, ObjectStorage, ObjectUpload};

const SERVICE_NAME: &str = "Supabase Storage";
const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Supabase Storage bucket client
pub struct SupabaseObjectStorage {
    client: Client,
    project_url: String,
    service_key: String,
    bucket: String,
}

impl SupabaseObjectStorage {
    /// Create a client for `bucket` in the project at `project_url`
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be created.
    pub fn new(project_url: &str, service_key: &str, bucket: &str) -> AppResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .map_err(|e| AppError::internal(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            project_url: project_url.trim_end_matches('/').to_owned(),
            service_key: service_key.to_owned(),
            bucket: bucket.to_owned(),
        })
    }

    fn upload_url(&self, key: &str) -> String {
        format!("{}/storage/v1/object/{}/{key}", self.project_url, self.bucket)
    }

    fn public_url(&self, key: &str) -> String {
        format!(
            "{}/storage/v1/object/public/{}/{key}",
            self.project_url, self.bucket
        )
    }
}

#[async_trait]
impl ObjectStorage for SupabaseObjectStorage {
    fn name(&self) -> &'static str {
        "supabase"
    }

    #[instrument(skip(self, upload), fields(key = %upload.key, size = upload.bytes.len()))]
    async fn put(&self, upload: ObjectUpload) -> AppResult<String> {
        validate_key(&upload.key)?;

        let response = self
            .client
            .post(self.upload_url(&upload.key))
            .bearer_auth(&self.service_key)
            .header("apikey", &self.service_key)
            .header("Content-Type", upload.content_type)
            .header("cache-control", format!("max-age={}", upload.cache_control_secs))
            .header("x-upsert", "false")
            .body(upload.bytes)
            .send()
            .await
            .map_err(|e| {
                error!("Failed to reach {SERVICE_NAME}: {e}");
                AppError::storage(format!("{SERVICE_NAME} request failed: {e}"))
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let detail = body.chars().take(200).collect::<String>();
            return Err(if status == StatusCode::CONFLICT || body.contains("Duplicate") {
                AppError::already_exists(format!("Object {} already exists", upload.key))
            } else {
                AppError::storage(format!("{SERVICE_NAME} upload failed ({status}): {detail}"))
            });
        }

        debug!("Uploaded object to {SERVICE_NAME}");
        Ok(self.public_url(&upload.key))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_urls() {
        let storage =
            SupabaseObjectStorage::new("https://abc.supabase.co/", "service", "avatar-audio")
                .unwrap();
        assert_eq!(
            storage.upload_url("audio/1-en.mp3"),
            "https://abc.supabase.co/storage/v1/object/avatar-audio/audio/1-en.mp3"
        );
        assert_eq!(
            storage.public_url("audio/1-en.mp3"),
            "https://abc.supabase.co/storage/v1/object/public/avatar-audio/audio/1-en.mp3"
        );
    }
}
