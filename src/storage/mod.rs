// ABOUTME: Object storage abstraction for synthesized avatar audio
// ABOUTME: Uploads bytes under a key without overwriting and returns a public URL
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Karetek Health

//! # Object Storage
//!
//! Two backends are available, selected by `STORAGE_BACKEND`:
//! - `local`: files under `STORAGE_LOCAL_DIR`, served by the HTTP server at `/media`
//! - `supabase`: a Supabase Storage bucket

mod local;
mod supabase;

pub use local::LocalObjectStorage;
pub use supabase::SupabaseObjectStorage;

use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use karetek_core::errors::{AppError, AppResult};

use crate::config::{StorageBackend, StorageConfig};

/// Content written by one upload
#[derive(Debug, Clone)]
pub struct ObjectUpload {
    /// Object key relative to the bucket, e.g. `audio/1700000000000-en.mp3`
    pub key: String,
    /// Object bytes
    pub bytes: Bytes,
    /// MIME type
    pub content_type: &'static str,
    /// `Cache-Control: max-age` in seconds
    pub cache_control_secs: u32,
}

/// Write-once object store
#[async_trait]
pub trait ObjectStorage: Send + Sync {
    /// Backend identifier
    fn name(&self) -> &'static str;

    /// Store `upload` and return its public URL
    ///
    /// # Errors
    ///
    /// Fails with `ResourceAlreadyExists` if the key is taken and
    /// `StorageError` for any backend failure
    async fn put(&self, upload: ObjectUpload) -> AppResult<String>;
}

/// Build the configured storage backend
///
/// # Errors
///
/// Returns an error if the Supabase backend lacks credentials or its HTTP
/// client cannot be built
pub fn create_storage(config: &StorageConfig) -> AppResult<Arc<dyn ObjectStorage>> {
    match config.backend {
        StorageBackend::Local => Ok(Arc::new(LocalObjectStorage::new(
            config.local_dir.join(&config.bucket),
            format!("{}/{}", config.public_base_url.trim_end_matches('/'), config.bucket),
        ))),
        StorageBackend::Supabase => {
            let (Some(url), Some(key)) = (
                config.supabase_url.as_deref(),
                config.supabase_service_key.as_deref(),
            ) else {
                return Err(AppError::config(
                    "SUPABASE_URL and SUPABASE_SERVICE_KEY are required for supabase storage",
                ));
            };
            Ok(Arc::new(SupabaseObjectStorage::new(url, key, &config.bucket)?))
        }
    }
}

/// Reject keys that could escape the bucket
pub(crate) fn validate_key(key: &str) -> AppResult<()> {
    let bad = key.is_empty()
        || key.starts_with('/')
        || key.contains('\\')
        || key.split('/').any(|part| part.is_empty() || part == "." || part == "..");
    if bad {
        return Err(AppError::invalid_input(format!("Invalid object key: {key}")));
    }
    Ok(())
}
