// ABOUTME: Filesystem object storage writing under a root directory
// ABOUTME: Uses create-new semantics so an existing object is never overwritten
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Karetek Health

use std::io::ErrorKind;
use std::path::PathBuf;

use async_trait::async_trait;
use karetek_core::errors::{AppError, AppResult};
use tokio::fs::{self, OpenOptions};
use tokio::io::AsyncWriteExt;
use tracing::debug;

use super::{validate_key, ObjectStorage, ObjectUpload};

/// Object storage on local disk
pub struct LocalObjectStorage {
    root: PathBuf,
    public_base_url: String,
}

impl LocalObjectStorage {
    /// Store objects under `root`, publishing them at `public_base_url/<key>`
    #[must_use]
    pub fn new(root: PathBuf, public_base_url: impl Into<String>) -> Self {
        Self {
            root,
            public_base_url: public_base_url.into(),
        }
    }
}

#[async_trait]
impl ObjectStorage for LocalObjectStorage {
    fn name(&self) -> &'static str {
        "local"
    }

    async fn put(&self, upload: ObjectUpload) -> AppResult<String> {
        validate_key(&upload.key)?;
        let path = self.root.join(&upload.key);

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await.map_err(|e| {
                AppError::storage(format!("Failed to create {}: {e}", parent.display()))
            })?;
        }

        let mut file = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .await
            .map_err(|e| {
                if e.kind() == ErrorKind::AlreadyExists {
                    AppError::already_exists(format!("Object {} already exists", upload.key))
                } else {
                    AppError::storage(format!("Failed to open {}: {e}", path.display()))
                }
            })?;
        file.write_all(&upload.bytes)
            .await
            .map_err(|e| AppError::storage(format!("Failed to write {}: {e}", path.display())))?;
        file.flush()
            .await
            .map_err(|e| AppError::storage(format!("Failed to flush {}: {e}", path.display())))?;

        debug!("Stored {} bytes at {}", upload.bytes.len(), path.display());
        Ok(format!(
            "{}/{}",
            self.public_base_url.trim_end_matches('/'),
            upload.key
        ))
    }
}
