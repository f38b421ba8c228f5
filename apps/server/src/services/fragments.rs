// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Directory-backed fragment store.
//!
//! Each fragment is a pre-extracted tape file named `<express id>.tape`.

use crate::error::ApiError;
use bytes::Bytes;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// File extension of fragment files.
pub const FRAGMENT_EXTENSION: &str = "tape";

/// Fragment files in one directory.
#[derive(Debug, Clone)]
pub struct FragmentStore {
    dir: PathBuf,
}

impl FragmentStore {
    /// Create a store over `dir`, creating the directory if needed.
    pub async fn new(dir: impl Into<PathBuf>) -> Self {
        let dir = dir.into();
        if let Err(e) = tokio::fs::create_dir_all(&dir).await {
            tracing::warn!(
                error = %e,
                path = %dir.display(),
                "Failed to create fragment directory"
            );
        }
        Self { dir }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the fragment for `express_id`.
    pub fn fragment_path(&self, express_id: u32) -> PathBuf {
        self.dir.join(format!("{}.{}", express_id, FRAGMENT_EXTENSION))
    }

    /// Read the fragment for `express_id`.
    pub async fn read(&self, express_id: u32) -> Result<Bytes, ApiError> {
        match tokio::fs::read(self.fragment_path(express_id)).await {
            Ok(data) => Ok(Bytes::from(data)),
            Err(e) if e.kind() == ErrorKind::NotFound => Err(ApiError::FragmentNotFound(express_id)),
            Err(e) => Err(e.into()),
        }
    }

    /// Express IDs of all stored fragments, ascending.
    pub async fn list(&self) -> Result<Vec<u32>, ApiError> {
        let mut entries = tokio::fs::read_dir(&self.dir).await?;
        let mut ids = Vec::new();

        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some(FRAGMENT_EXTENSION) {
                continue;
            }
            if let Some(id) = path
                .file_stem()
                .and_then(|s| s.to_str())
                .and_then(|s| s.parse().ok())
            {
                ids.push(id);
            }
        }

        ids.sort_unstable();
        Ok(ids)
    }
}
