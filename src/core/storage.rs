// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 itsakeyfut
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Storage device collaborator
//!
//! Texture images are read from a disc-like device addressed with ISO9660
//! style paths such as `\DATA\IMAGE.TIM;1`. [`HostStorage`] serves those
//! paths from a directory on the host.

use std::io;
use std::path::{Path, PathBuf};

use super::error::{EngineError, Result};

/// Logical sector size of the data track
pub const SECTOR_SIZE: usize = 2048;

/// Read-only file access on the storage device
pub trait Storage {
    /// Read a whole file
    ///
    /// # Errors
    ///
    /// [`EngineError::NotFound`] if the file cannot be located,
    /// [`EngineError::Storage`] if it cannot be read.
    fn read_file(&mut self, path: &str) -> Result<Vec<u8>>;
}

/// Storage device backed by a host directory
#[derive(Debug, Clone)]
pub struct HostStorage {
    root: PathBuf,
}

impl HostStorage {
    /// Serve files below `root`
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Directory the device is rooted at
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Host path a device path resolves to
    pub fn resolve(&self, path: &str) -> PathBuf {
        self.root.join(normalize_disc_path(path))
    }
}

impl Storage for HostStorage {
    fn read_file(&mut self, path: &str) -> Result<Vec<u8>> {
        let host_path = self.resolve(path);
        let data = std::fs::read(&host_path).map_err(|source| {
            if source.kind() == io::ErrorKind::NotFound {
                EngineError::NotFound {
                    path: path.to_string(),
                }
            } else {
                EngineError::Storage {
                    path: host_path.clone(),
                    source,
                }
            }
        })?;

        log::info!(
            "Read {}: {} bytes, {} sectors",
            path,
            data.len(),
            sector_count(data.len())
        );
        Ok(data)
    }
}

/// Convert a device path to a relative host path
///
/// Backslashes become separators, leading separators are dropped and the
/// `;1` version suffix is removed.
///
/// # Arguments
///
/// * `path` - Device path, e.g. `\DATA\IMAGE.TIM;1`
///
/// # Returns
///
/// Relative path, e.g. `DATA/IMAGE.TIM`
///
/// # Example
///
/// ```
/// use psot::core::storage::normalize_disc_path;
///
/// assert_eq!(
///     normalize_disc_path("\\DATA\\IMAGE.TIM;1"),
///     std::path::PathBuf::from("DATA/IMAGE.TIM")
/// );
/// ```
pub fn normalize_disc_path(path: &str) -> PathBuf {
    let without_version = match path.rfind(';') {
        Some(pos) => &path[..pos],
        None => path,
    };
    without_version
        .split(['\\', '/'])
        .filter(|part| !part.is_empty())
        .collect()
}

/// Number of whole sectors needed to hold `bytes`
pub fn sector_count(bytes: usize) -> usize {
    bytes.div_ceil(SECTOR_SIZE)
}
