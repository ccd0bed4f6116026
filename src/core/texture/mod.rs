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

//! Texture cache
//!
//! Loads TIM images from a [`Storage`] device and uploads their pixel and
//! palette blocks to VRAM through the [`GpuBackend`]. The result of an upload
//! is a [`TextureHandle`]: the page id and palette id the GPU needs to sample
//! the texture.

mod tim;

use serde::{Deserialize, Serialize};

pub use tim::{ImageBlock, TimImage, TIM_MAGIC};

use super::error::{Result, TimError};
use super::gpu::GpuBackend;
use super::storage::Storage;

/// Page id and palette id of an uploaded texture
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct TextureHandle {
    /// Texture page id
    pub tpage: u16,
    /// Palette (CLUT) id, 0 for direct-color textures
    pub clut: u16,
}

/// Texture uploader
///
/// Every upload is written to VRAM, including a blob uploaded before. The
/// last upload to a rectangle is the one sampled.
#[derive(Debug, Default)]
pub struct TextureCache {
    uploads: usize,
    last: Option<TextureHandle>,
}

impl TextureCache {
    /// Create an empty cache
    pub fn new() -> Self {
        Self::default()
    }

    /// Read a raw image blob from the storage device
    ///
    /// # Errors
    ///
    /// Propagates [`EngineError::NotFound`](super::error::EngineError::NotFound)
    /// and [`EngineError::Storage`](super::error::EngineError::Storage); the
    /// caller must not upload anything on failure.
    pub fn load_image_from_storage(storage: &mut dyn Storage, path: &str) -> Result<Vec<u8>> {
        let blob = storage.read_file(path)?;
        log::info!("Loaded image {} ({} bytes)", path, blob.len());
        Ok(blob)
    }

    /// Parse a TIM blob and upload it to VRAM
    ///
    /// The pixel block goes to the rectangle named in its header, then the
    /// palette block (if any) to its own rectangle.
    ///
    /// # Errors
    ///
    /// Returns the [`TimError`] describing a malformed blob; VRAM is not
    /// modified in that case.
    pub fn upload_texture<G: GpuBackend + ?Sized>(
        &mut self,
        gpu: &mut G,
        blob: &[u8],
    ) -> std::result::Result<TextureHandle, TimError> {
        let tim = TimImage::parse(blob)?;
        gpu.load_image(tim.pixels.rect, &tim.pixels.data);
        if let Some(clut) = &tim.clut {
            gpu.load_image(clut.rect, &clut.data);
        }

        let handle = TextureHandle {
            tpage: tim.tpage_id(),
            clut: tim.clut_id(),
        };
        log::info!(
            "Uploaded {:?} texture at ({}, {}) {}x{}: tpage=0x{:04X} clut=0x{:04X}",
            tim.depth,
            tim.pixels.rect.x,
            tim.pixels.rect.y,
            tim.pixels.rect.w,
            tim.pixels.rect.h,
            handle.tpage,
            handle.clut
        );

        self.uploads += 1;
        self.last = Some(handle);
        Ok(handle)
    }

    /// Number of successful uploads
    pub fn uploads(&self) -> usize {
        self.uploads
    }

    /// Handle of the most recent successful upload
    pub fn last_handle(&self) -> Option<TextureHandle> {
        self.last
    }
}
