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

//! Framebuffer snapshots and frame traces

use std::io;
use std::path::Path;

use image::RgbImage;

use crate::core::error::{EngineError, Result};
use crate::core::gpu::HeadlessGpu;

/// Save the displayed area as a PNG
///
/// # Errors
///
/// [`EngineError::Storage`] if the image cannot be encoded or written.
pub fn save_png(gpu: &HeadlessGpu, path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    let area = gpu.display_area();
    let storage_error = |source: io::Error| EngineError::Storage {
        path: path.to_path_buf(),
        source,
    };

    let image = RgbImage::from_raw(
        u32::from(area.width),
        u32::from(area.height),
        gpu.get_framebuffer(),
    )
    .ok_or_else(|| {
        storage_error(io::Error::new(
            io::ErrorKind::InvalidData,
            "framebuffer does not match the display area",
        ))
    })?;
    image.save(path).map_err(|e| storage_error(io::Error::other(e)))?;

    log::info!(
        "Saved {}x{} snapshot to {}",
        area.width,
        area.height,
        path.display()
    );
    Ok(())
}

/// Write the commands drawn in the last frame as JSON
pub fn write_trace(gpu: &HeadlessGpu, path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    let storage_error = |source: io::Error| EngineError::Storage {
        path: path.to_path_buf(),
        source,
    };
    let json = serde_json::to_string_pretty(gpu.frame_log())
        .map_err(|e| storage_error(io::Error::other(e)))?;
    std::fs::write(path, json).map_err(storage_error)?;
    log::info!(
        "Wrote {} draw commands to {}",
        gpu.frame_log().len(),
        path.display()
    );
    Ok(())
}
