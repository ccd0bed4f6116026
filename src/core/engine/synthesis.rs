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

//! Texture association, full synthesis and partial update

use super::Engine;
use crate::core::config::TextureFailurePolicy;
use crate::core::error::{EngineError, Result, TimError};
use crate::core::gpu::GpuBackend;
use crate::core::ot::{FrameBuffer, Node};
use crate::core::params::{ParamStore, PrimitiveType};

/// Outcome of a texture association pass
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TextureReport {
    /// Slots that received a texture handle
    pub textured: Vec<usize>,
    /// Slots whose image failed to upload, with the reason
    pub failed: Vec<(usize, TimError)>,
    /// Slots given an image they cannot use (unset or untextured type)
    pub ignored: Vec<usize>,
}

impl<G: GpuBackend> Engine<G> {
    /// Texture association pass
    ///
    /// Uploads the image of every slot that has one and stores the returned
    /// handle in the slot's parameters. Then, in every framebuffer, quads get
    /// the page and palette written into their packed record, and sprites get
    /// their palette plus a draw-page packet linked ahead of them.
    ///
    /// Slots with an image but no textured type are reported and skipped.
    ///
    /// # Arguments
    ///
    /// * `sources` - Raw TIM blob per slot; `None` for untextured slots.
    ///   Entries past the ordering table are ignored.
    ///
    /// # Errors
    ///
    /// Under [`TextureFailurePolicy::Abort`], the first malformed image stops
    /// the pass with [`EngineError::Texture`]. Under the default
    /// [`TextureFailurePolicy::SkipSlot`] the failure is logged and listed in
    /// the report.
    pub fn populate_tpage(&mut self, sources: &[Option<&[u8]>]) -> Result<TextureReport> {
        let mut report = TextureReport::default();
        let policy = self.config.engine.texture_failure;

        for (slot, image) in sources.iter().enumerate().take(self.params.len()) {
            let Some(blob) = image else {
                continue;
            };

            let handle = match self.textures.upload_texture(&mut self.gpu, blob) {
                Ok(handle) => handle,
                Err(source) => match policy {
                    TextureFailurePolicy::Abort => {
                        return Err(EngineError::Texture { slot, source });
                    }
                    TextureFailurePolicy::SkipSlot => {
                        log::warn!("Skipping texture for slot {}: {}", slot, source);
                        report.failed.push((slot, source));
                        continue;
                    }
                },
            };

            match self.params.get_mut(slot) {
                Some(param) => {
                    if param.set_texture_handle(handle) {
                        report.textured.push(slot);
                    } else {
                        log::warn!(
                            "Non-texture type {} at slot {}",
                            param.primitive_type(),
                            slot
                        );
                        report.ignored.push(slot);
                    }
                }
                None => {
                    log::warn!("Texture given for unset slot {}", slot);
                    report.ignored.push(slot);
                }
            }
        }

        for buffer in &mut self.buffers {
            for &slot in &report.textured {
                if let Some(param) = self.params.get(slot) {
                    if !buffer.apply_texture(slot, param) {
                        log::debug!(
                            "Slot {} not synthesized yet in buffer {}",
                            slot,
                            buffer.index()
                        );
                        continue;
                    }
                    link_sprite_page(buffer, slot);
                }
            }
        }

        log::info!(
            "Texture pass: {} textured, {} failed, {} ignored ({} uploads)",
            report.textured.len(),
            report.failed.len(),
            report.ignored.len(),
            self.textures.uploads()
        );
        Ok(report)
    }

    /// Full synthesis pass
    ///
    /// For every framebuffer: empty the ordering table, rebuild each slot's
    /// packed record from its parameters and link it into bucket = slot
    /// index. Sprites with a texture get their draw-page packet linked ahead
    /// of them in the same bucket.
    ///
    /// A slot without parameters is logged; whatever record it held before
    /// is linked again unchanged.
    pub fn populate_ot(&mut self) {
        let revision = self.params.revision();
        for buffer in &mut self.buffers {
            synthesize_buffer(buffer, &self.params);
            buffer.mark_synced(revision);
        }
        log::debug!(
            "Synthesized {} slots into {} buffers",
            self.params.len(),
            self.buffers.len()
        );
    }

    /// Partial update of the current framebuffer
    ///
    /// Re-runs the field writers (geometry, colors, texture coordinates) of
    /// every slot against the current buffer's packed records. Linkage is
    /// not touched. Slots whose record does not match their parameters are
    /// logged and left stale.
    pub fn update_prim(&mut self) {
        let revision = self.params.revision();
        let buffer = &mut self.buffers[self.current];
        refresh_fields(buffer, &self.params);
        buffer.mark_synced(revision);
    }
}

/// Rebuild and relink every slot of one buffer
fn synthesize_buffer(buffer: &mut FrameBuffer, params: &ParamStore) {
    buffer.clear_ot();
    for (slot, param) in params.iter() {
        match param {
            Some(param) => {
                let has_page = buffer.synthesize(slot, param);
                buffer.link_primitive(slot);
                if has_page {
                    buffer.link_page(slot);
                }
            }
            None => {
                log::error!("No primitive defined at slot {}", slot);
                if !buffer.primitive(slot).is_empty() {
                    buffer.link_primitive(slot);
                    if !buffer.page(slot).is_empty() {
                        buffer.link_page(slot);
                    }
                }
            }
        }
    }
}

/// Re-run the field writers of every set slot in one buffer
pub(super) fn refresh_fields(buffer: &mut FrameBuffer, params: &ParamStore) {
    for (slot, param) in params.iter() {
        let Some(param) = param else {
            continue;
        };
        if let Err(err) = buffer.update_fields(slot, param) {
            log::error!("Update skipped in buffer {}: {}", buffer.index(), err);
        }
    }
}

/// Link a sprite's draw page once, ahead of a sprite that is already linked
fn link_sprite_page(buffer: &mut FrameBuffer, slot: usize) {
    if buffer.primitive(slot).primitive_type() != Some(PrimitiveType::Sprite) {
        return;
    }
    let linked = buffer.bucket_entries(slot);
    if linked.contains(&Node::Primitive(slot)) && !linked.contains(&Node::DrawPage(slot)) {
        buffer.link_page(slot);
    }
}
