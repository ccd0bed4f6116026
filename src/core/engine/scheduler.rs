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

//! Frame scheduler
//!
//! One `display` call presents the buffer that was just built and makes the
//! next buffer in the ring the build target:
//!
//! ```text
//! DrawSync (bounded) → VSync → PutDrawEnv/PutDispEnv(current) → DrawOTag(current)
//!     → swap → status text
//! ```
//!
//! The buffer handed to the GPU is never written again until it comes round
//! as the build target, by which point the draw-sync wait at the start of a
//! later `display` has retired it.

use super::synthesis::refresh_fields;
use super::Engine;
use crate::core::config::StaleBufferPolicy;
use crate::core::error::{EngineError, Result};
use crate::core::gpu::GpuBackend;

impl<G: GpuBackend> Engine<G> {
    /// Present the current buffer and flip
    ///
    /// # Errors
    ///
    /// [`EngineError::Timeout`] if the GPU does not drain its draw queue
    /// within `sync_poll_limit` polls. Nothing is submitted and the current
    /// buffer does not change in that case.
    pub fn display(&mut self) -> Result<()> {
        self.wait_draw_idle()?;
        self.gpu.wait_vblank();

        // VRAM halves follow flip parity, not ring position.
        self.buffers[self.current].place((self.frames % 2) as usize);
        let buffer = &self.buffers[self.current];
        self.gpu.put_draw_env(buffer.draw_env());
        self.gpu.put_disp_env(buffer.disp_env());
        self.gpu.draw_ot(buffer);

        self.swap_buffers();

        let text = self.status.render(self.config.text.max_chars);
        self.gpu.print_text(&text);
        self.gpu.flush_text();

        self.frames += 1;
        log::trace!(
            "Frame {} presented, building buffer {}",
            self.frames,
            self.current
        );
        Ok(())
    }

    /// Poll draw-sync until the queue is empty or the limit runs out
    fn wait_draw_idle(&mut self) -> Result<()> {
        let limit = self.config.engine.sync_poll_limit.max(1);
        for _ in 0..limit {
            if self.gpu.draw_sync() == 0 {
                return Ok(());
            }
        }
        log::error!("DrawSync still busy after {} polls", limit);
        Err(EngineError::Timeout {
            operation: "DrawSync",
            attempts: limit,
        })
    }

    /// Make the next buffer in the ring current
    ///
    /// Under [`StaleBufferPolicy::RefreshOnSwap`] a buffer that is behind the
    /// parameter store has its field writers re-run before anything else
    /// touches it.
    fn swap_buffers(&mut self) {
        self.current = (self.current + 1) % self.buffers.len();

        let revision = self.params.revision();
        let buffer = &mut self.buffers[self.current];
        if self.config.engine.stale_buffer == StaleBufferPolicy::RefreshOnSwap
            && buffer.synced_revision() != revision
        {
            log::debug!(
                "Refreshing buffer {} (revision {} -> {})",
                buffer.index(),
                buffer.synced_revision(),
                revision
            );
            refresh_fields(buffer, &self.params);
            buffer.mark_synced(revision);
        }
    }
}
