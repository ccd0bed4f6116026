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

//! Input/update loop
//!
//! Controls on pad 1:
//!
//! - Circle: select the next slot
//! - Cross: give the selected slot a random color
//! - D-pad: move the selected slot one pixel per frame
//!
//! Circle and cross share one debounce timer counted in vertical blanks.
//! Moves are accepted only while the primitive stays inside the screen.

use rand::Rng;

use super::Engine;
use crate::core::controller::{Buttons, InputSource, PadState};
use crate::core::error::Result;
use crate::core::gpu::{Color, GpuBackend, Vertex};
use crate::core::params::PrimitiveParam;

impl<G: GpuBackend> Engine<G> {
    /// Read both controller ports and advance the input source
    pub fn poll_input(&mut self, input: &mut dyn InputSource) {
        for (port, pad) in self.pads.iter_mut().enumerate() {
            *pad = PadState::decode(&input.poll(port));
        }
        input.advance();
    }

    /// Apply pad 1 to the selected slot, then run the partial update
    pub fn move_prim(&mut self) {
        let buttons = self.pads[0].buttons;
        let now = self.gpu.vblank_count();

        if buttons.circle && self.debounce_elapsed(now) {
            self.selected = (self.selected + 1) % self.params.len();
            self.prev_time = now;
            log::debug!("Selected slot {}", self.selected);
        }

        if buttons.cross && self.debounce_elapsed(now) {
            let color = Color::new(self.rng.gen(), self.rng.gen(), self.rng.gen());
            if let Some(param) = self.params.get_mut(self.selected) {
                param.set_color0(color);
            }
            self.prev_time = now;
        }

        let (width, height) = (self.config.display.width, self.config.display.height);
        if let Some(param) = self.params.get(self.selected) {
            let origin = nudge(param, &buttons, width, height);
            if origin != param.origin {
                if let Some(param) = self.params.get_mut(self.selected) {
                    param.origin = origin;
                }
            }
        }

        self.update_prim();
    }

    /// One iteration of the frame loop: display, read input, apply it
    pub fn run_frame(&mut self, input: &mut dyn InputSource) -> Result<()> {
        self.display()?;
        self.poll_input(input);
        self.move_prim();
        Ok(())
    }

    fn debounce_elapsed(&self, now: u32) -> bool {
        self.prev_time == 0 || now.wrapping_sub(self.prev_time) > self.config.engine.debounce_ticks
    }
}

/// Origin after applying the held directions, one pixel each
///
/// Each direction is checked against the position left by the previous
/// one. A move is dropped if it would put the origin below zero or the far
/// edge on or past the screen edge.
fn nudge(param: &PrimitiveParam, buttons: &Buttons, width: u16, height: u16) -> Vertex {
    let (mut x, mut y) = (i32::from(param.origin.x), i32::from(param.origin.y));
    let (w, h) = (i32::from(param.size.w), i32::from(param.size.h));
    let (width, height) = (i32::from(width), i32::from(height));

    if buttons.up && y > 0 {
        y -= 1;
    }
    if buttons.right && x + 1 + w < width {
        x += 1;
    }
    if buttons.down && y + 1 + h < height {
        y += 1;
    }
    if buttons.left && x > 0 {
        x -= 1;
    }

    // Bounded by the screen size, which fits in i16.
    Vertex::new(x as i16, y as i16)
}
