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

//! Engine scenario tests

mod pipeline;
mod update;

use crate::core::config::EngineConfig;
use crate::core::engine::Engine;
use crate::core::gpu::{Color, Dimensions, HeadlessGpu, Vertex};
use crate::core::params::PrimitiveParam;
use crate::core::texture::TIM_MAGIC;

/// Engine over a headless GPU with `slots` slots and the given tweaks
fn engine_with(slots: usize, tweak: impl FnOnce(&mut EngineConfig)) -> Engine<HeadlessGpu> {
    let mut config = EngineConfig::default();
    config.engine.primitives = slots;
    tweak(&mut config);
    Engine::new(config, HeadlessGpu::new()).unwrap()
}

fn engine(slots: usize) -> Engine<HeadlessGpu> {
    engine_with(slots, |_| {})
}

fn palette(slot: usize) -> Color {
    let n = slot as u8;
    Color::new(40 * n + 10, 255 - 30 * n, 7 * n)
}

fn flat(x: i16, y: i16, w: u16, h: u16, color: Color) -> PrimitiveParam {
    PrimitiveParam::flat_quad(Vertex::new(x, y), Dimensions::new(w, h), color)
}

/// Fill every slot with a distinct flat quad
fn fill_flat(engine: &mut Engine<HeadlessGpu>) {
    for slot in 0..engine.ot_size() {
        let offset = (slot * 10) as i16;
        engine
            .set_param(slot, flat(offset, offset, 20, 20, palette(slot)))
            .unwrap();
    }
}

fn tim_block(x: u16, y: u16, w: u16, h: u16, fill: u16) -> Vec<u8> {
    let mut out = (12 + w as u32 * h as u32 * 2).to_le_bytes().to_vec();
    for v in [x, y, w, h] {
        out.extend_from_slice(&v.to_le_bytes());
    }
    for _ in 0..(w as usize * h as usize) {
        out.extend_from_slice(&fill.to_le_bytes());
    }
    out
}

/// 4-bit 16×16 TIM: pixels at (640, 256), palette at (0, 480)
///
/// Page id 0x001A, palette id 0x7800.
fn tim_4bit() -> Vec<u8> {
    let mut blob = TIM_MAGIC.to_le_bytes().to_vec();
    blob.extend_from_slice(&(1u32 << 3).to_le_bytes());
    blob.extend(tim_block(0, 480, 16, 1, 0x001F));
    blob.extend(tim_block(640, 256, 4, 16, 0x1111));
    blob
}

/// 15-bit 8×8 TIM at (768, 0): page id 0x010C, no palette
fn tim_15bit() -> Vec<u8> {
    let mut blob = TIM_MAGIC.to_le_bytes().to_vec();
    blob.extend_from_slice(&2u32.to_le_bytes());
    blob.extend(tim_block(768, 0, 8, 8, 0x03E0));
    blob
}
