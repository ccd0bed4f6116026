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

//! Unit tests for FrameTimer and PacedGpu

use crate::core::config::EngineConfig;
use crate::core::engine::Engine;
use crate::core::gpu::{GpuBackend, HeadlessGpu};
use crate::core::video::VideoMode;
use crate::frontend::frame_timer::{FrameTimer, PacedGpu};
use std::thread;
use std::time::{Duration, Instant};

#[test]
fn test_frame_timer_new() {
    let timer = FrameTimer::new(60.0);
    assert_eq!(timer.fps(), 0.0);
    assert_eq!(timer.frame_time_ms(), 0.0);
    assert_eq!(timer.frame_count(), 0);
}

#[test]
fn test_frame_timer_tick() {
    let mut timer = FrameTimer::new(60.0);

    thread::sleep(Duration::from_millis(20));

    timer.tick();
    assert_eq!(timer.frame_count(), 1);
    assert!(timer.frame_time_ms() > 0.0);
}

#[test]
fn test_wait_for_next_frame_sleeps_until_due() {
    let timer = FrameTimer::new(100.0);
    timer.wait_for_next_frame();
    assert!(timer.should_run_frame());
}

#[test]
fn test_paced_gpu_forwards_and_counts() {
    let mut gpu = PacedGpu::new(HeadlessGpu::new());
    gpu.set_video_mode(VideoMode::Pal);
    assert_eq!(gpu.timer().target_frame_time(), Duration::from_millis(20));

    let start = Instant::now();
    gpu.wait_vblank();
    gpu.wait_vblank();
    assert!(start.elapsed() >= Duration::from_millis(20));
    assert_eq!(gpu.vblank_count(), 2);
    assert_eq!(gpu.timer().frame_count(), 2);
    assert_eq!(gpu.inner().video_mode(), VideoMode::Pal);
}

#[test]
fn test_engine_over_paced_gpu() {
    let mut config = EngineConfig::default();
    config.engine.primitives = 2;
    let mut engine = Engine::new(config, PacedGpu::new(HeadlessGpu::new())).unwrap();
    engine.populate_ot();
    engine.display().unwrap();
    engine.display().unwrap();

    let gpu = engine.into_gpu().into_inner();
    assert_eq!(gpu.flips(), 2);
}
