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

//! Frame pacing
//!
//! The headless GPU counts vertical blanks instantly. [`PacedGpu`] wraps any
//! backend and holds each `wait_vblank` back to the field rate of the video
//! mode, so a demo runs at 60 (NTSC) or 50 (PAL) frames per second.

use std::thread;
use std::time::{Duration, Instant};

use crate::core::gpu::{DispEnv, DrawEnv, GpuBackend, Rect};
use crate::core::ot::FrameBuffer;
use crate::core::video::VideoMode;

/// Frame timer for field-rate pacing
///
/// Tracks frame time and FPS and tells when the next frame is due.
///
/// # Example
///
/// ```
/// use psot::core::video::VideoMode;
/// use psot::frontend::FrameTimer;
///
/// let mut timer = FrameTimer::for_video_mode(VideoMode::Pal);
/// timer.wait_for_next_frame();
/// timer.tick();
/// assert_eq!(timer.frame_count(), 1);
/// ```
pub struct FrameTimer {
    /// Target frame time
    target_frame_time: Duration,
    /// Time when the last frame was executed
    last_frame: Instant,
    /// Total number of frames executed
    frame_count: u64,
    /// Current FPS (frames per second)
    fps: f32,
    /// Current frame time in milliseconds
    frame_time_ms: f32,
    /// Time when FPS calculation started
    fps_start: Instant,
    /// Frames since last FPS calculation
    fps_frame_count: u64,
}

impl FrameTimer {
    /// Create a timer for `target_fps` frames per second
    ///
    /// Rates below 1 are treated as 1.
    pub fn new(target_fps: f64) -> Self {
        let target_frame_time = Duration::from_secs_f64(1.0 / target_fps.max(1.0));
        let now = Instant::now();

        Self {
            target_frame_time,
            last_frame: now,
            frame_count: 0,
            fps: 0.0,
            frame_time_ms: 0.0,
            fps_start: now,
            fps_frame_count: 0,
        }
    }

    /// Create a timer running at the field rate of `mode`
    pub fn for_video_mode(mode: VideoMode) -> Self {
        Self::new(mode.frame_rate())
    }

    /// Update frame timing after executing a frame
    ///
    /// FPS is recomputed roughly once per second.
    pub fn tick(&mut self) {
        let now = Instant::now();
        let elapsed = now.duration_since(self.last_frame);

        self.frame_time_ms = elapsed.as_secs_f32() * 1000.0;

        self.frame_count += 1;
        self.fps_frame_count += 1;

        let fps_elapsed = now.duration_since(self.fps_start);
        if fps_elapsed >= Duration::from_secs(1) {
            self.fps = self.fps_frame_count as f32 / fps_elapsed.as_secs_f32();
            self.fps_frame_count = 0;
            self.fps_start = now;
        }

        self.last_frame = now;
    }

    /// Whether the next frame is due
    #[inline(always)]
    pub fn should_run_frame(&self) -> bool {
        Instant::now().duration_since(self.last_frame) >= self.target_frame_time
    }

    /// Instant the next frame is due
    #[inline(always)]
    pub fn next_frame_instant(&self) -> Instant {
        self.last_frame + self.target_frame_time
    }

    /// Sleep until the next frame is due
    pub fn wait_for_next_frame(&self) {
        let remaining = self.next_frame_instant().saturating_duration_since(Instant::now());
        if !remaining.is_zero() {
            thread::sleep(remaining);
        }
    }

    /// Target frame time
    #[inline(always)]
    pub fn target_frame_time(&self) -> Duration {
        self.target_frame_time
    }

    /// Most recent FPS, updated about once per second
    #[inline(always)]
    pub fn fps(&self) -> f32 {
        self.fps
    }

    /// Duration of the last frame in milliseconds
    #[inline(always)]
    pub fn frame_time_ms(&self) -> f32 {
        self.frame_time_ms
    }

    /// Total frames executed
    #[inline(always)]
    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }
}

impl Default for FrameTimer {
    fn default() -> Self {
        Self::for_video_mode(VideoMode::Ntsc)
    }
}

/// GPU backend whose vertical blanks arrive in real time
///
/// Every call is forwarded to the wrapped backend; `wait_vblank` first sleeps
/// until the next field is due. `set_video_mode` retunes the pacing.
pub struct PacedGpu<G: GpuBackend> {
    inner: G,
    timer: FrameTimer,
}

impl<G: GpuBackend> PacedGpu<G> {
    /// Pace `inner` at NTSC rate until a video mode is set
    pub fn new(inner: G) -> Self {
        Self {
            inner,
            timer: FrameTimer::default(),
        }
    }

    /// Wrapped backend
    pub fn inner(&self) -> &G {
        &self.inner
    }

    /// Frame timing statistics
    pub fn timer(&self) -> &FrameTimer {
        &self.timer
    }

    /// Unwrap the backend
    pub fn into_inner(self) -> G {
        self.inner
    }
}

impl<G: GpuBackend> GpuBackend for PacedGpu<G> {
    fn reset(&mut self) {
        self.inner.reset();
    }

    fn set_video_mode(&mut self, mode: VideoMode) {
        self.timer = FrameTimer::for_video_mode(mode);
        self.inner.set_video_mode(mode);
    }

    fn draw_sync(&mut self) -> usize {
        self.inner.draw_sync()
    }

    fn wait_vblank(&mut self) {
        self.timer.wait_for_next_frame();
        self.timer.tick();
        self.inner.wait_vblank();
    }

    fn vblank_count(&self) -> u32 {
        self.inner.vblank_count()
    }

    fn put_draw_env(&mut self, env: &DrawEnv) {
        self.inner.put_draw_env(env);
    }

    fn put_disp_env(&mut self, env: &DispEnv) {
        self.inner.put_disp_env(env);
    }

    fn write_gp0(&mut self, word: u32) {
        self.inner.write_gp0(word);
    }

    fn draw_ot(&mut self, buffer: &FrameBuffer) {
        self.inner.draw_ot(buffer);
    }

    fn load_image(&mut self, rect: Rect, pixels: &[u16]) {
        self.inner.load_image(rect, pixels);
    }

    fn print_text(&mut self, text: &str) {
        self.inner.print_text(text);
    }

    fn flush_text(&mut self) {
        self.inner.flush_text();
    }

    fn set_display_mask(&mut self, enabled: bool) {
        self.inner.set_display_mask(enabled);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_target_frame_time_follows_video_mode() {
        let ntsc = FrameTimer::for_video_mode(VideoMode::Ntsc);
        let pal = FrameTimer::for_video_mode(VideoMode::Pal);
        assert_eq!(pal.target_frame_time(), Duration::from_millis(20));
        assert!(ntsc.target_frame_time() < pal.target_frame_time());
    }

    #[test]
    fn test_zero_rate_is_clamped() {
        let timer = FrameTimer::new(0.0);
        assert_eq!(timer.target_frame_time(), Duration::from_secs(1));
    }
}
