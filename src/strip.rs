/*
 *  strip.rs
 *
 *  MoonRingS - every print gets a halo
 *  (c) 2023-26 Piotr Malczak
 *
 *  Pixel strip abstraction plus an in-memory strip for tests and
 *  hardware-free development
 *
 *  This program is free software: you can redistribute it and/or modify
 *  it under the terms of the GNU General Public License as published by
 *  the Free Software Foundation, either version 3 of the License, or
 *  (at your option) any later version.
 *
 *  This program is distributed in the hope that it will be useful,
 *  but WITHOUT ANY WARRANTY; without even the implied warranty of
 *  MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
 *  GNU General Public License for more details.
 *
 *  See <http://www.gnu.org/licenses/> to get a copy of the GNU General
 *  Public License.
 *
 */

use std::sync::{Arc, Mutex};

use thiserror::Error;

use crate::color::{BLACK, RGB8};

/// Error type for strip commit operations.
#[derive(Debug, Error)]
pub enum StripError {
    #[error("SPI transfer failed: {0}")]
    Spi(String),
    #[error("strip init failed: {0}")]
    Init(String),
}

/// Minimal addressable-strip contract: stage pixels, then commit the whole
/// buffer with `show`. Staging is infallible; only the hardware commit can
/// fail.
pub trait PixelStrip: Send {
    /// Total pixel count of the concatenated strip.
    fn len(&self) -> usize;

    /// Stage one pixel. Out-of-range indices are ignored.
    fn set(&mut self, index: usize, color: RGB8);

    /// Commit the staged buffer to the hardware.
    fn show(&mut self) -> Result<(), StripError>;

    /// Stage black on every pixel.
    fn blank(&mut self) {
        for i in 0..self.len() {
            self.set(i, BLACK);
        }
    }
}

/// Strip handle shared between the renderer and the idle animator. The
/// orchestrator keeps the two mutually exclusive in time; the mutex makes
/// each step's writes atomic with respect to the other task.
pub type SharedStrip = Arc<tokio::sync::Mutex<Box<dyn PixelStrip>>>;

/// Counters and buffer snapshot shared for inspection in tests.
#[derive(Debug, Default)]
pub struct MockStripState {
    /// Staged pixel values (updated on every `set`)
    pub pixels: Vec<RGB8>,

    /// Pixel values as of the last `show`
    pub shown: Vec<RGB8>,

    /// Number of times `set` was called
    pub set_count: usize,

    /// Number of times `show` was called
    pub show_count: usize,

    /// Simulate failures (for error testing)
    pub simulate_show_failure: bool,
}

/// Strip that records all operations without touching hardware.
///
/// Useful for unit tests, integration tests, CI pipelines, and `--emulated`
/// runs on machines without a LED chain attached.
#[derive(Debug, Clone)]
pub struct MockStrip {
    state: Arc<Mutex<MockStripState>>,
    len: usize,
}

impl MockStrip {
    pub fn new(len: usize) -> Self {
        let state = MockStripState {
            pixels: vec![BLACK; len],
            shown: vec![BLACK; len],
            ..Default::default()
        };
        Self {
            state: Arc::new(Mutex::new(state)),
            len,
        }
    }

    /// Shared handle to the recorded state for inspection in tests.
    pub fn state(&self) -> Arc<Mutex<MockStripState>> {
        Arc::clone(&self.state)
    }

    /// Staged value of a single pixel.
    pub fn pixel(&self, index: usize) -> Option<RGB8> {
        self.state.lock().unwrap().pixels.get(index).copied()
    }

    /// Snapshot of the staged buffer.
    pub fn snapshot(&self) -> Vec<RGB8> {
        self.state.lock().unwrap().pixels.clone()
    }

    /// Count pixels currently staged to something other than black.
    pub fn count_lit(&self) -> usize {
        self.state
            .lock()
            .unwrap()
            .pixels
            .iter()
            .filter(|&&p| p != BLACK)
            .count()
    }
}

impl PixelStrip for MockStrip {
    fn len(&self) -> usize {
        self.len
    }

    fn set(&mut self, index: usize, color: RGB8) {
        let mut state = self.state.lock().unwrap();
        state.set_count += 1;
        if let Some(px) = state.pixels.get_mut(index) {
            *px = color;
        }
    }

    fn show(&mut self) -> Result<(), StripError> {
        let mut state = self.state.lock().unwrap();

        if state.simulate_show_failure {
            return Err(StripError::Spi("simulated show failure".to_string()));
        }

        state.show_count += 1;
        let staged = state.pixels.clone();
        state.shown = staged;
        Ok(())
    }
}
