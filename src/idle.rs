/*
 *  idle.rs
 *
 *  MoonRingS - every print gets a halo
 *  (c) 2023-26 Piotr Malczak
 *
 *  Background animation shown until the printer starts reporting telemetry:
 *  a three-color chase around the rings, then endless breathing
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

use std::time::Duration;

use log::error;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::sleep;

use crate::color::{scale, BLACK, RGB8};
use crate::strip::SharedStrip;

const MARKERS: [RGB8; 3] = [
    RGB8::new(255, 0, 0),
    RGB8::new(0, 255, 0),
    RGB8::new(0, 0, 255),
];

// Unit bases; the breathing level multiplies these up to full intensity.
const BASES: [RGB8; 3] = [
    RGB8::new(1, 0, 0),
    RGB8::new(0, 1, 0),
    RGB8::new(0, 0, 1),
];

/// Handle to the running idle-animation task.
///
/// The task owns the strip for the duration of each step (one buffer commit);
/// cancellation is cooperative and checked between steps, so `stop` returning
/// guarantees no further writes.
#[derive(Debug)]
pub struct IdleAnimator {
    stop_tx: mpsc::Sender<()>,
    handle: JoinHandle<()>,
}

impl IdleAnimator {
    /// Spawn the animation task. `time_interval` is the chase step period in
    /// seconds; breathing steps 100x faster.
    pub fn start(strip: SharedStrip, ring_length: usize, time_interval: f64) -> Self {
        let (stop_tx, stop_rx) = mpsc::channel(1);
        let interval = Duration::from_secs_f64(time_interval);
        let handle = tokio::spawn(run(strip, ring_length, interval, stop_rx));
        Self { stop_tx, handle }
    }

    /// Request a stop and wait for the task to wind down. The last committed
    /// frame stays on the hardware; the next renderer commit replaces it.
    pub async fn stop(self) {
        let _ = self.stop_tx.send(()).await;
        let _ = self.handle.await;
    }
}

async fn run(strip: SharedStrip, ring_length: usize, interval: Duration, mut stop: mpsc::Receiver<()>) {
    // Phase 1: sweep a lit pixel backward around all three rings at once,
    // clearing the pixel behind it, once per marker color.
    for color in MARKERS {
        for j in 0..ring_length {
            {
                let mut strip = strip.lock().await;
                let pixel = (ring_length - 1 - j) % ring_length;
                strip.set(pixel, color);
                strip.set(pixel + ring_length, color);
                strip.set(pixel + 2 * ring_length, color);
                strip.set(pixel + 1, BLACK);
                strip.set(pixel + ring_length + 1, BLACK);
                if j == 0 {
                    strip.set(0, BLACK);
                } else {
                    strip.set(pixel + 2 * ring_length + 1, BLACK);
                }
                if let Err(e) = strip.show() {
                    error!("Idle chase commit failed: {}", e);
                }
            }
            tokio::select! {
                _ = sleep(interval) => {}
                _ = stop.recv() => return,
            }
        }
    }

    // Phase 2: whole-strip triangle fade through the base colors, forever.
    // 511 levels per color, 0 -> 255 -> 1, one commit per level.
    let breath = interval / 100;
    loop {
        for base in BASES {
            for j in 0..511u16 {
                let level = (if j <= 255 { j } else { 511 - j }) as u8;
                let color = scale(base, level);
                {
                    let mut strip = strip.lock().await;
                    for k in 0..strip.len() {
                        strip.set(k, color);
                    }
                    if let Err(e) = strip.show() {
                        error!("Idle breathing commit failed: {}", e);
                    }
                }
                tokio::select! {
                    _ = sleep(breath) => {}
                    _ = stop.recv() => return,
                }
            }
        }
    }
}
