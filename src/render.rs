/*
 *  render.rs
 *
 *  MoonRingS - every print gets a halo
 *  (c) 2023-26 Piotr Malczak
 *
 *  Per-tick pixel computation for the three rings
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

use std::collections::HashMap;

use log::{info, warn};

use crate::color::{BLACK, RGB8};
use crate::config::{Config, HeaterPalette};
use crate::layout::{RingLayout, RingRole};
use crate::moonraker::PowerState;
use crate::strip::{PixelStrip, StripError};

/// Render inputs derived from telemetry, refreshed each tick.
///
/// Fields stay at their previous value when the corresponding fetch fails;
/// only `extruder_pos` doubles as the idle-animation gate.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RenderState {
    pub power: Option<PowerState>,
    pub bed_pos: Option<f32>,
    pub bed_target_pos: Option<f32>,
    pub extruder_pos: Option<f32>,
    pub extruder_target_pos: Option<f32>,
    pub job_state: Option<String>,
    /// Lit pixel count on the progress ring, `[0, ring_length]`
    pub progress_pixels: f32,
}

/// Turns a `RenderState` into pixels, one `show` per tick.
#[derive(Debug)]
pub struct DisplayEngine {
    layout: RingLayout,
    bed: HeaterPalette,
    extruder: HeaterPalette,
    status_colors: HashMap<String, RGB8>,
    power_monitor: bool,
    // power-off blanking is latched so the buffer is cleared once per
    // transition, not rewritten every tick
    lights_on: bool,
    last_unknown_status: Option<String>,
}

impl DisplayEngine {
    pub fn new(config: &Config) -> Self {
        Self {
            layout: config.layout.clone(),
            bed: config.bed,
            extruder: config.extruder,
            status_colors: config.status_colors.clone(),
            power_monitor: config.power_monitor,
            lights_on: true,
            last_unknown_status: None,
        }
    }

    /// Compute and commit one frame.
    pub fn render(&mut self, state: &RenderState, strip: &mut dyn PixelStrip) -> Result<(), StripError> {
        if self.power_monitor && state.power == Some(PowerState::Off) {
            if self.lights_on {
                info!("Printer power is off, turning the lights out");
                strip.blank();
                self.lights_on = false;
            }
            return strip.show();
        }

        if !self.lights_on {
            info!("Printer power restored, resuming display");
            self.lights_on = true;
        }

        if let (Some(actual), Some(target)) = (state.bed_pos, state.bed_target_pos) {
            self.paint_heater(RingRole::Bed, actual, target, self.bed, strip);
        }
        if let (Some(actual), Some(target)) = (state.extruder_pos, state.extruder_target_pos) {
            self.paint_heater(RingRole::Extruder, actual, target, self.extruder, strip);
        }
        self.paint_progress(state, strip);

        strip.show()
    }

    /// One temperature ring. The fractional positions are compared against
    /// integer pixel indices directly; the boundary pixel takes whichever
    /// band its integer index falls in.
    fn paint_heater(
        &self,
        role: RingRole,
        actual: f32,
        target: f32,
        palette: HeaterPalette,
        strip: &mut dyn PixelStrip,
    ) {
        for i in 0..self.layout.ring_length() {
            let p = i as f32;
            let color = if actual <= target {
                // heating or steady: filled, then the band still to come
                if p < actual {
                    palette.main
                } else if p <= target {
                    palette.heating
                } else {
                    BLACK
                }
            } else {
                // cooling: filled to target, excess still bleeding off
                if p < target {
                    palette.main
                } else if p < actual {
                    palette.cooling
                } else {
                    BLACK
                }
            };
            strip.set(self.layout.index(role, i), color);
        }
    }

    /// Progress ring in the current job-state color. A state with no color
    /// mapping leaves the ring untouched for this tick.
    fn paint_progress(&mut self, state: &RenderState, strip: &mut dyn PixelStrip) {
        let Some(job_state) = state.job_state.as_deref() else {
            return;
        };
        let Some(&color) = self.status_colors.get(job_state) else {
            if self.last_unknown_status.as_deref() != Some(job_state) {
                warn!("Job state '{job_state}' has no color mapping, skipping progress ring");
                self.last_unknown_status = Some(job_state.to_string());
            }
            return;
        };

        for i in 0..self.layout.ring_length() {
            if (i as f32) < state.progress_pixels {
                strip.set(self.layout.progress_lit_index(i), color);
            } else {
                strip.set(self.layout.index(RingRole::Progress, i), BLACK);
            }
        }
    }
}
