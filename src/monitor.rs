/*
 *  monitor.rs
 *
 *  MoonRingS - every print gets a halo
 *  (c) 2023-26 Piotr Malczak
 *
 *  The orchestrator: polls Moonraker once per tick, hands the strip between
 *  the idle animation and the renderer, and tolerates every endpoint failing
 *  independently
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

use std::fmt::Display;
use std::sync::Arc;
use std::time::Duration;

use log::{error, info};

use crate::config::Config;
use crate::idle::IdleAnimator;
use crate::layout::position;
use crate::moonraker::MoonrakerClient;
use crate::render::{DisplayEngine, RenderState};
use crate::strip::SharedStrip;

/// Log one line per connected/disconnected transition, never per tick.
fn mark_up(flag: &mut bool, api: &str) {
    if !*flag {
        info!("Moonraker {api} api connected");
        *flag = true;
    }
}

fn mark_down(flag: &mut bool, api: &str, err: &dyn Display) {
    if *flag {
        info!("Moonraker {api} api not responding: {err}");
        *flag = false;
    }
}

/// A progress report of exactly zero lights the full ring.
fn progress_to_pixels(progress: f64, ring_length: usize) -> f32 {
    if progress == 0.0 {
        ring_length as f32
    } else {
        (progress * ring_length as f64) as f32
    }
}

/// Owns the configuration and the tick loop; sole arbiter of the strip
/// handoff between `IdleAnimator` and `DisplayEngine`.
pub struct StatusMonitor {
    config: Config,
    client: MoonrakerClient,
    strip: SharedStrip,
    engine: DisplayEngine,
    state: RenderState,
    idle: Option<IdleAnimator>,
    power_api_up: bool,
    printer_api_up: bool,
    job_api_up: bool,
    progress_api_up: bool,
}

impl StatusMonitor {
    pub fn new(config: Config, strip: SharedStrip) -> Self {
        let client = MoonrakerClient::new(&config.moonraker_url);
        let engine = DisplayEngine::new(&config);
        Self {
            config,
            client,
            strip,
            engine,
            state: RenderState::default(),
            idle: None,
            power_api_up: true,
            printer_api_up: true,
            job_api_up: true,
            progress_api_up: true,
        }
    }

    /// Poll every endpoint once. Each fetch fails independently and leaves
    /// the previous values in place; the 1 second tick is the retry.
    pub async fn check_status(&mut self) {
        let ring_length = self.config.layout.ring_length();

        if self.config.power_monitor {
            match self.client.fetch_power(&self.config.power_device).await {
                Ok(power) => {
                    self.state.power = Some(power);
                    mark_up(&mut self.power_api_up, "power");
                }
                Err(e) => mark_down(&mut self.power_api_up, "power", &e),
            }
        }

        match self.client.fetch_printer().await {
            Ok(r) => {
                let bed = &self.config.bed;
                let extruder = &self.config.extruder;
                self.state.bed_pos =
                    Some(position(r.bed_actual, bed.min_temp, bed.max_temp, ring_length));
                self.state.bed_target_pos =
                    Some(position(r.bed_target, bed.min_temp, bed.max_temp, ring_length));
                self.state.extruder_pos = Some(position(
                    r.extruder_actual,
                    extruder.min_temp,
                    extruder.max_temp,
                    ring_length,
                ));
                self.state.extruder_target_pos = Some(position(
                    r.extruder_target,
                    extruder.min_temp,
                    extruder.max_temp,
                    ring_length,
                ));
                mark_up(&mut self.printer_api_up, "printer");
            }
            Err(e) => mark_down(&mut self.printer_api_up, "printer", &e),
        }

        match self.client.fetch_job_state().await {
            Ok(job_state) => {
                if self.state.job_state.as_deref() != Some(job_state.as_str()) {
                    info!(
                        "Printer status changed from {} to {}",
                        self.state.job_state.as_deref().unwrap_or("none"),
                        job_state
                    );
                    self.state.job_state = Some(job_state);
                }
                mark_up(&mut self.job_api_up, "job");
            }
            Err(e) => mark_down(&mut self.job_api_up, "job", &e),
        }

        match self.client.fetch_progress().await {
            Ok(progress) => {
                self.state.progress_pixels = progress_to_pixels(progress, ring_length);
                mark_up(&mut self.progress_api_up, "progress");
            }
            Err(e) => mark_down(&mut self.progress_api_up, "progress", &e),
        }

        // No extruder reading yet means the printer has never answered;
        // run the idle animation until it does.
        if self.state.extruder_pos.is_none() && self.idle.is_none() {
            info!("Starting idle animation");
            self.idle = Some(IdleAnimator::start(
                Arc::clone(&self.strip),
                ring_length,
                self.config.time_interval,
            ));
        }
    }

    /// Render the current state, stopping the idle animation first the tick
    /// telemetry becomes available. The stop is awaited, so the renderer's
    /// commit is the sole visible state afterwards.
    pub async fn update_pixels(&mut self) {
        if self.state.extruder_pos.is_none() {
            return;
        }

        if let Some(idle) = self.idle.take() {
            info!("Stopping idle animation");
            idle.stop().await;
        }

        let mut strip = self.strip.lock().await;
        if let Err(e) = self.engine.render(&self.state, strip.as_mut()) {
            error!("Failed to commit frame: {}", e);
        }
    }

    /// Fixed 1 second telemetry-and-render cadence.
    pub async fn run(&mut self) {
        let tick = Duration::from_secs(1);
        loop {
            self.check_status().await;
            self.update_pixels().await;
            tokio::time::sleep(tick).await;
        }
    }

    /// Stop the animation if it is running and leave the strip dark.
    pub async fn shutdown(&mut self) {
        if let Some(idle) = self.idle.take() {
            idle.stop().await;
        }
        let mut strip = self.strip.lock().await;
        strip.blank();
        if let Err(e) = strip.show() {
            error!("Failed to blank strip on shutdown: {}", e);
        }
    }
}
