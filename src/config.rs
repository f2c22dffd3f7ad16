/*
 *  config.rs
 *
 *  MoonRingS - every print gets a halo
 *  (c) 2023-26 Piotr Malczak
 *
 *  YAML configuration: raw serde layer plus a single validating resolve
 *  step that reports every missing or invalid field at once
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

use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::{Path, PathBuf};

use dirs_next::home_dir;
use log::info;
use serde::Deserialize;
use thiserror::Error;

use crate::color::{parse_color, BLACK, RGB8};
use crate::layout::{RingLayout, RingSetup};

/// Error type for config loading/validation.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("config file not found: {0}")]
    Missing(PathBuf),
    #[error("no config file found (pass --config or create ~/.config/moonrings/config.yaml)")]
    NotFound,
    #[error("invalid configuration: {}", .0.join("; "))]
    Validation(Vec<String>),
}

// ---- raw serde layer -------------------------------------------------------
// Everything optional so resolve() can report all the gaps in one pass.

#[derive(Debug, Clone, Deserialize, Default)]
struct RawConfig {
    moonraker: Option<RawMoonraker>,
    power: Option<RawPower>,
    bed: Option<RawHeater>,
    extruder: Option<RawHeater>,
    rings: Option<RawRings>,
    animation: Option<RawAnimation>,
    leds: Option<RawLeds>,
    status: Option<BTreeMap<String, String>>,
}

#[derive(Debug, Clone, Deserialize, Default)]
struct RawMoonraker {
    host: Option<String>,
    port: Option<u16>,
    power_device: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Default)]
struct RawPower {
    power_monitor: Option<bool>,
}

#[derive(Debug, Clone, Deserialize, Default)]
struct RawHeater {
    min_temp: Option<f32>,
    max_temp: Option<f32>,
    main_color: Option<String>,
    heating_color: Option<String>,
    cooling_color: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Default)]
struct RawRings {
    ring_length: Option<usize>,
    /// Physical slot per logical ring, listed bed, extruder, progress.
    order: Option<Vec<usize>>,
    ring0: Option<RawRing>,
    ring1: Option<RawRing>,
    ring2: Option<RawRing>,
}

#[derive(Debug, Clone, Deserialize, Default)]
struct RawRing {
    offset: Option<i32>,
    direction: Option<i32>,
}

#[derive(Debug, Clone, Deserialize, Default)]
struct RawAnimation {
    time_interval: Option<f64>,
}

#[derive(Debug, Clone, Deserialize, Default)]
struct RawLeds {
    spi_bus: Option<u8>,
    brightness: Option<f32>,
}

// ---- resolved configuration ------------------------------------------------

/// Temperature range and colors for one heater ring.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HeaterPalette {
    pub min_temp: f32,
    pub max_temp: f32,
    pub main: RGB8,
    pub heating: RGB8,
    pub cooling: RGB8,
}

/// Fully validated, immutable configuration. Constructed exactly once at
/// startup; a failed resolve lists every problem and the process exits.
#[derive(Debug, Clone)]
pub struct Config {
    pub moonraker_url: String,
    pub power_monitor: bool,
    pub power_device: String,
    pub bed: HeaterPalette,
    pub extruder: HeaterPalette,
    pub layout: RingLayout,
    /// Idle-animation step interval in seconds
    pub time_interval: f64,
    pub spi_bus: u8,
    pub brightness: f32,
    pub status_colors: HashMap<String, RGB8>,
}

/// Load and validate a configuration file. An explicit path must exist;
/// otherwise common locations are searched.
pub fn load(explicit: Option<&Path>) -> Result<Config, ConfigError> {
    let path = match explicit {
        Some(p) => {
            if !p.exists() {
                return Err(ConfigError::Missing(p.to_path_buf()));
            }
            p.to_path_buf()
        }
        None => find_config_file().ok_or(ConfigError::NotFound)?,
    };
    info!("Loading configuration from {}", path.display());
    let raw: RawConfig = serde_yaml::from_str(&fs::read_to_string(&path)?)?;
    resolve(raw)
}

/// Parse and validate configuration from a YAML string.
pub fn from_str(yaml: &str) -> Result<Config, ConfigError> {
    let raw: RawConfig = serde_yaml::from_str(yaml)?;
    resolve(raw)
}

/// Try common locations in order (first hit wins).
fn find_config_file() -> Option<PathBuf> {
    if let Some(home) = home_dir() {
        let p = home.join(".config/moonrings/config.yaml");
        if p.exists() { return Some(p) }
        let p = home.join(".config/moonrings.yaml");
        if p.exists() { return Some(p) }
    }
    for candidate in &["moonrings.yaml", "config.yaml", "config/moonrings.yaml"] {
        let p = PathBuf::from(candidate);
        if p.exists() { return Some(p) }
    }
    None
}

fn missing<T>(field: Option<T>, name: &str, problems: &mut Vec<String>) -> Option<T> {
    if field.is_none() {
        problems.push(format!("missing {name}"));
    }
    field
}

fn color_field(field: &Option<String>, name: &str, problems: &mut Vec<String>) -> RGB8 {
    match field {
        Some(s) => parse_color(s).unwrap_or_else(|e| {
            problems.push(format!("{name}: {e}"));
            BLACK
        }),
        None => {
            problems.push(format!("missing {name}"));
            BLACK
        }
    }
}

fn resolve_heater(section: Option<RawHeater>, name: &str, problems: &mut Vec<String>) -> HeaterPalette {
    let raw = match section {
        Some(raw) => raw,
        None => {
            problems.push(format!("missing [{name}] section"));
            RawHeater::default()
        }
    };
    let min_temp = missing(raw.min_temp, &format!("{name}.min_temp"), problems).unwrap_or(0.0);
    let max_temp = missing(raw.max_temp, &format!("{name}.max_temp"), problems).unwrap_or(1.0);
    if raw.min_temp.is_some() && raw.max_temp.is_some() && max_temp == min_temp {
        problems.push(format!("{name}.max_temp must differ from {name}.min_temp"));
    }
    HeaterPalette {
        min_temp,
        max_temp,
        main: color_field(&raw.main_color, &format!("{name}.main_color"), problems),
        heating: color_field(&raw.heating_color, &format!("{name}.heating_color"), problems),
        cooling: color_field(&raw.cooling_color, &format!("{name}.cooling_color"), problems),
    }
}

fn resolve_rings(section: Option<RawRings>, problems: &mut Vec<String>) -> RingLayout {
    let raw = match section {
        Some(raw) => raw,
        None => {
            problems.push("missing [rings] section".to_string());
            RawRings::default()
        }
    };

    let ring_length = missing(raw.ring_length, "rings.ring_length", problems).unwrap_or(1);
    if raw.ring_length == Some(0) {
        problems.push("rings.ring_length must be at least 1".to_string());
    }

    let order = missing(raw.order.clone(), "rings.order", problems).unwrap_or_else(|| vec![0, 1, 2]);
    let mut sorted = order.clone();
    sorted.sort_unstable();
    if sorted != vec![0, 1, 2] {
        problems.push(format!(
            "rings.order {order:?} must assign slots 0, 1 and 2 exactly once"
        ));
    }

    // Physical ring sections; absent ones fall back to offset 0, direction +1.
    let physical: [RawRing; 3] = [
        raw.ring0.unwrap_or_default(),
        raw.ring1.unwrap_or_default(),
        raw.ring2.unwrap_or_default(),
    ];
    for (i, ring) in physical.iter().enumerate() {
        if let Some(d) = ring.direction {
            if d != 1 && d != -1 {
                problems.push(format!("rings.ring{i}.direction must be 1 or -1, got {d}"));
            }
        }
    }

    let setup_for = |role_idx: usize| -> RingSetup {
        let slot = order.get(role_idx).copied().unwrap_or(role_idx).min(2);
        RingSetup {
            slot,
            offset: physical[slot].offset.unwrap_or(0),
            direction: physical[slot].direction.unwrap_or(1),
        }
    };

    RingLayout::new(ring_length, setup_for(0), setup_for(1), setup_for(2))
}

fn resolve(raw: RawConfig) -> Result<Config, ConfigError> {
    let mut problems = Vec::new();

    let moonraker = raw.moonraker.unwrap_or_else(|| {
        problems.push("missing [moonraker] section".to_string());
        RawMoonraker::default()
    });
    if moonraker.host.as_deref() == Some("") {
        problems.push("moonraker.host must not be empty".to_string());
    }
    let host = missing(moonraker.host, "moonraker.host", &mut problems).unwrap_or_default();
    let port = missing(moonraker.port, "moonraker.port", &mut problems).unwrap_or(7125);
    if moonraker.port == Some(0) {
        problems.push("moonraker.port must not be 0".to_string());
    }

    let power_monitor = raw.power.and_then(|p| p.power_monitor).unwrap_or(false);

    let bed = resolve_heater(raw.bed, "bed", &mut problems);
    let extruder = resolve_heater(raw.extruder, "extruder", &mut problems);
    let layout = resolve_rings(raw.rings, &mut problems);

    let time_interval = missing(
        raw.animation.and_then(|a| a.time_interval),
        "animation.time_interval",
        &mut problems,
    )
    .unwrap_or(0.1);
    if time_interval <= 0.0 {
        problems.push(format!("animation.time_interval must be positive, got {time_interval}"));
    }

    let leds = raw.leds.unwrap_or_default();
    let spi_bus = leds.spi_bus.unwrap_or(0);
    let brightness = leds.brightness.unwrap_or(0.2);
    if !(brightness > 0.0 && brightness <= 1.0) {
        problems.push(format!("leds.brightness must be in (0, 1], got {brightness}"));
    }

    let mut status_colors = HashMap::new();
    match raw.status {
        Some(map) if !map.is_empty() => {
            for (state, value) in &map {
                status_colors.insert(
                    state.clone(),
                    color_field(&Some(value.clone()), &format!("status.{state}"), &mut problems),
                );
            }
        }
        _ => problems.push("missing or empty [status] section".to_string()),
    }

    if !problems.is_empty() {
        return Err(ConfigError::Validation(problems));
    }

    Ok(Config {
        moonraker_url: format!("http://{host}:{port}"),
        power_monitor,
        power_device: moonraker.power_device.unwrap_or_else(|| "printer".to_string()),
        bed,
        extruder,
        layout,
        time_interval,
        spi_bus,
        brightness,
        status_colors,
    })
}

impl Config {
    /// Info-log the effective configuration, one line per setting.
    pub fn log_summary(&self) {
        info!("Moonraker url ........: {}", self.moonraker_url);
        info!("Power monitor ........: {}", if self.power_monitor { "enabled" } else { "disabled" });
        if self.power_monitor {
            info!("Power device .........: {}", self.power_device);
        }
        info!("Ring length ..........: {} pixels", self.layout.ring_length());
        info!("Strip length .........: {} pixels", self.layout.strip_len());
        info!("Bed range ............: {:.0}..{:.0}", self.bed.min_temp, self.bed.max_temp);
        info!("Extruder range .......: {:.0}..{:.0}", self.extruder.min_temp, self.extruder.max_temp);
        info!("Animation interval ...: {}s", self.time_interval);
        info!("SPI bus ..............: {}", self.spi_bus);
        info!("Brightness ...........: {:.2}", self.brightness);
        let mut states: Vec<&str> = self.status_colors.keys().map(String::as_str).collect();
        states.sort_unstable();
        info!("Job states mapped ....: {}", states.join(", "));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::RingRole;

    const FULL: &str = r#"
moonraker:
  host: voron.local
  port: 7125
power:
  power_monitor: true
bed:
  min_temp: 0
  max_temp: 100
  main_color: "255,0,0"
  heating_color: "255,80,0"
  cooling_color: "0,80,255"
extruder:
  min_temp: 0
  max_temp: 260
  main_color: "0,255,0"
  heating_color: "255,160,0"
  cooling_color: "0,160,255"
rings:
  ring_length: 24
  order: [1, 0, 2]
  ring0:
    offset: 3
    direction: -1
animation:
  time_interval: 0.2
leds:
  spi_bus: 0
  brightness: 0.25
status:
  Printing: "0,255,0"
  Paused: "255,255,0"
"#;

    #[test]
    fn test_full_config_resolves() {
        let cfg = from_str(FULL).unwrap();
        assert_eq!(cfg.moonraker_url, "http://voron.local:7125");
        assert!(cfg.power_monitor);
        assert_eq!(cfg.power_device, "printer");
        assert_eq!(cfg.bed.max_temp, 100.0);
        assert_eq!(cfg.layout.ring_length(), 24);
        assert_eq!(cfg.time_interval, 0.2);
        assert_eq!(cfg.brightness, 0.25);
        assert_eq!(cfg.status_colors["Printing"], RGB8::new(0, 255, 0));
    }

    #[test]
    fn test_ring_order_maps_physical_sections() {
        let cfg = from_str(FULL).unwrap();
        // bed sits on physical ring 1 (defaults), extruder on ring 0 (rotated)
        assert_eq!(cfg.layout.index(RingRole::Extruder, 0), 3);
        assert_eq!(cfg.layout.index(RingRole::Bed, 0), 24);
    }

    #[test]
    fn test_validation_collects_every_problem() {
        let broken = r#"
moonraker:
  port: 7125
bed:
  min_temp: 60
  max_temp: 60
  main_color: "purple"
  heating_color: "255,80,0"
  cooling_color: "0,80,255"
rings:
  ring_length: 24
  order: [0, 0, 2]
  ring1:
    direction: 3
animation:
  time_interval: 0.2
status:
  Printing: "0,255,0"
"#;
        let err = from_str(broken).unwrap_err();
        let ConfigError::Validation(problems) = err else {
            panic!("expected a validation error");
        };
        let text = problems.join("; ");
        assert!(text.contains("moonraker.host"), "{text}");
        assert!(text.contains("missing [extruder] section"), "{text}");
        assert!(text.contains("bed.max_temp must differ"), "{text}");
        assert!(text.contains("bed.main_color"), "{text}");
        assert!(text.contains("rings.order"), "{text}");
        assert!(text.contains("ring1.direction"), "{text}");
        assert!(problems.len() >= 6, "{problems:?}");
    }

    #[test]
    fn test_empty_status_map_is_fatal() {
        let yaml = FULL.replace("status:\n  Printing: \"0,255,0\"\n  Paused: \"255,255,0\"", "status: {}");
        assert!(matches!(from_str(&yaml), Err(ConfigError::Validation(_))));
    }

    #[test]
    fn test_interval_must_be_positive() {
        let yaml = FULL.replace("time_interval: 0.2", "time_interval: 0");
        let ConfigError::Validation(problems) = from_str(&yaml).unwrap_err() else {
            panic!("expected a validation error");
        };
        assert!(problems.iter().any(|p| p.contains("time_interval")));
    }
}
