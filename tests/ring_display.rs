/*
 *  tests/ring_display.rs
 *
 *  End-to-end render checks: config -> positions -> engine -> strip
 *
 *  MoonRingS - every print gets a halo
 *  (c) 2023-26 Piotr Malczak
 */

use moonrings::color::{BLACK, RGB8};
use moonrings::config;
use moonrings::layout::{position, RingRole};
use moonrings::moonraker::PowerState;
use moonrings::render::{DisplayEngine, RenderState};
use moonrings::strip::MockStrip;

// A deliberately awkward wiring: every ring on a different slot than its
// role order, one reversed, one rotated.
const YAML: &str = r#"
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
  order: [2, 0, 1]
  ring0:
    offset: 5
    direction: -1
  ring2:
    offset: 11
animation:
  time_interval: 0.2
status:
  Printing: "0,0,255"
  Paused: "255,255,0"
"#;

fn rendered(state: &RenderState) -> (config::Config, MockStrip) {
    let cfg = config::from_str(YAML).unwrap();
    let mut engine = DisplayEngine::new(&cfg);
    let mut strip = MockStrip::new(cfg.layout.strip_len());
    engine.render(state, &mut strip).unwrap();
    (cfg, strip)
}

fn printing(cfg: &config::Config) -> RenderState {
    let l = cfg.layout.ring_length();
    RenderState {
        power: Some(PowerState::On),
        bed_pos: Some(position(40.0, cfg.bed.min_temp, cfg.bed.max_temp, l)),
        bed_target_pos: Some(position(60.0, cfg.bed.min_temp, cfg.bed.max_temp, l)),
        extruder_pos: Some(position(210.0, cfg.extruder.min_temp, cfg.extruder.max_temp, l)),
        extruder_target_pos: Some(position(210.0, cfg.extruder.min_temp, cfg.extruder.max_temp, l)),
        job_state: Some("Printing".to_string()),
        progress_pixels: 0.37 * l as f32,
    }
}

#[test]
fn test_bed_scenario_40_of_60() {
    let cfg = config::from_str(YAML).unwrap();
    let state = printing(&cfg);
    assert_eq!(state.bed_pos, Some(9.6));
    assert_eq!(state.bed_target_pos, Some(14.4));

    let (cfg, strip) = rendered(&state);
    for i in 0..24 {
        let px = strip.pixel(cfg.layout.index(RingRole::Bed, i)).unwrap();
        let expected = if i < 10 {
            RGB8::new(255, 0, 0)
        } else if i < 15 {
            RGB8::new(255, 80, 0)
        } else {
            BLACK
        };
        assert_eq!(px, expected, "bed local pixel {i}");
    }
}

#[test]
fn test_rings_do_not_bleed_into_each_other() {
    let cfg = config::from_str(YAML).unwrap();
    let mut state = printing(&cfg);
    state.job_state = Some("Paused".to_string());

    let (_, strip) = rendered(&state);
    // order [2, 0, 1]: bed colors in slot 2, extruder in slot 0, progress
    // (Paused yellow) in slot 1
    let bed_block = 48..72usize;
    let extruder_block = 0..24usize;
    let progress_block = 24..48usize;
    let mut seen = [false; 3];
    for (i, px) in strip.snapshot().iter().enumerate() {
        match *px {
            c if c == RGB8::new(255, 0, 0) || c == RGB8::new(255, 80, 0) => {
                assert!(bed_block.contains(&i), "bed color at {i}");
                seen[0] = true;
            }
            c if c == RGB8::new(0, 255, 0) || c == RGB8::new(255, 160, 0) => {
                assert!(extruder_block.contains(&i), "extruder color at {i}");
                seen[1] = true;
            }
            c if c == RGB8::new(255, 255, 0) => {
                assert!(progress_block.contains(&i), "progress color at {i}");
                seen[2] = true;
            }
            _ => {}
        }
    }
    assert_eq!(seen, [true; 3]);
}

#[test]
fn test_power_off_overrides_everything() {
    let cfg = config::from_str(YAML).unwrap();
    let mut state = printing(&cfg);
    state.power = Some(PowerState::Off);

    let (_, strip) = rendered(&state);
    assert_eq!(strip.count_lit(), 0);
    assert_eq!(strip.state().lock().unwrap().show_count, 1);
}

#[test]
fn test_zero_progress_lights_full_ring() {
    let cfg = config::from_str(YAML).unwrap();
    let mut state = printing(&cfg);
    // the monitor maps a zero progress report to a full ring
    state.progress_pixels = cfg.layout.ring_length() as f32;

    let (cfg, strip) = rendered(&state);
    for i in 0..24 {
        assert_eq!(
            strip.pixel(cfg.layout.progress_lit_index(i)).unwrap(),
            RGB8::new(0, 0, 255),
            "progress local pixel {i}"
        );
    }
}

#[test]
fn test_same_telemetry_same_frame() {
    let cfg = config::from_str(YAML).unwrap();
    let state = printing(&cfg);
    let (_, first) = rendered(&state);
    let (_, second) = rendered(&state);
    assert_eq!(first.snapshot(), second.snapshot());
}
