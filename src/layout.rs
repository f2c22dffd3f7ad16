/*
 *  layout.rs
 *
 *  MoonRingS - every print gets a halo
 *  (c) 2023-26 Piotr Malczak
 *
 *  Maps telemetry values and logical ring pixels onto the physical strip
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

/// Map a raw telemetry value onto a fractional pixel position in
/// `[0, ring_length]`.
///
/// Values below `min` clamp to 0. Values above `max` deliberately run past
/// the ring end; callers tolerate positions beyond the last pixel so an
/// over-temperature reading simply saturates the ring. `max != min` is a
/// configuration invariant enforced at load time.
pub fn position(value: f32, min: f32, max: f32, ring_length: usize) -> f32 {
    let pos = (value - min) / (max - min) * ring_length as f32;
    if pos < 0.0 { 0.0 } else { pos }
}

/// The three logical rings sharing the physical strip.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RingRole {
    Bed,
    Extruder,
    Progress,
}

/// Physical wiring of one ring: its slot within the concatenated strip,
/// the pixel the ring starts at, and its rotational sense.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RingSetup {
    /// Position of this ring's block within the strip (0, 1 or 2)
    pub slot: usize,
    /// Rotation offset in pixels
    pub offset: i32,
    /// Winding sense, +1 or -1
    pub direction: i32,
}

/// Resolved strip geometry: ring length plus per-role wiring.
#[derive(Debug, Clone)]
pub struct RingLayout {
    ring_length: usize,
    bed: RingSetup,
    extruder: RingSetup,
    progress: RingSetup,
}

impl RingLayout {
    pub fn new(ring_length: usize, bed: RingSetup, extruder: RingSetup, progress: RingSetup) -> Self {
        Self { ring_length, bed, extruder, progress }
    }

    pub fn ring_length(&self) -> usize {
        self.ring_length
    }

    /// Length of the whole concatenated strip.
    pub fn strip_len(&self) -> usize {
        3 * self.ring_length
    }

    fn setup(&self, role: RingRole) -> &RingSetup {
        match role {
            RingRole::Bed => &self.bed,
            RingRole::Extruder => &self.extruder,
            RingRole::Progress => &self.progress,
        }
    }

    /// Absolute strip index for a ring-local pixel.
    ///
    /// The progress ring counts from a half-turn base so its zero sits at a
    /// different angular position than the temperature rings. Floor-mod keeps
    /// the wrap correct when `local * direction` goes negative.
    pub fn index(&self, role: RingRole, local: usize) -> usize {
        let ring = self.setup(role);
        self.wrap(self.base(role), local, ring.direction, ring)
    }

    /// Absolute strip index for a lit progress-ring pixel.
    ///
    /// Lit pixels sweep with the extruder ring's winding; dark pixels (via
    /// `index`) use the progress ring's own.
    pub fn progress_lit_index(&self, local: usize) -> usize {
        self.wrap(
            self.base(RingRole::Progress),
            local,
            self.extruder.direction,
            &self.progress,
        )
    }

    fn base(&self, role: RingRole) -> i64 {
        match role {
            RingRole::Progress => 3 * self.ring_length as i64 / 2,
            _ => self.ring_length as i64,
        }
    }

    fn wrap(&self, base: i64, local: usize, direction: i32, ring: &RingSetup) -> usize {
        let l = self.ring_length as i64;
        let within = (base - local as i64 * direction as i64 + ring.offset as i64).rem_euclid(l);
        (within + ring.slot as i64 * l) as usize
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn layout(bed: RingSetup, extruder: RingSetup, progress: RingSetup) -> RingLayout {
        RingLayout::new(24, bed, extruder, progress)
    }

    fn ring(slot: usize, offset: i32, direction: i32) -> RingSetup {
        RingSetup { slot, offset, direction }
    }

    #[test]
    fn test_position_at_min_is_zero() {
        assert_eq!(position(0.0, 0.0, 100.0, 24), 0.0);
        assert_eq!(position(60.0, 60.0, 260.0, 24), 0.0);
    }

    #[test]
    fn test_position_clamps_below_only() {
        assert_eq!(position(-40.0, 0.0, 100.0, 24), 0.0);
        // no upper clamp: readings past max extend beyond the ring
        assert_eq!(position(300.0, 0.0, 100.0, 24), 72.0);
    }

    #[test]
    fn test_position_monotonic() {
        let mut last = -1.0f32;
        for v in 0..120 {
            let pos = position(v as f32, 0.0, 100.0, 24);
            assert!(pos >= last);
            last = pos;
        }
    }

    #[test]
    fn test_position_end_to_end_values() {
        // bed at 40/60 over a 0..100 range on a 24 pixel ring
        assert_eq!(position(40.0, 0.0, 100.0, 24), 9.6);
        assert_eq!(position(60.0, 0.0, 100.0, 24), 14.4);
    }

    #[test]
    fn test_index_is_bijective_within_slot() {
        for direction in [-1, 1] {
            for offset in [0, 3, 23, -7] {
                let l = layout(ring(1, offset, direction), ring(0, 0, 1), ring(2, 0, 1));
                let seen: HashSet<usize> = (0..24).map(|i| l.index(RingRole::Bed, i)).collect();
                assert_eq!(seen.len(), 24, "offset {offset} direction {direction}");
                assert!(seen.iter().all(|&i| (24..48).contains(&i)));
            }
        }
    }

    #[test]
    fn test_index_winds_backward_by_default() {
        let l = layout(ring(0, 0, 1), ring(1, 0, 1), ring(2, 0, 1));
        assert_eq!(l.index(RingRole::Bed, 0), 0);
        assert_eq!(l.index(RingRole::Bed, 1), 23);
        assert_eq!(l.index(RingRole::Bed, 23), 1);
    }

    #[test]
    fn test_index_negative_products_use_floor_mod() {
        let l = layout(ring(0, 0, -1), ring(1, 0, 1), ring(2, 0, 1));
        // local * direction is negative here; result must stay in 0..24
        for i in 0..24 {
            let idx = l.index(RingRole::Bed, i);
            assert!(idx < 24, "local {i} mapped to {idx}");
        }
    }

    #[test]
    fn test_progress_ring_half_turn_base() {
        let l = layout(ring(0, 0, 1), ring(1, 0, 1), ring(2, 0, 1));
        // base 1.5 * 24 = 36, local 0 -> 36 % 24 = 12, slot 2 block starts at 48
        assert_eq!(l.index(RingRole::Progress, 0), 48 + 12);
    }

    #[test]
    fn test_progress_lit_uses_extruder_winding() {
        // extruder wound backward, progress forward: lit and dark indices
        // diverge everywhere except the shared zero point
        let l = layout(ring(0, 0, 1), ring(1, 0, -1), ring(2, 0, 1));
        assert_eq!(l.progress_lit_index(0), l.index(RingRole::Progress, 0));
        assert_ne!(l.progress_lit_index(5), l.index(RingRole::Progress, 5));
        // with matching windings the two agree everywhere
        let l = layout(ring(0, 0, 1), ring(1, 0, 1), ring(2, 0, 1));
        for i in 0..24 {
            assert_eq!(l.progress_lit_index(i), l.index(RingRole::Progress, i));
        }
    }

    #[test]
    fn test_offset_rotates_the_ring() {
        let plain = layout(ring(0, 0, 1), ring(1, 0, 1), ring(2, 0, 1));
        let shifted = layout(ring(0, 6, 1), ring(1, 0, 1), ring(2, 0, 1));
        for i in 0..24 {
            assert_eq!(shifted.index(RingRole::Bed, i), (plain.index(RingRole::Bed, i) + 6) % 24);
        }
    }
}
