/*
 *  ws2812.rs
 *
 *  MoonRingS - every print gets a halo
 *  (c) 2023-26 Piotr Malczak
 *
 *  WS2812 strip clocked out over the Raspberry Pi SPI bus: 3 SPI bits per
 *  LED bit at 2.4 MHz gives the 1.25us bit period the chips expect
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

use rppal::spi::{Bus, Mode, SlaveSelect, Spi};

use crate::color::{dim, BLACK, RGB8};
use crate::strip::{PixelStrip, StripError};

const SPI_CLOCK_HZ: u32 = 2_400_000;

// >50us of line-low latches the frame; 30 zero bytes is 100us at 2.4 MHz
const RESET_BYTES: usize = 30;

/// Expand one frame into the SPI bit stream: GRB channel order, 0 -> 100,
/// 1 -> 110, framed by reset gaps. Brightness is applied here so the staged
/// buffer keeps full-range values.
fn encode_frame(pixels: &[RGB8], brightness: f32) -> Vec<u8> {
    let mut out = Vec::with_capacity(pixels.len() * 9 + 2 * RESET_BYTES);
    out.resize(RESET_BYTES, 0);
    for px in pixels {
        let scaled = dim(*px, brightness);
        for channel in [scaled.g, scaled.r, scaled.b] {
            let mut bits: u32 = 0;
            for i in 0..8 {
                bits <<= 3;
                bits |= if channel & (0x80 >> i) != 0 { 0b110 } else { 0b100 };
            }
            out.extend_from_slice(&bits.to_be_bytes()[1..4]);
        }
    }
    out.resize(out.len() + RESET_BYTES, 0);
    out
}

/// Hardware strip on `/dev/spidevN.0`.
pub struct Ws2812Strip {
    spi: Spi,
    pixels: Vec<RGB8>,
    brightness: f32,
}

impl Ws2812Strip {
    pub fn new(bus: u8, len: usize, brightness: f32) -> Result<Self, StripError> {
        let bus = match bus {
            0 => Bus::Spi0,
            1 => Bus::Spi1,
            2 => Bus::Spi2,
            other => return Err(StripError::Init(format!("unsupported SPI bus {other}"))),
        };
        let spi = Spi::new(bus, SlaveSelect::Ss0, SPI_CLOCK_HZ, Mode::Mode0)
            .map_err(|e| StripError::Init(e.to_string()))?;
        Ok(Self {
            spi,
            pixels: vec![BLACK; len],
            brightness,
        })
    }
}

impl PixelStrip for Ws2812Strip {
    fn len(&self) -> usize {
        self.pixels.len()
    }

    fn set(&mut self, index: usize, color: RGB8) {
        if let Some(px) = self.pixels.get_mut(index) {
            *px = color;
        }
    }

    fn show(&mut self) -> Result<(), StripError> {
        let frame = encode_frame(&self.pixels, self.brightness);
        self.spi
            .write(&frame)
            .map_err(|e| StripError::Spi(e.to_string()))?;
        Ok(())
    }
}
