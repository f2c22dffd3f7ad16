/*
 *  lib.rs
 *
 *  MoonRingS - every print gets a halo
 *  (c) 2023-26 Piotr Malczak
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

//! Moonraker LED ring monitor: polls a printer's Moonraker API and drives
//! three WS2812 rings showing bed temperature, hotend temperature, and job
//! progress, with an idle animation while the printer is silent.

pub mod color;
pub mod config;
pub mod idle;
pub mod layout;
pub mod monitor;
pub mod moonraker;
pub mod render;
pub mod strip;
pub mod ws2812;
