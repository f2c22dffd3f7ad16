/*
 *  main.rs
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

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::{Arg, ArgAction, Command};
use env_logger::Env;
use log::{error, info};
use tokio::sync::Mutex as TokMutex;

#[cfg(unix)] // Only compile this block on Unix-like systems
use tokio::signal::unix::{signal, SignalKind};

use moonrings::config;
use moonrings::monitor::StatusMonitor;
use moonrings::strip::{MockStrip, PixelStrip, SharedStrip};
use moonrings::ws2812::Ws2812Strip;

include!(concat!(env!("OUT_DIR"), "/build_info.rs"));

/// Asynchronously waits for a SIGINT, SIGTERM, or SIGHUP signal.
///
/// Once a signal is caught, it logs the event and returns, allowing for
/// graceful shutdown.
async fn signal_handler() -> anyhow::Result<()> {
    let mut sigint = signal(SignalKind::interrupt())?;
    let mut sigterm = signal(SignalKind::terminate())?;
    let mut sighup = signal(SignalKind::hangup())?;

    tokio::select! {
        _ = sigint.recv() => {
            info!("SIGINT received. Initiating graceful shutdown.");
        }
        _ = sigterm.recv() => {
            info!("SIGTERM received. Initiating graceful shutdown.");
        }
        _ = sighup.recv() => {
            info!("SIGHUP received. Initiating graceful shutdown.");
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Parse command line arguments
    let matches = Command::new(env!("CARGO_PKG_NAME"))
        .version(env!("CARGO_PKG_VERSION"))
        .about(env!("CARGO_PKG_DESCRIPTION"))
        .arg(Arg::new("debug")
        .action(ArgAction::SetTrue)
        .long("debug")
        .short('v')
        .alias("verbose")
        .help("Enable debug log level")
        .required(false))
        .arg(Arg::new("config")
        .short('c')
        .long("config")
        .help("monitor config file")
        .required(false))
        .arg(Arg::new("emulated")
        .long("emulated")
        .help("[Internal] In-memory strip for development/testing")
        .action(ArgAction::SetTrue)
        .hide(true)
        .required(false))
        .after_help("MoonRingS:\
            \nMoonraker monitor\
            \n\n\tThree LED rings tracking bed, hotend, and job progress\
            \n\tIdle light show until the printer wakes up")
        .get_matches();

    let debug_enabled = matches.get_flag("debug");
    let emulated = matches.get_flag("emulated");
    let config_file = matches.get_one::<String>("config").map(PathBuf::from);

    // Initialize the logger with the appropriate level based on debug flag
    env_logger::Builder::from_env(Env::default().default_filter_or(if debug_enabled {"debug"}else{"info"}))
        .format_timestamp_secs()
        .init();

    info!("{} - every print gets a halo", env!("CARGO_PKG_NAME"));
    info!("v.{} built {}", env!("CARGO_PKG_VERSION"), BUILD_DATE);

    let config = match config::load(config_file.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            error!("Configuration error: {e}");
            return Err(e.into());
        }
    };
    config.log_summary();

    let strip_len = config.layout.strip_len();
    let mut strip: Box<dyn PixelStrip> = if emulated {
        info!("Emulation mode enabled - pixels stay in memory");
        Box::new(MockStrip::new(strip_len))
    } else {
        Box::new(
            Ws2812Strip::new(config.spi_bus, strip_len, config.brightness)
                .context("opening SPI strip")?,
        )
    };

    // start from a dark strip
    strip.blank();
    strip.show().context("initial strip commit")?;

    let strip: SharedStrip = Arc::new(TokMutex::new(strip));
    let mut monitor = StatusMonitor::new(config, strip);

    // Main application loop
    tokio::select! {
        // Handle Unix signals for graceful shutdown
        _ = signal_handler() => {}

        // Telemetry + render ticks
        _ = monitor.run() => {
            info!("Closed application loop.");
        }
    }

    info!("Main application exiting. Clearing strip and stopping animation.");
    monitor.shutdown().await;

    Ok(())
}
