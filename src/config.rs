//! Command-line configuration.

use std::path::PathBuf;

use clap::{ArgAction, Parser};

use crate::trace::VerifyOptions;

/// Frames simulated when `--frames` is not given.
pub const DEFAULT_FRAMES: u64 = 1000;

#[derive(Parser, Debug, Clone)]
#[command(name = "nes-testbench")]
#[command(about = "Drive a cycle-accurate NES model against a ROM and a golden trace", long_about = None)]
pub struct Config {
    /// iNES image to serve on the model's buses.
    pub rom: PathBuf,

    /// Golden trace to check the CPU against (nestest log format).
    #[arg(long)]
    pub trace: Option<PathBuf>,

    /// Shared library exporting the model's C ABI.
    #[arg(long, env = "NES_MODEL_LIB")]
    pub model: PathBuf,

    /// Stop after this many frames.
    #[arg(long, default_value_t = DEFAULT_FRAMES)]
    pub frames: u64,

    /// Do not compare the trace's PPU columns with the raster position.
    #[arg(long, action = ArgAction::SetTrue)]
    pub ignore_raster: bool,

    /// Run without a window.
    #[arg(long, action = ArgAction::SetTrue)]
    pub headless: bool,

    /// Window scale factor (1, 2, 4 or 8; anything else fits the screen).
    #[arg(long, default_value_t = 4)]
    pub scale: u32,

    /// Write the last completed frame to this PNG file.
    #[arg(long)]
    pub screenshot: Option<PathBuf>,
}

impl Config {
    pub fn verify_options(&self) -> VerifyOptions {
        VerifyOptions {
            check_raster: !self.ignore_raster,
        }
    }
}
