//! Video output: palette and frame assembly.
//!
//! See [PPU rendering](https://www.nesdev.org/wiki/PPU_rendering) and
//! [PPU palettes](https://www.nesdev.org/wiki/PPU_palettes). The PPU emits one dot per master
//! tick over 341 dots × 262 scanlines; dots 0–255 of scanlines 0–239 are visible.

pub mod frame;
pub mod palette;


pub use frame::{FrameAssembler, FrameBuffer, HEIGHT, WIDTH};
