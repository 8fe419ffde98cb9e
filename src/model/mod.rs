//! The hardware model under test.
//!
//! The testbench never looks inside the simulation. It toggles the reset and clock pins, asks
//! the model to settle its combinational logic (`eval`), advances simulated time, and reads the
//! external pins: the CPU and PPU buses, the raster position, the pixel colour and the CPU
//! register file. Any backend implementing [`HardwareModel`] can be driven.
//!
//! - **library**: a compiled simulation loaded from a shared library at runtime.

use thiserror::Error;

pub mod library;

pub use library::LibraryModel;

/// What the model drives on one of its buses.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BusPins {
    pub addr: u16,
    /// Data-out pins; only meaningful when `write` is set.
    pub data: u8,
    pub write: bool,
}

/// The video unit's (dot, scanline) position.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RasterPosition {
    pub x: u16,
    pub y: u16,
}

/// Externally visible CPU state, sampled once per CPU cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CpuSnapshot {
    pub pc: u16,
    pub a: u8,
    pub x: u8,
    pub y: u8,
    pub status: u8,
    pub sp: u8,
    /// The CPU's micro-state is the opcode fetch cycle.
    pub fetch: bool,
    /// The CPU is stalled by a DMA transfer.
    pub dma: bool,
}

/// Pin-level interface of a simulation backend.
pub trait HardwareModel {
    /// Drive the reset line. `true` asserts reset (the pin itself is active low).
    fn set_reset(&mut self, asserted: bool);
    fn set_clock(&mut self, high: bool);
    /// Settle combinational logic after a pin change.
    fn eval(&mut self);
    /// Advance simulated time by `units`.
    fn advance_time(&mut self, units: u64);

    fn cpu_bus(&self) -> BusPins;
    fn set_cpu_data(&mut self, data: u8);
    fn ppu_bus(&self) -> BusPins;
    fn set_ppu_data(&mut self, data: u8);

    fn raster(&self) -> RasterPosition;
    /// 6-bit colour code on the video output.
    fn color(&self) -> u8;
    fn cpu_state(&self) -> CpuSnapshot;

    /// Called once when the run ends.
    fn finish(&mut self) {}
}

impl<M: HardwareModel + ?Sized> HardwareModel for Box<M> {
    fn set_reset(&mut self, asserted: bool) {
        (**self).set_reset(asserted)
    }
    fn set_clock(&mut self, high: bool) {
        (**self).set_clock(high)
    }
    fn eval(&mut self) {
        (**self).eval()
    }
    fn advance_time(&mut self, units: u64) {
        (**self).advance_time(units)
    }
    fn cpu_bus(&self) -> BusPins {
        (**self).cpu_bus()
    }
    fn set_cpu_data(&mut self, data: u8) {
        (**self).set_cpu_data(data)
    }
    fn ppu_bus(&self) -> BusPins {
        (**self).ppu_bus()
    }
    fn set_ppu_data(&mut self, data: u8) {
        (**self).set_ppu_data(data)
    }
    fn raster(&self) -> RasterPosition {
        (**self).raster()
    }
    fn color(&self) -> u8 {
        (**self).color()
    }
    fn cpu_state(&self) -> CpuSnapshot {
        (**self).cpu_state()
    }
    fn finish(&mut self) {
        (**self).finish()
    }
}

#[derive(Debug, Error)]
pub enum ModelError {
    #[error("could not load model library: {0}")]
    Load(#[source] libloading::Error),
    #[error("model library does not export `{symbol}`: {source}")]
    MissingSymbol {
        symbol: &'static str,
        #[source]
        source: libloading::Error,
    },
    #[error("model library failed to create an instance")]
    Instantiate,
}
