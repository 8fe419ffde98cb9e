//! Scripted hardware model and ROM builder shared by the integration tests.

#![allow(dead_code)]

use std::collections::HashMap;

use nes_testbench::cartridge::Cartridge;
use nes_testbench::model::{BusPins, CpuSnapshot, HardwareModel, RasterPosition};

pub const DOTS_PER_LINE: u64 = 341;
pub const LINES_PER_FRAME: u64 = 262;
/// Master ticks from the first dot to the frame end dot (0, 261).
pub const FIRST_FRAME_END_TICK: u64 = 261 * DOTS_PER_LINE;
pub const TICKS_PER_FRAME: u64 = DOTS_PER_LINE * LINES_PER_FRAME;

/// A pin-level event seen by the model.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Call {
    Reset(bool),
    Clock(bool),
    Eval,
    Time(u64),
    CpuData(u8),
    PpuData(u8),
}

/// Raster position on the given master tick of an endless 341×262 sweep.
pub fn sweep(tick: u64) -> RasterPosition {
    RasterPosition {
        x: (tick % DOTS_PER_LINE) as u16,
        y: ((tick / DOTS_PER_LINE) % LINES_PER_FRAME) as u16,
    }
}

/// Model whose outputs follow a script keyed by master tick and CPU cycle.
///
/// Ticks count rising clock edges taken out of reset, starting at 0. The raster advances one dot
/// per tick and CPU cycle `n` spans ticks `3n..3n+3`.
pub struct ScriptedModel {
    pub calls: Vec<Call>,
    /// Keep `calls`; off by default so multi-frame runs stay small.
    pub record_calls: bool,
    pub time: u64,
    pub finished: bool,
    reset: bool,
    clock: bool,
    ticks: u64,
    raster: RasterPosition,
    pub color: u8,
    /// Bus activity per CPU cycle; unscripted cycles read $0000.
    pub cpu_script: HashMap<u64, BusPins>,
    /// (CPU cycle, byte) for every byte driven onto the CPU data-in pins.
    pub cpu_data: Vec<(u64, u8)>,
    /// Bus activity per master tick; unscripted ticks read $0000.
    pub ppu_script: HashMap<u64, BusPins>,
    /// (tick, byte) for every byte driven onto the PPU data-in pins.
    pub ppu_data: Vec<(u64, u8)>,
    cpu: Box<dyn Fn(u64) -> CpuSnapshot>,
}

impl ScriptedModel {
    pub fn new() -> Self {
        Self {
            calls: Vec::new(),
            record_calls: false,
            time: 0,
            finished: false,
            reset: false,
            clock: false,
            ticks: 0,
            raster: sweep(0),
            color: 0,
            cpu_script: HashMap::new(),
            cpu_data: Vec::new(),
            ppu_script: HashMap::new(),
            ppu_data: Vec::new(),
            cpu: Box::new(|_| CpuSnapshot::default()),
        }
    }

    pub fn recording(mut self) -> Self {
        self.record_calls = true;
        self
    }

    /// CPU register file as a function of the CPU cycle.
    pub fn with_cpu(mut self, cpu: impl Fn(u64) -> CpuSnapshot + 'static) -> Self {
        self.cpu = Box::new(cpu);
        self
    }

    pub fn cpu_write(mut self, cycle: u64, addr: u16, data: u8) -> Self {
        self.cpu_script.insert(cycle, BusPins { addr, data, write: true });
        self
    }

    pub fn cpu_read(mut self, cycle: u64, addr: u16) -> Self {
        self.cpu_script.insert(cycle, BusPins { addr, data: 0, write: false });
        self
    }

    pub fn ppu_write(mut self, tick: u64, addr: u16, data: u8) -> Self {
        self.ppu_script.insert(tick, BusPins { addr, data, write: true });
        self
    }

    pub fn ppu_read(mut self, tick: u64, addr: u16) -> Self {
        self.ppu_script.insert(tick, BusPins { addr, data: 0, write: false });
        self
    }

    /// Byte fed back on the CPU data-in pins during `cycle`, if any.
    pub fn cpu_data_at(&self, cycle: u64) -> Option<u8> {
        self.cpu_data.iter().find(|(c, _)| *c == cycle).map(|&(_, d)| d)
    }

    pub fn ppu_data_at(&self, tick: u64) -> Option<u8> {
        self.ppu_data.iter().find(|(t, _)| *t == tick).map(|&(_, d)| d)
    }

    fn tick(&self) -> u64 {
        self.ticks.saturating_sub(1)
    }

    fn log(&mut self, call: Call) {
        if self.record_calls {
            self.calls.push(call);
        }
    }
}

impl HardwareModel for ScriptedModel {
    fn set_reset(&mut self, asserted: bool) {
        self.reset = asserted;
        self.log(Call::Reset(asserted));
    }

    fn set_clock(&mut self, high: bool) {
        if high && !self.clock && !self.reset {
            self.raster = sweep(self.ticks);
            self.ticks += 1;
        }
        self.clock = high;
        self.log(Call::Clock(high));
    }

    fn eval(&mut self) {
        self.log(Call::Eval);
    }

    fn advance_time(&mut self, units: u64) {
        self.time += units;
        self.log(Call::Time(units));
    }

    fn cpu_bus(&self) -> BusPins {
        self.cpu_script.get(&(self.tick() / 3)).copied().unwrap_or_default()
    }

    fn set_cpu_data(&mut self, data: u8) {
        let cycle = self.tick() / 3;
        self.cpu_data.push((cycle, data));
        self.log(Call::CpuData(data));
    }

    fn ppu_bus(&self) -> BusPins {
        self.ppu_script.get(&self.tick()).copied().unwrap_or_default()
    }

    fn set_ppu_data(&mut self, data: u8) {
        let tick = self.tick();
        self.ppu_data.push((tick, data));
        self.log(Call::PpuData(data));
    }

    fn raster(&self) -> RasterPosition {
        self.raster
    }

    fn color(&self) -> u8 {
        self.color
    }

    fn cpu_state(&self) -> CpuSnapshot {
        (self.cpu)(self.tick() / 3)
    }

    fn finish(&mut self) {
        self.finished = true;
    }
}

/// iNES image: `prg_banks` × 16 KiB of PRG filled with the low byte of each offset, and
/// `chr_banks` × 8 KiB of CHR filled with `0xC0 | (offset & 0x3F)`.
pub fn ines(prg_banks: u8, chr_banks: u8) -> Vec<u8> {
    let mut data = vec![b'N', b'E', b'S', 0x1A, prg_banks, chr_banks, 0x01, 0x00];
    data.resize(16, 0);
    data.extend((0..prg_banks as usize * 0x4000).map(|i| i as u8));
    data.extend((0..chr_banks as usize * 0x2000).map(|i| 0xC0 | (i as u8 & 0x3F)));
    data
}

pub fn cartridge(prg_banks: u8, chr_banks: u8) -> Cartridge {
    Cartridge::from_bytes(&ines(prg_banks, chr_banks)).expect("valid iNES image")
}
