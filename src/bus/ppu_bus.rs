//! PPU-side address decoding.
//!
//! [PPU memory map](https://www.nesdev.org/wiki/PPU_memory_map): pattern tables at $0000–$1FFF
//! come from CHR ROM (wrapped to its size) or, on boards without CHR ROM, from 8 KiB of CHR RAM.
//! Everything from $2000 up is one 8 KiB VRAM holding nametables and palette, mirrored by
//! `addr & $1FFF`. Nametable mirroring is the model's business; the testbench stores flat.

use crate::bus::Bus;

pub const VRAM_SIZE: usize = 0x2000;
pub const VRAM_MASK: u16 = 0x1FFF;
pub const CHR_RAM_SIZE: usize = 0x2000;
/// Palette RAM sits at $3F00 on the PPU bus, i.e. VRAM offset $1F00.
pub const PALETTE_BASE: u16 = 0x1F00;

pub struct PpuBus {
    pub vram: Box<[u8; VRAM_SIZE]>,
    /// Empty when the cartridge has no CHR ROM.
    chr_rom: Vec<u8>,
    pub chr_ram: Box<[u8; CHR_RAM_SIZE]>,
}

impl PpuBus {
    pub fn new(chr_rom: Vec<u8>) -> Self {
        Self {
            vram: Box::new([0; VRAM_SIZE]),
            chr_rom,
            chr_ram: Box::new([0; CHR_RAM_SIZE]),
        }
    }

    pub fn has_chr_rom(&self) -> bool {
        !self.chr_rom.is_empty()
    }

    /// Palette RAM byte selected by a 6-bit colour output of the video unit.
    pub fn palette_entry(&self, color: u8) -> u8 {
        self.vram[(PALETTE_BASE | color as u16) as usize]
    }
}

impl Bus for PpuBus {
    fn read(&mut self, addr: u16) -> u8 {
        if addr < 0x2000 {
            if self.has_chr_rom() {
                self.chr_rom[addr as usize % self.chr_rom.len()]
            } else {
                self.chr_ram[addr as usize]
            }
        } else {
            self.vram[(addr & VRAM_MASK) as usize]
        }
    }

    fn write(&mut self, addr: u16, data: u8) {
        if addr >= 0x2000 {
            self.vram[(addr & VRAM_MASK) as usize] = data;
        } else if !self.has_chr_rom() {
            // CHR ROM is read-only
            self.chr_ram[addr as usize] = data;
        }
    }
}
