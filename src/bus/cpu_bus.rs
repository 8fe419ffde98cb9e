//! CPU-side address decoding.
//!
//! [CPU memory map](https://www.nesdev.org/wiki/CPU_memory_map) as far as the testbench models it:
//!
//! | Range         | Read                         | Write                 |
//! |---------------|------------------------------|-----------------------|
//! | $0000–$1FFF   | 2 KiB work RAM (mirrored 4×) | work RAM              |
//! | $2000–$3FFF   | work RAM (`addr & $7FF`)     | dropped               |
//! | $4016         | controller port              | controller strobe     |
//! | $6000–$6FFF   | 0                            | diagnostic mailbox    |
//! | $8000–$FFFF   | PRG ROM, wrapped to its size | dropped               |
//!
//! The $2000–$3FFF read path lands in RAM because the PPU registers live inside the model.

use log::trace;

use crate::bus::Bus;
use crate::controller::Controller;
use crate::mailbox::{MAILBOX_BASE, Mailbox};

pub const RAM_SIZE: usize = 0x800;
pub const RAM_MASK: u16 = 0x07FF;
pub const CONTROLLER_PORT: u16 = 0x4016;

pub struct CpuBus {
    pub ram: [u8; RAM_SIZE],
    prg_rom: Vec<u8>,
    pub controller: Controller,
    pub mailbox: Mailbox,
}

impl CpuBus {
    /// Create a bus serving the given PRG ROM. `prg_rom` must not be empty.
    pub fn new(prg_rom: Vec<u8>) -> Self {
        Self {
            ram: [0; RAM_SIZE],
            prg_rom,
            controller: Controller::new(),
            mailbox: Mailbox::new(),
        }
    }
}

impl Bus for CpuBus {
    fn read(&mut self, addr: u16) -> u8 {
        match addr {
            // PRG ROM: images smaller than 32 KiB repeat across the window
            0x8000..=0xFFFF => self.prg_rom[addr as usize % self.prg_rom.len()],
            0x0000..=0x3FFF => self.ram[(addr & RAM_MASK) as usize],
            CONTROLLER_PORT => self.controller.read(),
            _ => 0,
        }
    }

    fn write(&mut self, addr: u16, data: u8) {
        if addr == CONTROLLER_PORT {
            self.controller.strobe();
        }
        if Mailbox::contains(addr) {
            trace!("mailbox ${addr:04X} = ${data:02X}");
            self.mailbox.write((addr - MAILBOX_BASE) as usize, data);
        }
        if addr < 0x2000 {
            self.ram[(addr & RAM_MASK) as usize] = data;
        }
    }
}
