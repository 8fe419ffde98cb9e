//! Bus arbiters: the memory-mapped devices around the hardware model.
//!
//! Each bus cycle the model presents an address and a read/write intent; the arbiter decides
//! which device answers. The CPU side is resolved every third master tick, the PPU side on every
//! master tick. Unmapped reads return 0 and unmapped writes are dropped (open bus).

pub mod cpu_bus;
pub mod ppu_bus;


pub use cpu_bus::CpuBus;
pub use ppu_bus::PpuBus;

use crate::model::BusPins;

/// Trait for address decoding on one of the model's buses.
pub trait Bus {
    fn read(&mut self, addr: u16) -> u8;
    fn write(&mut self, addr: u16, data: u8);

    /// Service whatever the model is driving on the bus. Returns the byte to feed back on the
    /// data-in pins for a read, `None` for a write.
    fn transact(&mut self, pins: BusPins) -> Option<u8> {
        if pins.write {
            self.write(pins.addr, pins.data);
            None
        } else {
            Some(self.read(pins.addr))
        }
    }
}
