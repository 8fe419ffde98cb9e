//! NES cartridge loading from iNES format (.nes files).
//!
//! Implements the [iNES](https://www.nesdev.org/wiki/INES) format: 16-byte header (magic "NES\x1A",
//! PRG size in 16 KiB units, CHR size in 8 KiB units, flags 6–7, 8 bytes of padding), then PRG ROM,
//! then CHR ROM. The testbench has no bank switching: PRG and CHR are served flat, so anything but
//! mapper 0 (NROM) is accepted with a warning.

use std::fs;
use std::path::Path;

use log::{info, warn};

use crate::cartridge::{CartridgeError, Mirroring};

/// Magic bytes at the start of every iNES image.
pub const INES_MAGIC: [u8; 4] = *b"NES\x1A";
/// Header length in bytes.
pub const HEADER_LEN: usize = 16;
/// PRG ROM size unit (header byte 4).
pub const PRG_BANK_SIZE: usize = 16 * 1024;
/// CHR ROM size unit (header byte 5).
pub const CHR_BANK_SIZE: usize = 8 * 1024;

/// Cartridge image: PRG ROM, CHR ROM (possibly empty) and nametable mirroring.
/// Immutable once loaded.
#[derive(Debug, Clone)]
pub struct Cartridge {
    pub prg_rom: Vec<u8>,
    /// Empty when the board carries CHR RAM instead.
    pub chr_rom: Vec<u8>,
    pub mirroring: Mirroring,
    pub mapper_id: u8,
}

impl Cartridge {
    /// Load cartridge from an iNES file on disk.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, CartridgeError> {
        let path = path.as_ref();
        let data = fs::read(path).map_err(|source| CartridgeError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let cart = Self::from_bytes(&data)?;
        info!(
            "loaded {}: PRG {} KiB, CHR {} KiB, mapper {}, {:?} mirroring",
            path.display(),
            cart.prg_rom.len() / 1024,
            cart.chr_rom.len() / 1024,
            cart.mapper_id,
            cart.mirroring,
        );
        Ok(cart)
    }

    /// Parse an in-memory iNES image. Header bytes 4–5 = PRG/CHR size; bytes 6–7 = mapper number
    /// (high nibble of 6 | high nibble of 7). See iNES "File format".
    pub fn from_bytes(data: &[u8]) -> Result<Self, CartridgeError> {
        if data.len() < HEADER_LEN {
            return Err(CartridgeError::Truncated {
                expected: HEADER_LEN,
                actual: data.len(),
            });
        }
        if data[0..4] != INES_MAGIC {
            return Err(CartridgeError::BadMagic([data[0], data[1], data[2], data[3]]));
        }

        let prg_rom_size = data[4] as usize * PRG_BANK_SIZE;
        let chr_rom_size = data[5] as usize * CHR_BANK_SIZE; // 0 → 8 KiB CHR RAM on the PPU bus

        let prg_start = HEADER_LEN;
        let prg_end = prg_start + prg_rom_size;
        let chr_end = prg_end + chr_rom_size;
        if data.len() < chr_end {
            return Err(CartridgeError::Truncated {
                expected: chr_end,
                actual: data.len(),
            });
        }
        if prg_rom_size == 0 {
            return Err(CartridgeError::NoProgramRom);
        }

        // Mirroring from iNES byte 6 bit 0: 0 = horizontal, 1 = vertical.
        let mirroring = if data[6] & 1 != 0 {
            Mirroring::Vertical
        } else {
            Mirroring::Horizontal
        };
        let mapper_id = (data[6] >> 4) | (data[7] & 0xF0);
        if mapper_id != 0 {
            warn!("mapper {mapper_id} has no bank switching here; PRG/CHR are served flat");
        }

        Ok(Self {
            prg_rom: data[prg_start..prg_end].to_vec(),
            chr_rom: data[prg_end..chr_end].to_vec(),
            mirroring,
            mapper_id,
        })
    }

    /// True when the board has no CHR ROM and the PPU bus uses CHR RAM.
    pub fn uses_chr_ram(&self) -> bool {
        self.chr_rom.is_empty()
    }
}
