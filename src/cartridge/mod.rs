//! NES cartridge image.
//!
//! - **cartridge**: Loads iNES (.nes) files into PRG ROM, CHR ROM and the mirroring flag.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

pub mod cartridge;

pub use cartridge::Cartridge;

/// Nametable mirroring mode, from iNES flags 6 bit 0.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mirroring {
    Horizontal,
    Vertical,
}

/// Why a cartridge image could not be loaded. Always fatal to a run.
#[derive(Debug, Error)]
pub enum CartridgeError {
    #[error("could not read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("not an iNES image (magic {0:02X?})")]
    BadMagic([u8; 4]),
    #[error("image truncated: need {expected} bytes, have {actual}")]
    Truncated { expected: usize, actual: usize },
    #[error("image has no PRG ROM")]
    NoProgramRom,
}
