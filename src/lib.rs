//! nes-testbench: a cycle-stepped conformance testbench for a cycle-accurate NES hardware model.
//!
//! The model (typically a compiled HDL simulation) is driven one master clock at a time. The
//! testbench plays the chips around it, checks its CPU against a golden trace at every
//! instruction fetch, and turns its pixel output into frames.
//!
//! ## Modules (NESdev references)
//!
//! - **bus** – [CPU memory map](https://www.nesdev.org/wiki/CPU_memory_map) and
//!   [PPU memory map](https://www.nesdev.org/wiki/PPU_memory_map) as seen from the model's pins
//! - **cartridge** – [iNES](https://www.nesdev.org/wiki/INES) loading
//! - **config** – command-line options
//! - **context** – run counters (master cycles, CPU cycles, frames)
//! - **controller** – [Controller reading](https://www.nesdev.org/wiki/Controller_reading): $4016
//!   with nothing pressed
//! - **display** – window, headless and PNG outputs
//! - **frame** – [PPU palettes](https://www.nesdev.org/wiki/PPU_palettes) and frame assembly
//! - **mailbox** – test ROM status output at $6000
//! - **model** – the pin-level interface of the model under test
//! - **testbench** – the clock sequencer tying it all together
//! - **trace** – golden trace parsing and verification

pub mod bus;
pub mod cartridge;
pub mod config;
pub mod context;
pub mod controller;
pub mod display;
pub mod frame;
pub mod mailbox;
pub mod model;
pub mod testbench;
pub mod trace;

pub use testbench::{RunOutcome, Testbench, Verification};
