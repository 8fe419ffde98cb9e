//! Run counters shared by every component of one testbench run.

/// Master clock ticks per CPU cycle (NTSC 2A03: the PPU dot clock is 3× the CPU clock).
pub const MASTER_PER_CPU: u64 = 3;

/// Simulated-time counters. Created at run start and only ever counted up.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunContext {
    pub master_cycles: u64,
    pub cpu_cycles: u64,
    pub frame_count: u64,
}

impl RunContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// True on master ticks that carry a CPU bus cycle.
    pub fn is_cpu_cycle(&self) -> bool {
        self.master_cycles % MASTER_PER_CPU == 0
    }
}
