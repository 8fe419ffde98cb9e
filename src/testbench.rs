//! Clock sequencer: owns simulated time and drives the model one master clock at a time.
//!
//! One master period, in order:
//!
//! 1. clock high, `eval`, time += 5
//! 2. sample the raster position and colour into the frame assembler
//! 3. every third tick (a CPU cycle): let the trace verifier look at the CPU, then serve the CPU
//!    bus; address and intent settle on the rising half and read data must be in place before
//!    the falling edge latches it
//! 4. clock low, `eval`, time += 3
//! 5. serve the PPU bus
//! 6. `eval`, time += 2
//!
//! Everything runs on the caller's thread; `step` is not reentrant.

use log::{debug, info};

use crate::bus::{Bus, CpuBus, PpuBus};
use crate::cartridge::Cartridge;
use crate::context::RunContext;
use crate::display::{self, DisplaySink};
use crate::frame::{FrameAssembler, FrameBuffer};
use crate::mailbox::Mailbox;
use crate::model::HardwareModel;
use crate::trace::{TraceVerifier, Verdict};

/// Simulated time spent in each phase of a master period.
const RISE_TIME: u64 = 5;
const FALL_TIME: u64 = 3;
const SETTLE_TIME: u64 = 2;
/// Time between the reset sequence's clock edges.
const RESET_TIME: u64 = 5;

/// How verification ended, if it did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verification {
    /// No golden trace was supplied.
    Disabled,
    /// The run stopped before the trace was used up.
    Incomplete { records_checked: usize },
    Finished(Verdict),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunOutcome {
    pub counters: RunContext,
    pub verification: Verification,
}

impl RunOutcome {
    /// Divergence or unreadable trace.
    pub fn failed(&self) -> bool {
        matches!(
            self.verification,
            Verification::Finished(Verdict::Diverged(_) | Verdict::Malformed(_))
        )
    }
}

pub struct Testbench<M: HardwareModel, S: DisplaySink> {
    pub model: M,
    pub cpu_bus: CpuBus,
    pub ppu_bus: PpuBus,
    assembler: FrameAssembler,
    verifier: Option<TraceVerifier>,
    sink: S,
    ctx: RunContext,
    reset_done: bool,
}

impl<M: HardwareModel, S: DisplaySink> Testbench<M, S> {
    pub fn new(model: M, cart: Cartridge, sink: S) -> Self {
        Self {
            model,
            cpu_bus: CpuBus::new(cart.prg_rom),
            ppu_bus: PpuBus::new(cart.chr_rom),
            assembler: FrameAssembler::new(),
            verifier: None,
            sink,
            ctx: RunContext::new(),
            reset_done: false,
        }
    }

    /// Check the CPU against a golden trace for the rest of the run.
    pub fn with_verifier(mut self, verifier: TraceVerifier) -> Self {
        self.verifier = Some(verifier);
        self
    }

    pub fn context(&self) -> &RunContext {
        &self.ctx
    }

    pub fn verifier(&self) -> Option<&TraceVerifier> {
        self.verifier.as_ref()
    }

    pub fn mailbox(&self) -> &Mailbox {
        &self.cpu_bus.mailbox
    }

    /// The frame in progress, or the last completed one right after a frame ends.
    pub fn frame(&self) -> &FrameBuffer {
        self.assembler.frame()
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    /// After the run: keep showing the last frame until the sink asks to quit.
    pub fn idle(&mut self) {
        display::idle(&mut self.sink, self.assembler.frame());
    }

    /// Pulse reset the way the model expects: a clock pulse with reset held, then release.
    /// Runs once; `step` calls it if needed.
    pub fn reset(&mut self) {
        if self.reset_done {
            return;
        }
        let m = &mut self.model;
        m.set_reset(false);
        m.eval();
        m.set_reset(true);
        m.set_clock(false);
        m.eval();
        m.set_clock(true);
        m.eval();
        m.set_clock(false);
        m.advance_time(RESET_TIME);
        m.eval();
        m.set_reset(false);
        m.advance_time(RESET_TIME);
        self.reset_done = true;
        debug!("reset sequence complete");
    }

    /// Advance exactly one master clock period.
    pub fn step(&mut self) {
        self.reset();
        let m = &mut self.model;

        m.set_clock(true);
        m.eval();
        m.advance_time(RISE_TIME);

        let raster = m.raster();
        self.assembler
            .sample(raster, m.color(), &self.ppu_bus, &mut self.ctx, &mut self.sink);

        let cpu_cycle = self.ctx.is_cpu_cycle();
        if cpu_cycle {
            if let Some(verifier) = &mut self.verifier {
                verifier.on_cpu_cycle(&m.cpu_state(), raster, &self.ctx);
            }
            if let Some(data) = self.cpu_bus.transact(m.cpu_bus()) {
                m.set_cpu_data(data);
            }
        }

        m.set_clock(false);
        m.eval();
        m.advance_time(FALL_TIME);

        if let Some(data) = self.ppu_bus.transact(m.ppu_bus()) {
            m.set_ppu_data(data);
        }
        m.eval();
        m.advance_time(SETTLE_TIME);

        if cpu_cycle {
            self.ctx.cpu_cycles += 1;
        }
        self.ctx.master_cycles += 1;
    }

    /// Step until `max_frames` frames have completed or verification fails.
    pub fn run(&mut self, max_frames: u64) -> RunOutcome {
        self.reset();
        while self.ctx.frame_count < max_frames {
            self.step();
            if self.verifier.as_ref().is_some_and(TraceVerifier::has_failed) {
                break;
            }
        }
        self.model.finish();
        info!(
            "run ended: {} frames, {} CPU cycles, {} master cycles",
            self.ctx.frame_count, self.ctx.cpu_cycles, self.ctx.master_cycles
        );
        self.outcome()
    }

    pub fn outcome(&self) -> RunOutcome {
        let verification = match &self.verifier {
            None => Verification::Disabled,
            Some(v) => match v.verdict() {
                Some(verdict) => Verification::Finished(verdict.clone()),
                None => Verification::Incomplete {
                    records_checked: v.records_checked(),
                },
            },
        };
        RunOutcome {
            counters: self.ctx,
            verification,
        }
    }
}
