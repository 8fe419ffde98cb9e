//! Golden trace reader and verifier.
//!
//! The verifier is consulted on every CPU cycle but acts only on instruction fetch boundaries:
//! the cycle where the model's fetch state rises, outside DMA. At each boundary it takes the
//! next reference record and compares PC, A, X, Y, P, SP, the raster position and the CPU cycle
//! count. P is compared with bit 5 forced on, since the reference always shows the unused flag
//! set. The first mismatch or unreadable line finishes verification for good; so does running
//! out of records, which is a pass.

use std::fmt;
use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::Path;

use log::{info, trace};

use crate::context::RunContext;
use crate::model::{CpuSnapshot, RasterPosition};
use crate::trace::record::{Field, TraceRecord};
use crate::trace::{TraceError, TraceErrorKind};

/// Status bit 5: unused, reads back as 1.
pub const FLAG_UNUSED: u8 = 1 << 5;

const ALL_FIELDS: [Field; 9] = [
    Field::Pc,
    Field::A,
    Field::X,
    Field::Y,
    Field::P,
    Field::Sp,
    Field::PpuX,
    Field::PpuY,
    Field::Cycle,
];

/// Forward-only reader over a reference log. Reopen the file to start again.
pub struct GoldenTrace {
    reader: Box<dyn BufRead>,
    line_no: usize,
    buf: String,
}

impl GoldenTrace {
    pub fn open(path: impl AsRef<Path>) -> io::Result<Self> {
        Ok(Self::from_reader(BufReader::new(File::open(path)?)))
    }

    pub fn from_reader(reader: impl BufRead + 'static) -> Self {
        Self {
            reader: Box::new(reader),
            line_no: 0,
            buf: String::new(),
        }
    }

    /// Next record, or `None` once the log is exhausted. Blank lines are skipped.
    pub fn next_record(&mut self) -> Option<Result<TraceRecord, TraceError>> {
        loop {
            self.buf.clear();
            self.line_no += 1;
            match self.reader.read_line(&mut self.buf) {
                Ok(0) => return None,
                Ok(_) => {}
                Err(e) => {
                    return Some(Err(TraceError {
                        line: self.line_no,
                        kind: TraceErrorKind::Io(e.to_string()),
                    }));
                }
            }
            let line = self.buf.trim_end_matches(['\r', '\n']);
            if line.trim().is_empty() {
                continue;
            }
            return Some(TraceRecord::parse(self.line_no, line));
        }
    }
}

impl Iterator for GoldenTrace {
    type Item = Result<TraceRecord, TraceError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_record()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VerifyOptions {
    /// Compare the `PPU:` columns against the raster position.
    pub check_raster: bool,
}

impl Default for VerifyOptions {
    fn default() -> Self {
        Self { check_raster: true }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldMismatch {
    pub field: Field,
    pub expected: u64,
    pub actual: u64,
}

impl fmt::Display for FieldMismatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} expected {}, got {}",
            self.field,
            self.field.format(self.expected),
            self.field.format(self.actual)
        )
    }
}

/// First point where the model disagreed with the reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Divergence {
    /// 1-based index of the record among those checked.
    pub record: usize,
    pub line: usize,
    /// The model's PC at the divergence.
    pub pc: u16,
    pub mismatches: Vec<FieldMismatch>,
}

impl Divergence {
    pub fn fields(&self) -> impl Iterator<Item = Field> + '_ {
        self.mismatches.iter().map(|m| m.field)
    }
}

impl fmt::Display for Divergence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "mismatch at PC = ${:04X} (record {}, line {}): ",
            self.pc, self.record, self.line
        )?;
        for (i, m) in self.mismatches.iter().enumerate() {
            if i > 0 {
                f.write_str("; ")?;
            }
            write!(f, "{m}")?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    /// The reference ran out with every record matching.
    Passed { records: usize },
    Diverged(Divergence),
    Malformed(TraceError),
}

impl Verdict {
    pub fn is_pass(&self) -> bool {
        matches!(self, Verdict::Passed { .. })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VerifierState {
    Active,
    Finished(Verdict),
}

pub struct TraceVerifier {
    trace: GoldenTrace,
    options: VerifyOptions,
    state: VerifierState,
    records_checked: usize,
    /// Previous cycle was a fetch outside DMA.
    was_fetch: bool,
}

impl TraceVerifier {
    pub fn new(trace: GoldenTrace, options: VerifyOptions) -> Self {
        Self {
            trace,
            options,
            state: VerifierState::Active,
            records_checked: 0,
            was_fetch: false,
        }
    }

    pub fn state(&self) -> &VerifierState {
        &self.state
    }

    pub fn verdict(&self) -> Option<&Verdict> {
        match &self.state {
            VerifierState::Active => None,
            VerifierState::Finished(verdict) => Some(verdict),
        }
    }

    pub fn is_finished(&self) -> bool {
        self.verdict().is_some()
    }

    /// Verification ended on a divergence or a bad trace line.
    pub fn has_failed(&self) -> bool {
        self.verdict().is_some_and(|v| !v.is_pass())
    }

    pub fn records_checked(&self) -> usize {
        self.records_checked
    }

    /// Called once per CPU cycle with the model's state. Checks a record if this cycle is an
    /// instruction fetch boundary; returns whether it did.
    pub fn on_cpu_cycle(
        &mut self,
        cpu: &CpuSnapshot,
        raster: RasterPosition,
        ctx: &RunContext,
    ) -> bool {
        // edge of the DMA-gated fetch state: a fetch begun under DMA is checked when DMA ends
        let fetch = cpu.fetch && !cpu.dma;
        let boundary = fetch && !self.was_fetch;
        self.was_fetch = fetch;
        if !boundary || self.is_finished() {
            return false;
        }
        self.check(cpu, raster, ctx);
        true
    }

    /// Compare the next reference record against the model, finishing on exhaustion, a bad
    /// line, or any mismatch.
    pub fn check(&mut self, cpu: &CpuSnapshot, raster: RasterPosition, ctx: &RunContext) {
        if self.is_finished() {
            return;
        }
        trace!(
            "{:04X} A:{:02X} X:{:02X} Y:{:02X} P:{:02X} SP:{:02X} PPU:{:3},{:3} CYC:{}",
            cpu.pc, cpu.a, cpu.x, cpu.y, cpu.status, cpu.sp, raster.x, raster.y, ctx.cpu_cycles
        );

        let record = match self.trace.next_record() {
            None => {
                info!("golden trace exhausted after {} records", self.records_checked);
                self.state = VerifierState::Finished(Verdict::Passed {
                    records: self.records_checked,
                });
                return;
            }
            Some(Err(err)) => {
                self.state = VerifierState::Finished(Verdict::Malformed(err));
                return;
            }
            Some(Ok(record)) => record,
        };
        self.records_checked += 1;

        let actual = TraceRecord {
            line: record.line,
            pc: cpu.pc,
            a: cpu.a,
            x: cpu.x,
            y: cpu.y,
            p: cpu.status | FLAG_UNUSED,
            sp: cpu.sp,
            ppu_x: raster.x,
            ppu_y: raster.y,
            cycle: ctx.cpu_cycles,
        };

        let check_raster = self.options.check_raster;
        let mismatches: Vec<FieldMismatch> = ALL_FIELDS
            .into_iter()
            .filter(|&field| check_raster || !matches!(field, Field::PpuX | Field::PpuY))
            .filter(|&field| record.value(field) != actual.value(field))
            .map(|field| FieldMismatch {
                field,
                expected: record.value(field),
                actual: actual.value(field),
            })
            .collect();

        if !mismatches.is_empty() {
            self.state = VerifierState::Finished(Verdict::Diverged(Divergence {
                record: self.records_checked,
                line: record.line,
                pc: cpu.pc,
                mismatches,
            }));
        }
    }
}
