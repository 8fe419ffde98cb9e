//! One line of a golden trace.
//!
//! nestest-style layout: the program counter as hex at the start of the line, disassembly
//! columns we do not read, then at byte offset 48 a fixed field block:
//!
//! ```text
//! C000  4C F5 C5  JMP $C5F5                       A:00 X:00 Y:00 P:24 SP:FD PPU:  0, 21 CYC:7
//! ```
//!
//! Fields are separated by any amount of whitespace; numbers may be padded with spaces. A line
//! too short to hold the block, or a block missing a field, is a format error, never a zero.

use std::fmt;

use crate::trace::{TraceError, TraceErrorKind};

/// Byte offset of the `A:` field block.
pub const FIELD_OFFSET: usize = 48;

/// Every field a record carries, in line order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    Pc,
    A,
    X,
    Y,
    P,
    Sp,
    PpuX,
    PpuY,
    Cycle,
}

impl Field {
    pub fn name(self) -> &'static str {
        match self {
            Field::Pc => "PC",
            Field::A => "A",
            Field::X => "X",
            Field::Y => "Y",
            Field::P => "P",
            Field::Sp => "SP",
            Field::PpuX => "PPU col",
            Field::PpuY => "PPU row",
            Field::Cycle => "CYC",
        }
    }

    /// Render a value the way the trace writes it.
    pub fn format(self, value: u64) -> String {
        match self {
            Field::Pc => format!("${value:04X}"),
            Field::A | Field::X | Field::Y | Field::P | Field::Sp => format!("${value:02X}"),
            Field::PpuX | Field::PpuY | Field::Cycle => value.to_string(),
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Expected CPU state at one instruction fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TraceRecord {
    /// 1-based line number in the trace file.
    pub line: usize,
    pub pc: u16,
    pub a: u8,
    pub x: u8,
    pub y: u8,
    pub p: u8,
    pub sp: u8,
    pub ppu_x: u16,
    pub ppu_y: u16,
    pub cycle: u64,
}

impl TraceRecord {
    pub fn parse(line_no: usize, line: &str) -> Result<Self, TraceError> {
        let err = |kind| TraceError { line: line_no, kind };
        let bytes = line.as_bytes();
        if bytes.len() < FIELD_OFFSET {
            return Err(err(TraceErrorKind::TooShort { len: bytes.len() }));
        }

        let mut head = Cursor::new(bytes);
        let pc = head.hex(Field::Pc, 4).map_err(err)? as u16;

        let mut block = Cursor::new(&bytes[FIELD_OFFSET..]);
        let a = block.tagged_byte("A:", Field::A).map_err(err)?;
        let x = block.tagged_byte("X:", Field::X).map_err(err)?;
        let y = block.tagged_byte("Y:", Field::Y).map_err(err)?;
        let p = block.tagged_byte("P:", Field::P).map_err(err)?;
        let sp = block.tagged_byte("SP:", Field::Sp).map_err(err)?;

        block.tag("PPU:", Field::PpuX).map_err(err)?;
        let ppu_x = block.dec(Field::PpuX).map_err(err)?;
        block.comma(Field::PpuY).map_err(err)?;
        let ppu_y = block.dec(Field::PpuY).map_err(err)?;

        block.tag("CYC:", Field::Cycle).map_err(err)?;
        let cycle = block.dec(Field::Cycle).map_err(err)?;

        Ok(Self {
            line: line_no,
            pc,
            a,
            x,
            y,
            p,
            sp,
            ppu_x: u16::try_from(ppu_x).map_err(|_| err(TraceErrorKind::BadValue(Field::PpuX)))?,
            ppu_y: u16::try_from(ppu_y).map_err(|_| err(TraceErrorKind::BadValue(Field::PpuY)))?,
            cycle,
        })
    }

    pub fn value(&self, field: Field) -> u64 {
        match field {
            Field::Pc => self.pc as u64,
            Field::A => self.a as u64,
            Field::X => self.x as u64,
            Field::Y => self.y as u64,
            Field::P => self.p as u64,
            Field::Sp => self.sp as u64,
            Field::PpuX => self.ppu_x as u64,
            Field::PpuY => self.ppu_y as u64,
            Field::Cycle => self.cycle,
        }
    }
}

/// Scanner over the fixed-format fields, with scanf-like whitespace rules.
struct Cursor<'a> {
    rest: &'a [u8],
}

impl<'a> Cursor<'a> {
    fn new(rest: &'a [u8]) -> Self {
        Self { rest }
    }

    fn skip_whitespace(&mut self) {
        let n = self.rest.iter().take_while(|b| b.is_ascii_whitespace()).count();
        self.rest = &self.rest[n..];
    }

    fn tag(&mut self, tag: &str, field: Field) -> Result<(), TraceErrorKind> {
        self.skip_whitespace();
        match self.rest.strip_prefix(tag.as_bytes()) {
            Some(rest) => {
                self.rest = rest;
                Ok(())
            }
            None => Err(TraceErrorKind::MissingField(field)),
        }
    }

    fn comma(&mut self, field: Field) -> Result<(), TraceErrorKind> {
        match self.rest.split_first() {
            Some((b',', rest)) => {
                self.rest = rest;
                Ok(())
            }
            _ => Err(TraceErrorKind::MissingField(field)),
        }
    }

    fn digits(&mut self, radix: u32, field: Field) -> Result<&'a str, TraceErrorKind> {
        self.skip_whitespace();
        let n = self.rest.iter().take_while(|&&b| (b as char).is_digit(radix)).count();
        if n == 0 {
            return Err(TraceErrorKind::MissingField(field));
        }
        let (digits, rest) = self.rest.split_at(n);
        self.rest = rest;
        // ASCII digits only
        std::str::from_utf8(digits).map_err(|_| TraceErrorKind::BadValue(field))
    }

    /// Fixed-width hex: exactly `width` digits, so a misaligned column is caught.
    fn hex(&mut self, field: Field, width: usize) -> Result<u64, TraceErrorKind> {
        let digits = self.digits(16, field)?;
        if digits.len() != width {
            return Err(TraceErrorKind::BadValue(field));
        }
        u64::from_str_radix(digits, 16).map_err(|_| TraceErrorKind::BadValue(field))
    }

    fn tagged_byte(&mut self, tag: &str, field: Field) -> Result<u8, TraceErrorKind> {
        self.tag(tag, field)?;
        self.hex(field, 2).map(|v| v as u8)
    }

    fn dec(&mut self, field: Field) -> Result<u64, TraceErrorKind> {
        let digits = self.digits(10, field)?;
        digits.parse().map_err(|_| TraceErrorKind::BadValue(field))
    }
}
