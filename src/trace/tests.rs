use std::io::Cursor;

use pretty_assertions::assert_eq;

use crate::context::RunContext;
use crate::model::{CpuSnapshot, RasterPosition};
use crate::trace::*;

/// A trace line with the field block at byte 48, disassembly column padded like nestest.
fn line(cpu: &CpuSnapshot, raster: RasterPosition, cycle: u64) -> String {
    format!(
        "{:04X}  {:<42}A:{:02X} X:{:02X} Y:{:02X} P:{:02X} SP:{:02X} PPU:{:3},{:3} CYC:{}",
        cpu.pc,
        "EA        NOP",
        cpu.a,
        cpu.x,
        cpu.y,
        cpu.status,
        cpu.sp,
        raster.x,
        raster.y,
        cycle
    )
}

fn cpu(pc: u16, a: u8) -> CpuSnapshot {
    CpuSnapshot {
        pc,
        a,
        x: 0x01,
        y: 0x02,
        status: 0x24,
        sp: 0xFD,
        fetch: true,
        dma: false,
    }
}

fn verifier(text: String, options: VerifyOptions) -> TraceVerifier {
    TraceVerifier::new(GoldenTrace::from_reader(Cursor::new(text)), options)
}

fn ctx(cpu_cycles: u64) -> RunContext {
    RunContext {
        cpu_cycles,
        ..RunContext::default()
    }
}

const RASTER: RasterPosition = RasterPosition { x: 21, y: 0 };

#[test]
fn parses_a_nestest_line() {
    let text = "C000  4C F5 C5  JMP $C5F5                       A:00 X:00 Y:00 P:24 SP:FD PPU:  0, 21 CYC:7";
    let record = TraceRecord::parse(1, text).unwrap();
    assert_eq!(
        record,
        TraceRecord {
            line: 1,
            pc: 0xC000,
            a: 0,
            x: 0,
            y: 0,
            p: 0x24,
            sp: 0xFD,
            ppu_x: 0,
            ppu_y: 21,
            cycle: 7,
        }
    );
}

#[test]
fn short_line_is_a_format_error() {
    let err = TraceRecord::parse(3, "C000  4C F5 C5  JMP $C5F5").unwrap_err();
    assert_eq!(err.line, 3);
    assert_eq!(err.kind, TraceErrorKind::TooShort { len: 25 });
}

#[test]
fn missing_field_is_a_format_error() {
    let text = format!("{:<48}A:00 X:00 Y:00 P:24 PPU:  0, 21 CYC:7", "C000");
    let err = TraceRecord::parse(1, &text).unwrap_err();
    assert_eq!(err.kind, TraceErrorKind::MissingField(Field::Sp));
}

#[test]
fn registers_must_be_fixed_width() {
    let short = format!("{:<48}A:0 X:00 Y:00 P:24 SP:FD PPU:  0, 21 CYC:7", "C000");
    let err = TraceRecord::parse(1, &short).unwrap_err();
    assert_eq!(err.kind, TraceErrorKind::BadValue(Field::A));

    let padded = format!("{:<48}A:00 X:00 Y:00 P:24 SP:0000F PPU:  0, 21 CYC:7", "C000");
    let err = TraceRecord::parse(1, &padded).unwrap_err();
    assert_eq!(err.kind, TraceErrorKind::BadValue(Field::Sp));

    let pc = format!("{:<48}A:00 X:00 Y:00 P:24 SP:FD PPU:  0, 21 CYC:7", "C00");
    let err = TraceRecord::parse(1, &pc).unwrap_err();
    assert_eq!(err.kind, TraceErrorKind::BadValue(Field::Pc));
}

#[test]
fn oversized_register_is_a_format_error() {
    let text = format!("{:<48}A:100 X:00 Y:00 P:24 SP:FD PPU:  0, 21 CYC:7", "C000");
    let err = TraceRecord::parse(1, &text).unwrap_err();
    assert_eq!(err.kind, TraceErrorKind::BadValue(Field::A));
}

#[test]
fn blank_lines_are_skipped() {
    let mut trace = GoldenTrace::from_reader(Cursor::new(format!(
        "{}\r\n\r\n{}\n",
        line(&cpu(0xC000, 0), RASTER, 7),
        line(&cpu(0xC001, 0), RASTER, 9)
    )));
    assert_eq!(trace.next_record().unwrap().unwrap().line, 1);
    assert_eq!(trace.next_record().unwrap().unwrap().line, 3);
    assert!(trace.next_record().is_none());
}

#[test]
fn divergence_is_reported_at_the_first_bad_record() {
    const K: usize = 5;
    let mut text = String::new();
    for i in 0..=K {
        // record K+1 expects A = $FF, the model will show i
        let a = if i == K { 0xFF } else { i as u8 };
        text += &line(&cpu(0xC000 + i as u16, a), RASTER, i as u64);
        text.push('\n');
    }
    let mut v = verifier(text, VerifyOptions::default());

    for i in 0..=K {
        v.check(&cpu(0xC000 + i as u16, i as u8), RASTER, &ctx(i as u64));
        if i < K {
            assert_eq!(v.state(), &VerifierState::Active, "record {}", i + 1);
        }
    }

    let Some(Verdict::Diverged(divergence)) = v.verdict() else {
        panic!("expected a divergence, got {:?}", v.state());
    };
    assert_eq!(divergence.record, K + 1);
    assert_eq!(divergence.pc, 0xC000 + K as u16);
    assert_eq!(
        divergence.mismatches,
        vec![FieldMismatch {
            field: Field::A,
            expected: 0xFF,
            actual: K as u64,
        }]
    );
    assert!(v.has_failed());
}

#[test]
fn exhausted_trace_passes() {
    let text = format!("{}\n", line(&cpu(0xC000, 0), RASTER, 0));
    let mut v = verifier(text, VerifyOptions::default());
    v.check(&cpu(0xC000, 0), RASTER, &ctx(0));
    assert!(!v.is_finished());
    v.check(&cpu(0xC002, 0), RASTER, &ctx(2));
    assert_eq!(v.verdict(), Some(&Verdict::Passed { records: 1 }));
    assert!(!v.has_failed());
}

#[test]
fn malformed_line_is_not_a_divergence() {
    let text = format!("{}\nC002 garbage\n", line(&cpu(0xC000, 0), RASTER, 0));
    let mut v = verifier(text, VerifyOptions::default());
    v.check(&cpu(0xC000, 0), RASTER, &ctx(0));
    v.check(&cpu(0xC002, 0), RASTER, &ctx(2));
    assert!(matches!(
        v.verdict(),
        Some(Verdict::Malformed(TraceError { line: 2, kind: TraceErrorKind::TooShort { .. } }))
    ));
    assert!(v.has_failed());
}

#[test]
fn status_is_compared_with_the_unused_bit_set() {
    let text = format!("{}\n", line(&cpu(0xC000, 0), RASTER, 0));
    let mut v = verifier(text, VerifyOptions::default());
    let mut model = cpu(0xC000, 0);
    model.status = 0x04; // reference shows $24
    v.check(&model, RASTER, &ctx(0));
    assert_eq!(v.state(), &VerifierState::Active);
}

#[test]
fn cycle_and_raster_mismatches_are_all_listed() {
    let text = format!("{}\n", line(&cpu(0xC000, 0), RASTER, 7));
    let mut v = verifier(text, VerifyOptions::default());
    v.check(&cpu(0xC000, 0), RasterPosition { x: 22, y: 1 }, &ctx(8));
    let Some(Verdict::Diverged(d)) = v.verdict() else {
        panic!("expected a divergence");
    };
    assert_eq!(
        d.fields().collect::<Vec<_>>(),
        vec![Field::PpuX, Field::PpuY, Field::Cycle]
    );
}

#[test]
fn raster_can_be_left_out() {
    let text = format!("{}\n", line(&cpu(0xC000, 0), RASTER, 7));
    let mut v = verifier(text, VerifyOptions { check_raster: false });
    v.check(&cpu(0xC000, 0), RasterPosition { x: 300, y: 200 }, &ctx(7));
    assert_eq!(v.state(), &VerifierState::Active);
    assert_eq!(v.records_checked(), 1);
}

#[test]
fn one_check_per_fetch_and_none_during_dma() {
    let text = [0u16, 2, 4]
        .iter()
        .map(|&pc| line(&cpu(pc, 0), RASTER, 0) + "\n")
        .collect::<String>();
    let mut v = verifier(text, VerifyOptions { check_raster: false });

    let mut fetch = cpu(0, 0);
    assert!(v.on_cpu_cycle(&fetch, RASTER, &ctx(0)));
    // fetch state held over a second cycle: same instruction
    assert!(!v.on_cpu_cycle(&fetch, RASTER, &ctx(0)));

    let mut execute = fetch;
    execute.fetch = false;
    assert!(!v.on_cpu_cycle(&execute, RASTER, &ctx(0)));

    fetch.pc = 2;
    fetch.dma = true;
    assert!(!v.on_cpu_cycle(&fetch, RASTER, &ctx(0)));
    assert_eq!(v.records_checked(), 1);
}

#[test]
fn fetch_starting_under_dma_is_checked_when_dma_ends() {
    let text = [0u16, 2, 4]
        .iter()
        .map(|&pc| line(&cpu(pc, 0), RASTER, 0) + "\n")
        .collect::<String>();
    let mut v = verifier(text, VerifyOptions { check_raster: false });

    let mut fetch = cpu(0, 0);
    assert!(v.on_cpu_cycle(&fetch, RASTER, &ctx(0)));
    let mut execute = fetch;
    execute.fetch = false;
    assert!(!v.on_cpu_cycle(&execute, RASTER, &ctx(0)));

    fetch.pc = 2;
    fetch.dma = true;
    for _ in 0..4 {
        assert!(!v.on_cpu_cycle(&fetch, RASTER, &ctx(0)));
    }
    fetch.dma = false;
    assert!(v.on_cpu_cycle(&fetch, RASTER, &ctx(0)));
    assert!(!v.on_cpu_cycle(&fetch, RASTER, &ctx(0)));
    assert_eq!(v.records_checked(), 2);
    assert_eq!(v.verdict(), None);
}

#[test]
fn divergence_message_names_field_values_and_pc() {
    let d = Divergence {
        record: 4,
        line: 4,
        pc: 0xC5F5,
        mismatches: vec![FieldMismatch {
            field: Field::A,
            expected: 0x10,
            actual: 0x11,
        }],
    };
    assert_eq!(
        d.to_string(),
        "mismatch at PC = $C5F5 (record 4, line 4): A expected $10, got $11"
    );
}
