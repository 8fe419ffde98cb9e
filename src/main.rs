//! Testbench entry point.
//!
//! Loads a cartridge and a compiled NES model, runs it against an optional golden trace with a
//! display window, then keeps the last frame on screen until a key is pressed.
//! Usage: nes-testbench <rom.nes> --model <libmodel.so> [--trace <golden.log>]

use std::process::ExitCode;

use ansi_term::Colour::{Green, Red, Yellow};
use anyhow::{Context, Result};
use clap::Parser;
use log::info;

use nes_testbench::cartridge::Cartridge;
use nes_testbench::config::Config;
use nes_testbench::display::{DisplaySink, HeadlessSink, WindowSink, capture};
use nes_testbench::model::LibraryModel;
use nes_testbench::trace::{GoldenTrace, TraceVerifier, Verdict};
use nes_testbench::{RunOutcome, Testbench, Verification};

fn main() -> Result<ExitCode> {
    env_logger::init();
    let config = Config::parse();

    let cart = Cartridge::load(&config.rom)
        .with_context(|| format!("loading cartridge {}", config.rom.display()))?;
    let model = LibraryModel::load(&config.model)
        .with_context(|| format!("loading model {}", config.model.display()))?;
    let sink: Box<dyn DisplaySink> = if config.headless {
        Box::new(HeadlessSink::new())
    } else {
        Box::new(WindowSink::open("PPU output", config.scale).context("opening window")?)
    };

    let mut bench = Testbench::new(model, cart, sink);
    if let Some(path) = &config.trace {
        let trace = GoldenTrace::open(path)
            .with_context(|| format!("opening golden trace {}", path.display()))?;
        bench = bench.with_verifier(TraceVerifier::new(trace, config.verify_options()));
    }

    let outcome = bench.run(config.frames);
    report(&outcome);

    let message = bench.mailbox().message();
    if !message.is_empty() {
        println!("Test output: {message}");
    }
    if let Some(path) = &config.screenshot {
        capture::save_png(bench.frame(), path)
            .with_context(|| format!("writing screenshot {}", path.display()))?;
        info!("saved screenshot to {}", path.display());
    }

    bench.idle();

    Ok(if outcome.failed() {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    })
}

fn report(outcome: &RunOutcome) {
    let c = &outcome.counters;
    println!(
        "Testbench complete: {} frames, {} CPU cycles, {} master cycles.",
        c.frame_count, c.cpu_cycles, c.master_cycles
    );
    match &outcome.verification {
        Verification::Disabled => {}
        Verification::Incomplete { records_checked } => println!(
            "Testbench {} after {records_checked} records: frame limit reached first",
            Yellow.bold().paint("INCOMPLETE")
        ),
        Verification::Finished(Verdict::Passed { records }) => {
            println!("Testbench {} ({records} records)!", Green.bold().paint("PASSED"))
        }
        Verification::Finished(Verdict::Diverged(divergence)) => {
            println!("Testbench {} with {divergence}", Red.bold().paint("FAILED"))
        }
        Verification::Finished(Verdict::Malformed(err)) => println!(
            "Testbench {}: golden trace is malformed ({err})",
            Red.bold().paint("FAILED")
        ),
    }
}
