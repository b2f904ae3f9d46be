//! Test bench for the `dmi_jtag` debug TAP.
//!
//! Resets the TAP from an unknown state, loads the IDCODE instruction and
//! reads the identification register back field by field, asserting the
//! observed controller state at every step.  Pass `-v` for per-step
//! diagnostics.

use eyre::Result;
use log::debug;

use jtag_bench::bench::Bench;
use jtag_bench::model::DmiTap;
use jtag_bench::registers::Instruction;
use jtag_bench::statemachine::{TapDriver, TapState};

fn init_logging() {
    let verbose = std::env::args().skip(1).any(|arg| arg == "-v");
    let mut builder = env_logger::Builder::from_default_env();
    if verbose {
        builder.filter_level(log::LevelFilter::Debug);
    }
    builder.init();
}

fn main() -> Result<()> {
    init_logging();

    let mut bench = Bench::new(DmiTap::NAME, DmiTap::new())?;
    bench.signal_start();

    {
        let mut tap = TapDriver::new(&mut bench, DmiTap::NAME)?;

        // Holding TMS high for 5 clock ticks resets the TAP from any state,
        // and resetting an already-reset TAP holds it there
        tap.reset()?;
        tap.reset()?;

        // Test-Logic-Reset -> Run-Test/Idle -> Select-DR -> Select-IR
        tap.change_mode(&[0])?;
        tap.expect_state(TapState::Idle)?;
        tap.change_mode(&[1, 1])?;
        tap.expect_state(TapState::SelectIR)?;

        tap.load_instruction(Instruction::Idcode)?;
        tap.expect_state(TapState::UpdateIR)?;

        // The loaded instruction becomes current once the state machine
        // proceeds past Update-IR
        tap.change_mode(&[1])?;
        tap.expect_state(TapState::SelectDR)?;
        tap.expect_instruction(Instruction::Idcode)?;

        // Select-DR -> Capture-DR -> Shift-DR
        tap.change_mode(&[0, 0])?;
        let idcode = tap.verify_idcode()?;
        debug!("IDCODE fields verified: {idcode:?}");

        // Exit1-DR -> Update-DR -> Run-Test/Idle
        tap.change_mode(&[1, 0])?;
        tap.expect_state(TapState::Idle)?;
    }

    bench.signal_done();
    Ok(())
}
