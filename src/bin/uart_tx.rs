//! Test bench for the `uart_tx` transmitter.
//!
//! Checks reset behavior, the idle line level, a single-byte frame and a
//! back-to-back burst, sampling the line once per baud period.  Pass `-v`
//! for per-bit diagnostics.

use eyre::{ensure, Result};
use log::debug;

use jtag_bench::bench::Bench;
use jtag_bench::dut::{Dut, PortId};
use jtag_bench::model::uart::{UartTx, CYCLES_PER_BAUD};

struct Pins {
    rst: PortId,
    start: PortId,
    data: PortId,
    busy: PortId,
    tx: PortId,
}

fn init_logging() {
    let verbose = std::env::args().skip(1).any(|arg| arg == "-v");
    let mut builder = env_logger::Builder::from_default_env();
    if verbose {
        builder.filter_level(log::LevelFilter::Debug);
    }
    builder.init();
}

fn tick_baud(bench: &mut Bench<UartTx>, baud_ticks: u64) -> Result<()> {
    for _ in 0..baud_ticks {
        bench.ticks(CYCLES_PER_BAUD + 1)?;
    }
    Ok(())
}

fn expect_idle(bench: &Bench<UartTx>, pins: &Pins) -> Result<()> {
    debug!("IDLE TX: {} (expected: 1)", bench.dut().get(pins.tx));
    ensure!(bench.dut().get(pins.busy) == 0, "transmitter busy while idle");
    ensure!(bench.dut().get(pins.tx) == 1, "tx line not idle high");
    Ok(())
}

fn test_transmit(bench: &mut Bench<UartTx>, pins: &Pins, data: u8, continuous: bool) -> Result<()> {
    bench.dut_mut().set(pins.data, data.into());
    bench.dut_mut().set(pins.start, 1);

    // Start bit.  Leaving idle takes 2 clock ticks to register the change
    // on i_start; an already-busy transmitter rolls straight from the stop
    // bit into the next start bit.
    if bench.dut().get(pins.busy) == 0 {
        debug!("IDLE TX: {} (expected: 1)", bench.dut().get(pins.tx));
        ensure!(bench.dut().get(pins.tx) == 1, "tx line not idle high");
        bench.ticks(2)?;
    } else {
        tick_baud(bench, 1)?;
    }
    debug!("START TX: {} (expected: 0)", bench.dut().get(pins.tx));
    ensure!(bench.dut().get(pins.busy) == 1, "transmitter not busy");
    ensure!(bench.dut().get(pins.tx) == 0, "missing start bit");

    if !continuous {
        bench.dut_mut().set(pins.start, 0);
    }

    // Data bits, least significant first
    for i in 0..8 {
        tick_baud(bench, 1)?;
        let expected = u64::from((data >> i) & 1);
        debug!(
            "DATA TX: {} (expected: {expected})",
            bench.dut().get(pins.tx)
        );
        ensure!(bench.dut().get(pins.busy) == 1, "transmitter not busy");
        ensure!(bench.dut().get(pins.tx) == expected, "data bit {i} wrong");
    }

    // Even parity over the data bits
    let parity = u64::from(data.count_ones() & 1);
    tick_baud(bench, 1)?;
    debug!(
        "PARITY TX: {} (expected: {parity})",
        bench.dut().get(pins.tx)
    );
    ensure!(bench.dut().get(pins.busy) == 1, "transmitter not busy");
    ensure!(bench.dut().get(pins.tx) == parity, "parity bit wrong");

    // Stop bit
    tick_baud(bench, 1)?;
    debug!("STOP TX: {} (expected: 1)", bench.dut().get(pins.tx));
    ensure!(bench.dut().get(pins.busy) == 1, "transmitter not busy");
    ensure!(bench.dut().get(pins.tx) == 1, "missing stop bit");
    Ok(())
}

fn main() -> Result<()> {
    init_logging();

    let mut bench = Bench::new(UartTx::NAME, UartTx::new())?;
    bench.signal_start();

    let pins = Pins {
        rst: bench.dut().port("i_rst")?,
        start: bench.dut().port("i_start")?,
        data: bench.dut().port("i_data")?,
        busy: bench.dut().port("o_busy")?,
        tx: bench.dut().port("o_tx")?,
    };

    // Reset can be held across baud periods
    bench.dut_mut().set(pins.rst, 1);
    tick_baud(&mut bench, 1)?;
    expect_idle(&bench, &pins)?;
    tick_baud(&mut bench, 10)?;
    expect_idle(&bench, &pins)?;

    // Transmitter stays idle once out of reset
    bench.dut_mut().set(pins.rst, 0);
    bench.dut_mut().set(pins.start, 0);
    tick_baud(&mut bench, 1)?;
    expect_idle(&bench, &pins)?;
    tick_baud(&mut bench, 10)?;
    expect_idle(&bench, &pins)?;

    // A single byte, back to idle afterwards
    test_transmit(&mut bench, &pins, 0xab, false)?;
    tick_baud(&mut bench, 1)?;
    expect_idle(&bench, &pins)?;

    // Back-to-back bytes with no idle gap in between
    let bytes = [0xcdu8, 0xef, 0x55, 0x00];
    for (i, &byte) in bytes.iter().enumerate() {
        test_transmit(&mut bench, &pins, byte, i != bytes.len() - 1)?;
    }
    tick_baud(&mut bench, 1)?;
    expect_idle(&bench, &pins)?;

    bench.signal_done();
    Ok(())
}
