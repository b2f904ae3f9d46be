//! UART transmitter timing against the behavioral model.
//!
//! The line is sampled once per baud period with one spare tick of slack,
//! the same cadence a scope-style bench would use.

use camino::Utf8PathBuf;
use proptest::prelude::*;

use jtag_bench::bench::{Bench, BenchOptions};
use jtag_bench::dut::{Dut, PortId};
use jtag_bench::model::uart::{UartTx, CYCLES_PER_BAUD};

struct Pins {
    rst: PortId,
    start: PortId,
    data: PortId,
    busy: PortId,
    tx: PortId,
}

fn new_bench(dir: &tempfile::TempDir, name: &str) -> (Bench<UartTx>, Pins) {
    let options = BenchOptions {
        trace_dir: Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).unwrap(),
        clock: "i_clk".into(),
    };
    let bench = Bench::with_options(name, UartTx::new(), options).unwrap();
    let pins = Pins {
        rst: bench.dut().port("i_rst").unwrap(),
        start: bench.dut().port("i_start").unwrap(),
        data: bench.dut().port("i_data").unwrap(),
        busy: bench.dut().port("o_busy").unwrap(),
        tx: bench.dut().port("o_tx").unwrap(),
    };
    (bench, pins)
}

fn tick_baud(bench: &mut Bench<UartTx>, baud_ticks: u64) {
    for _ in 0..baud_ticks {
        bench.ticks(CYCLES_PER_BAUD + 1).unwrap();
    }
}

fn assert_idle(bench: &Bench<UartTx>, pins: &Pins) {
    assert_eq!(bench.dut().get(pins.busy), 0);
    assert_eq!(bench.dut().get(pins.tx), 1);
}

/// Drive one frame and assert every bit on the line, mirroring the cadence
/// of the scenario binary.
fn transmit(bench: &mut Bench<UartTx>, pins: &Pins, data: u8, continuous: bool) {
    bench.dut_mut().set(pins.data, data.into());
    bench.dut_mut().set(pins.start, 1);

    if bench.dut().get(pins.busy) == 0 {
        assert_eq!(bench.dut().get(pins.tx), 1);
        bench.ticks(2).unwrap();
    } else {
        tick_baud(bench, 1);
    }
    assert_eq!(bench.dut().get(pins.busy), 1);
    assert_eq!(bench.dut().get(pins.tx), 0, "start bit for {data:#04x}");

    if !continuous {
        bench.dut_mut().set(pins.start, 0);
    }

    for i in 0..8 {
        tick_baud(bench, 1);
        let expected = u64::from((data >> i) & 1);
        assert_eq!(bench.dut().get(pins.busy), 1);
        assert_eq!(
            bench.dut().get(pins.tx),
            expected,
            "data bit {i} of {data:#04x}"
        );
    }

    tick_baud(bench, 1);
    let parity = u64::from(data.count_ones() & 1);
    assert_eq!(bench.dut().get(pins.busy), 1);
    assert_eq!(bench.dut().get(pins.tx), parity, "parity bit of {data:#04x}");

    tick_baud(bench, 1);
    assert_eq!(bench.dut().get(pins.busy), 1);
    assert_eq!(bench.dut().get(pins.tx), 1, "stop bit of {data:#04x}");
}

#[test]
fn reset_holds_the_line_idle() {
    let dir = tempfile::tempdir().unwrap();
    let (mut bench, pins) = new_bench(&dir, "uart_reset");

    bench.dut_mut().set(pins.rst, 1);
    tick_baud(&mut bench, 1);
    assert_idle(&bench, &pins);
    tick_baud(&mut bench, 10);
    assert_idle(&bench, &pins);
}

#[test]
fn transmitter_stays_idle_without_a_start_request() {
    let dir = tempfile::tempdir().unwrap();
    let (mut bench, pins) = new_bench(&dir, "uart_idle");

    bench.dut_mut().set(pins.rst, 1);
    tick_baud(&mut bench, 1);
    bench.dut_mut().set(pins.rst, 0);
    bench.dut_mut().set(pins.start, 0);
    tick_baud(&mut bench, 1);
    assert_idle(&bench, &pins);
    tick_baud(&mut bench, 10);
    assert_idle(&bench, &pins);
}

#[test]
fn transmits_a_byte_and_returns_to_idle() {
    let dir = tempfile::tempdir().unwrap();
    let (mut bench, pins) = new_bench(&dir, "uart_single");

    bench.dut_mut().set(pins.rst, 1);
    tick_baud(&mut bench, 1);
    bench.dut_mut().set(pins.rst, 0);
    tick_baud(&mut bench, 1);

    transmit(&mut bench, &pins, 0xab, false);
    tick_baud(&mut bench, 1);
    assert_idle(&bench, &pins);
}

#[test]
fn transmits_back_to_back_frames_without_an_idle_gap() {
    let dir = tempfile::tempdir().unwrap();
    let (mut bench, pins) = new_bench(&dir, "uart_burst");

    bench.dut_mut().set(pins.rst, 1);
    tick_baud(&mut bench, 1);
    bench.dut_mut().set(pins.rst, 0);
    tick_baud(&mut bench, 1);

    let bytes = [0xcdu8, 0xef, 0x55, 0x00];
    for (i, &byte) in bytes.iter().enumerate() {
        transmit(&mut bench, &pins, byte, i != bytes.len() - 1);
    }
    tick_baud(&mut bench, 1);
    assert_idle(&bench, &pins);
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(8))]

    #[test]
    fn any_byte_frames_correctly(byte in any::<u8>()) {
        let dir = tempfile::tempdir().unwrap();
        let (mut bench, pins) = new_bench(&dir, "uart_any");

        bench.dut_mut().set(pins.rst, 1);
        tick_baud(&mut bench, 1);
        bench.dut_mut().set(pins.rst, 0);
        tick_baud(&mut bench, 1);

        transmit(&mut bench, &pins, byte, false);
        tick_baud(&mut bench, 1);
        assert_idle(&bench, &pins);
    }
}
