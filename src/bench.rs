//! Clock-stepped test bench.
//!
//! A [`Bench`] owns a circuit and its waveform trace for its whole lifetime
//! and advances simulated time one full clock period at a time.  Each tick
//! performs a fixed three-phase evaluation: settle pending input changes
//! just before the rising edge, raise the clock, drop it again, with a trace
//! record after every phase.  Everything runs in-line on the calling thread;
//! trace records for tick `n` are fully written before tick `n + 1` begins,
//! and an introspection read between ticks always observes the state left by
//! the most recent evaluation.

use camino::Utf8PathBuf;

use crate::dut::{Dut, PortId, Probe, ProbeFormat};
use crate::error::{EnvError, Result};
use crate::vcd::VcdWriter;

/// Bench construction knobs.  `trace_dir` is where the `.vcd` lands, keyed
/// by circuit name; `clock` names the clock input port.
#[derive(Clone, Debug)]
pub struct BenchOptions {
    pub trace_dir: Utf8PathBuf,
    pub clock: String,
}

impl Default for BenchOptions {
    fn default() -> Self {
        BenchOptions {
            trace_dir: "vcd".into(),
            clock: "i_clk".into(),
        }
    }
}

#[derive(Debug)]
pub struct Bench<D: Dut> {
    name: String,
    dut: D,
    vcd: VcdWriter,
    clock: PortId,
    tick_count: u64,
    /// Scratch buffer for per-phase signal snapshots.
    values: Vec<u64>,
}

impl<D: Dut> Bench<D> {
    /// Wrap `dut` and open its trace under the default `vcd/` directory.
    /// Fails if the trace file cannot be created or the clock port does not
    /// resolve.
    pub fn new(name: &str, dut: D) -> Result<Self> {
        Bench::with_options(name, dut, BenchOptions::default())
    }

    pub fn with_options(name: &str, dut: D, options: BenchOptions) -> Result<Self> {
        let clock = dut.port(&options.clock)?;
        let vcd = VcdWriter::create(&options.trace_dir, name, dut.ports())?;
        Ok(Bench {
            name: name.into(),
            dut,
            vcd,
            clock,
            tick_count: 1,
            values: Vec::new(),
        })
    }

    /// Count of clock periods started since construction.  The first tick
    /// runs with a count of 1; the counter never resets.
    pub fn tick_count(&self) -> u64 {
        self.tick_count
    }

    pub fn dut(&self) -> &D {
        &self.dut
    }

    pub fn dut_mut(&mut self) -> &mut D {
        &mut self.dut
    }

    /// Advance simulated time by exactly one clock period, recording each
    /// phase to the trace and flushing it before returning.
    pub fn tick(&mut self) -> Result<()> {
        self.step()?;
        self.vcd.flush()
    }

    /// Advance by `count` clock periods, deferring the trace flush until
    /// after the last one.
    pub fn ticks(&mut self, count: u64) -> Result<()> {
        for _ in 0..count {
            self.step()?;
        }
        self.vcd.flush()
    }

    fn step(&mut self) -> Result<()> {
        let n = self.tick_count;

        // Settle input changes made since the previous tick
        self.dut.eval();
        self.dump(10 * n - 2)?;

        // Rising edge
        self.dut.set(self.clock, 1);
        self.dut.eval();
        self.dump(10 * n)?;

        // Falling edge
        self.dut.set(self.clock, 0);
        self.dut.eval();
        self.dump(10 * n + 5)?;

        if self.tick_count == u64::MAX {
            self.vcd.close()?;
            return Err(EnvError::TickOverflow.into());
        }
        self.tick_count += 1;
        Ok(())
    }

    fn dump(&mut self, time: u64) -> Result<()> {
        self.values.clear();
        for i in 0..self.dut.ports().len() {
            self.values.push(self.dut.get(PortId(i)));
        }
        self.vcd.dump(time, &self.values)
    }

    /// Announce the start of a bench run on stdout.
    pub fn signal_start(&self) {
        println!("Running test bench for `{}`...", self.name);
    }

    pub fn signal_done(&self) {
        println!("Success.");
    }
}

impl<D: Dut + Probe> Bench<D> {
    /// Read an internal signal by hierarchical path, as of the most recent
    /// evaluation.
    pub fn probe(&self, path: &str, format: ProbeFormat) -> Result<u64> {
        self.dut.probe(path, format)
    }
}
