//! This crate drives simulated clocked circuits at a variety of levels of
//! abstraction.  At the lowest level, the `Dut` and `Probe` traits describe
//! what a circuit looks like from the outside: named input and output ports,
//! a combinational `eval`, and hierarchical paths into internal signals.
//!
//! The next level is the `Bench`, which owns a circuit and its waveform
//! trace and advances simulated time one clock period at a time, recording
//! the settle, rising-edge and falling-edge phase of every tick.
//!
//! On top of the bench sits the `TapDriver`, a clock-level JTAG driver.  It
//! navigates the TAP controller with fixed TMS sequences, loads instructions
//! and shifts data registers bit by bit, and verifies the circuit's observed
//! state after every move.  Behavioral circuits for the bundled benches live
//! under `model`.
//!
//! # Example
//! ```no_run
//! use jtag_bench::bench::Bench;
//! use jtag_bench::model::DmiTap;
//! use jtag_bench::registers::Instruction;
//! use jtag_bench::statemachine::TapDriver;
//!
//! # fn main() -> jtag_bench::error::Result<()> {
//! let mut bench = Bench::new("dmi_jtag", DmiTap::new())?;
//! let mut tap = TapDriver::new(&mut bench, "dmi_jtag")?;
//! tap.reset()?;
//!
//! // Test-Logic-Reset -> Run-Test/Idle -> Select-DR -> Select-IR
//! tap.change_mode(&[0, 1, 1])?;
//! tap.load_instruction(Instruction::Idcode)?;
//! # Ok(())
//! # }
//! ```

pub mod bench;
pub mod dut;
pub mod error;
pub mod model;
pub mod registers;
pub mod statemachine;
pub mod vcd;
