//! TAP state tracking and the clock-level protocol driver.
//!
//! [`TapDriver`] borrows a [`Bench`] and drives the TMS and TDI inputs one
//! tick at a time.  It does not solve TAP navigation generically: each
//! operation replays the fixed TMS sequence it needs from a documented
//! starting state, then verifies the circuit's state register through the
//! introspection interface.  The driver is a client of the TAP state
//! machine, not a simulator of it.

use log::{debug, trace};

use crate::bench::Bench;
use crate::dut::{Dut, PortId, Probe, ProbeFormat};
use crate::error::{Result, VerifyError};
use crate::registers::{Idcode, Instruction, IR_WIDTH};

/// The sixteen TAP controller states, with the encoding used by the debug
/// TAP's state register (Test-Logic-Reset sits at 0xF).
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum TapState {
    Exit2DR = 0x0,
    Exit1DR = 0x1,
    ShiftDR = 0x2,
    PauseDR = 0x3,
    SelectIR = 0x4,
    UpdateDR = 0x5,
    CaptureDR = 0x6,
    SelectDR = 0x7,
    Exit2IR = 0x8,
    Exit1IR = 0x9,
    ShiftIR = 0xa,
    PauseIR = 0xb,
    Idle = 0xc,
    UpdateIR = 0xd,
    CaptureIR = 0xe,
    Reset = 0xf,
}

impl TapState {
    /// Decode the circuit's 4-bit state register.
    pub fn from_code(code: u64) -> Option<TapState> {
        use TapState::*;
        Some(match code {
            0x0 => Exit2DR,
            0x1 => Exit1DR,
            0x2 => ShiftDR,
            0x3 => PauseDR,
            0x4 => SelectIR,
            0x5 => UpdateDR,
            0x6 => CaptureDR,
            0x7 => SelectDR,
            0x8 => Exit2IR,
            0x9 => Exit1IR,
            0xa => ShiftIR,
            0xb => PauseIR,
            0xc => Idle,
            0xd => UpdateIR,
            0xe => CaptureIR,
            0xf => Reset,
            _ => return None,
        })
    }

    pub fn code(self) -> u64 {
        self as u64
    }
}

/// Clock-level driver for a single TAP behind a bench.
pub struct TapDriver<'a, D: Dut + Probe> {
    bench: &'a mut Bench<D>,
    tms: PortId,
    tdi: PortId,
    tdo: PortId,
    state_path: String,
    shift_path: String,
    instruction_path: String,
}

impl<'a, D: Dut + Probe> TapDriver<'a, D> {
    /// Attach to a bench whose circuit exposes the standard TAP pins
    /// (`i_tms`, `i_tdi`, `o_tdo`) and the given introspection root, e.g.
    /// `"dmi_jtag"`.
    pub fn new(bench: &'a mut Bench<D>, root: &str) -> Result<Self> {
        let tms = bench.dut().port("i_tms")?;
        let tdi = bench.dut().port("i_tdi")?;
        let tdo = bench.dut().port("o_tdo")?;
        Ok(TapDriver {
            bench,
            tms,
            tdi,
            tdo,
            state_path: format!("{root}.current_state"),
            shift_path: format!("{root}.ir_shift"),
            instruction_path: format!("{root}.ir"),
        })
    }

    /// Observed TAP controller state as of the last evaluation.
    pub fn state(&self) -> Result<TapState> {
        let code = self.bench.probe(&self.state_path, ProbeFormat::Int)?;
        TapState::from_code(code).ok_or_else(|| VerifyError::InvalidState(code).into())
    }

    /// The latched current instruction.
    pub fn instruction(&self) -> Result<u64> {
        self.bench.probe(&self.instruction_path, ProbeFormat::Int)
    }

    /// Check the observed state against `expected`; a mismatch is a defect
    /// in the circuit, not in the driver.
    pub fn expect_state(&self, expected: TapState) -> Result<()> {
        let observed = self.state()?;
        if observed != expected {
            return Err(VerifyError::State { expected, observed }.into());
        }
        Ok(())
    }

    /// Check the latched instruction against `expected`.
    pub fn expect_instruction(&self, expected: Instruction) -> Result<()> {
        let observed = self.instruction()?;
        if observed != expected.opcode() {
            return Err(VerifyError::Instruction {
                expected: expected.opcode(),
                observed,
            }
            .into());
        }
        Ok(())
    }

    /// Clock out a series of TMS values, one per tick, to move the TAP
    /// between states.
    pub fn change_mode(&mut self, tms: &[u8]) -> Result<()> {
        for &bit in tms {
            self.bench.dut_mut().set(self.tms, u64::from(bit != 0));
            self.bench.tick()?;
        }
        Ok(())
    }

    /// Drive TMS high for five consecutive ticks.  The standard guarantees
    /// this reaches Test-Logic-Reset from any state; anything else observed
    /// afterwards is a circuit defect.
    pub fn reset(&mut self) -> Result<()> {
        self.change_mode(&[1, 1, 1, 1, 1])?;
        self.expect_state(TapState::Reset)
    }

    /// Shift `width` bits through the register sitting between TDI and TDO.
    ///
    /// Must be entered in ShiftDR or ShiftIR.  Data goes out least
    /// significant bit first; each iteration samples TDO before the clock
    /// edge, so sample `i` ends up at bit `width - 1 - i` of the returned
    /// value.  With `exit_on_last` the final bit is clocked with TMS high
    /// and the same edge that samples it leaves the shift state for Exit1.
    pub fn shift(&mut self, width: u32, data: u64, exit_on_last: bool) -> Result<u64> {
        let mut data = data;
        let mut out = 0u64;
        for i in 0..width {
            let tdo = self.bench.dut().get(self.tdo) & 1;
            out = (out << 1) | tdo;

            let tms = u64::from(exit_on_last && i == width - 1);
            self.bench.dut_mut().set(self.tdi, data & 1);
            self.bench.dut_mut().set(self.tms, tms);
            trace!("shift bit {i}: tdi={} tdo={tdo} tms={tms}", data & 1);
            data >>= 1;
            self.bench.tick()?;
        }
        Ok(out)
    }

    /// Load `instruction` into the instruction register.
    ///
    /// The TAP must be in SelectIR.  Passes through CaptureIR into ShiftIR,
    /// verifies the capture pattern, shifts the opcode with the exit bit on
    /// its last tick, and takes one more TMS-high tick into UpdateIR.  The
    /// new instruction latches once the state machine proceeds past
    /// UpdateIR on the following edge.
    pub fn load_instruction(&mut self, instruction: Instruction) -> Result<()> {
        self.expect_state(TapState::SelectIR)?;

        // SelectIR -> CaptureIR -> ShiftIR
        self.change_mode(&[0, 0])?;
        self.expect_state(TapState::ShiftIR)?;

        // Capture always loads the IDCODE opcode into the shift register
        let captured = self.bench.probe(&self.shift_path, ProbeFormat::Int)?;
        if captured != Instruction::Idcode.opcode() {
            return Err(VerifyError::IrCapture {
                expected: Instruction::Idcode.opcode(),
                observed: captured,
            }
            .into());
        }

        debug!("loading instruction {:#04x}", instruction.opcode());
        self.shift(IR_WIDTH, instruction.opcode(), true)?;
        self.expect_state(TapState::Exit1IR)?;

        // TMS stays high for one more tick to land in UpdateIR
        self.change_mode(&[1])?;
        self.expect_state(TapState::UpdateIR)
    }

    /// Read the identification register field by field and check each one
    /// against the documented reset pattern.
    ///
    /// The TAP must be in ShiftDR with IDCODE selected.  The final field is
    /// shifted with the exit bit, leaving the TAP in Exit1DR.
    pub fn verify_idcode(&mut self) -> Result<Idcode> {
        self.expect_state(TapState::ShiftDR)?;

        let reserved = self.shift(1, 0, false)?;
        check_field("reserved bit", reserved, 1)?;
        let manufacturer = self.shift(11, 0, false)?;
        check_field(
            "manufacturer id",
            manufacturer,
            u64::from(Idcode::RESET.manufacturer),
        )?;
        let part = self.shift(16, 0, false)?;
        check_field("part number", part, u64::from(Idcode::RESET.part))?;
        let version = self.shift(4, 0, true)?;
        check_field("version", version, u64::from(Idcode::RESET.version))?;
        self.expect_state(TapState::Exit1DR)?;

        Ok(Idcode {
            manufacturer: manufacturer as u16,
            part: part as u16,
            version: version as u8,
        })
    }
}

fn check_field(field: &'static str, observed: u64, expected: u64) -> Result<()> {
    if observed != expected {
        return Err(VerifyError::IdcodeField {
            field,
            expected,
            observed,
        }
        .into());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn state_codes_round_trip() {
        for code in 0..16u64 {
            let state = TapState::from_code(code).unwrap();
            assert_eq!(state.code(), code);
        }
        assert_eq!(TapState::from_code(16), None);
    }

    #[test]
    fn reset_state_encoding_matches_hardware() {
        assert_eq!(TapState::Reset.code(), 0xf);
        assert_eq!(TapState::Idle.code(), 0xc);
    }
}
