//! Behavioral model of the `dmi_jtag` debug TAP.
//!
//! A 4-bit state register holding the standard TAP controller states, a
//! 5-bit instruction register and the IDCODE/BYPASS/DTMCS/DMI data
//! registers.  All registers clock on the rising edge of `i_clk`, and every
//! register action is keyed to the state the edge *leaves*: a value moved
//! into an update state by one edge takes effect on the next.  That gives
//! the same observable commit point as the real circuit, where a freshly
//! loaded instruction becomes current only after the state machine proceeds
//! past Update-IR.

use crate::dut::{Dut, PortDesc, PortDir, PortId, Probe, ProbeFormat};
use crate::error::{EnvError, Result};
use crate::registers::{Idcode, Instruction, IR_WIDTH};
use crate::statemachine::TapState;

/// DTMCS reset value: version 1, 7 address bits.
const DTMCS_RESET: u64 = 0x71;

/// DMI register width: 7 address bits, 32 data bits, 2 op bits.
const DMI_WIDTH: u32 = 41;

const PORTS: &[PortDesc] = &[
    PortDesc {
        name: "i_clk",
        width: 1,
        dir: PortDir::Input,
    },
    PortDesc {
        name: "i_tms",
        width: 1,
        dir: PortDir::Input,
    },
    PortDesc {
        name: "i_tdi",
        width: 1,
        dir: PortDir::Input,
    },
    PortDesc {
        name: "o_tdo",
        width: 1,
        dir: PortDir::Output,
    },
];

const CLK: usize = 0;
const TMS: usize = 1;
const TDI: usize = 2;
const TDO: usize = 3;

#[derive(Debug)]
pub struct DmiTap {
    inputs: [u64; 3],
    tdo: u64,
    last_clk: u64,
    state: TapState,
    ir_shift: u64,
    ir: u64,
    dr_shift: u64,
    dr_width: u32,
    dtmcs: u64,
    dmi: u64,
}

impl DmiTap {
    /// Module name; also the root of every introspection path.
    pub const NAME: &'static str = "dmi_jtag";

    pub fn new() -> Self {
        DmiTap {
            inputs: [0; 3],
            tdo: 0,
            last_clk: 0,
            state: TapState::Reset,
            ir_shift: 0,
            ir: Instruction::Idcode.opcode(),
            dr_shift: 0,
            dr_width: 1,
            dtmcs: DTMCS_RESET,
            dmi: 0,
        }
    }

    /// Capture value and width of the data register the current instruction
    /// selects.  Unknown opcodes fall back to BYPASS.
    fn dr_capture(&self) -> (u64, u32) {
        match Instruction::from_opcode(self.ir) {
            Some(Instruction::Idcode) => (Idcode::RESET.pack(), 32),
            Some(Instruction::Dtmcs) => (self.dtmcs, 32),
            Some(Instruction::Dmi) => (self.dmi, DMI_WIDTH),
            Some(Instruction::Bypass) | None => (0, 1),
        }
    }

    fn dr_update(&mut self) {
        if Instruction::from_opcode(self.ir) == Some(Instruction::Dmi) {
            self.dmi = self.dr_shift;
        }
    }

    fn rising_edge(&mut self) {
        let tms = self.inputs[TMS] & 1 == 1;
        let tdi = self.inputs[TDI] & 1;
        let state = self.state;
        let next = next_state(state, tms);

        match state {
            TapState::CaptureIR => self.ir_shift = Instruction::Idcode.opcode(),
            TapState::ShiftIR => {
                self.ir_shift = (tdi << (IR_WIDTH - 1)) | (self.ir_shift >> 1);
            }
            TapState::UpdateIR => self.ir = self.ir_shift,
            TapState::CaptureDR => {
                let (value, width) = self.dr_capture();
                self.dr_shift = value;
                self.dr_width = width;
            }
            TapState::ShiftDR => {
                self.dr_shift = (tdi << (self.dr_width - 1)) | (self.dr_shift >> 1);
            }
            TapState::UpdateDR => self.dr_update(),
            _ => {}
        }

        // Entering Test-Logic-Reset forces the IDCODE instruction
        if next == TapState::Reset {
            self.ir = Instruction::Idcode.opcode();
        }
        self.state = next;
    }
}

impl Default for DmiTap {
    fn default() -> Self {
        DmiTap::new()
    }
}

impl Dut for DmiTap {
    fn ports(&self) -> &[PortDesc] {
        PORTS
    }

    fn eval(&mut self) {
        let clk = self.inputs[CLK] & 1;
        if clk == 1 && self.last_clk == 0 {
            self.rising_edge();
        }
        self.last_clk = clk;

        // TDO follows the selected shift register while shifting and holds
        // its last value everywhere else
        self.tdo = match self.state {
            TapState::ShiftIR => self.ir_shift & 1,
            TapState::ShiftDR => self.dr_shift & 1,
            _ => self.tdo,
        };
    }

    fn set(&mut self, port: PortId, value: u64) {
        if port.0 < self.inputs.len() {
            self.inputs[port.0] = value & 1;
        }
    }

    fn get(&self, port: PortId) -> u64 {
        match port.0 {
            TDO => self.tdo,
            i => self.inputs[i],
        }
    }
}

impl Probe for DmiTap {
    fn probe(&self, path: &str, format: ProbeFormat) -> Result<u64> {
        let value = match path {
            "dmi_jtag.current_state" => self.state.code(),
            "dmi_jtag.ir_shift" => self.ir_shift,
            "dmi_jtag.ir" => self.ir,
            "dmi_jtag.dtmcs" => self.dtmcs,
            "dmi_jtag.dmi" => self.dmi,
            _ => return Err(EnvError::UnknownSignal(path.into()).into()),
        };
        Ok(match format {
            ProbeFormat::Int => value,
            ProbeFormat::Scalar => value & 1,
        })
    }
}

/// The standard TAP transition function: TMS sampled on the rising edge.
fn next_state(state: TapState, tms: bool) -> TapState {
    use TapState::*;
    match (state, tms) {
        (Reset, false) => Idle,
        (Reset, true) => Reset,
        (Idle, false) => Idle,
        (Idle, true) => SelectDR,
        (SelectDR, false) => CaptureDR,
        (SelectDR, true) => SelectIR,
        (CaptureDR, false) => ShiftDR,
        (CaptureDR, true) => Exit1DR,
        (ShiftDR, false) => ShiftDR,
        (ShiftDR, true) => Exit1DR,
        (Exit1DR, false) => PauseDR,
        (Exit1DR, true) => UpdateDR,
        (PauseDR, false) => PauseDR,
        (PauseDR, true) => Exit2DR,
        (Exit2DR, false) => ShiftDR,
        (Exit2DR, true) => UpdateDR,
        (UpdateDR, false) => Idle,
        (UpdateDR, true) => SelectDR,
        (SelectIR, false) => CaptureIR,
        (SelectIR, true) => Reset,
        (CaptureIR, false) => ShiftIR,
        (CaptureIR, true) => Exit1IR,
        (ShiftIR, false) => ShiftIR,
        (ShiftIR, true) => Exit1IR,
        (Exit1IR, false) => PauseIR,
        (Exit1IR, true) => UpdateIR,
        (PauseIR, false) => PauseIR,
        (PauseIR, true) => Exit2IR,
        (Exit2IR, false) => ShiftIR,
        (Exit2IR, true) => UpdateIR,
        (UpdateIR, false) => Idle,
        (UpdateIR, true) => SelectDR,
    }
}
