//! Error taxonomy for the bench and the TAP driver.
//!
//! There are exactly two kinds of failure.  An [`EnvError`] means the bench
//! setup itself is broken: the trace file cannot be created, a signal the
//! driver depends on does not exist, the tick counter ran out.  A
//! [`VerifyError`] means the circuit under test violated its protocol
//! contract.  Both stop a run immediately, but a reporting layer sitting on
//! top needs to tell a broken harness apart from a found defect, so the two
//! kinds stay separate types.

use camino::Utf8PathBuf;
use thiserror::Error;

use crate::statemachine::TapState;

/// Broken bench setup or exhausted resources.  Never recoverable.
#[derive(Debug, Error)]
pub enum EnvError {
    /// The waveform trace file could not be created.
    #[error("failed to open waveform trace `{path}`: {source}")]
    TraceOpen {
        path: Utf8PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// Writing or flushing the waveform trace failed.
    #[error("failed to write waveform trace `{path}`: {source}")]
    TraceWrite {
        path: Utf8PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// A port name did not resolve on the circuit.
    #[error("no port named `{0}` on the circuit")]
    UnknownPort(String),
    /// A hierarchical signal path did not resolve on the circuit.  A missing
    /// signal is a structural mismatch between driver and circuit; there is
    /// no recoverable not-found result.
    #[error("no handle found for `{0}`")]
    UnknownSignal(String),
    /// The clock tick counter is one tick away from wrapping.
    #[error("clock tick counter overflowed")]
    TickOverflow,
}

/// The circuit under test violated its protocol contract.
#[derive(Debug, Error)]
pub enum VerifyError {
    /// The TAP state register did not hold the expected state.
    #[error("expected TAP state {expected:?}, observed {observed:?}")]
    State {
        expected: TapState,
        observed: TapState,
    },
    /// The TAP state register held a value outside the 16 defined codes.
    #[error("TAP state register holds invalid code {0:#x}")]
    InvalidState(u64),
    /// Capture-IR loaded something other than the IDCODE opcode.
    #[error("capture-IR loaded {observed:#04x}, expected the IDCODE opcode {expected:#04x}")]
    IrCapture { expected: u64, observed: u64 },
    /// The latched instruction was not the one expected.
    #[error("current instruction is {observed:#04x}, expected {expected:#04x}")]
    Instruction { expected: u64, observed: u64 },
    /// An IDCODE field did not match the documented reset pattern.
    #[error("IDCODE {field} reads {observed:#x}, expected {expected:#x}")]
    IdcodeField {
        field: &'static str,
        expected: u64,
        observed: u64,
    },
}

/// Any condition that stops a bench run.
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Env(#[from] EnvError),
    #[error(transparent)]
    Verify(#[from] VerifyError),
}

impl Error {
    /// True when the failure indicates a defect in the circuit under test
    /// rather than in the bench setup.
    pub fn is_verification(&self) -> bool {
        matches!(self, Error::Verify(_))
    }
}

pub type Result<T> = core::result::Result<T, Error>;
