//! The seam between the bench and a simulated circuit.
//!
//! Circuits implement the [`Dut`] trait to expose named input and output
//! ports plus a combinational `eval`, and optionally [`Probe`] to expose
//! internal state by hierarchical path.  The bench and the protocol drivers
//! only ever talk to a circuit through these two traits; they never assume
//! anything about what is behind them.

use crate::error::{EnvError, Result};

/// Direction of a circuit port as seen from the bench.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum PortDir {
    Input,
    Output,
}

/// Static description of one named port.
#[derive(Clone, Copy, Debug)]
pub struct PortDesc {
    pub name: &'static str,
    pub width: u32,
    pub dir: PortDir,
}

/// Resolved handle for a port.  Cheap to copy and valid for the lifetime of
/// the circuit that produced it.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct PortId(pub(crate) usize);

/// A black-box clocked circuit driven one evaluation at a time.
pub trait Dut {
    /// All ports, in declaration order.  `PortId(i)` indexes this slice.
    fn ports(&self) -> &[PortDesc];

    /// Propagate input changes to the outputs combinationally.  Registered
    /// state advances when the clock input rises across two evaluations.
    fn eval(&mut self);

    /// Drive an input port.  Values wider than the port are masked.
    fn set(&mut self, port: PortId, value: u64);

    /// Sample any port as of the most recent `eval`.
    fn get(&self, port: PortId) -> u64;

    /// Resolve a port name to a typed handle.
    fn port(&self, name: &str) -> Result<PortId> {
        self.ports()
            .iter()
            .position(|p| p.name == name)
            .map(PortId)
            .ok_or_else(|| EnvError::UnknownPort(name.into()).into())
    }
}

/// Value interpretation for a probed signal.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum ProbeFormat {
    /// The whole signal as an unsigned integer.
    Int,
    /// A single-bit 0/1 reading.
    Scalar,
}

/// Read-only access to internal signals by root-qualified dotted path,
/// observed as of the most recent evaluation.
pub trait Probe {
    fn probe(&self, path: &str, format: ProbeFormat) -> Result<u64>;
}
