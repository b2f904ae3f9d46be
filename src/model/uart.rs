//! Behavioral model of the `uart_tx` transmitter.
//!
//! 8N1 framing plus an even parity bit: start bit low, eight data bits
//! least significant first, parity, stop bit high.  The transmitter runs
//! from a 100 MHz clock at 115200 baud and needs two clock ticks to leave
//! idle once `i_start` is raised; holding `i_start` through the stop bit
//! starts the next frame back-to-back.

use crate::dut::{Dut, PortDesc, PortDir, PortId};

pub const SYSTEM_CLOCK_RATE: u64 = 100 * 1000 * 1000;
pub const BAUD_RATE: u64 = 115_200;
pub const CYCLES_PER_BAUD: u64 = SYSTEM_CLOCK_RATE / BAUD_RATE;

const PORTS: &[PortDesc] = &[
    PortDesc {
        name: "i_clk",
        width: 1,
        dir: PortDir::Input,
    },
    PortDesc {
        name: "i_rst",
        width: 1,
        dir: PortDir::Input,
    },
    PortDesc {
        name: "i_start",
        width: 1,
        dir: PortDir::Input,
    },
    PortDesc {
        name: "i_data",
        width: 8,
        dir: PortDir::Input,
    },
    PortDesc {
        name: "o_busy",
        width: 1,
        dir: PortDir::Output,
    },
    PortDesc {
        name: "o_tx",
        width: 1,
        dir: PortDir::Output,
    },
];

const CLK: usize = 0;
const RST: usize = 1;
const START: usize = 2;
const DATA: usize = 3;
const BUSY: usize = 4;
const TX: usize = 5;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
enum Phase {
    Idle,
    /// One cycle registering the start request before the start bit.
    Sync,
    Start,
    Data(u8),
    Parity,
    Stop,
}

pub struct UartTx {
    inputs: [u64; 4],
    last_clk: u64,
    phase: Phase,
    /// Clock cycles spent in the current baud period.
    count: u64,
    latch: u8,
}

impl UartTx {
    /// Module name; keys the trace file.
    pub const NAME: &'static str = "uart_tx";

    pub fn new() -> Self {
        UartTx {
            inputs: [0; 4],
            last_clk: 0,
            phase: Phase::Idle,
            count: 0,
            latch: 0,
        }
    }

    fn rising_edge(&mut self) {
        if self.inputs[RST] & 1 == 1 {
            self.phase = Phase::Idle;
            self.count = 0;
            return;
        }
        let start = self.inputs[START] & 1 == 1;
        let data = self.inputs[DATA] as u8;

        match self.phase {
            Phase::Idle => {
                if start {
                    self.phase = Phase::Sync;
                }
            }
            Phase::Sync => {
                self.latch = data;
                self.count = 0;
                self.phase = Phase::Start;
            }
            _ => {
                self.count += 1;
                if self.count == CYCLES_PER_BAUD {
                    self.count = 0;
                    self.phase = match self.phase {
                        Phase::Start => Phase::Data(0),
                        Phase::Data(7) => Phase::Parity,
                        Phase::Data(i) => Phase::Data(i + 1),
                        Phase::Parity => Phase::Stop,
                        Phase::Stop => {
                            if start {
                                // Back-to-back frame, no idle gap
                                self.latch = data;
                                Phase::Start
                            } else {
                                Phase::Idle
                            }
                        }
                        Phase::Idle | Phase::Sync => unreachable!(),
                    };
                }
            }
        }
    }

    fn tx(&self) -> u64 {
        match self.phase {
            Phase::Idle | Phase::Sync | Phase::Stop => 1,
            Phase::Start => 0,
            Phase::Data(i) => u64::from((self.latch >> i) & 1),
            Phase::Parity => u64::from(self.latch.count_ones() & 1),
        }
    }
}

impl Default for UartTx {
    fn default() -> Self {
        UartTx::new()
    }
}

impl Dut for UartTx {
    fn ports(&self) -> &[PortDesc] {
        PORTS
    }

    fn eval(&mut self) {
        let clk = self.inputs[CLK] & 1;
        if clk == 1 && self.last_clk == 0 {
            self.rising_edge();
        }
        self.last_clk = clk;
    }

    fn set(&mut self, port: PortId, value: u64) {
        if port.0 < self.inputs.len() {
            let width = PORTS[port.0].width;
            self.inputs[port.0] = value & ((1u64 << width) - 1);
        }
    }

    fn get(&self, port: PortId) -> u64 {
        match port.0 {
            BUSY => u64::from(self.phase != Phase::Idle),
            TX => self.tx(),
            i => self.inputs[i],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn edge(uart: &mut UartTx) {
        let clk = uart.port("i_clk").unwrap();
        uart.set(clk, 1);
        uart.eval();
        uart.set(clk, 0);
        uart.eval();
    }

    #[test]
    fn idle_line_is_high_and_not_busy() {
        let mut uart = UartTx::new();
        let busy = uart.port("o_busy").unwrap();
        let tx = uart.port("o_tx").unwrap();
        for _ in 0..100 {
            edge(&mut uart);
        }
        assert_eq!(uart.get(busy), 0);
        assert_eq!(uart.get(tx), 1);
    }

    #[test]
    fn start_bit_appears_after_two_edges() {
        let mut uart = UartTx::new();
        let start = uart.port("i_start").unwrap();
        let tx = uart.port("o_tx").unwrap();
        let busy = uart.port("o_busy").unwrap();

        uart.set(start, 1);
        edge(&mut uart);
        edge(&mut uart);
        assert_eq!(uart.get(busy), 1);
        assert_eq!(uart.get(tx), 0);
    }

    #[test]
    fn parity_counts_ones() {
        let mut uart = UartTx::new();
        uart.latch = 0xab;
        uart.phase = Phase::Parity;
        assert_eq!(uart.tx(), 1);
        uart.latch = 0x55;
        assert_eq!(uart.tx(), 0);
    }
}
