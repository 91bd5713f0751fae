//! A fake implementation of the hardware port for unit tests.

use super::{Pin, PinFunction, PinMux, PullMode, RegisterPort};
use crate::registers::{self, LineStatus};
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

/// One hardware access observed by a [`FakePort`].
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Access {
    /// A 32-bit register read.
    Read {
        /// Peripheral base address.
        base: usize,
        /// Register offset from the base.
        offset: usize,
    },
    /// A 32-bit register write.
    Write {
        /// Peripheral base address.
        base: usize,
        /// Register offset from the base.
        offset: usize,
        /// The value written.
        value: u32,
    },
    /// A pin-mux configuration call.
    ConfigurePin {
        /// The pin configured.
        pin: Pin,
        /// The alternate function selected.
        function: PinFunction,
        /// The pull mode selected.
        pull: PullMode,
    },
}

/// A recording implementation of [`RegisterPort`] and [`PinMux`].
///
/// Registers behave as plain memory, with one exception: the line status
/// register is synthesised, reporting transmit-ready once
/// [`State::busy_status_reads`] has counted down to zero.
#[derive(Clone, Debug)]
pub struct FakePort {
    /// Shared state, so tests keep a handle after the driver takes the port.
    pub state: Arc<Mutex<State>>,
}

impl FakePort {
    /// Creates a port backed by the given shared state.
    pub fn new(state: Arc<Mutex<State>>) -> Self {
        Self { state }
    }
}

/// The observable state behind one or more [`FakePort`] handles.
#[derive(Debug, Default)]
pub struct State {
    /// Last value written to each `(base, offset)` register.
    pub regs: BTreeMap<(usize, usize), u32>,
    /// Current configuration of each pin touched so far.
    pub pins: BTreeMap<Pin, (PinFunction, PullMode)>,
    /// Every access, in order.
    pub log: Vec<Access>,
    /// Line status reads reporting transmitter-busy before THRE is set again.
    pub busy_status_reads: usize,
}

impl RegisterPort for FakePort {
    fn read32(&mut self, base: usize, offset: usize) -> u32 {
        let mut state = self.state.lock().unwrap();
        state.log.push(Access::Read { base, offset });
        if offset == registers::LSR {
            if state.busy_status_reads > 0 {
                state.busy_status_reads -= 1;
                return 0;
            }
            return LineStatus::THRE.bits();
        }
        state.regs.get(&(base, offset)).copied().unwrap_or(0)
    }

    fn write32(&mut self, base: usize, offset: usize, value: u32) {
        let mut state = self.state.lock().unwrap();
        state.log.push(Access::Write { base, offset, value });
        state.regs.insert((base, offset), value);
    }
}

impl PinMux for FakePort {
    fn configure_pin(&mut self, pin: Pin, function: PinFunction, pull: PullMode) {
        let mut state = self.state.lock().unwrap();
        state.log.push(Access::ConfigurePin { pin, function, pull });
        state.pins.insert(pin, (function, pull));
    }
}
