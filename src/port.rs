//! The interface through which the driver reaches registers and pins.
//!
//! Splitting hardware access out into traits keeps the driver itself free of
//! raw pointers: real hardware gets [`MmioPort`] plus whatever pin-mux
//! implementation the board support code provides, and unit tests get the
//! recording fake.

#[cfg(test)]
pub(crate) mod fake;

/// Raw access to 32-bit memory-mapped registers.
///
/// Every call is a direct volatile-equivalent access to `base + offset`; no
/// caching, no buffering. Accesses have no failure mode at this level: a
/// physically absent or faulted peripheral is outside the software contract.
pub trait RegisterPort {
    /// Reads the 32-bit register at `base + offset`.
    fn read32(&mut self, base: usize, offset: usize) -> u32;

    /// Writes the 32-bit register at `base + offset`.
    fn write32(&mut self, base: usize, offset: usize, value: u32);
}

/// Pin multiplexer configuration, invoked once per required signal during
/// bring-up.
///
/// The encoding of functions and pull modes into the chip's pin-control
/// registers is the implementor's business; failures (an impossible routing,
/// say) are the implementor's to handle as well.
pub trait PinMux {
    /// Routes `pin` to `function` with the given pull resistor selection.
    fn configure_pin(&mut self, pin: Pin, function: PinFunction, pull: PullMode);
}

/// A physical pin, identified by GPIO port and pin index within that port.
#[derive(Copy, Clone, Debug, Eq, Ord, PartialEq, PartialOrd)]
pub struct Pin {
    /// GPIO port index.
    pub port: u8,
    /// Pin index within the port.
    pub pin: u8,
}

/// Alternate-function selection for a pin. Function 0 is plain GPIO.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
#[repr(u8)]
pub enum PinFunction {
    /// General-purpose I/O, the reset default.
    Gpio = 0,
    /// First alternate function.
    Alt1 = 1,
    /// Second alternate function.
    Alt2 = 2,
    /// Third alternate function.
    Alt3 = 3,
}

/// Pull resistor selection for a pin.
///
/// Receive pins should not be pulled down; an idle UART line rests high.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum PullMode {
    /// On-chip pull-up enabled.
    PullUp,
    /// No pull resistor.
    Floating,
    /// On-chip pull-down enabled.
    PullDown,
}

/// A [`RegisterPort`] performing real volatile MMIO accesses.
#[derive(Debug)]
pub struct MmioPort {
    _private: (),
}

impl MmioPort {
    /// Creates a port for direct register access.
    ///
    /// # Safety
    ///
    /// Every `base + offset` the driver is subsequently pointed at must be a
    /// properly mapped, 4-byte-aligned device register that stays valid for
    /// the lifetime of the port, with no other alias performing conflicting
    /// accesses.
    pub const unsafe fn new() -> Self {
        Self { _private: () }
    }
}

impl RegisterPort for MmioPort {
    fn read32(&mut self, base: usize, offset: usize) -> u32 {
        // SAFETY: The caller of `MmioPort::new` promised that this address is
        // a mapped, aligned device register.
        unsafe { ((base + offset) as *const u32).read_volatile() }
    }

    fn write32(&mut self, base: usize, offset: usize, value: u32) {
        // SAFETY: As for `read32`.
        unsafe { ((base + offset) as *mut u32).write_volatile(value) }
    }
}
