//! Register offsets and bit definitions for the UART block, plus the two
//! system-control words the bring-up sequence touches.
//!
//! Offsets are relative to the base address carried by the configuration, so
//! the same definitions serve every instance and the fake port used in tests.

use bitflags::bitflags;

/// Receive buffer (read) / transmit holding register (write).
pub(crate) const THR: usize = 0x00;
/// Divisor latch low byte, visible while the divisor-access bit is set.
pub(crate) const DLL: usize = 0x00;
/// Interrupt enable register.
pub(crate) const IER: usize = 0x04;
/// Divisor latch high byte, visible while the divisor-access bit is set.
pub(crate) const DLM: usize = 0x04;
/// FIFO control register (write only; reads alias the interrupt ID register).
pub(crate) const FCR: usize = 0x08;
/// Line control register.
pub(crate) const LCR: usize = 0x0c;
/// Line status register.
pub(crate) const LSR: usize = 0x14;
/// Fractional divider register.
pub(crate) const FDR: usize = 0x28;

/// Peripheral power control word, relative to the system control base.
pub(crate) const PCONP: usize = 0x0c4;
/// Peripheral clock selection word 0 (UART0/1 fields live here).
pub(crate) const PCLKSEL0: usize = 0x1a8;
/// Peripheral clock selection word 1 (UART2/3 fields live here).
pub(crate) const PCLKSEL1: usize = 0x1ac;
/// Width mask of one peripheral clock selection field.
pub(crate) const PCLKSEL_MASK: u32 = 0b11;

/// Divisor latch access bit: set to expose DLL/DLM, clear for normal operation.
pub(crate) const LCR_DLAB: u32 = 1 << 7;
/// Two stop bits (one when clear).
pub(crate) const LCR_STOP_2: u32 = 1 << 2;
/// Parity generation and checking enabled.
pub(crate) const LCR_PARITY_ENABLE: u32 = 1 << 3;
/// Even parity (odd when clear; only meaningful with parity enabled).
pub(crate) const LCR_PARITY_EVEN: u32 = 1 << 4;

bitflags! {
    /// Line status register bits.
    #[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
    pub(crate) struct LineStatus: u32 {
        /// Receive data ready.
        const RDR = 1 << 0;
        /// Overrun error.
        const OE = 1 << 1;
        /// Parity error.
        const PE = 1 << 2;
        /// Framing error.
        const FE = 1 << 3;
        /// Break interrupt.
        const BI = 1 << 4;
        /// Transmit holding register empty: ready to accept the next byte.
        const THRE = 1 << 5;
        /// Transmitter empty (holding register and shift register both idle).
        const TEMT = 1 << 6;
        /// Error in the receive FIFO.
        const RXFE = 1 << 7;
    }
}

bitflags! {
    /// FIFO control register bits.
    #[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
    pub(crate) struct FifoControl: u32 {
        /// Enables the transmit and receive FIFOs.
        const ENABLE = 1 << 0;
        /// Clears the receive FIFO (self-clearing).
        const RX_RESET = 1 << 1;
        /// Clears the transmit FIFO (self-clearing).
        const TX_RESET = 1 << 2;
    }
}
