//! Polled bring-up and transmit driver for 16550-style UARTs with a fractional
//! baud-rate generator.
//!
//! The driver targets the boot-time console use case: it programs the baud-rate
//! generator, walks the peripheral through an ordered bring-up sequence, and
//! then transmits bytes by busy-waiting on the line status register. There are
//! no interrupts, no buffering and no receive path; anything beyond getting
//! deterministic console output before a scheduler exists is out of scope.
//!
//! All hardware access goes through the [`RegisterPort`] and [`PinMux`] traits,
//! so the driver can run against real memory-mapped registers ([`MmioPort`]) or
//! against a recording fake in unit tests.
//!
//! # Examples
//!
//! ```
//! use lpc_uart::{
//!     Frame, PclkDivider, Pin, PinAssignment, PinFunction, Pins, PullMode, Uart, UartConfig,
//!     UartInstance, SYSCON_BASE,
//! };
//! # use lpc_uart::{PinMux, RegisterPort};
//! # fn example(port: impl RegisterPort, mut pins: impl PinMux) -> lpc_uart::Result {
//! let config = UartConfig {
//!     instance: UartInstance::Uart0,
//!     cclk_hz: 100_000_000,
//!     pclk: PclkDivider::Div4,
//!     baud: 115_200,
//!     frame: Frame::default(),
//!     pins: Pins {
//!         txd: PinAssignment {
//!             pin: Pin { port: 0, pin: 2 },
//!             function: PinFunction::Alt1,
//!             pull: PullMode::PullUp,
//!         },
//!         rxd: None,
//!         cts: None,
//!         rts: None,
//!     },
//!     syscon_base: SYSCON_BASE,
//! };
//! let mut uart = Uart::new(port, &mut pins, &config)?;
//! uart.send_bytes(b"hello\n");
//! # Ok(())
//! # }
//! ```

#![cfg_attr(not(test), no_std)]
#![deny(unused_must_use, missing_docs)]

mod config;
mod divisor;
mod port;
mod registers;
mod uart;

pub use self::config::{
    Frame, Parity, PclkDivider, PinAssignment, Pins, StopBits, UartConfig, UartInstance,
    WordLength, SYSCON_BASE,
};
pub use self::divisor::{Divisor, DEFAULT_INTEGER_PREFERENCE_PPM};
pub use self::port::{MmioPort, Pin, PinFunction, PinMux, PullMode, RegisterPort};
pub use self::uart::Uart;

use thiserror::Error;

/// The type returned by driver methods.
pub type Result<T = ()> = core::result::Result<T, Error>;

/// The error type of the UART bring-up driver.
#[derive(Copy, Clone, Debug, Eq, Error, PartialEq)]
pub enum Error {
    /// No divisor within the hardware limits produces the requested baud rate.
    #[error("baud rate {baud} is unreachable from a {clock_hz} Hz peripheral clock")]
    UnreachableBaudRate {
        /// The peripheral clock the calculation was given.
        clock_hz: u32,
        /// The baud rate that was asked for.
        baud: u32,
    },
    /// A clock frequency or baud rate of zero was supplied.
    #[error("clock frequency and baud rate must be non-zero")]
    InvalidParameter,
}
