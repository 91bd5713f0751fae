//! Static per-instance configuration consumed by the bring-up sequence.
//!
//! Which signals an instance drives is data, not conditional compilation: the
//! optional pin assignments in [`Pins`] decide what the sequencer touches, and
//! one code path serves every configuration.

use crate::port::{Pin, PinFunction, PullMode};
use crate::registers::{PCLKSEL0, PCLKSEL1};

/// Base address of the system control block holding the power and peripheral
/// clock selection words.
pub const SYSCON_BASE: usize = 0x400f_c000;

/// The physical UART instances of the chip.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
#[repr(u8)]
pub enum UartInstance {
    /// UART0, powered at reset.
    Uart0 = 0,
    /// UART1 (the modem-control capable instance), powered at reset.
    Uart1 = 1,
    /// UART2, unpowered at reset.
    Uart2 = 2,
    /// UART3, unpowered at reset.
    Uart3 = 3,
}

impl UartInstance {
    /// Base address of this instance's register block.
    pub fn base(self) -> usize {
        match self {
            Self::Uart0 => 0x4000_c000,
            Self::Uart1 => 0x4001_0000,
            Self::Uart2 => 0x4009_8000,
            Self::Uart3 => 0x4009_c000,
        }
    }

    /// Bit index of this instance in the peripheral power control word.
    pub(crate) fn power_bit(self) -> u32 {
        match self {
            Self::Uart0 => 3,
            Self::Uart1 => 4,
            Self::Uart2 => 24,
            Self::Uart3 => 25,
        }
    }

    /// Clock selection word offset and field shift for this instance.
    pub(crate) fn clock_select(self) -> (usize, u32) {
        match self {
            Self::Uart0 => (PCLKSEL0, 6),
            Self::Uart1 => (PCLKSEL0, 8),
            Self::Uart2 => (PCLKSEL1, 16),
            Self::Uart3 => (PCLKSEL1, 18),
        }
    }
}

/// Ratio between the system clock and the peripheral clock fed to a UART.
///
/// The discriminants are the two-bit register field encoding, which is not
/// ordered by ratio.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
#[repr(u8)]
pub enum PclkDivider {
    /// Peripheral clock = system clock / 4, the reset default.
    Div4 = 0b00,
    /// Peripheral clock = system clock.
    Div1 = 0b01,
    /// Peripheral clock = system clock / 2.
    Div2 = 0b10,
    /// Peripheral clock = system clock / 8.
    Div8 = 0b11,
}

impl PclkDivider {
    /// Recovers the divider selection from a raw two-bit register field
    /// value, for code reading back the clock-select word.
    pub fn from_field(bits: u8) -> Option<Self> {
        match bits {
            0b00 => Some(Self::Div4),
            0b01 => Some(Self::Div1),
            0b10 => Some(Self::Div2),
            0b11 => Some(Self::Div8),
            _ => None,
        }
    }

    /// The division ratio this selection applies to the system clock.
    pub fn ratio(self) -> u32 {
        match self {
            Self::Div1 => 1,
            Self::Div2 => 2,
            Self::Div4 => 4,
            Self::Div8 => 8,
        }
    }

    /// The two-bit register field value.
    pub(crate) fn field(self) -> u32 {
        self as u32
    }
}

/// Number of data bits per character.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
#[repr(u8)]
pub enum WordLength {
    /// 5 data bits.
    Five = 0b00,
    /// 6 data bits.
    Six = 0b01,
    /// 7 data bits.
    Seven = 0b10,
    /// 8 data bits.
    Eight = 0b11,
}

/// Parity generation and checking.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Parity {
    /// No parity bit.
    None,
    /// Odd parity.
    Odd,
    /// Even parity.
    Even,
}

/// Number of stop bits per character.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum StopBits {
    /// One stop bit.
    One,
    /// Two stop bits.
    Two,
}

/// Character framing. The default is 8 data bits, no parity, 1 stop bit.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct Frame {
    /// Data bits per character.
    pub word_length: WordLength,
    /// Parity mode.
    pub parity: Parity,
    /// Stop bits per character.
    pub stop_bits: StopBits,
}

impl Default for Frame {
    fn default() -> Self {
        Self {
            word_length: WordLength::Eight,
            parity: Parity::None,
            stop_bits: StopBits::One,
        }
    }
}

impl Frame {
    /// Encodes the framing into the line control register (divisor access bit
    /// clear).
    pub(crate) fn lcr_value(self) -> u32 {
        use crate::registers::{LCR_PARITY_ENABLE, LCR_PARITY_EVEN, LCR_STOP_2};
        let mut lcr = self.word_length as u32;
        if self.stop_bits == StopBits::Two {
            lcr |= LCR_STOP_2;
        }
        match self.parity {
            Parity::None => {}
            Parity::Odd => lcr |= LCR_PARITY_ENABLE,
            Parity::Even => lcr |= LCR_PARITY_ENABLE | LCR_PARITY_EVEN,
        }
        lcr
    }
}

/// The pin routed to one signal.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct PinAssignment {
    /// The physical pin.
    pub pin: Pin,
    /// The alternate function that routes the signal to that pin.
    pub function: PinFunction,
    /// Pull resistor selection.
    pub pull: PullMode,
}

/// Pin routing for an instance's signals.
///
/// Transmit is always driven; the other signals are configured exactly when an
/// assignment is present, and their pins are left untouched otherwise.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct Pins {
    /// Transmit data.
    pub txd: PinAssignment,
    /// Receive data.
    pub rxd: Option<PinAssignment>,
    /// Clear-to-send input (flow control).
    pub cts: Option<PinAssignment>,
    /// Request-to-send output (flow control).
    pub rts: Option<PinAssignment>,
}

/// Everything the bring-up sequence needs to know about one UART instance.
///
/// Fixed at system configuration time and read-only afterwards. The peripheral
/// clock handed to the divisor calculation is derived from `cclk_hz` and
/// `pclk`, so the clock the hardware is switched to and the clock the divisor
/// is computed for cannot disagree.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct UartConfig {
    /// Which physical UART this configuration describes.
    pub instance: UartInstance,
    /// System clock frequency in Hz.
    pub cclk_hz: u32,
    /// Peripheral clock divider selected for this instance.
    pub pclk: PclkDivider,
    /// Target baud rate in bits per second.
    pub baud: u32,
    /// Character framing; [`Frame::default`] gives 8N1.
    pub frame: Frame,
    /// Pin routing for the instance's signals.
    pub pins: Pins,
    /// Base address of the system control block, [`SYSCON_BASE`] on real
    /// hardware.
    pub syscon_base: usize,
}

impl UartConfig {
    /// The peripheral clock this configuration delivers to the UART.
    pub fn pclk_hz(&self) -> u32 {
        self.cclk_hz / self.pclk.ratio()
    }
}
