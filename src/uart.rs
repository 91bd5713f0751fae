//! The UART driver: ordered bring-up and polled transmission.

#[cfg(feature = "embedded-io")]
mod embedded_io;

use crate::config::UartConfig;
use crate::divisor::Divisor;
use crate::port::{PinMux, RegisterPort};
use crate::registers::{
    FifoControl, LineStatus, DLL, DLM, FCR, FDR, IER, LCR, LCR_DLAB, LSR, PCLKSEL_MASK, PCONP, THR,
};
use crate::Result;
use core::fmt::{self, Write};
use log::debug;

/// Driver for one UART instance.
///
/// Constructing the driver runs the complete bring-up sequence, so a `Uart`
/// value always refers to a peripheral in a known transmit-ready state; a
/// configuration that cannot be satisfied never yields a driver to transmit
/// through.
///
/// The driver assumes exclusive ownership of the instance's register block.
/// Concurrent access to the same instance from another execution context is a
/// caller-level invariant; nothing here locks.
pub struct Uart<P: RegisterPort> {
    port: P,
    base: usize,
}

impl<P: RegisterPort> Uart<P> {
    /// Brings up the peripheral described by `config` and returns the driver.
    ///
    /// The sequence is strictly ordered: power on, peripheral clock selection,
    /// pin routing, divisor programming, then line format, FIFO enable and
    /// interrupt masking. It is idempotent - re-running it with the same
    /// configuration reproduces the same final register state - but re-running
    /// it while a transmission is in flight corrupts that transmission; it is
    /// meant for one-time cold bring-up.
    ///
    /// The divisor programming step flips the peripheral into divisor-access
    /// mode and back. No other access to this peripheral's registers may be
    /// interleaved with it: on a system with interrupts already enabled, call
    /// this with interrupts masked or from a context that cannot be
    /// re-entered.
    ///
    /// Fails with [`Error::UnreachableBaudRate`](crate::Error) before touching
    /// any register if the requested baud rate cannot be produced from the
    /// configured peripheral clock.
    pub fn new(port: P, pins: &mut impl PinMux, config: &UartConfig) -> Result<Self> {
        let divisor = Divisor::compute(config.pclk_hz(), config.baud)?;
        let mut uart = Self {
            port,
            base: config.instance.base(),
        };
        uart.power_on(config);
        uart.select_clock(config);
        uart.mux_pins(pins, config);
        uart.program_divisor(&divisor);
        uart.configure_line(config);
        debug!(
            "uart{} up at {} baud ({} ppm off target)",
            config.instance as u8,
            divisor.actual_baud(config.pclk_hz()),
            divisor.error_ppm()
        );
        Ok(uart)
    }

    /// Step 1: asserts the instance's power bit. A no-op if already powered.
    fn power_on(&mut self, config: &UartConfig) {
        let pconp = self.port.read32(config.syscon_base, PCONP);
        self.port.write32(
            config.syscon_base,
            PCONP,
            pconp | (1 << config.instance.power_bit()),
        );
    }

    /// Step 2: selects the divider feeding this instance's peripheral clock.
    fn select_clock(&mut self, config: &UartConfig) {
        let (offset, shift) = config.instance.clock_select();
        let mut selection = self.port.read32(config.syscon_base, offset);
        selection &= !(PCLKSEL_MASK << shift);
        selection |= config.pclk.field() << shift;
        self.port.write32(config.syscon_base, offset, selection);
    }

    /// Step 3: routes the configured signals to their pins. Transmit is
    /// always routed; pins for absent assignments are left untouched.
    fn mux_pins(&mut self, pins: &mut impl PinMux, config: &UartConfig) {
        let txd = config.pins.txd;
        pins.configure_pin(txd.pin, txd.function, txd.pull);
        for assignment in [config.pins.rxd, config.pins.cts, config.pins.rts]
            .into_iter()
            .flatten()
        {
            pins.configure_pin(assignment.pin, assignment.function, assignment.pull);
        }
    }

    /// Step 4: programs the divisor latch and fractional divider.
    ///
    /// Runs entirely in divisor-access mode and leaves it again; see the
    /// interleaving requirement on [`Uart::new`].
    fn program_divisor(&mut self, divisor: &Divisor) {
        self.port.write32(self.base, LCR, LCR_DLAB);
        self.port.write32(self.base, DLM, divisor.dlm().into());
        self.port.write32(self.base, DLL, divisor.dll().into());
        self.port.write32(self.base, FDR, divisor.fdr_word());
        self.port.write32(self.base, LCR, 0);
    }

    /// Step 5: line format, FIFO enable and interrupt masking.
    fn configure_line(&mut self, config: &UartConfig) {
        self.port.write32(self.base, LCR, config.frame.lcr_value());
        self.port.write32(
            self.base,
            FCR,
            (FifoControl::ENABLE | FifoControl::RX_RESET | FifoControl::TX_RESET).bits(),
        );
        // All interrupt sources stay masked; this driver only ever polls.
        self.port.write32(self.base, IER, 0);
    }

    /// Sends one byte, busy-waiting until the transmit holding register is
    /// empty.
    ///
    /// There is no timeout: if the peripheral never reports ready (hardware
    /// fault, or bring-up never ran on this instance) this spins forever.
    /// That is the documented contract for a boot-time console primitive, not
    /// an oversight.
    pub fn transmit_byte(&mut self, byte: u8) {
        while !self.line_status().contains(LineStatus::THRE) {}
        self.port.write32(self.base, THR, byte.into());
    }

    /// Sends every byte of `bytes` in order, blocking as for
    /// [`Uart::transmit_byte`].
    pub fn send_bytes(&mut self, bytes: &[u8]) {
        for &byte in bytes {
            self.transmit_byte(byte);
        }
    }

    fn line_status(&mut self) -> LineStatus {
        LineStatus::from_bits_truncate(self.port.read32(self.base, LSR))
    }
}

impl<P: RegisterPort> Write for Uart<P> {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        self.send_bytes(s.as_bytes());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Frame, PclkDivider, PinAssignment, Pins, UartInstance, SYSCON_BASE};
    use crate::port::fake::{Access, FakePort, State};
    use crate::port::{Pin, PinFunction, PullMode};
    use crate::registers::PCLKSEL0;
    use crate::Error;
    use std::sync::{Arc, Mutex};

    const TXD: PinAssignment = PinAssignment {
        pin: Pin { port: 0, pin: 2 },
        function: PinFunction::Alt1,
        pull: PullMode::PullUp,
    };
    const RXD: PinAssignment = PinAssignment {
        pin: Pin { port: 0, pin: 3 },
        function: PinFunction::Alt1,
        pull: PullMode::PullUp,
    };

    fn console_config() -> UartConfig {
        UartConfig {
            instance: UartInstance::Uart0,
            cclk_hz: 100_000_000,
            pclk: PclkDivider::Div4,
            baud: 115_200,
            frame: Frame::default(),
            pins: Pins {
                txd: TXD,
                rxd: None,
                cts: None,
                rts: None,
            },
            syscon_base: SYSCON_BASE,
        }
    }

    fn bring_up(config: &UartConfig) -> (Uart<FakePort>, Arc<Mutex<State>>) {
        let state = Arc::new(Mutex::new(State::default()));
        let mut pins = FakePort::new(state.clone());
        let uart = Uart::new(FakePort::new(state.clone()), &mut pins, config).unwrap();
        (uart, state)
    }

    #[test]
    fn bring_up_runs_steps_in_order() {
        let config = console_config();
        let (_uart, state) = bring_up(&config);

        let base = UartInstance::Uart0.base();
        let divisor = Divisor::compute(25_000_000, 115_200).unwrap();
        let expected = vec![
            // Step 1: power.
            Access::Read {
                base: SYSCON_BASE,
                offset: PCONP,
            },
            Access::Write {
                base: SYSCON_BASE,
                offset: PCONP,
                value: 1 << 3,
            },
            // Step 2: peripheral clock selection (CCLK/4 encodes as 0b00).
            Access::Read {
                base: SYSCON_BASE,
                offset: PCLKSEL0,
            },
            Access::Write {
                base: SYSCON_BASE,
                offset: PCLKSEL0,
                value: 0,
            },
            // Step 3: pins (transmit only for this configuration).
            Access::ConfigurePin {
                pin: TXD.pin,
                function: TXD.function,
                pull: TXD.pull,
            },
            // Step 4: divisor, inside divisor-access mode.
            Access::Write {
                base,
                offset: LCR,
                value: LCR_DLAB,
            },
            Access::Write {
                base,
                offset: DLM,
                value: divisor.dlm().into(),
            },
            Access::Write {
                base,
                offset: DLL,
                value: divisor.dll().into(),
            },
            Access::Write {
                base,
                offset: FDR,
                value: divisor.fdr_word(),
            },
            Access::Write {
                base,
                offset: LCR,
                value: 0,
            },
            // Step 5: 8N1, FIFO on and reset, interrupts masked.
            Access::Write {
                base,
                offset: LCR,
                value: 0b11,
            },
            Access::Write {
                base,
                offset: FCR,
                value: 0b111,
            },
            Access::Write {
                base,
                offset: IER,
                value: 0,
            },
        ];
        assert_eq!(state.lock().unwrap().log, expected);
    }

    #[test]
    fn bring_up_is_idempotent() {
        let config = console_config();
        let (_uart, state) = bring_up(&config);
        let first_regs = state.lock().unwrap().regs.clone();
        let first_pins = state.lock().unwrap().pins.clone();

        let mut pins = FakePort::new(state.clone());
        let _uart = Uart::new(FakePort::new(state.clone()), &mut pins, &config).unwrap();

        let state = state.lock().unwrap();
        assert_eq!(state.regs, first_regs);
        assert_eq!(state.pins, first_pins);
    }

    #[test]
    fn unreachable_baud_aborts_before_touching_hardware() {
        let config = UartConfig {
            cclk_hz: 4_000_000, // 1 MHz peripheral clock, far too slow.
            ..console_config()
        };
        let state = Arc::new(Mutex::new(State::default()));
        let mut pins = FakePort::new(state.clone());
        let result = Uart::new(FakePort::new(state.clone()), &mut pins, &config);
        assert_eq!(
            result.err(),
            Some(Error::UnreachableBaudRate {
                clock_hz: 1_000_000,
                baud: 115_200
            })
        );
        assert!(state.lock().unwrap().log.is_empty());
    }

    #[test]
    fn bring_up_leaves_polled_transmit_state() {
        let config = console_config();
        let (_uart, state) = bring_up(&config);
        let base = config.instance.base();

        let state = state.lock().unwrap();
        // Interrupts masked, divisor-access mode left, FIFO enabled.
        assert_eq!(state.regs[&(base, IER)], 0);
        assert_eq!(state.regs[&(base, LCR)] & LCR_DLAB, 0);
        assert_ne!(state.regs[&(base, FCR)] & FifoControl::ENABLE.bits(), 0);
        // Power asserted for UART0.
        assert_ne!(state.regs[&(SYSCON_BASE, PCONP)] & (1 << 3), 0);
    }

    #[test]
    fn other_instances_power_and_clock_fields() {
        let config = UartConfig {
            instance: UartInstance::Uart3,
            pclk: PclkDivider::Div2,
            ..console_config()
        };
        let (_uart, state) = bring_up(&config);

        let state = state.lock().unwrap();
        assert_ne!(state.regs[&(SYSCON_BASE, PCONP)] & (1 << 25), 0);
        assert_eq!(
            state.regs[&(SYSCON_BASE, crate::registers::PCLKSEL1)] >> 18 & 0b11,
            0b10
        );
    }

    #[test]
    fn disabled_signals_leave_pins_untouched() {
        let config = console_config();
        let (_uart, state) = bring_up(&config);
        let pin_accesses = state
            .lock()
            .unwrap()
            .log
            .iter()
            .filter(|access| matches!(access, Access::ConfigurePin { .. }))
            .count();
        assert_eq!(pin_accesses, 1);
    }

    #[test]
    fn configured_receive_pin_is_routed() {
        let mut config = console_config();
        config.pins.rxd = Some(RXD);
        let (_uart, state) = bring_up(&config);
        let state = state.lock().unwrap();
        assert_eq!(
            state.pins[&RXD.pin],
            (PinFunction::Alt1, PullMode::PullUp)
        );
        assert_eq!(state.pins.len(), 2);
    }

    #[test]
    fn transmit_is_one_status_read_and_one_write() {
        let config = console_config();
        let (mut uart, state) = bring_up(&config);
        state.lock().unwrap().log.clear();

        uart.transmit_byte(b'Q');

        let base = config.instance.base();
        assert_eq!(
            state.lock().unwrap().log,
            vec![
                Access::Read { base, offset: LSR },
                Access::Write {
                    base,
                    offset: THR,
                    value: b'Q'.into()
                },
            ]
        );
    }

    #[test]
    fn transmit_polls_until_holding_register_empties() {
        let config = console_config();
        let (mut uart, state) = bring_up(&config);
        {
            let mut state = state.lock().unwrap();
            state.log.clear();
            state.busy_status_reads = 3;
        }

        uart.transmit_byte(0x55);

        let base = config.instance.base();
        let log = state.lock().unwrap().log.clone();
        assert_eq!(log.len(), 5); // 3 busy polls, 1 ready poll, 1 data write.
        assert!(log[..4]
            .iter()
            .all(|access| *access == Access::Read { base, offset: LSR }));
        assert_eq!(
            log[4],
            Access::Write {
                base,
                offset: THR,
                value: 0x55
            }
        );
    }

    #[test]
    fn formatted_output_transmits_every_byte() {
        let config = console_config();
        let (mut uart, state) = bring_up(&config);
        state.lock().unwrap().log.clear();

        write!(uart, "ok {}", 7).unwrap();

        let written: Vec<u8> = state
            .lock()
            .unwrap()
            .log
            .iter()
            .filter_map(|access| match access {
                Access::Write { offset, value, .. } if *offset == THR => Some(*value as u8),
                _ => None,
            })
            .collect();
        assert_eq!(written, b"ok 7");
    }
}
