//! Implementation of `embedded-io` traits for [`Uart`].

use super::Uart;
use crate::port::RegisterPort;
use core::convert::Infallible;
use embedded_io::{ErrorType, Write};

impl<P: RegisterPort> ErrorType for Uart<P> {
    type Error = Infallible;
}

impl<P: RegisterPort> Write for Uart<P> {
    fn write(&mut self, buf: &[u8]) -> Result<usize, Self::Error> {
        self.send_bytes(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> Result<(), Self::Error> {
        // Nothing is buffered in software; the hardware FIFO drains on its own.
        Ok(())
    }
}
