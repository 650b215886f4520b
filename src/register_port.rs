// src/register_port.rs

use embedded_hal::digital::OutputPin;
use embedded_hal::spi::SpiBus;

use crate::errors::TransportError;
use crate::registers::{read_address, write_address};

/// Single-register access to the MFRC522.
///
/// The driver only ever talks to the chip through this trait, so a simulated
/// chip can stand in for the SPI port in tests.
pub trait RegisterAccess {
    type Error;

    fn write_register(&mut self, reg: u8, value: u8) -> Result<(), Self::Error>;

    fn read_register(&mut self, reg: u8) -> Result<u8, Self::Error>;

    /// Read-modify-write: `reg |= mask`.
    fn set_bits(&mut self, reg: u8, mask: u8) -> Result<(), Self::Error> {
        let current = self.read_register(reg)?;
        self.write_register(reg, current | mask)
    }

    /// Read-modify-write: `reg &= !mask`.
    fn clear_bits(&mut self, reg: u8, mask: u8) -> Result<(), Self::Error> {
        let current = self.read_register(reg)?;
        self.write_register(reg, current & !mask)
    }
}

impl<T: RegisterAccess + ?Sized> RegisterAccess for &mut T {
    type Error = T::Error;

    fn write_register(&mut self, reg: u8, value: u8) -> Result<(), Self::Error> {
        (**self).write_register(reg, value)
    }

    fn read_register(&mut self, reg: u8) -> Result<u8, Self::Error> {
        (**self).read_register(reg)
    }
}

/// SPI transport with a manually driven chip-select line.
///
/// Every register access is one transaction: CS low, address byte, data
/// byte, CS high. Nothing else is sent while CS is asserted.
pub struct RegisterPort<SPI, CS> {
    spi: SPI,
    cs: CS,
}

impl<SPI, CS> RegisterPort<SPI, CS>
where
    SPI: SpiBus<u8>,
    CS: OutputPin,
{
    pub fn new(spi: SPI, cs: CS) -> Self {
        RegisterPort { spi, cs }
    }

    /// Parks chip-select high so the first transaction starts from idle.
    pub fn deselect(&mut self) -> Result<(), TransportError<SPI::Error, CS::Error>> {
        self.cs.set_high().map_err(TransportError::ChipSelect)
    }

    pub fn release(self) -> (SPI, CS) {
        (self.spi, self.cs)
    }

    fn with_chip_selected<F, T>(&mut self, f: F) -> Result<T, TransportError<SPI::Error, CS::Error>>
    where
        F: FnOnce(&mut SPI) -> Result<T, SPI::Error>,
    {
        self.cs.set_low().map_err(TransportError::ChipSelect)?;
        let result = f(&mut self.spi)
            .and_then(|value| self.spi.flush().map(|_| value))
            .map_err(TransportError::Spi);
        let released = self.cs.set_high().map_err(TransportError::ChipSelect);

        // A bus error wins over a failure to release CS.
        let value = result?;
        released?;
        Ok(value)
    }
}

impl<SPI, CS> RegisterAccess for RegisterPort<SPI, CS>
where
    SPI: SpiBus<u8>,
    CS: OutputPin,
{
    type Error = TransportError<SPI::Error, CS::Error>;

    fn write_register(&mut self, reg: u8, value: u8) -> Result<(), Self::Error> {
        let frame = [write_address(reg), value];
        self.with_chip_selected(|spi| spi.write(&frame))
    }

    fn read_register(&mut self, reg: u8) -> Result<u8, Self::Error> {
        let frame = [read_address(reg), 0x00];
        let mut read_buffer = [0u8; 2];
        self.with_chip_selected(|spi| spi.transfer(&mut read_buffer, &frame))?;
        Ok(read_buffer[1])
    }
}
