use crate::error::{Result, SensorError};
use embedded_hal::blocking::i2c;

/// How many bytes the register address takes on the wire
#[derive(Copy, Clone, Debug, Ord, PartialOrd, Eq, PartialEq)]
pub enum AddressWidth {
    Bits8,
    Bits16,
}

/// A device on the bus that is accessed through addressed registers
#[derive(Clone, Debug)]
pub struct RegisterDevice<I2C> {
    i2c: I2C,
    address: u8,
    width: AddressWidth,
}

impl<I2C> RegisterDevice<I2C> {
    pub fn new(i2c: I2C, address: u8, width: AddressWidth) -> Self {
        Self {
            i2c,
            address,
            width,
        }
    }

    pub fn address(&self) -> u8 {
        self.address
    }

    /// Talk to the device under a new bus address from now on
    pub fn set_address(&mut self, address: u8) {
        self.address = address;
    }

    pub fn release(self) -> I2C {
        self.i2c
    }

    /// Register address bytes as sent on the wire, most significant first
    fn register_bytes(&self, register: u16) -> ([u8; 2], usize) {
        match self.width {
            AddressWidth::Bits8 => ([register as u8, 0], 1),
            AddressWidth::Bits16 => (register.to_be_bytes(), 2),
        }
    }
}

impl<I2C> RegisterDevice<I2C>
where
    I2C: i2c::WriteRead + i2c::Write,
{
    /// Fills `buffer` with consecutive registers starting at `register`
    pub fn read_register(&mut self, register: u16, buffer: &mut [u8]) -> Result<()> {
        let (reg, len) = self.register_bytes(register);
        match self.i2c.write_read(self.address, &reg[..len], buffer) {
            Ok(res) => Ok(res),
            Err(_) => Err(SensorError::WriteReadI2CError { register }),
        }
    }

    pub fn write_register(&mut self, register: u16, bytes: &[u8]) -> Result<()> {
        let (reg, len) = self.register_bytes(register);
        let mut frame = Vec::with_capacity(len + bytes.len());
        frame.extend_from_slice(&reg[..len]);
        frame.extend_from_slice(bytes);

        match self.i2c.write(self.address, &frame) {
            Ok(res) => Ok(res),
            Err(_) => Err(SensorError::WriteI2CError { register }),
        }
    }

    pub fn read_u8(&mut self, register: u16) -> Result<u8> {
        let mut buffer = [0; 1];
        self.read_register(register, &mut buffer)?;
        Ok(buffer[0])
    }

    pub fn read_u16_be(&mut self, register: u16) -> Result<u16> {
        let mut buffer = [0; 2];
        self.read_register(register, &mut buffer)?;
        Ok(crate::merge_bytes(buffer[0], buffer[1]))
    }

    pub fn write_u8(&mut self, register: u16, value: u8) -> Result<()> {
        self.write_register(register, &[value])
    }

    pub fn write_u16_be(&mut self, register: u16, value: u16) -> Result<()> {
        self.write_register(register, &value.to_be_bytes())
    }
}
