// src/hardware/lis3dh.rs - LIS3DH accelerometer over I2C
use super::{RawSample, SampleReadError, SampleSource};
use embedded_hal::i2c::I2c;

/// SDO/SA0 pulled high.
pub const DEFAULT_ADDRESS: u8 = 0x19;

const WHO_AM_I: u8 = 0x0f;
const DEVICE_ID: u8 = 0x33;
const CTRL_REG1: u8 = 0x20;
const CTRL_REG4: u8 = 0x23;
const OUT_X_L: u8 = 0x28;
/// Setting the MSB of the sub-address makes the device auto-increment.
const AUTO_INCREMENT: u8 = 0x80;

/// 50 Hz output data rate, X/Y/Z enabled.
const CTRL_REG1_50HZ_XYZ: u8 = 0x47;
/// Block data update, little endian, ±2 g full scale, high resolution.
const CTRL_REG4_BDU_2G_HR: u8 = 0x88;

/// LIS3DH driver generic over an `embedded-hal` I2C bus.
pub struct Lis3dh<I2C> {
    i2c: I2C,
    address: u8,
}

impl<I2C: I2c> Lis3dh<I2C> {
    pub fn new(i2c: I2C, address: u8) -> Self {
        Self { i2c, address }
    }

    /// Check the device id and configure 50 Hz, ±2 g, high resolution sampling.
    pub fn probe(&mut self) -> Result<(), SampleReadError> {
        let id = self.read_register(WHO_AM_I)?;
        if id != DEVICE_ID {
            tracing::error!("Accelerometer at 0x{:02x} returned unexpected id 0x{:02x}", self.address, id);
            return Err(SampleReadError::WrongDevice { found: id, expected: DEVICE_ID });
        }
        self.write_register(CTRL_REG1, CTRL_REG1_50HZ_XYZ)?;
        self.write_register(CTRL_REG4, CTRL_REG4_BDU_2G_HR)?;
        tracing::info!("LIS3DH at 0x{:02x} configured for 50 Hz, ±2 g", self.address);
        Ok(())
    }

    pub fn release(self) -> I2C {
        self.i2c
    }

    fn read_register(&mut self, register: u8) -> Result<u8, SampleReadError> {
        let mut buf = [0u8; 1];
        self.i2c
            .write_read(self.address, &[register], &mut buf)
            .map_err(bus_error)?;
        Ok(buf[0])
    }

    fn write_register(&mut self, register: u8, value: u8) -> Result<(), SampleReadError> {
        self.i2c.write(self.address, &[register, value]).map_err(bus_error)
    }
}

impl<I2C: I2c> SampleSource for Lis3dh<I2C> {
    /// One burst read of all six output registers so the axes come from the same sample.
    fn read(&mut self) -> Result<RawSample, SampleReadError> {
        let mut buf = [0u8; 6];
        self.i2c
            .write_read(self.address, &[OUT_X_L | AUTO_INCREMENT], &mut buf)
            .map_err(bus_error)?;
        Ok(RawSample::from_le_bytes(buf))
    }
}

fn bus_error<E: embedded_hal::i2c::Error>(err: E) -> SampleReadError {
    SampleReadError::Bus(format!("{:?}", err.kind()))
}
