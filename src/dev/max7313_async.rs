//! Async flavour of the MAX7313 [`Driver`](crate::Driver), for buses implementing
//! `embedded-hal-async`.
//!
//! This module is only built if the `"async"` feature is enabled.  It issues exactly the same
//! register transactions as the blocking driver, in the same order.
//!
//! ```no_run
//! # async fn example<I2C: embedded_hal_async::i2c::I2c>(i2c: I2C) -> Result<(), max7313::Error<I2C::Error>> {
//! let mut max = max7313::Max7313Async::new(i2c);
//! max.begin().await?;
//! max.analog_write(4, 10).await?;
//! max.digital_write(5, false).await?;
//! # Ok(())
//! # }
//! ```
use embedded_hal_async::i2c::I2c;

use super::max7313::regs::{self, Phase, Regs};
use super::max7313::{DEFAULT_ADDRESS, MAX_INTENSITY};
use crate::fmt::{debug, trace};
use crate::{Direction, Error};

/// Async register level driver for a single MAX7313.
///
/// Like the blocking driver it caches nothing and performs unsynchronised read-modify-write
/// sequences.  Do not share one chip between several instances without serialising whole
/// operations.
pub struct Max7313Async<I2C> {
    i2c: I2C,
    addr: u8,
}

impl<I2C> Max7313Async<I2C> {
    pub fn new(i2c: I2C) -> Self {
        Self::with_address(i2c, DEFAULT_ADDRESS)
    }

    pub fn with_address(i2c: I2C, addr: u8) -> Self {
        Self { i2c, addr }
    }

    /// Give back the bus.
    pub fn release(self) -> I2C {
        self.i2c
    }
}

impl<I2C: I2c> Max7313Async<I2C> {
    async fn read(&mut self, reg: Regs) -> Result<u8, Error<I2C::Error>> {
        let mut buf = [0x00];
        self.i2c
            .write_read(self.addr, &[reg.into()], &mut buf)
            .await
            .map_err(Error::Bus)?;
        trace!("i2c {:#x}: read reg {:#x} -> {:#x}", self.addr, u8::from(reg), buf[0]);
        Ok(buf[0])
    }

    async fn write(&mut self, reg: Regs, value: u8) -> Result<(), Error<I2C::Error>> {
        trace!("i2c {:#x}: write reg {:#x} <- {:#x}", self.addr, u8::from(reg), value);
        self.i2c
            .write(self.addr, &[reg.into(), value])
            .await
            .map_err(Error::Bus)
    }

    async fn update(
        &mut self,
        reg: Regs,
        mask_set: u8,
        mask_clear: u8,
    ) -> Result<(), Error<I2C::Error>> {
        let value = self.read(reg).await?;
        self.write(reg, (value | mask_set) & !mask_clear).await
    }

    /// See [`Driver::begin()`](crate::Driver::begin).
    pub async fn begin(&mut self) -> Result<(), Error<I2C::Error>> {
        debug!("max7313 {:#x}: begin", self.addr);
        self.write(Regs::PortsConfig0, 0x00).await?;
        self.write(Regs::PortsConfig1, 0x00).await?;
        self.write(Regs::BlinkPhase0Port0, 0xff).await?;
        self.write(Regs::BlinkPhase0Port1, 0xff).await?;
        self.write(Regs::Configuration, regs::CONFIG_BLINK_ENABLE)
            .await?;
        self.write(Regs::MasterIntensity, 0xff).await
    }

    pub async fn pin_mode(&mut self, pin: u8, dir: Direction) -> Result<(), Error<I2C::Error>> {
        let pin = regs::check_pin(pin)?;
        let (mask_set, mask_clear) = match dir {
            Direction::Input => (regs::bit(pin), 0),
            Direction::Output => (0, regs::bit(pin)),
        };
        self.update(regs::config_reg(pin), mask_set, mask_clear)
            .await
    }

    pub async fn digital_read(&mut self, pin: u8) -> Result<bool, Error<I2C::Error>> {
        let pin = regs::check_pin(pin)?;
        Ok(self.read(regs::input_reg(pin)).await? & regs::bit(pin) != 0)
    }

    pub async fn digital_write(&mut self, pin: u8, value: bool) -> Result<(), Error<I2C::Error>> {
        let intensity = if value { MAX_INTENSITY } else { 0 };
        self.analog_write(pin, intensity).await
    }

    /// See [`Driver::analog_write()`](crate::Driver::analog_write).
    pub async fn analog_write(&mut self, pin: u8, intensity: u8) -> Result<(), Error<I2C::Error>> {
        let pin = regs::check_pin(pin)?;

        let phase_reg = regs::phase_reg(pin, Phase::Zero);
        let phase = self.read(phase_reg).await?;
        let (phase, intensity) = regs::phase_correction(phase, pin, intensity);
        self.write(phase_reg, phase).await?;

        let intensity_reg = regs::intensity_reg(pin);
        let shared = self.read(intensity_reg).await?;
        self.write(intensity_reg, regs::pack_intensity(shared, pin, intensity))
            .await
    }

    pub async fn intensity(&mut self, pin: u8) -> Result<u8, Error<I2C::Error>> {
        let pin = regs::check_pin(pin)?;
        let shared = self.read(regs::intensity_reg(pin)).await?;
        Ok(regs::unpack_intensity(shared, pin))
    }

    pub async fn is_off(&mut self, pin: u8) -> Result<bool, Error<I2C::Error>> {
        let pin = regs::check_pin(pin)?;
        Ok(self.read(regs::phase_reg(pin, Phase::Zero)).await? & regs::bit(pin) == 0)
    }

    pub async fn set_master_intensity(&mut self, level: u8) -> Result<(), Error<I2C::Error>> {
        let level = regs::clamp_intensity(level);
        self.update(Regs::MasterIntensity, level << 4, !(level << 4) & 0xf0)
            .await
    }

    pub async fn enable_interrupt(&mut self) -> Result<(), Error<I2C::Error>> {
        debug!("max7313 {:#x}: interrupt enabled", self.addr);
        self.update(Regs::Configuration, regs::CONFIG_INTERRUPT_ENABLE, 0)
            .await?;
        self.clear_interrupt().await
    }

    pub async fn disable_interrupt(&mut self) -> Result<(), Error<I2C::Error>> {
        debug!("max7313 {:#x}: interrupt disabled", self.addr);
        self.update(Regs::Configuration, 0, regs::CONFIG_INTERRUPT_ENABLE)
            .await?;
        self.clear_interrupt().await
    }

    pub async fn clear_interrupt(&mut self) -> Result<(), Error<I2C::Error>> {
        self.read(Regs::Input0).await?;
        self.read(Regs::Input1).await?;
        Ok(())
    }
}
