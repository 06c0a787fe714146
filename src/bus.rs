use embedded_hal::i2c as hal_i2c;

use crate::fmt::trace;

/// Blanket trait for types implementing `i2c::I2c`
pub trait I2cBus: hal_i2c::I2c {}

impl<T> I2cBus for T where T: hal_i2c::I2c {}

/// Single-register transactions as the MAX7313 expects them: one register address byte,
/// followed by one data byte.
pub(crate) trait I2cExt {
    type Error;

    fn write_reg<R: Into<u8>>(&mut self, addr: u8, reg: R, value: u8) -> Result<(), Self::Error>;
    fn update_reg<R: Into<u8>>(
        &mut self,
        addr: u8,
        reg: R,
        mask_set: u8,
        mask_clear: u8,
    ) -> Result<(), Self::Error>;
    fn read_reg<R: Into<u8>>(&mut self, addr: u8, reg: R) -> Result<u8, Self::Error>;
}

impl<I2C: I2cBus> I2cExt for I2C {
    type Error = I2C::Error;

    fn write_reg<R: Into<u8>>(&mut self, addr: u8, reg: R, value: u8) -> Result<(), Self::Error> {
        let reg = reg.into();
        trace!("i2c {:#x}: write reg {:#x} <- {:#x}", addr, reg, value);
        self.write(addr, &[reg, value])
    }

    fn update_reg<R: Into<u8>>(
        &mut self,
        addr: u8,
        reg: R,
        mask_set: u8,
        mask_clear: u8,
    ) -> Result<(), Self::Error> {
        let reg = reg.into();
        let mut value = self.read_reg(addr, reg)?;
        value |= mask_set;
        value &= !mask_clear;
        self.write_reg(addr, reg, value)
    }

    fn read_reg<R: Into<u8>>(&mut self, addr: u8, reg: R) -> Result<u8, Self::Error> {
        let reg = reg.into();
        let mut buf = [0x00];
        self.write_read(addr, &[reg], &mut buf)?;
        trace!("i2c {:#x}: read reg {:#x} -> {:#x}", addr, reg, buf[0]);
        Ok(buf[0])
    }
}

#[cfg(test)]
mod tests {
    use super::I2cExt;
    use embedded_hal_mock::eh1::i2c as mock_i2c;

    #[test]
    fn update_reg_preserves_untouched_bits() {
        let expectations = [
            mock_i2c::Transaction::write_read(0x42, vec![0x0f], vec![0b1010_0001]),
            mock_i2c::Transaction::write(0x42, vec![0x0f, 0b1010_1000]),
        ];
        let mut bus = mock_i2c::Mock::new(&expectations);

        bus.update_reg(0x42, 0x0fu8, 0b0000_1000, 0b0000_0001)
            .unwrap();

        bus.done();
    }

    #[test]
    fn update_reg_skips_write_when_read_fails() {
        let expectations = [mock_i2c::Transaction::write_read(0x42, vec![0x06], vec![0x00])
            .with_error(embedded_hal::i2c::ErrorKind::Other)];
        let mut bus = mock_i2c::Mock::new(&expectations);

        let res = bus.update_reg(0x42, 0x06u8, 0x01, 0x00);
        assert_eq!(res, Err(embedded_hal::i2c::ErrorKind::Other));

        bus.done();
    }
}
