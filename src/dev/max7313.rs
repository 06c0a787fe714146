//! Support for the Maxim `MAX7313` "16-Port I/O Expander with LED Intensity Control, Interrupt,
//! and Hot-Insertion Protection"
//!
//! Each port is either an input or a PWM output with 16 intensity steps.  Two neighbouring ports
//! share one intensity register (the even port in the low nibble, the odd port in the high
//! nibble) and the chip cannot reach a 0% duty cycle through that register alone.  Switching a
//! port fully off is done by inverting its on-state through the blink phase 0 register, which
//! requires blinking to be enabled by [`Driver::begin()`].
use crate::fmt::{debug, trace};
use crate::I2cExt;
use crate::{Direction, Error};

pub(crate) mod regs;

use regs::{Phase, Regs};

pub use regs::MAX_INTENSITY;

/// Address used by [`Max7313::new()`] and [`Driver::new()`].
pub const DEFAULT_ADDRESS: u8 = 0x42;

/// `MAX7313` "16-Port I/O Expander with LED Intensity Control"
pub struct Max7313<M>(M);

impl<I2C> Max7313<core::cell::RefCell<Driver<I2C>>>
where
    I2C: crate::I2cBus,
{
    /// Create a driver for a chip at [`DEFAULT_ADDRESS`].
    pub fn new(i2c: I2C) -> Self {
        Self::with_mutex(i2c, DEFAULT_ADDRESS)
    }

    /// Create a driver for a chip at the 7-bit address `addr`.
    pub fn with_address(i2c: I2C, addr: u8) -> Self {
        Self::with_mutex(i2c, addr)
    }
}

impl<I2C, M> Max7313<M>
where
    I2C: crate::I2cBus,
    M: crate::PortMutex<Port = Driver<I2C>>,
{
    pub fn with_mutex(i2c: I2C, addr: u8) -> Self {
        Self(crate::PortMutex::create(Driver::with_address(i2c, addr)))
    }

    /// Put the chip into a known state.  See [`Driver::begin()`].
    pub fn begin(&mut self) -> Result<(), Error<I2C::Error>> {
        self.0.lock(|drv| drv.begin())
    }

    /// Split the chip into its 16 pins and a handle for chip-wide settings.
    ///
    /// All pins start out as outputs, which is the state [`begin()`](Self::begin) leaves them in.
    pub fn split(&mut self) -> Parts<'_, I2C, M> {
        Parts {
            p0: crate::Pin::new(0, &self.0),
            p1: crate::Pin::new(1, &self.0),
            p2: crate::Pin::new(2, &self.0),
            p3: crate::Pin::new(3, &self.0),
            p4: crate::Pin::new(4, &self.0),
            p5: crate::Pin::new(5, &self.0),
            p6: crate::Pin::new(6, &self.0),
            p7: crate::Pin::new(7, &self.0),
            p8: crate::Pin::new(8, &self.0),
            p9: crate::Pin::new(9, &self.0),
            p10: crate::Pin::new(10, &self.0),
            p11: crate::Pin::new(11, &self.0),
            p12: crate::Pin::new(12, &self.0),
            p13: crate::Pin::new(13, &self.0),
            p14: crate::Pin::new(14, &self.0),
            p15: crate::Pin::new(15, &self.0),
            control: Control {
                port_driver: &self.0,
            },
        }
    }
}

pub struct Parts<'a, I2C, M = core::cell::RefCell<Driver<I2C>>>
where
    I2C: crate::I2cBus,
    M: crate::PortMutex<Port = Driver<I2C>>,
{
    pub p0: crate::Pin<'a, crate::mode::Output, M>,
    pub p1: crate::Pin<'a, crate::mode::Output, M>,
    pub p2: crate::Pin<'a, crate::mode::Output, M>,
    pub p3: crate::Pin<'a, crate::mode::Output, M>,
    pub p4: crate::Pin<'a, crate::mode::Output, M>,
    pub p5: crate::Pin<'a, crate::mode::Output, M>,
    pub p6: crate::Pin<'a, crate::mode::Output, M>,
    pub p7: crate::Pin<'a, crate::mode::Output, M>,
    pub p8: crate::Pin<'a, crate::mode::Output, M>,
    pub p9: crate::Pin<'a, crate::mode::Output, M>,
    pub p10: crate::Pin<'a, crate::mode::Output, M>,
    pub p11: crate::Pin<'a, crate::mode::Output, M>,
    pub p12: crate::Pin<'a, crate::mode::Output, M>,
    pub p13: crate::Pin<'a, crate::mode::Output, M>,
    pub p14: crate::Pin<'a, crate::mode::Output, M>,
    pub p15: crate::Pin<'a, crate::mode::Output, M>,
    pub control: Control<'a, M>,
}

/// Chip-wide settings which stay reachable while the pins are split off.
pub struct Control<'a, M> {
    port_driver: &'a M,
}

impl<'a, I2C, M> Control<'a, M>
where
    I2C: crate::I2cBus,
    M: crate::PortMutex<Port = Driver<I2C>>,
{
    pub fn enable_interrupt(&self) -> Result<(), Error<I2C::Error>> {
        self.port_driver.lock(|drv| drv.enable_interrupt())
    }

    pub fn disable_interrupt(&self) -> Result<(), Error<I2C::Error>> {
        self.port_driver.lock(|drv| drv.disable_interrupt())
    }

    pub fn clear_interrupt(&self) -> Result<(), Error<I2C::Error>> {
        self.port_driver.lock(|drv| drv.clear_interrupt())
    }

    pub fn set_master_intensity(&self, level: u8) -> Result<(), Error<I2C::Error>> {
        self.port_driver.lock(|drv| drv.set_master_intensity(level))
    }
}

/// Register level driver for a single MAX7313.
///
/// Holds nothing but the bus and the chip address.  No register contents are cached, every
/// operation is a fresh sequence of bus transactions.  Operations which modify part of a register
/// read it first and write it back, so they must not be interleaved with other writers to the
/// same chip.  Wrap the driver in a [`PortMutex`](crate::PortMutex) (as [`Max7313`] does) when
/// it is shared.
///
/// Pin numbers outside `0..=15` are rejected with [`Error::InvalidPin`] before touching the bus.
pub struct Driver<I2C> {
    i2c: I2C,
    addr: u8,
}

impl<I2C> Driver<I2C> {
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

impl<I2C: crate::I2cBus> Driver<I2C> {
    fn read(&mut self, reg: Regs) -> Result<u8, Error<I2C::Error>> {
        self.i2c.read_reg(self.addr, reg).map_err(Error::Bus)
    }

    fn write(&mut self, reg: Regs, value: u8) -> Result<(), Error<I2C::Error>> {
        self.i2c.write_reg(self.addr, reg, value).map_err(Error::Bus)
    }

    fn update(&mut self, reg: Regs, mask_set: u8, mask_clear: u8) -> Result<(), Error<I2C::Error>> {
        self.i2c
            .update_reg(self.addr, reg, mask_set, mask_clear)
            .map_err(Error::Bus)
    }

    /// Put the chip into a known state.
    ///
    /// All ports become outputs with a regular (non-inverted) blink phase 0, blinking is enabled
    /// so that [`analog_write()`](Self::analog_write) can switch ports fully off, and the master
    /// intensity is set to its maximum.  Must be called before any other operation.
    pub fn begin(&mut self) -> Result<(), Error<I2C::Error>> {
        debug!("max7313 {:#x}: begin", self.addr);
        self.write(Regs::PortsConfig0, 0x00)?;
        self.write(Regs::PortsConfig1, 0x00)?;
        self.write(Regs::BlinkPhase0Port0, 0xff)?;
        self.write(Regs::BlinkPhase0Port1, 0xff)?;
        self.write(Regs::Configuration, regs::CONFIG_BLINK_ENABLE)?;
        self.write(Regs::MasterIntensity, 0xff)?;
        Ok(())
    }

    /// Configure `pin` as an input or an output.
    ///
    /// The other 7 ports sharing the configuration register keep their direction.
    pub fn pin_mode(&mut self, pin: u8, dir: Direction) -> Result<(), Error<I2C::Error>> {
        let pin = regs::check_pin(pin)?;
        let (mask_set, mask_clear) = match dir {
            Direction::Input => (regs::bit(pin), 0),
            Direction::Output => (0, regs::bit(pin)),
        };
        self.update(regs::config_reg(pin), mask_set, mask_clear)
    }

    /// Read the logic level present on `pin`.
    pub fn digital_read(&mut self, pin: u8) -> Result<bool, Error<I2C::Error>> {
        let pin = regs::check_pin(pin)?;
        Ok(self.read(regs::input_reg(pin))? & regs::bit(pin) != 0)
    }

    /// Drive `pin` fully on or fully off.
    pub fn digital_write(&mut self, pin: u8, value: bool) -> Result<(), Error<I2C::Error>> {
        let intensity = if value { MAX_INTENSITY } else { 0 };
        self.analog_write(pin, intensity)
    }

    /// Drive `pin` with a PWM `intensity` between 0 (off) and 15 (fully on).
    ///
    /// Larger values saturate at 15.  The blink phase 0 bit of the pin is updated first, then the
    /// pin's nibble in the intensity register it shares with its neighbour.
    pub fn analog_write(&mut self, pin: u8, intensity: u8) -> Result<(), Error<I2C::Error>> {
        let pin = regs::check_pin(pin)?;
        trace!("max7313 {:#x}: pin {} intensity {}", self.addr, pin, intensity);

        let phase_reg = regs::phase_reg(pin, Phase::Zero);
        let phase = self.read(phase_reg)?;
        let (phase, intensity) = regs::phase_correction(phase, pin, intensity);
        self.write(phase_reg, phase)?;

        let intensity_reg = regs::intensity_reg(pin);
        let shared = self.read(intensity_reg)?;
        self.write(
            intensity_reg,
            regs::pack_intensity(shared, pin, intensity),
        )
    }

    /// Read back the intensity nibble of `pin`.
    ///
    /// A pin which was switched fully off reports 15 here; see [`is_off()`](Self::is_off).
    pub fn intensity(&mut self, pin: u8) -> Result<u8, Error<I2C::Error>> {
        let pin = regs::check_pin(pin)?;
        let shared = self.read(regs::intensity_reg(pin))?;
        Ok(regs::unpack_intensity(shared, pin))
    }

    /// Whether `pin` is forced fully off through an inverted blink phase 0.
    pub fn is_off(&mut self, pin: u8) -> Result<bool, Error<I2C::Error>> {
        let pin = regs::check_pin(pin)?;
        Ok(self.read(regs::phase_reg(pin, Phase::Zero))? & regs::bit(pin) == 0)
    }

    /// Set the master intensity which scales all PWM outputs.  Saturates at 15.
    pub fn set_master_intensity(&mut self, level: u8) -> Result<(), Error<I2C::Error>> {
        let level = regs::clamp_intensity(level);
        self.update(Regs::MasterIntensity, level << 4, !(level << 4) & 0xf0)
    }

    pub fn enable_interrupt(&mut self) -> Result<(), Error<I2C::Error>> {
        debug!("max7313 {:#x}: interrupt enabled", self.addr);
        self.update(Regs::Configuration, regs::CONFIG_INTERRUPT_ENABLE, 0)?;
        self.clear_interrupt()
    }

    pub fn disable_interrupt(&mut self) -> Result<(), Error<I2C::Error>> {
        debug!("max7313 {:#x}: interrupt disabled", self.addr);
        self.update(Regs::Configuration, 0, regs::CONFIG_INTERRUPT_ENABLE)?;
        self.clear_interrupt()
    }

    /// Acknowledge a pending interrupt.  The chip clears it when the input registers are read.
    pub fn clear_interrupt(&mut self) -> Result<(), Error<I2C::Error>> {
        self.read(Regs::Input0)?;
        self.read(Regs::Input1)?;
        Ok(())
    }

    /// Read the registers of both groups that `mask` touches, skipping groups without any pin in
    /// the mask.
    fn read_groups(&mut self, mask: u16, low: Regs, high: Regs) -> Result<u32, Error<I2C::Error>> {
        let p0 = if mask & 0x00ff != 0 {
            self.read(low)?
        } else {
            0
        };
        let p1 = if mask & 0xff00 != 0 {
            self.read(high)?
        } else {
            0
        };
        Ok(((p1 as u32) << 8) | p0 as u32)
    }
}

impl<I2C: crate::I2cBus> crate::PortDriver for Driver<I2C> {
    type Error = Error<I2C::Error>;

    fn set(&mut self, mask_high: u32, mask_low: u32) -> Result<(), Self::Error> {
        let mask_high = regs::check_mask(mask_high)?;
        let mask_low = regs::check_mask(mask_low)?;
        for pin in regs::pins_in(mask_high & !mask_low) {
            self.digital_write(pin, true)?;
        }
        for pin in regs::pins_in(mask_low) {
            self.digital_write(pin, false)?;
        }
        Ok(())
    }

    /// A pin counts as set HIGH unless it is forced fully off, so dimmed pins are HIGH as well.
    fn is_set(&mut self, mask_high: u32, mask_low: u32) -> Result<u32, Self::Error> {
        let mask = regs::check_mask(mask_high | mask_low)?;
        let on = self.read_groups(mask, Regs::BlinkPhase0Port0, Regs::BlinkPhase0Port1)?;
        Ok((on & mask_high) | (!on & mask_low))
    }

    fn get(&mut self, mask_high: u32, mask_low: u32) -> Result<u32, Self::Error> {
        let mask = regs::check_mask(mask_high | mask_low)?;
        let in_ = self.read_groups(mask, Regs::Input0, Regs::Input1)?;
        Ok((in_ & mask_high) | (!in_ & mask_low))
    }
}

impl<I2C: crate::I2cBus> crate::PortDriverTotemPole for Driver<I2C> {
    fn set_direction(&mut self, mask: u32, dir: Direction, state: bool) -> Result<(), Self::Error> {
        let mask = regs::check_mask(mask)?;

        // set state before switching direction to prevent glitch
        if dir == Direction::Output {
            use crate::PortDriver;
            if state {
                self.set(mask as u32, 0)?;
            } else {
                self.set(0, mask as u32)?;
            }
        }

        let (mask_set, mask_clear) = match dir {
            Direction::Input => (mask, 0),
            Direction::Output => (0, mask),
        };
        if mask & 0x00ff != 0 {
            self.update(
                Regs::PortsConfig0,
                (mask_set & 0xff) as u8,
                (mask_clear & 0xff) as u8,
            )?;
        }
        if mask & 0xff00 != 0 {
            self.update(
                Regs::PortsConfig1,
                (mask_set >> 8) as u8,
                (mask_clear >> 8) as u8,
            )?;
        }
        Ok(())
    }
}

impl<I2C: crate::I2cBus> crate::PortDriverPwm for Driver<I2C> {
    const MAX_INTENSITY: u8 = MAX_INTENSITY;

    fn set_intensity(&mut self, mask: u32, intensity: u8) -> Result<(), Self::Error> {
        for pin in regs::pins_in(regs::check_mask(mask)?) {
            self.analog_write(pin, intensity)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::regs;
    use super::{Driver, Max7313};
    use crate::{Direction, Error};
    use embedded_hal::i2c::{ErrorKind, NoAcknowledgeSource, Operation};
    use embedded_hal_mock::eh1::i2c as mock_i2c;

    /// Registers that exist on the chip.  Anything else is a gap in the register map.
    const MAPPED: [u8; 18] = [
        0x00, 0x01, 0x02, 0x03, 0x06, 0x07, 0x0a, 0x0b, 0x0e, 0x0f, 0x10, 0x11, 0x12, 0x13, 0x14,
        0x15, 0x16, 0x17,
    ];

    /// In-memory model of the MAX7313 register file.
    #[derive(Clone)]
    struct FakeChip {
        regs: [u8; 0x18],
        pointer: usize,
        transactions: usize,
    }

    impl FakeChip {
        fn new(fill: u8) -> Self {
            Self {
                regs: [fill; 0x18],
                pointer: 0,
                transactions: 0,
            }
        }
    }

    impl embedded_hal::i2c::ErrorType for FakeChip {
        type Error = ErrorKind;
    }

    impl embedded_hal::i2c::I2c for FakeChip {
        fn transaction(
            &mut self,
            address: u8,
            operations: &mut [Operation<'_>],
        ) -> Result<(), Self::Error> {
            if address != super::DEFAULT_ADDRESS {
                return Err(ErrorKind::NoAcknowledge(NoAcknowledgeSource::Address));
            }
            self.transactions += 1;
            for op in operations {
                match op {
                    Operation::Write(bytes) => {
                        let (reg, data) = bytes.split_first().expect("missing register address");
                        assert!(MAPPED.contains(reg), "access to unmapped register {:#x}", reg);
                        self.pointer = *reg as usize;
                        for value in data.iter() {
                            assert_ne!(self.pointer, 0x00, "input registers are read-only");
                            assert_ne!(self.pointer, 0x01, "input registers are read-only");
                            self.regs[self.pointer] = *value;
                        }
                    }
                    Operation::Read(buf) => {
                        for value in buf.iter_mut() {
                            *value = self.regs[self.pointer];
                        }
                    }
                }
            }
            Ok(())
        }
    }

    fn fresh_driver() -> Driver<FakeChip> {
        let mut drv = Driver::new(FakeChip::new(0xa5));
        drv.begin().unwrap();
        drv.i2c.transactions = 0;
        drv
    }

    #[test]
    fn begin_writes_known_state() {
        let expectations = [
            mock_i2c::Transaction::write(0x42, vec![0x06, 0x00]),
            mock_i2c::Transaction::write(0x42, vec![0x07, 0x00]),
            mock_i2c::Transaction::write(0x42, vec![0x02, 0xff]),
            mock_i2c::Transaction::write(0x42, vec![0x03, 0xff]),
            mock_i2c::Transaction::write(0x42, vec![0x0f, 0x01]),
            mock_i2c::Transaction::write(0x42, vec![0x0e, 0xff]),
        ];
        let mut bus = mock_i2c::Mock::new(&expectations);

        let mut drv = Driver::new(bus.clone());
        drv.begin().unwrap();

        bus.done();
    }

    #[test]
    fn begin_from_unknown_state() {
        let mut drv = Driver::new(FakeChip::new(0x5a));
        drv.begin().unwrap();

        let chip = drv.release();
        assert_eq!(chip.transactions, 6);
        assert_eq!(chip.regs[0x06], 0x00);
        assert_eq!(chip.regs[0x07], 0x00);
        assert_eq!(chip.regs[0x02], 0xff);
        assert_eq!(chip.regs[0x03], 0xff);
        assert_eq!(chip.regs[0x0f] & regs::CONFIG_BLINK_ENABLE, regs::CONFIG_BLINK_ENABLE);
        assert_eq!(chip.regs[0x0e], 0xff);
    }

    #[test]
    fn analog_write_transactions() {
        let expectations = [
            mock_i2c::Transaction::write_read(0x42, vec![0x02], vec![0xf7]),
            mock_i2c::Transaction::write(0x42, vec![0x02, 0xff]),
            mock_i2c::Transaction::write_read(0x42, vec![0x11], vec![0x05]),
            mock_i2c::Transaction::write(0x42, vec![0x11, 0x85]),
            // full off for pin 10
            mock_i2c::Transaction::write_read(0x42, vec![0x03], vec![0xff]),
            mock_i2c::Transaction::write(0x42, vec![0x03, 0xfb]),
            mock_i2c::Transaction::write_read(0x42, vec![0x15], vec![0x30]),
            mock_i2c::Transaction::write(0x42, vec![0x15, 0x3f]),
        ];
        let mut bus = mock_i2c::Mock::new(&expectations);

        let mut drv = Driver::new(bus.clone());
        drv.analog_write(3, 8).unwrap();
        drv.analog_write(10, 0).unwrap();

        bus.done();
    }

    #[test]
    fn analog_write_zero_forces_full_off() {
        for pin in 0..16 {
            let mut drv = fresh_driver();
            drv.analog_write(pin, 0).unwrap();

            assert_eq!(drv.i2c.transactions, 4);
            assert!(drv.is_off(pin).unwrap());
            assert_eq!(drv.intensity(pin).unwrap(), 15);
        }
    }

    #[test]
    fn analog_write_sets_phase_and_nibble() {
        for pin in 0..16u8 {
            for value in 1..=15 {
                let mut drv = fresh_driver();
                drv.analog_write(pin ^ 1, 6).unwrap();
                drv.analog_write(pin, 0).unwrap();

                drv.analog_write(pin, value).unwrap();

                assert!(!drv.is_off(pin).unwrap());
                assert_eq!(drv.intensity(pin).unwrap(), value);
                assert_eq!(drv.intensity(pin ^ 1).unwrap(), 6);
                assert!(!drv.is_off(pin ^ 1).unwrap());
            }
        }
    }

    #[test]
    fn paired_pins_keep_their_nibbles() {
        let mut drv = fresh_driver();
        for k in 0..8u8 {
            drv.analog_write(2 * k, k + 1).unwrap();
            drv.analog_write(2 * k + 1, 15 - k).unwrap();
        }
        for k in 0..8u8 {
            drv.analog_write(2 * k, 0).unwrap();
            assert_eq!(drv.intensity(2 * k + 1).unwrap(), 15 - k);
            drv.analog_write(2 * k + 1, 3).unwrap();
            assert_eq!(drv.intensity(2 * k).unwrap(), 15);
            assert!(drv.is_off(2 * k).unwrap());
        }
    }

    #[test]
    fn shared_register_scenario() {
        let mut drv = fresh_driver();
        drv.analog_write(2, 5).unwrap();
        drv.analog_write(3, 8).unwrap();
        assert_eq!(drv.i2c.regs[0x11], 0x85);
    }

    #[test]
    fn intensity_saturates() {
        let mut clamped = fresh_driver();
        let mut max = fresh_driver();
        clamped.analog_write(5, 200).unwrap();
        max.analog_write(5, 15).unwrap();
        assert_eq!(clamped.i2c.regs, max.i2c.regs);
    }

    #[test]
    fn digital_write_is_full_intensity_or_off() {
        for pin in 0..16 {
            for (value, intensity) in [(true, 15), (false, 0)] {
                let mut digital = fresh_driver();
                let mut analog = fresh_driver();
                digital.analog_write(pin, 7).unwrap();
                analog.analog_write(pin, 7).unwrap();

                digital.digital_write(pin, value).unwrap();
                analog.analog_write(pin, intensity).unwrap();

                assert_eq!(digital.i2c.regs, analog.i2c.regs);
            }
        }
    }

    #[test]
    fn pin_mode_touches_only_its_bit() {
        for pin in 0..16u8 {
            let config = if pin < 8 { 0x06 } else { 0x07 };
            let other = config ^ 0x01;

            let mut drv = fresh_driver();
            drv.i2c.regs[config] = 0x5a;
            drv.i2c.regs[other] = 0x3c;

            drv.pin_mode(pin, Direction::Input).unwrap();
            assert_eq!(drv.i2c.regs[config], 0x5a | (1 << (pin % 8)));
            assert_eq!(drv.i2c.regs[other], 0x3c);

            drv.pin_mode(pin, Direction::Output).unwrap();
            assert_eq!(drv.i2c.regs[config], 0x5a & !(1 << (pin % 8)));
            assert_eq!(drv.i2c.regs[other], 0x3c);
        }
    }

    #[test]
    fn pin_mode_selects_group_from_pin() {
        // Selecting the register by the mode instead of the pin once sent every pin to the
        // lower configuration register.
        let expectations = [
            mock_i2c::Transaction::write_read(0x42, vec![0x07], vec![0x00]),
            mock_i2c::Transaction::write(0x42, vec![0x07, 0x10]),
            mock_i2c::Transaction::write_read(0x42, vec![0x07], vec![0x10]),
            mock_i2c::Transaction::write(0x42, vec![0x07, 0x00]),
            mock_i2c::Transaction::write_read(0x42, vec![0x06], vec![0x00]),
            mock_i2c::Transaction::write(0x42, vec![0x06, 0x08]),
        ];
        let mut bus = mock_i2c::Mock::new(&expectations);

        let mut drv = Driver::new(bus.clone());
        drv.pin_mode(12, Direction::Input).unwrap();
        drv.pin_mode(12, Direction::Output).unwrap();
        drv.pin_mode(3, Direction::Input).unwrap();

        bus.done();
    }

    #[test]
    fn digital_read_masks_input_bit() {
        for pin in 0..16u8 {
            let mut drv = fresh_driver();
            let input = if pin < 8 { 0x00 } else { 0x01 };

            drv.i2c.regs[input] = 1 << (pin % 8);
            drv.i2c.regs[input ^ 0x01] = 0xff;
            assert!(drv.digital_read(pin).unwrap());

            drv.i2c.regs[input] = !(1 << (pin % 8));
            assert!(!drv.digital_read(pin).unwrap());
        }
    }

    #[test]
    fn digital_read_single_transaction() {
        let expectations = [
            mock_i2c::Transaction::write_read(0x42, vec![0x00], vec![0x20]),
            mock_i2c::Transaction::write_read(0x42, vec![0x01], vec![0x20]),
            mock_i2c::Transaction::write_read(0x42, vec![0x01], vec![0xdf]),
        ];
        let mut bus = mock_i2c::Mock::new(&expectations);

        let mut drv = Driver::new(bus.clone());
        assert!(drv.digital_read(5).unwrap());
        assert!(drv.digital_read(13).unwrap());
        assert!(!drv.digital_read(13).unwrap());

        bus.done();
    }

    #[test]
    fn interrupt_control() {
        let expectations = [
            // enable
            mock_i2c::Transaction::write_read(0x42, vec![0x0f], vec![0x01]),
            mock_i2c::Transaction::write(0x42, vec![0x0f, 0x09]),
            mock_i2c::Transaction::write_read(0x42, vec![0x00], vec![0x00]),
            mock_i2c::Transaction::write_read(0x42, vec![0x01], vec![0x00]),
            // disable
            mock_i2c::Transaction::write_read(0x42, vec![0x0f], vec![0xff]),
            mock_i2c::Transaction::write(0x42, vec![0x0f, 0xf7]),
            mock_i2c::Transaction::write_read(0x42, vec![0x00], vec![0x00]),
            mock_i2c::Transaction::write_read(0x42, vec![0x01], vec![0x00]),
            // clear
            mock_i2c::Transaction::write_read(0x42, vec![0x00], vec![0x12]),
            mock_i2c::Transaction::write_read(0x42, vec![0x01], vec![0x34]),
        ];
        let mut bus = mock_i2c::Mock::new(&expectations);

        let mut drv = Driver::new(bus.clone());
        drv.enable_interrupt().unwrap();
        drv.disable_interrupt().unwrap();
        drv.clear_interrupt().unwrap();

        bus.done();
    }

    #[test]
    fn master_intensity_keeps_o16_nibble() {
        let mut drv = fresh_driver();
        drv.i2c.regs[0x0e] = 0xf3;
        drv.set_master_intensity(4).unwrap();
        assert_eq!(drv.i2c.regs[0x0e], 0x43);
        drv.set_master_intensity(99).unwrap();
        assert_eq!(drv.i2c.regs[0x0e], 0xf3);
    }

    #[test]
    fn invalid_pins_never_reach_the_bus() {
        let mut bus = mock_i2c::Mock::new(&[]);

        let mut drv = Driver::new(bus.clone());
        assert_eq!(drv.analog_write(16, 3), Err(Error::InvalidPin(16)));
        assert_eq!(drv.digital_write(200, true), Err(Error::InvalidPin(200)));
        assert_eq!(drv.digital_read(16), Err(Error::InvalidPin(16)));
        assert_eq!(
            drv.pin_mode(255, Direction::Input),
            Err(Error::InvalidPin(255))
        );
        assert_eq!(drv.intensity(17), Err(Error::InvalidPin(17)));
        assert_eq!(drv.is_off(16), Err(Error::InvalidPin(16)));

        use crate::PortDriver;
        assert_eq!(drv.set(1 << 16, 0), Err(Error::InvalidPin(16)));
        assert_eq!(drv.get(0, 1 << 20), Err(Error::InvalidPin(20)));

        bus.done();
    }

    #[test]
    fn bus_errors_abort_the_operation() {
        let expectations = [
            mock_i2c::Transaction::write_read(0x42, vec![0x02], vec![0x00])
                .with_error(ErrorKind::Other),
            mock_i2c::Transaction::write_read(0x42, vec![0x02], vec![0x00]),
            mock_i2c::Transaction::write(0x42, vec![0x02, 0x01]).with_error(ErrorKind::Other),
            mock_i2c::Transaction::write_read(0x42, vec![0x06], vec![0x00])
                .with_error(ErrorKind::Other),
        ];
        let mut bus = mock_i2c::Mock::new(&expectations);

        let mut drv = Driver::new(bus.clone());
        assert_eq!(drv.analog_write(0, 4), Err(Error::Bus(ErrorKind::Other)));
        assert_eq!(drv.analog_write(0, 4), Err(Error::Bus(ErrorKind::Other)));
        assert_eq!(
            drv.pin_mode(0, Direction::Input),
            Err(Error::Bus(ErrorKind::Other))
        );

        bus.done();
    }

    #[test]
    fn wrong_address_is_reported() {
        let mut drv = Driver::with_address(FakeChip::new(0x00), 0x20);
        assert_eq!(
            drv.begin(),
            Err(Error::Bus(ErrorKind::NoAcknowledge(
                NoAcknowledgeSource::Address
            )))
        );
    }

    #[test]
    fn max7313() {
        let expectations = [
            // p1 high, then low
            mock_i2c::Transaction::write_read(0x42, vec![0x02], vec![0x00]),
            mock_i2c::Transaction::write(0x42, vec![0x02, 0x02]),
            mock_i2c::Transaction::write_read(0x42, vec![0x10], vec![0x00]),
            mock_i2c::Transaction::write(0x42, vec![0x10, 0xf0]),
            mock_i2c::Transaction::write_read(0x42, vec![0x02], vec![0x02]),
            mock_i2c::Transaction::write(0x42, vec![0x02, 0x00]),
            mock_i2c::Transaction::write_read(0x42, vec![0x10], vec![0xf0]),
            mock_i2c::Transaction::write(0x42, vec![0x10, 0xf0]),
            // p1 is set low
            mock_i2c::Transaction::write_read(0x42, vec![0x02], vec![0x00]),
            // p9 into input
            mock_i2c::Transaction::write_read(0x42, vec![0x07], vec![0x00]),
            mock_i2c::Transaction::write(0x42, vec![0x07, 0x02]),
            // p9 high and low
            mock_i2c::Transaction::write_read(0x42, vec![0x01], vec![0x02]),
            mock_i2c::Transaction::write_read(0x42, vec![0x01], vec![0xfd]),
            // p4 dimmed
            mock_i2c::Transaction::write_read(0x42, vec![0x02], vec![0x00]),
            mock_i2c::Transaction::write(0x42, vec![0x02, 0x10]),
            mock_i2c::Transaction::write_read(0x42, vec![0x12], vec![0xa0]),
            mock_i2c::Transaction::write(0x42, vec![0x12, 0xa9]),
            // interrupts via control
            mock_i2c::Transaction::write_read(0x42, vec![0x0f], vec![0x01]),
            mock_i2c::Transaction::write(0x42, vec![0x0f, 0x09]),
            mock_i2c::Transaction::write_read(0x42, vec![0x00], vec![0x00]),
            mock_i2c::Transaction::write_read(0x42, vec![0x01], vec![0x00]),
        ];
        let mut bus = mock_i2c::Mock::new(&expectations);

        let mut max = Max7313::new(bus.clone());
        let mut pins = max.split();

        pins.p1.set_high().unwrap();
        pins.p1.set_low().unwrap();
        assert!(pins.p1.is_set_low().unwrap());

        let p9 = pins.p9.into_input().unwrap();
        assert!(p9.is_high().unwrap());
        assert!(p9.is_low().unwrap());

        pins.p4.set_intensity(9).unwrap();

        pins.control.enable_interrupt().unwrap();

        bus.done();
    }

    #[test]
    fn max7313_std_mutex() {
        let expectations = [
            mock_i2c::Transaction::write(0x20, vec![0x06, 0x00]),
            mock_i2c::Transaction::write(0x20, vec![0x07, 0x00]),
            mock_i2c::Transaction::write(0x20, vec![0x02, 0xff]),
            mock_i2c::Transaction::write(0x20, vec![0x03, 0xff]),
            mock_i2c::Transaction::write(0x20, vec![0x0f, 0x01]),
            mock_i2c::Transaction::write(0x20, vec![0x0e, 0xff]),
            // p15 toggled off
            mock_i2c::Transaction::write_read(0x20, vec![0x03], vec![0xff]),
            mock_i2c::Transaction::write_read(0x20, vec![0x03], vec![0xff]),
            mock_i2c::Transaction::write_read(0x20, vec![0x03], vec![0xff]),
            mock_i2c::Transaction::write(0x20, vec![0x03, 0x7f]),
            mock_i2c::Transaction::write_read(0x20, vec![0x17], vec![0xf0]),
            mock_i2c::Transaction::write(0x20, vec![0x17, 0xf0]),
        ];
        let mut bus = mock_i2c::Mock::new(&expectations);

        let mut max: Max7313<std::sync::Mutex<Driver<_>>> =
            Max7313::with_mutex(bus.clone(), 0x20);
        max.begin().unwrap();
        let mut pins = max.split();
        pins.p15.toggle().unwrap();

        bus.done();
    }
}
