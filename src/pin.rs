use core::marker::PhantomData;
use embedded_hal::digital as hal_digital;
use embedded_hal::pwm as hal_pwm;

/// Representation of a MAX7313 port.
///
/// `Pin` is not constructed directly, this type is created by instanciating a [`Max7313`] and
/// then getting access to all its pins using the `.split()` method.
///
/// Every method locks the port driver for the complete register sequence it needs.
///
/// [`Max7313`]: crate::Max7313
pub struct Pin<'a, MODE, MUTEX> {
    pin_mask: u32,
    port_driver: &'a MUTEX,
    _m: PhantomData<MODE>,
}

impl<'a, MODE, MUTEX, PD> Pin<'a, MODE, MUTEX>
where
    PD: crate::PortDriver,
    MUTEX: crate::PortMutex<Port = PD>,
{
    pub(crate) fn new(pin_number: u8, port_driver: &'a MUTEX) -> Self {
        assert!(pin_number < 16);
        Self {
            pin_mask: 1 << pin_number,
            port_driver,
            _m: PhantomData,
        }
    }

    pub fn pin_mask(&self) -> u32 {
        self.pin_mask
    }

    /// Number of this pin on the chip.
    pub fn pin_number(&self) -> u8 {
        self.pin_mask.trailing_zeros() as u8
    }
}

impl<'a, MODE, MUTEX, PD> Pin<'a, MODE, MUTEX>
where
    PD: crate::PortDriver + crate::PortDriverTotemPole,
    MUTEX: crate::PortMutex<Port = PD>,
{
    /// Configure this pin as an input.
    pub fn into_input(self) -> Result<Pin<'a, crate::mode::Input, MUTEX>, PD::Error> {
        self.port_driver
            .lock(|drv| drv.set_direction(self.pin_mask, crate::Direction::Input, false))?;
        Ok(Pin {
            pin_mask: self.pin_mask,
            port_driver: self.port_driver,
            _m: PhantomData,
        })
    }

    /// Configure this pin as an output with an initial LOW (fully off) state.
    pub fn into_output(self) -> Result<Pin<'a, crate::mode::Output, MUTEX>, PD::Error> {
        self.port_driver
            .lock(|drv| drv.set_direction(self.pin_mask, crate::Direction::Output, false))?;
        Ok(Pin {
            pin_mask: self.pin_mask,
            port_driver: self.port_driver,
            _m: PhantomData,
        })
    }

    /// Configure this pin as an output with an initial HIGH (full intensity) state.
    pub fn into_output_high(self) -> Result<Pin<'a, crate::mode::Output, MUTEX>, PD::Error> {
        self.port_driver
            .lock(|drv| drv.set_direction(self.pin_mask, crate::Direction::Output, true))?;
        Ok(Pin {
            pin_mask: self.pin_mask,
            port_driver: self.port_driver,
            _m: PhantomData,
        })
    }
}

impl<'a, MODE: crate::mode::HasInput, MUTEX, PD> Pin<'a, MODE, MUTEX>
where
    PD: crate::PortDriver,
    MUTEX: crate::PortMutex<Port = PD>,
{
    pub fn is_high(&self) -> Result<bool, PD::Error> {
        Ok(self.port_driver.lock(|drv| drv.get(self.pin_mask, 0))? == self.pin_mask)
    }

    pub fn is_low(&self) -> Result<bool, PD::Error> {
        Ok(self.port_driver.lock(|drv| drv.get(0, self.pin_mask))? == self.pin_mask)
    }
}

impl<'a, MODE, MUTEX, PD> hal_digital::ErrorType for Pin<'a, MODE, MUTEX>
where
    PD: crate::PortDriver,
    PD::Error: hal_digital::Error,
    MUTEX: crate::PortMutex<Port = PD>,
{
    type Error = PD::Error;
}

impl<'a, MODE: crate::mode::HasInput, MUTEX, PD> hal_digital::InputPin for Pin<'a, MODE, MUTEX>
where
    PD: crate::PortDriver,
    PD::Error: hal_digital::Error,
    MUTEX: crate::PortMutex<Port = PD>,
{
    fn is_high(&mut self) -> Result<bool, PD::Error> {
        Pin::is_high(self)
    }

    fn is_low(&mut self) -> Result<bool, PD::Error> {
        Pin::is_low(self)
    }
}

impl<'a, MODE: crate::mode::HasOutput, MUTEX, PD> Pin<'a, MODE, MUTEX>
where
    PD: crate::PortDriver,
    MUTEX: crate::PortMutex<Port = PD>,
{
    /// Drive the pin at full intensity.
    pub fn set_high(&mut self) -> Result<(), PD::Error> {
        self.port_driver.lock(|drv| drv.set(self.pin_mask, 0))
    }

    /// Switch the pin fully off.
    pub fn set_low(&mut self) -> Result<(), PD::Error> {
        self.port_driver.lock(|drv| drv.set(0, self.pin_mask))
    }

    /// Whether the pin is driven at all.  A dimmed pin counts as HIGH.
    pub fn is_set_high(&self) -> Result<bool, PD::Error> {
        Ok(self.port_driver.lock(|drv| drv.is_set(self.pin_mask, 0))? == self.pin_mask)
    }

    pub fn is_set_low(&self) -> Result<bool, PD::Error> {
        Ok(self.port_driver.lock(|drv| drv.is_set(0, self.pin_mask))? == self.pin_mask)
    }

    pub fn toggle(&mut self) -> Result<(), PD::Error> {
        self.port_driver.lock(|drv| drv.toggle(self.pin_mask))
    }
}

impl<'a, MODE: crate::mode::HasOutput, MUTEX, PD> Pin<'a, MODE, MUTEX>
where
    PD: crate::PortDriverPwm,
    MUTEX: crate::PortMutex<Port = PD>,
{
    /// Drive the pin with a PWM `intensity`, where 0 is off and larger values saturate at the
    /// driver's maximum (15 for the MAX7313).
    pub fn set_intensity(&mut self, intensity: u8) -> Result<(), PD::Error> {
        self.port_driver
            .lock(|drv| drv.set_intensity(self.pin_mask, intensity))
    }
}

impl<'a, MODE: crate::mode::HasOutput, MUTEX, PD> hal_digital::OutputPin for Pin<'a, MODE, MUTEX>
where
    PD: crate::PortDriver,
    PD::Error: hal_digital::Error,
    MUTEX: crate::PortMutex<Port = PD>,
{
    fn set_low(&mut self) -> Result<(), PD::Error> {
        Pin::set_low(self)
    }

    fn set_high(&mut self) -> Result<(), PD::Error> {
        Pin::set_high(self)
    }
}

impl<'a, MODE: crate::mode::HasOutput, MUTEX, PD> hal_digital::StatefulOutputPin
    for Pin<'a, MODE, MUTEX>
where
    PD: crate::PortDriver,
    PD::Error: hal_digital::Error,
    MUTEX: crate::PortMutex<Port = PD>,
{
    fn is_set_high(&mut self) -> Result<bool, PD::Error> {
        Pin::is_set_high(self)
    }

    fn is_set_low(&mut self) -> Result<bool, PD::Error> {
        Pin::is_set_low(self)
    }

    fn toggle(&mut self) -> Result<(), PD::Error> {
        Pin::toggle(self)
    }
}

impl<'a, MODE: crate::mode::HasOutput, MUTEX, PD> hal_pwm::ErrorType for Pin<'a, MODE, MUTEX>
where
    PD: crate::PortDriverPwm,
    PD::Error: hal_pwm::Error,
    MUTEX: crate::PortMutex<Port = PD>,
{
    type Error = PD::Error;
}

impl<'a, MODE: crate::mode::HasOutput, MUTEX, PD> hal_pwm::SetDutyCycle for Pin<'a, MODE, MUTEX>
where
    PD: crate::PortDriverPwm,
    PD::Error: hal_pwm::Error,
    MUTEX: crate::PortMutex<Port = PD>,
{
    fn max_duty_cycle(&self) -> u16 {
        u16::from(PD::MAX_INTENSITY)
    }

    fn set_duty_cycle(&mut self, duty: u16) -> Result<(), PD::Error> {
        let intensity = duty.min(u16::from(PD::MAX_INTENSITY)) as u8;
        self.set_intensity(intensity)
    }
}
