//! Register map of the MAX7313 and the mapping from a port number to its registers and bits.
//!
//! Everything in here is pure: no bus access happens, so the sync and async drivers share it.
//!
//! Datasheet: https://www.analog.com/media/en/technical-documentation/data-sheets/MAX7313.pdf
use crate::Error;

/// Number of ports on the chip.
pub const PIN_COUNT: u8 = 16;

/// Highest value of a 4-bit intensity nibble.
pub const MAX_INTENSITY: u8 = 0x0f;

/// Interrupt enable bit in the configuration register.
pub const CONFIG_INTERRUPT_ENABLE: u8 = 1 << 3;
/// Blink enable bit in the configuration register.
pub const CONFIG_BLINK_ENABLE: u8 = 1 << 0;

/// Datasheet table 2, "Register Address Map".
#[allow(dead_code)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum Regs {
    Input0 = 0x00,
    Input1 = 0x01,
    BlinkPhase0Port0 = 0x02,
    BlinkPhase0Port1 = 0x03,
    PortsConfig0 = 0x06,
    PortsConfig1 = 0x07,
    BlinkPhase1Port0 = 0x0a,
    BlinkPhase1Port1 = 0x0b,
    /// Master intensity in the high nibble, O16 intensity in the low nibble.
    MasterIntensity = 0x0e,
    Configuration = 0x0f,
    Intensity01 = 0x10,
    Intensity23 = 0x11,
    Intensity45 = 0x12,
    Intensity67 = 0x13,
    Intensity89 = 0x14,
    Intensity1011 = 0x15,
    Intensity1213 = 0x16,
    Intensity1415 = 0x17,
}

impl From<Regs> for u8 {
    fn from(r: Regs) -> u8 {
        r as u8
    }
}

/// Intensity registers indexed by `pin / 2`.
///
/// The last slot is the master intensity register.  No valid pin maps to it.
pub const INTENSITY_REGS: [Regs; 9] = [
    Regs::Intensity01,
    Regs::Intensity23,
    Regs::Intensity45,
    Regs::Intensity67,
    Regs::Intensity89,
    Regs::Intensity1011,
    Regs::Intensity1213,
    Regs::Intensity1415,
    Regs::MasterIntensity,
];

/// One of the two 8-port halves which share configuration, input and phase registers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Group {
    /// Ports 0 to 7
    Low,
    /// Ports 8 to 15
    High,
}

impl Group {
    pub fn of(pin: u8) -> Self {
        if pin < 8 {
            Group::Low
        } else {
            Group::High
        }
    }
}

/// Blink phase selector.
#[allow(dead_code)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Zero,
    One,
}

/// Reject pin numbers the chip does not have.
pub fn check_pin<E>(pin: u8) -> Result<u8, Error<E>> {
    if pin < PIN_COUNT {
        Ok(pin)
    } else {
        Err(Error::InvalidPin(pin))
    }
}

/// Reject masks which contain bits for pins the chip does not have.
pub fn check_mask<E>(mask: u32) -> Result<u16, Error<E>> {
    if mask >> PIN_COUNT == 0 {
        Ok(mask as u16)
    } else {
        Err(Error::InvalidPin(31 - mask.leading_zeros() as u8))
    }
}

/// Iterate over the pin numbers set in `mask`.
pub fn pins_in(mask: u16) -> impl Iterator<Item = u8> {
    (0..PIN_COUNT).filter(move |pin| mask & (1 << pin) != 0)
}

/// Bit of `pin` inside its group's registers.
pub fn bit(pin: u8) -> u8 {
    1 << (pin % 8)
}

pub fn input_reg(pin: u8) -> Regs {
    match Group::of(pin) {
        Group::Low => Regs::Input0,
        Group::High => Regs::Input1,
    }
}

pub fn config_reg(pin: u8) -> Regs {
    match Group::of(pin) {
        Group::Low => Regs::PortsConfig0,
        Group::High => Regs::PortsConfig1,
    }
}

pub fn phase_reg(pin: u8, phase: Phase) -> Regs {
    match (Group::of(pin), phase) {
        (Group::Low, Phase::Zero) => Regs::BlinkPhase0Port0,
        (Group::High, Phase::Zero) => Regs::BlinkPhase0Port1,
        (Group::Low, Phase::One) => Regs::BlinkPhase1Port0,
        (Group::High, Phase::One) => Regs::BlinkPhase1Port1,
    }
}

pub fn intensity_reg(pin: u8) -> Regs {
    INTENSITY_REGS[usize::from(pin / 2)]
}

/// Saturate an intensity to the 4 bits the chip stores.
pub fn clamp_intensity(intensity: u8) -> u8 {
    intensity.min(MAX_INTENSITY)
}

/// Compute the new blink phase 0 register value for driving `pin` with `intensity`.
///
/// The intensity registers cannot produce a 0% duty cycle (datasheet table 12).  For full-off,
/// the pin's phase 0 bit is cleared which inverts its on-state, and the pin is driven with full
/// intensity instead.  Returns the new register value and the intensity which must then be
/// written to the pin's nibble.
pub fn phase_correction(current: u8, pin: u8, intensity: u8) -> (u8, u8) {
    let intensity = clamp_intensity(intensity);
    if intensity == 0 {
        (current & !bit(pin), MAX_INTENSITY)
    } else {
        (current | bit(pin), intensity)
    }
}

/// Replace the nibble of `pin` in a shared intensity register value.
///
/// ```text
/// D7 D6 D5 D4 | D3 D2 D1 D0
/// odd pin     | even pin
/// ```
pub fn pack_intensity(current: u8, pin: u8, intensity: u8) -> u8 {
    let intensity = clamp_intensity(intensity);
    if pin % 2 == 1 {
        (current & 0x0f) | (intensity << 4)
    } else {
        (current & 0xf0) | intensity
    }
}

/// Extract the nibble of `pin` from a shared intensity register value.
pub fn unpack_intensity(value: u8, pin: u8) -> u8 {
    if pin % 2 == 1 {
        value >> 4
    } else {
        value & 0x0f
    }
}
