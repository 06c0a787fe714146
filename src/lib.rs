//! Driver for the MAX7313 "16-Port I/O Expander with LED Intensity Control".
//!
//! The chip exposes 16 ports which can each be an input or an output.  Outputs are driven
//! through a 4-bit PWM intensity, two ports sharing one intensity register.  Since the intensity
//! register cannot reach a 0% duty cycle on its own, this driver uses the blink phase 0 register
//! to invert a port's on-state whenever it is switched fully off.
//!
//! The driver holds no cached register state; every operation talks to the chip.
//!
//! ```no_run
//! # let i2c = embedded_hal_mock::eh1::i2c::Mock::new(&[]);
//! let mut max = max7313::Max7313::new(i2c);
//! max.begin().unwrap();
//! let mut pins = max.split();
//!
//! pins.p0.set_high().unwrap();
//! pins.p1.set_intensity(7).unwrap();
//! let button = pins.p15.into_input().unwrap();
//! if button.is_high().unwrap() {
//!     pins.p0.set_low().unwrap();
//! }
//! ```
#![cfg_attr(not(any(test, feature = "std")), no_std)]

mod fmt;

mod bus;
mod common;
pub mod dev;
mod error;
mod mutex;
mod pin;

pub use bus::I2cBus;
pub use common::mode;
pub use common::Direction;
pub use common::{PortDriver, PortDriverPwm, PortDriverTotemPole};
pub use error::Error;
pub use mutex::PortMutex;
pub use pin::Pin;

pub(crate) use bus::I2cExt;

pub use dev::max7313::{Control, Driver, Max7313, Parts};
pub use dev::max7313::{DEFAULT_ADDRESS, MAX_INTENSITY};
#[cfg(feature = "async")]
pub use dev::max7313_async::Max7313Async;
