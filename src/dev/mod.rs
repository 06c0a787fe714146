//! The device module contains the register level internals of the MAX7313 driver.
//!
//! In most cases you will not need anything from here explicitly, the exposed types at the root of
//! the crate should be enough.

pub mod max7313;
#[cfg(feature = "async")]
pub mod max7313_async;
