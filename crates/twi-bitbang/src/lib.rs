#![no_std]
//! Bit-banged two-wire bus manager over two open-drain signal lines.
//!
//! Implements the [`twi_bus::TwiBus`] contract with no underlying protocol
//! engine: start/stop conditions, repeated starts, byte transfer with
//! acknowledgement, and bounded clock-stretching waits are produced
//! directly through line-level transitions and timed delays. The lines are
//! runtime-injected [`Line`] handles; delays go through an injected
//! `embedded_hal_async::delay::DelayNs`.

mod bitbang;
mod config;
mod line;

pub use bitbang::BitbangTwi;
pub use config::Config;
pub use line::Line;

pub use twi_bus::{Operation, TwiBus, TwiDevice, TwiError};
