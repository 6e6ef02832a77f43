#![no_std]
#![allow(async_fn_in_trait)]
//! Abstract two-wire bus manager and device contract.
//!
//! A bus manager owns one physical two-wire bus and hands out exclusive
//! transaction windows: a device driver acquires the bus, performs one or
//! more read/write steps (possibly a write phase followed by a read phase
//! with no intervening release), then releases it. Implementations translate
//! the calls into line-level signaling; this crate only fixes the contract
//! they share.

mod bus;
mod device;
mod error;

pub use bus::{Operation, TwiBus};
pub use device::TwiDevice;
pub use error::TwiError;
