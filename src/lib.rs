//! Spanish electricity tariff periods and hourly consumption profiling.
//!
//! The crate answers two questions a Spanish DSO billing pipeline keeps asking:
//!
//! - Which billing period (time-of-use band) applies to a given hour, for a
//!   given tariff, geographic zone and holiday calendar?
//! - Given an hourly consumption curve with holes and a per-period energy
//!   balance, how is the balance spread over the missing hours so that the
//!   totals still match exactly?
//!
//! Everything is pure, synchronous, in-memory computation. Coefficient data
//! (REE hourly profiles) is supplied by the caller through
//! [`profile::Coefficients`]; no network or file access happens here.

pub mod calendar;
pub mod cups;
mod error;
mod prelude;
pub mod profile;
pub mod quantity;
pub mod tariff;

pub use self::error::{Error, Result};
