#![allow(unused_imports)]

pub use tracing::{debug, instrument, trace, warn};

pub use crate::error::{Error, Result};
