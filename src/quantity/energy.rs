use std::fmt::{Debug, Display, Formatter};

use crate::quantity::Quantity;

/// Kilowatt-hours.
pub type KilowattHours = Quantity<1, 1>;

impl Display for KilowattHours {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.3} kWh", self.0)
    }
}

impl Debug for KilowattHours {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}kWh", self.0)
    }
}
