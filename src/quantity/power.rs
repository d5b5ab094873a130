use std::fmt::{Debug, Display, Formatter};

use crate::quantity::Quantity;

/// Kilowatts. Contracted powers are expressed in this unit.
pub type Kilowatts = Quantity<1, 0>;

impl Kilowatts {
    /// Commercial power ratings are tabulated in whole watts.
    #[must_use]
    pub fn as_watts(self) -> i64 {
        #[allow(clippy::cast_possible_truncation)]
        {
            (self.0.0 * 1000.0).round() as i64
        }
    }
}

impl Display for Kilowatts {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.3} kW", self.0)
    }
}

impl Debug for Kilowatts {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}kW", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_as_watts() {
        assert_eq!(Kilowatts::from(8050.0 / 1000.0).as_watts(), 8050);
        assert_eq!(Kilowatts::from(15.242).as_watts(), 15242);
    }
}
