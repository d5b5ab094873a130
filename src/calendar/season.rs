use chrono::{DateTime, NaiveDateTime, TimeDelta};
use chrono_tz::{OffsetComponents, Tz};
use serde::{Deserialize, Serialize};

use crate::calendar::localize;

/// Electrical season: the tariff tables only distinguish daylight-saving
/// («summer») hours from standard-time («winter») hours.
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize, derive_more::Display)]
#[serde(rename_all = "lowercase")]
pub enum Season {
    #[display("winter")]
    Winter,

    #[display("summer")]
    Summer,
}

impl Season {
    #[must_use]
    pub fn at(at: DateTime<Tz>) -> Self {
        if at.offset().dst_offset() > TimeDelta::zero() { Self::Summer } else { Self::Winter }
    }

    /// Classify a naive local timestamp, resolving it in the reference timezone first.
    #[must_use]
    pub fn on_local(naive: NaiveDateTime) -> Self {
        Self::at(localize(naive))
    }
}
