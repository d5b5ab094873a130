use chrono::DateTime;
use chrono_tz::Tz;

use crate::{
    calendar::Season,
    tariff::{Magnitude, period::HourRange, power::PowerError},
};

/// Everything that can go wrong inside the crate.
///
/// Configuration errors surface at tariff construction, data availability
/// errors at coefficient queries, invariant violations before any profiling
/// computation starts. Nothing is retried internally.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("invalid {label} hours: {ranges:?}")]
    InvalidHourRanges { label: String, ranges: Vec<HourRange> },

    #[error("the sum of {season} hours (holiday periods: {holiday}) must be 24, got {total}")]
    IncompleteDayCoverage { season: Season, holiday: bool, total: u32 },

    #[error("start date not found in coefficients")]
    CoefficientsStartNotFound,

    #[error("coefficient column `{column}` is missing at {at}")]
    MissingCoefficientColumn { column: String, at: DateTime<Tz> },

    #[error("no {magnitude} period covers {at} for tariff {code}")]
    PeriodNotFound { code: String, magnitude: Magnitude, at: DateTime<Tz> },

    #[error("cannot adjust a profile with gaps ({0} hours missing)")]
    ProfileHasGaps(usize),

    #[error("accumulated carry {0} must lie strictly between -1 and 1")]
    CarryOutOfRange(f64),

    #[error("power correction is not implemented for tariff {0}")]
    CorrectionUnsupported(String),

    #[error(transparent)]
    Power(#[from] PowerError),
}

pub type Result<T = (), E = Error> = std::result::Result<T, E>;
