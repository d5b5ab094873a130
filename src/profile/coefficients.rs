//! The hourly weighting coefficient store.
//!
//! Coefficients arrive from external sources (the system operator's monthly
//! profile files, static special-regime tables) already parsed into
//! `(hour, column -> weight)` records; this store only keeps them ordered and
//! answers range and aggregation queries. Queries outside the loaded window
//! fail instead of guessing.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, NaiveDate, NaiveTime, TimeDelta};
use chrono_tz::Tz;
use serde::Serialize;

use crate::{
    calendar::localize,
    prelude::*,
    tariff::{Magnitude, PeriodCode, Tariff},
};

/// One hour's weighting record.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Coefficient {
    pub hour: DateTime<Tz>,
    pub weights: BTreeMap<String, f64>,
}

impl Coefficient {
    #[must_use]
    pub fn new(hour: DateTime<Tz>, weights: BTreeMap<String, f64>) -> Self {
        Self { hour, weights }
    }

    /// The weight of one column, failing when the column is absent.
    pub fn weight(&self, column: &str) -> Result<f64> {
        self.weights.get(column).copied().ok_or_else(|| Error::MissingCoefficientColumn {
            column: column.to_string(),
            at: self.hour,
        })
    }
}

/// Chronologically ordered coefficient records.
#[derive(Debug, Default)]
pub struct Coefficients {
    records: Vec<Coefficient>,
}

impl Coefficients {
    #[must_use]
    pub fn new(mut records: Vec<Coefficient>) -> Self {
        records.sort_by_key(|record| record.hour);
        Self { records }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    #[must_use]
    pub fn records(&self) -> &[Coefficient] {
        &self.records
    }

    /// Insert a chronologically ordered batch, replacing any resident records
    /// whose hour falls within the batch's own window.
    #[instrument(skip_all, fields(n_records = batch.len()))]
    pub fn insert(&mut self, batch: Vec<Coefficient>) {
        let (Some(first), Some(last)) = (batch.first(), batch.last()) else {
            return;
        };
        let start = self.records.partition_point(|record| record.hour < first.hour);
        let end = self.records.partition_point(|record| record.hour <= last.hour);
        debug!(replaced = end - start, "inserting coefficients");
        self.records.splice(start..end, batch);
    }

    /// The first record at or after the timestamp.
    pub fn at(&self, hour: DateTime<Tz>) -> Result<&Coefficient> {
        let position = self.records.partition_point(|record| record.hour < hour);
        self.records.get(position).ok_or(Error::CoefficientsStartNotFound)
    }

    /// Records of the inclusive civil-day window.
    ///
    /// A metered day runs from 01:00 local up to and including 00:00 of the
    /// next day, so the slice starts at `start` 01:00 and ends one second
    /// after `end + 1 day` 00:00.
    pub fn range(&self, start: NaiveDate, end: NaiveDate) -> Result<&[Coefficient]> {
        let start = localize(start.and_time(NaiveTime::MIN) + TimeDelta::hours(1));
        let end = localize((end + TimeDelta::days(1)).and_time(NaiveTime::MIN))
            + TimeDelta::seconds(1);
        let from = self.records.partition_point(|record| record.hour < start);
        if from == self.records.len() {
            return Err(Error::CoefficientsStartNotFound);
        }
        let to = self.records.partition_point(|record| record.hour <= end);
        Ok(&self.records[from..to])
    }

    /// Sum the tariff's coefficient column per resolved energy period over the
    /// window. Single-period tariffs take the whole sum without resolving
    /// every hour.
    pub fn weight_sums(
        &self,
        tariff: &Tariff,
        start: NaiveDate,
        end: NaiveDate,
        holidays: &BTreeSet<NaiveDate>,
    ) -> Result<BTreeMap<PeriodCode, f64>> {
        let mut sums: BTreeMap<PeriodCode, f64> =
            tariff.energy_periods().map(|period| (period.code(), 0.0)).collect();
        let single = (sums.len() == 1).then(|| sums.keys().next().copied()).flatten();
        for record in self.range(start, end)? {
            let code = match single {
                Some(code) => code,
                None => tariff
                    .period_at(record.hour, holidays, Magnitude::Energy)
                    .ok_or_else(|| Error::PeriodNotFound {
                        code: tariff.code().to_string(),
                        magnitude: Magnitude::Energy,
                        at: record.hour,
                    })?
                    .code(),
            };
            *sums.entry(code).or_default() += record.weight(tariff.coefficient_column())?;
        }
        Ok(sums)
    }
}
