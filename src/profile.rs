pub mod coefficients;
pub mod dragger;

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Datelike, NaiveDate, TimeDelta};
use chrono_tz::Tz;
use serde::Serialize;

use crate::{
    calendar::national_holidays,
    prelude::*,
    quantity::energy::KilowattHours,
    tariff::{Magnitude, PeriodCode, Tariff},
};

pub use self::{
    coefficients::{Coefficient, Coefficients},
    dragger::{Decimal, Dragger},
};

/// Per-period energy totals of an invoice.
pub type Balance = BTreeMap<PeriodCode, KilowattHours>;

/// One hour of a consumption curve.
///
/// `accumulated` carries the dragger remainder left after this hour was
/// estimated, so a follow-up invoice can continue the rounding walk where
/// this one stopped.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, derive_more::Constructor)]
pub struct ProfileHour {
    pub at: DateTime<Tz>,
    pub energy: KilowattHours,
    pub valid: bool,
    pub accumulated: f64,
}

/// The key the estimator drags under.
#[derive(Clone, Copy, Debug, Eq, Ord, PartialEq, PartialOrd)]
enum DragKey {
    Hourly,
    Period(PeriodCode),
}

/// An hourly consumption curve over an inclusive `[start, end]` window, with
/// the hours that are missing or invalid tracked as gaps.
#[derive(Debug)]
pub struct Profile {
    start: DateTime<Tz>,
    end: DateTime<Tz>,
    measures: Vec<ProfileHour>,
    gaps: Vec<DateTime<Tz>>,
    adjusted_periods: Vec<PeriodCode>,
    carry: f64,
    drag_by_period: bool,
}

impl Profile {
    /// Build a profile, computing the gaps of the window.
    #[must_use]
    pub fn new(start: DateTime<Tz>, end: DateTime<Tz>, measures: Vec<ProfileHour>) -> Self {
        Self::assemble(start, end, measures, 0.0, false)
    }

    /// Build a profile that continues a previous invoice's rounding state.
    ///
    /// `carry` must lie strictly within (-1, 1); `drag_by_period` selects one
    /// dragger key per period instead of the shared hourly key.
    pub fn with_carry(
        start: DateTime<Tz>,
        end: DateTime<Tz>,
        measures: Vec<ProfileHour>,
        carry: f64,
        drag_by_period: bool,
    ) -> Result<Self> {
        if !carry.is_finite() || carry.abs() >= 1.0 {
            return Err(Error::CarryOutOfRange(carry));
        }
        Ok(Self::assemble(start, end, measures, carry, drag_by_period))
    }

    fn assemble(
        start: DateTime<Tz>,
        end: DateTime<Tz>,
        mut measures: Vec<ProfileHour>,
        carry: f64,
        drag_by_period: bool,
    ) -> Self {
        measures.sort_by_key(|measure| measure.at);
        let covered: BTreeSet<DateTime<Tz>> = measures
            .iter()
            .filter(|measure| measure.valid)
            .map(|measure| measure.at)
            .collect();
        let gaps = Self::hours(start, end).filter(|hour| !covered.contains(hour)).collect();
        Self { start, end, measures, gaps, adjusted_periods: Vec::new(), carry, drag_by_period }
    }

    fn hours(start: DateTime<Tz>, end: DateTime<Tz>) -> impl Iterator<Item = DateTime<Tz>> {
        let count = (end - start).num_hours();
        (0..=count).map(move |offset| start + TimeDelta::hours(offset))
    }

    #[must_use]
    pub const fn start(&self) -> DateTime<Tz> {
        self.start
    }

    #[must_use]
    pub const fn end(&self) -> DateTime<Tz> {
        self.end
    }

    #[must_use]
    pub fn measures(&self) -> &[ProfileHour] {
        &self.measures
    }

    #[must_use]
    pub fn gaps(&self) -> &[DateTime<Tz>] {
        &self.gaps
    }

    /// Periods whose hours were rescaled by the last [`Self::adjust`].
    #[must_use]
    pub fn adjusted_periods(&self) -> &[PeriodCode] {
        &self.adjusted_periods
    }

    /// Hours in the window, end included.
    #[must_use]
    pub fn n_hours(&self) -> i64 {
        (self.end - self.start).num_hours() + 1
    }

    #[must_use]
    pub fn total_consumption(&self) -> KilowattHours {
        self.measures.iter().map(|measure| measure.energy).sum()
    }

    /// The national holiday calendar covering the window.
    fn holiday_set(&self) -> BTreeSet<NaiveDate> {
        let mut holidays = BTreeSet::new();
        for year in self.start.year()..=self.end.year() {
            holidays.extend(national_holidays(year));
        }
        holidays
    }

    fn resolve(
        &self,
        tariff: &Tariff,
        holidays: &BTreeSet<NaiveDate>,
        at: DateTime<Tz>,
    ) -> Result<PeriodCode> {
        tariff.period_at(at, holidays, Magnitude::Energy).map(|period| period.code()).ok_or_else(
            || Error::PeriodNotFound {
                code: tariff.code().to_string(),
                magnitude: Magnitude::Energy,
                at,
            },
        )
    }

    /// Count the hours attributed to each period, over the whole window or
    /// over the valid measures only.
    pub fn hours_per_period(
        &self,
        tariff: &Tariff,
        only_valid: bool,
    ) -> Result<BTreeMap<PeriodCode, u32>> {
        let holidays = self.holiday_set();
        let mut counts = BTreeMap::new();
        if only_valid {
            for measure in self.measures.iter().filter(|measure| measure.valid) {
                *counts.entry(self.resolve(tariff, &holidays, measure.at)?).or_default() += 1;
            }
        } else {
            for hour in Self::hours(self.start, self.end) {
                *counts.entry(self.resolve(tariff, &holidays, hour)?).or_default() += 1;
            }
        }
        Ok(counts)
    }

    /// Sum the valid measures per period. Every energy period of the tariff is
    /// present, zero when nothing was measured in it.
    pub fn consumption_per_period(&self, tariff: &Tariff) -> Result<Balance> {
        let holidays = self.holiday_set();
        let mut totals: Balance =
            tariff.energy_periods().map(|period| (period.code(), KilowattHours::ZERO)).collect();
        for measure in self.measures.iter().filter(|measure| measure.valid) {
            *totals.entry(self.resolve(tariff, &holidays, measure.at)?).or_default() +=
                measure.energy;
        }
        Ok(totals)
    }

    /// Hours per period that still need estimating.
    pub fn estimable_hours(&self, tariff: &Tariff) -> Result<BTreeMap<PeriodCode, u32>> {
        let total = self.hours_per_period(tariff, false)?;
        let valid = self.hours_per_period(tariff, true)?;
        Ok(total
            .into_iter()
            .map(|(code, hours)| {
                (code, hours.saturating_sub(valid.get(&code).copied().unwrap_or_default()))
            })
            .collect())
    }

    /// Energy per period that still needs estimating: the balance minus what
    /// was actually measured.
    pub fn estimable_consumption(&self, tariff: &Tariff, balance: &Balance) -> Result<Balance> {
        let measured = self.consumption_per_period(tariff)?;
        Ok(measured
            .into_iter()
            .map(|(code, energy)| {
                (code, balance.get(&code).copied().unwrap_or_default() - energy)
            })
            .collect())
    }

    /// Fill every gap by spreading the estimable energy over the gap hours in
    /// proportion to the coefficient weights, drag-rounding each share so the
    /// new profile's total matches the balance total exactly.
    #[instrument(skip_all, fields(tariff = tariff.code(), n_gaps = self.gaps.len()))]
    pub fn estimate(
        &self,
        tariff: &Tariff,
        coefficients: &Coefficients,
        balance: &Balance,
    ) -> Result<Self> {
        let holidays = self.holiday_set();
        let balance = adapt_balance(tariff, balance);
        let estimable = self.estimable_consumption(tariff, &balance)?;

        let mut resolved = Vec::with_capacity(self.gaps.len());
        let mut weight_sums: BTreeMap<PeriodCode, f64> = BTreeMap::new();
        for &gap in &self.gaps {
            let code = self.resolve(tariff, &holidays, gap)?;
            let weight = coefficients.at(gap)?.weight(tariff.coefficient_column())?;
            *weight_sums.entry(code).or_default() += weight;
            resolved.push((gap, code, weight));
        }

        let mut measures: Vec<ProfileHour> =
            self.measures.iter().filter(|measure| measure.valid).copied().collect();
        let mut dragger = Dragger::new();
        let mut seeded = false;
        for (gap, code, weight) in resolved {
            let key = if self.drag_by_period { DragKey::Period(code) } else { DragKey::Hourly };
            if !seeded {
                dragger.seed(key, Decimal::from_f64(self.carry));
                seeded = true;
            }
            let energy = estimable.get(&code).copied().unwrap_or_default().max(KilowattHours::ZERO);
            let weight_sum = weight_sums.get(&code).copied().unwrap_or_default();
            // A period whose gaps carry no weight at all estimates to zero
            // rather than dividing by zero.
            let share =
                if weight_sum == 0.0 { 0.0 } else { energy.into_inner() * weight / weight_sum };
            let rounded = dragger.drag(key, share);
            trace!(%gap, %code, rounded, "estimated gap");
            #[allow(clippy::cast_precision_loss)]
            let hour =
                ProfileHour::new(gap, (rounded as f64).into(), true, dragger.remainder(&key).to_f64());
            let position = measures.partition_point(|measure| measure.at < gap);
            measures.insert(position, hour);
        }
        Ok(Self::new(self.start, self.end, measures))
    }

    /// Rescale each period whose measured total misses its balance by more
    /// than `tolerance`. Requires a gap-free profile.
    #[instrument(skip_all, fields(tariff = tariff.code()))]
    pub fn adjust(&self, tariff: &Tariff, balance: &Balance, tolerance: f64) -> Result<Self> {
        if !self.gaps.is_empty() {
            return Err(Error::ProfileHasGaps(self.gaps.len()));
        }
        let holidays = self.holiday_set();
        let current = self.consumption_per_period(tariff)?;
        let mut measures = self.measures.clone();
        let mut adjusted_periods = Vec::new();
        let mut dragger = Dragger::new();
        for (&code, &target) in balance {
            let total = current.get(&code).copied().unwrap_or_default();
            if (total - target).abs() <= KilowattHours::from(tolerance) {
                continue;
            }
            debug!(%code, %total, %target, "adjusting period");
            adjusted_periods.push(code);
            for measure in &mut measures {
                if self.resolve(tariff, &holidays, measure.at)? != code {
                    continue;
                }
                let scaled = if total == KilowattHours::ZERO {
                    0.0
                } else {
                    measure.energy.into_inner() * (target / total).0
                };
                #[allow(clippy::cast_precision_loss)]
                {
                    measure.energy = (dragger.drag(DragKey::Hourly, scaled) as f64).into();
                }
                measure.valid = true;
            }
        }
        let mut profile = Self::new(self.start, self.end, measures);
        profile.adjusted_periods = adjusted_periods;
        Ok(profile)
    }

    /// Estimate, then adjust; tariffs configured for low-voltage-measurement
    /// loss compensation surcharge every hour afterwards, re-rounded under a
    /// fresh dragger.
    pub fn fixit(
        &self,
        tariff: &Tariff,
        coefficients: &Coefficients,
        balance: &Balance,
        tolerance: f64,
    ) -> Result<Self> {
        let estimated = self.estimate(tariff, coefficients, balance)?;
        let mut adjusted = estimated.adjust(tariff, balance, tolerance)?;
        if let Some(losses) = tariff.losses() {
            if losses.kva.is_some() {
                let mut dragger = Dragger::new();
                for measure in &mut adjusted.measures {
                    let surcharged = measure.energy.into_inner() * (1.0 + losses.rate);
                    #[allow(clippy::cast_precision_loss)]
                    {
                        measure.energy = (dragger.drag(DragKey::Hourly, surcharged) as f64).into();
                    }
                }
            }
        }
        Ok(adjusted)
    }
}

/// Rewrite a balance to the shape the tariff can estimate.
///
/// Single-period tariffs take the whole balance in their one period. The 3.1A
/// family has no P4 energy period, yet six-register balances declare one: it
/// is folded into P5, whose holiday band contains the legacy P4 peak window.
/// This is a preserved regulatory patch, not a general rule.
fn adapt_balance(tariff: &Tariff, balance: &Balance) -> Balance {
    let codes: Vec<PeriodCode> = tariff.energy_periods().map(|period| period.code()).collect();
    if let [only] = codes[..] {
        return BTreeMap::from([(only, balance.values().copied().sum())]);
    }
    let mut balance = balance.clone();
    if tariff.code().starts_with("3.1A")
        && !codes.contains(&PeriodCode::P4)
        && codes.contains(&PeriodCode::P5)
    {
        if let Some(orphan) = balance.remove(&PeriodCode::P4) {
            *balance.entry(PeriodCode::P5).or_default() += orphan;
        }
    }
    balance
}
