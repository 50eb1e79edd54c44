//! Time-of-use pricing
//!
//! Each band of a `TimeOfUse` schedule lists its hours as `HH:MM-HH:MM`
//! windows. Peak windows win over off-peak ones; anything not covered by
//! either is billed at the normal rate.

use super::round_amount;
use crate::core::{Error, Result, RoundingRule, SlabCharge, TimeOfUse, TouBand, TouPeriod};
use chrono::{NaiveTime, Timelike};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

const MINUTES_PER_DAY: u32 = 24 * 60;

/// Half-open window of the day, in minutes since midnight
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct TimeWindow {
    start: u32,
    end: u32,
}

impl TimeWindow {
    fn contains(&self, minute: u32) -> bool {
        if self.start > self.end {
            // Overnight period
            minute >= self.start || minute < self.end
        } else {
            minute >= self.start && minute < self.end
        }
    }
}

fn parse_clock(raw: &str) -> Result<u32> {
    let invalid = || Error::TariffConfiguration(format!("Invalid time of day: {:?}", raw));

    let (hours, minutes) = raw.trim().split_once(':').ok_or_else(invalid)?;
    let hours: u32 = hours.parse().map_err(|_| invalid())?;
    let minutes: u32 = minutes.parse().map_err(|_| invalid())?;

    if hours > 24 || minutes >= 60 {
        return Err(invalid());
    }
    let minute = hours * 60 + minutes;
    if minute > MINUTES_PER_DAY {
        return Err(invalid());
    }
    Ok(minute)
}

fn parse_windows(hours: &str) -> Result<Vec<TimeWindow>> {
    hours
        .split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(|part| {
            let (start, end) = part.split_once('-').ok_or_else(|| {
                Error::TariffConfiguration(format!("Time window must look like HH:MM-HH:MM, got {:?}", part))
            })?;
            let start = parse_clock(start)?;
            if start == MINUTES_PER_DAY {
                return Err(Error::TariffConfiguration(format!(
                    "Time window {:?} cannot start at 24:00",
                    part
                )));
            }
            // "24:00" stays 1440 so "00:00-24:00" covers the whole day
            let end = parse_clock(end)?;
            if start == end {
                return Err(Error::TariffConfiguration(format!("Time window {:?} is empty", part)));
            }
            Ok(TimeWindow { start, end })
        })
        .collect()
}

/// Parsed peak and off-peak windows
struct Schedule {
    peak: Vec<TimeWindow>,
    off_peak: Vec<TimeWindow>,
}

impl Schedule {
    fn parse(tou: &TimeOfUse) -> Result<Self> {
        Ok(Self {
            peak: parse_windows(&tou.peak.hours)?,
            off_peak: parse_windows(&tou.off_peak.hours)?,
        })
    }

    fn period_at(&self, time: NaiveTime) -> TouPeriod {
        let minute = time.hour() * 60 + time.minute();

        if self.peak.iter().any(|w| w.contains(minute)) {
            TouPeriod::Peak
        } else if self.off_peak.iter().any(|w| w.contains(minute)) {
            TouPeriod::OffPeak
        } else {
            TouPeriod::Normal
        }
    }
}

impl TimeOfUse {
    pub fn band(&self, period: TouPeriod) -> &TouBand {
        match period {
            TouPeriod::Peak => &self.peak,
            TouPeriod::Normal => &self.normal,
            TouPeriod::OffPeak => &self.off_peak,
        }
    }

    /// Classify a time of day into its band
    pub fn period_at(&self, time: NaiveTime) -> Result<TouPeriod> {
        Ok(Schedule::parse(self)?.period_at(time))
    }

    /// Rates must be positive and every window must parse
    pub fn validate(&self) -> Result<()> {
        for period in [TouPeriod::Peak, TouPeriod::Normal, TouPeriod::OffPeak] {
            let band = self.band(period);
            if band.rate <= Decimal::ZERO {
                return Err(Error::InvalidTariffInput(format!(
                    "The {} rate must be a positive number, got {}",
                    period.as_str(),
                    band.rate
                )));
            }
            parse_windows(&band.hours)?;
        }
        Ok(())
    }
}

/// Consumption recorded during one metering interval
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntervalReading {
    /// Start of the interval
    pub time: NaiveTime,
    pub units: u64,
}

/// Units consumed in each time-of-use band
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TouUsage {
    pub peak_units: u64,
    pub normal_units: u64,
    pub off_peak_units: u64,
}

impl TouUsage {
    pub fn new(peak_units: u64, normal_units: u64, off_peak_units: u64) -> Self {
        Self { peak_units, normal_units, off_peak_units }
    }

    /// Bucket interval readings by the band their start time falls into
    pub fn from_readings(readings: &[IntervalReading], tou: &TimeOfUse) -> Result<Self> {
        let schedule = Schedule::parse(tou)?;
        let mut usage = Self::default();

        for reading in readings {
            let bucket = match schedule.period_at(reading.time) {
                TouPeriod::Peak => &mut usage.peak_units,
                TouPeriod::Normal => &mut usage.normal_units,
                TouPeriod::OffPeak => &mut usage.off_peak_units,
            };
            *bucket = bucket.checked_add(reading.units).ok_or_else(|| {
                Error::InvalidTariffInput("Interval readings overflow the usage total".to_string())
            })?;
        }

        Ok(usage)
    }

    pub fn units_for(&self, period: TouPeriod) -> u64 {
        match period {
            TouPeriod::Peak => self.peak_units,
            TouPeriod::Normal => self.normal_units,
            TouPeriod::OffPeak => self.off_peak_units,
        }
    }

    pub fn total_units(&self) -> Result<u64> {
        self.peak_units
            .checked_add(self.normal_units)
            .and_then(|sum| sum.checked_add(self.off_peak_units))
            .ok_or_else(|| Error::InvalidTariffInput("Time-of-use units overflow".to_string()))
    }
}

/// One breakdown entry per band that has consumption, peak first
pub(crate) fn price_usage(usage: &TouUsage, tou: &TimeOfUse, rounding: RoundingRule) -> Result<Vec<SlabCharge>> {
    let mut breakdown = Vec::new();

    for period in [TouPeriod::Peak, TouPeriod::Normal, TouPeriod::OffPeak] {
        let units = usage.units_for(period);
        if units == 0 {
            continue;
        }

        let rate = tou.band(period).rate;
        let amount = Decimal::from(units).checked_mul(rate).ok_or_else(|| {
            Error::InvalidTariffInput(format!("{} {} units overflow the charge amount", units, period.as_str()))
        })?;

        breakdown.push(SlabCharge {
            units,
            rate,
            amount: round_amount(amount, rounding),
        });
    }

    Ok(breakdown)
}
