//! Common types used across the application

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::Error;

/// Connection category a tariff applies to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Residential,
    Commercial,
    Industrial,
    Agricultural,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Residential => "residential",
            Category::Commercial => "commercial",
            Category::Industrial => "industrial",
            Category::Agricultural => "agricultural",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "residential" => Ok(Category::Residential),
            "commercial" => Ok(Category::Commercial),
            "industrial" => Ok(Category::Industrial),
            "agricultural" => Ok(Category::Agricultural),
            other => Err(Error::InvalidTariffInput(format!("Unknown category: {}", other))),
        }
    }
}

/// One consumption tier of a tariff
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Slab {
    /// First unit of the tier
    pub from: u64,
    /// Upper bound (exclusive of the next tier); `None` means unbounded
    #[serde(default)]
    pub to: Option<u64>,
    /// Energy rate for each unit in the tier
    pub rate_per_unit: Decimal,
}

impl Slab {
    pub fn new(from: u64, to: Option<u64>, rate_per_unit: Decimal) -> Self {
        Self { from, to, rate_per_unit }
    }

    /// Number of units the tier can hold, `None` when unbounded
    pub fn capacity(&self) -> Option<u64> {
        self.to.map(|to| to.saturating_sub(self.from))
    }
}

/// Rate and active hours for one time-of-use band
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TouBand {
    pub rate: Decimal,
    /// Comma-separated `HH:MM-HH:MM` windows, e.g. "18:00-22:00"
    #[serde(default)]
    pub hours: String,
}

/// Peak / normal / off-peak rate schedule
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeOfUse {
    pub peak: TouBand,
    pub normal: TouBand,
    pub off_peak: TouBand,
}

/// Time-of-use band a moment of the day falls into
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TouPeriod {
    Peak,
    Normal,
    OffPeak,
}

impl TouPeriod {
    pub fn as_str(&self) -> &'static str {
        match self {
            TouPeriod::Peak => "peak",
            TouPeriod::Normal => "normal",
            TouPeriod::OffPeak => "off_peak",
        }
    }
}

/// A dated pricing configuration for one category
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TariffVersion {
    pub id: i64,
    pub category: Category,
    pub fixed_charge: Decimal,
    pub slabs: Vec<Slab>,
    #[serde(default)]
    pub time_of_use: Option<TimeOfUse>,
    pub electricity_duty_percent: Decimal,
    pub gst_percent: Decimal,
    pub effective_date: NaiveDate,
    /// `None` while this is the category's active version
    #[serde(default)]
    pub valid_until: Option<NaiveDate>,
}

impl TariffVersion {
    pub fn from_draft(id: i64, draft: &TariffDraft) -> Self {
        Self {
            id,
            category: draft.category,
            fixed_charge: draft.fixed_charge,
            slabs: draft.slabs.clone(),
            time_of_use: draft.time_of_use.clone(),
            electricity_duty_percent: draft.electricity_duty_percent,
            gst_percent: draft.gst_percent,
            effective_date: draft.effective_date,
            valid_until: None,
        }
    }

    pub fn is_active(&self) -> bool {
        self.valid_until.is_none()
    }

    /// Whether `date` falls inside `[effective_date, valid_until)`
    pub fn covers(&self, date: NaiveDate) -> bool {
        date >= self.effective_date && self.valid_until.map_or(true, |until| date < until)
    }
}

/// Administrator input for a new tariff version
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TariffDraft {
    pub category: Category,
    pub fixed_charge: Decimal,
    pub slabs: Vec<Slab>,
    #[serde(default)]
    pub time_of_use: Option<TimeOfUse>,
    pub electricity_duty_percent: Decimal,
    pub gst_percent: Decimal,
    pub effective_date: NaiveDate,
}

/// Charge for the units that fell into one slab or band
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlabCharge {
    pub units: u64,
    pub rate: Decimal,
    pub amount: Decimal,
}

/// Calculator output, frozen into a bill when it is issued
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BillCharge {
    pub units_consumed: u64,
    pub tariff_slab_breakdown: Vec<SlabCharge>,
    pub base_amount: Decimal,
    pub fixed_charges: Decimal,
    pub electricity_duty: Decimal,
    pub gst_amount: Decimal,
    pub total_amount: Decimal,
}

/// An issued bill as stored
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bill {
    pub id: i64,
    pub account_number: String,
    pub category: Category,
    pub tariff_version_id: i64,
    pub billing_date: NaiveDate,
    pub charge: BillCharge,
    /// Unix timestamp of issue
    pub created_at: i64,
}

/// A bill about to be stored
#[derive(Debug, Clone)]
pub struct NewBill {
    pub account_number: String,
    pub category: Category,
    pub tariff_version_id: i64,
    pub billing_date: NaiveDate,
    pub charge: BillCharge,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn test_category_parse() {
        assert_eq!("Residential".parse::<Category>().unwrap(), Category::Residential);
        assert_eq!(" industrial ".parse::<Category>().unwrap(), Category::Industrial);
        assert!("domestic".parse::<Category>().is_err());
    }

    #[test]
    fn test_slab_capacity() {
        assert_eq!(Slab::new(100, Some(300), Decimal::ONE).capacity(), Some(200));
        assert_eq!(Slab::new(300, None, Decimal::ONE).capacity(), None);
    }

    #[test]
    fn test_version_window() {
        let version = TariffVersion {
            id: 1,
            category: Category::Commercial,
            fixed_charge: Decimal::ZERO,
            slabs: vec![],
            time_of_use: None,
            electricity_duty_percent: Decimal::ZERO,
            gst_percent: Decimal::ZERO,
            effective_date: date("2024-01-01"),
            valid_until: Some(date("2024-07-01")),
        };

        assert!(!version.covers(date("2023-12-31")));
        assert!(version.covers(date("2024-01-01")));
        assert!(version.covers(date("2024-06-30")));
        assert!(!version.covers(date("2024-07-01")));
        assert!(!version.is_active());
    }
}
