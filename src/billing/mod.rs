//! Bill generation
//!
//! Glues tariff resolution, the pricing engine and persistence together.
//! Bills are priced against the tariff in force on their billing date and
//! stored with the full breakdown, so later tariff edits never change them.

use crate::core::{Bill, BillCharge, Category, Config, Error, NewBill, Result, TariffDraft, TariffVersion};
use crate::db::Database;
use crate::pricing::{self, PricingEngine, TouUsage};
use crate::tariffs::TariffCache;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// How consumption for a bill is known
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum Consumption {
    /// Units already worked out by the caller
    Units { units: i64 },
    /// Two cumulative meter readings
    MeterReadings { previous: i64, current: i64 },
    /// Units split by time-of-use band
    TimeOfUse { usage: TouUsage },
}

impl Consumption {
    /// Units consumed, for the slab-priced variants
    pub fn units(&self) -> Result<i64> {
        match *self {
            Consumption::Units { units } => Ok(units),
            Consumption::MeterReadings { previous, current } => units_between_readings(previous, current),
            Consumption::TimeOfUse { usage } => {
                let total = usage.total_units()?;
                i64::try_from(total)
                    .map_err(|_| Error::InvalidTariffInput(format!("{} units is out of range", total)))
            }
        }
    }
}

/// Units consumed between two meter readings
pub fn units_between_readings(previous: i64, current: i64) -> Result<i64> {
    if previous < 0 || current < 0 {
        return Err(Error::InvalidTariffInput(
            "Meter readings must be valid non-negative numbers".to_string(),
        ));
    }
    if current < previous {
        return Err(Error::InvalidTariffInput(format!(
            "Current reading {} is below the previous reading {}",
            current, previous
        )));
    }
    Ok(current - previous)
}

/// Parse an amount typed into an admin form.
///
/// `field` names the input in the error, e.g. "Fixed charge must be a
/// valid non-negative number".
pub fn parse_amount(field: &str, raw: &str) -> Result<Decimal> {
    let invalid = || Error::InvalidTariffInput(format!("{} must be a valid non-negative number", field));

    let value = Decimal::from_str(raw.trim()).map_err(|_| invalid())?;
    if value < Decimal::ZERO {
        return Err(invalid());
    }
    Ok(value)
}

/// A request to issue a bill
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BillRequest {
    pub account_number: String,
    pub category: Category,
    pub billing_date: NaiveDate,
    pub consumption: Consumption,
}

/// Billing service owning the database, tariff cache and pricing engine
pub struct BillingService {
    db: Database,
    cache: TariffCache,
    pricing: PricingEngine,
}

impl BillingService {
    pub fn new(db: Database, config: &Config) -> Self {
        Self {
            db,
            cache: TariffCache::new(&config.cache),
            pricing: PricingEngine::new(&config.billing),
        }
    }

    pub fn pricing(&self) -> &PricingEngine {
        &self.pricing
    }

    /// The tariff version in force for `category` on `as_of`
    pub fn active_tariff(&self, category: Category, as_of: NaiveDate) -> Result<TariffVersion> {
        self.cache.get_or_load(&self.db, category, as_of)
    }

    /// Price consumption without storing anything
    pub fn preview(&self, category: Category, consumption: &Consumption, as_of: NaiveDate) -> Result<BillCharge> {
        let tariff = self.active_tariff(category, as_of)?;
        self.price(consumption, &tariff)
    }

    /// Slab-priced preview for a plain unit count
    pub fn preview_bill(&self, category: Category, units_consumed: i64, as_of: NaiveDate) -> Result<BillCharge> {
        self.preview(category, &Consumption::Units { units: units_consumed }, as_of)
    }

    fn price(&self, consumption: &Consumption, tariff: &TariffVersion) -> Result<BillCharge> {
        match consumption {
            Consumption::TimeOfUse { usage } => self.pricing.compute_time_of_use_bill(usage, tariff),
            other => self.pricing.compute_bill(other.units()?, tariff),
        }
    }

    /// Price a bill against the tariff on its billing date and store it
    pub fn generate_bill(&self, request: &BillRequest) -> Result<Bill> {
        let account_number = request.account_number.trim();
        if account_number.is_empty() {
            return Err(Error::InvalidTariffInput("Account number is required".to_string()));
        }

        let tariff = self.active_tariff(request.category, request.billing_date)?;
        let charge = self.price(&request.consumption, &tariff)?;

        let bill = self.db.insert_bill(&NewBill {
            account_number: account_number.to_string(),
            category: request.category,
            tariff_version_id: tariff.id,
            billing_date: request.billing_date,
            charge,
        })?;

        log::info!(
            "Issued bill #{} for {}: {} units, total {}{}",
            bill.id,
            bill.account_number,
            bill.charge.units_consumed,
            self.pricing.currency_symbol(),
            bill.charge.total_amount
        );
        Ok(bill)
    }

    /// Validate and publish a new tariff version, closing the current one
    pub fn publish_tariff(&self, draft: &TariffDraft) -> Result<TariffVersion> {
        if let Err(e) = pricing::validate_draft(draft) {
            log::warn!("Rejected {} tariff draft: {}", draft.category, e);
            return Err(e);
        }

        let version = self.db.publish_tariff_version(draft)?;
        self.cache.invalidate(draft.category);
        Ok(version)
    }

    pub fn tariff_history(&self, category: Category) -> Result<Vec<TariffVersion>> {
        self.db.get_tariff_history(category)
    }

    pub fn get_bill(&self, id: i64) -> Result<Bill> {
        self.db
            .get_bill(id)?
            .ok_or_else(|| Error::NotFound(format!("bill #{} does not exist", id)))
    }

    pub fn bills_for_account(&self, account_number: &str, limit: Option<u32>) -> Result<Vec<Bill>> {
        self.db.get_bills_for_account(account_number.trim(), limit)
    }
}
