//! Pricing engine for electricity bill calculation
//!
//! Supports two ways of pricing consumption:
//! - Slabs: consumption split across ascending tiers, each with its own rate
//! - Time of use: consumption bucketed into peak / normal / off-peak bands
//!
//! Both feed the same aggregation: fixed charge, then electricity duty on
//! energy plus fixed charge, then GST on everything before it. Amounts are
//! rounded to two decimals at each output field, never in between.

mod slabs;
mod time_of_use;

pub use slabs::{allocate_slabs, validate_slabs};
pub use time_of_use::{IntervalReading, TouUsage};

use crate::core::{BillCharge, BillingConfig, Error, Result, RoundingRule, SlabCharge, TariffDraft, TariffVersion};
use rust_decimal::Decimal;

const DECIMAL_PLACES: u32 = 2;

/// Round a monetary amount to two decimals with the given rule
pub fn round_amount(value: Decimal, rule: RoundingRule) -> Decimal {
    value.round_dp_with_strategy(DECIMAL_PLACES, rule.strategy())
}

/// Fixed charge, duty, GST and total for a given energy charge
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChargeTotals {
    pub base_amount: Decimal,
    pub fixed_charges: Decimal,
    pub electricity_duty: Decimal,
    pub gst_amount: Decimal,
    pub total_amount: Decimal,
}

fn require_non_negative(field: &str, value: Decimal) -> Result<()> {
    if value < Decimal::ZERO {
        return Err(Error::InvalidTariffInput(format!(
            "{} must be a valid non-negative number",
            field
        )));
    }
    Ok(())
}

fn overflow(what: &str) -> Error {
    Error::InvalidTariffInput(format!("{} overflows the charge amount", what))
}

/// Reject negative consumption before anything is computed
pub fn validate_units(units_consumed: i64) -> Result<u64> {
    u64::try_from(units_consumed).map_err(|_| {
        Error::InvalidTariffInput(format!(
            "Units consumed must be a valid non-negative number, got {}",
            units_consumed
        ))
    })
}

/// Combine the energy charge with fixed charge, duty and GST
pub fn aggregate_charges(
    base_amount: Decimal,
    fixed_charge: Decimal,
    electricity_duty_percent: Decimal,
    gst_percent: Decimal,
    rounding: RoundingRule,
) -> Result<ChargeTotals> {
    require_non_negative("Base amount", base_amount)?;
    require_non_negative("Fixed charge", fixed_charge)?;
    require_non_negative("Electricity duty percent", electricity_duty_percent)?;
    require_non_negative("GST percent", gst_percent)?;

    let base_amount = round_amount(base_amount, rounding);
    let subtotal = base_amount
        .checked_add(fixed_charge)
        .ok_or_else(|| overflow("Fixed charge"))?;
    let electricity_duty = subtotal
        .checked_mul(electricity_duty_percent)
        .and_then(|v| v.checked_div(Decimal::ONE_HUNDRED))
        .map(|v| round_amount(v, rounding))
        .ok_or_else(|| overflow("Electricity duty"))?;
    let taxable = subtotal
        .checked_add(electricity_duty)
        .ok_or_else(|| overflow("Electricity duty"))?;
    let gst_amount = taxable
        .checked_mul(gst_percent)
        .and_then(|v| v.checked_div(Decimal::ONE_HUNDRED))
        .map(|v| round_amount(v, rounding))
        .ok_or_else(|| overflow("GST"))?;
    let total_amount = taxable
        .checked_add(gst_amount)
        .map(|v| round_amount(v, rounding))
        .ok_or_else(|| overflow("Total"))?;

    Ok(ChargeTotals {
        base_amount,
        fixed_charges: fixed_charge,
        electricity_duty,
        gst_amount,
        total_amount,
    })
}

/// Validate every number and structure a tariff version carries
pub fn validate_tariff(tariff: &TariffVersion) -> Result<()> {
    require_non_negative("Fixed charge", tariff.fixed_charge)?;
    require_non_negative("Electricity duty percent", tariff.electricity_duty_percent)?;
    require_non_negative("GST percent", tariff.gst_percent)?;
    validate_slabs(&tariff.slabs)?;

    if let Some(tou) = &tariff.time_of_use {
        tou.validate()?;
    }
    Ok(())
}

/// Validate an administrator's draft before it becomes a version
pub fn validate_draft(draft: &TariffDraft) -> Result<()> {
    validate_tariff(&TariffVersion::from_draft(0, draft))
}

/// Pricing engine that turns consumption into a bill charge
pub struct PricingEngine {
    rounding: RoundingRule,
    currency_symbol: String,
}

impl PricingEngine {
    /// Create a new pricing engine with the given configuration
    pub fn new(config: &BillingConfig) -> Self {
        Self {
            rounding: config.rounding,
            currency_symbol: config.currency_symbol.clone(),
        }
    }

    /// Update the billing configuration
    pub fn update_config(&mut self, config: &BillingConfig) {
        self.rounding = config.rounding;
        self.currency_symbol = config.currency_symbol.clone();
    }

    pub fn rounding(&self) -> RoundingRule {
        self.rounding
    }

    /// Get the currency symbol
    pub fn currency_symbol(&self) -> &str {
        &self.currency_symbol
    }

    /// Compute the slab-priced charge for `units_consumed` under `tariff`
    pub fn compute_bill(&self, units_consumed: i64, tariff: &TariffVersion) -> Result<BillCharge> {
        let units = validate_units(units_consumed)?;
        validate_tariff(tariff)?;

        let breakdown = allocate_slabs(units, &tariff.slabs, self.rounding)?;
        self.assemble(units, breakdown, tariff)
    }

    /// Compute the charge for consumption split into time-of-use bands
    pub fn compute_time_of_use_bill(&self, usage: &TouUsage, tariff: &TariffVersion) -> Result<BillCharge> {
        let tou = tariff.time_of_use.as_ref().ok_or_else(|| {
            Error::TariffConfiguration(format!(
                "The {} tariff effective {} has no time-of-use rates",
                tariff.category, tariff.effective_date
            ))
        })?;
        validate_tariff(tariff)?;

        let units = usage.total_units()?;
        let breakdown = time_of_use::price_usage(usage, tou, self.rounding)?;
        self.assemble(units, breakdown, tariff)
    }

    fn assemble(&self, units: u64, breakdown: Vec<SlabCharge>, tariff: &TariffVersion) -> Result<BillCharge> {
        let energy = breakdown
            .iter()
            .try_fold(Decimal::ZERO, |sum, charge| sum.checked_add(charge.amount))
            .ok_or_else(|| overflow("Energy charge"))?;
        let totals = aggregate_charges(
            energy,
            tariff.fixed_charge,
            tariff.electricity_duty_percent,
            tariff.gst_percent,
            self.rounding,
        )?;

        Ok(BillCharge {
            units_consumed: units,
            tariff_slab_breakdown: breakdown,
            base_amount: totals.base_amount,
            fixed_charges: totals.fixed_charges,
            electricity_duty: totals.electricity_duty,
            gst_amount: totals.gst_amount,
            total_amount: totals.total_amount,
        })
    }
}
