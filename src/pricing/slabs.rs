//! Slab table validation and consumption allocation

use super::round_amount;
use crate::core::{Error, Result, RoundingRule, Slab, SlabCharge};
use rust_decimal::Decimal;

/// Check that a slab table starts at zero, is contiguous and ascending,
/// and that only the last slab is unbounded.
pub fn validate_slabs(slabs: &[Slab]) -> Result<()> {
    let first = slabs
        .first()
        .ok_or_else(|| Error::TariffConfiguration("Slab table is empty".to_string()))?;

    if first.from != 0 {
        return Err(Error::TariffConfiguration(format!(
            "First slab must start at 0 units, starts at {}",
            first.from
        )));
    }

    for (i, slab) in slabs.iter().enumerate() {
        let number = i + 1;

        if slab.rate_per_unit <= Decimal::ZERO {
            return Err(Error::InvalidTariffInput(format!(
                "Slab {} rate must be a positive number, got {}",
                number, slab.rate_per_unit
            )));
        }

        let Some(next) = slabs.get(i + 1) else {
            break;
        };

        let to = match slab.to {
            Some(to) if to <= slab.from => {
                return Err(Error::TariffConfiguration(format!(
                    "Slab {} ends at {} but starts at {}",
                    number, to, slab.from
                )));
            }
            Some(to) => to,
            None => {
                return Err(Error::TariffConfiguration(format!(
                    "Slab {} is unbounded but is not the last slab",
                    number
                )));
            }
        };

        if next.from > to {
            return Err(Error::TariffConfiguration(format!(
                "Gap between slab {} (ends at {}) and slab {} (starts at {})",
                number,
                to,
                number + 1,
                next.from
            )));
        }
        if next.from < to {
            return Err(Error::TariffConfiguration(format!(
                "Slab {} (starts at {}) overlaps slab {} (ends at {})",
                number + 1,
                next.from,
                number,
                to
            )));
        }
    }

    // The loop stops before checking the last slab's own bounds
    if let Some(last) = slabs.last() {
        if let Some(to) = last.to.filter(|&to| to <= last.from) {
            return Err(Error::TariffConfiguration(format!(
                "Slab {} ends at {} but starts at {}",
                slabs.len(),
                to,
                last.from
            )));
        }
    }

    Ok(())
}

/// Split `units` across the slab table in ascending order.
///
/// Slabs that receive no units are left out of the breakdown. Consumption
/// beyond a bounded final slab is a configuration error rather than being
/// dropped.
pub fn allocate_slabs(units: u64, slabs: &[Slab], rounding: RoundingRule) -> Result<Vec<SlabCharge>> {
    validate_slabs(slabs)?;

    let mut remaining = units;
    let mut breakdown = Vec::new();

    for slab in slabs {
        if remaining == 0 {
            break;
        }

        let allocated = match slab.capacity() {
            Some(capacity) => remaining.min(capacity),
            None => remaining,
        };
        remaining -= allocated;

        if allocated == 0 {
            continue;
        }

        let amount = Decimal::from(allocated)
            .checked_mul(slab.rate_per_unit)
            .ok_or_else(|| {
                Error::InvalidTariffInput(format!(
                    "{} units at {} overflows the charge amount",
                    allocated, slab.rate_per_unit
                ))
            })?;

        breakdown.push(SlabCharge {
            units: allocated,
            rate: slab.rate_per_unit,
            amount: round_amount(amount, rounding),
        });
    }

    if remaining > 0 {
        let capacity = units - remaining;
        return Err(Error::TariffConfiguration(format!(
            "{} units exceed the slab table's capacity of {} units; the last slab must be unbounded",
            units, capacity
        )));
    }

    Ok(breakdown)
}
