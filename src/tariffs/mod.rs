//! Tariff version resolution
//!
//! A category's tariff is a chain of versions, each valid over
//! `[effective_date, valid_until)`. Resolution picks the version covering a
//! given date; `TariffCache` keeps recent lookups for a short while.

mod cache;

pub use cache::TariffCache;

use crate::core::{Category, Error, Result, TariffVersion};
use chrono::NaiveDate;

/// Message shown when no version covers the requested date
pub const NO_TARIFF_MESSAGE: &str = "no tariff data available for the selected category";

/// Anything that can look up the tariff in force for a category on a date
pub trait TariffSource {
    /// Get the version covering `as_of`, or `Error::NotFound`
    fn get_active_tariff(&self, category: Category, as_of: NaiveDate) -> Result<TariffVersion>;
}

/// Pick the version of `category` whose window contains `as_of`.
///
/// The open-ended version wins when more than one window matches;
/// otherwise the latest effective date does.
pub fn resolve_version(versions: &[TariffVersion], category: Category, as_of: NaiveDate) -> Option<&TariffVersion> {
    versions
        .iter()
        .filter(|v| v.category == category && v.covers(as_of))
        .max_by_key(|v| (v.is_active(), v.effective_date))
}

/// `resolve_version`, cloned, with the operator-facing not-found error
pub fn require_version(versions: &[TariffVersion], category: Category, as_of: NaiveDate) -> Result<TariffVersion> {
    resolve_version(versions, category, as_of)
        .cloned()
        .ok_or_else(|| not_found(category, as_of))
}

pub(crate) fn not_found(category: Category, as_of: NaiveDate) -> Error {
    log::warn!("No {} tariff covers {}", category, as_of);
    Error::NotFound(NO_TARIFF_MESSAGE.to_string())
}
