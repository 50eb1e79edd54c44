//! Core module - Configuration, errors, and the billing data model

mod config;
mod error;
mod types;

pub use config::{BillingConfig, CacheConfig, Config, DatabaseConfig, GeneralConfig, RoundingRule, TariffFile};
pub use error::{Error, Result};
pub use types::{Bill, BillCharge, Category, NewBill, Slab, SlabCharge, TariffDraft, TariffVersion, TimeOfUse, TouBand, TouPeriod};
