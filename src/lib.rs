//! Utility billing library
//!
//! Tariff-based electricity bill calculation: slab pricing, fixed charge,
//! electricity duty and GST, with versioned tariffs and frozen bills.

pub mod billing;
pub mod core;
pub mod db;
pub mod i18n;
pub mod pricing;
pub mod tariffs;
