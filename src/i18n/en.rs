//! English translations

use std::collections::HashMap;

pub fn get_translations() -> HashMap<String, String> {
    let mut t = HashMap::new();

    // App general
    t.insert("app.title".into(), "Utility Billing".into());
    t.insert("app.version".into(), "Version".into());

    // Categories
    t.insert("category.residential".into(), "Residential".into());
    t.insert("category.commercial".into(), "Commercial".into());
    t.insert("category.industrial".into(), "Industrial".into());
    t.insert("category.agricultural".into(), "Agricultural".into());

    // Bill breakdown
    t.insert("bill.title".into(), "Bill".into());
    t.insert("bill.account".into(), "Account".into());
    t.insert("bill.billing_date".into(), "Billing Date".into());
    t.insert("bill.units_consumed".into(), "Units Consumed".into());
    t.insert("bill.slab".into(), "Slab".into());
    t.insert("bill.units".into(), "Units".into());
    t.insert("bill.rate".into(), "Rate".into());
    t.insert("bill.amount".into(), "Amount".into());
    t.insert("bill.base_amount".into(), "Energy Charges".into());
    t.insert("bill.fixed_charges".into(), "Fixed Charges".into());
    t.insert("bill.electricity_duty".into(), "Electricity Duty".into());
    t.insert("bill.gst_amount".into(), "GST".into());
    t.insert("bill.total_amount".into(), "Total Amount".into());
    t.insert("bill.preview".into(), "Preview (not issued)".into());

    // Time of use
    t.insert("tou.peak".into(), "Peak".into());
    t.insert("tou.normal".into(), "Normal".into());
    t.insert("tou.off_peak".into(), "Off-peak".into());

    // Tariffs
    t.insert("tariff.title".into(), "Tariff".into());
    t.insert("tariff.effective_date".into(), "Effective Date".into());
    t.insert("tariff.valid_until".into(), "Valid Until".into());
    t.insert("tariff.active".into(), "Active".into());
    t.insert("tariff.fixed_charge".into(), "Fixed Charge".into());
    t.insert("tariff.electricity_duty_percent".into(), "Electricity Duty (%)".into());
    t.insert("tariff.gst_percent".into(), "GST (%)".into());
    t.insert("tariff.published".into(), "Tariff published".into());

    // Errors
    t.insert("error.invalid_input".into(), "Please check the values entered".into());
    t.insert("error.tariff_configuration".into(), "The tariff is misconfigured and must be corrected by an administrator".into());
    t.insert("error.not_found".into(), "No data found".into());
    t.insert("error.internal".into(), "Something went wrong".into());

    t
}
