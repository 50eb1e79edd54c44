//! Utility Billing - Demo CLI
//!
//! Walks through the billing core against an in-memory database:
//! publishing a tariff, previewing and issuing a bill, revising the
//! tariff, and showing that the issued bill stays as it was.

use anyhow::Result;
use chrono::NaiveDate;
use rust_decimal::Decimal;

use utility_billing_lib::billing::{parse_amount, BillRequest, BillingService, Consumption};
use utility_billing_lib::core::{BillCharge, Category, Config, Slab, TariffDraft};
use utility_billing_lib::db::Database;
use utility_billing_lib::i18n::I18n;

fn residential_draft(effective_date: NaiveDate, top_rate: Decimal) -> Result<TariffDraft> {
    Ok(TariffDraft {
        category: Category::Residential,
        fixed_charge: parse_amount("Fixed charge", "25.00")?,
        slabs: vec![
            Slab::new(0, Some(100), parse_amount("Slab 1 rate", "3.50")?),
            Slab::new(100, Some(300), parse_amount("Slab 2 rate", "4.00")?),
            Slab::new(300, None, top_rate),
        ],
        time_of_use: None,
        electricity_duty_percent: parse_amount("Electricity duty percent", "5")?,
        gst_percent: parse_amount("GST percent", "18")?,
        effective_date,
    })
}

fn print_charge(charge: &BillCharge, symbol: &str) {
    for (i, slab) in charge.tariff_slab_breakdown.iter().enumerate() {
        println!(
            "      Slab {}: {:>4} units x {:>5} = {}{:>8}",
            i + 1,
            slab.units,
            slab.rate,
            symbol,
            slab.amount
        );
    }
    println!("      Energy:   {}{:>8}", symbol, charge.base_amount);
    println!("      Fixed:    {}{:>8}", symbol, charge.fixed_charges);
    println!("      Duty:     {}{:>8}", symbol, charge.electricity_duty);
    println!("      GST:      {}{:>8}", symbol, charge.gst_amount);
    println!("      Total:    {}{:>8}", symbol, charge.total_amount);
}

fn main() -> Result<()> {
    // Initialize logging
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    println!("==============================================");
    println!("   Utility Billing - Demo CLI");
    println!("==============================================\n");

    let config = Config::default();
    let symbol = config.billing.currency_symbol.clone();
    let service = BillingService::new(Database::open_in_memory()?, &config);
    let i18n = I18n::new("en");

    let april = NaiveDate::from_ymd_opt(2024, 4, 1).expect("valid date");
    let may = NaiveDate::from_ymd_opt(2024, 5, 1).expect("valid date");
    let october = NaiveDate::from_ymd_opt(2024, 10, 1).expect("valid date");

    // 1. Publish the first tariff
    println!("[1/4] Publishing residential tariff effective {}...", april);
    let draft = residential_draft(april, parse_amount("Slab 3 rate", "5.00")?)?;
    let first = service.publish_tariff(&draft)?;
    println!("      Version: v{}\n", first.id);

    // 2. Preview
    println!("[2/4] Previewing 460 units on {}...", may);
    let preview = service.preview_bill(Category::Residential, 460, may)?;
    print_charge(&preview, &symbol);
    println!();

    // 3. Issue from meter readings
    println!("[3/4] Issuing bill for ACC-1001 (readings 12040 -> 12500)...");
    let bill = service.generate_bill(&BillRequest {
        account_number: "ACC-1001".to_string(),
        category: Category::Residential,
        billing_date: may,
        consumption: Consumption::MeterReadings { previous: 12_040, current: 12_500 },
    })?;
    println!("      Bill #{} against tariff v{}", bill.id, bill.tariff_version_id);
    print_charge(&bill.charge, &symbol);
    println!();

    // 4. Revise the tariff; the issued bill must not change
    println!("[4/4] Revising tariff effective {} (top slab 5.00 -> 5.50)...", october);
    let draft = residential_draft(october, parse_amount("Slab 3 rate", "5.50")?)?;
    let second = service.publish_tariff(&draft)?;
    println!("      Version: v{} (v{} closed)", second.id, first.id);

    let stored = service.get_bill(bill.id)?;
    println!("      Bill #{} total still {}{}", stored.id, symbol, stored.charge.total_amount);

    let november_date = NaiveDate::from_ymd_opt(2024, 11, 1).expect("valid date");
    let november = service.preview_bill(Category::Residential, 460, november_date)?;
    println!("      Same usage in November: {}{}\n", symbol, november.total_amount);

    // Errors as an operator would see them
    println!("=== Validation ===\n");
    let negative = service.preview_bill(Category::Residential, -5, may);
    let missing = service.preview_bill(Category::Agricultural, 100, may);
    for result in [negative, missing] {
        if let Err(e) = result {
            println!("  [{}] {}", e.status_code(), i18n.describe_error(&e));
        }
    }

    println!("\n==============================================\n");
    Ok(())
}
