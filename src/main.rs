//! Utility Billing - Main entry point
//!
//! Operator command line for previewing and issuing bills and for
//! managing versioned tariffs.

use anyhow::Context;
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;

use utility_billing_lib::billing::{BillRequest, BillingService, Consumption};
use utility_billing_lib::core::{Bill, BillCharge, Category, Config, Error, TariffFile, TariffVersion, TouPeriod};
use utility_billing_lib::db::Database;
use utility_billing_lib::i18n::I18n;

#[derive(Parser)]
#[command(name = "utility-billing", version, about = "Tariff-based electricity billing")]
struct Cli {
    /// Configuration file (defaults to the platform config directory)
    #[arg(long, global = true, env = "UTILITY_BILLING_CONFIG")]
    config: Option<PathBuf>,

    /// SQLite database file, overriding the configuration
    #[arg(long, global = true, env = "UTILITY_BILLING_DB")]
    database: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Preview a bill, or issue and store it when --account is given
    Bill(BillArgs),
    /// Inspect and import tariffs
    #[command(subcommand)]
    Tariff(TariffCommand),
    /// List bills issued to an account
    Bills {
        #[arg(long)]
        account: String,
        #[arg(long)]
        limit: Option<u32>,
    },
}

#[derive(Args)]
struct BillArgs {
    #[arg(long)]
    category: Category,
    /// Units consumed
    #[arg(long, conflicts_with_all = ["previous", "current"], allow_negative_numbers = true)]
    units: Option<i64>,
    /// Previous meter reading
    #[arg(long, requires = "current")]
    previous: Option<i64>,
    /// Current meter reading
    #[arg(long, requires = "previous")]
    current: Option<i64>,
    /// Billing date (YYYY-MM-DD), today when omitted
    #[arg(long)]
    date: Option<NaiveDate>,
    /// Account to issue the bill to
    #[arg(long)]
    account: Option<String>,
}

#[derive(Subcommand)]
enum TariffCommand {
    /// Show the tariff in force on a date
    Show {
        #[arg(long)]
        category: Category,
        #[arg(long)]
        date: Option<NaiveDate>,
    },
    /// List every version of a category's tariff
    History {
        #[arg(long)]
        category: Category,
    },
    /// Publish the drafts in a TOML tariff file
    Import { file: PathBuf },
}

fn main() -> ExitCode {
    // Initialize logging
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    let config = match load_config(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            log::warn!("Failed to load config, using defaults: {}", e);
            Config::default()
        }
    };
    let i18n = I18n::new(&config.general.language);

    match run(cli, &config, &i18n) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => match e.downcast_ref::<Error>() {
            Some(domain) if domain.is_client_error() => {
                eprintln!("{}", i18n.describe_error(domain));
                ExitCode::from(2)
            }
            _ => {
                eprintln!("Error: {:#}", e);
                ExitCode::FAILURE
            }
        },
    }
}

fn load_config(path: Option<&std::path::Path>) -> utility_billing_lib::core::Result<Config> {
    match path {
        Some(path) => Config::load_from(path),
        None => Config::load(),
    }
}

fn run(cli: Cli, config: &Config, i18n: &I18n) -> anyhow::Result<()> {
    let db = match cli.database.as_ref().or(config.database.path.as_ref()) {
        Some(path) => Database::open(path),
        None => Database::new(),
    }
    .context("Failed to open the billing database")?;

    log::info!("Starting Utility Billing v{}", env!("CARGO_PKG_VERSION"));
    let service = BillingService::new(db, config);
    let today = chrono::Local::now().date_naive();

    match cli.command {
        Command::Bill(args) => {
            let consumption = match (args.units, args.previous, args.current) {
                (Some(units), _, _) => Consumption::Units { units },
                (None, Some(previous), Some(current)) => Consumption::MeterReadings { previous, current },
                _ => anyhow::bail!("Pass either --units or both --previous and --current"),
            };
            let billing_date = args.date.unwrap_or(today);

            match args.account {
                Some(account_number) => {
                    let bill = service.generate_bill(&BillRequest {
                        account_number,
                        category: args.category,
                        billing_date,
                        consumption,
                    })?;
                    print_bill(&bill, &service, i18n);
                }
                None => {
                    let charge = service.preview(args.category, &consumption, billing_date)?;
                    println!("{} - {} ({})", i18n.get("bill.preview"), i18n.category(args.category), billing_date);
                    print_charge(&charge, service.pricing().currency_symbol(), i18n);
                }
            }
        }
        Command::Tariff(TariffCommand::Show { category, date }) => {
            let tariff = service.active_tariff(category, date.unwrap_or(today))?;
            print_tariff(&tariff, i18n);
        }
        Command::Tariff(TariffCommand::History { category }) => {
            let history = service.tariff_history(category)?;
            if history.is_empty() {
                println!("No {} tariff versions", category);
            }
            for tariff in &history {
                print_tariff(tariff, i18n);
                println!();
            }
        }
        Command::Tariff(TariffCommand::Import { file }) => {
            let tariff_file = TariffFile::load_from(&file)
                .with_context(|| format!("Failed to read {}", file.display()))?;
            for draft in &tariff_file.tariffs {
                let version = service.publish_tariff(draft)?;
                println!(
                    "{}: {} v{} ({} {})",
                    i18n.get("tariff.published"),
                    i18n.category(version.category),
                    version.id,
                    i18n.get("tariff.effective_date"),
                    version.effective_date
                );
            }
        }
        Command::Bills { account, limit } => {
            let bills = service.bills_for_account(&account, limit)?;
            if bills.is_empty() {
                println!("No bills for {}", account);
            }
            for bill in &bills {
                println!(
                    "#{:<6} {}  {:>8} units  {}{}",
                    bill.id,
                    bill.billing_date,
                    bill.charge.units_consumed,
                    service.pricing().currency_symbol(),
                    bill.charge.total_amount
                );
            }
        }
    }

    Ok(())
}

fn print_bill(bill: &Bill, service: &BillingService, i18n: &I18n) {
    println!("{} #{}", i18n.get("bill.title"), bill.id);
    println!("  {}: {}", i18n.get("bill.account"), bill.account_number);
    println!("  {}: {}", i18n.get("bill.billing_date"), bill.billing_date);
    println!("  {}: {} v{}", i18n.get("tariff.title"), i18n.category(bill.category), bill.tariff_version_id);
    print_charge(&bill.charge, service.pricing().currency_symbol(), i18n);
}

fn print_charge(charge: &BillCharge, symbol: &str, i18n: &I18n) {
    println!("  {}: {}", i18n.get("bill.units_consumed"), charge.units_consumed);
    println!("  ----------------------------------------------");
    for (i, slab) in charge.tariff_slab_breakdown.iter().enumerate() {
        println!(
            "  {} {:<3} {:>8} x {:>8} = {}{:>10}",
            i18n.get("bill.slab"),
            i + 1,
            slab.units,
            slab.rate,
            symbol,
            slab.amount
        );
    }
    println!("  ----------------------------------------------");
    let lines = [
        ("bill.base_amount", charge.base_amount),
        ("bill.fixed_charges", charge.fixed_charges),
        ("bill.electricity_duty", charge.electricity_duty),
        ("bill.gst_amount", charge.gst_amount),
        ("bill.total_amount", charge.total_amount),
    ];
    for (key, amount) in lines {
        println!("  {:<24} {}{:>10}", i18n.get(key), symbol, amount);
    }
}

fn print_tariff(tariff: &TariffVersion, i18n: &I18n) {
    println!("{} {} v{}", i18n.get("tariff.title"), i18n.category(tariff.category), tariff.id);
    println!("  {}: {}", i18n.get("tariff.effective_date"), tariff.effective_date);
    match tariff.valid_until {
        Some(until) => println!("  {}: {}", i18n.get("tariff.valid_until"), until),
        None => println!("  {}", i18n.get("tariff.active")),
    }
    println!("  {}: {}", i18n.get("tariff.fixed_charge"), tariff.fixed_charge);
    println!("  {}: {}", i18n.get("tariff.electricity_duty_percent"), tariff.electricity_duty_percent);
    println!("  {}: {}", i18n.get("tariff.gst_percent"), tariff.gst_percent);
    for slab in &tariff.slabs {
        let to = slab.to.map_or_else(|| "\u{221E}".to_string(), |to| to.to_string());
        println!("  {:>6} - {:<6} @ {}", slab.from, to, slab.rate_per_unit);
    }
    if let Some(tou) = &tariff.time_of_use {
        for period in [TouPeriod::Peak, TouPeriod::Normal, TouPeriod::OffPeak] {
            let band = tou.band(period);
            println!("  {:<16} {} ({})", i18n.period(period), band.rate, band.hours);
        }
    }
}
