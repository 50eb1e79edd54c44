//! Database module for persisting tariffs and issued bills
//!
//! Uses SQLite for local storage of:
//! - Tariff versions (one open-ended version per category)
//! - Issued bills with their frozen charge breakdown

use crate::core::{Bill, BillCharge, Category, Error, NewBill, Result, SlabCharge, TariffDraft, TariffVersion};
use crate::tariffs::{self, TariffSource};
use chrono::NaiveDate;
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Row};
use rust_decimal::Decimal;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Database manager
pub struct Database {
    conn: Connection,
}

const TARIFF_COLUMNS: &str = "id, category, fixed_charge, slabs, time_of_use, \
     electricity_duty_percent, gst_percent, effective_date, valid_until";

const BILL_COLUMNS: &str = "id, account_number, category, tariff_version_id, billing_date, \
     units_consumed, breakdown, base_amount, fixed_charges, electricity_duty, gst_amount, \
     total_amount, created_at";

impl Database {
    /// Open the database in the platform data directory
    pub fn new() -> Result<Self> {
        let db_path = Self::db_path()?;
        Self::open(&db_path)
    }

    /// Open (or create) the database at `path`
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(path)?;

        let db = Self { conn };
        db.init_schema()?;

        Ok(db)
    }

    /// Throwaway database, used by tests and the demo
    pub fn open_in_memory() -> Result<Self> {
        let db = Self {
            conn: Connection::open_in_memory()?,
        };
        db.init_schema()?;
        Ok(db)
    }

    /// Get the database file path
    pub fn db_path() -> Result<PathBuf> {
        let data_dir = dirs::data_dir()
            .ok_or_else(|| Error::Config("Could not determine data directory".to_string()))?;

        Ok(data_dir.join("utility-billing").join("billing.db"))
    }

    /// Initialize database schema
    fn init_schema(&self) -> Result<()> {
        self.conn.execute_batch(
            r#"
            PRAGMA foreign_keys = ON;

            -- Tariff versions; history is kept for bills issued against it
            CREATE TABLE IF NOT EXISTS tariff_versions (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                category TEXT NOT NULL,
                fixed_charge TEXT NOT NULL,
                slabs TEXT NOT NULL,
                time_of_use TEXT,
                electricity_duty_percent TEXT NOT NULL,
                gst_percent TEXT NOT NULL,
                effective_date TEXT NOT NULL,
                valid_until TEXT
            );

            -- Issued bills, frozen at generation time
            CREATE TABLE IF NOT EXISTS bills (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                account_number TEXT NOT NULL,
                category TEXT NOT NULL,
                tariff_version_id INTEGER NOT NULL REFERENCES tariff_versions(id),
                billing_date TEXT NOT NULL,
                units_consumed INTEGER NOT NULL,
                breakdown TEXT NOT NULL,
                base_amount TEXT NOT NULL,
                fixed_charges TEXT NOT NULL,
                electricity_duty TEXT NOT NULL,
                gst_amount TEXT NOT NULL,
                total_amount TEXT NOT NULL,
                created_at INTEGER NOT NULL
            );

            -- Indexes
            CREATE UNIQUE INDEX IF NOT EXISTS idx_tariff_active
                ON tariff_versions(category) WHERE valid_until IS NULL;
            CREATE INDEX IF NOT EXISTS idx_tariff_category_date
                ON tariff_versions(category, effective_date);
            CREATE INDEX IF NOT EXISTS idx_bills_account
                ON bills(account_number, billing_date);
            "#,
        )?;

        Ok(())
    }

    // ===== Tariff Versions =====

    /// Close the category's active version and open `draft` as the new one.
    ///
    /// Both writes happen in one transaction. The draft must take effect
    /// after the version it replaces.
    pub fn publish_tariff_version(&self, draft: &TariffDraft) -> Result<TariffVersion> {
        let tx = self.conn.unchecked_transaction()?;

        let current = tx
            .query_row(
                &format!(
                    "SELECT {} FROM tariff_versions WHERE category = ?1 AND valid_until IS NULL",
                    TARIFF_COLUMNS
                ),
                params![draft.category.as_str()],
                tariff_from_row,
            )
            .optional()?;

        if let Some(current) = &current {
            if draft.effective_date <= current.effective_date {
                return Err(Error::InvalidTariffInput(format!(
                    "Effective date {} must be after {}, when the current {} tariff took effect",
                    draft.effective_date, current.effective_date, draft.category
                )));
            }

            tx.execute(
                "UPDATE tariff_versions SET valid_until = ?1 WHERE id = ?2",
                params![draft.effective_date, current.id],
            )?;
        }

        let slabs_json = serde_json::to_string(&draft.slabs)?;
        let tou_json = draft
            .time_of_use
            .as_ref()
            .map(serde_json::to_string)
            .transpose()?;

        tx.execute(
            "INSERT INTO tariff_versions (category, fixed_charge, slabs, time_of_use,
                 electricity_duty_percent, gst_percent, effective_date, valid_until)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, NULL)",
            params![
                draft.category.as_str(),
                draft.fixed_charge.to_string(),
                slabs_json,
                tou_json,
                draft.electricity_duty_percent.to_string(),
                draft.gst_percent.to_string(),
                draft.effective_date,
            ],
        )?;
        let id = tx.last_insert_rowid();
        tx.commit()?;

        match current {
            Some(previous) => log::info!(
                "Published {} tariff v{} effective {} (closed v{})",
                draft.category, id, draft.effective_date, previous.id
            ),
            None => log::info!(
                "Published first {} tariff v{} effective {}",
                draft.category, id, draft.effective_date
            ),
        }

        Ok(TariffVersion::from_draft(id, draft))
    }

    /// Get a specific tariff version by ID
    pub fn get_tariff_version(&self, id: i64) -> Result<Option<TariffVersion>> {
        let version = self
            .conn
            .query_row(
                &format!("SELECT {} FROM tariff_versions WHERE id = ?1", TARIFF_COLUMNS),
                params![id],
                tariff_from_row,
            )
            .optional()?;
        Ok(version)
    }

    /// All versions of a category, oldest first
    pub fn get_tariff_history(&self, category: Category) -> Result<Vec<TariffVersion>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {} FROM tariff_versions WHERE category = ?1 ORDER BY effective_date ASC, id ASC",
            TARIFF_COLUMNS
        ))?;

        let versions = stmt
            .query_map(params![category.as_str()], tariff_from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(versions)
    }

    // ===== Bills =====

    /// Store an issued bill
    pub fn insert_bill(&self, bill: &NewBill) -> Result<Bill> {
        let now = chrono::Utc::now().timestamp();
        let breakdown_json = serde_json::to_string(&bill.charge.tariff_slab_breakdown)?;
        let units = i64::try_from(bill.charge.units_consumed).map_err(|_| {
            Error::InvalidTariffInput(format!("{} units is too large to store", bill.charge.units_consumed))
        })?;

        self.conn.execute(
            "INSERT INTO bills (account_number, category, tariff_version_id, billing_date,
                 units_consumed, breakdown, base_amount, fixed_charges, electricity_duty,
                 gst_amount, total_amount, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
            params![
                bill.account_number,
                bill.category.as_str(),
                bill.tariff_version_id,
                bill.billing_date,
                units,
                breakdown_json,
                bill.charge.base_amount.to_string(),
                bill.charge.fixed_charges.to_string(),
                bill.charge.electricity_duty.to_string(),
                bill.charge.gst_amount.to_string(),
                bill.charge.total_amount.to_string(),
                now,
            ],
        )?;

        Ok(Bill {
            id: self.conn.last_insert_rowid(),
            account_number: bill.account_number.clone(),
            category: bill.category,
            tariff_version_id: bill.tariff_version_id,
            billing_date: bill.billing_date,
            charge: bill.charge.clone(),
            created_at: now,
        })
    }

    /// Get a specific bill by ID
    pub fn get_bill(&self, id: i64) -> Result<Option<Bill>> {
        let bill = self
            .conn
            .query_row(
                &format!("SELECT {} FROM bills WHERE id = ?1", BILL_COLUMNS),
                params![id],
                bill_from_row,
            )
            .optional()?;
        Ok(bill)
    }

    /// Bills of an account, newest first, optionally limited
    pub fn get_bills_for_account(&self, account_number: &str, limit: Option<u32>) -> Result<Vec<Bill>> {
        let query = match limit {
            Some(n) => format!(
                "SELECT {} FROM bills WHERE account_number = ?1
                 ORDER BY billing_date DESC, id DESC LIMIT {}",
                BILL_COLUMNS, n
            ),
            None => format!(
                "SELECT {} FROM bills WHERE account_number = ?1
                 ORDER BY billing_date DESC, id DESC",
                BILL_COLUMNS
            ),
        };

        let mut stmt = self.conn.prepare(&query)?;
        let bills = stmt
            .query_map(params![account_number], bill_from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(bills)
    }
}

impl TariffSource for Database {
    fn get_active_tariff(&self, category: Category, as_of: NaiveDate) -> Result<TariffVersion> {
        let versions = self.get_tariff_history(category)?;
        tariffs::require_version(&versions, category, as_of)
    }
}

fn conversion_error(idx: usize, err: impl std::error::Error + Send + Sync + 'static) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(err))
}

fn decimal_at(row: &Row<'_>, idx: usize) -> rusqlite::Result<Decimal> {
    let raw: String = row.get(idx)?;
    Decimal::from_str(&raw).map_err(|e| conversion_error(idx, e))
}

fn category_at(row: &Row<'_>, idx: usize) -> rusqlite::Result<Category> {
    let raw: String = row.get(idx)?;
    Category::from_str(&raw).map_err(|e| conversion_error(idx, e))
}

fn json_at<T: serde::de::DeserializeOwned>(row: &Row<'_>, idx: usize) -> rusqlite::Result<T> {
    let raw: String = row.get(idx)?;
    serde_json::from_str(&raw).map_err(|e| conversion_error(idx, e))
}

fn tariff_from_row(row: &Row<'_>) -> rusqlite::Result<TariffVersion> {
    let time_of_use: Option<String> = row.get(4)?;

    Ok(TariffVersion {
        id: row.get(0)?,
        category: category_at(row, 1)?,
        fixed_charge: decimal_at(row, 2)?,
        slabs: json_at(row, 3)?,
        time_of_use: time_of_use
            .map(|raw| serde_json::from_str(&raw))
            .transpose()
            .map_err(|e| conversion_error(4, e))?,
        electricity_duty_percent: decimal_at(row, 5)?,
        gst_percent: decimal_at(row, 6)?,
        effective_date: row.get(7)?,
        valid_until: row.get(8)?,
    })
}

fn bill_from_row(row: &Row<'_>) -> rusqlite::Result<Bill> {
    let units: i64 = row.get(5)?;
    let breakdown: Vec<SlabCharge> = json_at(row, 6)?;

    Ok(Bill {
        id: row.get(0)?,
        account_number: row.get(1)?,
        category: category_at(row, 2)?,
        tariff_version_id: row.get(3)?,
        billing_date: row.get(4)?,
        charge: BillCharge {
            units_consumed: u64::try_from(units).map_err(|e| conversion_error(5, e))?,
            tariff_slab_breakdown: breakdown,
            base_amount: decimal_at(row, 7)?,
            fixed_charges: decimal_at(row, 8)?,
            electricity_duty: decimal_at(row, 9)?,
            gst_amount: decimal_at(row, 10)?,
            total_amount: decimal_at(row, 11)?,
        },
        created_at: row.get(12)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Slab, TimeOfUse, TouBand};

    fn d(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn create_test_db() -> Database {
        Database::open_in_memory().unwrap()
    }

    fn draft(category: Category, effective: &str, top_rate: &str) -> TariffDraft {
        TariffDraft {
            category,
            fixed_charge: d("25.00"),
            slabs: vec![
                Slab::new(0, Some(100), d("3.50")),
                Slab::new(100, Some(300), d("4.00")),
                Slab::new(300, None, d(top_rate)),
            ],
            time_of_use: None,
            electricity_duty_percent: d("5"),
            gst_percent: d("18"),
            effective_date: date(effective),
        }
    }

    fn sample_charge() -> BillCharge {
        BillCharge {
            units_consumed: 460,
            tariff_slab_breakdown: vec![
                SlabCharge { units: 100, rate: d("3.50"), amount: d("350.00") },
                SlabCharge { units: 200, rate: d("4.00"), amount: d("800.00") },
                SlabCharge { units: 160, rate: d("5.00"), amount: d("800.00") },
            ],
            base_amount: d("1950.00"),
            fixed_charges: d("25.00"),
            electricity_duty: d("98.75"),
            gst_amount: d("373.28"),
            total_amount: d("2447.03"),
        }
    }

    #[test]
    fn test_publish_and_get_tariff() {
        let db = create_test_db();

        let published = db.publish_tariff_version(&draft(Category::Residential, "2024-04-01", "5.00")).unwrap();
        let stored = db.get_tariff_version(published.id).unwrap().unwrap();

        assert_eq!(stored, published);
        assert!(stored.is_active());
        assert_eq!(stored.slabs[2].rate_per_unit, d("5.00"));
        assert_eq!(stored.slabs[2].to, None);
    }

    #[test]
    fn test_publish_closes_previous_version() {
        let db = create_test_db();

        let first = db.publish_tariff_version(&draft(Category::Residential, "2024-04-01", "5.00")).unwrap();
        let second = db.publish_tariff_version(&draft(Category::Residential, "2024-10-01", "5.50")).unwrap();

        let history = db.get_tariff_history(Category::Residential).unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].id, first.id);
        assert_eq!(history[0].valid_until, Some(date("2024-10-01")));
        assert_eq!(history[1].id, second.id);
        assert!(history[1].is_active());
        assert_eq!(history.iter().filter(|v| v.is_active()).count(), 1);
    }

    #[test]
    fn test_publish_rejects_backdated_version() {
        let db = create_test_db();

        db.publish_tariff_version(&draft(Category::Commercial, "2024-04-01", "5.00")).unwrap();
        let err = db
            .publish_tariff_version(&draft(Category::Commercial, "2024-04-01", "6.00"))
            .unwrap_err();

        assert!(matches!(err, Error::InvalidTariffInput(_)));
        // The failed publish must not have closed the active version
        let history = db.get_tariff_history(Category::Commercial).unwrap();
        assert_eq!(history.len(), 1);
        assert!(history[0].is_active());
    }

    #[test]
    fn test_categories_are_versioned_independently() {
        let db = create_test_db();

        db.publish_tariff_version(&draft(Category::Residential, "2024-04-01", "5.00")).unwrap();
        db.publish_tariff_version(&draft(Category::Industrial, "2024-01-01", "7.00")).unwrap();

        assert!(db.get_tariff_history(Category::Residential).unwrap()[0].is_active());
        assert!(db.get_tariff_history(Category::Industrial).unwrap()[0].is_active());
    }

    #[test]
    fn test_active_tariff_lookup() {
        let db = create_test_db();

        let first = db.publish_tariff_version(&draft(Category::Residential, "2024-04-01", "5.00")).unwrap();
        let second = db.publish_tariff_version(&draft(Category::Residential, "2024-10-01", "5.50")).unwrap();

        assert_eq!(db.get_active_tariff(Category::Residential, date("2024-06-15")).unwrap().id, first.id);
        assert_eq!(db.get_active_tariff(Category::Residential, date("2024-10-01")).unwrap().id, second.id);
        assert!(matches!(
            db.get_active_tariff(Category::Residential, date("2024-01-01")),
            Err(Error::NotFound(_))
        ));
        assert!(matches!(
            db.get_active_tariff(Category::Agricultural, date("2024-06-15")),
            Err(Error::NotFound(_))
        ));
    }

    #[test]
    fn test_time_of_use_round_trip() {
        let db = create_test_db();
        let mut with_tou = draft(Category::Industrial, "2024-01-01", "6.00");
        with_tou.time_of_use = Some(TimeOfUse {
            peak: TouBand { rate: d("8.00"), hours: "18:00-22:00".to_string() },
            normal: TouBand { rate: d("6.00"), hours: "06:00-18:00".to_string() },
            off_peak: TouBand { rate: d("4.00"), hours: "22:00-06:00".to_string() },
        });

        let published = db.publish_tariff_version(&with_tou).unwrap();
        let stored = db.get_tariff_version(published.id).unwrap().unwrap();

        assert_eq!(stored.time_of_use, with_tou.time_of_use);
    }

    #[test]
    fn test_insert_and_get_bill() {
        let db = create_test_db();
        let tariff = db.publish_tariff_version(&draft(Category::Residential, "2024-04-01", "5.00")).unwrap();

        let bill = db
            .insert_bill(&NewBill {
                account_number: "ACC-1001".to_string(),
                category: Category::Residential,
                tariff_version_id: tariff.id,
                billing_date: date("2024-05-01"),
                charge: sample_charge(),
            })
            .unwrap();

        let stored = db.get_bill(bill.id).unwrap().unwrap();
        assert_eq!(stored, bill);
        assert_eq!(stored.charge.total_amount, d("2447.03"));
        assert_eq!(stored.charge.tariff_slab_breakdown.len(), 3);
    }

    #[test]
    fn test_missing_bill() {
        assert!(create_test_db().get_bill(42).unwrap().is_none());
    }

    #[test]
    fn test_bills_for_account_newest_first() {
        let db = create_test_db();
        let tariff = db.publish_tariff_version(&draft(Category::Residential, "2024-04-01", "5.00")).unwrap();

        for (account, billed) in [("ACC-1", "2024-05-01"), ("ACC-1", "2024-06-01"), ("ACC-2", "2024-06-01")] {
            db.insert_bill(&NewBill {
                account_number: account.to_string(),
                category: Category::Residential,
                tariff_version_id: tariff.id,
                billing_date: date(billed),
                charge: sample_charge(),
            })
            .unwrap();
        }

        let bills = db.get_bills_for_account("ACC-1", None).unwrap();
        assert_eq!(bills.len(), 2);
        assert_eq!(bills[0].billing_date, date("2024-06-01"));

        assert_eq!(db.get_bills_for_account("ACC-1", Some(1)).unwrap().len(), 1);
        assert!(db.get_bills_for_account("ACC-3", None).unwrap().is_empty());
    }

    #[test]
    fn test_bill_requires_existing_tariff() {
        let db = create_test_db();

        let result = db.insert_bill(&NewBill {
            account_number: "ACC-1".to_string(),
            category: Category::Residential,
            tariff_version_id: 99,
            billing_date: date("2024-05-01"),
            charge: sample_charge(),
        });
        assert!(matches!(result, Err(Error::Database(_))));
    }
}
