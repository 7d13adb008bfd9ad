//! Invoice cache repository — CRUD operations for the `invoice_cache` table.

use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::{params, Row};

use super::{Database, DatabaseError};
use crate::cache::CachedInvoiceRecord;
use crate::extract::ExtractionMethod;
use crate::scope::Scope;

fn record_from_row(row: &Row<'_>) -> Result<CachedInvoiceRecord, rusqlite::Error> {
    let user_id: String = row.get("user_id")?;
    let company_id: Option<String> = row.get("company_id")?;
    let method: String = row.get("extraction_method")?;
    let date: Option<String> = row.get("invoice_date")?;
    let scanned_at: String = row.get("scanned_at")?;

    Ok(CachedInvoiceRecord {
        file_id: row.get("file_id")?,
        file_name: row.get("file_name")?,
        scope: Scope {
            user_id,
            company_id,
        },
        vendor: row.get("vendor")?,
        amount: row.get("amount")?,
        date: date.and_then(|d| NaiveDate::parse_from_str(&d, "%Y-%m-%d").ok()),
        invoice_number: row.get("invoice_number")?,
        tax_amount: row.get("tax_amount")?,
        tax_rate: row.get("tax_rate")?,
        raw_text: row.get("raw_text")?,
        extraction_method: parse_method(&method),
        transaction_id: row.get("transaction_id")?,
        match_confidence: row.get("match_confidence")?,
        scanned_at: parse_timestamp(&scanned_at),
    })
}

fn parse_method(s: &str) -> ExtractionMethod {
    s.parse().unwrap_or_else(|_| {
        log::warn!("Unknown extraction method '{}', defaulting to filename", s);
        ExtractionMethod::Filename
    })
}

fn parse_timestamp(s: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|e| {
            log::warn!("Failed to parse timestamp '{}': {}", s, e);
            Utc::now()
        })
}

/// Inserts a new cache row. Fails on a (scope, file) duplicate — the
/// orchestrator checks `exists` first.
pub fn insert(db: &Database, record: &CachedInvoiceRecord) -> Result<(), DatabaseError> {
    db.with_conn(|conn| {
        conn.execute(
            "INSERT INTO invoice_cache (scope_key, file_id, file_name, user_id, company_id,
             vendor, amount, invoice_date, invoice_number, tax_amount, tax_rate, raw_text,
             extraction_method, transaction_id, match_confidence, scanned_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16)",
            params![
                record.scope.key(),
                record.file_id,
                record.file_name,
                record.scope.user_id,
                record.scope.company_id,
                record.vendor,
                record.amount,
                record.date.map(|d| d.format("%Y-%m-%d").to_string()),
                record.invoice_number,
                record.tax_amount,
                record.tax_rate,
                record.raw_text,
                record.extraction_method.as_str(),
                record.transaction_id,
                record.match_confidence,
                record.scanned_at.to_rfc3339(),
            ],
        )?;
        Ok(())
    })
}

pub fn exists(db: &Database, scope_key: &str, file_id: &str) -> Result<bool, DatabaseError> {
    db.with_conn(|conn| {
        let count: u32 = conn.query_row(
            "SELECT COUNT(*) FROM invoice_cache WHERE scope_key = ?1 AND file_id = ?2",
            params![scope_key, file_id],
            |r| r.get(0),
        )?;
        Ok(count > 0)
    })
}

/// Removes every cache row in the scope; returns the number removed.
pub fn delete_by_scope(db: &Database, scope_key: &str) -> Result<usize, DatabaseError> {
    db.with_conn(|conn| {
        let deleted = conn.execute(
            "DELETE FROM invoice_cache WHERE scope_key = ?1",
            params![scope_key],
        )?;
        Ok(deleted)
    })
}

/// Sets or clears the linked transaction on one cache row. The only
/// mutation a row sees after creation.
pub fn set_transaction(
    db: &Database,
    scope_key: &str,
    file_id: &str,
    link: Option<(&str, f64)>,
) -> Result<bool, DatabaseError> {
    db.with_conn(|conn| {
        let (transaction_id, confidence) = match link {
            Some((id, confidence)) => (Some(id), Some(confidence)),
            None => (None, None),
        };
        let changed = conn.execute(
            "UPDATE invoice_cache SET transaction_id = ?3, match_confidence = ?4
             WHERE scope_key = ?1 AND file_id = ?2",
            params![scope_key, file_id, transaction_id, confidence],
        )?;
        Ok(changed > 0)
    })
}

pub fn list_by_scope(
    db: &Database,
    scope_key: &str,
) -> Result<Vec<CachedInvoiceRecord>, DatabaseError> {
    db.with_conn(|conn| {
        let mut stmt = conn.prepare(
            "SELECT * FROM invoice_cache WHERE scope_key = ?1 ORDER BY scanned_at DESC",
        )?;
        let rows = stmt.query_map(params![scope_key], record_from_row)?;
        let mut records = Vec::new();
        for row in rows {
            records.push(row?);
        }
        Ok(records)
    })
}
