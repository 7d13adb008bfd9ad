//! Invoice cache collaborator: one row per remote file ever scanned,
//! unique per (scope, file id). The cache is what makes scans
//! idempotent — a file with a row is never re-processed unless the
//! scope is explicitly force-cleared.

use std::collections::HashMap;
use std::sync::RwLock;

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;

use crate::db::{invoice_repo, Database, DatabaseError};
use crate::drive::RemoteFile;
use crate::extract::{ExtractedInvoice, ExtractionMethod};
use crate::matching::MatchDecision;
use crate::scope::Scope;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CachedInvoiceRecord {
    pub file_id: String,
    pub file_name: String,
    pub scope: Scope,
    pub vendor: Option<String>,
    pub amount: Option<f64>,
    pub date: Option<NaiveDate>,
    pub invoice_number: Option<String>,
    pub tax_amount: Option<f64>,
    pub tax_rate: Option<f64>,
    pub raw_text: Option<String>,
    pub extraction_method: ExtractionMethod,
    pub transaction_id: Option<String>,
    pub match_confidence: Option<f64>,
    pub scanned_at: DateTime<Utc>,
}

impl CachedInvoiceRecord {
    /// Folds one extraction result and its match decision into the row
    /// that gets persisted.
    pub fn from_extraction(
        scope: &Scope,
        file: &RemoteFile,
        invoice: &ExtractedInvoice,
        decision: &MatchDecision,
        scanned_at: DateTime<Utc>,
    ) -> Self {
        Self {
            file_id: file.id.clone(),
            file_name: file.name.clone(),
            scope: scope.clone(),
            vendor: invoice.vendor.clone(),
            amount: invoice.amount,
            date: invoice.date,
            invoice_number: invoice.invoice_number.clone(),
            tax_amount: invoice.tax_amount,
            tax_rate: invoice.tax_rate,
            raw_text: invoice.raw_text.clone(),
            extraction_method: invoice.extraction_method,
            transaction_id: decision.transaction_id.clone(),
            match_confidence: decision.confidence(),
            scanned_at,
        }
    }
}

/// Cache store collaborator interface. Rows are created once; after
/// creation only the transaction link may change.
pub trait CacheStore: Send + Sync {
    fn exists(&self, scope: &Scope, file_id: &str) -> Result<bool, DatabaseError>;

    fn insert(&self, record: &CachedInvoiceRecord) -> Result<(), DatabaseError>;

    /// Purges every row in the scope (forced re-scan); returns the
    /// number removed.
    fn delete_by_scope(&self, scope: &Scope) -> Result<usize, DatabaseError>;

    fn link_transaction(
        &self,
        scope: &Scope,
        file_id: &str,
        transaction_id: &str,
        confidence: f64,
    ) -> Result<(), DatabaseError>;

    fn unlink_transaction(&self, scope: &Scope, file_id: &str) -> Result<(), DatabaseError>;

    /// Read path for the reporting layer.
    fn list_by_scope(&self, scope: &Scope) -> Result<Vec<CachedInvoiceRecord>, DatabaseError>;
}

/// Production cache store over the sqlite database.
#[derive(Clone)]
pub struct SqliteCacheStore {
    db: Database,
}

impl SqliteCacheStore {
    pub fn new(db: Database) -> Self {
        Self { db }
    }
}

impl CacheStore for SqliteCacheStore {
    fn exists(&self, scope: &Scope, file_id: &str) -> Result<bool, DatabaseError> {
        invoice_repo::exists(&self.db, &scope.key(), file_id)
    }

    fn insert(&self, record: &CachedInvoiceRecord) -> Result<(), DatabaseError> {
        invoice_repo::insert(&self.db, record)
    }

    fn delete_by_scope(&self, scope: &Scope) -> Result<usize, DatabaseError> {
        invoice_repo::delete_by_scope(&self.db, &scope.key())
    }

    fn link_transaction(
        &self,
        scope: &Scope,
        file_id: &str,
        transaction_id: &str,
        confidence: f64,
    ) -> Result<(), DatabaseError> {
        invoice_repo::set_transaction(
            &self.db,
            &scope.key(),
            file_id,
            Some((transaction_id, confidence)),
        )?;
        Ok(())
    }

    fn unlink_transaction(&self, scope: &Scope, file_id: &str) -> Result<(), DatabaseError> {
        invoice_repo::set_transaction(&self.db, &scope.key(), file_id, None)?;
        Ok(())
    }

    fn list_by_scope(&self, scope: &Scope) -> Result<Vec<CachedInvoiceRecord>, DatabaseError> {
        invoice_repo::list_by_scope(&self.db, &scope.key())
    }
}

/// In-memory cache store for tests and embedders that do not want a
/// database file.
#[derive(Default)]
pub struct MemoryCacheStore {
    rows: RwLock<HashMap<(String, String), CachedInvoiceRecord>>,
}

impl MemoryCacheStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl CacheStore for MemoryCacheStore {
    fn exists(&self, scope: &Scope, file_id: &str) -> Result<bool, DatabaseError> {
        let rows = self.rows.read().map_err(|_| DatabaseError::LockPoisoned)?;
        Ok(rows.contains_key(&(scope.key(), file_id.to_string())))
    }

    fn insert(&self, record: &CachedInvoiceRecord) -> Result<(), DatabaseError> {
        let mut rows = self.rows.write().map_err(|_| DatabaseError::LockPoisoned)?;
        rows.insert(
            (record.scope.key(), record.file_id.clone()),
            record.clone(),
        );
        Ok(())
    }

    fn delete_by_scope(&self, scope: &Scope) -> Result<usize, DatabaseError> {
        let mut rows = self.rows.write().map_err(|_| DatabaseError::LockPoisoned)?;
        let key = scope.key();
        let before = rows.len();
        rows.retain(|(scope_key, _), _| *scope_key != key);
        Ok(before - rows.len())
    }

    fn link_transaction(
        &self,
        scope: &Scope,
        file_id: &str,
        transaction_id: &str,
        confidence: f64,
    ) -> Result<(), DatabaseError> {
        let mut rows = self.rows.write().map_err(|_| DatabaseError::LockPoisoned)?;
        if let Some(row) = rows.get_mut(&(scope.key(), file_id.to_string())) {
            row.transaction_id = Some(transaction_id.to_string());
            row.match_confidence = Some(confidence);
        }
        Ok(())
    }

    fn unlink_transaction(&self, scope: &Scope, file_id: &str) -> Result<(), DatabaseError> {
        let mut rows = self.rows.write().map_err(|_| DatabaseError::LockPoisoned)?;
        if let Some(row) = rows.get_mut(&(scope.key(), file_id.to_string())) {
            row.transaction_id = None;
            row.match_confidence = None;
        }
        Ok(())
    }

    fn list_by_scope(&self, scope: &Scope) -> Result<Vec<CachedInvoiceRecord>, DatabaseError> {
        let rows = self.rows.read().map_err(|_| DatabaseError::LockPoisoned)?;
        let key = scope.key();
        Ok(rows
            .iter()
            .filter(|((scope_key, _), _)| *scope_key == key)
            .map(|(_, record)| record.clone())
            .collect())
    }
}
