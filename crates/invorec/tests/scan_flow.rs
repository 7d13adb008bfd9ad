//! End-to-end scan behavior over fake collaborators: idempotence,
//! forced re-scan, extraction fallback order, partial failure isolation
//! and the matching decision flow.

mod common;

use std::sync::Arc;

use chrono::NaiveDate;

use common::{rich_invoice_text_layer, FakeDrive, FakeTransactions};
use invorec::extract::remote_ocr::RemoteOcrTier;
use invorec::extract::text_layer::TextLayerTier;
use invorec::{
    CacheStore, Config, ExtractionMethod, ExtractionPipeline, MemoryCacheStore, ScanOptions,
    ScanOrchestrator, ScanStatus, Scope, TransactionCandidate,
};

fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn build_orchestrator(
    drive: Arc<FakeDrive>,
    cache: Arc<MemoryCacheStore>,
    transactions: Arc<FakeTransactions>,
    config: Config,
) -> ScanOrchestrator {
    // Hermetic pipeline: text layer plus remote OCR. The local OCR tier
    // depends on host tools and has its own unit tests.
    let pipeline = ExtractionPipeline::new(
        vec![
            Box::new(TextLayerTier::new(config.extraction.min_text_layer_chars)),
            Box::new(RemoteOcrTier::new(drive.clone())),
        ],
        config.scan.raw_text_limit,
    );

    ScanOrchestrator::new(drive, cache, transactions, config).with_pipeline(pipeline)
}

fn config_with_root() -> Config {
    let mut config = Config::default();
    config.scan.root_folder_id = Some("root".to_string());
    config
}

async fn run_scan(orchestrator: &ScanOrchestrator, scope: &Scope, options: ScanOptions) -> invorec::ScanJob {
    let handle = orchestrator.start_scan(scope.clone(), options);
    handle.task.await.unwrap();
    orchestrator.job_status(&handle.job_id).unwrap()
}

#[tokio::test]
async fn test_scan_is_idempotent_without_force() {
    let mut drive = FakeDrive::default();
    for i in 0..3 {
        drive.add_file(
            &format!("f{}", i),
            &format!("invoice-{}.pdf", i),
            rich_invoice_text_layer(),
        );
    }
    let drive = Arc::new(drive);
    let cache = Arc::new(MemoryCacheStore::new());
    let orchestrator = build_orchestrator(
        drive,
        cache.clone(),
        Arc::new(FakeTransactions::default()),
        config_with_root(),
    );
    let scope = Scope::personal("1");

    let first = run_scan(&orchestrator, &scope, ScanOptions::default()).await;
    assert_eq!(first.status, ScanStatus::Done);
    assert_eq!(first.total, 3);
    assert_eq!(first.processed, 3);
    assert_eq!(first.scanned, 3);

    // Second run over the unchanged folder: everything already cached.
    let second = run_scan(&orchestrator, &scope, ScanOptions::default()).await;
    assert_eq!(second.status, ScanStatus::Done);
    assert_eq!(second.processed, second.total);
    assert_eq!(second.scanned, 0);

    assert_eq!(cache.list_by_scope(&scope).unwrap().len(), 3);
}

#[tokio::test]
async fn test_force_rescan_purges_and_reprocesses() {
    let mut drive = FakeDrive::default();
    drive.add_file("f1", "invoice.pdf", rich_invoice_text_layer());
    let drive = Arc::new(drive);
    let cache = Arc::new(MemoryCacheStore::new());
    let orchestrator = build_orchestrator(
        drive,
        cache.clone(),
        Arc::new(FakeTransactions::default()),
        config_with_root(),
    );
    let scope = Scope::personal("1");

    let first = run_scan(&orchestrator, &scope, ScanOptions::default()).await;
    assert_eq!(first.scanned, 1);

    let forced = run_scan(
        &orchestrator,
        &scope,
        ScanOptions {
            force_rescan: true,
            folder_override: None,
        },
    )
    .await;
    assert_eq!(forced.status, ScanStatus::Done);
    assert_eq!(forced.scanned, 1);
    assert_eq!(cache.list_by_scope(&scope).unwrap().len(), 1);
}

#[tokio::test]
async fn test_single_file_failure_does_not_abort_the_job() {
    let mut drive = FakeDrive::default();
    for i in 0..10 {
        drive.add_file(
            &format!("f{}", i),
            &format!("doc-{}.pdf", i),
            rich_invoice_text_layer(),
        );
    }
    drive.fail_downloads.insert("f4".to_string());
    let drive = Arc::new(drive);
    let cache = Arc::new(MemoryCacheStore::new());
    let orchestrator = build_orchestrator(
        drive,
        cache.clone(),
        Arc::new(FakeTransactions::default()),
        config_with_root(),
    );
    let scope = Scope::personal("1");

    let job = run_scan(&orchestrator, &scope, ScanOptions::default()).await;

    assert_eq!(job.status, ScanStatus::Done);
    assert_eq!(job.total, 10);
    assert_eq!(job.processed, 10);
    assert_eq!(job.scanned, 9);
    assert_eq!(job.errors.len(), 1);
    assert!(job.errors[0].contains("doc-4.pdf"));
    assert_eq!(cache.list_by_scope(&scope).unwrap().len(), 9);
}

#[tokio::test]
async fn test_text_layer_file_never_reaches_ocr_tiers() {
    let mut drive = FakeDrive::default();
    drive.add_file("f1", "invoice.pdf", rich_invoice_text_layer());
    // Even with recognition text scripted, the remote tier must not run.
    drive
        .recognized
        .insert("f1".to_string(), "should never be used".to_string());
    let drive = Arc::new(drive);
    let cache = Arc::new(MemoryCacheStore::new());
    let orchestrator = build_orchestrator(
        drive.clone(),
        cache.clone(),
        Arc::new(FakeTransactions::default()),
        config_with_root(),
    );
    let scope = Scope::personal("1");

    run_scan(&orchestrator, &scope, ScanOptions::default()).await;

    let rows = cache.list_by_scope(&scope).unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].extraction_method, ExtractionMethod::TextLayer);
    assert_eq!(rows[0].amount, Some(42.0));
    assert_eq!(drive.copy_count(), 0);
}

#[tokio::test]
async fn test_scanned_image_falls_through_to_remote_ocr() {
    let mut drive = FakeDrive::default();
    drive.add_file("s1", "receipt-scan.pdf", b"jpeg bytes, no pdf structure".to_vec());
    drive.recognized.insert(
        "s1".to_string(),
        "Garage Dupont\n15 janvier 2026\nTotal: 88,20 EUR".to_string(),
    );
    let drive = Arc::new(drive);
    let cache = Arc::new(MemoryCacheStore::new());
    let orchestrator = build_orchestrator(
        drive.clone(),
        cache.clone(),
        Arc::new(FakeTransactions::default()),
        config_with_root(),
    );
    let scope = Scope::personal("1");

    let job = run_scan(&orchestrator, &scope, ScanOptions::default()).await;
    assert_eq!(job.status, ScanStatus::Done);

    let rows = cache.list_by_scope(&scope).unwrap();
    assert_eq!(rows[0].extraction_method, ExtractionMethod::RemoteOcr);
    assert_eq!(rows[0].vendor.as_deref(), Some("Garage Dupont"));
    assert_eq!(rows[0].amount, Some(88.20));
    assert_eq!(rows[0].date, Some(ymd(2026, 1, 15)));

    // The temporary recognition copy was cleaned up.
    assert_eq!(*drive.deleted.lock().unwrap(), vec!["tmp-s1".to_string()]);
}

#[tokio::test]
async fn test_end_to_end_french_invoice_matches_transaction() {
    let mut drive = FakeDrive::default();
    drive.add_file("s1", "scan001.pdf", b"scanned image".to_vec());
    drive.recognized.insert(
        "s1".to_string(),
        "Acme Fournitures\n42 rue des Lilas, 75011 Paris\nFacture F20260312\n\
         12 mars 2026\nTVA 20% : 20,58\nTotal TTC: 123,45 EUR\n\
         Merci de votre confiance."
            .to_string(),
    );
    let drive = Arc::new(drive);
    let cache = Arc::new(MemoryCacheStore::new());

    let transactions = Arc::new(FakeTransactions {
        candidates: vec![
            TransactionCandidate {
                id: "txn-acme".to_string(),
                label: "ACME FOURNITURES PRLV".to_string(),
                amount: -123.45,
                date: ymd(2026, 3, 13),
            },
            TransactionCandidate {
                id: "txn-other".to_string(),
                label: "SUPERMARKET".to_string(),
                amount: -57.80,
                date: ymd(2026, 3, 10),
            },
        ],
        ..Default::default()
    });

    let orchestrator = build_orchestrator(drive, cache.clone(), transactions, config_with_root());
    let scope = Scope::personal("1");

    let job = run_scan(&orchestrator, &scope, ScanOptions::default()).await;
    assert_eq!(job.status, ScanStatus::Done);
    assert_eq!(job.matched, 1);

    let rows = cache.list_by_scope(&scope).unwrap();
    let row = &rows[0];
    assert_eq!(row.vendor.as_deref(), Some("Acme Fournitures"));
    assert_eq!(row.amount, Some(123.45));
    assert_eq!(row.date, Some(ymd(2026, 3, 12)));
    assert_eq!(row.invoice_number.as_deref(), Some("F20260312"));
    assert_eq!(row.transaction_id.as_deref(), Some("txn-acme"));
    assert!(row.match_confidence.unwrap() >= 0.9);
}

#[tokio::test]
async fn test_weak_candidate_is_cached_unmatched() {
    let mut drive = FakeDrive::default();
    drive.add_file("s1", "scan001.pdf", b"scanned image".to_vec());
    drive.recognized.insert(
        "s1".to_string(),
        "Acme Fournitures\n12 mars 2026\nTotal TTC: 123,45 EUR".to_string(),
    );
    let drive = Arc::new(drive);
    let cache = Arc::new(MemoryCacheStore::new());

    // Amount matches exactly (50) but the date is 24 days off (3) and the
    // label is unrelated (0): 53 does not clear the threshold.
    let transactions = Arc::new(FakeTransactions {
        candidates: vec![TransactionCandidate {
            id: "txn-weak".to_string(),
            label: "UNRELATED VENDOR".to_string(),
            amount: -123.45,
            date: ymd(2026, 4, 5),
        }],
        ..Default::default()
    });

    let orchestrator = build_orchestrator(drive, cache.clone(), transactions, config_with_root());
    let scope = Scope::personal("1");

    let job = run_scan(&orchestrator, &scope, ScanOptions::default()).await;
    assert_eq!(job.status, ScanStatus::Done);
    assert_eq!(job.matched, 0);

    let rows = cache.list_by_scope(&scope).unwrap();
    assert_eq!(rows[0].transaction_id, None);
    assert_eq!(rows[0].match_confidence, None);
}

#[tokio::test]
async fn test_excluded_labels_never_match() {
    let mut drive = FakeDrive::default();
    drive.add_file("s1", "scan001.pdf", b"scanned image".to_vec());
    drive.recognized.insert(
        "s1".to_string(),
        "Acme Fournitures\n12 mars 2026\nTotal TTC: 123,45 EUR".to_string(),
    );
    let drive = Arc::new(drive);
    let cache = Arc::new(MemoryCacheStore::new());

    // A perfect candidate whose label is on the exclusion list.
    let transactions = Arc::new(FakeTransactions {
        candidates: vec![TransactionCandidate {
            id: "txn-agg".to_string(),
            label: "ACME FOURNITURES AGGREGATE".to_string(),
            amount: -123.45,
            date: ymd(2026, 3, 13),
        }],
        ..Default::default()
    });

    let mut config = config_with_root();
    config.matching.exclude_labels = vec!["AGGREGATE".to_string()];

    let orchestrator = build_orchestrator(drive, cache.clone(), transactions, config);
    let scope = Scope::personal("1");

    let job = run_scan(&orchestrator, &scope, ScanOptions::default()).await;
    assert_eq!(job.matched, 0);
    assert_eq!(
        cache.list_by_scope(&scope).unwrap()[0].transaction_id,
        None
    );
}

#[tokio::test]
async fn test_already_linked_transactions_are_excluded() {
    let mut drive = FakeDrive::default();
    drive.add_file("s1", "scan001.pdf", b"scanned image".to_vec());
    drive.recognized.insert(
        "s1".to_string(),
        "Acme Fournitures\n12 mars 2026\nTotal TTC: 123,45 EUR".to_string(),
    );
    let drive = Arc::new(drive);
    let cache = Arc::new(MemoryCacheStore::new());

    let mut transactions = FakeTransactions {
        candidates: vec![TransactionCandidate {
            id: "txn-linked".to_string(),
            label: "ACME FOURNITURES PRLV".to_string(),
            amount: -123.45,
            date: ymd(2026, 3, 13),
        }],
        ..Default::default()
    };
    transactions.linked.insert("txn-linked".to_string());

    let orchestrator = build_orchestrator(
        drive,
        cache.clone(),
        Arc::new(transactions),
        config_with_root(),
    );
    let scope = Scope::personal("1");

    let job = run_scan(&orchestrator, &scope, ScanOptions::default()).await;
    assert_eq!(job.matched, 0);
}

#[tokio::test]
async fn test_scopes_are_isolated() {
    let mut drive = FakeDrive::default();
    drive.add_file("f1", "invoice.pdf", rich_invoice_text_layer());
    let drive = Arc::new(drive);
    let cache = Arc::new(MemoryCacheStore::new());
    let orchestrator = build_orchestrator(
        drive,
        cache.clone(),
        Arc::new(FakeTransactions::default()),
        config_with_root(),
    );

    let personal = Scope::personal("1");
    let company = Scope::company("1", "7");

    let first = run_scan(&orchestrator, &personal, ScanOptions::default()).await;
    assert_eq!(first.scanned, 1);

    // The same file is unseen in the narrowed scope.
    let second = run_scan(&orchestrator, &company, ScanOptions::default()).await;
    assert_eq!(second.scanned, 1);

    assert_eq!(cache.list_by_scope(&personal).unwrap().len(), 1);
    assert_eq!(cache.list_by_scope(&company).unwrap().len(), 1);
}
