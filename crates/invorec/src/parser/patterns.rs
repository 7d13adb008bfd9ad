//! Regex tables for invoice text and filename token recognition.

use lazy_static::lazy_static;
use regex::Regex;

/// Decimal amount token: optional space-grouped thousands, optional
/// comma or dot decimal part ("1 234,56", "1234.56", "30").
const NUM: &str = r"\d+(?:[ \u{00a0}]\d{3})*(?:[.,]\d{1,2})?";

fn labeled_amount(labels: &str) -> Regex {
    Regex::new(&format!(
        r"(?i)(?:{})\s*:?\s*(?:€|\$|£|EUR|USD|GBP|CHF)?\s*({})",
        labels, NUM
    ))
    .expect("labeled amount pattern is valid")
}

lazy_static! {
    // Date formats, tried in order.
    pub static ref DATE_NUMERIC: Regex =
        Regex::new(r"\b(\d{1,2})[./](\d{1,2})[./](\d{4})\b").unwrap();

    pub static ref DATE_MONTH_EN: Regex = Regex::new(
        r"(?i)\b(January|February|March|April|May|June|July|August|September|October|November|December)\s+(\d{1,2})(?:st|nd|rd|th)?,?\s+(\d{4})\b"
    ).unwrap();

    // Day-first word dates ("12 mars 2026", "1er avril 2026"); the month
    // word is resolved diacritic-insensitively against the French table.
    pub static ref DATE_MONTH_WORD: Regex =
        Regex::new(r"(?i)\b(\d{1,2})(?:er)?\s+(\p{L}+)\s+(\d{4})\b").unwrap();

    pub static ref DATE_ISO: Regex =
        Regex::new(r"\b(\d{4})-(\d{2})-(\d{2})\b").unwrap();

    // Amount labels, most semantically specific first.
    pub static ref AMOUNT_DUE: Regex = labeled_amount(
        r"amount\s+due|total\s+due|balance\s+due|montant\s+(?:dû|du|à\s+payer|a\s+payer)|total\s+ttc|total\s+incl(?:uding)?\.?\s*(?:tax|vat)?|total\s+toutes\s+taxes"
    );

    pub static ref NET_PAYABLE: Regex =
        labeled_amount(r"net\s+payable|net\s+à\s+payer|net\s+a\s+payer");

    pub static ref TOTAL_GENERIC: Regex = labeled_amount(r"total");

    // Bare currency-adjacent number, either notation order.
    pub static ref CURRENCY_AMOUNT: Regex = Regex::new(&format!(
        r"(?i)(?:[€$£]\s*({0})|({0})\s*(?:EUR|USD|GBP|CHF|€|\$|£))",
        NUM
    )).unwrap();

    // Optional percentage and mandatory amount near a VAT/TVA token.
    pub static ref TAX: Regex = Regex::new(&format!(
        r"(?i)(?:VAT|TVA)\s*(?:\(?\s*(\d{{1,2}}(?:[.,]\d{{1,2}})?)\s*%\s*\)?)?\s*:?\s*(?:€|\$|£)?\s*({})",
        NUM
    )).unwrap();

    pub static ref INVOICE_NUMBER: Regex =
        Regex::new(r"(?i)\b((?:INV|FACT|FA|F)[-_/.]?\d{3,}(?:[-/]\d+)*)").unwrap();

    // Structural words that disqualify a line as a vendor guess.
    pub static ref VENDOR_DENY: Regex = Regex::new(
        r"(?i)\b(invoice|facture|date|total|amount|montant|iban|bic|swift|tva|vat|tel|fax|email|page|due|payment|paiement|siret|siren|reference|devis|order)\b"
    ).unwrap();

    // Filename tokens.
    pub static ref FILENAME_DATE_ISO: Regex =
        Regex::new(r"(\d{4})[-_.](\d{1,2})[-_.](\d{1,2})").unwrap();

    pub static ref FILENAME_DATE_DMY: Regex =
        Regex::new(r"(\d{1,2})[-_.](\d{1,2})[-_.](\d{4})").unwrap();

    pub static ref FILENAME_DATE_COMPACT: Regex =
        Regex::new(r"(?:^|[^\d])(20\d{2})(\d{2})(\d{2})(?:[^\d]|$)").unwrap();

    pub static ref FILENAME_AMOUNT: Regex =
        Regex::new(r"(\d+[.,]\d{2})(?:\D|$)").unwrap();
}
