//! Filename heuristics: the always-available first tier. Cheap, no I/O;
//! seeds defaults that any later tier may override.

use chrono::NaiveDate;

use crate::extract::{ExtractedInvoice, ExtractionMethod};
use crate::parser::{self, patterns};

pub fn extract(filename: &str) -> ExtractedInvoice {
    let stem = filename
        .rsplit_once('.')
        .map(|(stem, _ext)| stem)
        .unwrap_or(filename);

    ExtractedInvoice {
        vendor: vendor_guess(stem),
        amount: amount_token(stem),
        date: date_token(stem),
        invoice_number: patterns::INVOICE_NUMBER
            .captures(stem)
            .map(|caps| caps[1].to_string()),
        tax_amount: None,
        tax_rate: None,
        raw_text: None,
        extraction_method: ExtractionMethod::Filename,
    }
}

fn date_token(stem: &str) -> Option<NaiveDate> {
    if let Some(caps) = patterns::FILENAME_DATE_ISO.captures(stem) {
        let year: i32 = caps[1].parse().unwrap_or(0);
        let month: u32 = caps[2].parse().unwrap_or(0);
        let day: u32 = caps[3].parse().unwrap_or(0);
        if let Some(date) = NaiveDate::from_ymd_opt(year, month, day) {
            return Some(date);
        }
    }

    if let Some(caps) = patterns::FILENAME_DATE_DMY.captures(stem) {
        let day: u32 = caps[1].parse().unwrap_or(0);
        let month: u32 = caps[2].parse().unwrap_or(0);
        let year: i32 = caps[3].parse().unwrap_or(0);
        if let Some(date) = NaiveDate::from_ymd_opt(year, month, day) {
            return Some(date);
        }
    }

    if let Some(caps) = patterns::FILENAME_DATE_COMPACT.captures(stem) {
        let year: i32 = caps[1].parse().unwrap_or(0);
        let month: u32 = caps[2].parse().unwrap_or(0);
        let day: u32 = caps[3].parse().unwrap_or(0);
        if let Some(date) = NaiveDate::from_ymd_opt(year, month, day) {
            return Some(date);
        }
    }

    None
}

fn amount_token(stem: &str) -> Option<f64> {
    patterns::FILENAME_AMOUNT
        .captures(stem)
        .and_then(|caps| parser::parse_decimal(&caps[1]))
        .filter(|amount| *amount > 0.0)
}

/// The stem with digit runs and separators stripped; what remains is
/// usually the vendor ("acme_invoice-2026.pdf" -> "acme invoice").
fn vendor_guess(stem: &str) -> Option<String> {
    let cleaned: String = stem
        .chars()
        .map(|c| {
            if c.is_ascii_digit() || c == '-' || c == '_' || c == '.' {
                ' '
            } else {
                c
            }
        })
        .collect();

    let words: Vec<&str> = cleaned.split_whitespace().collect();
    if words.is_empty() {
        return None;
    }

    let guess = words.join(" ");
    if guess.len() < 3 || guess.chars().count() >= 60 {
        return None;
    }
    Some(guess)
}
