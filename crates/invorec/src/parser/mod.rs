//! Pure text-to-field parsing. No I/O; never errors — unparsable text
//! yields an empty field set.

pub mod patterns;

use chrono::NaiveDate;

/// Upper plausibility bound for recognized amounts. OCR misreads (merged
/// digit runs, dropped decimal separators) otherwise produce astronomical
/// values that would poison matching.
const MAX_PLAUSIBLE_AMOUNT: f64 = 1_000_000.0;

/// Number of leading non-trivial lines considered for the vendor guess.
const VENDOR_SCAN_LINES: usize = 10;

/// Vendor lines longer than this are headers or addresses, not names.
const MAX_VENDOR_CHARS: usize = 60;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParsedFields {
    pub date: Option<NaiveDate>,
    pub amount: Option<f64>,
    pub vendor: Option<String>,
    pub invoice_number: Option<String>,
    pub tax_amount: Option<f64>,
    pub tax_rate: Option<f64>,
}

impl ParsedFields {
    /// True when at least one monetary or calendar anchor was recovered.
    pub fn has_anchor(&self) -> bool {
        self.date.is_some() || self.amount.is_some()
    }
}

pub fn parse(text: &str) -> ParsedFields {
    let (tax_amount, tax_rate) = parse_tax(text);
    ParsedFields {
        date: parse_date(text),
        amount: parse_amount(text),
        vendor: guess_vendor(text),
        invoice_number: parse_invoice_number(text),
        tax_amount,
        tax_rate,
    }
}

/// Tries date formats in fixed order; the first calendar-valid hit wins.
pub fn parse_date(text: &str) -> Option<NaiveDate> {
    for caps in patterns::DATE_NUMERIC.captures_iter(text) {
        let day: u32 = caps[1].parse().unwrap_or(0);
        let month: u32 = caps[2].parse().unwrap_or(0);
        let year: i32 = caps[3].parse().unwrap_or(0);
        if let Some(date) = NaiveDate::from_ymd_opt(year, month, day) {
            return Some(date);
        }
    }

    for caps in patterns::DATE_MONTH_EN.captures_iter(text) {
        let month = english_month(&caps[1]);
        let day: u32 = caps[2].parse().unwrap_or(0);
        let year: i32 = caps[3].parse().unwrap_or(0);
        if let Some(date) =
            month.and_then(|month| NaiveDate::from_ymd_opt(year, month, day))
        {
            return Some(date);
        }
    }

    for caps in patterns::DATE_MONTH_WORD.captures_iter(text) {
        let day: u32 = caps[1].parse().unwrap_or(0);
        let month = french_month(&caps[2]);
        let year: i32 = caps[3].parse().unwrap_or(0);
        if let Some(date) =
            month.and_then(|month| NaiveDate::from_ymd_opt(year, month, day))
        {
            return Some(date);
        }
    }

    for caps in patterns::DATE_ISO.captures_iter(text) {
        let year: i32 = caps[1].parse().unwrap_or(0);
        let month: u32 = caps[2].parse().unwrap_or(0);
        let day: u32 = caps[3].parse().unwrap_or(0);
        if let Some(date) = NaiveDate::from_ymd_opt(year, month, day) {
            return Some(date);
        }
    }

    None
}

/// Prefers the most semantically specific amount label, falling back to a
/// bare currency-adjacent number.
pub fn parse_amount(text: &str) -> Option<f64> {
    for re in [
        &*patterns::AMOUNT_DUE,
        &*patterns::NET_PAYABLE,
        &*patterns::TOTAL_GENERIC,
    ] {
        for caps in re.captures_iter(text) {
            if let Some(amount) = caps.get(1).and_then(|m| parse_decimal(m.as_str())) {
                if plausible(amount) {
                    return Some(amount);
                }
            }
        }
    }

    for caps in patterns::CURRENCY_AMOUNT.captures_iter(text) {
        let token = caps.get(1).or_else(|| caps.get(2));
        if let Some(amount) = token.and_then(|m| parse_decimal(m.as_str())) {
            if plausible(amount) {
                return Some(amount);
            }
        }
    }

    None
}

/// Optional percentage and mandatory amount near a VAT/TVA token.
/// Returns (tax_amount, tax_rate).
pub fn parse_tax(text: &str) -> (Option<f64>, Option<f64>) {
    match patterns::TAX.captures(text) {
        Some(caps) => {
            let rate = caps.get(1).and_then(|m| parse_decimal(m.as_str()));
            let amount = caps
                .get(2)
                .and_then(|m| parse_decimal(m.as_str()))
                .filter(|a| plausible(*a));
            (amount, rate)
        }
        None => (None, None),
    }
}

/// First of the leading non-trivial lines that looks like a company name:
/// not purely numeric, not a structural word, short enough.
pub fn guess_vendor(text: &str) -> Option<String> {
    text.lines()
        .map(str::trim)
        .filter(|line| line.len() >= 3)
        .take(VENDOR_SCAN_LINES)
        .find(|line| {
            line.chars().count() < MAX_VENDOR_CHARS
                && line.chars().any(|c| c.is_alphabetic())
                && !patterns::VENDOR_DENY.is_match(line)
        })
        .map(|line| line.to_string())
}

pub fn parse_invoice_number(text: &str) -> Option<String> {
    patterns::INVOICE_NUMBER
        .captures(text)
        .map(|caps| caps[1].to_string())
}

fn plausible(amount: f64) -> bool {
    amount > 0.0 && amount < MAX_PLAUSIBLE_AMOUNT
}

/// Parses a decimal token in either convention ("1 234,56", "1,234.56",
/// "123.45", "30"). A lone separator followed by exactly three digits is
/// read as a thousands separator.
pub fn parse_decimal(raw: &str) -> Option<f64> {
    let cleaned: String = raw.chars().filter(|c| !c.is_whitespace()).collect();

    let sep = match (cleaned.rfind('.'), cleaned.rfind(',')) {
        (Some(dot), Some(comma)) => Some(dot.max(comma)),
        (Some(i), None) | (None, Some(i)) => {
            if cleaned.len() - i - 1 <= 2 {
                Some(i)
            } else {
                None
            }
        }
        (None, None) => None,
    };

    let (int_part, frac_part) = match sep {
        Some(i) => (&cleaned[..i], &cleaned[i + 1..]),
        None => (cleaned.as_str(), ""),
    };

    let int_digits: String = int_part.chars().filter(|c| c.is_ascii_digit()).collect();
    if int_digits.is_empty() {
        return None;
    }
    let frac_digits: String = frac_part.chars().filter(|c| c.is_ascii_digit()).collect();

    format!(
        "{}.{}",
        int_digits,
        if frac_digits.is_empty() { "0" } else { &frac_digits }
    )
    .parse()
    .ok()
}

fn english_month(word: &str) -> Option<u32> {
    match word.to_ascii_lowercase().as_str() {
        "january" => Some(1),
        "february" => Some(2),
        "march" => Some(3),
        "april" => Some(4),
        "may" => Some(5),
        "june" => Some(6),
        "july" => Some(7),
        "august" => Some(8),
        "september" => Some(9),
        "october" => Some(10),
        "november" => Some(11),
        "december" => Some(12),
        _ => None,
    }
}

fn french_month(word: &str) -> Option<u32> {
    match strip_diacritics(word).to_lowercase().as_str() {
        "janvier" => Some(1),
        "fevrier" => Some(2),
        "mars" => Some(3),
        "avril" => Some(4),
        "mai" => Some(5),
        "juin" => Some(6),
        "juillet" => Some(7),
        "aout" => Some(8),
        "septembre" => Some(9),
        "octobre" => Some(10),
        "novembre" => Some(11),
        "decembre" => Some(12),
        _ => None,
    }
}

/// Folds the accented characters that occur in French month names down to
/// ASCII so OCR output with or without diacritics resolves identically.
fn strip_diacritics(word: &str) -> String {
    word.chars()
        .map(|c| match c {
            'à' | 'â' | 'ä' | 'À' | 'Â' | 'Ä' => 'a',
            'é' | 'è' | 'ê' | 'ë' | 'É' | 'È' | 'Ê' | 'Ë' => 'e',
            'î' | 'ï' | 'Î' | 'Ï' => 'i',
            'ô' | 'ö' | 'Ô' | 'Ö' => 'o',
            'û' | 'ü' | 'ù' | 'Û' | 'Ü' | 'Ù' => 'u',
            'ç' | 'Ç' => 'c',
            other => other,
        })
        .collect()
}
