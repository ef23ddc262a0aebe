//! Service-type-agnostic field extraction.
//!
//! Every field extractor is independent and tolerant: a failed match
//! leaves its key absent rather than erroring, so partial extraction is
//! always possible.

use crate::types::{keys, AttributeRecord};
use chrono::NaiveDate;
use regex::Regex;
use std::sync::LazyLock;

/// Folio patterns tried against the subject line, most specific first.
/// The first matching pattern wins; later patterns are not consulted.
static FOLIO_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"(?i)Nro\.?\s*(\d+)",
        r"N[°º]\s*(\d+)",
        r"(?i)Boleta\s+(\d{5,})",
    ]
    .into_iter()
    .map(|p| Regex::new(p).unwrap())
    .collect()
});

static CUSTOMER_NUMBER: LazyLock<Regex> = LazyLock::new(|| {
    // "de" is optional: providers write both "Número de Cliente" and
    // "Número Cliente"; values may carry a check digit (12345-6).
    Regex::new(r"(?i)N[úu]mero\s+(?:de\s+)?(?:Cliente|Cuenta)\s*:?\s*(\d[\dA-Za-z]*(?:-[\dA-Za-z])?)")
        .unwrap()
});

static ADDRESS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(?:Direcci[óo]n|Domicilio)\s*:\s*([^\n]+)").unwrap()
});

static TOTAL_AMOUNT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)Total\s+a\s+pagar\s*:?\s*\$?\s*(\d[\d.,]*)").unwrap()
});

static BILLING_PERIOD: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)Per[íi]odo\s+de\s+(?:Facturaci[óo]n|consumo)\s*:?\s*(\d{1,2}/\d{1,2}/\d{2,4})\s+al\s+(\d{1,2}/\d{1,2}/\d{2,4})",
    )
    .unwrap()
});

static DUE_DATE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)Fecha\s+de\s+vencimiento\s*:?\s*(\d{1,2}/\d{1,2}/\d{2,4})").unwrap()
});

static ANY_DATE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(\d{1,2}/\d{1,2}/\d{2,4})\b").unwrap());

/// Apply the generic patterns to one message.
///
/// The returned record is partial by design: provider-specific keys are
/// never produced here, and header-derived fields are the router's job.
#[must_use]
pub fn extract_generic(subject: &str, body: &str) -> AttributeRecord {
    let mut record = AttributeRecord::new();

    if let Some(folio) = folio_from_subject(subject) {
        record.insert(keys::FOLIO, folio);
    }

    if let Some(caps) = CUSTOMER_NUMBER.captures(body) {
        record.insert(keys::CUSTOMER_NUMBER, caps[1].to_string());
    }

    if let Some(caps) = ADDRESS.captures(body) {
        record.insert(keys::ADDRESS, caps[1].trim().to_string());
    }

    if let Some(amount) = TOTAL_AMOUNT
        .captures(body)
        .and_then(|caps| parse_amount(&caps[1]))
    {
        record.insert(keys::TOTAL_AMOUNT, amount);
    }

    if let Some(caps) = BILLING_PERIOD.captures(body) {
        if let Some(start) = parse_dmy(&caps[1]) {
            record.insert(keys::BILLING_PERIOD_START, start);
        }
        if let Some(end) = parse_dmy(&caps[2]) {
            record.insert(keys::BILLING_PERIOD_END, end);
        }
    } else if let Some((start, end)) = first_two_dates(body) {
        // No labeled period: guess from the first two dates in the
        // body. Provider extractors clear this where the guess is
        // known to be wrong.
        record.insert(keys::BILLING_PERIOD_START, start);
        record.insert(keys::BILLING_PERIOD_END, end);
    }

    if let Some(due) = DUE_DATE.captures(body).and_then(|caps| parse_dmy(&caps[1])) {
        record.insert(keys::DUE_DATE, due);
    }

    record
}

fn folio_from_subject(subject: &str) -> Option<String> {
    FOLIO_PATTERNS
        .iter()
        .find_map(|re| re.captures(subject))
        .map(|caps| caps[1].to_string())
}

fn first_two_dates(body: &str) -> Option<(NaiveDate, NaiveDate)> {
    let mut dates = ANY_DATE
        .find_iter(body)
        .filter_map(|m| parse_dmy(m.as_str()));
    let first = dates.next()?;
    let second = dates.next()?;
    Some((first, second))
}

/// Parse a day/month/year date as the providers print them
/// (`05/01/2026`, `5/1/26`).
#[must_use]
pub(crate) fn parse_dmy(s: &str) -> Option<NaiveDate> {
    let mut parts = s.trim().splitn(3, '/');
    let day: u32 = parts.next()?.parse().ok()?;
    let month: u32 = parts.next()?.parse().ok()?;
    let year: i32 = parts.next()?.parse().ok()?;
    let year = if year < 100 { year + 2000 } else { year };
    NaiveDate::from_ymd_opt(year, month, day)
}

/// Parse a peso amount, tolerating dot or comma thousands separators.
/// Chilean peso amounts carry no decimal part.
#[must_use]
pub(crate) fn parse_amount(s: &str) -> Option<i64> {
    let digits: String = s.chars().filter(char::is_ascii_digit).collect();
    if digits.is_empty() {
        return None;
    }
    digits.parse().ok()
}
