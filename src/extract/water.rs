//! Water-provider layout (Aguas Andinas).
//!
//! These emails render a two-column table whose right-hand column
//! collapses into one packed paragraph when the HTML is flattened:
//! every value ends up concatenated in the fixed order
//! `ADDRESS ACCOUNT_NUMBER DATE_START al DATE_END`. The generic
//! label-based pass reads the wrong column there, so the packed string
//! is split here and its pieces override the generic values.

use super::generic::parse_dmy;
use super::TypedExtractor;
use crate::types::{keys, AttributeRecord, Overrides};
use regex::Regex;
use std::sync::LazyLock;

// ALL-CAPS street segment, then an account number with check digit,
// then the billing period dates.
static PACKED_VALUES: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"([A-ZÁÉÍÓÚÑ][A-ZÁÉÍÓÚÑ0-9\s\.]*[A-ZÁÉÍÓÚÑ0-9])\s+(\d{5,}-\d)\s+(\d{1,2}/\d{1,2}/\d{4})\s+al\s+(\d{1,2}/\d{1,2}/\d{4})",
    )
    .unwrap()
});

static CONSUMPTION_M3: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)Consumo(?:\s+del\s+(?:mes|per[íi]odo))?\s*:?\s*(\d[\d.,]*)\s*m[³3]").unwrap()
});

static METER_READING: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)Lectura\s+actual\s*:?\s*(\d[\d.,]*)").unwrap()
});

static METER_NUMBER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)Medidor\s*(?:N[°º]\s*)?:?\s*([0-9A-Z][0-9A-Za-z-]*)").unwrap()
});

/// Extractor for the water provider's packed-table layout.
pub struct WaterExtractor;

impl TypedExtractor for WaterExtractor {
    fn overrides(&self, body: &str, _base: &AttributeRecord) -> Overrides {
        let mut overrides = Overrides::new();

        if let Some(caps) = PACKED_VALUES.captures(body) {
            overrides.insert(
                keys::ADDRESS,
                Some(caps[1].trim().to_string().into()),
            );
            overrides.insert(
                keys::CUSTOMER_NUMBER,
                Some(caps[2].to_string().into()),
            );
            if let Some(start) = parse_dmy(&caps[3]) {
                overrides.insert(keys::BILLING_PERIOD_START, Some(start.into()));
            }
            if let Some(end) = parse_dmy(&caps[4]) {
                overrides.insert(keys::BILLING_PERIOD_END, Some(end.into()));
            }
        }

        if let Some(m3) = CONSUMPTION_M3
            .captures(body)
            .and_then(|caps| super::generic::parse_amount(&caps[1]))
        {
            overrides.insert(keys::CONSUMPTION_M3, Some(m3.into()));
        }

        if let Some(reading) = METER_READING
            .captures(body)
            .and_then(|caps| super::generic::parse_amount(&caps[1]))
        {
            overrides.insert(keys::METER_READING, Some(reading.into()));
        }

        if let Some(caps) = METER_NUMBER.captures(body) {
            overrides.insert(keys::METER_NUMBER, Some(caps[1].to_string().into()));
        }

        overrides
    }
}
