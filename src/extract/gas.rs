//! Gas-provider layout (Metrogas).
//!
//! Amounts in these emails come without a currency symbol, and the
//! true consumption figure lives only in the attached PDF. A bare
//! number in the body is therefore never trusted as consumption; the
//! field is produced only when an explicit labeled value exists.

use super::TypedExtractor;
use crate::types::{keys, AttributeRecord, Overrides};
use regex::Regex;
use std::sync::LazyLock;

static TOTAL_PLAIN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)Total\s+a\s+pagar\s*:?\s*(\d+)\b").unwrap());

static METROPUNTOS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)Metropuntos\s*:?\s*(\d[\d.,]*)").unwrap());

static CONSUMPTION_M3: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)Consumo(?:\s+del\s+(?:mes|per[íi]odo))?\s*:\s*(\d[\d.,]*)\s*m[³3]").unwrap()
});

/// Extractor for the gas provider's plain-number layout.
pub struct GasExtractor;

impl TypedExtractor for GasExtractor {
    fn overrides(&self, body: &str, _base: &AttributeRecord) -> Overrides {
        let mut overrides = Overrides::new();

        if let Some(total) = TOTAL_PLAIN
            .captures(body)
            .and_then(|caps| caps[1].parse::<i64>().ok())
        {
            overrides.insert(keys::TOTAL_AMOUNT, Some(total.into()));
        }

        if let Some(points) = METROPUNTOS
            .captures(body)
            .and_then(|caps| super::generic::parse_amount(&caps[1]))
        {
            overrides.insert(keys::METROPUNTOS, Some(points.into()));
        }

        if let Some(m3) = CONSUMPTION_M3
            .captures(body)
            .and_then(|caps| super::generic::parse_amount(&caps[1]))
        {
            overrides.insert(keys::CONSUMPTION_M3, Some(m3.into()));
        }

        overrides
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(body: &str) -> AttributeRecord {
        let mut record = super::super::generic::extract_generic("", body);
        record.apply(GasExtractor.overrides(body, &record));
        record
    }

    #[test]
    fn plain_total_without_symbol() {
        let record = run("Total a pagar: 24580");
        assert_eq!(record.integer(keys::TOTAL_AMOUNT), Some(24_580));
    }

    #[test]
    fn metropuntos_balance() {
        let record = run("Metropuntos: 1.580");
        assert_eq!(record.integer(keys::METROPUNTOS), Some(1_580));
    }

    #[test]
    fn labeled_consumption_is_extracted() {
        let record = run("Consumo del mes: 42 m3");
        assert_eq!(record.integer(keys::CONSUMPTION_M3), Some(42));
    }

    #[test]
    fn bare_number_is_never_consumption() {
        // The figure only exists in the PDF attachment; a free-standing
        // number must not be mistaken for it.
        let record = run("Su boleta por 42 está disponible. Saldo: 42");
        assert!(!record.contains(keys::CONSUMPTION_M3));
    }
}
