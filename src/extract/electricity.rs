//! Electricity-provider layout (Enel).
//!
//! The body carries an invoice sentence ("Boleta N° … del …") whose
//! folio is the authoritative one, an "ubicado en" address phrase
//! instead of a label, and exactly two loose dates: the boleta date and
//! the due date. Those two dates are what the generic period pattern
//! would latch onto, so the current-period keys are cleared
//! unconditionally and only the announced next period is kept.

use super::generic::parse_dmy;
use super::TypedExtractor;
use crate::types::{keys, AttributeRecord, Overrides};
use regex::Regex;
use std::sync::LazyLock;

static BOLETA_SENTENCE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)Boleta\s+(?:electr[óo]nica\s+)?N[°º]?\s*(\d+),?\s+(?:del?|emitida\s+el)\s+(\d{1,2}/\d{1,2}/\d{2,4})",
    )
    .unwrap()
});

static LOCATED_AT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)ubicad[oa]\s+en\s+([^,.\n]+)").unwrap());

static NEXT_PERIOD: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)Pr[óo]ximo\s+per[íi]odo\s+de\s+facturaci[óo]n\s*:?\s*(\d{1,2}/\d{1,2}/\d{2,4})\s+al\s+(\d{1,2}/\d{1,2}/\d{2,4})",
    )
    .unwrap()
});

static CONSUMPTION_TYPE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)consumo\s+(real|estimado)").unwrap());

static CONSUMPTION_KWH_LABELED: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)Consumo(?:\s+del\s+(?:mes|per[íi]odo))?\s*:\s*(\d[\d.,]*)\s*kWh").unwrap()
});

static CONSUMPTION_KWH_BARE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)(\d[\d.,]*)\s*kWh").unwrap());

/// Extractor for the electricity provider's sentence-style layout.
pub struct ElectricityExtractor;

impl TypedExtractor for ElectricityExtractor {
    fn overrides(&self, body: &str, _base: &AttributeRecord) -> Overrides {
        let mut overrides = Overrides::new();

        // The two loose dates in the body are boleta date and due date,
        // not a billing period. Clear whatever the generic pass guessed.
        overrides.insert(keys::BILLING_PERIOD_START, None);
        overrides.insert(keys::BILLING_PERIOD_END, None);

        if let Some(caps) = BOLETA_SENTENCE.captures(body) {
            overrides.insert(keys::FOLIO, Some(caps[1].to_string().into()));
            if let Some(date) = parse_dmy(&caps[2]) {
                overrides.insert(keys::BOLETA_DATE, Some(date.into()));
            }
        }

        if let Some(caps) = LOCATED_AT.captures(body) {
            overrides.insert(keys::ADDRESS, Some(caps[1].trim().to_string().into()));
        }

        if let Some(caps) = NEXT_PERIOD.captures(body) {
            if let Some(start) = parse_dmy(&caps[1]) {
                overrides.insert(keys::NEXT_BILLING_PERIOD_START, Some(start.into()));
            }
            if let Some(end) = parse_dmy(&caps[2]) {
                overrides.insert(keys::NEXT_BILLING_PERIOD_END, Some(end.into()));
            }
        }

        if let Some(caps) = CONSUMPTION_TYPE.captures(body) {
            overrides.insert(
                keys::CONSUMPTION_TYPE,
                Some(caps[1].to_lowercase().into()),
            );
        }

        let kwh = CONSUMPTION_KWH_LABELED
            .captures(body)
            .or_else(|| CONSUMPTION_KWH_BARE.captures(body))
            .and_then(|caps| super::generic::parse_amount(&caps[1]));
        if let Some(kwh) = kwh {
            overrides.insert(keys::CONSUMPTION_KWH, Some(kwh.into()));
        }

        overrides
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn run(body: &str) -> AttributeRecord {
        let mut record = super::super::generic::extract_generic("", body);
        record.apply(ElectricityExtractor.overrides(body, &record));
        record
    }

    #[test]
    fn in_body_folio_beats_subject_folio() {
        let body = "Tu Boleta Electrónica N° 88213345 del 05/01/2026 ya está disponible.";
        let mut record = super::super::generic::extract_generic("Boleta N° 111111", body);
        record.apply(ElectricityExtractor.overrides(body, &record));

        assert_eq!(record.text(keys::FOLIO), Some("88213345"));
        assert_eq!(
            record.date(keys::BOLETA_DATE),
            NaiveDate::from_ymd_opt(2026, 1, 5)
        );
    }

    #[test]
    fn located_at_address_phrase() {
        let record = run("el suministro ubicado en PASAJE LOS OLMOS 0213, Maipú.");
        assert_eq!(record.text(keys::ADDRESS), Some("PASAJE LOS OLMOS 0213"));
    }

    #[test]
    fn loose_dates_never_become_a_period() {
        // Boleta date and due date are the only dates in the body; the
        // generic pass guesses a period from them, and that guess must
        // not survive.
        let body = "Boleta N° 7700412 del 05/01/2026.\n\
                    Fecha de vencimiento: 22/01/2026";
        let generic = super::super::generic::extract_generic("", body);
        assert!(generic.contains(keys::BILLING_PERIOD_START));

        let record = run(body);
        assert!(!record.contains(keys::BILLING_PERIOD_START));
        assert!(!record.contains(keys::BILLING_PERIOD_END));
        assert_eq!(
            record.date(keys::DUE_DATE),
            NaiveDate::from_ymd_opt(2026, 1, 22)
        );
    }

    #[test]
    fn next_period_is_kept_separately() {
        let record = run("Próximo periodo de facturación: 05/02/2026 al 05/03/2026");
        assert_eq!(
            record.date(keys::NEXT_BILLING_PERIOD_START),
            NaiveDate::from_ymd_opt(2026, 2, 5)
        );
        assert_eq!(
            record.date(keys::NEXT_BILLING_PERIOD_END),
            NaiveDate::from_ymd_opt(2026, 3, 5)
        );
        assert!(!record.contains(keys::BILLING_PERIOD_START));
    }

    #[test]
    fn consumption_quality_flag_and_kwh() {
        let record = run("Consumo real del período. Consumo: 215 kWh");
        assert_eq!(record.text(keys::CONSUMPTION_TYPE), Some("real"));
        assert_eq!(record.integer(keys::CONSUMPTION_KWH), Some(215));
    }

    #[test]
    fn bare_kwh_fallback() {
        let record = run("Este mes registraste 198 kWh en tu hogar.");
        assert_eq!(record.integer(keys::CONSUMPTION_KWH), Some(198));
    }
}
