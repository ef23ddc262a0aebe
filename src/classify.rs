//! Provider classification from message headers.
//!
//! An ordered rule table maps sender (and optionally subject) patterns
//! to a fixed provider identity and service type. The first rule whose
//! matchers all succeed wins, so two emails from the same provider
//! always classify identically regardless of subject wording.

use crate::types::{DetectedService, NormalizedEmail, ServiceType};
use regex::{Regex, RegexSet};
use std::sync::LazyLock;
use tracing::debug;

/// One classification rule: sender matcher, optional subject matcher,
/// and the fixed provider identity the rule assigns.
#[derive(Debug)]
pub struct ServicePattern {
    sender: Regex,
    subject: Option<Regex>,
    name: &'static str,
    id: &'static str,
    service_type: ServiceType,
}

impl ServicePattern {
    /// Build a rule. Matchers are case-insensitive regexes.
    pub fn new(
        sender: &str,
        subject: Option<&str>,
        name: &'static str,
        id: &'static str,
        service_type: ServiceType,
    ) -> Result<Self, regex::Error> {
        Ok(Self {
            sender: Regex::new(&format!("(?i){sender}"))?,
            subject: subject
                .map(|s| Regex::new(&format!("(?i){s}")))
                .transpose()?,
            name,
            id,
            service_type,
        })
    }

    #[must_use]
    pub const fn name(&self) -> &'static str {
        self.name
    }

    #[must_use]
    pub const fn service_id(&self) -> &'static str {
        self.id
    }

    #[must_use]
    pub const fn service_type(&self) -> ServiceType {
        self.service_type
    }

    fn matches(&self, from_addr: &str, subject: &str) -> bool {
        self.sender.is_match(from_addr)
            && self.subject.as_ref().is_none_or(|re| re.is_match(subject))
    }
}

/// Known Chilean utility providers, most specific first.
static SERVICE_PATTERNS: LazyLock<Vec<ServicePattern>> = LazyLock::new(|| {
    let rules = [
        // Water
        (r"aguas\s*andinas", "Aguas Andinas", "aguas_andinas", ServiceType::Water),
        (r"essbio", "Essbio", "essbio", ServiceType::Water),
        (r"esval", "Esval", "esval", ServiceType::Water),
        (r"nuevo\s*sur", "Nuevo Sur", "nuevo_sur", ServiceType::Water),
        // Gas
        (r"metrogas", "Metrogas", "metrogas", ServiceType::Gas),
        (r"lipigas", "Lipigas", "lipigas", ServiceType::Gas),
        (r"abastible", "Abastible", "abastible", ServiceType::Gas),
        (r"gasco", "Gasco", "gasco", ServiceType::Gas),
        // Electricity
        (r"enel", "Enel", "enel", ServiceType::Electricity),
        (r"chilectra", "Chilectra", "chilectra", ServiceType::Electricity),
        (r"cge\b", "CGE", "cge", ServiceType::Electricity),
        // Telecom
        (r"movistar", "Movistar", "movistar", ServiceType::Telecom),
        (r"entel", "Entel", "entel", ServiceType::Telecom),
        (r"\bclaro\b", "Claro", "claro", ServiceType::Telecom),
        (r"\bwom\b", "WOM", "wom", ServiceType::Telecom),
        (r"\bvtr\b", "VTR", "vtr", ServiceType::Telecom),
        (r"\bgtd\b", "GTD", "gtd", ServiceType::Telecom),
        (r"mundo\s*pac[ií]fico", "Mundo Pacífico", "mundo_pacifico", ServiceType::Telecom),
        // Generic company-name fallbacks, after every named provider.
        (r"compa[ñn][íi]a\s+de\s+agua", "Compañía de Agua", "compania_de_agua", ServiceType::Water),
        (r"compa[ñn][íi]a\s+de\s+electricidad", "Compañía de Electricidad", "compania_de_electricidad", ServiceType::Electricity),
        (r"compa[ñn][íi]a\s+de\s+gas", "Compañía de Gas", "compania_de_gas", ServiceType::Gas),
    ];

    rules
        .into_iter()
        .map(|(sender, name, id, ty)| {
            ServicePattern::new(sender, None, name, id, ty).unwrap()
        })
        .collect()
});

/// Vocabulary that marks a message as a bill or service statement.
static BILLING_INDICATORS: LazyLock<RegexSet> = LazyLock::new(|| {
    RegexSet::new([
        r"factura|boleta|cuenta|cuota|pago|cobro|consumo",
        r"invoice|bill|payment|statement",
        r"folio|n[úu]mero de cuenta|n[ºo°] de cliente",
        r"vencimiento|fecha de pago|total a pagar|monto",
        r"due date|amount due|total due",
        r"dte|documento tributario|electr[óo]nica",
    ])
    .unwrap()
});

static SENDER_DOMAIN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"@([A-Za-z0-9-]+)\.[A-Za-z]").unwrap());

/// Result of classifying one message's headers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classification {
    pub service_name: String,
    pub service_id: String,
    pub service_type: ServiceType,
}

/// Evaluate a rule table in order; first full match wins.
#[must_use]
pub fn match_first<'a>(
    rules: &'a [ServicePattern],
    from_addr: &str,
    subject: &str,
) -> Option<&'a ServicePattern> {
    rules.iter().find(|rule| rule.matches(from_addr, subject))
}

/// Classify a message by its decoded `From` and `Subject` headers.
///
/// Falls back to an unknown-type classification named after the sender
/// domain when no provider rule matches.
#[must_use]
pub fn classify(from_addr: &str, subject: &str) -> Classification {
    if let Some(rule) = match_first(&SERVICE_PATTERNS, from_addr, subject) {
        debug!(provider = rule.name, "classified by provider rule");
        return Classification {
            service_name: rule.name.to_string(),
            service_id: rule.id.to_string(),
            service_type: rule.service_type,
        };
    }

    let fallback = unknown_from_domain(from_addr);
    debug!(service_id = %fallback.service_id, "no provider rule matched");
    fallback
}

/// Type-only classification, for stored services that predate type
/// tracking. Re-derived on every read, never written back.
#[must_use]
pub fn classify_service_type(from_addr: &str, subject: &str) -> ServiceType {
    match_first(&SERVICE_PATTERNS, from_addr, subject)
        .map_or(ServiceType::Unknown, ServicePattern::service_type)
}

/// Best-effort identity for an unrecognized sender.
fn unknown_from_domain(from_addr: &str) -> Classification {
    let domain = SENDER_DOMAIN
        .captures(from_addr)
        .map(|c| c[1].to_lowercase())
        .unwrap_or_default();

    // Mailbox prefixes that say nothing about the provider.
    let trimmed = domain
        .trim_start_matches("no-reply")
        .trim_start_matches("noreply")
        .trim_start_matches("facturacion")
        .trim_start_matches("dte")
        .trim_start_matches("info")
        .trim_matches(['-', '_']);

    if trimmed.len() > 3 {
        let name = trimmed
            .split(['-', '_'])
            .filter(|w| !w.is_empty())
            .map(capitalize)
            .collect::<Vec<_>>()
            .join(" ");
        let id = trimmed.replace('-', "_");
        Classification {
            service_name: name,
            service_id: id,
            service_type: ServiceType::Unknown,
        }
    } else {
        Classification {
            service_name: "Unknown".to_string(),
            service_id: "unknown".to_string(),
            service_type: ServiceType::Unknown,
        }
    }
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    chars.next().map_or_else(String::new, |first| {
        first.to_uppercase().collect::<String>() + chars.as_str()
    })
}

/// Whether a message looks like a bill or service statement at all.
#[must_use]
pub fn is_billing_email(from_addr: &str, subject: &str, body: &str) -> bool {
    let combined = format!("{from_addr} {subject} {body}").to_lowercase();
    BILLING_INDICATORS.is_match(&combined)
}

/// The pure part of the inbox scan: screen, classify and deduplicate.
///
/// Messages without attachments are skipped (bills from the supported
/// providers always carry the PDF), as are messages that fail the
/// billing screen. Services are deduplicated by id; the first message
/// seen supplies the sample headers, later ones only bump the count.
pub fn detect_services<'a, I>(emails: I) -> Vec<DetectedService>
where
    I: IntoIterator<Item = &'a NormalizedEmail>,
{
    let mut detected: Vec<DetectedService> = Vec::new();

    for email in emails {
        if !email.has_attachments {
            continue;
        }

        let from = email.from.to_string();
        if !is_billing_email(&from, &email.subject, &email.body_text) {
            continue;
        }

        let classification = classify(&from, &email.subject);

        if let Some(existing) = detected
            .iter_mut()
            .find(|s| s.service_id == classification.service_id)
        {
            existing.email_count += 1;
        } else {
            detected.push(DetectedService {
                service_name: classification.service_name,
                service_id: classification.service_id,
                service_type: classification.service_type,
                sample_from: from,
                sample_subject: email.subject.clone(),
                email_count: 1,
            });
        }
    }

    debug!(count = detected.len(), "inbox scan finished");
    detected
}
