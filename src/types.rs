//! Core types: service classification results, normalized messages and
//! the attribute record produced by extraction.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Utility service category a provider is classified into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ServiceType {
    Water,
    Gas,
    Electricity,
    Telecom,
    #[default]
    Unknown,
}

impl ServiceType {
    /// Parse a stored type string back into a variant.
    ///
    /// Returns `None` for unrecognized input so callers can distinguish
    /// "stored as unknown" from "not stored at all".
    #[must_use]
    pub fn from_stored(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "water" => Some(Self::Water),
            "gas" => Some(Self::Gas),
            "electricity" => Some(Self::Electricity),
            "telecom" => Some(Self::Telecom),
            "unknown" => Some(Self::Unknown),
            _ => None,
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Water => "water",
            Self::Gas => "gas",
            Self::Electricity => "electricity",
            Self::Telecom => "telecom",
            Self::Unknown => "unknown",
        }
    }
}

impl fmt::Display for ServiceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Sender address split into the pieces classification cares about.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct EmailAddress {
    /// Display name, if the header carried one (e.g., "Metrogas")
    pub name: Option<String>,

    /// Bare address (e.g., "boleta@metrogas.cl")
    pub address: String,

    /// Local part (before @)
    pub local_part: String,

    /// Domain (after @)
    pub domain: String,
}

impl EmailAddress {
    /// Parse a `From`-style header value.
    ///
    /// Accepts both `Name <user@domain>` and bare `user@domain` forms.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        let s = s.trim();

        if let Some(start) = s.find('<')
            && let Some(end) = s.find('>')
        {
            let name_part = s[..start].trim().trim_matches('"');
            let address = s[start + 1..end].trim().to_string();

            if let Some((local, domain)) = address.split_once('@') {
                return Some(Self {
                    name: if name_part.is_empty() {
                        None
                    } else {
                        Some(name_part.to_string())
                    },
                    local_part: local.to_string(),
                    domain: domain.to_string(),
                    address,
                });
            }
        }

        if let Some((local, domain)) = s.split_once('@') {
            return Some(Self {
                name: None,
                local_part: local.to_string(),
                domain: domain.to_string(),
                address: s.to_string(),
            });
        }

        None
    }

    /// Sentinel for a missing or unparseable `From` header.
    ///
    /// Matches no provider rule, so classification falls through to the
    /// unknown fallback.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            name: None,
            address: String::new(),
            local_part: String::new(),
            domain: String::new(),
        }
    }

    /// Check if this is likely a noreply/automated address
    #[must_use]
    pub fn is_noreply(&self) -> bool {
        let lower = self.local_part.to_lowercase();
        lower.contains("noreply")
            || lower.contains("no-reply")
            || lower.contains("donotreply")
            || lower.contains("mailer-daemon")
    }
}

impl fmt::Display for EmailAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.name {
            Some(name) => write!(f, "{} <{}>", name, self.address),
            None => write!(f, "{}", self.address),
        }
    }
}

/// One fetched message reduced to the fields the pipeline consumes.
///
/// Constructed fresh per message by [`crate::parse_message`] and
/// discarded after extraction; never persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NormalizedEmail {
    /// Decoded subject line
    pub subject: String,

    /// Decoded sender
    pub from: EmailAddress,

    /// `Date` header, when present and parseable
    pub sent_at: Option<DateTime<Utc>>,

    /// Plain text body: markup stripped, entities fully decoded
    pub body_text: String,

    /// Whether any part carried an attachment disposition or filename
    pub has_attachments: bool,
}

/// A utility account discovered during an inbox scan.
///
/// Owned by the host's config storage; the extraction pipeline only
/// reads it to resolve the provider-specific extractor.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DetectedService {
    /// Provider display name (e.g., "Aguas Andinas")
    pub service_name: String,

    /// Stable slug used as the dedup/lookup key (e.g., "aguas_andinas")
    pub service_id: String,

    /// Classified category
    pub service_type: ServiceType,

    /// Example `From` header kept for diagnostics and re-classification
    pub sample_from: String,

    /// Example subject kept for the same purpose
    pub sample_subject: String,

    /// How many messages matched this service during the scan
    pub email_count: u32,
}

impl DetectedService {
    /// Resolve the type to extract with, re-classifying legacy records.
    ///
    /// Services stored before type tracking existed carry
    /// [`ServiceType::Unknown`]; those are re-derived from the sample
    /// headers on every read and never written back.
    #[must_use]
    pub fn effective_type(&self) -> ServiceType {
        if self.service_type == ServiceType::Unknown {
            crate::classify::classify_service_type(&self.sample_from, &self.sample_subject)
        } else {
            self.service_type
        }
    }

    /// Check whether a fetched message belongs to this service.
    ///
    /// Three tests, any hit wins: sender domain taken from
    /// `sample_from`, then service-name keywords, then the service-id
    /// tokens.
    #[must_use]
    pub fn matches(&self, email: &NormalizedEmail) -> bool {
        let combined = format!(
            "{} {} {}",
            email.from.address, email.subject, email.body_text
        )
        .to_lowercase();

        if let Some(sample) = EmailAddress::parse(&self.sample_from)
            && !sample.domain.is_empty()
        {
            let domain = sample
                .domain
                .split('.')
                .next()
                .unwrap_or_default()
                .to_lowercase();
            if !domain.is_empty() && email.from.address.to_lowercase().contains(&domain) {
                return true;
            }
        }

        let keywords: Vec<String> = self
            .service_name
            .to_lowercase()
            .split_whitespace()
            .filter(|w| w.len() > 3)
            .map(str::to_string)
            .collect();
        if !keywords.is_empty() && keywords.iter().all(|w| combined.contains(w.as_str())) {
            return true;
        }

        !self.service_id.is_empty()
            && self
                .service_id
                .split('_')
                .filter(|p| !p.is_empty())
                .all(|p| combined.contains(p))
    }
}

/// A single extracted attribute value.
///
/// Serializes untagged so the host's attribute display sees plain
/// strings, numbers and ISO dates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttributeValue {
    Text(String),
    Integer(i64),
    Date(NaiveDate),
    DateTime(DateTime<Utc>),
}

impl AttributeValue {
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    #[must_use]
    pub const fn as_integer(&self) -> Option<i64> {
        match self {
            Self::Integer(n) => Some(*n),
            _ => None,
        }
    }

    #[must_use]
    pub const fn as_date(&self) -> Option<NaiveDate> {
        match self {
            Self::Date(d) => Some(*d),
            _ => None,
        }
    }
}

impl From<&str> for AttributeValue {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<String> for AttributeValue {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

impl From<i64> for AttributeValue {
    fn from(n: i64) -> Self {
        Self::Integer(n)
    }
}

impl From<NaiveDate> for AttributeValue {
    fn from(d: NaiveDate) -> Self {
        Self::Date(d)
    }
}

impl From<DateTime<Utc>> for AttributeValue {
    fn from(dt: DateTime<Utc>) -> Self {
        Self::DateTime(dt)
    }
}

/// Override set returned by a provider-specific extractor.
///
/// `Some(value)` replaces or adds a key; `None` clears a base value the
/// extractor knows is wrong for its layout. A cleared key is removed
/// outright, so it never reaches the host's attribute display.
pub type Overrides = BTreeMap<&'static str, Option<AttributeValue>>;

/// The extraction result: attribute name → value.
///
/// Only present keys exist; "absent" is the removal of the key, not a
/// null. Rebuilt from scratch on every refresh, never cached.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AttributeRecord(BTreeMap<String, AttributeValue>);

impl AttributeRecord {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: &str, value: impl Into<AttributeValue>) {
        self.0.insert(key.to_string(), value.into());
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&AttributeValue> {
        self.0.get(key)
    }

    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    #[must_use]
    pub fn text(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(AttributeValue::as_text)
    }

    #[must_use]
    pub fn integer(&self, key: &str) -> Option<i64> {
        self.get(key).and_then(AttributeValue::as_integer)
    }

    #[must_use]
    pub fn date(&self, key: &str) -> Option<NaiveDate> {
        self.get(key).and_then(AttributeValue::as_date)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &AttributeValue)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Merge a provider override set on top of this record.
    ///
    /// Replacements land, additions land, explicit clears remove the
    /// key entirely.
    pub fn apply(&mut self, overrides: Overrides) {
        for (key, value) in overrides {
            match value {
                Some(v) => {
                    self.0.insert(key.to_string(), v);
                }
                None => {
                    self.0.remove(key);
                }
            }
        }
    }
}

impl<'a> IntoIterator for &'a AttributeRecord {
    type Item = (&'a String, &'a AttributeValue);
    type IntoIter = std::collections::btree_map::Iter<'a, String, AttributeValue>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// Attribute-key constants shared by the generic and provider-specific
/// extractors, so the two sides cannot drift apart on spelling.
pub mod keys {
    pub const SERVICE_NAME: &str = "service_name";
    pub const SERVICE_TYPE: &str = "service_type";
    pub const FOLIO: &str = "folio";
    pub const CUSTOMER_NUMBER: &str = "customer_number";
    pub const ADDRESS: &str = "address";
    pub const TOTAL_AMOUNT: &str = "total_amount";
    pub const BILLING_PERIOD_START: &str = "billing_period_start";
    pub const BILLING_PERIOD_END: &str = "billing_period_end";
    pub const DUE_DATE: &str = "due_date";
    pub const LAST_UPDATED_DATETIME: &str = "last_updated_datetime";

    pub const CONSUMPTION_M3: &str = "consumption_m3";
    pub const CONSUMPTION_KWH: &str = "consumption_kwh";
    pub const CONSUMPTION_TYPE: &str = "consumption_type";
    pub const METER_NUMBER: &str = "meter_number";
    pub const METER_READING: &str = "meter_reading";
    pub const METROPUNTOS: &str = "metropuntos";
    pub const BOLETA_DATE: &str = "boleta_date";
    pub const NEXT_BILLING_PERIOD_START: &str = "next_billing_period_start";
    pub const NEXT_BILLING_PERIOD_END: &str = "next_billing_period_end";
}
