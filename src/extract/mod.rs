//! Attribute extraction: generic pass, provider-specific overrides and
//! the router that ties them together.

pub mod electricity;
pub mod gas;
pub mod generic;
pub mod water;

use crate::types::{
    keys, AttributeRecord, DetectedService, NormalizedEmail, Overrides, ServiceType,
};
use tracing::debug;

pub use electricity::ElectricityExtractor;
pub use gas::GasExtractor;
pub use generic::extract_generic;
pub use water::WaterExtractor;

/// A provider-layout extractor layered on top of the generic pass.
///
/// Implementations never fail: a missing label means the key is simply
/// absent from the returned overrides, and an explicitly cleared key
/// (`None`) removes a generic value known to be wrong for the layout.
pub trait TypedExtractor: Send + Sync {
    /// Compute overrides for this layout from the normalized body and
    /// the generic base record.
    fn overrides(&self, body: &str, base: &AttributeRecord) -> Overrides;
}

/// Look up the extractor registered for a service type.
///
/// Telecom and unknown services have no layout-specific extractor; the
/// router leaves the generic record untouched for them.
#[must_use]
pub fn registry(service_type: ServiceType) -> Option<&'static dyn TypedExtractor> {
    match service_type {
        ServiceType::Water => Some(&WaterExtractor),
        ServiceType::Gas => Some(&GasExtractor),
        ServiceType::Electricity => Some(&ElectricityExtractor),
        ServiceType::Telecom | ServiceType::Unknown => None,
    }
}

/// Run the full extraction pipeline for one message.
///
/// Generic pass first, then the provider overrides for `service_type`,
/// then the type itself as a record field.
#[must_use]
pub fn extract(service_type: ServiceType, subject: &str, body: &str) -> AttributeRecord {
    let mut record = extract_generic(subject, body);

    if let Some(extractor) = registry(service_type) {
        record.apply(extractor.overrides(body, &record));
    }

    record.insert(keys::SERVICE_TYPE, service_type.as_str());
    debug!(%service_type, fields = record.len(), "extraction finished");
    record
}

/// Extraction for a stored service: routes through the service's
/// effective type and adds the header-derived fields the record
/// contract requires.
#[must_use]
pub fn extract_for_service(service: &DetectedService, email: &NormalizedEmail) -> AttributeRecord {
    let mut record = extract(service.effective_type(), &email.subject, &email.body_text);

    record.insert(keys::SERVICE_NAME, service.service_name.as_str());
    if let Some(sent_at) = email.sent_at {
        record.insert(keys::LAST_UPDATED_DATETIME, sent_at);
    }

    record
}
